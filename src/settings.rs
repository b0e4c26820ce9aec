//! Plugin settings as handed over by the host viewer.
//!
//! Field names follow the host's camelCase JSON. Every field is optional and
//! falls back to a default so partial settings objects deserialize cleanly.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::io::Read;

use crate::interact::ZoomTransform;

/// A raw data record
pub type Row = Map<String, Value>;

/// Column types reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Integer,
    #[default]
    Float,
    String,
    Boolean,
    Date,
    Datetime,
}

impl ColumnType {
    pub fn is_temporal(self) -> bool {
        matches!(self, ColumnType::Date | ColumnType::Datetime)
    }

    /// Strings and booleans are plotted as discrete categories.
    ///
    /// Booleans also take the categorical color branch: a true/false column
    /// gets one palette color per value rather than a two-point gradient.
    pub fn is_categorical(self) -> bool {
        matches!(self, ColumnType::String | ColumnType::Boolean)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    #[serde(rename = "type", default)]
    pub column_type: ColumnType,
}

impl ColumnDescriptor {
    pub fn new(name: &str, column_type: ColumnType) -> Self {
        Self { name: name.to_string(), column_type }
    }
}

/// One user-chosen `value -> symbol name` pairing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolOverride {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnConfig {
    #[serde(default)]
    pub symbols: Vec<SymbolOverride>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorStyles {
    /// Categorical palette, CSS colors
    pub series: Vec<String>,
    /// Fill opacity applied to every point
    pub opacity: f64,
    /// Continuous gradient stops as `(offset, css color)`, offsets in `[0, 1]`
    pub gradient: Vec<(f64, String)>,
}

impl Default for ColorStyles {
    fn default() -> Self {
        Self {
            series: [
                "rgb(31,119,180)",
                "rgb(255,127,14)",
                "rgb(44,160,44)",
                "rgb(214,39,40)",
                "rgb(148,103,189)",
                "rgb(140,86,75)",
                "rgb(227,119,194)",
                "rgb(127,127,127)",
                "rgb(188,189,34)",
                "rgb(23,190,207)",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            opacity: 0.5,
            gradient: vec![
                (0.0, "#4575b4".to_string()),
                (0.5, "#ffffbf".to_string()),
                (1.0, "#d73027".to_string()),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextStyles {
    pub color: String,
    /// CSS shorthand, e.g. `"11px sans-serif"`
    pub font: String,
}

impl Default for TextStyles {
    fn default() -> Self {
        Self {
            color: "#333333".to_string(),
            font: "11px sans-serif".to_string(),
        }
    }
}

/// Font size and family extracted from a CSS font shorthand
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub size: f64,
    pub family: String,
}

impl TextStyles {
    /// Reads the last `<n>px` token as the size and everything after it as the family.
    pub fn font_spec(&self) -> FontSpec {
        let tokens: Vec<&str> = self.font.split_whitespace().collect();
        let size_idx = tokens
            .iter()
            .rposition(|t| t.ends_with("px") && t.trim_end_matches("px").parse::<f64>().is_ok());

        match size_idx {
            Some(idx) => {
                let size = tokens[idx].trim_end_matches("px").parse::<f64>().unwrap_or(11.0);
                let family = tokens[idx + 1..].join(" ");
                FontSpec {
                    size,
                    family: if family.is_empty() { "sans-serif".to_string() } else { family },
                }
            }
            None => FontSpec { size: 11.0, family: "sans-serif".to_string() },
        }
    }
}

/// Axis state carried between renders so the axis does not jump on updates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisMemo {
    pub domain: Option<(f64, f64)>,
    pub categories: Option<Vec<String>>,
}

/// Encoding slots in `realValues`, in the order the host lists them
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    X = 0,
    Y = 1,
    Color = 2,
    Size = 3,
    Symbol = 4,
    Label = 5,
    Tooltip = 6,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub real_values: Vec<Option<String>>,
    pub main_values: Vec<ColumnDescriptor>,
    pub data: Vec<Row>,
    pub columns: HashMap<String, ColumnConfig>,
    pub color_styles: ColorStyles,
    pub text_styles: TextStyles,
    pub axis_memo: Vec<Option<AxisMemo>>,
    pub split_values: Vec<String>,
    pub hide_keys: Vec<String>,
    pub zoom: Option<ZoomTransform>,
}

impl Settings {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse settings JSON")
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        serde_json::from_reader(reader).context("Failed to parse settings JSON")
    }

    /// Column selected for an encoding slot; empty names count as unset
    pub fn encoding(&self, slot: Encoding) -> Option<&str> {
        self.real_value(slot as usize)
    }

    pub fn real_value(&self, index: usize) -> Option<&str> {
        self.real_values
            .get(index)
            .and_then(|v| v.as_deref())
            .filter(|name| !name.is_empty())
    }

    /// All tooltip columns (slot 6 onwards)
    pub fn tooltip_columns(&self) -> Vec<&str> {
        (Encoding::Tooltip as usize..self.real_values.len())
            .filter_map(|i| self.real_value(i))
            .collect()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnDescriptor> {
        self.main_values.iter().find(|c| c.name == name)
    }

    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.column(name).map(|c| c.column_type)
    }

    pub fn symbol_overrides(&self, column: &str) -> &[SymbolOverride] {
        self.columns
            .get(column)
            .map(|c| c.symbols.as_slice())
            .unwrap_or(&[])
    }

    pub fn axis_memo(&self, index: usize) -> Option<&AxisMemo> {
        self.axis_memo.get(index).and_then(|m| m.as_ref())
    }

    pub fn is_hidden(&self, key: &str) -> bool {
        self.hide_keys.iter().any(|k| k == key)
    }
}
