//! Point symbols and the categorical symbol scale.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::f64::consts::PI;

use crate::data::{distinct_values, group_keys};
use crate::format::{parse_instant, value_to_string};
use crate::settings::{ColumnType, Encoding, Settings};

/// The d3 symbol set. Sizes are areas in square pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolShape {
    #[default]
    Circle,
    Cross,
    Diamond,
    Square,
    Star,
    Triangle,
    Wye,
}

/// Default symbol range, in d3's order
pub const SYMBOLS: [SymbolShape; 7] = [
    SymbolShape::Circle,
    SymbolShape::Cross,
    SymbolShape::Diamond,
    SymbolShape::Square,
    SymbolShape::Star,
    SymbolShape::Triangle,
    SymbolShape::Wye,
];

impl SymbolShape {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "circle" => Some(SymbolShape::Circle),
            "cross" => Some(SymbolShape::Cross),
            "diamond" => Some(SymbolShape::Diamond),
            "square" => Some(SymbolShape::Square),
            "star" => Some(SymbolShape::Star),
            "triangle" => Some(SymbolShape::Triangle),
            "wye" => Some(SymbolShape::Wye),
            _ => None,
        }
    }

    /// Radius of a circle with the given area
    pub fn circle_radius(area: f64) -> f64 {
        (area.max(0.0) / PI).sqrt()
    }

    /// Outline of the symbol centred on the origin, `None` for circles.
    pub fn vertices(self, area: f64) -> Option<Vec<(f64, f64)>> {
        let area = area.max(0.0);
        let sqrt3 = 3f64.sqrt();
        let points = match self {
            SymbolShape::Circle => return None,
            SymbolShape::Cross => {
                let r = (area / 5.0).sqrt() / 2.0;
                vec![
                    (-3.0 * r, -r), (-r, -r), (-r, -3.0 * r), (r, -3.0 * r),
                    (r, -r), (3.0 * r, -r), (3.0 * r, r), (r, r),
                    (r, 3.0 * r), (-r, 3.0 * r), (-r, r), (-3.0 * r, r),
                ]
            }
            SymbolShape::Diamond => {
                let tan30 = (1.0f64 / 3.0).sqrt();
                let y = (area / (tan30 * 2.0)).sqrt();
                let x = y * tan30;
                vec![(0.0, -y), (x, 0.0), (0.0, y), (-x, 0.0)]
            }
            SymbolShape::Square => {
                let h = area.sqrt() / 2.0;
                vec![(-h, -h), (h, -h), (h, h), (-h, h)]
            }
            SymbolShape::Star => {
                let ka = 0.890_813_091_529_285_2;
                let kr = (PI / 10.0).sin() / (7.0 * PI / 10.0).sin();
                let kx = (2.0 * PI / 10.0).sin() * kr;
                let ky = -(2.0 * PI / 10.0).cos() * kr;
                let r = (area * ka).sqrt();
                let (x, y) = (kx * r, ky * r);
                let mut pts = vec![(0.0, -r), (x, y)];
                for i in 1..5 {
                    let a = 2.0 * PI * i as f64 / 5.0;
                    let (c, s) = (a.cos(), a.sin());
                    pts.push((s * r, -c * r));
                    pts.push((c * x - s * y, s * x + c * y));
                }
                pts
            }
            SymbolShape::Triangle => {
                let y = -(area / (sqrt3 * 3.0)).sqrt();
                vec![(0.0, y * 2.0), (-sqrt3 * y, -y), (sqrt3 * y, -y)]
            }
            SymbolShape::Wye => {
                let c = -0.5;
                let s = sqrt3 / 2.0;
                let k = 1.0 / 12f64.sqrt();
                let a = (k / 2.0 + 1.0) * 3.0;
                let r = (area / a).sqrt();
                let (x0, y0) = (r / 2.0, r * k);
                let (x1, y1) = (x0, r * k + r);
                let (x2, y2) = (-x1, y1);
                vec![
                    (x0, y0), (x1, y1), (x2, y2),
                    (c * x0 - s * y0, s * x0 + c * y0),
                    (c * x1 - s * y1, s * x1 + c * y1),
                    (c * x2 - s * y2, s * x2 + c * y2),
                    (c * x0 + s * y0, c * y0 - s * x0),
                    (c * x1 + s * y1, c * y1 - s * x1),
                    (c * x2 + s * y2, c * y2 - s * x2),
                ]
            }
        };
        Some(points)
    }
}

/// Immutable ordinal mapping from data values to symbols.
///
/// The range is kept as long as the domain; lookups outside the domain
/// fall back to a circle.
#[derive(Debug, Clone, PartialEq)]
pub struct SymbolScale {
    domain: Vec<Value>,
    range: Vec<SymbolShape>,
}

impl SymbolScale {
    /// `range` is repeated cyclically until it covers the domain
    pub fn new(domain: Vec<Value>, range: &[SymbolShape]) -> Self {
        let range = if range.is_empty() {
            vec![SymbolShape::Circle; domain.len()]
        } else {
            (0..domain.len()).map(|i| range[i % range.len()]).collect()
        };
        Self { domain, range }
    }

    pub fn from_domain(domain: Vec<Value>) -> Self {
        Self::new(domain, &SYMBOLS)
    }

    pub fn domain(&self) -> &[Value] {
        &self.domain
    }

    pub fn range(&self) -> &[SymbolShape] {
        &self.range
    }

    pub fn shape_for(&self, value: &Value) -> SymbolShape {
        self.domain
            .iter()
            .position(|d| d == value)
            .or_else(|| {
                let label = value_to_string(value);
                self.domain.iter().position(|d| value_to_string(d) == label)
            })
            .map(|i| self.range[i])
            .unwrap_or_default()
    }

    /// Index of the domain entry matching an override key
    fn find_key(&self, key: &str, column_type: Option<ColumnType>) -> Option<usize> {
        match column_type {
            Some(t) if t.is_temporal() => {
                let wanted = parse_instant(&Value::String(key.to_string()))?;
                self.domain.iter().position(|d| parse_instant(d) == Some(wanted))
            }
            _ => self.domain.iter().position(|d| value_to_string(d) == key),
        }
    }

    /// New scale with the slot for `key` set to `shape`; `None` if `key` is not in the domain
    pub fn with_override(&self, key: &str, shape: SymbolShape, column_type: Option<ColumnType>) -> Option<Self> {
        let idx = self.find_key(key, column_type)?;
        let mut range = self.range.clone();
        range[idx] = shape;
        Some(Self { domain: self.domain.clone(), range })
    }
}

/// Symbol scale over the distinct values of `column` in the raw data
pub fn symbol_scale_from_column(settings: &Settings, column: Option<&str>) -> Option<SymbolScale> {
    column.map(|col| SymbolScale::from_domain(distinct_values(&settings.data, col)))
}

/// Symbol scale over the distinct group keys (faceted layout)
pub fn symbol_scale_from_groups(settings: &Settings) -> SymbolScale {
    SymbolScale::from_domain(group_keys(settings).into_iter().map(Value::String).collect())
}

/// Applies the user's per-value symbol choices for the symbol column.
///
/// Unknown symbol names fall back to a circle. Keys with no matching domain
/// value are logged and skipped.
pub fn override_symbols(settings: &Settings, symbols: Option<SymbolScale>) -> Option<SymbolScale> {
    let mut scale = symbols?;
    let column = match settings.encoding(Encoding::Symbol) {
        Some(c) => c,
        None => return Some(scale),
    };
    let column_type = settings.column_type(column);

    for ov in settings.symbol_overrides(column) {
        let shape = SymbolShape::from_name(&ov.value).unwrap_or_default();
        match scale.with_override(&ov.key, shape, column_type) {
            Some(updated) => scale = updated,
            None => log::error!(
                "Could not find row with value {} when overriding symbols!",
                ov.key
            ),
        }
    }

    Some(scale)
}
