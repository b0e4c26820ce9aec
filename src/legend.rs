//! Symbol, color and color-range legends, laid out as scene commands.

use serde_json::Value;

use crate::color::{CategoricalColorScale, ColorRange, Rgba};
use crate::format::{to_value, value_to_string};
use crate::ir::{DrawCommand, PixelRect, StrokeStyle, TextAnchor, TextStyle};
use crate::settings::{ColumnType, Encoding, Settings};
use crate::symbol::{SymbolScale, SymbolShape};

/// Horizontal space reserved for a legend beside the plot
pub const LEGEND_WIDTH: f64 = 150.0;

const ROW_HEIGHT: f64 = 18.0;
const SWATCH_AREA: f64 = 64.0;
const GRADIENT_SAMPLES: usize = 16;
const MAX_LABEL_CHARS: usize = 18;

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    pub label: String,
    pub shape: SymbolShape,
    pub color: Rgba,
    /// Deselected through `hideKeys`; drawn greyed out
    pub hidden: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Legend {
    Symbol {
        title: Option<String>,
        entries: Vec<LegendEntry>,
    },
    Color {
        title: Option<String>,
        entries: Vec<LegendEntry>,
    },
    ColorRange {
        title: String,
        domain: (f64, f64),
        /// Gradient sampled across the domain, as `(offset, color)`
        stops: Vec<(f64, Rgba)>,
        column_type: ColumnType,
    },
}

impl Legend {
    /// One entry per symbol, all in `color`
    pub fn symbol(settings: &Settings, scale: &SymbolScale, color: Rgba) -> Self {
        let entries = scale
            .domain()
            .iter()
            .zip(scale.range())
            .map(|(value, shape)| {
                let label = value_to_string(value);
                LegendEntry {
                    hidden: settings.is_hidden(&label),
                    label,
                    shape: *shape,
                    color,
                }
            })
            .collect();
        Legend::Symbol {
            title: settings.encoding(Encoding::Symbol).map(str::to_string),
            entries,
        }
    }

    /// One square swatch per category
    pub fn color(settings: &Settings, scale: &CategoricalColorScale) -> Self {
        let entries = scale
            .entries()
            .into_iter()
            .map(|(label, color)| LegendEntry {
                hidden: settings.is_hidden(&label),
                label,
                shape: SymbolShape::Square,
                color,
            })
            .collect();
        Legend::Color {
            title: settings.encoding(Encoding::Color).map(str::to_string),
            entries,
        }
    }

    pub fn color_range(range: &ColorRange, column: &str, column_type: ColumnType) -> Self {
        let (min, max) = range.domain;
        let stops = (0..GRADIENT_SAMPLES)
            .map(|i| {
                let t = i as f64 / (GRADIENT_SAMPLES - 1) as f64;
                (t, range.color_for(min + (max - min) * t))
            })
            .collect();
        Legend::ColorRange {
            title: column.to_string(),
            domain: range.domain,
            stops,
            column_type,
        }
    }

    pub fn entries(&self) -> &[LegendEntry] {
        match self {
            Legend::Symbol { entries, .. } | Legend::Color { entries, .. } => entries,
            Legend::ColorRange { .. } => &[],
        }
    }

    /// Lays the legend out from the top-left corner of `area`
    pub fn draw(&self, area: PixelRect, style: &TextStyle, commands: &mut Vec<DrawCommand>) {
        let mut y = area.y + style.size;
        let x = area.x + 8.0;

        let title = match self {
            Legend::Symbol { title, .. } | Legend::Color { title, .. } => title.as_deref(),
            Legend::ColorRange { title, .. } => Some(title.as_str()),
        };
        if let Some(title) = title {
            commands.push(DrawCommand::Text {
                position: (x, y),
                text: truncate(title),
                style: style.clone(),
            });
            y += ROW_HEIGHT;
        }

        match self {
            Legend::Symbol { entries, .. } | Legend::Color { entries, .. } => {
                let fits = (((area.bottom() - y) / ROW_HEIGHT).floor().max(0.0)) as usize;
                let shown = if entries.len() > fits { fits.saturating_sub(1) } else { entries.len() };

                for entry in &entries[..shown] {
                    draw_entry(entry, (x + 6.0, y - 4.0), style, commands);
                    y += ROW_HEIGHT;
                }
                if shown < entries.len() {
                    commands.push(DrawCommand::Text {
                        position: (x, y),
                        text: format!("+{} more", entries.len() - shown),
                        style: style.clone(),
                    });
                }
            }
            Legend::ColorRange { domain, stops, column_type, .. } => {
                let bar = PixelRect::new(x, y - style.size / 2.0, area.width - 24.0, 12.0);
                commands.push(DrawCommand::Gradient { rect: bar, stops: stops.clone() });
                commands.push(DrawCommand::Rect {
                    rect: bar,
                    fill: None,
                    stroke: Some(StrokeStyle::new(Rgba::GRAY, 1.0)),
                });
                let label_y = bar.bottom() + style.size + 2.0;
                let format = |v: f64| to_value(*column_type, &Value::from(v)).unwrap_or_default();
                commands.push(DrawCommand::Text {
                    position: (bar.x, label_y),
                    text: format(domain.0),
                    style: style.clone(),
                });
                commands.push(DrawCommand::Text {
                    position: (bar.right(), label_y),
                    text: format(domain.1),
                    style: style.clone().anchor(TextAnchor::End),
                });
            }
        }
    }
}

fn draw_entry(entry: &LegendEntry, (cx, cy): (f64, f64), style: &TextStyle, commands: &mut Vec<DrawCommand>) {
    let color = if entry.hidden { Rgba::GRAY.with_opacity(0.5) } else { entry.color };
    let stroke = Some(StrokeStyle::new(color.without_opacity(), 1.0));
    match entry.shape.vertices(SWATCH_AREA) {
        Some(vertices) => commands.push(DrawCommand::Polygon {
            points: vertices.into_iter().map(|(x, y)| (cx + x, cy + y)).collect(),
            fill: color,
            stroke,
        }),
        None => commands.push(DrawCommand::Circle {
            center: (cx, cy),
            radius: SymbolShape::circle_radius(SWATCH_AREA),
            fill: color,
            stroke,
        }),
    }

    let text_style = if entry.hidden {
        TextStyle { color: Rgba::GRAY, ..style.clone() }
    } else {
        style.clone()
    };
    commands.push(DrawCommand::Text {
        position: (cx + 12.0, cy + 4.0),
        text: truncate(&entry.label),
        style: text_style,
    });
}

fn truncate(label: &str) -> String {
    if label.chars().count() > MAX_LABEL_CHARS {
        let head: String = label.chars().take(MAX_LABEL_CHARS - 1).collect();
        format!("{}…", head)
    } else {
        label.to_string()
    }
}
