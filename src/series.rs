//! Per-point marks of the scatter: position, symbol, size, colors and label.

use serde_json::Value;

use crate::axis::AxisScale;
use crate::color::{ColorEncoding, Rgba};
use crate::data::{Point, Series};
use crate::format::to_value;
use crate::ir::{DrawCommand, StrokeStyle, TextStyle};
use crate::scale::SizeScale;
use crate::settings::ColumnType;
use crate::symbol::{SymbolScale, SymbolShape};

/// Symbol area used when no size column is encoded
pub const DEFAULT_AREA: f64 = 64.0;

/// Horizontal gap between a point's edge and its label
pub const LABEL_PADDING: f64 = 8.0;

/// Baseline shift that vertically centres an 11px label on its point
pub const LABEL_BASELINE: f64 = 4.0;

/// How the point series encodes each row.
#[derive(Debug, Clone, Copy)]
pub struct PointSeriesConfig<'a> {
    pub symbol_column: Option<&'a str>,
    pub symbols: Option<&'a SymbolScale>,
    pub size_scale: Option<SizeScale>,
    pub color: &'a ColorEncoding,
    pub opacity: f64,
    pub label_column: Option<(&'a str, ColumnType)>,
    /// Responsive factor applied to symbol areas
    pub scale_factor: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PointLabel {
    pub text: String,
    /// Offset of the label anchor from the point centre
    pub offset: (f64, f64),
}

/// One drawn point
#[derive(Debug, Clone, PartialEq)]
pub struct PointMark {
    pub center: (f64, f64),
    /// Symbol area in square pixels
    pub area: f64,
    pub shape: SymbolShape,
    pub stroke: Rgba,
    pub fill: Rgba,
    pub label: Option<PointLabel>,
    /// Group key of the source series
    pub key: String,
}

impl PointMark {
    /// Radius of the circle with the mark's area
    pub fn radius(&self) -> f64 {
        SymbolShape::circle_radius(self.area)
    }

    pub fn draw(&self, label_style: &TextStyle, commands: &mut Vec<DrawCommand>) {
        let (cx, cy) = self.center;
        let stroke = Some(StrokeStyle::new(self.stroke, 1.0));
        match self.shape.vertices(self.area) {
            Some(vertices) => commands.push(DrawCommand::Polygon {
                points: vertices.into_iter().map(|(x, y)| (cx + x, cy + y)).collect(),
                fill: self.fill,
                stroke,
            }),
            None => commands.push(DrawCommand::Circle {
                center: self.center,
                radius: self.radius(),
                fill: self.fill,
                stroke,
            }),
        }

        if let Some(label) = &self.label {
            commands.push(DrawCommand::Text {
                position: (cx + label.offset.0, cy + label.offset.1),
                text: label.text.clone(),
                style: label_style.clone(),
            });
        }
    }
}

pub struct PointSeries<'a> {
    config: PointSeriesConfig<'a>,
}

impl<'a> PointSeries<'a> {
    pub fn new(config: PointSeriesConfig<'a>) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PointSeriesConfig<'a> {
        &self.config
    }

    /// Unrounded scaled area; points without a size value take the smallest
    fn scaled_area(&self, scale: &SizeScale, point: &Point) -> f64 {
        let value = point.size.unwrap_or(scale.domain().0);
        self.config.scale_factor * scale.area(value)
    }

    /// Drawn symbol area: the scaled size rounded to whole pixels, or the default
    pub fn size(&self, point: &Point) -> f64 {
        match &self.config.size_scale {
            Some(scale) => self.scaled_area(scale, point).round(),
            None => DEFAULT_AREA,
        }
    }

    pub fn shape(&self, point: &Point) -> SymbolShape {
        match (self.config.symbols, self.config.symbol_column) {
            (Some(symbols), Some(column)) => symbols.shape_for(point.row.get(column).unwrap_or(&Value::Null)),
            (Some(symbols), None) => symbols.shape_for(&Value::String(point.key.clone())),
            _ => SymbolShape::Circle,
        }
    }

    /// Label anchor relative to the point centre.
    ///
    /// Labels clear the symbol by the radius of a circle with the scaled
    /// area; with no size encoding the radius term is zero.
    pub fn label_offset(&self, point: &Point) -> (f64, f64) {
        let magnitude = match &self.config.size_scale {
            Some(scale) => (self.scaled_area(scale, point) / std::f64::consts::PI).sqrt(),
            None => 0.0,
        };
        (magnitude + LABEL_PADDING, LABEL_BASELINE)
    }

    /// Formatted label text; `None` when there is no label column or the value is null
    pub fn label(&self, point: &Point) -> Option<PointLabel> {
        let (column, column_type) = self.config.label_column?;
        let text = to_value(column_type, point.row.get(column)?)?;
        Some(PointLabel { text, offset: self.label_offset(point) })
    }

    /// Mark for one point; `None` when a coordinate does not map onto its axis
    pub fn mark(&self, point: &Point, x: &AxisScale, y: &AxisScale) -> Option<PointMark> {
        let center = (x.apply(&point.x)?, y.apply(&point.y)?);
        let color = self.config.color.color_for(point.color_value.as_ref());
        Some(PointMark {
            center,
            area: self.size(point),
            shape: self.shape(point),
            stroke: color.without_opacity(),
            fill: color.with_opacity(self.config.opacity),
            label: self.label(point),
            key: point.key.clone(),
        })
    }

    /// Marks paired with the points they were built from
    pub fn marks<'s>(&self, series: &'s [Series], x: &AxisScale, y: &AxisScale) -> Vec<(&'s Point, PointMark)> {
        let marks: Vec<(&Point, PointMark)> = Series::iter_points(series)
            .filter_map(|p| self.mark(p, x, y).map(|m| (p, m)))
            .collect();
        log::debug!("Built {} point marks", marks.len());
        marks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::{AxisDomain, AxisKind};
    use crate::data::Coord;
    use serde_json::{json, Map};

    fn point(size: Option<f64>, row: Value) -> Point {
        Point {
            x: Coord::Number(1.0),
            y: Coord::Number(2.0),
            color_value: None,
            size,
            key: "a".into(),
            row: row.as_object().cloned().unwrap_or_else(Map::new),
        }
    }

    fn default_color() -> ColorEncoding {
        ColorEncoding::Default { color: Rgba::rgb(31, 119, 180), legend: None }
    }

    fn config<'a>(color: &'a ColorEncoding) -> PointSeriesConfig<'a> {
        PointSeriesConfig {
            symbol_column: None,
            symbols: None,
            size_scale: None,
            color,
            opacity: 0.5,
            label_column: None,
            scale_factor: 1.0,
        }
    }

    #[test]
    fn test_label_offset_without_size_scale() {
        let color = default_color();
        let series = PointSeries::new(config(&color));
        assert_eq!(series.label_offset(&point(Some(50.0), json!({}))), (8.0, 4.0));
        assert_eq!(series.size(&point(None, json!({}))), DEFAULT_AREA);
    }

    #[test]
    fn test_label_offset_with_size_scale() {
        let color = default_color();
        let series = PointSeries::new(PointSeriesConfig {
            size_scale: Some(SizeScale::new((0.0, 100.0))),
            scale_factor: 0.5,
            ..config(&color)
        });
        let p = point(Some(100.0), json!({}));
        let (dx, dy) = series.label_offset(&p);
        let expected = (0.5 * 10000.0 / std::f64::consts::PI).sqrt() + 8.0;
        assert!((dx - expected).abs() < 1e-9);
        assert_eq!(dy, 4.0);
        assert_eq!(series.size(&p), 5000.0);
    }

    #[test]
    fn test_size_is_rounded() {
        let color = default_color();
        let series = PointSeries::new(PointSeriesConfig {
            size_scale: Some(SizeScale::new((0.0, 3.0))),
            scale_factor: 1.0,
            ..config(&color)
        });
        // 10 + 9990 / 3 = 3340
        assert_eq!(series.size(&point(Some(1.0), json!({}))), 3340.0);
        let series = PointSeries::new(PointSeriesConfig {
            size_scale: Some(SizeScale::new((0.0, 7.0))),
            ..config(&color)
        });
        // 10 + 9990 / 7 = 1437.14...
        assert_eq!(series.size(&point(Some(1.0), json!({}))), 1437.0);
    }

    #[test]
    fn test_null_label_is_skipped() {
        let color = default_color();
        let series = PointSeries::new(PointSeriesConfig {
            label_column: Some(("name", ColumnType::String)),
            ..config(&color)
        });
        assert!(series.label(&point(None, json!({"name": null}))).is_none());
        assert!(series.label(&point(None, json!({}))).is_none());
        let label = series.label(&point(None, json!({"name": "Paris"}))).unwrap();
        assert_eq!(label.text, "Paris");
        assert_eq!(label.offset, (8.0, 4.0));
    }

    #[test]
    fn test_label_is_formatted_by_type() {
        let color = default_color();
        let series = PointSeries::new(PointSeriesConfig {
            label_column: Some(("pop", ColumnType::Integer)),
            ..config(&color)
        });
        let label = series.label(&point(None, json!({"pop": 1234567}))).unwrap();
        assert_eq!(label.text, "1,234,567");
    }

    #[test]
    fn test_shape_from_symbol_column() {
        let color = default_color();
        let symbols = SymbolScale::from_domain(vec![json!("north"), json!("south")]);
        let series = PointSeries::new(PointSeriesConfig {
            symbol_column: Some("region"),
            symbols: Some(&symbols),
            ..config(&color)
        });
        assert_eq!(series.shape(&point(None, json!({"region": "south"}))), SymbolShape::Cross);
        assert_eq!(series.shape(&point(None, json!({"region": "east"}))), SymbolShape::Circle);
    }

    #[test]
    fn test_mark_colors_and_draw() {
        let color = default_color();
        let series = PointSeries::new(PointSeriesConfig {
            label_column: Some(("name", ColumnType::String)),
            ..config(&color)
        });
        let x = AxisScale { kind: AxisKind::Linear, domain: AxisDomain::Continuous(0.0, 10.0), range: (0.0, 100.0) };
        let y = AxisScale { kind: AxisKind::Linear, domain: AxisDomain::Continuous(0.0, 10.0), range: (100.0, 0.0) };
        let mark = series.mark(&point(None, json!({"name": "p"})), &x, &y).unwrap();
        assert_eq!(mark.center, (10.0, 80.0));
        assert_eq!(mark.stroke.a, 1.0);
        assert_eq!(mark.fill.a, 0.5);

        let mut commands = Vec::new();
        mark.draw(&TextStyle::new(Rgba::BLACK, 11.0), &mut commands);
        assert_eq!(commands.len(), 2);
        assert!(matches!(commands[0], DrawCommand::Circle { .. }));
        match &commands[1] {
            DrawCommand::Text { position, text, .. } => {
                assert_eq!(*position, (18.0, 84.0));
                assert_eq!(text, "p");
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
