//! Zoom/pan transform and the nearest-point tooltip.

use serde::{Deserialize, Serialize};

use crate::axis::{AxisDomain, AxisScale};
use crate::color::Rgba;
use crate::data::Point;
use crate::format::to_value;
use crate::ir::{DrawCommand, PixelRect, StrokeStyle, TextStyle};
use crate::series::PointMark;
use crate::settings::{Encoding, Settings};

pub const MIN_ZOOM: f64 = 1.0;
pub const MAX_ZOOM: f64 = 10.0;

/// Extra pick distance beyond a symbol's radius
pub const TOOLTIP_TOLERANCE: f64 = 5.0;

/// Affine zoom state, `screen = data_pixel * k + (x, y)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomTransform {
    pub k: f64,
    pub x: f64,
    pub y: f64,
}

impl Default for ZoomTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl ZoomTransform {
    pub const fn identity() -> Self {
        Self { k: 1.0, x: 0.0, y: 0.0 }
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::identity()
    }

    pub fn apply(&self, (px, py): (f64, f64)) -> (f64, f64) {
        (px * self.k + self.x, py * self.k + self.y)
    }

    pub fn invert(&self, (px, py): (f64, f64)) -> (f64, f64) {
        ((px - self.x) / self.k, (py - self.y) / self.k)
    }

    /// Scales by `factor` around `anchor`, which stays put on screen
    pub fn zoom_at(self, anchor: (f64, f64), factor: f64) -> Self {
        let k = (self.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
        let (ox, oy) = self.invert(anchor);
        Self { k, x: anchor.0 - ox * k, y: anchor.1 - oy * k }
    }

    /// Brings a persisted transform back into range: `k` is clamped to
    /// `[MIN_ZOOM, MAX_ZOOM]` and a non-finite transform resets to identity.
    pub fn clamped(self) -> Self {
        if !(self.k.is_finite() && self.x.is_finite() && self.y.is_finite()) {
            log::warn!("Ignoring invalid zoom transform {:?}", self);
            return Self::identity();
        }
        let k = self.k.clamp(MIN_ZOOM, MAX_ZOOM);
        if k != self.k {
            log::warn!("Zoom scale {} out of range, clamped to {}", self.k, k);
        }
        Self { k, ..self }
    }

    pub fn pan_by(self, dx: f64, dy: f64) -> Self {
        Self { x: self.x + dx, y: self.y + dy, ..self }
    }

    pub fn reset(self) -> Self {
        Self::identity()
    }

    /// Horizontal axis seen through the transform; ordinal axes are unchanged
    pub fn rescale_x(&self, scale: &AxisScale) -> AxisScale {
        self.rescale(scale, self.x)
    }

    /// Vertical axis seen through the transform; ordinal axes are unchanged
    pub fn rescale_y(&self, scale: &AxisScale) -> AxisScale {
        self.rescale(scale, self.y)
    }

    fn rescale(&self, scale: &AxisScale, translate: f64) -> AxisScale {
        let linear = match (&scale.domain, scale.linear()) {
            (AxisDomain::Continuous(..), Some(linear)) => linear,
            _ => return scale.clone(),
        };
        let (r0, r1) = scale.range;
        let d0 = linear.invert((r0 - translate) / self.k);
        let d1 = linear.invert((r1 - translate) / self.k);
        scale.with_domain(AxisDomain::Continuous(d0, d1))
    }
}

/// The point under the pointer, with its tooltip rows
#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub mark: PointMark,
    /// `(column, formatted value)` pairs
    pub lines: Vec<(String, String)>,
}

/// Index of the mark closest to `pointer`, if it lies within the mark's
/// radius plus the tolerance
pub fn nearest_mark<'m, I>(marks: I, pointer: (f64, f64)) -> Option<usize>
where
    I: IntoIterator<Item = &'m PointMark>,
{
    marks
        .into_iter()
        .enumerate()
        .map(|(i, m)| {
            let (dx, dy) = (m.center.0 - pointer.0, m.center.1 - pointer.1);
            (i, (dx * dx + dy * dy).sqrt(), m.radius())
        })
        .filter(|(_, dist, radius)| *dist <= radius + TOOLTIP_TOLERANCE)
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _, _)| i)
}

/// Tooltip rows for a point: X, Y, then every other encoded column once
pub fn tooltip_lines(settings: &Settings, point: &Point) -> Vec<(String, String)> {
    let mut columns: Vec<&str> = settings.main_values.iter().take(2).map(|c| c.name.as_str()).collect();
    for slot in [Encoding::Color, Encoding::Size, Encoding::Symbol, Encoding::Label] {
        columns.extend(settings.encoding(slot));
    }
    columns.extend(settings.tooltip_columns());

    let mut lines: Vec<(String, String)> = Vec::new();
    for column in columns {
        if lines.iter().any(|(c, _)| c == column) {
            continue;
        }
        let column_type = settings.column_type(column).unwrap_or_default();
        if let Some(value) = point.row.get(column).and_then(|v| to_value(column_type, v)) {
            lines.push((column.to_string(), value));
        }
    }
    if !point.key.is_empty() && !settings.split_values.is_empty() {
        lines.push(("Split".to_string(), point.key.clone()));
    }
    lines
}

/// Picks the tooltip for `pointer` among `marks`
pub fn find_tooltip(settings: &Settings, marks: &[(&Point, PointMark)], pointer: (f64, f64)) -> Option<Tooltip> {
    let idx = nearest_mark(marks.iter().map(|(_, m)| m), pointer)?;
    let (point, mark) = &marks[idx];
    Some(Tooltip { mark: mark.clone(), lines: tooltip_lines(settings, point) })
}

impl Tooltip {
    /// Highlight ring plus a box of rows, kept inside `bounds`
    pub fn draw(&self, bounds: PixelRect, style: &TextStyle, commands: &mut Vec<DrawCommand>) {
        let (cx, cy) = self.mark.center;
        commands.push(DrawCommand::Circle {
            center: self.mark.center,
            radius: self.mark.radius() + 3.0,
            fill: Rgba::WHITE.with_opacity(0.0),
            stroke: Some(StrokeStyle::new(self.mark.stroke, 2.0)),
        });

        let line_height = style.size + 4.0;
        let longest = self
            .lines
            .iter()
            .map(|(c, v)| c.chars().count() + v.chars().count() + 2)
            .max()
            .unwrap_or(0);
        let width = longest as f64 * style.size * 0.6 + 16.0;
        let height = self.lines.len() as f64 * line_height + 12.0;

        let mut x = cx + self.mark.radius() + 10.0;
        let mut y = cy - height / 2.0;
        if x + width > bounds.right() {
            x = cx - self.mark.radius() - 10.0 - width;
        }
        x = x.max(bounds.x);
        y = y.clamp(bounds.y, (bounds.bottom() - height).max(bounds.y));

        let frame = PixelRect::new(x, y, width, height);
        commands.push(DrawCommand::Rect {
            rect: frame,
            fill: Some(Rgba::WHITE.with_opacity(0.9)),
            stroke: Some(StrokeStyle::new(Rgba::GRAY, 1.0)),
        });
        for (i, (column, value)) in self.lines.iter().enumerate() {
            commands.push(DrawCommand::Text {
                position: (x + 8.0, y + 6.0 + line_height * (i as f64 + 1.0) - 4.0),
                text: format!("{}: {}", column, value),
                style: style.clone(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::AxisKind;
    use crate::data::Coord;
    use crate::settings::{ColumnDescriptor, ColumnType};
    use crate::symbol::SymbolShape;
    use serde_json::json;

    fn mark(center: (f64, f64), area: f64) -> PointMark {
        PointMark {
            center,
            area,
            shape: SymbolShape::Circle,
            stroke: Rgba::BLACK,
            fill: Rgba::BLACK,
            label: None,
            key: String::new(),
        }
    }

    #[test]
    fn test_zoom_at_keeps_anchor() {
        let t = ZoomTransform::identity().zoom_at((100.0, 50.0), 2.0);
        assert_eq!(t.k, 2.0);
        assert_eq!(t.apply((100.0, 50.0)), (100.0, 50.0));
        assert_eq!(t.apply((0.0, 0.0)), (-100.0, -50.0));
    }

    #[test]
    fn test_zoom_is_clamped() {
        let t = ZoomTransform::identity().zoom_at((0.0, 0.0), 100.0);
        assert_eq!(t.k, MAX_ZOOM);
        let t = t.zoom_at((0.0, 0.0), 0.0001);
        assert_eq!(t.k, MIN_ZOOM);
    }

    #[test]
    fn test_persisted_zoom_is_clamped() {
        let t = ZoomTransform { k: 0.0, x: 4.0, y: 2.0 }.clamped();
        assert_eq!(t, ZoomTransform { k: MIN_ZOOM, x: 4.0, y: 2.0 });
        assert_eq!(ZoomTransform { k: 1000.0, x: 0.0, y: 0.0 }.clamped().k, MAX_ZOOM);
        assert!(ZoomTransform { k: f64::NAN, x: 0.0, y: 0.0 }.clamped().is_identity());
        assert!(ZoomTransform { k: 2.0, x: f64::INFINITY, y: 0.0 }.clamped().is_identity());
        let ok = ZoomTransform { k: 3.0, x: -10.0, y: 5.0 };
        assert_eq!(ok.clamped(), ok);
    }

    #[test]
    fn test_pan_and_reset() {
        let t = ZoomTransform::identity().pan_by(5.0, -3.0).pan_by(1.0, 1.0);
        assert_eq!((t.x, t.y), (6.0, -2.0));
        assert!(t.reset().is_identity());
    }

    #[test]
    fn test_rescale_continuous_axis() {
        let scale = AxisScale { kind: AxisKind::Linear, domain: AxisDomain::Continuous(0.0, 100.0), range: (0.0, 100.0) };
        let t = ZoomTransform { k: 2.0, x: -50.0, y: 0.0 };
        assert_eq!(t.rescale_x(&scale).domain, AxisDomain::Continuous(25.0, 75.0));
        assert_eq!(ZoomTransform::identity().rescale_y(&scale), scale);

        let ordinal = AxisScale { kind: AxisKind::Ordinal, domain: AxisDomain::Categories(vec!["a".into()]), range: (0.0, 100.0) };
        assert_eq!(t.rescale_x(&ordinal), ordinal);
    }

    #[test]
    fn test_nearest_mark_within_tolerance() {
        let marks = vec![mark((0.0, 0.0), 64.0), mark((30.0, 0.0), 64.0)];
        assert_eq!(nearest_mark(&marks, (2.0, 1.0)), Some(0));
        assert_eq!(nearest_mark(&marks, (26.0, 0.0)), Some(1));
        // radius of area 64 is ~4.51, so 15px away is out of reach
        assert_eq!(nearest_mark(&marks, (15.0, 0.0)), None);
    }

    #[test]
    fn test_tooltip_lines_dedupe_and_format() {
        let settings = Settings {
            real_values: vec![
                Some("x".into()),
                Some("y".into()),
                Some("x".into()),
                None,
                None,
                Some("name".into()),
                Some("pop".into()),
            ],
            main_values: vec![
                ColumnDescriptor::new("x", ColumnType::Float),
                ColumnDescriptor::new("y", ColumnType::Integer),
                ColumnDescriptor::new("name", ColumnType::String),
                ColumnDescriptor::new("pop", ColumnType::Integer),
            ],
            ..Settings::default()
        };
        let point = Point {
            x: Coord::Number(1.5),
            y: Coord::Number(2.0),
            color_value: None,
            size: None,
            key: String::new(),
            row: json!({"x": 1.5, "y": 2, "name": "Oslo", "pop": 709037})
                .as_object()
                .cloned()
                .unwrap(),
        };
        let lines = tooltip_lines(&settings, &point);
        assert_eq!(
            lines,
            vec![
                ("x".to_string(), "1.50".to_string()),
                ("y".to_string(), "2".to_string()),
                ("name".to_string(), "Oslo".to_string()),
                ("pop".to_string(), "709,037".to_string()),
            ]
        );
    }

    #[test]
    fn test_zoom_transform_deserializes_partial() {
        let t: ZoomTransform = serde_json::from_str(r#"{"k": 3}"#).unwrap();
        assert_eq!(t, ZoomTransform { k: 3.0, x: 0.0, y: 0.0 });
    }
}
