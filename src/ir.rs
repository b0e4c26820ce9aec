use crate::color::Rgba;
use crate::settings::TextStyles;

// =============================================================================
// Scene Graph
// =============================================================================

/// Axis-aligned rectangle in pixel space
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width: width.max(0.0), height: height.max(0.0) }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    pub fn contains(&self, (px, py): (f64, f64)) -> bool {
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }

    /// Shrinks the rectangle by the given margins
    pub fn inset(&self, top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self::new(self.x + left, self.y + top, self.width - left - right, self.height - top - bottom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAnchor {
    #[default]
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub color: Rgba,
    pub size: f64,
    pub family: String,
    pub anchor: TextAnchor,
    /// Rotated 90 degrees counter-clockwise
    pub vertical: bool,
}

impl TextStyle {
    pub fn new(color: Rgba, size: f64) -> Self {
        Self {
            color,
            size,
            family: "sans-serif".to_string(),
            anchor: TextAnchor::Start,
            vertical: false,
        }
    }

    /// Label style configured by the host; unparseable colors fall back to dark grey
    pub fn from_styles(styles: &TextStyles) -> Self {
        let font = styles.font_spec();
        let color = crate::color::parse_css_color(&styles.color).unwrap_or_else(|e| {
            log::warn!("Ignoring text color: {}", e);
            Rgba::rgb(51, 51, 51)
        });
        Self { family: font.family, ..Self::new(color, font.size) }
    }

    pub fn anchor(self, anchor: TextAnchor) -> Self {
        Self { anchor, ..self }
    }

    pub fn vertical(self) -> Self {
        Self { vertical: true, ..self }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub color: Rgba,
    pub width: f64,
}

impl StrokeStyle {
    pub fn new(color: Rgba, width: f64) -> Self {
        Self { color, width }
    }
}

/// A list of primitive drawing commands.
/// The Backend just executes these blindly.
#[derive(Debug, Clone)]
pub struct SceneGraph {
    pub width: u32,
    pub height: u32,
    pub background: Rgba,
    pub panels: Vec<PanelScene>,
    /// Legend, tooltip and other chart-level marks drawn above the panels
    pub overlay: Vec<DrawCommand>,
}

impl SceneGraph {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            background: Rgba::WHITE,
            panels: Vec::new(),
            overlay: Vec::new(),
        }
    }

    /// Every command in paint order
    pub fn commands(&self) -> impl Iterator<Item = &DrawCommand> {
        self.panels
            .iter()
            .flat_map(|p| p.commands.iter())
            .chain(self.overlay.iter())
    }

    /// Text of every text command, in paint order
    pub fn texts(&self) -> Vec<&str> {
        self.commands()
            .filter_map(|c| match c {
                DrawCommand::Text { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct PanelScene {
    pub row: usize,
    pub col: usize,
    pub title: Option<String>,
    /// Where the marks live; everything outside it is axes and labels
    pub plot_area: PixelRect,
    pub commands: Vec<DrawCommand>,
}

/// All positions are absolute pixels, y growing downward
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Line {
        points: Vec<(f64, f64)>,
        stroke: StrokeStyle,
    },
    Rect {
        rect: PixelRect,
        fill: Option<Rgba>,
        stroke: Option<StrokeStyle>,
    },
    Circle {
        center: (f64, f64),
        radius: f64,
        fill: Rgba,
        stroke: Option<StrokeStyle>,
    },
    Polygon {
        points: Vec<(f64, f64)>,
        fill: Rgba,
        stroke: Option<StrokeStyle>,
    },
    /// Horizontal gradient bar, stops are `(offset in [0, 1], color)`
    Gradient {
        rect: PixelRect,
        stops: Vec<(f64, Rgba)>,
    },
    Text {
        position: (f64, f64),
        text: String,
        style: TextStyle,
    },
}
