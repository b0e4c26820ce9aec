// Library exports for xyscatter

pub mod settings;
pub mod data;
pub mod format;
pub mod color;
pub mod symbol;
pub mod scale;
pub mod axis;
pub mod series;
pub mod legend;
pub mod interact;
pub mod facet;
pub mod chart;
pub mod ir;
pub mod render;
pub mod xy_scatter;

pub use settings::Settings;
pub use xy_scatter::{render_chart, xy_scatter, xy_scatter_grid, RenderedChart, PLUGIN};

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
    #[serde(rename = "svg")]
    Svg,
}

/// Which of the two scatter variants to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default, clap::ValueEnum)]
pub enum ChartLayout {
    /// One combined chart with zoom, tooltip and legend
    #[serde(rename = "single")]
    #[default]
    Single,
    /// Small multiples, one facet per group key
    #[serde(rename = "grid")]
    Grid,
}

/// The render target a chart is bound to.
///
/// Stands in for the host's container element: its client size drives the
/// responsive scale factor and the layout, and `pointer` (if any) is the
/// cursor position used by the proximity tooltip.
#[derive(Debug, Clone, PartialEq)]
pub struct Container {
    pub width: u32,
    pub height: u32,
    pub pointer: Option<(f64, f64)>,
}

impl Container {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, pointer: None }
    }

    pub fn with_pointer(mut self, x: f64, y: f64) -> Self {
        self.pointer = Some((x, y));
        self
    }

    /// Length of the container's shorter side in pixels
    pub fn shortest_axis(&self) -> f64 {
        self.width.min(self.height) as f64
    }
}
