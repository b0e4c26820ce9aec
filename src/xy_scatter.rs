//! Render entry points of the X/Y scatter plugin.

use anyhow::{bail, Context, Result};
use serde::Serialize;

use crate::axis::{Axis, AxisConfig, Orientation, PointValue};
use crate::chart::{grid_chart, single_chart, ChartParts, Composition};
use crate::color::{ColorBranch, ColorEncoding};
use crate::data::{filter_data_by_group, point_data};
use crate::interact::{Tooltip, ZoomTransform};
use crate::ir::{SceneGraph, TextStyle};
use crate::legend::Legend;
use crate::scale::{interpolate_scale, SizeScale};
use crate::series::{PointSeries, PointSeriesConfig};
use crate::settings::{AxisMemo, Encoding, Settings};
use crate::symbol::{override_symbols, symbol_scale_from_column, symbol_scale_from_groups, SymbolScale};
use crate::{ChartLayout, Container};

/// Calibration points `(shortest side, factor)` of the responsive symbol scale
const SCALE_FACTOR_SMALL: (f64, f64) = (600.0, 0.1);
const SCALE_FACTOR_LARGE: (f64, f64) = (1600.0, 1.0);

#[derive(Debug, Clone, Serialize)]
pub struct PluginInitial {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub count: usize,
    pub names: &'static [&'static str],
}

/// Registration metadata the host reads to offer the chart
#[derive(Debug, Clone, Serialize)]
pub struct PluginInfo {
    pub name: &'static str,
    pub category: &'static str,
    pub max_cells: usize,
    pub max_columns: usize,
    pub render_warning: bool,
    pub initial: PluginInitial,
    #[serde(rename = "selectMode")]
    pub select_mode: &'static str,
}

pub const PLUGIN: PluginInfo = PluginInfo {
    name: "X/Y Scatter",
    category: "X/Y Chart",
    max_cells: 50000,
    max_columns: 50,
    render_warning: true,
    initial: PluginInitial {
        kind: "number",
        count: 2,
        names: &["X Axis", "Y Axis", "Color", "Size", "Symbol", "Label", "Tooltip"],
    },
    select_mode: "toggle",
};

/// Output of one render, plus the state the host should persist
#[derive(Debug, Clone)]
pub struct RenderedChart {
    pub scene: SceneGraph,
    /// Axis state for `settings.axisMemo` on the next render
    pub axis_memo: [AxisMemo; 2],
    pub zoom: ZoomTransform,
    pub color_branch: ColorBranch,
    pub legend: Option<Legend>,
    pub tooltip: Option<Tooltip>,
    pub scale_factor: f64,
    pub mark_count: usize,
}

/// Single combined chart with zoom, tooltip and legend
pub fn xy_scatter(container: &Container, settings: &Settings) -> Result<RenderedChart> {
    let symbol_col = settings.encoding(Encoding::Symbol);
    let symbols = override_symbols(settings, symbol_scale_from_column(settings, symbol_col));
    build(container, settings, ChartLayout::Single, symbol_col, symbols)
}

/// Faceted variant: one panel per group key, symbols by group
pub fn xy_scatter_grid(container: &Container, settings: &Settings) -> Result<RenderedChart> {
    let symbols = override_symbols(settings, Some(symbol_scale_from_groups(settings)));
    build(container, settings, ChartLayout::Grid, None, symbols)
}

pub fn render_chart(container: &Container, settings: &Settings, layout: ChartLayout) -> Result<RenderedChart> {
    match layout {
        ChartLayout::Single => xy_scatter(container, settings),
        ChartLayout::Grid => xy_scatter_grid(container, settings),
    }
}

fn build(
    container: &Container,
    settings: &Settings,
    layout: ChartLayout,
    symbol_col: Option<&str>,
    symbols: Option<SymbolScale>,
) -> Result<RenderedChart> {
    if container.width == 0 || container.height == 0 {
        bail!("Cannot render into an empty {}x{} container", container.width, container.height);
    }

    let rows = filter_data_by_group(settings);
    let series = point_data(settings, &rows).context("Failed to build point data")?;
    log::debug!(
        "Rendering {:?} scatter: {} of {} rows in {} series",
        layout,
        rows.len(),
        settings.data.len(),
        series.len()
    );

    let color = ColorEncoding::select(settings, &series, symbols.as_ref());
    let size_scale = settings
        .encoding(Encoding::Size)
        .map(|_| SizeScale::from_series(&series));
    let label_column = settings
        .encoding(Encoding::Label)
        .map(|c| (c, settings.column_type(c).unwrap_or_default()));
    let scale_factor = interpolate_scale(SCALE_FACTOR_SMALL, SCALE_FACTOR_LARGE)(container);

    let points = PointSeries::new(PointSeriesConfig {
        symbol_column: symbol_col,
        symbols: symbols.as_ref(),
        size_scale,
        color: &color,
        opacity: settings.color_styles.opacity,
        label_column,
        scale_factor,
    });

    // point_data has already checked there are two main values
    let x_axis = Axis::build(
        AxisConfig::new(settings.main_values[0].clone(), Orientation::Horizontal, PointValue::X)
            .memo(settings.axis_memo(0)),
        &series,
    )
    .nice();
    let y_axis = Axis::build(
        AxisConfig::new(settings.main_values[1].clone(), Orientation::Vertical, PointValue::Y)
            .memo(settings.axis_memo(1)),
        &series,
    )
    .nice();

    let parts = ChartParts {
        settings,
        series: &series,
        x_axis: &x_axis,
        y_axis: &y_axis,
        points: &points,
        legend: color.legend(),
        label_style: TextStyle::from_styles(&settings.text_styles),
    };

    let zoom = match layout {
        ChartLayout::Single => settings.zoom.unwrap_or_default().clamped(),
        ChartLayout::Grid => ZoomTransform::identity(),
    };
    let Composition { scene, tooltip, mark_count } = match layout {
        ChartLayout::Single => single_chart(container, &parts, zoom),
        ChartLayout::Grid => grid_chart(container, &parts),
    };

    Ok(RenderedChart {
        scene,
        axis_memo: [x_axis.memo(), y_axis.memo()],
        zoom,
        color_branch: color.branch(),
        legend: color.legend().cloned(),
        tooltip,
        scale_factor,
        mark_count,
    })
}
