//! Chart composition: frame, axes, gridlines, point marks, legend and
//! tooltip, laid out into a `SceneGraph`.

use crate::axis::{Axis, AxisDomain, AxisKind, AxisScale};
use crate::color::Rgba;
use crate::data::{Point, Series};
use crate::facet::FacetLayout;
use crate::interact::{find_tooltip, Tooltip, ZoomTransform};
use crate::ir::{DrawCommand, PanelScene, PixelRect, SceneGraph, StrokeStyle, TextAnchor, TextStyle};
use crate::legend::{Legend, LEGEND_WIDTH};
use crate::series::{PointMark, PointSeries};
use crate::settings::Settings;
use crate::Container;

pub const MARGIN: f64 = 10.0;
pub const Y_AXIS_WIDTH: f64 = 64.0;
pub const X_AXIS_HEIGHT: f64 = 44.0;
pub const TITLE_HEIGHT: f64 = 22.0;

/// Minimum pixels between ordinal tick labels
const MIN_ORDINAL_SPACING: f64 = 24.0;

const GRID_COLOR: Rgba = Rgba::rgb(234, 234, 234);
const AXIS_COLOR: Rgba = Rgba::rgb(102, 102, 102);

/// Everything the composer needs, built once by the render entry point.
pub struct ChartParts<'a> {
    pub settings: &'a Settings,
    pub series: &'a [Series],
    pub x_axis: &'a Axis,
    pub y_axis: &'a Axis,
    pub points: &'a PointSeries<'a>,
    pub legend: Option<&'a Legend>,
    pub label_style: TextStyle,
}

impl ChartParts<'_> {
    fn axis_style(&self) -> TextStyle {
        TextStyle {
            color: AXIS_COLOR,
            ..self.label_style.clone()
        }
    }
}

#[derive(Debug, Clone)]
pub struct Composition {
    pub scene: SceneGraph,
    pub tooltip: Option<Tooltip>,
    /// Marks drawn inside the plot areas
    pub mark_count: usize,
}

/// Plot area and the axis scales bound to it
#[derive(Debug, Clone, PartialEq)]
pub struct PanelFrame {
    pub plot_area: PixelRect,
    pub x_scale: AxisScale,
    pub y_scale: AxisScale,
}

impl PanelFrame {
    pub fn layout(bounds: PixelRect, x_axis: &Axis, y_axis: &Axis, zoom: &ZoomTransform, titled: bool) -> Self {
        let top = if titled { TITLE_HEIGHT } else { MARGIN };
        let plot_area = bounds.inset(top, MARGIN, X_AXIS_HEIGHT, Y_AXIS_WIDTH);
        let x_scale = zoom.rescale_x(&x_axis.scale((plot_area.x, plot_area.right())));
        let y_scale = zoom.rescale_y(&y_axis.scale((plot_area.bottom(), plot_area.y)));
        Self { plot_area, x_scale, y_scale }
    }

    pub fn gridlines(&self, commands: &mut Vec<DrawCommand>) {
        let stroke = StrokeStyle::new(GRID_COLOR, 1.0);
        let area = self.plot_area;
        for tick in visible_ticks(&self.x_scale) {
            commands.push(DrawCommand::Line {
                points: vec![(tick.0, area.y), (tick.0, area.bottom())],
                stroke,
            });
        }
        for tick in visible_ticks(&self.y_scale) {
            commands.push(DrawCommand::Line {
                points: vec![(area.x, tick.0), (area.right(), tick.0)],
                stroke,
            });
        }
    }

    /// Axis lines, ticks, tick labels and axis titles
    pub fn axes(&self, x_label: &str, y_label: &str, style: &TextStyle, commands: &mut Vec<DrawCommand>) {
        let area = self.plot_area;
        let stroke = StrokeStyle::new(AXIS_COLOR, 1.0);

        commands.push(DrawCommand::Line {
            points: vec![(area.x, area.bottom()), (area.right(), area.bottom())],
            stroke,
        });
        commands.push(DrawCommand::Line {
            points: vec![(area.x, area.y), (area.x, area.bottom())],
            stroke,
        });

        for (x, label) in visible_ticks(&self.x_scale) {
            commands.push(DrawCommand::Line {
                points: vec![(x, area.bottom()), (x, area.bottom() + 5.0)],
                stroke,
            });
            commands.push(DrawCommand::Text {
                position: (x, area.bottom() + 8.0 + style.size),
                text: label,
                style: style.clone().anchor(TextAnchor::Middle),
            });
        }
        for (y, label) in visible_ticks(&self.y_scale) {
            commands.push(DrawCommand::Line {
                points: vec![(area.x - 5.0, y), (area.x, y)],
                stroke,
            });
            commands.push(DrawCommand::Text {
                position: (area.x - 8.0, y + style.size / 3.0),
                text: label,
                style: style.clone().anchor(TextAnchor::End),
            });
        }

        commands.push(DrawCommand::Text {
            position: (area.center().0, area.bottom() + X_AXIS_HEIGHT - 6.0),
            text: x_label.to_string(),
            style: style.clone().anchor(TextAnchor::Middle),
        });
        commands.push(DrawCommand::Text {
            position: (area.x - Y_AXIS_WIDTH + style.size + 2.0, area.center().1),
            text: y_label.to_string(),
            style: style.clone().anchor(TextAnchor::Middle).vertical(),
        });
    }
}

/// Ticks inside the scale's pixel range, thinned out on crowded ordinal axes
fn visible_ticks(scale: &AxisScale) -> Vec<(f64, String)> {
    let ticks = scale.ticks();
    let every = match (&scale.domain, scale.kind) {
        (AxisDomain::Categories(c), AxisKind::Ordinal) if !c.is_empty() => {
            let span = (scale.range.1 - scale.range.0).abs();
            let spacing = span / c.len() as f64;
            (MIN_ORDINAL_SPACING / spacing.max(1.0)).ceil().max(1.0) as usize
        }
        _ => 1,
    };
    ticks
        .into_iter()
        .step_by(every)
        .filter(|t| scale.contains_pixel(t.position))
        .map(|t| (t.position, t.label))
        .collect()
}

/// Marks of `series` that land inside the plot area
fn panel_marks<'s>(parts: &ChartParts, series: &'s [Series], frame: &PanelFrame) -> Vec<(&'s Point, PointMark)> {
    parts
        .points
        .marks(series, &frame.x_scale, &frame.y_scale)
        .into_iter()
        .filter(|(_, m)| frame.plot_area.contains(m.center))
        .collect()
}

/// Splits off the legend column on the right when there is a legend
fn split_legend(bounds: PixelRect, legend: Option<&Legend>) -> (PixelRect, Option<PixelRect>) {
    match legend {
        Some(_) if bounds.width > LEGEND_WIDTH * 2.0 => (
            bounds.inset(0.0, LEGEND_WIDTH, 0.0, 0.0),
            Some(PixelRect::new(bounds.right() - LEGEND_WIDTH, MARGIN, LEGEND_WIDTH, bounds.height - 2.0 * MARGIN)),
        ),
        _ => (bounds, None),
    }
}

/// One combined chart with zoom, tooltip and legend
pub fn single_chart(container: &Container, parts: &ChartParts, zoom: ZoomTransform) -> Composition {
    let mut scene = SceneGraph::new(container.width, container.height);
    let bounds = PixelRect::new(0.0, 0.0, container.width as f64, container.height as f64);
    let (chart_bounds, legend_area) = split_legend(bounds, parts.legend);
    let frame = PanelFrame::layout(chart_bounds, parts.x_axis, parts.y_axis, &zoom, false);
    let axis_style = parts.axis_style();

    let mut commands = Vec::new();
    frame.gridlines(&mut commands);
    let marks = panel_marks(parts, parts.series, &frame);
    for (_, mark) in &marks {
        mark.draw(&parts.label_style, &mut commands);
    }
    frame.axes(&parts.x_axis.label, &parts.y_axis.label, &axis_style, &mut commands);

    scene.panels.push(PanelScene {
        row: 0,
        col: 0,
        title: None,
        plot_area: frame.plot_area,
        commands,
    });

    if let (Some(legend), Some(area)) = (parts.legend, legend_area) {
        legend.draw(area, &parts.label_style, &mut scene.overlay);
    }

    let tooltip = container
        .pointer
        .filter(|p| frame.plot_area.contains(*p))
        .and_then(|p| find_tooltip(parts.settings, &marks, p));
    if let Some(tooltip) = &tooltip {
        tooltip.draw(chart_bounds, &parts.label_style, &mut scene.overlay);
    }

    log::debug!(
        "Composed single chart: {} marks, zoom k={}",
        marks.len(),
        zoom.k
    );

    Composition {
        scene,
        tooltip,
        mark_count: marks.len(),
    }
}

/// Small multiples: one titled panel per group key, sharing axes and one legend
pub fn grid_chart(container: &Container, parts: &ChartParts) -> Composition {
    let mut scene = SceneGraph::new(container.width, container.height);
    let bounds = PixelRect::new(0.0, 0.0, container.width as f64, container.height as f64);
    let (chart_bounds, legend_area) = split_legend(bounds, parts.legend);
    let axis_style = parts.axis_style();
    let identity = ZoomTransform::identity();

    let layout = FacetLayout::from_series(parts.series).fit_to(chart_bounds);
    let mut mark_count = 0;

    if layout.is_empty() {
        let frame = PanelFrame::layout(chart_bounds, parts.x_axis, parts.y_axis, &identity, false);
        let mut commands = Vec::new();
        frame.gridlines(&mut commands);
        frame.axes(&parts.x_axis.label, &parts.y_axis.label, &axis_style, &mut commands);
        scene.panels.push(PanelScene { row: 0, col: 0, title: None, plot_area: frame.plot_area, commands });
    }

    for (index, title) in layout.panel_titles.iter().enumerate() {
        let cell = layout.cell(index, chart_bounds);
        let frame = PanelFrame::layout(cell, parts.x_axis, parts.y_axis, &identity, true);
        let facet_series = std::slice::from_ref(&parts.series[index]);

        let mut commands = Vec::new();
        commands.push(DrawCommand::Text {
            position: (frame.plot_area.center().0, cell.y + TITLE_HEIGHT - 6.0),
            text: title.clone(),
            style: parts.label_style.clone().anchor(TextAnchor::Middle),
        });
        frame.gridlines(&mut commands);
        let marks = panel_marks(parts, facet_series, &frame);
        for (_, mark) in &marks {
            mark.draw(&parts.label_style, &mut commands);
        }
        frame.axes(&parts.x_axis.label, &parts.y_axis.label, &axis_style, &mut commands);
        mark_count += marks.len();

        let (row, col) = layout.position(index);
        scene.panels.push(PanelScene {
            row,
            col,
            title: Some(title.clone()),
            plot_area: frame.plot_area,
            commands,
        });
    }

    if let (Some(legend), Some(area)) = (parts.legend, legend_area) {
        legend.draw(area, &parts.label_style, &mut scene.overlay);
    }

    log::debug!("Composed grid chart: {} panels, {} marks", layout.len(), mark_count);

    Composition {
        scene,
        tooltip: None,
        mark_count,
    }
}
