use anyhow::{anyhow, Context, Result};
use image::ImageEncoder;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::color::{interpolate_stops, Rgba};
use crate::ir::{self, DrawCommand, SceneGraph};
use crate::OutputFormat;

/// Rasterises or serialises a scene
pub fn render_scene(scene: &SceneGraph, format: OutputFormat) -> Result<Vec<u8>> {
    if scene.width == 0 || scene.height == 0 {
        anyhow::bail!("Cannot render a {}x{} scene", scene.width, scene.height);
    }
    match format {
        OutputFormat::Png => render_png(scene),
        OutputFormat::Svg => render_svg(scene),
    }
}

fn render_png(scene: &SceneGraph) -> Result<Vec<u8>> {
    let mut buffer = vec![0u8; (scene.width * scene.height * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, (scene.width, scene.height)).into_drawing_area();
        draw_scene(&root, scene)?;
        root.present().context("Failed to present drawing")?;
    }

    let mut png_bytes = Vec::new();
    {
        let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
        encoder
            .write_image(&buffer, scene.width, scene.height, image::ColorType::Rgb8)
            .context("Failed to encode PNG")?;
    }

    Ok(png_bytes)
}

fn render_svg(scene: &SceneGraph) -> Result<Vec<u8>> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (scene.width, scene.height)).into_drawing_area();
        draw_scene(&root, scene)?;
        root.present().map_err(|e| anyhow!("Failed to present drawing: {:?}", e))?;
    }
    Ok(svg.into_bytes())
}

fn draw_scene<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, scene: &SceneGraph) -> Result<()> {
    root.fill(&to_plotters(scene.background))
        .map_err(|e| anyhow!("Failed to fill background: {:?}", e))?;

    let mut text_failures = 0usize;
    for command in scene.commands() {
        if let DrawCommand::Text { .. } = command {
            // Missing system fonts should not cost the whole chart
            if let Err(e) = draw_command(root, command) {
                if text_failures == 0 {
                    log::warn!("Failed to draw text: {}", e);
                }
                text_failures += 1;
            }
        } else {
            draw_command(root, command)?;
        }
    }
    if text_failures > 1 {
        log::warn!("{} text labels could not be drawn", text_failures);
    }
    Ok(())
}

fn draw_command<DB: DrawingBackend>(root: &DrawingArea<DB, Shift>, command: &DrawCommand) -> Result<()> {
    let result = match command {
        DrawCommand::Line { points, stroke } => {
            let style = to_plotters(stroke.color).stroke_width(stroke_width(stroke.width));
            root.draw(&PathElement::new(pixels(points), style))
        }
        DrawCommand::Rect { rect, fill, stroke } => {
            let corners = [pixel((rect.x, rect.y)), pixel((rect.right(), rect.bottom()))];
            if let Some(fill) = fill.filter(|c| c.a > 0.0) {
                root.draw(&Rectangle::new(corners, to_plotters(fill).filled()))
                    .map_err(|e| anyhow!("Failed to draw rectangle: {:?}", e))?;
            }
            match stroke {
                Some(s) => root.draw(&Rectangle::new(
                    corners,
                    to_plotters(s.color).stroke_width(stroke_width(s.width)),
                )),
                None => Ok(()),
            }
        }
        DrawCommand::Circle { center, radius, fill, stroke } => {
            let center = pixel(*center);
            let radius = radius.round().max(1.0) as i32;
            if fill.a > 0.0 {
                root.draw(&Circle::new(center, radius, to_plotters(*fill).filled()))
                    .map_err(|e| anyhow!("Failed to draw point: {:?}", e))?;
            }
            match stroke {
                Some(s) => root.draw(&Circle::new(
                    center,
                    radius,
                    to_plotters(s.color).stroke_width(stroke_width(s.width)),
                )),
                None => Ok(()),
            }
        }
        DrawCommand::Polygon { points, fill, stroke } => {
            let outline = pixels(points);
            root.draw(&Polygon::new(outline.clone(), to_plotters(*fill).filled()))
                .map_err(|e| anyhow!("Failed to draw symbol: {:?}", e))?;
            match (stroke, outline.first()) {
                (Some(s), Some(first)) => {
                    let mut closed = outline.clone();
                    closed.push(*first);
                    root.draw(&PathElement::new(
                        closed,
                        to_plotters(s.color).stroke_width(stroke_width(s.width)),
                    ))
                }
                _ => Ok(()),
            }
        }
        DrawCommand::Gradient { rect, stops } => {
            let width = rect.width.round().max(1.0) as i32;
            let (x0, y0) = pixel((rect.x, rect.y));
            let y1 = rect.bottom().round() as i32;
            for dx in 0..width {
                let t = dx as f64 / (width - 1).max(1) as f64;
                let color = interpolate_stops(stops, t);
                root.draw(&Rectangle::new(
                    [(x0 + dx, y0), (x0 + dx + 1, y1)],
                    to_plotters(color).filled(),
                ))
                .map_err(|e| anyhow!("Failed to draw gradient: {:?}", e))?;
            }
            Ok(())
        }
        DrawCommand::Text { position, text, style } => {
            root.draw(&Text::new(text.clone(), pixel(*position), text_style(style)))
        }
    };
    result.map_err(|e| anyhow!("{:?}", e))
}

fn text_style(style: &ir::TextStyle) -> TextStyle<'_> {
    let h = match style.anchor {
        ir::TextAnchor::Start => HPos::Left,
        ir::TextAnchor::Middle => HPos::Center,
        ir::TextAnchor::End => HPos::Right,
    };
    let font = FontDesc::new(FontFamily::from(style.family.as_str()), style.size, FontStyle::Normal);
    let font = if style.vertical {
        font.transform(FontTransform::Rotate270)
    } else {
        font
    };
    font.color(&to_plotters(style.color)).pos(Pos::new(h, VPos::Bottom))
}

fn to_plotters(color: Rgba) -> RGBAColor {
    RGBAColor(color.r, color.g, color.b, color.a)
}

fn stroke_width(width: f64) -> u32 {
    width.round().max(1.0) as u32
}

fn pixel((x, y): (f64, f64)) -> (i32, i32) {
    (x.round() as i32, y.round() as i32)
}

fn pixels(points: &[(f64, f64)]) -> Vec<(i32, i32)> {
    points.iter().map(|p| pixel(*p)).collect()
}
