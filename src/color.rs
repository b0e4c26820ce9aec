//! Colors: CSS parsing, opacity handling, color scales and the color/legend
//! encoding chosen for a render.

use anyhow::{anyhow, Result};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while_m_n},
    character::complete::{char, multispace0},
    combinator::all_consuming,
    multi::separated_list1,
    number::complete::double,
    sequence::delimited,
    IResult,
};
use serde_json::Value;

use crate::data::{numeric_value, Series};
use crate::format::value_to_string;
use crate::legend::Legend;
use crate::settings::{ColumnType, Encoding, Settings};
use crate::symbol::SymbolScale;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Rgba { r, g, b, a: 1.0 }
    }

    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    pub const GRAY: Rgba = Rgba::rgb(128, 128, 128);

    /// Same color, fully opaque (used for point outlines)
    pub fn without_opacity(self) -> Self {
        Rgba { a: 1.0, ..self }
    }

    /// Same color with the given alpha (used for point fills)
    pub fn with_opacity(self, opacity: f64) -> Self {
        Rgba { a: opacity.clamp(0.0, 1.0), ..self }
    }

    pub fn lerp(self, other: Rgba, t: f64) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgba {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: self.a + (other.a - self.a) * t,
        }
    }

    pub fn to_css(self) -> String {
        format!("rgba({},{},{},{})", self.r, self.g, self.b, self.a)
    }
}

// === CSS parsing ===

fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// `#rgb`, `#rrggbb` or `#rrggbbaa`
fn hex_color(input: &str) -> IResult<&str, Rgba> {
    let (rest, _) = char('#')(input)?;
    let (rest, digits) = take_while_m_n(3, 8, |c: char| c.is_ascii_hexdigit())(rest)?;
    let channel = |s: &str| u8::from_str_radix(s, 16).unwrap_or(0);
    let color = match digits.len() {
        3 => {
            let d: Vec<u8> = digits.chars().map(|c| channel(&c.to_string()) * 17).collect();
            Rgba::rgb(d[0], d[1], d[2])
        }
        6 => Rgba::rgb(channel(&digits[0..2]), channel(&digits[2..4]), channel(&digits[4..6])),
        8 => Rgba {
            a: channel(&digits[6..8]) as f64 / 255.0,
            ..Rgba::rgb(channel(&digits[0..2]), channel(&digits[2..4]), channel(&digits[4..6]))
        },
        _ => {
            return Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Verify,
            )))
        }
    };
    Ok((rest, color))
}

/// `rgb(r, g, b)` or `rgba(r, g, b, a)`
fn rgb_function(input: &str) -> IResult<&str, Rgba> {
    let (rest, _) = alt((tag("rgba"), tag("rgb")))(input)?;
    let (rest, args) = delimited(
        ws(char('(')),
        separated_list1(ws(char(',')), ws(double)),
        ws(char(')')),
    )(rest)?;

    let channel = |v: f64| v.round().clamp(0.0, 255.0) as u8;
    let color = match args.as_slice() {
        [r, g, b] => Rgba::rgb(channel(*r), channel(*g), channel(*b)),
        [r, g, b, a] => Rgba { a: a.clamp(0.0, 1.0), ..Rgba::rgb(channel(*r), channel(*g), channel(*b)) },
        _ => {
            return Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Verify,
            )))
        }
    };
    Ok((rest, color))
}

/// Parse a CSS color: hex, `rgb()`/`rgba()` or a basic named color
pub fn parse_css_color(color: &str) -> Result<Rgba> {
    let color = color.trim();
    if let Ok((_, rgba)) = all_consuming(alt((hex_color, rgb_function)))(color) {
        return Ok(rgba);
    }

    let named = match color.to_lowercase().as_str() {
        "white" => Rgba::WHITE,
        "black" => Rgba::BLACK,
        "red" => Rgba::rgb(255, 0, 0),
        "green" => Rgba::rgb(0, 128, 0),
        "blue" => Rgba::rgb(0, 0, 255),
        "yellow" => Rgba::rgb(255, 255, 0),
        "cyan" => Rgba::rgb(0, 255, 255),
        "magenta" => Rgba::rgb(255, 0, 255),
        "orange" => Rgba::rgb(255, 165, 0),
        "purple" => Rgba::rgb(128, 0, 128),
        "steelblue" => Rgba::rgb(70, 130, 180),
        "gray" | "grey" => Rgba::GRAY,
        "transparent" => Rgba { a: 0.0, ..Rgba::BLACK },
        _ => return Err(anyhow!("Unrecognized color '{}'", color)),
    };
    Ok(named)
}

/// The configured categorical palette; unparseable entries are dropped
pub fn series_palette(settings: &Settings) -> Vec<Rgba> {
    let palette: Vec<Rgba> = settings
        .color_styles
        .series
        .iter()
        .filter_map(|c| match parse_css_color(c) {
            Ok(rgba) => Some(rgba),
            Err(e) => {
                log::warn!("Ignoring series color: {}", e);
                None
            }
        })
        .collect();

    if palette.is_empty() {
        vec![Rgba::rgb(31, 119, 180)]
    } else {
        palette
    }
}

// === Scales ===

/// Ordinal mapping from category labels to palette colors (palette wraps)
#[derive(Debug, Clone, PartialEq)]
pub struct CategoricalColorScale {
    domain: Vec<String>,
    range: Vec<Rgba>,
}

impl CategoricalColorScale {
    pub fn new(domain: Vec<String>, range: Vec<Rgba>) -> Self {
        Self { domain, range }
    }

    pub fn domain(&self) -> &[String] {
        &self.domain
    }

    /// Unknown labels map to the first palette color
    pub fn color_for(&self, label: &str) -> Rgba {
        let idx = self.domain.iter().position(|d| d == label).unwrap_or(0);
        self.range[idx % self.range.len()]
    }

    /// `(label, color)` pairs in domain order
    pub fn entries(&self) -> Vec<(String, Rgba)> {
        self.domain.iter().map(|d| (d.clone(), self.color_for(d))).collect()
    }
}

/// Continuous gradient over a numeric extent.
///
/// When the extent straddles zero the gradient is centred on zero so that
/// the middle stop marks the sign change.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRange {
    pub domain: (f64, f64),
    pub stops: Vec<(f64, Rgba)>,
}

impl ColorRange {
    pub fn new(settings: &Settings, domain: (f64, f64)) -> Self {
        let mut stops: Vec<(f64, Rgba)> = settings
            .color_styles
            .gradient
            .iter()
            .filter_map(|(offset, css)| parse_css_color(css).ok().map(|c| (offset.clamp(0.0, 1.0), c)))
            .collect();
        stops.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        if stops.is_empty() {
            stops = vec![(0.0, Rgba::WHITE), (1.0, Rgba::rgb(31, 119, 180))];
        }
        Self { domain, stops }
    }

    /// Position of a value along the gradient, in `[0, 1]`
    pub fn offset(&self, value: f64) -> f64 {
        let (min, max) = self.domain;
        if min < 0.0 && max > 0.0 {
            let bound = min.abs().max(max);
            0.5 + value / (2.0 * bound)
        } else if max > min {
            (value - min) / (max - min)
        } else {
            0.5
        }
        .clamp(0.0, 1.0)
    }

    pub fn color_for(&self, value: f64) -> Rgba {
        interpolate_stops(&self.stops, self.offset(value))
    }
}

/// Color at `t` along sorted `(offset, color)` stops; gray when there are none
pub fn interpolate_stops(stops: &[(f64, Rgba)], t: f64) -> Rgba {
    let (first, last) = match (stops.first(), stops.last()) {
        (Some(first), Some(last)) => (*first, *last),
        _ => return Rgba::GRAY,
    };
    if t <= first.0 {
        return first.1;
    }
    for pair in stops.windows(2) {
        let ((o0, c0), (o1, c1)) = (pair[0], pair[1]);
        if t <= o1 {
            let local = if o1 > o0 { (t - o0) / (o1 - o0) } else { 1.0 };
            return c0.lerp(c1, local);
        }
    }
    last.1
}

// === Encoding selection ===

/// Which color/legend combination a render uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorBranch {
    CategoricalDistinct,
    CategoricalByColumn,
    NumericRange,
    Default,
}

impl ColorBranch {
    pub fn classify(has_color_by: bool, is_categorical: bool, has_symbol_by: bool) -> Self {
        match (has_color_by, is_categorical, has_symbol_by) {
            (true, true, true) => ColorBranch::CategoricalDistinct,
            (true, true, false) => ColorBranch::CategoricalByColumn,
            (true, false, _) => ColorBranch::NumericRange,
            (false, _, _) => ColorBranch::Default,
        }
    }
}

/// The color scale and legend of a render, selected once and passed down.
#[derive(Debug, Clone)]
pub enum ColorEncoding {
    /// Categorical color-by together with a symbol column: colors over the
    /// distinct plotted values, symbol legend
    CategoricalDistinct { scale: CategoricalColorScale, legend: Option<Legend> },
    /// Categorical color-by alone: colors over the column's values, color legend
    CategoricalByColumn { scale: CategoricalColorScale, legend: Legend },
    /// Numeric color-by: continuous gradient, gradient legend
    NumericRange { range: ColorRange, column_type: ColumnType, legend: Legend },
    /// No color-by: one color, symbol legend when symbols are in use
    Default { color: Rgba, legend: Option<Legend> },
}

impl ColorEncoding {
    pub fn select(settings: &Settings, series: &[Series], symbols: Option<&SymbolScale>) -> Self {
        let color_by = settings.encoding(Encoding::Color);
        let color_type = color_by.and_then(|c| settings.column_type(c)).unwrap_or_default();
        let branch = ColorBranch::classify(
            color_by.is_some(),
            color_type.is_categorical(),
            settings.encoding(Encoding::Symbol).is_some(),
        );
        let palette = series_palette(settings);
        log::debug!("Color encoding: {:?}", branch);

        match (branch, color_by) {
            (ColorBranch::CategoricalDistinct, _) => {
                let mut domain: Vec<String> = Vec::new();
                for point in Series::iter_points(series) {
                    let label = point.color_value.as_ref().map(value_to_string).unwrap_or_default();
                    if !domain.contains(&label) {
                        domain.push(label);
                    }
                }
                ColorEncoding::CategoricalDistinct {
                    scale: CategoricalColorScale::new(domain, palette.clone()),
                    legend: symbols.map(|s| Legend::symbol(settings, s, palette[0])),
                }
            }
            (ColorBranch::CategoricalByColumn, Some(column)) => {
                let domain = crate::data::distinct_values(&settings.data, column)
                    .iter()
                    .map(value_to_string)
                    .collect();
                let scale = CategoricalColorScale::new(domain, palette);
                let legend = Legend::color(settings, &scale);
                ColorEncoding::CategoricalByColumn { scale, legend }
            }
            (ColorBranch::NumericRange, Some(column)) => {
                let extent = crate::data::extent(
                    Series::iter_points(series)
                        .filter_map(|p| p.color_value.as_ref())
                        .filter_map(|v| numeric_value(color_type, v)),
                )
                .unwrap_or((0.0, 1.0));
                let range = ColorRange::new(settings, extent);
                let legend = Legend::color_range(&range, column, color_type);
                ColorEncoding::NumericRange { range, column_type: color_type, legend }
            }
            _ => ColorEncoding::Default {
                color: palette[0],
                legend: symbols.map(|s| Legend::symbol(settings, s, palette[0])),
            },
        }
    }

    pub fn branch(&self) -> ColorBranch {
        match self {
            ColorEncoding::CategoricalDistinct { .. } => ColorBranch::CategoricalDistinct,
            ColorEncoding::CategoricalByColumn { .. } => ColorBranch::CategoricalByColumn,
            ColorEncoding::NumericRange { .. } => ColorBranch::NumericRange,
            ColorEncoding::Default { .. } => ColorBranch::Default,
        }
    }

    pub fn legend(&self) -> Option<&Legend> {
        match self {
            ColorEncoding::CategoricalDistinct { legend, .. } => legend.as_ref(),
            ColorEncoding::CategoricalByColumn { legend, .. } => Some(legend),
            ColorEncoding::NumericRange { legend, .. } => Some(legend),
            ColorEncoding::Default { legend, .. } => legend.as_ref(),
        }
    }

    /// Fully opaque color of a point with the given color value
    pub fn color_for(&self, color_value: Option<&Value>) -> Rgba {
        match self {
            ColorEncoding::CategoricalDistinct { scale, .. }
            | ColorEncoding::CategoricalByColumn { scale, .. } => {
                scale.color_for(&color_value.map(value_to_string).unwrap_or_default())
            }
            ColorEncoding::NumericRange { range, column_type, .. } => color_value
                .and_then(|v| numeric_value(*column_type, v))
                .map(|v| range.color_for(v))
                .unwrap_or(Rgba::GRAY),
            ColorEncoding::Default { color, .. } => *color,
        }
    }

    pub fn has_color_by(&self) -> bool {
        !matches!(self, ColorEncoding::Default { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_css_color("#ff8000").unwrap(), Rgba::rgb(255, 128, 0));
        assert_eq!(parse_css_color("#fff").unwrap(), Rgba::WHITE);
        let c = parse_css_color("#00000080").unwrap();
        assert!((c.a - 128.0 / 255.0).abs() < 1e-9);
        assert!(parse_css_color("#12345").is_err());
    }

    #[test]
    fn test_parse_rgb_functions() {
        assert_eq!(parse_css_color("rgb(31,119,180)").unwrap(), Rgba::rgb(31, 119, 180));
        let c = parse_css_color("rgba( 10, 20, 30, 0.25 )").unwrap();
        assert_eq!((c.r, c.g, c.b), (10, 20, 30));
        assert_eq!(c.a, 0.25);
        assert!(parse_css_color("rgb(1,2)").is_err());
    }

    #[test]
    fn test_parse_named_and_unknown() {
        assert_eq!(parse_css_color("Orange").unwrap(), Rgba::rgb(255, 165, 0));
        assert!(parse_css_color("not-a-color").is_err());
    }

    #[test]
    fn test_opacity_helpers() {
        let c = Rgba { a: 0.3, ..Rgba::rgb(1, 2, 3) };
        assert_eq!(c.without_opacity().a, 1.0);
        assert_eq!(c.with_opacity(0.5).a, 0.5);
        assert_eq!(c.with_opacity(2.0).a, 1.0);
    }

    #[test]
    fn test_categorical_scale_wraps_palette() {
        let scale = CategoricalColorScale::new(
            vec!["a".into(), "b".into(), "c".into()],
            vec![Rgba::BLACK, Rgba::WHITE],
        );
        assert_eq!(scale.color_for("a"), Rgba::BLACK);
        assert_eq!(scale.color_for("b"), Rgba::WHITE);
        assert_eq!(scale.color_for("c"), Rgba::BLACK);
        assert_eq!(scale.color_for("zzz"), Rgba::BLACK);
    }

    #[test]
    fn test_color_range_positive_extent() {
        let settings = Settings::default();
        let range = ColorRange::new(&settings, (0.0, 10.0));
        assert_eq!(range.offset(0.0), 0.0);
        assert_eq!(range.offset(5.0), 0.5);
        assert_eq!(range.color_for(0.0), parse_css_color("#4575b4").unwrap());
        assert_eq!(range.color_for(10.0), parse_css_color("#d73027").unwrap());
    }

    #[test]
    fn test_color_range_centres_zero() {
        let settings = Settings::default();
        let range = ColorRange::new(&settings, (-2.0, 8.0));
        assert_eq!(range.offset(0.0), 0.5);
        assert_eq!(range.offset(8.0), 1.0);
        assert_eq!(range.offset(-8.0), 0.0);
    }

    #[test]
    fn test_interpolate_stops() {
        let stops = vec![(0.0, Rgba::BLACK), (0.5, Rgba::GRAY), (1.0, Rgba::WHITE)];
        assert_eq!(interpolate_stops(&stops, -1.0), Rgba::BLACK);
        assert_eq!(interpolate_stops(&stops, 0.5), Rgba::GRAY);
        assert_eq!(interpolate_stops(&stops, 2.0), Rgba::WHITE);
        assert_eq!(interpolate_stops(&[], 0.5), Rgba::GRAY);
    }

    #[test]
    fn test_boolean_color_column_is_categorical() {
        use crate::data::{point_data, rows_from_json};
        use crate::settings::ColumnDescriptor;
        use serde_json::json;

        let settings = Settings {
            real_values: vec![Some("x".into()), Some("y".into()), Some("flag".into())],
            main_values: vec![
                ColumnDescriptor::new("x", ColumnType::Float),
                ColumnDescriptor::new("y", ColumnType::Float),
                ColumnDescriptor::new("flag", ColumnType::Boolean),
            ],
            data: rows_from_json(&json!([
                {"x": 1.0, "y": 1.0, "flag": true},
                {"x": 2.0, "y": 2.0, "flag": false},
                {"x": 3.0, "y": 3.0, "flag": true}
            ]))
            .unwrap(),
            ..Settings::default()
        };
        let rows: Vec<_> = settings.data.iter().collect();
        let series = point_data(&settings, &rows).unwrap();
        let encoding = ColorEncoding::select(&settings, &series, None);
        assert_eq!(encoding.branch(), ColorBranch::CategoricalByColumn);
        let labels: Vec<String> = encoding.legend().unwrap().entries().iter().map(|e| e.label.clone()).collect();
        assert_eq!(labels, vec!["true", "false"]);
    }

    #[test]
    fn test_classify_branches() {
        assert_eq!(ColorBranch::classify(true, true, true), ColorBranch::CategoricalDistinct);
        assert_eq!(ColorBranch::classify(true, true, false), ColorBranch::CategoricalByColumn);
        assert_eq!(ColorBranch::classify(true, false, true), ColorBranch::NumericRange);
        assert_eq!(ColorBranch::classify(true, false, false), ColorBranch::NumericRange);
        assert_eq!(ColorBranch::classify(false, true, true), ColorBranch::Default);
        assert_eq!(ColorBranch::classify(false, false, false), ColorBranch::Default);
    }
}
