use crate::data::{extent, Coord, Point, Series};
use crate::format::{format_linear_tick, format_time_tick};
use crate::scale::{nice_domain, tick_increment, ticks, LinearScale, PaddingStrategy};
use crate::settings::{AxisMemo, ColumnDescriptor};

/// Target number of ticks on continuous axes
pub const TICK_COUNT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisKind {
    Linear,
    /// Millisecond timestamps
    Time,
    Ordinal,
}

/// Which point field an axis reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointValue {
    X,
    Y,
}

impl PointValue {
    pub fn get(self, point: &Point) -> &Coord {
        match self {
            PointValue::X => &point.x,
            PointValue::Y => &point.y,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AxisDomain {
    Continuous(f64, f64),
    Categories(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct AxisConfig {
    pub column: ColumnDescriptor,
    pub orientation: Orientation,
    pub value: PointValue,
    pub padding: PaddingStrategy,
    pub pad: [f64; 2],
    pub memo: Option<AxisMemo>,
}

impl AxisConfig {
    pub fn new(column: ColumnDescriptor, orientation: Orientation, value: PointValue) -> Self {
        Self {
            column,
            orientation,
            value,
            padding: PaddingStrategy::HardLimitZero,
            pad: [0.1, 0.1],
            memo: None,
        }
    }

    pub fn memo(mut self, memo: Option<&AxisMemo>) -> Self {
        self.memo = memo.cloned();
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    pub label: String,
    pub kind: AxisKind,
    pub orientation: Orientation,
    pub domain: AxisDomain,
}

impl Axis {
    /// Builds the axis domain from the plotted points.
    ///
    /// Continuous extents are padded with the configured strategy, then
    /// widened to cover the memoised domain. Ordinal axes keep memoised
    /// categories first, followed by new ones in first-appearance order.
    pub fn build(config: AxisConfig, series: &[Series]) -> Self {
        let column_type = config.column.column_type;
        let kind = if column_type.is_categorical() {
            AxisKind::Ordinal
        } else if column_type.is_temporal() {
            AxisKind::Time
        } else {
            AxisKind::Linear
        };

        let coords = Series::iter_points(series).map(|p| config.value.get(p));

        let domain = match kind {
            AxisKind::Ordinal => {
                let mut categories: Vec<String> = config
                    .memo
                    .as_ref()
                    .and_then(|m| m.categories.clone())
                    .unwrap_or_default();
                for coord in coords {
                    if let Coord::Category(c) = coord {
                        if !categories.contains(c) {
                            categories.push(c.clone());
                        }
                    }
                }
                AxisDomain::Categories(categories)
            }
            AxisKind::Linear | AxisKind::Time => {
                let data_extent = extent(coords.filter_map(Coord::as_number)).unwrap_or((0.0, 1.0));
                let (mut lo, mut hi) = config.padding.apply(data_extent, config.pad);
                if let Some((m0, m1)) = config.memo.as_ref().and_then(|m| m.domain) {
                    lo = lo.min(m0);
                    hi = hi.max(m1);
                }
                AxisDomain::Continuous(lo, hi)
            }
        };

        log::debug!("Axis '{}' ({:?}): {:?}", config.column.name, kind, domain);

        Axis {
            label: config.column.name,
            kind,
            orientation: config.orientation,
            domain,
        }
    }

    /// Rounds a continuous domain out to tick values
    pub fn nice(self) -> Self {
        match self.domain {
            AxisDomain::Continuous(lo, hi) if self.kind == AxisKind::Linear => {
                let (lo, hi) = nice_domain((lo, hi), TICK_COUNT);
                Axis { domain: AxisDomain::Continuous(lo, hi), ..self }
            }
            _ => self,
        }
    }

    /// State to hand back to the host for the next render
    pub fn memo(&self) -> AxisMemo {
        match &self.domain {
            AxisDomain::Continuous(lo, hi) => AxisMemo { domain: Some((*lo, *hi)), categories: None },
            AxisDomain::Categories(c) => AxisMemo { domain: None, categories: Some(c.clone()) },
        }
    }

    pub fn scale(&self, range: (f64, f64)) -> AxisScale {
        AxisScale {
            kind: self.kind,
            domain: self.domain.clone(),
            range,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tick {
    pub position: f64,
    pub label: String,
}

/// An axis domain bound to a pixel range
#[derive(Debug, Clone, PartialEq)]
pub struct AxisScale {
    pub kind: AxisKind,
    pub domain: AxisDomain,
    pub range: (f64, f64),
}

impl AxisScale {
    /// The underlying linear scale, for continuous axes
    pub fn linear(&self) -> Option<LinearScale> {
        match self.domain {
            AxisDomain::Continuous(lo, hi) => Some(LinearScale::new((lo, hi), self.range)),
            AxisDomain::Categories(_) => None,
        }
    }

    pub fn with_domain(&self, domain: AxisDomain) -> Self {
        Self { domain, ..self.clone() }
    }

    /// Pixel position of a coordinate; `None` when the coordinate does not
    /// belong on this axis
    pub fn apply(&self, coord: &Coord) -> Option<f64> {
        match (&self.domain, coord) {
            (AxisDomain::Continuous(..), Coord::Number(v)) => self.linear().map(|s| s.scale(*v)),
            (AxisDomain::Categories(categories), Coord::Category(c)) => {
                let idx = categories.iter().position(|x| x == c)?;
                Some(self.band_center(idx, categories.len()))
            }
            _ => None,
        }
    }

    fn band_center(&self, idx: usize, count: usize) -> f64 {
        let (r0, r1) = self.range;
        let step = (r1 - r0) / count.max(1) as f64;
        r0 + step * (idx as f64 + 0.5)
    }

    pub fn ticks(&self) -> Vec<Tick> {
        match &self.domain {
            AxisDomain::Continuous(lo, hi) => {
                let scale = LinearScale::new((*lo, *hi), self.range);
                let step = tick_increment(lo.min(*hi), lo.max(*hi), TICK_COUNT);
                ticks(*lo, *hi, TICK_COUNT)
                    .into_iter()
                    .map(|v| Tick {
                        position: scale.scale(v),
                        label: match self.kind {
                            AxisKind::Time => format_time_tick(v, (hi - lo).abs()),
                            _ => format_linear_tick(v, step),
                        },
                    })
                    .collect()
            }
            AxisDomain::Categories(categories) => categories
                .iter()
                .enumerate()
                .map(|(i, c)| Tick {
                    position: self.band_center(i, categories.len()),
                    label: c.clone(),
                })
                .collect(),
        }
    }

    pub fn contains_pixel(&self, pixel: f64) -> bool {
        let (a, b) = self.range;
        pixel >= a.min(b) - 0.5 && pixel <= a.max(b) + 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::ColumnType;
    use serde_json::Map;

    fn series_of(coords: Vec<(Coord, Coord)>) -> Vec<Series> {
        vec![Series {
            key: String::new(),
            points: coords
                .into_iter()
                .map(|(x, y)| Point { x, y, color_value: None, size: None, key: String::new(), row: Map::new() })
                .collect(),
        }]
    }

    #[test]
    fn test_linear_axis_padding_keeps_zero() {
        let series = series_of(vec![
            (Coord::Number(0.0), Coord::Number(5.0)),
            (Coord::Number(10.0), Coord::Number(15.0)),
        ]);
        let config = AxisConfig::new(ColumnDescriptor::new("x", ColumnType::Float), Orientation::Horizontal, PointValue::X);
        let axis = Axis::build(config, &series);
        assert_eq!(axis.kind, AxisKind::Linear);
        assert_eq!(axis.domain, AxisDomain::Continuous(0.0, 11.0));
    }

    #[test]
    fn test_axis_memo_widens_domain() {
        let series = series_of(vec![(Coord::Number(2.0), Coord::Number(2.0)), (Coord::Number(4.0), Coord::Number(4.0))]);
        let memo = AxisMemo { domain: Some((-100.0, 3.0)), categories: None };
        let config = AxisConfig::new(ColumnDescriptor::new("y", ColumnType::Float), Orientation::Vertical, PointValue::Y)
            .memo(Some(&memo));
        let axis = Axis::build(config, &series);
        match axis.domain {
            AxisDomain::Continuous(lo, hi) => {
                assert_eq!(lo, -100.0);
                assert!((hi - 4.2).abs() < 1e-9);
            }
            _ => panic!("expected continuous domain"),
        }
    }

    #[test]
    fn test_ordinal_axis_categories() {
        let series = series_of(vec![
            (Coord::Category("b".into()), Coord::Number(1.0)),
            (Coord::Category("a".into()), Coord::Number(1.0)),
            (Coord::Category("b".into()), Coord::Number(1.0)),
        ]);
        let memo = AxisMemo { domain: None, categories: Some(vec!["z".into()]) };
        let config = AxisConfig::new(ColumnDescriptor::new("c", ColumnType::String), Orientation::Horizontal, PointValue::X)
            .memo(Some(&memo));
        let axis = Axis::build(config, &series);
        assert_eq!(axis.domain, AxisDomain::Categories(vec!["z".into(), "b".into(), "a".into()]));

        let scale = axis.scale((0.0, 300.0));
        assert_eq!(scale.apply(&Coord::Category("z".into())), Some(50.0));
        assert_eq!(scale.apply(&Coord::Category("a".into())), Some(250.0));
        assert_eq!(scale.apply(&Coord::Category("missing".into())), None);
        assert_eq!(scale.ticks().len(), 3);
    }

    #[test]
    fn test_nice_and_ticks() {
        let axis = Axis {
            label: "x".into(),
            kind: AxisKind::Linear,
            orientation: Orientation::Horizontal,
            domain: AxisDomain::Continuous(0.13, 9.87),
        }
        .nice();
        assert_eq!(axis.domain, AxisDomain::Continuous(0.0, 10.0));
        let scale = axis.scale((0.0, 100.0));
        let ticks = scale.ticks();
        assert_eq!(ticks.len(), 11);
        assert_eq!(ticks[5].position, 50.0);
        assert_eq!(ticks[5].label, "5");
    }

    #[test]
    fn test_time_axis_is_not_niced() {
        let axis = Axis {
            label: "t".into(),
            kind: AxisKind::Time,
            orientation: Orientation::Horizontal,
            domain: AxisDomain::Continuous(1.5, 7.5),
        };
        assert_eq!(axis.clone().nice(), axis);
    }

    #[test]
    fn test_memo_roundtrip() {
        let axis = Axis {
            label: "x".into(),
            kind: AxisKind::Linear,
            orientation: Orientation::Horizontal,
            domain: AxisDomain::Continuous(1.0, 2.0),
        };
        assert_eq!(axis.memo().domain, Some((1.0, 2.0)));
    }
}
