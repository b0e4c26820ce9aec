use crate::data::{extent, Series};
use crate::Container;

/// Continuous linear mapping from a data domain to a pixel range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    pub domain: (f64, f64),
    pub range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    /// Degenerate domains map everything to the middle of the range
    pub fn scale(&self, value: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if d1 == d0 {
            return (r0 + r1) / 2.0;
        }
        r0 + (value - d0) / (d1 - d0) * (r1 - r0)
    }

    pub fn invert(&self, pixel: f64) -> f64 {
        let (d0, d1) = self.domain;
        let (r0, r1) = self.range;
        if r1 == r0 {
            return (d0 + d1) / 2.0;
        }
        d0 + (pixel - r0) / (r1 - r0) * (d1 - d0)
    }

    pub fn nice(self, count: f64) -> Self {
        Self { domain: nice_domain(self.domain, count), ..self }
    }

    pub fn ticks(&self, count: f64) -> Vec<f64> {
        ticks(self.domain.0, self.domain.1, count)
    }
}

/// d3's tick step: a power of ten times 1, 2, 5 or 10
pub fn tick_increment(start: f64, stop: f64, count: f64) -> f64 {
    if !(count > 0.0) || start == stop {
        return f64::NAN;
    }
    let step = (stop - start) / count;
    let power = step.abs().log10().floor();
    let error = step.abs() / 10f64.powf(power);
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    10f64.powf(power) * factor
}

pub fn ticks(start: f64, stop: f64, count: f64) -> Vec<f64> {
    let (lo, hi) = if start <= stop { (start, stop) } else { (stop, start) };
    let step = tick_increment(lo, hi, count);
    if !step.is_finite() || step <= 0.0 {
        return if lo == hi && lo.is_finite() { vec![lo] } else { Vec::new() };
    }
    let first = (lo / step).ceil() as i64;
    let last = (hi / step).floor() as i64;
    (first..=last)
        .map(|i| {
            let v = i as f64 * step;
            // Snap away float noise such as 0.30000000000000004
            (v / step).round() * step
        })
        .collect()
}

/// Extends a domain outward to round tick values
pub fn nice_domain(domain: (f64, f64), count: f64) -> (f64, f64) {
    let (d0, d1) = domain;
    if d0 == d1 || !d0.is_finite() || !d1.is_finite() {
        return domain;
    }
    let (mut start, mut stop) = if d0 <= d1 { (d0, d1) } else { (d1, d0) };
    let mut prestep = 0.0;
    for _ in 0..10 {
        let step = tick_increment(start, stop, count);
        if !step.is_finite() || step <= 0.0 || step == prestep {
            break;
        }
        start = (start / step).floor() * step;
        stop = (stop / step).ceil() * step;
        prestep = step;
    }
    if d0 <= d1 { (start, stop) } else { (stop, start) }
}

/// Rule for widening a data extent into an axis domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaddingStrategy {
    /// Pad each side by a fraction of the span
    Percent,
    /// Pad like `Percent`, but never push a non-negative extent below zero
    /// or a non-positive extent above it, so zero is never cropped off
    #[default]
    HardLimitZero,
}

impl PaddingStrategy {
    /// `pad` is `[before, after]` as fractions of the extent's span.
    pub fn apply(self, extent: (f64, f64), pad: [f64; 2]) -> (f64, f64) {
        let (min, max) = extent;
        let span = if max > min {
            max - min
        } else if min != 0.0 {
            min.abs()
        } else {
            1.0
        };
        let mut lo = min - span * pad[0];
        let mut hi = max + span * pad[1];

        if self == PaddingStrategy::HardLimitZero {
            if min >= 0.0 && lo < 0.0 {
                lo = 0.0;
            }
            if max <= 0.0 && hi > 0.0 {
                hi = 0.0;
            }
        }
        (lo, hi)
    }
}

/// Linear map from the size column's extent to a symbol area in square pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizeScale {
    scale: LinearScale,
}

impl SizeScale {
    pub const AREA_RANGE: (f64, f64) = (10.0, 10000.0);

    pub fn new(domain: (f64, f64)) -> Self {
        Self { scale: LinearScale::new(domain, Self::AREA_RANGE) }
    }

    /// Over the `size` values of the plotted points
    pub fn from_series(series: &[Series]) -> Self {
        let domain = extent(Series::iter_points(series).filter_map(|p| p.size)).unwrap_or((0.0, 1.0));
        Self::new(domain)
    }

    pub fn domain(&self) -> (f64, f64) {
        self.scale.domain
    }

    pub fn area(&self, value: f64) -> f64 {
        self.scale.scale(value)
    }
}

/// Responsive factor derived from the container's shorter side.
///
/// Linear through the two calibration points `(size, factor)` and clamped
/// to `[y1, y2]`.
pub fn interpolate_scale((x1, y1): (f64, f64), (x2, y2): (f64, f64)) -> impl Fn(&Container) -> f64 {
    let m = (y2 - y1) / (x2 - x1);
    move |container: &Container| {
        let shortest_axis = container.shortest_axis();
        // Anchored at the first calibration point so it is hit exactly
        y2.min(y1.max(y1 + m * (shortest_axis - x1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_scale_roundtrip_and_degenerate() {
        let s = LinearScale::new((0.0, 10.0), (100.0, 200.0));
        assert_eq!(s.scale(5.0), 150.0);
        assert_eq!(s.invert(150.0), 5.0);
        let flat = LinearScale::new((3.0, 3.0), (0.0, 10.0));
        assert_eq!(flat.scale(3.0), 5.0);
    }

    #[test]
    fn test_ticks() {
        assert_eq!(ticks(0.0, 1.0, 10.0).len(), 11);
        assert_eq!(ticks(0.0, 100.0, 5.0), vec![0.0, 20.0, 40.0, 60.0, 80.0, 100.0]);
        assert_eq!(ticks(2.0, 2.0, 10.0), vec![2.0]);
    }

    #[test]
    fn test_nice_domain() {
        assert_eq!(nice_domain((0.13, 9.87), 10.0), (0.0, 10.0));
        assert_eq!(nice_domain((-3.2, 47.0), 10.0), (-5.0, 50.0));
        assert_eq!(nice_domain((4.0, 4.0), 10.0), (4.0, 4.0));
    }

    #[test]
    fn test_hard_limit_zero_padding() {
        let strategy = PaddingStrategy::HardLimitZero;
        assert_eq!(strategy.apply((0.0, 10.0), [0.1, 0.1]), (0.0, 11.0));
        assert_eq!(strategy.apply((-10.0, 0.0), [0.1, 0.1]), (-11.0, 0.0));
        assert_eq!(strategy.apply((-10.0, 10.0), [0.1, 0.1]), (-12.0, 12.0));
        let (lo, hi) = strategy.apply((10.0, 20.0), [0.1, 0.1]);
        assert!((lo - 9.0).abs() < 1e-9 && (hi - 21.0).abs() < 1e-9);
    }

    #[test]
    fn test_percent_padding_crosses_zero() {
        assert_eq!(PaddingStrategy::Percent.apply((0.0, 10.0), [0.1, 0.1]), (-1.0, 11.0));
    }

    #[test]
    fn test_size_scale_range() {
        let size = SizeScale::new((0.0, 100.0));
        assert_eq!(size.area(0.0), 10.0);
        assert_eq!(size.area(100.0), 10000.0);
    }

    #[test]
    fn test_interpolate_scale_clamped() {
        let f = interpolate_scale((600.0, 0.1), (1600.0, 1.0));
        assert_eq!(f(&Container::new(600, 900)), 0.1);
        assert_eq!(f(&Container::new(300, 300)), 0.1);
        assert_eq!(f(&Container::new(2000, 1600)), 1.0);
        assert_eq!(f(&Container::new(4000, 4000)), 1.0);
        let mid = f(&Container::new(1100, 1100));
        assert!((mid - 0.55).abs() < 1e-9);
    }

    #[test]
    fn test_interpolate_scale_monotonic() {
        let f = interpolate_scale((600.0, 0.1), (1600.0, 1.0));
        let mut last = f64::NEG_INFINITY;
        for w in (500..1700).step_by(50) {
            let v = f(&Container::new(w, w));
            assert!(v >= last);
            assert!((0.1..=1.0).contains(&v));
            last = v;
        }
    }
}
