//! One-dimensional kernel density estimation.
//!
//! The estimator is stateless: a sample and an evaluation grid go in, an
//! unnormalized [`DensityCurve`] comes out. Every curve of one chart is
//! evaluated on the same [`EvaluationGrid`], built from the global extent of
//! the dimension, so curves share an x-domain. Peak normalization is left to
//! the caller ([`normalize_to_peak`]).

/// An ordered sequence of `(x, density)` pairs.
///
/// The empty curve is the explicit "undefined density" result; it is never
/// a curve of zeros.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DensityCurve {
    points: Vec<(f64, f64)>,
}

impl DensityCurve {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Largest density value. `None` for the empty curve or if any value is NaN.
    pub fn max_density(&self) -> Option<f64> {
        let mut max: Option<f64> = None;
        for &(_, y) in &self.points {
            if y.is_nan() {
                return None;
            }
            max = Some(max.map_or(y, |m| m.max(y)));
        }
        max
    }

    pub fn x_extent(&self) -> Option<(f64, f64)> {
        let first = self.points.first()?.0;
        let last = self.points.last()?.0;
        Some((first, last))
    }

    pub fn y_extent(&self) -> Option<(f64, f64)> {
        let max = self.max_density()?;
        let min = self.points.iter().map(|p| p.1).fold(f64::INFINITY, f64::min);
        Some((min, max))
    }
}

// ---------------------------------------------------------------------------
// Evaluation grid
// ---------------------------------------------------------------------------

/// Shared x positions at which every curve of a chart is evaluated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvaluationGrid {
    xs: Vec<f64>,
}

impl EvaluationGrid {
    /// `steps` evenly spaced points from `min` to `max` inclusive.
    pub fn linspace(min: f64, max: f64, steps: usize) -> Self {
        let xs = match steps {
            0 => Vec::new(),
            1 => vec![min],
            n => {
                let step = (max - min) / (n - 1) as f64;
                (0..n).map(|i| min + step * i as f64).collect()
            }
        };
        EvaluationGrid { xs }
    }

    /// Grid over a dimension's global extent. A single-valued extent is
    /// widened by one bandwidth on each side so the kernel is still visible.
    pub fn for_extent(extent: (f64, f64), steps: usize, bandwidth: f64) -> Self {
        let (mut min, mut max) = extent;
        if min == max {
            let pad = if bandwidth.is_finite() && bandwidth > 0.0 { bandwidth } else { 1.0 };
            min -= pad;
            max += pad;
        }
        Self::linspace(min, max, steps)
    }

    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Estimator
// ---------------------------------------------------------------------------

/// Epanechnikov kernel with the given bandwidth: `0.75 (1 - u²) / h` for
/// `|u| ≤ 1` where `u = v / h`, zero outside.
pub fn epanechnikov(bandwidth: f64) -> impl Fn(f64) -> f64 {
    move |v: f64| {
        let u = v / bandwidth;
        if u.abs() <= 1.0 {
            0.75 * (1.0 - u * u) / bandwidth
        } else {
            0.0
        }
    }
}

/// Mean kernel contribution of `sample` at every grid point.
///
/// Non-finite observations are ignored. Fewer than two remaining
/// observations, an empty grid, or a non-positive bandwidth yield the empty
/// curve.
pub fn estimate(sample: &[f64], grid: &[f64], bandwidth: f64) -> DensityCurve {
    let valid: Vec<f64> = sample.iter().copied().filter(|v| v.is_finite()).collect();
    if valid.len() < 2 || grid.is_empty() {
        return DensityCurve::empty();
    }
    if !(bandwidth.is_finite() && bandwidth > 0.0) {
        log::warn!("Ignoring density estimate with bandwidth {bandwidth}");
        return DensityCurve::empty();
    }

    let kernel = epanechnikov(bandwidth);
    let n = valid.len() as f64;
    let points = grid
        .iter()
        .map(|&x| {
            let sum: f64 = valid.iter().map(|&v| kernel(x - v)).sum();
            (x, sum / n)
        })
        .collect();
    DensityCurve { points }
}

/// Rescale a curve so its own peak is 1.
///
/// A peak of 0 or NaN means there is nothing to show; the result is then the
/// empty curve rather than a division by zero.
pub fn normalize_to_peak(curve: &DensityCurve) -> DensityCurve {
    match curve.max_density() {
        Some(max) if max.is_finite() && max > 0.0 => DensityCurve {
            points: curve.points.iter().map(|&(x, y)| (x, y / max)).collect(),
        },
        _ => DensityCurve::empty(),
    }
}
