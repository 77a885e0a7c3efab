//! Posterior predictive summaries of the Monte-Carlo ensemble.
//!
//! Each sample carries `m` stochastic forward passes. The row-wise mean of
//! those draws is the point estimate used for classification; the row-wise
//! standard deviation is the uncertainty score that drives rejection.
//!
//! [`density_mode`] additionally estimates the most probable draw value for a
//! single sample via a 1-D Gaussian kernel density estimate. The KDE support
//! is clipped to the observed data range: predictive probabilities live in
//! [0, 1] and extrapolating density mass beyond the sample support would bias
//! the mode toward regions no draw ever visited.

use ndarray::{Array1, ArrayView1, ArrayView2, Axis};

use crate::error::EvalError;

/// Resolution of the KDE evaluation grid.
const KDE_GRID_SIZE: usize = 512;

/// Per-sample posterior predictive summaries, index-aligned with the
/// population.
#[derive(Debug, Clone)]
pub struct PosteriorStatistics {
    /// Row-wise mean of the Monte-Carlo draws; the detection point estimate.
    pub predictive_mean: Array1<f64>,
    /// Row-wise standard deviation (population form, ddof = 0); the
    /// uncertainty score.
    pub predictive_std: Array1<f64>,
}

/// Reduces the `[n, m]` Monte-Carlo score matrix to per-sample predictive
/// mean and standard deviation.
///
/// Fails with [`EvalError::InvalidValue`] if the draw matrix is empty, or if
/// a derived mean leaves [0, 1] or a derived standard deviation turns
/// negative (structurally impossible for well-formed probabilities, checked
/// anyway because every downstream curve is built on these two vectors).
pub fn posterior_statistics(mc_scores: ArrayView2<f64>) -> Result<PosteriorStatistics, EvalError> {
    if mc_scores.nrows() == 0 || mc_scores.ncols() == 0 {
        return Err(EvalError::InvalidValue(format!(
            "mc score matrix is empty: shape {:?}",
            mc_scores.dim()
        )));
    }
    let predictive_mean = mc_scores
        .mean_axis(Axis(1))
        .ok_or_else(|| EvalError::InvalidValue("mc score matrix has no draws".to_string()))?;
    let predictive_std = mc_scores.std_axis(Axis(1), 0.0);

    for (i, (&mean, &std)) in predictive_mean.iter().zip(predictive_std.iter()).enumerate() {
        if !(-1e-9..=1.0 + 1e-9).contains(&mean) {
            return Err(EvalError::InvalidValue(format!(
                "predictive mean {mean} of sample {i} outside [0, 1]"
            )));
        }
        if std < 0.0 || !std.is_finite() {
            return Err(EvalError::InvalidValue(format!(
                "predictive std {std} of sample {i} is not a non-negative finite number"
            )));
        }
    }

    Ok(PosteriorStatistics {
        predictive_mean,
        predictive_std,
    })
}

/// Estimates the most probable value of one sample's draw vector.
///
/// Identical draws short-circuit to that value (a zero-variance sample has no
/// density estimate). Otherwise a Gaussian KDE with normal-reference
/// bandwidth is evaluated on a [`KDE_GRID_SIZE`]-point grid spanning exactly
/// the observed data range, and the grid point of maximum density is
/// returned. Ties in the maximum resolve to the lowest-value grid point.
pub fn density_mode(draws: ArrayView1<f64>) -> Result<f64, EvalError> {
    let first = *draws
        .first()
        .ok_or_else(|| EvalError::InvalidValue("cannot take the mode of zero draws".to_string()))?;
    if draws.iter().all(|&d| d == first) {
        return Ok(first);
    }

    let n = draws.len() as f64;
    let mut sorted: Vec<f64> = draws.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let (lo, hi) = (sorted[0], sorted[sorted.len() - 1]);

    let bandwidth = normal_reference_bandwidth(&sorted);

    let mut densities = Vec::with_capacity(KDE_GRID_SIZE);
    for k in 0..KDE_GRID_SIZE {
        let x = lo + (hi - lo) * k as f64 / (KDE_GRID_SIZE - 1) as f64;
        let density: f64 = draws
            .iter()
            .map(|&d| {
                let z = (x - d) / bandwidth;
                (-0.5 * z * z).exp()
            })
            .sum::<f64>()
            / (n * bandwidth * (2.0 * std::f64::consts::PI).sqrt());
        densities.push(density);
    }
    let best = first_max_index(&densities);
    Ok(lo + (hi - lo) * best as f64 / (KDE_GRID_SIZE - 1) as f64)
}

/// Index of the maximum density; ties keep the first (lowest-value) grid
/// point via the strict comparison.
fn first_max_index(densities: &[f64]) -> usize {
    let mut best = 0;
    for (i, &density) in densities.iter().enumerate() {
        if density > densities[best] {
            best = i;
        }
    }
    best
}

/// Normal-reference rule: `1.059 * A * n^(-1/5)` with
/// `A = min(std, IQR / 1.349)`. `sorted` must be ascending and non-constant.
fn normal_reference_bandwidth(sorted: &[f64]) -> f64 {
    let n = sorted.len() as f64;
    let mean = sorted.iter().sum::<f64>() / n;
    let sigma = (sorted.iter().map(|&d| (d - mean).powi(2)).sum::<f64>() / n).sqrt();
    let iqr = sorted_quantile(sorted, 0.75) - sorted_quantile(sorted, 0.25);
    let spread = if iqr > 0.0 {
        sigma.min(iqr / 1.349)
    } else {
        sigma
    };
    1.059 * spread * n.powf(-0.2)
}

/// Linear-interpolation quantile of an ascending slice.
fn sorted_quantile(sorted: &[f64], q: f64) -> f64 {
    let rank = q * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}
