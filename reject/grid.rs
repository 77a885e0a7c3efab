//! Construction of the uncertainty-tolerance sweep.
//!
//! A rejection curve is traced by sliding a tolerance from "accept almost
//! nothing" to "accept everything". The sweep starts at a caller-chosen
//! percentile of the observed uncertainty distribution (the region below it
//! is too sparse to estimate performance on) and ends at the distribution
//! maximum, where every sample is accepted.

use ndarray::{Array1, ArrayView1};

use crate::error::EvalError;

/// Number of tolerance values in every sweep. A fixed resolution keeps
/// curves from different populations and models directly comparable.
pub const GRID_RESOLUTION: usize = 100;

/// The tolerance sweep: [`GRID_RESOLUTION`] cutoffs, and per cutoff the
/// acceptance mask and the fraction of the population it retains.
#[derive(Debug, Clone)]
pub struct RejectionGrid {
    /// Strictly non-decreasing tolerance values, inclusive at both ends.
    pub tolerances: Array1<f64>,
    /// `frac_retain[i] = accept[i].mean()`; non-decreasing in `i`.
    pub frac_retain: Array1<f64>,
    /// `accept[i][j]` is true iff `uncertainty[j] <= tolerances[i]`. Each
    /// mask is a superset of every mask at a smaller index.
    pub accept: Vec<Array1<bool>>,
}

/// Builds the tolerance sweep over `uncertainty`.
///
/// The grid spans `percentile(uncertainty, min_percentile)` up to `maximum`
/// (defaulting to the observed maximum, in which case the final grid point
/// retains the whole population).
pub fn sample_rejection(
    uncertainty: ArrayView1<f64>,
    min_percentile: f64,
    maximum: Option<f64>,
) -> Result<RejectionGrid, EvalError> {
    if uncertainty.is_empty() {
        return Err(EvalError::InvalidValue(
            "cannot build a rejection grid over zero samples".to_string(),
        ));
    }
    if uncertainty.iter().any(|u| !u.is_finite()) {
        return Err(EvalError::InvalidValue(
            "uncertainty contains non-finite values".to_string(),
        ));
    }

    let start = percentile(uncertainty, min_percentile)?;
    let end = match maximum {
        Some(max) => max,
        None => uncertainty.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
    };
    if end < start {
        return Err(EvalError::InvalidValue(format!(
            "grid maximum {end} lies below its start {start}"
        )));
    }

    let tolerances = Array1::linspace(start, end, GRID_RESOLUTION);
    let n_samples = uncertainty.len() as f64;
    let mut frac_retain = Array1::zeros(GRID_RESOLUTION);
    let mut accept = Vec::with_capacity(GRID_RESOLUTION);
    for (i, &ut) in tolerances.iter().enumerate() {
        let mask = uncertainty.mapv(|u| u <= ut);
        frac_retain[i] = mask.iter().filter(|&&a| a).count() as f64 / n_samples;
        accept.push(mask);
    }

    Ok(RejectionGrid {
        tolerances,
        frac_retain,
        accept,
    })
}

/// Linear-interpolation percentile (the NumPy default definition):
/// with `p` in `[0, 100]`, the value at fractional rank `p/100 * (n-1)` of
/// the sorted data.
pub fn percentile(values: ArrayView1<f64>, p: f64) -> Result<f64, EvalError> {
    if values.is_empty() {
        return Err(EvalError::InvalidValue(
            "percentile of an empty array".to_string(),
        ));
    }
    if !(0.0..=100.0).contains(&p) {
        return Err(EvalError::InvalidValue(format!(
            "percentile {p} outside [0, 100]"
        )));
    }
    let mut sorted: Vec<f64> = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Ok(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn percentile_matches_linear_interpolation() {
        let v = array![1.0, 2.0, 3.0, 4.0];
        assert_abs_diff_eq!(percentile(v.view(), 0.0).unwrap(), 1.0);
        assert_abs_diff_eq!(percentile(v.view(), 100.0).unwrap(), 4.0);
        assert_abs_diff_eq!(percentile(v.view(), 50.0).unwrap(), 2.5);
        assert_abs_diff_eq!(percentile(v.view(), 25.0).unwrap(), 1.75);
    }

    #[test]
    fn percentile_rejects_out_of_range() {
        let v = array![1.0, 2.0];
        assert!(percentile(v.view(), -1.0).is_err());
        assert!(percentile(v.view(), 100.5).is_err());
    }

    #[test]
    fn grid_has_fixed_resolution_and_ends_at_full_retention() {
        let mut rng = StdRng::seed_from_u64(7);
        let u = Array1::from_iter((0..500).map(|_| rng.r#gen::<f64>() * 0.3));
        let grid = sample_rejection(u.view(), 10.0, None).unwrap();
        assert_eq!(grid.tolerances.len(), GRID_RESOLUTION);
        assert_eq!(grid.frac_retain.len(), GRID_RESOLUTION);
        assert_eq!(grid.accept.len(), GRID_RESOLUTION);
        assert_abs_diff_eq!(grid.frac_retain[GRID_RESOLUTION - 1], 1.0);
    }

    #[test]
    fn retained_fraction_is_non_decreasing() {
        let mut rng = StdRng::seed_from_u64(11);
        let u = Array1::from_iter((0..300).map(|_| rng.r#gen::<f64>()));
        let grid = sample_rejection(u.view(), 25.0, None).unwrap();
        for w in grid.frac_retain.as_slice().unwrap().windows(2) {
            assert!(w[0] <= w[1], "retained fraction decreased: {} -> {}", w[0], w[1]);
        }
    }

    #[test]
    fn masks_grow_as_supersets() {
        let mut rng = StdRng::seed_from_u64(13);
        let u = Array1::from_iter((0..200).map(|_| rng.r#gen::<f64>()));
        let grid = sample_rejection(u.view(), 50.0, None).unwrap();
        for i in 1..grid.accept.len() {
            for j in 0..u.len() {
                assert!(
                    !grid.accept[i - 1][j] || grid.accept[i][j],
                    "sample {j} accepted at grid {i} but rejected at {}",
                    i - 1
                );
            }
        }
    }

    #[test]
    fn explicit_maximum_overrides_observed_max() {
        let u = array![0.1, 0.2, 0.3];
        let grid = sample_rejection(u.view(), 0.0, Some(1.0)).unwrap();
        assert_abs_diff_eq!(grid.tolerances[GRID_RESOLUTION - 1], 1.0);
        // Everything is still retained well before the end.
        assert_abs_diff_eq!(grid.frac_retain[GRID_RESOLUTION - 1], 1.0);
    }

    #[test]
    fn min_percentile_zero_starts_at_the_minimum() {
        let u = array![0.4, 0.1, 0.2, 0.3];
        let grid = sample_rejection(u.view(), 0.0, None).unwrap();
        assert_abs_diff_eq!(grid.tolerances[0], 0.1);
        // The minimum ties the grid start, so the first mask keeps it.
        assert!(grid.frac_retain[0] > 0.0);
    }

    #[test]
    fn empty_uncertainty_is_rejected() {
        let u = Array1::<f64>::zeros(0);
        assert!(sample_rejection(u.view(), 10.0, None).is_err());
    }
}
