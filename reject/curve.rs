//! The rejection-curve engine.
//!
//! For every tolerance in the sweep, performance is evaluated on three
//! populations of identical size:
//!
//! - the **accepted subset** (uncertainty at or below tolerance),
//! - a **random-rejection baseline** (same number of samples, chosen
//!   uniformly), showing what rejecting blindly would buy,
//! - and, in one engine variant, a **prior-preserving baseline** matching
//!   the accepted subset's class composition, isolating the effect of
//!   prior shift from the effect of uncertainty-based selection.
//!
//! Uncertainty-based rejection beats both baselines when the uncertainty
//! score actually predicts errors, which is the question these curves answer.

use itertools::izip;
use ndarray::{Array1, ArrayView1};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::bootstrap::bootstrap_ci;
use crate::error::EvalError;
use crate::grid::{RejectionGrid, sample_rejection};
use crate::measure::Measure;
use crate::stratified::stratified_mask;

/// Two-sided significance level for every primary and baseline interval.
const ALPHA: f64 = 0.05;

/// Resample count for the random baseline's interval. The baseline exists
/// for visual comparison, not point-estimation precision, so it runs two
/// orders of magnitude cheaper than the primary curve's bootstrap.
const BASELINE_RESAMPLES: usize = 100;

/// One grid point of a curve: the measure on the subset and its bootstrap
/// percentile interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub value: f64,
    pub low: f64,
    pub high: f64,
}

/// The primary rejection curve and its random-rejection baseline, indexed by
/// the tolerance grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectionCurves {
    /// Non-decreasing uncertainty tolerances.
    pub tolerances: Array1<f64>,
    /// Fraction of the population accepted at each tolerance.
    pub frac_retain: Array1<f64>,
    /// Measure + CI on the accepted subset.
    pub primary: Vec<PerformanceRecord>,
    /// Measure + CI on a size-matched uniformly random subset.
    pub random: Vec<PerformanceRecord>,
}

/// The CI-free engine variant: point values only, with the prior-preserving
/// baseline alongside the random one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StratifiedCurves {
    pub tolerances: Array1<f64>,
    pub frac_retain: Array1<f64>,
    /// Measure on the accepted subset.
    pub primary: Array1<f64>,
    /// Measure on a size-matched uniformly random subset.
    pub random: Array1<f64>,
    /// Measure on a size- and prior-matched stratified subset.
    pub stratified: Array1<f64>,
}

/// Sweeps the uncertainty tolerance and evaluates `measure` with bootstrap
/// confidence intervals on the accepted subset and on a random-rejection
/// baseline of the same size.
///
/// The primary interval uses `n_bootstrap` resamples at a 95% level; the
/// baseline interval uses [`BASELINE_RESAMPLES`]. All randomness (baseline
/// subset choice, resampling) is drawn from `rng`, so a seeded generator
/// reproduces curves bit-identically.
///
/// Measure failures on any subset abort the whole curve: a partially
/// evaluated sweep is statistically meaningless.
pub fn performance_over_uncertainty_tol<M: Measure + ?Sized>(
    uncertainty: ArrayView1<f64>,
    y: ArrayView1<u8>,
    scores: ArrayView1<f64>,
    measure: &M,
    min_percentile: f64,
    n_bootstrap: usize,
    rng: &mut impl Rng,
) -> Result<RejectionCurves, EvalError> {
    check_population(uncertainty, y, scores)?;
    let grid = sample_rejection(uncertainty, min_percentile, None)?;
    log::info!(
        "rejection sweep over {} samples: tolerance [{:.4}, {:.4}], {} bootstrap resamples",
        y.len(),
        grid.tolerances[0],
        grid.tolerances[grid.tolerances.len() - 1],
        n_bootstrap,
    );

    let mut primary = Vec::with_capacity(grid.accept.len());
    let mut random = Vec::with_capacity(grid.accept.len());
    for accept in &grid.accept {
        let rand_sel = permuted_mask(accept, rng);

        let (y_acc, s_acc) = masked(y, scores, accept);
        let ci = bootstrap_ci(y_acc.view(), s_acc.view(), measure, n_bootstrap, ALPHA, rng)?;
        primary.push(PerformanceRecord {
            value: measure.evaluate(y_acc.view(), s_acc.view())?,
            low: ci.low,
            high: ci.high,
        });

        let (y_rand, s_rand) = masked(y, scores, &rand_sel);
        let ci = bootstrap_ci(
            y_rand.view(),
            s_rand.view(),
            measure,
            BASELINE_RESAMPLES,
            ALPHA,
            rng,
        )?;
        random.push(PerformanceRecord {
            value: measure.evaluate(y_rand.view(), s_rand.view())?,
            low: ci.low,
            high: ci.high,
        });
    }
    log::debug!("rejection sweep complete: {} grid points", primary.len());

    let RejectionGrid {
        tolerances,
        frac_retain,
        ..
    } = grid;
    Ok(RejectionCurves {
        tolerances,
        frac_retain,
        primary,
        random,
    })
}

/// The CI-free engine variant: per tolerance, the measure on the accepted
/// subset, on a random subset of the same size, and on a shuffled
/// prior-preserving subset whose class composition matches the accepted one.
pub fn performance_with_stratified_baseline<M: Measure + ?Sized>(
    uncertainty: ArrayView1<f64>,
    y: ArrayView1<u8>,
    scores: ArrayView1<f64>,
    measure: &M,
    min_percentile: f64,
    rng: &mut impl Rng,
) -> Result<StratifiedCurves, EvalError> {
    check_population(uncertainty, y, scores)?;
    let grid = sample_rejection(uncertainty, min_percentile, None)?;

    let k = grid.accept.len();
    let (mut primary, mut random, mut stratified) =
        (Array1::zeros(k), Array1::zeros(k), Array1::zeros(k));
    for (i, accept) in grid.accept.iter().enumerate() {
        let rand_sel = permuted_mask(accept, rng);
        let (y_acc, s_acc) = masked(y, scores, accept);
        let strat_sel = stratified_mask(y, y_acc.view(), true, rng)?;

        primary[i] = measure.evaluate(y_acc.view(), s_acc.view())?;
        let (y_rand, s_rand) = masked(y, scores, &rand_sel);
        random[i] = measure.evaluate(y_rand.view(), s_rand.view())?;
        let (y_strat, s_strat) = masked(y, scores, &strat_sel);
        stratified[i] = measure.evaluate(y_strat.view(), s_strat.view())?;
    }

    let RejectionGrid {
        tolerances,
        frac_retain,
        ..
    } = grid;
    Ok(StratifiedCurves {
        tolerances,
        frac_retain,
        primary,
        random,
        stratified,
    })
}

/// A uniformly random mask with the same number of true entries: rejecting
/// the same count of samples, but blindly.
fn permuted_mask(accept: &Array1<bool>, rng: &mut impl Rng) -> Array1<bool> {
    let mut selected: Vec<bool> = accept.to_vec();
    selected.shuffle(rng);
    Array1::from_vec(selected)
}

/// Selects the masked subset of the aligned label/score pair.
fn masked(
    y: ArrayView1<u8>,
    scores: ArrayView1<f64>,
    mask: &Array1<bool>,
) -> (Array1<u8>, Array1<f64>) {
    let mut y_sel = Vec::new();
    let mut s_sel = Vec::new();
    for (&keep, &label, &score) in izip!(mask.iter(), y.iter(), scores.iter()) {
        if keep {
            y_sel.push(label);
            s_sel.push(score);
        }
    }
    (Array1::from_vec(y_sel), Array1::from_vec(s_sel))
}

fn check_population(
    uncertainty: ArrayView1<f64>,
    y: ArrayView1<u8>,
    scores: ArrayView1<f64>,
) -> Result<(), EvalError> {
    if uncertainty.len() != y.len() || y.len() != scores.len() {
        return Err(EvalError::InvalidValue(format!(
            "population arrays disagree in length: {} uncertainties, {} labels, {} scores",
            uncertainty.len(),
            y.len(),
            scores.len()
        )));
    }
    if y.is_empty() {
        return Err(EvalError::InvalidValue(
            "cannot evaluate rejection over zero samples".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::GRID_RESOLUTION;
    use crate::measure::Accuracy;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// Labels with scores that are informative for confident samples and
    /// noisy for uncertain ones, so uncertainty-based rejection has signal.
    fn synthetic_population(n: usize, seed: u64) -> (Array1<f64>, Array1<u8>, Array1<f64>) {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut uncertainty = Vec::with_capacity(n);
        let mut y = Vec::with_capacity(n);
        let mut scores = Vec::with_capacity(n);
        for _ in 0..n {
            let u: f64 = rng.r#gen::<f64>() * 0.5;
            let label = u8::from(rng.r#gen::<f64>() < 0.4);
            let noisy = rng.r#gen::<f64>() < u;
            let score = if noisy {
                rng.r#gen::<f64>()
            } else if label == 1 {
                0.75 + 0.25 * rng.r#gen::<f64>()
            } else {
                0.25 * rng.r#gen::<f64>()
            };
            uncertainty.push(u);
            y.push(label);
            scores.push(score);
        }
        (
            Array1::from_vec(uncertainty),
            Array1::from_vec(y),
            Array1::from_vec(scores),
        )
    }

    #[test]
    fn curves_cover_the_full_grid_and_nest_their_intervals() {
        let (u, y, scores) = synthetic_population(600, 99);
        let mut rng = StdRng::seed_from_u64(100);
        let curves = performance_over_uncertainty_tol(
            u.view(),
            y.view(),
            scores.view(),
            &Accuracy,
            50.0,
            300,
            &mut rng,
        )
        .unwrap();
        assert_eq!(curves.primary.len(), GRID_RESOLUTION);
        assert_eq!(curves.random.len(), GRID_RESOLUTION);
        for rec in curves.primary.iter().chain(curves.random.iter()) {
            assert!(rec.low <= rec.high);
            assert!(
                rec.low - 1e-9 <= rec.value && rec.value <= rec.high + 1e-9,
                "value {} outside [{}, {}]",
                rec.value,
                rec.low,
                rec.high
            );
        }
        assert!((curves.frac_retain[GRID_RESOLUTION - 1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn seeded_runs_are_bit_identical() {
        let (u, y, scores) = synthetic_population(300, 5);
        let run = |seed| {
            performance_over_uncertainty_tol(
                u.view(),
                y.view(),
                scores.view(),
                &Accuracy,
                50.0,
                100,
                &mut StdRng::seed_from_u64(seed),
            )
            .unwrap()
        };
        let a = run(77);
        let b = run(77);
        assert_eq!(a.tolerances, b.tolerances);
        assert_eq!(a.frac_retain, b.frac_retain);
        assert_eq!(a.primary, b.primary);
        assert_eq!(a.random, b.random);
    }

    #[test]
    fn stratified_variant_produces_full_curves() {
        let (u, y, scores) = synthetic_population(500, 12);
        let mut rng = StdRng::seed_from_u64(13);
        let curves = performance_with_stratified_baseline(
            u.view(),
            y.view(),
            scores.view(),
            &Accuracy,
            50.0,
            &mut rng,
        )
        .unwrap();
        assert_eq!(curves.primary.len(), GRID_RESOLUTION);
        assert_eq!(curves.random.len(), GRID_RESOLUTION);
        assert_eq!(curves.stratified.len(), GRID_RESOLUTION);
        for p in curves.primary.iter() {
            assert!((0.0..=1.0).contains(p));
        }
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        let (u, y, _) = synthetic_population(50, 1);
        let scores = Array1::zeros(49);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(
            performance_over_uncertainty_tol(
                u.view(),
                y.view(),
                scores.view(),
                &Accuracy,
                50.0,
                10,
                &mut rng,
            )
            .is_err()
        );
    }

    #[test]
    fn measure_failure_aborts_the_curve() {
        // A measure that is undefined everywhere must surface, not be
        // swallowed into a sentinel curve.
        let (u, y, scores) = synthetic_population(100, 8);
        let broken = crate::measure::MeasureFn(
            |_y: ArrayView1<u8>, _s: ArrayView1<f64>| -> Result<f64, EvalError> {
                Err(EvalError::UndefinedMeasure("always undefined".to_string()))
            },
        );
        let mut rng = StdRng::seed_from_u64(0);
        assert!(
            performance_over_uncertainty_tol(
                u.view(),
                y.view(),
                scores.view(),
                &broken,
                50.0,
                10,
                &mut rng,
            )
            .is_err()
        );
    }
}
