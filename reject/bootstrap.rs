//! Percentile bootstrap confidence intervals for paired label/score data.
//!
//! Each resample draws `n` indices with replacement and applies the SAME
//! index vector to labels and scores, so the pairing the measure depends on
//! survives resampling. The interval is the (alpha/2, 1 - alpha/2)
//! percentile pair of the resampled statistic distribution.

use ndarray::{Array1, ArrayView1};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::EvalError;
use crate::grid::percentile;
use crate::measure::Measure;

/// A two-sided percentile interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub low: f64,
    pub high: f64,
}

/// Estimates a `1 - alpha` two-sided percentile interval for
/// `measure(y, scores)` from `n_resamples` paired resamples-with-replacement.
///
/// Measure failures on a resample (e.g. a single-class draw for ROC-AUC)
/// propagate; an interval computed from a partially failed resample set
/// would misstate the sampling distribution.
pub fn bootstrap_ci<M: Measure + ?Sized>(
    y: ArrayView1<u8>,
    scores: ArrayView1<f64>,
    measure: &M,
    n_resamples: usize,
    alpha: f64,
    rng: &mut impl Rng,
) -> Result<ConfidenceInterval, EvalError> {
    if y.len() != scores.len() {
        return Err(EvalError::InvalidValue(format!(
            "label/score vectors disagree in length: {} vs {}",
            y.len(),
            scores.len()
        )));
    }
    if y.is_empty() {
        return Err(EvalError::InvalidValue(
            "cannot bootstrap zero samples".to_string(),
        ));
    }
    if n_resamples == 0 {
        return Err(EvalError::InvalidValue(
            "bootstrap needs at least one resample".to_string(),
        ));
    }
    if !(0.0..1.0).contains(&alpha) || alpha == 0.0 {
        return Err(EvalError::InvalidValue(format!(
            "significance level {alpha} outside (0, 1)"
        )));
    }

    let n = y.len();
    let mut stats = Vec::with_capacity(n_resamples);
    let mut y_draw = Array1::zeros(n);
    let mut score_draw = Array1::zeros(n);
    for _ in 0..n_resamples {
        for i in 0..n {
            let j = rng.gen_range(0..n);
            y_draw[i] = y[j];
            score_draw[i] = scores[j];
        }
        stats.push(measure.evaluate(y_draw.view(), score_draw.view())?);
    }

    let stats = Array1::from_vec(stats);
    Ok(ConfidenceInterval {
        low: percentile(stats.view(), 100.0 * alpha / 2.0)?,
        high: percentile(stats.view(), 100.0 * (1.0 - alpha / 2.0))?,
    })
}
