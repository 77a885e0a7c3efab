//! Pluggable performance measures.
//!
//! The curve engine is agnostic to how performance is summarized: anything
//! that maps an aligned (label, score) pair of vectors to one number fits.
//! The two measures most screening evaluations reach for, accuracy and
//! ROC-AUC, are provided; callers can plug any closure with the same shape
//! through [`MeasureFn`].
//!
//! A measure owns its own degeneracy policy. ROC-AUC is undefined on a
//! single-class subset and says so with [`EvalError::UndefinedMeasure`]
//! instead of inventing a sentinel value; the engine never swallows that
//! error.

use ndarray::{Array1, ArrayView1};

use crate::error::EvalError;

/// A scalar performance summary over aligned label/score vectors.
pub trait Measure {
    fn evaluate(&self, y: ArrayView1<u8>, scores: ArrayView1<f64>) -> Result<f64, EvalError>;
}

/// Adapter turning any closure with the right shape into a [`Measure`].
pub struct MeasureFn<F>(pub F);

impl<F> Measure for MeasureFn<F>
where
    F: Fn(ArrayView1<u8>, ArrayView1<f64>) -> Result<f64, EvalError>,
{
    fn evaluate(&self, y: ArrayView1<u8>, scores: ArrayView1<f64>) -> Result<f64, EvalError> {
        (self.0)(y, scores)
    }
}

/// Hard labels from detection scores: positive at or above 0.5.
pub fn argmax_labels(scores: ArrayView1<f64>) -> Array1<u8> {
    scores.mapv(|s| u8::from(s >= 0.5))
}

/// Fraction of samples whose thresholded prediction matches the label.
#[derive(Debug, Clone, Copy, Default)]
pub struct Accuracy;

impl Measure for Accuracy {
    fn evaluate(&self, y: ArrayView1<u8>, scores: ArrayView1<f64>) -> Result<f64, EvalError> {
        check_aligned(y, scores)?;
        if y.is_empty() {
            return Err(EvalError::UndefinedMeasure(
                "accuracy over an empty subset".to_string(),
            ));
        }
        let correct = argmax_labels(scores)
            .iter()
            .zip(y.iter())
            .filter(|(pred, label)| pred == label)
            .count();
        Ok(correct as f64 / y.len() as f64)
    }
}

/// Area under the ROC curve via the Mann-Whitney U statistic, with
/// average-rank tie handling. Equals the probability that a random positive
/// sample outranks a random negative one.
#[derive(Debug, Clone, Copy, Default)]
pub struct RocAuc;

impl Measure for RocAuc {
    fn evaluate(&self, y: ArrayView1<u8>, scores: ArrayView1<f64>) -> Result<f64, EvalError> {
        check_aligned(y, scores)?;
        let n_pos = y.iter().filter(|&&label| label == 1).count();
        let n_neg = y.len() - n_pos;
        if n_pos == 0 || n_neg == 0 {
            return Err(EvalError::UndefinedMeasure(format!(
                "roc-auc over a subset with {n_pos} positive and {n_neg} negative sample(s)"
            )));
        }

        let mut order: Vec<(f64, u8)> = scores.iter().cloned().zip(y.iter().cloned()).collect();
        order.sort_by(|a, b| a.0.total_cmp(&b.0));

        // Average ranks within tie groups (1-indexed).
        let n = order.len();
        let mut rank_sum_pos = 0.0;
        let mut i = 0;
        while i < n {
            let mut j = i;
            while j < n && order[j].0 == order[i].0 {
                j += 1;
            }
            let avg_rank = (i + 1 + j) as f64 / 2.0;
            for item in &order[i..j] {
                if item.1 == 1 {
                    rank_sum_pos += avg_rank;
                }
            }
            i = j;
        }

        let n_pos = n_pos as f64;
        let u = rank_sum_pos - n_pos * (n_pos + 1.0) / 2.0;
        Ok(u / (n_pos * n_neg as f64))
    }
}

fn check_aligned(y: ArrayView1<u8>, scores: ArrayView1<f64>) -> Result<(), EvalError> {
    if y.len() != scores.len() {
        return Err(EvalError::InvalidValue(format!(
            "label/score vectors disagree in length: {} vs {}",
            y.len(),
            scores.len()
        )));
    }
    Ok(())
}
