//! Binarization of an ordinal grading task into a detection task.
//!
//! Ground truth arrives as ordinal severity levels (0 = healthy, increasing
//! integers = increasing severity) and predictions as per-class probability
//! mass. For a chosen onset level `L`, the detection task is: label 1 if the
//! ordinal level is at least `L`, and the detection score is the total
//! probability mass assigned to levels at or beyond `L`.
//!
//! The number of class columns is inspected exactly once, when raw arrays
//! cross the crate boundary ([`ClassScores::from_matrix`],
//! [`McScores::from_draws`]). Everything downstream works with the resolved
//! representation instead of re-branching on matrix shape per call.

use ndarray::{Array1, Array2, Array3, ArrayView1, Axis, s};

use crate::error::EvalError;

/// Tolerance for probability-mass checks; class probabilities emitted by a
/// softmax can overshoot 1.0 by a few ulps.
const PROB_EPS: f64 = 1e-6;

/// Point-estimate class probabilities for `n` samples, resolved by column
/// count at construction.
#[derive(Debug, Clone)]
pub enum ClassScores {
    /// Positive-class probability per sample (from a two-column input).
    Binary(Array1<f64>),
    /// Full per-class probability matrix, shape `[n, n_classes]` with
    /// `n_classes >= 3`.
    MultiClass(Array2<f64>),
}

impl ClassScores {
    /// Resolves a raw `[n, n_classes]` probability matrix. Two columns become
    /// [`ClassScores::Binary`] (keeping the positive column), three or more
    /// stay ordinal multi-class. Fewer than two columns is an
    /// [`EvalError::InvalidShape`].
    pub fn from_matrix(probs: Array2<f64>) -> Result<Self, EvalError> {
        match probs.ncols() {
            n if n < 2 => Err(EvalError::InvalidShape { n_classes: n }),
            2 => Ok(ClassScores::Binary(probs.column(1).to_owned())),
            _ => Ok(ClassScores::MultiClass(probs)),
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        match self {
            ClassScores::Binary(v) => v.len(),
            ClassScores::MultiClass(m) => m.nrows(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Collapses the class dimension for the detection task at `onset_level`:
    /// the probability of being at or beyond onset. For a binary input this
    /// is the positive column unchanged; for a multi-class input it is the
    /// sum of class columns `onset_level..`.
    pub fn binarize(&self, onset_level: u8) -> Result<Array1<f64>, EvalError> {
        let scores = match self {
            ClassScores::Binary(v) => v.clone(),
            ClassScores::MultiClass(m) => {
                let onset = clip_onset(onset_level, m.ncols())?;
                m.slice(s![.., onset..]).sum_axis(Axis(1))
            }
        };
        check_unit_interval(scores.view())?;
        Ok(scores)
    }
}

/// Monte-Carlo prediction draws for `n` samples, `m` draws each, resolved by
/// class count at construction just like [`ClassScores`].
#[derive(Debug, Clone)]
pub enum McScores {
    /// Positive-class draws, shape `[n, m]`.
    Binary(Array2<f64>),
    /// Per-class draws, shape `[n, n_classes, m]` with `n_classes >= 3`.
    MultiClass(Array3<f64>),
}

impl McScores {
    /// Resolves a raw `[n, n_classes, m]` stack of stochastic forward passes.
    pub fn from_draws(draws: Array3<f64>) -> Result<Self, EvalError> {
        let n_classes = draws.len_of(Axis(1));
        match n_classes {
            n if n < 2 => Err(EvalError::InvalidShape { n_classes: n }),
            2 => Ok(McScores::Binary(draws.index_axis(Axis(1), 1).to_owned())),
            _ => Ok(McScores::MultiClass(draws)),
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        match self {
            McScores::Binary(m) => m.nrows(),
            McScores::MultiClass(d) => d.len_of(Axis(0)),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Collapses the class axis at `onset_level`, yielding the `[n, m]`
    /// matrix of per-draw detection scores.
    pub fn binarize(&self, onset_level: u8) -> Result<Array2<f64>, EvalError> {
        let scores = match self {
            McScores::Binary(m) => m.clone(),
            McScores::MultiClass(d) => {
                let onset = clip_onset(onset_level, d.len_of(Axis(1)))?;
                d.slice(s![.., onset.., ..]).sum_axis(Axis(1))
            }
        };
        for &s in scores.iter() {
            if !(-PROB_EPS..=1.0 + PROB_EPS).contains(&s) {
                return Err(EvalError::InvalidValue(format!(
                    "binarized mc score {s} outside [0, 1]"
                )));
            }
        }
        Ok(scores)
    }
}

/// The binary detection view of a population: labels, point scores and
/// Monte-Carlo draw scores, all index-aligned 1:1 with the input arrays.
#[derive(Debug, Clone)]
pub struct DetectionTask {
    /// 0 = below onset, 1 = at or beyond onset.
    pub labels: Array1<u8>,
    /// Point-estimate probability of the positive class, per sample.
    pub scores: Array1<f64>,
    /// `[n, m]` per-draw positive-class probabilities.
    pub mc_scores: Array2<f64>,
}

/// Collapses ordinal severity levels into binary detection labels:
/// 1 where `level >= onset_level`, else 0.
pub fn binarize_labels(levels: ArrayView1<u8>, onset_level: u8) -> Array1<u8> {
    levels.mapv(|level| u8::from(level >= onset_level))
}

/// Derives the full detection task for `onset_level` from ordinal labels,
/// point-estimate class probabilities and the Monte-Carlo ensemble.
///
/// All three outputs are index-aligned with the input population. Fails if
/// the sample counts disagree or `onset_level` is zero (a zero onset would
/// declare every sample positive and the task degenerate).
pub fn detection_task(
    levels: ArrayView1<u8>,
    scores: &ClassScores,
    mc_scores: &McScores,
    onset_level: u8,
) -> Result<DetectionTask, EvalError> {
    if onset_level == 0 {
        return Err(EvalError::InvalidValue(
            "onset_level must be at least 1".to_string(),
        ));
    }
    if levels.len() != scores.len() || levels.len() != mc_scores.len() {
        return Err(EvalError::InvalidValue(format!(
            "population arrays disagree in length: {} labels, {} score rows, {} mc rows",
            levels.len(),
            scores.len(),
            mc_scores.len()
        )));
    }
    Ok(DetectionTask {
        labels: binarize_labels(levels, onset_level),
        scores: scores.binarize(onset_level)?,
        mc_scores: mc_scores.binarize(onset_level)?,
    })
}

/// The onset level indexes the class axis; summing from an out-of-range
/// column would silently produce an all-zero score vector.
fn clip_onset(onset_level: u8, n_classes: usize) -> Result<usize, EvalError> {
    let onset = onset_level as usize;
    if onset == 0 || onset >= n_classes {
        return Err(EvalError::InvalidValue(format!(
            "onset_level {onset} outside valid range 1..{n_classes}"
        )));
    }
    Ok(onset)
}

fn check_unit_interval(scores: ArrayView1<f64>) -> Result<(), EvalError> {
    for &s in scores.iter() {
        if !(-PROB_EPS..=1.0 + PROB_EPS).contains(&s) {
            return Err(EvalError::InvalidValue(format!(
                "binarized score {s} outside [0, 1]"
            )));
        }
    }
    Ok(())
}
