//! Prior-preserving subset selection.
//!
//! Uncertainty-based rejection shifts the class prior of the accepted subset
//! (uncertain samples are rarely a uniform draw from both classes). To
//! separate "performance gained by selecting confident samples" from
//! "performance gained by shifting the prior", the engine compares against a
//! subset that matches the accepted subset's size *and* class composition
//! exactly, drawn from the full population.

use std::collections::BTreeMap;

use ndarray::{Array1, ArrayView1};
use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::EvalError;

/// Builds a boolean mask over `y_full` selecting, for every class present in
/// `y_reference`, exactly as many members of that class as the reference
/// contains.
///
/// With `shuffle = false`, selection within each class takes that class's
/// first indices in population order, which is deterministic but positionally
/// biased; with `shuffle = true`, each class's index pool is permuted with
/// `rng` before truncation. A class quota that the population cannot satisfy
/// is an [`EvalError::InsufficientClassMembers`] — truncating silently would
/// change the prior the mask exists to preserve.
///
/// The returned mask always has exactly `y_reference.len()` true entries.
pub fn stratified_mask(
    y_full: ArrayView1<u8>,
    y_reference: ArrayView1<u8>,
    shuffle: bool,
    rng: &mut impl Rng,
) -> Result<Array1<bool>, EvalError> {
    let mut quota: BTreeMap<u8, usize> = BTreeMap::new();
    for &k in y_reference.iter() {
        *quota.entry(k).or_insert(0) += 1;
    }

    let mut mask = Array1::from_elem(y_full.len(), false);
    for (&class, &required) in &quota {
        let mut pool: Vec<usize> = y_full
            .iter()
            .enumerate()
            .filter_map(|(i, &y)| (y == class).then_some(i))
            .collect();
        if pool.len() < required {
            return Err(EvalError::InsufficientClassMembers {
                class,
                required,
                available: pool.len(),
            });
        }
        if shuffle {
            pool.shuffle(rng);
        }
        for &i in &pool[..required] {
            mask[i] = true;
        }
    }
    Ok(mask)
}

/// Relative frequency of `class` in `y`.
pub fn rel_freq(y: ArrayView1<u8>, class: u8) -> f64 {
    if y.is_empty() {
        return 0.0;
    }
    y.iter().filter(|&&k| k == class).count() as f64 / y.len() as f64
}
