//! Rejection-curve evaluation for selective classification.
//!
//! A classifier that can say "I don't know" refers its most uncertain
//! samples for manual review instead of classifying them automatically. This
//! crate quantifies what that buys: starting from ordinal ground truth,
//! per-class probability estimates and a Monte-Carlo ensemble of stochastic
//! predictions per sample, it derives a binary detection task, summarizes
//! the ensemble into a predictive mean (the point estimate) and standard
//! deviation (the uncertainty score), sweeps an uncertainty tolerance from
//! strict to permissive, and traces the chosen performance measure — with
//! bootstrap confidence intervals — over the accepted subset at each
//! tolerance, next to random-rejection and prior-preserving baselines.
//!
//! The crate is a pure computation engine: it neither loads prediction
//! files nor renders charts, and every randomized step draws from a
//! caller-supplied generator, so seeded runs reproduce bit-identically.
//!
//! ```
//! use abstain::{Accuracy, performance_over_uncertainty_tol, posterior_statistics};
//! use ndarray::Array2;
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//!
//! // 20 samples, 8 Monte-Carlo draws each.
//! let mc = Array2::from_shape_fn((20, 8), |(i, j)| ((i * 7 + j * 3) % 10) as f64 / 10.0);
//! let stats = posterior_statistics(mc.view()).unwrap();
//! let y = ndarray::Array1::from_shape_fn(20, |i| u8::from(i % 3 == 0));
//!
//! let mut rng = StdRng::seed_from_u64(0);
//! let curves = performance_over_uncertainty_tol(
//!     stats.predictive_std.view(),
//!     y.view(),
//!     stats.predictive_mean.view(),
//!     &Accuracy,
//!     50.0,
//!     200,
//!     &mut rng,
//! )
//! .unwrap();
//! assert_eq!(curves.primary.len(), curves.tolerances.len());
//! ```

pub mod binarize;
pub mod bootstrap;
pub mod curve;
pub mod error;
pub mod grid;
pub mod measure;
pub mod posterior;
pub mod stratified;

pub use binarize::{ClassScores, DetectionTask, McScores, binarize_labels, detection_task};
pub use bootstrap::{ConfidenceInterval, bootstrap_ci};
pub use curve::{
    PerformanceRecord, RejectionCurves, StratifiedCurves, performance_over_uncertainty_tol,
    performance_with_stratified_baseline,
};
pub use error::EvalError;
pub use grid::{GRID_RESOLUTION, RejectionGrid, percentile, sample_rejection};
pub use measure::{Accuracy, Measure, MeasureFn, RocAuc, argmax_labels};
pub use posterior::{PosteriorStatistics, density_mode, posterior_statistics};
pub use stratified::{rel_freq, stratified_mask};
