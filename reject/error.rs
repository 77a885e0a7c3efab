use thiserror::Error;

/// A comprehensive error type for all operations in this crate.
///
/// Every variant is a contract violation: computation past any of these
/// would produce statistically meaningless curves, so the current curve
/// computation is aborted rather than patched with a default value.
#[derive(Error, Debug)]
pub enum EvalError {
    /// The class-probability input has an unsupported number of columns.
    /// Two columns are a binary task, three or more an ordinal multi-class
    /// task; anything below two carries no positive-class mass to sum.
    #[error("score input has {n_classes} class column(s); expected 2 or more")]
    InvalidShape { n_classes: usize },

    /// A derived quantity violated its numeric contract (negative standard
    /// deviation, probability mass outside [0, 1], empty or length-mismatched
    /// input). Should never trigger on well-formed input.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Stratified sampling cannot satisfy a class quota: the reference subset
    /// demands more members of `class` than the full population holds.
    #[error(
        "stratified sampling needs {required} member(s) of class {class}, \
         but only {available} are present in the population"
    )]
    InsufficientClassMembers {
        class: u8,
        required: usize,
        available: usize,
    },

    /// The plugged-in performance measure cannot be evaluated on the given
    /// subset (e.g. ROC-AUC on a single-class subset, accuracy on an empty
    /// one).
    #[error("measure undefined: {0}")]
    UndefinedMeasure(String),
}
