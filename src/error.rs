//! Error types for the FTRL engine.
//!
//! All validation happens eagerly at the API boundary before any numeric
//! work begins; a failed call leaves the model untouched.

use thiserror::Error;

/// Errors produced by construction, configuration, fitting and prediction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FtrlError {
    /// Parameter must be strictly positive.
    #[error("`{name}` should be positive: {value}")]
    NotPositive { name: &'static str, value: f64 },

    /// Parameter must be greater than or equal to zero.
    #[error("`{name}` should be greater than or equal to zero: {value}")]
    Negative { name: &'static str, value: f64 },

    /// Parameter must be a finite number.
    #[error("`{name}` should be a finite number, got {value}")]
    NotFinite { name: &'static str, value: f64 },

    /// A full parameter bundle and individual parameters were mixed in the
    /// builder.
    #[error(
        "pass either a full parameter bundle or individual parameters, \
         but not both at the same time"
    )]
    MixedParams,

    /// An interaction group with no features was declared.
    #[error("interaction groups cannot be empty")]
    EmptyInteraction,

    /// A parameter setter was called while a trained model exists.
    #[error("cannot change `{0}` for a trained model, reset this model or create a new one")]
    Locked(&'static str),

    /// `predict` was called before any successful fit.
    #[error("cannot make any predictions, the model should be trained first")]
    NotTrained,

    /// The training frame has no columns.
    #[error("training frame must have at least one column")]
    EmptyTrainingFrame,

    /// The target frame does not have exactly one column.
    #[error("target frame must have exactly one column, got {0}")]
    TargetShape(usize),

    /// Training and target frames disagree on row count.
    #[error("target frame has {targets} rows, training frame has {rows}")]
    RowCountMismatch { rows: usize, targets: usize },

    /// A frame was given with a column count different from fit time.
    #[error(
        "can only predict on a frame that has {expected} columns, \
         i.e. has the same number of features as was used for model training; got {got}"
    )]
    ColumnCountMismatch { expected: usize, got: usize },

    /// An interaction references a feature absent from the training frame.
    #[error(
        "feature '{0}' is used for interactions, however, \
         it is missing in the training frame"
    )]
    MissingInteractionFeature(String),

    /// An incremental fit presented different column names than the first.
    #[error(
        "column '{got}' at position {position} does not match column '{expected}' \
         the model was trained with"
    )]
    ColumnNameMismatch {
        position: usize,
        expected: String,
        got: String,
    },

    /// An incremental fit presented a target of a different family.
    #[error("target column kind does not match the target the model was trained with")]
    TargetKindMismatch,

    /// Columns of a frame have inconsistent lengths.
    #[error("column '{column}' has {got} rows, expected {expected}")]
    ColumnLengthMismatch {
        column: String,
        expected: usize,
        got: usize,
    },

    /// A serialized model failed to encode.
    #[error("failed to encode model: {0}")]
    Encode(String),

    /// A serialized model failed to decode or is internally inconsistent.
    #[error("failed to decode model: {0}")]
    Decode(String),
}
