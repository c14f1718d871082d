//! Errors
//!
//! Custom error types used throughout the `qpsiv` crate.
use thiserror::Error;

/// Errors that can occur while computing quasi-propensity scores or the 2SLS estimate.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum QpsIvError {
    /// Row or column counts of the inputs disagree.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),
    /// A continuous covariate has zero (or non-finite) standard deviation.
    #[error("Continuous covariate {0} has no variance, it cannot be standardized.")]
    DegenerateStandardization(usize),
    /// The covariates contain no continuous column to sample around.
    #[error("At least one continuous covariate is required to sample the quasi-propensity score.")]
    NoContinuousCovariates,
    /// No individual has a quasi-propensity score strictly inside (0, 1).
    #[error("Insufficient identification: none of the {0} individuals has a quasi-propensity score strictly between 0 and 1.")]
    InsufficientIdentification(usize),
    /// The 2SLS moment matrix cannot be inverted.
    #[error("Singular design: {0} is not invertible.")]
    SingularDesign(String),
    /// The scoring function failed or returned a value outside [0, 1].
    #[error("Scoring function fault: {0}")]
    ScoringCapabilityFault(String),
    /// First value is the name of the parameter, second is expected, third is what was passed.
    #[error("Invalid parameter value passed for {0}, expected {1} but {2} provided.")]
    InvalidParameter(String, String, String),
    /// Unable to serialize or deserialize an estimation result.
    #[error("Unable to (de)serialize: {0}")]
    Serialization(String),
}
