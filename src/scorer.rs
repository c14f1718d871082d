//! Scorer
//!
//! The machine-learning recommender, seen only as a function from an
//! individual's (continuous, discrete) covariates to a recommendation
//! probability in [0, 1].
use crate::errors::QpsIvError;

/// A recommendation scoring function.
///
/// Implementations must be free of side effects and safe to call from several
/// threads at once; they are evaluated at perturbed, out-of-sample covariate
/// values. Any `Fn(&[f64], &[f64]) -> f64 + Sync` closure is a `Scorer`.
pub trait Scorer: Sync {
    /// Score one individual.
    ///
    /// * `continuous` - Continuous covariates on their raw scale.
    /// * `discrete` - Discrete covariates, never perturbed.
    fn score(&self, continuous: &[f64], discrete: &[f64]) -> Result<f64, QpsIvError>;
}

impl<F> Scorer for F
where
    F: Fn(&[f64], &[f64]) -> f64 + Sync,
{
    fn score(&self, continuous: &[f64], discrete: &[f64]) -> Result<f64, QpsIvError> {
        Ok(self(continuous, discrete))
    }
}

/// Call the scorer and reject values that are not probabilities.
pub(crate) fn checked_score<S: Scorer + ?Sized>(
    scorer: &S,
    continuous: &[f64],
    discrete: &[f64],
) -> Result<f64, QpsIvError> {
    let value = scorer.score(continuous, discrete)?;
    if value.is_nan() || !(0.0..=1.0).contains(&value) {
        return Err(QpsIvError::ScoringCapabilityFault(format!(
            "returned {} for continuous covariates {:?}, expected a value in [0, 1]",
            value, continuous
        )));
    }
    Ok(value)
}
