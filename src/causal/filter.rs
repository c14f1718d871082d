//! Filter
//!
//! Keeps the individuals whose quasi-propensity score lies strictly inside (0, 1).
//! Individuals with a score of exactly 0 or 1 have no local variation in the
//! recommendation and carry no identifying information.
use crate::errors::QpsIvError;
use log::warn;

/// Indices `i` with `0 < qps[i] < 1`, in increasing order.
///
/// Fails with [`QpsIvError::InsufficientIdentification`] if no index remains.
pub fn interior_indices(qps: &[f64]) -> Result<Vec<usize>, QpsIvError> {
    let kept: Vec<usize> = qps
        .iter()
        .enumerate()
        .filter(|(_, p)| **p > 0.0 && **p < 1.0)
        .map(|(i, _)| i)
        .collect();
    if kept.is_empty() {
        return Err(QpsIvError::InsufficientIdentification(qps.len()));
    }
    if kept.len() < qps.len() {
        warn!(
            "Dropping {} of {} individuals with a quasi-propensity score of 0 or 1.",
            qps.len() - kept.len(),
            qps.len()
        );
    }
    Ok(kept)
}
