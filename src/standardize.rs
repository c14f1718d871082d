//! Standardize
//!
//! Z-scores the continuous covariates over the full sample and keeps the
//! moments needed to map sampled points back to the raw covariate scale.
use crate::errors::QpsIvError;
use log::debug;
use serde::{Deserialize, Serialize};

/// Per-column mean and (population) standard deviation of the continuous covariates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Moments {
    /// Column means.
    pub mean: Vec<f64>,
    /// Column standard deviations, each strictly positive.
    pub std: Vec<f64>,
}

impl Moments {
    /// Compute the moments of each column of `rows` (n rows of equal length).
    ///
    /// The standard deviation uses the `1/n` normalization. A column whose
    /// standard deviation is zero or not finite cannot be standardized.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, QpsIvError> {
        let p = rows.first().map_or(0, |r| r.len());
        if rows.is_empty() {
            return Err(QpsIvError::ShapeMismatch(
                "cannot compute moments of an empty sample".to_string(),
            ));
        }
        if let Some(bad) = rows.iter().position(|r| r.len() != p) {
            return Err(QpsIvError::ShapeMismatch(format!(
                "row {} has {} continuous covariates, expected {}",
                bad,
                rows[bad].len(),
                p
            )));
        }
        let n = rows.len() as f64;
        let mut mean = vec![0.0; p];
        for r in rows {
            for (m, v) in mean.iter_mut().zip(r) {
                *m += v;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut var = vec![0.0; p];
        for r in rows {
            for ((s, v), m) in var.iter_mut().zip(r).zip(&mean) {
                *s += (v - m) * (v - m);
            }
        }
        let std: Vec<f64> = var.iter().map(|s| (s / n).sqrt()).collect();
        if let Some(col) = std.iter().position(|s| !s.is_finite() || *s <= 0.0) {
            return Err(QpsIvError::DegenerateStandardization(col));
        }
        debug!("Continuous covariate means: {:?}, standard deviations: {:?}", mean, std);
        Ok(Moments { mean, std })
    }

    /// Number of columns described.
    pub fn len(&self) -> usize {
        self.mean.len()
    }

    /// Whether no columns are described.
    pub fn is_empty(&self) -> bool {
        self.mean.is_empty()
    }

    /// Map a raw-scale vector to z-scores: `(x - mean) / std`.
    pub fn standardize(&self, x: &[f64]) -> Vec<f64> {
        x.iter()
            .zip(self.mean.iter().zip(&self.std))
            .map(|(v, (m, s))| (v - m) / s)
            .collect()
    }

    /// Map a z-scored vector back to raw scale: `z * std + mean`.
    pub fn destandardize(&self, z: &[f64]) -> Vec<f64> {
        z.iter()
            .zip(self.mean.iter().zip(&self.std))
            .map(|(v, (m, s))| v * s + m)
            .collect()
    }
}

/// Standardize every row with moments computed from the full sample.
///
/// Returns the z-scored rows together with the moments used.
pub fn standardize_rows(rows: &[Vec<f64>]) -> Result<(Vec<Vec<f64>>, Moments), QpsIvError> {
    let moments = Moments::from_rows(rows)?;
    let standardized = rows.iter().map(|r| moments.standardize(r)).collect();
    Ok((standardized, moments))
}
