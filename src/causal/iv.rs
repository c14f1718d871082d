//! Instrumental Variable (2SLS) Estimator
//!
//! Closed-form two-stage least squares with the machine-learning recommendation
//! as the instrument for treatment and the quasi-propensity score as an included
//! exogenous control.
//!
//! # Model Structure
//!
//! For the retained individuals, with $Z$ the recommendation, $D$ the treatment
//! and $Y$ the outcome:
//!
//! $$ Y_i = \beta_0 + \beta_1 D_i + \beta_2 \, QPS_i + \epsilon_i $$
//!
//! * $W$ stacks the rows $(1, Z_i, QPS_i)$ and $V$ the rows $(1, D_i, QPS_i)$.
//! * $\hat\beta = (W V')^{-1} W Y$
//! * $\hat\Sigma = (W V')^{-1} \, W \, \mathrm{diag}(\hat e^2) \, W' \, (V W')^{-1}$,
//!   the heteroskedasticity-robust sandwich.
use crate::errors::QpsIvError;
use crate::linalg::{cross_product, equilibrated_inverse, to_rows};
use crate::utils::{fmt_vec_output, validate_finite, validate_length};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt;

const COEFFICIENT_NAMES: [&str; 3] = ["intercept", "treatment", "qps"];

/// Result of the 2SLS estimation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationResult {
    /// Coefficients `[intercept, treatment effect, QPS effect]`.
    pub coefficients: [f64; 3],
    /// Heteroskedasticity-robust covariance matrix of the coefficients.
    pub covariance: [[f64; 3]; 3],
    /// Number of individuals with a quasi-propensity score strictly inside (0, 1).
    pub n_obs: usize,
    /// Indices of the retained individuals in the original sample.
    pub retained: Vec<usize>,
    /// Quasi-propensity scores of the retained individuals.
    pub qps: Vec<f64>,
}

impl EstimationResult {
    /// Robust standard errors of the coefficients.
    pub fn std_errors(&self) -> [f64; 3] {
        [
            self.covariance[0][0].sqrt(),
            self.covariance[1][1].sqrt(),
            self.covariance[2][2].sqrt(),
        ]
    }

    /// Estimated treatment effect.
    pub fn treatment_effect(&self) -> f64 {
        self.coefficients[1]
    }

    /// Robust standard error of the treatment effect.
    pub fn treatment_std_error(&self) -> f64 {
        self.covariance[1][1].sqrt()
    }

    /// t-statistics of the coefficients.
    pub fn t_statistics(&self) -> [f64; 3] {
        let se = self.std_errors();
        [
            self.coefficients[0] / se[0],
            self.coefficients[1] / se[1],
            self.coefficients[2] / se[2],
        ]
    }

    /// Save the result as a json string.
    pub fn json_dump(&self) -> Result<String, QpsIvError> {
        serde_json::to_string(self).map_err(|e| QpsIvError::Serialization(e.to_string()))
    }

    /// Load a result from a json string.
    pub fn from_json(json_str: &str) -> Result<Self, QpsIvError> {
        serde_json::from_str::<EstimationResult>(json_str).map_err(|e| QpsIvError::Serialization(e.to_string()))
    }
}

impl fmt::Display for EstimationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let se = self.std_errors();
        let t = self.t_statistics();
        writeln!(f, "IV-2SLS Estimation Summary (robust covariance)")?;
        writeln!(f, "No. Observations: {}", self.n_obs)?;
        writeln!(f, "{:<12}{:>14}{:>14}{:>10}", "", "Estimate", "Std. Error", "T-stat")?;
        for i in 0..3 {
            writeln!(
                f,
                "{:<12}{:>14.4}{:>14.4}{:>10.4}",
                COEFFICIENT_NAMES[i], self.coefficients[i], se[i], t[i]
            )?;
        }
        writeln!(f, "Covariance:")?;
        for row in &self.covariance {
            writeln!(f, "  [{}]", fmt_vec_output(row))?;
        }
        Ok(())
    }
}

/// Fit the 2SLS estimator on the individuals listed in `retained`.
///
/// * `outcome` - Outcomes $Y$ of every individual.
/// * `treatment` - Treatments $D$ of every individual.
/// * `instrument` - Recommendations $Z$ of every individual.
/// * `qps` - Quasi-propensity scores of every individual.
/// * `retained` - Indices of the individuals entering the estimation.
pub fn fit_2sls(
    outcome: &[f64],
    treatment: &[f64],
    instrument: &[f64],
    qps: &[f64],
    retained: &[usize],
) -> Result<EstimationResult, QpsIvError> {
    let n = outcome.len();
    validate_length(treatment, n, "treatment")?;
    validate_length(instrument, n, "instrument")?;
    validate_length(qps, n, "qps")?;
    if retained.is_empty() {
        return Err(QpsIvError::InsufficientIdentification(n));
    }
    if let Some(i) = retained.iter().find(|i| **i >= n) {
        return Err(QpsIvError::ShapeMismatch(format!(
            "retained index {} is out of range for {} individuals",
            i, n
        )));
    }

    validate_finite(outcome, retained, "outcome")?;
    validate_finite(treatment, retained, "treatment")?;
    validate_finite(instrument, retained, "instrument")?;
    validate_finite(qps, retained, "qps")?;

    // Columns of W and V.
    let w: Vec<Vector3<f64>> = retained.iter().map(|&i| Vector3::new(1.0, instrument[i], qps[i])).collect();
    let v: Vec<Vector3<f64>> = retained.iter().map(|&i| Vector3::new(1.0, treatment[i], qps[i])).collect();
    let y: Vec<f64> = retained.iter().map(|&i| outcome[i]).collect();

    let wv = cross_product(w.iter().zip(&v).map(|(a, b)| (a, b, 1.0)));
    let wv_inv = equilibrated_inverse(&wv).ok_or_else(|| QpsIvError::SingularDesign("W V'".to_string()))?;
    let vw_inv = equilibrated_inverse(&wv.transpose()).ok_or_else(|| QpsIvError::SingularDesign("V W'".to_string()))?;

    let wy = w.iter().zip(&y).fold(Vector3::zeros(), |acc, (wi, yi)| acc + wi * *yi);
    let beta = wv_inv * wy;

    // Squared second-stage residuals, using the observed treatment.
    let e2: Vec<f64> = v
        .iter()
        .zip(&y)
        .map(|(vi, yi)| {
            let e = yi - beta.dot(vi);
            e * e
        })
        .collect();
    let meat = cross_product(w.iter().zip(&e2).map(|(wi, ei)| (wi, wi, *ei)));
    let covariance = wv_inv * meat * vw_inv;

    if beta.iter().chain(covariance.iter()).any(|x| !x.is_finite()) {
        return Err(QpsIvError::SingularDesign(
            "W V' (estimates overflow the floating point range)".to_string(),
        ));
    }

    Ok(EstimationResult {
        coefficients: [beta[0], beta[1], beta[2]],
        covariance: to_rows(&covariance),
        n_obs: retained.len(),
        retained: retained.to_vec(),
        qps: retained.iter().map(|&i| qps[i]).collect(),
    })
}
