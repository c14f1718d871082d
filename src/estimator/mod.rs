//! Estimator
//!
//! Entry point of the QPS-IV design: standardizes the covariates, computes the
//! quasi-propensity scores, filters on their support and fits the 2SLS estimator.
pub mod config;
pub mod core;
mod setters;

pub use self::config::EstimatorConfig;
pub use self::core::{estimate, QpsIvEstimator};
