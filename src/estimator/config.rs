//! Estimator Configuration
//!
//! Defines the configuration structure of the QPS-IV estimator: the sampling
//! bandwidth, the number of Monte Carlo draws and the random and threading setup.
use crate::errors::QpsIvError;
use crate::sampler::BallSampling;
use serde::{Deserialize, Serialize};

fn default_delta() -> f64 {
    2.0
}
fn default_draws() -> usize {
    20
}
fn default_seed() -> u64 {
    0
}
fn default_num_threads() -> Option<usize> {
    None
}
fn default_parallel() -> bool {
    true
}
fn default_sampling() -> BallSampling {
    BallSampling::Uniform
}

/// Configuration of the QPS-IV estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimatorConfig {
    /// Radius of the ball around each individual's standardized continuous covariates.
    #[serde(default = "default_delta")]
    pub delta: f64,
    /// Number of Monte Carlo draws per individual.
    #[serde(default = "default_draws")]
    pub draws: usize,
    /// Seed of the random source used for the ball draws.
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Number of threads used to compute the quasi-propensity scores, all cores if `None`.
    #[serde(default = "default_num_threads")]
    pub num_threads: Option<usize>,
    /// Compute quasi-propensity scores of different individuals concurrently.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    /// Direction sampling method of the ball sampler.
    #[serde(default = "default_sampling")]
    pub sampling: BallSampling,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        EstimatorConfig {
            delta: default_delta(),
            draws: default_draws(),
            seed: default_seed(),
            num_threads: default_num_threads(),
            parallel: default_parallel(),
            sampling: default_sampling(),
        }
    }
}

impl EstimatorConfig {
    /// Load a configuration from a json string, filling missing fields with defaults.
    pub fn from_json(json_str: &str) -> Result<Self, QpsIvError> {
        serde_json::from_str::<EstimatorConfig>(json_str).map_err(|e| QpsIvError::Serialization(e.to_string()))
    }

    /// Save the configuration as a json string.
    pub fn json_dump(&self) -> Result<String, QpsIvError> {
        serde_json::to_string(self).map_err(|e| QpsIvError::Serialization(e.to_string()))
    }
}
