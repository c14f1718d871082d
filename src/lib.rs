// Modules
pub mod causal;
pub mod data;
pub mod errors;
pub mod estimator;
pub mod linalg;
pub mod sampler;
pub mod scorer;
pub mod standardize;
pub mod utils;

// Individual classes, and functions
pub use causal::iv::EstimationResult;
pub use data::{Covariates, Matrix};
pub use errors::QpsIvError;
pub use estimator::{estimate, EstimatorConfig, QpsIvEstimator};
pub use sampler::{BallSampling, UniformBallSampler};
pub use scorer::Scorer;
