//! Causal
//!
//! This module implements the machine-learning-as-natural-experiment design:
//! quasi-propensity scores of a recommender, the filter on their support, and
//! the IV-2SLS estimator that uses the recommendation as an instrument.
pub mod filter;
pub mod iv;
pub mod qps;

mod tests;
