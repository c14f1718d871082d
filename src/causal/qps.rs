//! Quasi-Propensity Score (QPS)
//!
//! Monte Carlo estimate of the recommender's average recommendation probability
//! in a neighborhood of each individual's continuous covariates:
//!
//! $$ p^s(X_i; \delta) = \frac{1}{S} \sum_{s=1}^{S} ML(X_{c,i}^{s}, X_{d,i}) $$
//!
//! where $X_{c,i}^{s}$ are draws from the ball of radius $\delta$ around the
//! standardized continuous covariates of individual $i$, mapped back to the raw
//! scale before scoring. Discrete covariates are never perturbed.
use crate::errors::QpsIvError;
use crate::sampler::UniformBallSampler;
use crate::scorer::{checked_score, Scorer};
use crate::standardize::Moments;
use crate::utils::validate_positive_count_parameter;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// Computes quasi-propensity scores for individuals of one sample.
pub struct QpsEstimator<'a, S: Scorer + ?Sized> {
    sampler: UniformBallSampler,
    draws: usize,
    moments: &'a Moments,
    scorer: &'a S,
}

impl<'a, S: Scorer + ?Sized> QpsEstimator<'a, S> {
    /// Create a new `QpsEstimator`.
    ///
    /// * `sampler` - Ball sampler around the standardized covariates.
    /// * `draws` - Number of Monte Carlo draws per individual.
    /// * `moments` - Moments used to standardize the continuous covariates.
    /// * `scorer` - The recommendation scoring function.
    pub fn new(
        sampler: UniformBallSampler,
        draws: usize,
        moments: &'a Moments,
        scorer: &'a S,
    ) -> Result<Self, QpsIvError> {
        validate_positive_count_parameter(draws, "draws")?;
        if moments.is_empty() {
            return Err(QpsIvError::NoContinuousCovariates);
        }
        Ok(QpsEstimator {
            sampler,
            draws,
            moments,
            scorer,
        })
    }

    /// Quasi-propensity score of one individual.
    ///
    /// * `rng` - Random source for the ball draws.
    /// * `continuous` - The individual's standardized continuous covariates.
    /// * `discrete` - The individual's discrete covariates.
    pub fn score_individual(&self, rng: &mut StdRng, continuous: &[f64], discrete: &[f64]) -> Result<f64, QpsIvError> {
        if continuous.len() != self.moments.len() {
            return Err(QpsIvError::ShapeMismatch(format!(
                "individual has {} continuous covariates, moments describe {}",
                continuous.len(),
                self.moments.len()
            )));
        }
        let draws = self.sampler.sample(rng, continuous, self.draws)?;
        let mut total = 0.0;
        for draw in &draws {
            let raw = self.moments.destandardize(draw);
            total += checked_score(self.scorer, &raw, discrete)?;
        }
        Ok(total / self.draws as f64)
    }

    /// Quasi-propensity scores of every individual.
    ///
    /// One seed per individual is drawn from `seed` in index order before any
    /// scoring, so the scores do not depend on `parallel` or the number of threads.
    /// With `parallel`, individuals are scored on the current rayon thread pool.
    ///
    /// * `continuous` - Standardized continuous covariates, one row per individual.
    /// * `discrete` - Discrete covariates, one row per individual.
    /// * `seed` - Seed of the master random source.
    /// * `parallel` - Score individuals concurrently.
    pub fn score_all(
        &self,
        continuous: &[Vec<f64>],
        discrete: &[Vec<f64>],
        seed: u64,
        parallel: bool,
    ) -> Result<Vec<f64>, QpsIvError> {
        if continuous.len() != discrete.len() {
            return Err(QpsIvError::ShapeMismatch(format!(
                "{} rows of continuous covariates but {} rows of discrete covariates",
                continuous.len(),
                discrete.len()
            )));
        }
        let mut master = StdRng::seed_from_u64(seed);
        let seeds: Vec<u64> = (0..continuous.len()).map(|_| master.gen()).collect();

        debug!(
            "Computing quasi-propensity scores for {} individuals with {} draws each.",
            continuous.len(),
            self.draws
        );
        let score = |i: usize| {
            let mut rng = StdRng::seed_from_u64(seeds[i]);
            self.score_individual(&mut rng, &continuous[i], &discrete[i])
        };
        if parallel {
            (0..continuous.len()).into_par_iter().map(score).collect()
        } else {
            (0..continuous.len()).map(score).collect()
        }
    }
}
