use crate::causal::filter::interior_indices;
use crate::causal::iv::{fit_2sls, EstimationResult};
use crate::causal::qps::QpsEstimator;
use crate::data::{CovariateRows, Covariates};
use crate::errors::QpsIvError;
use crate::estimator::config::EstimatorConfig;
use crate::sampler::UniformBallSampler;
use crate::scorer::Scorer;
use crate::standardize::standardize_rows;
use crate::utils::{validate_length, validate_positive_count_parameter, validate_positive_float_parameter};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// QPS-IV estimator object
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QpsIvEstimator {
    /// Estimator configuration.
    pub cfg: EstimatorConfig,
}

impl QpsIvEstimator {
    /// Estimator object.
    ///
    /// * `delta` - radius of the ball around each individual's standardized continuous covariates.
    /// * `draws` - number of Monte Carlo draws per individual.
    /// * `seed` - seed of the random source for the ball draws.
    pub fn new(delta: f64, draws: usize, seed: u64) -> Result<Self, QpsIvError> {
        let cfg = EstimatorConfig {
            delta,
            draws,
            seed,
            ..EstimatorConfig::default()
        };
        QpsIvEstimator::from_config(cfg)
    }

    /// Estimator object from a full configuration.
    pub fn from_config(cfg: EstimatorConfig) -> Result<Self, QpsIvError> {
        let estimator = QpsIvEstimator { cfg };
        estimator.validate_parameters()?;
        Ok(estimator)
    }

    pub fn validate_parameters(&self) -> Result<(), QpsIvError> {
        validate_positive_float_parameter(self.cfg.delta, "delta")?;
        validate_positive_count_parameter(self.cfg.draws, "draws")?;
        if let Some(num_threads) = self.cfg.num_threads {
            validate_positive_count_parameter(num_threads, "num_threads")?;
        }
        Ok(())
    }

    /// Quasi-propensity score of every individual.
    ///
    /// * `scorer` - The recommendation scoring function, evaluated on raw-scale covariates.
    /// * `covariates` - Covariates of every individual.
    pub fn compute_qps<S: Scorer + ?Sized>(&self, scorer: &S, covariates: &Covariates) -> Result<Vec<f64>, QpsIvError> {
        self.validate_parameters()?;
        let rows = covariates.resolve()?;
        self.qps_from_rows(scorer, &rows)
    }

    /// Estimate the causal effect of the treatment on the outcome.
    ///
    /// * `outcome` - Outcome of every individual.
    /// * `treatment` - Treatment of every individual (0 or 1).
    /// * `instrument` - Recommendation of every individual (0 or 1).
    /// * `scorer` - The recommendation scoring function, evaluated on raw-scale covariates.
    /// * `covariates` - Covariates of every individual.
    pub fn estimate<S: Scorer + ?Sized>(
        &self,
        outcome: &[f64],
        treatment: &[f64],
        instrument: &[f64],
        scorer: &S,
        covariates: &Covariates,
    ) -> Result<EstimationResult, QpsIvError> {
        let start = Instant::now();
        self.validate_parameters()?;

        let n = outcome.len();
        validate_length(treatment, n, "treatment")?;
        validate_length(instrument, n, "instrument")?;
        if covariates.rows() != n {
            return Err(QpsIvError::ShapeMismatch(format!(
                "covariates describe {} individuals but the outcome has {} entries",
                covariates.rows(),
                n
            )));
        }
        let rows = covariates.resolve()?;

        let qps = self.qps_from_rows(scorer, &rows)?;
        let retained = interior_indices(&qps)?;
        info!(
            "Retained {} of {} individuals with a quasi-propensity score in (0, 1).",
            retained.len(),
            n
        );

        let result = fit_2sls(outcome, treatment, instrument, &qps, &retained)?;
        info!(
            "Estimated treatment effect {:.4} (robust std. error {:.4}) in {:.2} seconds.",
            result.treatment_effect(),
            result.treatment_std_error(),
            start.elapsed().as_secs_f32()
        );
        Ok(result)
    }

    fn qps_from_rows<S: Scorer + ?Sized>(&self, scorer: &S, rows: &CovariateRows) -> Result<Vec<f64>, QpsIvError> {
        let (standardized, moments) = standardize_rows(&rows.continuous)?;
        let sampler = UniformBallSampler::new(self.cfg.delta, self.cfg.sampling)?;
        let qps = QpsEstimator::new(sampler, self.cfg.draws, &moments, scorer)?;

        let start = Instant::now();
        let scores = if self.cfg.parallel {
            let num_threads = match self.cfg.num_threads {
                Some(num_threads) => num_threads,
                None => std::thread::available_parallelism().map_or(1, |n| n.get()),
            };
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(num_threads)
                .build()
                .map_err(|e| {
                    QpsIvError::InvalidParameter("num_threads".to_string(), "a buildable thread pool".to_string(), e.to_string())
                })?;
            pool.install(|| qps.score_all(&standardized, &rows.discrete, self.cfg.seed, true))?
        } else {
            qps.score_all(&standardized, &rows.discrete, self.cfg.seed, false)?
        };
        debug!(
            "Computed {} quasi-propensity scores in {:.2} seconds.",
            scores.len(),
            start.elapsed().as_secs_f32()
        );
        Ok(scores)
    }
}

/// Estimate the causal effect with the default configuration and the given bandwidth and draws.
///
/// * `outcome` - Outcome of every individual.
/// * `treatment` - Treatment of every individual.
/// * `instrument` - Recommendation of every individual.
/// * `scorer` - The recommendation scoring function.
/// * `delta` - Radius of the ball around the standardized continuous covariates.
/// * `draws` - Number of Monte Carlo draws per individual.
/// * `covariates` - Covariates of every individual.
pub fn estimate<S: Scorer + ?Sized>(
    outcome: &[f64],
    treatment: &[f64],
    instrument: &[f64],
    scorer: &S,
    delta: f64,
    draws: usize,
    covariates: &Covariates,
) -> Result<EstimationResult, QpsIvError> {
    QpsIvEstimator::new(delta, draws, 0)?.estimate(outcome, treatment, instrument, scorer, covariates)
}
