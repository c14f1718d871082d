use crate::estimator::core::QpsIvEstimator;
use crate::sampler::BallSampling;

impl QpsIvEstimator {
    // Set methods for parameters

    /// Set the ball radius on the estimator.
    /// * `delta` - Radius of the ball around the standardized continuous covariates.
    pub fn set_delta(mut self, delta: f64) -> Self {
        self.cfg.delta = delta;
        self
    }

    /// Set the number of draws on the estimator.
    /// * `draws` - Monte Carlo draws per individual. More draws reduce the
    ///   simulation noise of each quasi-propensity score at a linear cost in
    ///   scoring function calls.
    pub fn set_draws(mut self, draws: usize) -> Self {
        self.cfg.draws = draws;
        self
    }

    /// Set the seed on the estimator.
    /// * `seed` - Seed of the random source for the ball draws.
    pub fn set_seed(mut self, seed: u64) -> Self {
        self.cfg.seed = seed;
        self
    }

    /// Set the number of threads on the estimator.
    /// * `num_threads` - Set the number of threads to be used for the quasi-propensity scores.
    pub fn set_num_threads(mut self, num_threads: Option<usize>) -> Self {
        self.cfg.num_threads = num_threads;
        self
    }

    /// Set parallel on the estimator.
    /// * `parallel` - Score individuals concurrently.
    pub fn set_parallel(mut self, parallel: bool) -> Self {
        self.cfg.parallel = parallel;
        self
    }

    /// Set the sampling method on the estimator.
    /// * `sampling` - Direction sampling method of the ball sampler.
    pub fn set_sampling(mut self, sampling: BallSampling) -> Self {
        self.cfg.sampling = sampling;
        self
    }
}
