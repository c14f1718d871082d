#[cfg(test)]
mod causal_tests {
    use crate::causal::filter::interior_indices;
    use crate::causal::iv::fit_2sls;
    use crate::data::{Covariates, Matrix};
    use crate::errors::QpsIvError;
    use crate::estimator::{estimate, QpsIvEstimator};
    use crate::sampler::BallSampling;
    use crate::scorer::Scorer;
    use nalgebra::{DMatrix, DVector};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use rand_distr::{Distribution, Normal};
    use std::sync::Mutex;

    /// Synthetic sample: recommendation Z, treatment D = 2 Z + v, outcome Y = 1 + 2.1 D + e.
    struct Sample {
        y: Vec<f64>,
        d: Vec<f64>,
        z: Vec<f64>,
        // column major, n x p_c and n x p_d
        xc: Vec<f64>,
        xd: Vec<f64>,
        n: usize,
        p_c: usize,
        p_d: usize,
    }

    fn simulate<F>(n: usize, p_c: usize, p_d: usize, seed: u64, recommend: F) -> Sample
    where
        F: Fn(&mut StdRng, &[f64]) -> f64,
    {
        let mut rng = StdRng::seed_from_u64(seed);
        let normal = Normal::new(0.0, 1.0).unwrap();
        let covariate = Normal::new(10.0, 5.0).unwrap();

        let xc: Vec<f64> = (0..n * p_c).map(|_| covariate.sample(&mut rng)).collect();
        let xd: Vec<f64> = (0..n * p_d).map(|_| rng.gen_range(0..20) as f64).collect();
        let mut z = Vec::with_capacity(n);
        for i in 0..n {
            let row: Vec<f64> = (0..p_c).map(|j| xc[j * n + i]).collect();
            z.push(recommend(&mut rng, &row));
        }
        let d: Vec<f64> = z.iter().map(|zi| 2.0 * zi + normal.sample(&mut rng)).collect();
        let y: Vec<f64> = d.iter().map(|di| 1.0 + 2.1 * di + normal.sample(&mut rng)).collect();
        Sample {
            y,
            d,
            z,
            xc,
            xd,
            n,
            p_c,
            p_d,
        }
    }

    fn coin(rng: &mut StdRng, _: &[f64]) -> f64 {
        if rng.gen::<bool>() {
            1.0
        } else {
            0.0
        }
    }

    /// Ignores the covariates and returns a fresh Uniform(0, 1) draw on every call.
    struct RandomScorer {
        rng: Mutex<StdRng>,
    }

    impl RandomScorer {
        fn new(seed: u64) -> Self {
            RandomScorer {
                rng: Mutex::new(StdRng::seed_from_u64(seed)),
            }
        }
    }

    impl Scorer for RandomScorer {
        fn score(&self, _continuous: &[f64], _discrete: &[f64]) -> Result<f64, QpsIvError> {
            Ok(self.rng.lock().unwrap().gen::<f64>())
        }
    }

    fn logistic(c: &[f64], d: &[f64]) -> f64 {
        let index = (c[0] - 10.0) / 5.0 - 0.5 * (c[1] - 10.0) / 5.0 + 0.01 * d.iter().sum::<f64>();
        1.0 / (1.0 + (-index).exp())
    }

    fn ols(x: &DMatrix<f64>, y: &DVector<f64>) -> DVector<f64> {
        let xt = x.transpose();
        (&xt * x).try_inverse().unwrap() * (&xt * y)
    }

    // -----------------------------------------------------------------------
    // Quasi-propensity scores
    // -----------------------------------------------------------------------

    #[test]
    fn test_constant_scorer_gives_constant_qps() {
        let s = simulate(30, 3, 2, 1, coin);
        let covariates = Covariates::split(Matrix::new(&s.xc, s.n, s.p_c), Matrix::new(&s.xd, s.n, s.p_d));
        for c in [0.0, 0.25, 0.7, 1.0] {
            let scorer = move |_: &[f64], _: &[f64]| c;
            let qps = QpsIvEstimator::default().compute_qps(&scorer, &covariates).unwrap();
            assert_eq!(qps.len(), 30);
            assert!(qps.iter().all(|q| (q - c).abs() < 1e-12), "c={} qps={:?}", c, qps);
        }
    }

    #[test]
    fn test_constant_zero_scorer_is_not_identified() {
        let s = simulate(30, 3, 2, 2, coin);
        let covariates = Covariates::split(Matrix::new(&s.xc, s.n, s.p_c), Matrix::new(&s.xd, s.n, s.p_d));
        let zero = |_: &[f64], _: &[f64]| 0.0;
        let res = estimate(&s.y, &s.d, &s.z, &zero, 2.0, 20, &covariates);
        assert_eq!(res, Err(QpsIvError::InsufficientIdentification(30)));

        let one = |_: &[f64], _: &[f64]| 1.0;
        let res = estimate(&s.y, &s.d, &s.z, &one, 2.0, 20, &covariates);
        assert_eq!(res, Err(QpsIvError::InsufficientIdentification(30)));
    }

    #[test]
    fn test_filter_matches_strict_interior() {
        let s = simulate(200, 2, 0, 3, |_, x| if x[0] > 10.0 { 1.0 } else { 0.0 });
        let covariates = Covariates::combined(Matrix::new(&s.xc, s.n, s.p_c), vec![0, 1]);
        let threshold = |c: &[f64], _: &[f64]| if c[0] > 10.0 { 1.0 } else { 0.0 };
        let qps = QpsIvEstimator::new(0.3, 30, 5)
            .unwrap()
            .compute_qps(&threshold, &covariates)
            .unwrap();
        let kept = interior_indices(&qps).unwrap();
        let expected: Vec<usize> = (0..qps.len()).filter(|&i| qps[i] > 0.0 && qps[i] < 1.0).collect();
        assert_eq!(kept, expected);
        // Both sides of the cutoff contain individuals far from it.
        assert!(kept.len() < qps.len());
        assert!(qps.iter().any(|q| *q == 0.0));
        assert!(qps.iter().any(|q| *q == 1.0));
    }

    #[test]
    fn test_scoring_fault_is_propagated() {
        let s = simulate(20, 2, 1, 4, coin);
        let covariates = Covariates::split(Matrix::new(&s.xc, s.n, s.p_c), Matrix::new(&s.xd, s.n, s.p_d));
        let bad = |_: &[f64], _: &[f64]| 1.2;
        let res = estimate(&s.y, &s.d, &s.z, &bad, 1.0, 5, &covariates);
        assert!(matches!(res, Err(QpsIvError::ScoringCapabilityFault(_))));
    }

    // -----------------------------------------------------------------------
    // IV-2SLS
    // -----------------------------------------------------------------------

    #[test]
    fn test_recovery_small_sample() {
        let s = simulate(100, 10, 10, 2020, coin);
        let covariates = Covariates::split(Matrix::new(&s.xc, s.n, s.p_c), Matrix::new(&s.xd, s.n, s.p_d));
        let scorer = RandomScorer::new(7);
        let est = QpsIvEstimator::new(2.0, 20, 11).unwrap().set_parallel(false);
        let res = est.estimate(&s.y, &s.d, &s.z, &scorer, &covariates).unwrap();

        assert_eq!(res.n_obs, 100);
        let se = res.treatment_std_error();
        assert!(se.is_finite() && se > 0.0);
        assert!(
            (res.treatment_effect() - 2.1).abs() < 4.0 * se,
            "beta={} se={}",
            res.treatment_effect(),
            se
        );
    }

    #[test]
    fn test_recovery_improves_with_sample_size() {
        let s = simulate(4000, 2, 1, 99, coin);
        let covariates = Covariates::split(Matrix::new(&s.xc, s.n, s.p_c), Matrix::new(&s.xd, s.n, s.p_d));
        let scorer = RandomScorer::new(3);
        let res = QpsIvEstimator::new(2.0, 20, 1)
            .unwrap()
            .set_parallel(false)
            .estimate(&s.y, &s.d, &s.z, &scorer, &covariates)
            .unwrap();
        let se = res.treatment_std_error();
        assert!(se < 0.1, "se={}", se);
        assert!((res.treatment_effect() - 2.1).abs() < 4.0 * se);
    }

    #[test]
    fn test_discontinuous_recommender() {
        // The recommendation is a hard threshold on the first covariate; only
        // individuals close to it have local variation in the recommendation.
        let threshold = |c: &[f64], _: &[f64]| if c[0] > 10.0 { 1.0 } else { 0.0 };
        let s = simulate(2000, 2, 1, 5, |_, x| if x[0] > 10.0 { 1.0 } else { 0.0 });
        let covariates = Covariates::split(Matrix::new(&s.xc, s.n, s.p_c), Matrix::new(&s.xd, s.n, s.p_d));
        let res = QpsIvEstimator::new(0.5, 50, 8)
            .unwrap()
            .estimate(&s.y, &s.d, &s.z, &threshold, &covariates)
            .unwrap();

        assert!(res.n_obs > 100 && res.n_obs < s.n, "n_obs={}", res.n_obs);
        assert!(res.qps.iter().all(|q| *q > 0.0 && *q < 1.0));
        let se = res.treatment_std_error();
        assert!((res.treatment_effect() - 2.1).abs() < 4.0 * se, "beta={} se={}", res.treatment_effect(), se);
    }

    #[test]
    fn test_matches_sequential_two_stage_regression() {
        // Independent cross-check: regress D on (1, Z, QPS), then Y on (1, D_hat, QPS),
        // with the robust covariance built from structural residuals.
        let s = simulate(300, 2, 1, 12, coin);
        let mut rng = StdRng::seed_from_u64(0);
        let qps: Vec<f64> = (0..s.n).map(|_| rng.gen_range(0.05..0.95)).collect();
        let kept: Vec<usize> = (0..s.n).collect();
        let res = fit_2sls(&s.y, &s.d, &s.z, &qps, &kept).unwrap();

        let w = DMatrix::from_fn(s.n, 3, |i, j| [1.0, s.z[i], qps[i]][j]);
        let d_hat = &w * ols(&w, &DVector::from_column_slice(&s.d));
        let x_hat = DMatrix::from_fn(s.n, 3, |i, j| [1.0, d_hat[i], qps[i]][j]);
        let beta = ols(&x_hat, &DVector::from_column_slice(&s.y));
        for k in 0..3 {
            assert!((beta[k] - res.coefficients[k]).abs() < 1e-8, "{:?} vs {:?}", beta, res.coefficients);
        }

        let e2 = DVector::from_fn(s.n, |i, _| (s.y[i] - beta[0] - beta[1] * s.d[i] - beta[2] * qps[i]).powi(2));
        let bread = (x_hat.transpose() * &x_hat).try_inverse().unwrap();
        let meat = x_hat.transpose() * DMatrix::from_diagonal(&e2) * &x_hat;
        let cov = &bread * meat * &bread;
        for i in 0..3 {
            for j in 0..3 {
                let scale = cov[(i, j)].abs().max(1e-6);
                assert!(
                    (cov[(i, j)] - res.covariance[i][j]).abs() < 1e-6 * scale,
                    "{} vs {:?}",
                    cov,
                    res.covariance
                );
            }
        }
    }

    // -----------------------------------------------------------------------
    // Covariate layouts, sampling and concurrency
    // -----------------------------------------------------------------------

    #[test]
    fn test_split_and_combined_inputs_agree() {
        let s = simulate(150, 4, 3, 21, coin);
        let split = Covariates::split(Matrix::new(&s.xc, s.n, s.p_c), Matrix::new(&s.xd, s.n, s.p_d));

        // Column-major concatenation puts the continuous columns first.
        let mut x = s.xc.clone();
        x.extend_from_slice(&s.xd);
        let combined = Covariates::combined(Matrix::new(&x, s.n, s.p_c + s.p_d), (0..s.p_c).collect());

        let est = QpsIvEstimator::new(1.5, 20, 42).unwrap();
        let a = est.estimate(&s.y, &s.d, &s.z, &logistic, &split).unwrap();
        let b = est.estimate(&s.y, &s.d, &s.z, &logistic, &combined).unwrap();
        assert_eq!(a.n_obs, b.n_obs);
        for k in 0..3 {
            assert!((a.coefficients[k] - b.coefficients[k]).abs() < 1e-10);
            for j in 0..3 {
                assert!((a.covariance[k][j] - b.covariance[k][j]).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_results_do_not_depend_on_threads() {
        let s = simulate(120, 2, 2, 33, coin);
        let covariates = Covariates::split(Matrix::new(&s.xc, s.n, s.p_c), Matrix::new(&s.xd, s.n, s.p_d));
        let base = QpsIvEstimator::new(1.0, 15, 6).unwrap();
        let sequential = base
            .clone()
            .set_parallel(false)
            .estimate(&s.y, &s.d, &s.z, &logistic, &covariates)
            .unwrap();
        for threads in [1, 3] {
            let parallel = base
                .clone()
                .set_num_threads(Some(threads))
                .estimate(&s.y, &s.d, &s.z, &logistic, &covariates)
                .unwrap();
            assert_eq!(parallel, sequential);
        }
    }

    #[test]
    fn test_seed_changes_qps() {
        let s = simulate(50, 2, 0, 8, coin);
        let covariates = Covariates::combined(Matrix::new(&s.xc, s.n, s.p_c), vec![0, 1]);
        let a = QpsIvEstimator::new(1.0, 10, 1).unwrap().compute_qps(&logistic, &covariates).unwrap();
        let b = QpsIvEstimator::new(1.0, 10, 1).unwrap().compute_qps(&logistic, &covariates).unwrap();
        let c = QpsIvEstimator::new(1.0, 10, 2).unwrap().compute_qps(&logistic, &covariates).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_center_shifted_sampling_runs() {
        let s = simulate(200, 3, 1, 17, coin);
        let covariates = Covariates::split(Matrix::new(&s.xc, s.n, s.p_c), Matrix::new(&s.xd, s.n, s.p_d));
        let res = QpsIvEstimator::new(2.0, 20, 3)
            .unwrap()
            .set_sampling(BallSampling::CenterShifted)
            .estimate(&s.y, &s.d, &s.z, &logistic, &covariates)
            .unwrap();
        assert_eq!(res.n_obs, 200);
        assert!(res.coefficients.iter().all(|b| b.is_finite()));
    }
}
