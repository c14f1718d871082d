//! Sampler
//!
//! Draws points uniformly (by volume) from a solid ball around a center, used to
//! perturb an individual's standardized continuous covariates.
use crate::errors::QpsIvError;
use crate::utils::validate_positive_float_parameter;
use rand::distributions::Open01;
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Normal, StandardNormal};
use serde::{Deserialize, Serialize};

/// Direction draws attempted per point before the sampler gives up.
const MAX_DIRECTION_DRAWS: usize = 64;

/// Scale `v` to unit length, computing the norm on `v / max|v_i|` so that
/// components near the floating point limits do not overflow or underflow.
/// Returns `false` when `v` has no direction (zero or non-finite).
fn normalize(v: &mut [f64]) -> bool {
    let scale = v.iter().fold(0.0_f64, |m, x| m.max(x.abs()));
    if !(scale > 0.0 && v.iter().all(|x| x.is_finite())) {
        return false;
    }
    let norm = v.iter().map(|x| (x / scale).powi(2)).sum::<f64>().sqrt();
    v.iter_mut().for_each(|x| *x = *x / scale / norm);
    true
}

/// How direction vectors are drawn before they are scaled onto the ball.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum BallSampling {
    /// Textbook method: `center + delta * U^(1/p) * z / |z|` with `z ~ N(0, I)`.
    /// Points are uniform over the ball of radius `delta` around the center.
    #[default]
    Uniform,
    /// Reference method: `z ~ N(center, delta^2 I)` is normalized and scaled by
    /// `U^(1/p)`, without re-centering. Points lie in the unit ball around the
    /// origin and directions lean towards the center.
    CenterShifted,
}

/// Sampler for points in a `p`-dimensional solid ball.
#[derive(Debug, Clone, Copy)]
pub struct UniformBallSampler {
    delta: f64,
    method: BallSampling,
}

impl UniformBallSampler {
    /// Create a new sampler.
    ///
    /// * `delta` - Radius of the ball (spread of the direction draws for `CenterShifted`).
    /// * `method` - Direction sampling method.
    pub fn new(delta: f64, method: BallSampling) -> Result<Self, QpsIvError> {
        validate_positive_float_parameter(delta, "delta")?;
        Ok(UniformBallSampler { delta, method })
    }

    pub fn delta(&self) -> f64 {
        self.delta
    }

    pub fn method(&self) -> BallSampling {
        self.method
    }

    /// Draw `draws` points around `center`, returned as `draws` rows of length `center.len()`.
    pub fn sample(&self, rng: &mut StdRng, center: &[f64], draws: usize) -> Result<Vec<Vec<f64>>, QpsIvError> {
        let p = center.len();
        if p == 0 {
            return Err(QpsIvError::NoContinuousCovariates);
        }
        let shifted = match self.method {
            BallSampling::Uniform => None,
            BallSampling::CenterShifted => Some(
                center
                    .iter()
                    .map(|c| Normal::new(*c, self.delta))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(|e| {
                        QpsIvError::InvalidParameter("center".to_string(), "finite values".to_string(), e.to_string())
                    })?,
            ),
        };
        let radial_power = 1.0 / p as f64;

        let mut points = Vec::with_capacity(draws);
        let mut direction = vec![0.0; p];
        for _ in 0..draws {
            // A zero or overflowing draw has no direction; redraw a bounded number of times.
            let mut attempts = 0;
            loop {
                match &shifted {
                    None => direction.iter_mut().for_each(|d| *d = rng.sample(StandardNormal)),
                    Some(normals) => direction
                        .iter_mut()
                        .zip(normals)
                        .for_each(|(d, n)| *d = rng.sample(n)),
                }
                if normalize(&mut direction) {
                    break;
                }
                attempts += 1;
                if attempts == MAX_DIRECTION_DRAWS {
                    return Err(QpsIvError::InvalidParameter(
                        "delta".to_string(),
                        "a spread whose normal draws stay finite".to_string(),
                        self.delta.to_string(),
                    ));
                }
            }
            let u: f64 = rng.sample(Open01);
            let radius = u.powf(radial_power);

            let point = match self.method {
                BallSampling::Uniform => center
                    .iter()
                    .zip(&direction)
                    .map(|(c, d)| c + self.delta * radius * d)
                    .collect(),
                BallSampling::CenterShifted => direction.iter().map(|d| radius * d).collect(),
            };
            points.push(point);
        }
        Ok(points)
    }
}
