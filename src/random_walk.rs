/*!
# Random-Walk Metropolis Sampler

Proposes `current + L z` where `L` is the lower Cholesky factor of a fixed
proposal covariance and `z` is standard normal, then applies the full
Metropolis-Hastings test including the forward and backward proposal
log-densities. For the fixed-covariance Gaussian walk those two terms cancel,
so acceptance depends only on the action difference; they are kept in the
ratio so the sampler stays correct for any proposal density supplied through
the same interface.

# Examples

```rust
use multilevel_mcmc::action::HarmonicOscillatorAction;
use multilevel_mcmc::core::Sampler;
use multilevel_mcmc::random_walk::RandomWalkSampler;
use nalgebra::{DMatrix, DVector};

let action = HarmonicOscillatorAction::new(8, 0.5, 1.0, 1.0);
let sigma = DMatrix::identity(8, 8) * 0.1;
let mut sampler = RandomWalkSampler::new(sigma, action).set_seed(42);

let current = DVector::zeros(8);
let next = sampler.perform_step(&current);  // None means rejected
assert!(next.map_or(true, |p| p.len() == 8));
```
*/

use crate::action::Action;
use crate::core::{Path, Sampler};
use nalgebra::linalg::Cholesky;
use nalgebra::{DMatrix, Dyn};
use rand::rngs::SmallRng;
use rand::{thread_rng, Rng, SeedableRng};
use rand_distr::StandardNormal;
use std::f64::consts::PI;

/// Random-walk Metropolis sampler with a fixed Gaussian proposal covariance.
#[derive(Clone)]
pub struct RandomWalkSampler<A: Action> {
    action: A,
    chol: Cholesky<f64, Dyn>,
    chol_l: DMatrix<f64>,
    log_det_sigma: f64,
    rng: SmallRng,
}

impl<A: Action> RandomWalkSampler<A> {
    /// Creates a sampler proposing steps with covariance `sigma`.
    ///
    /// Panics when `sigma` does not match the action's path length or is not
    /// symmetric positive definite.
    pub fn new(sigma: DMatrix<f64>, action: A) -> Self {
        assert_eq!(
            sigma.nrows(),
            action.path_length(),
            "proposal covariance does not match the action's path length"
        );
        let chol = Cholesky::new(sigma)
            .expect("proposal covariance must be symmetric positive definite");
        let chol_l = chol.l();
        let log_det_sigma = 2.0 * chol_l.diagonal().iter().map(|d| d.ln()).sum::<f64>();
        Self {
            action,
            chol,
            chol_l,
            log_det_sigma,
            rng: SmallRng::seed_from_u64(thread_rng().gen()),
        }
    }

    pub fn set_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    /// Log-density of the Gaussian proposal `Normal(mean, sigma)` at
    /// `eval_point`.
    fn log_density(&self, eval_point: &Path, mean: &Path) -> f64 {
        let k = mean.len() as f64;
        let diff = eval_point - mean;
        let quad = diff.dot(&self.chol.solve(&diff));
        -0.5 * (k * (2.0 * PI).ln() + self.log_det_sigma + quad)
    }

    fn generate_proposal(&mut self, current: &Path) -> Path {
        let mut z = Path::zeros(current.len());
        for zi in z.iter_mut() {
            *zi = self.rng.sample(StandardNormal);
        }
        current + &self.chol_l * z
    }
}

impl<A: Action> Sampler for RandomWalkSampler<A> {
    fn perform_step(&mut self, current: &Path) -> Option<Path> {
        let proposal = self.generate_proposal(current);

        let delta_s = self.action.evaluate(&proposal) - self.action.evaluate(current)
            + self.log_density(&proposal, current)
            - self.log_density(current, &proposal);

        if delta_s < 0.0 {
            return Some(proposal);
        }
        if self.rng.gen::<f64>() < (-delta_s).exp() {
            Some(proposal)
        } else {
            None
        }
    }
}
