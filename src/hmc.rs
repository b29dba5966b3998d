/*!
# Hamiltonian Monte Carlo Sampler

Gradient-based proposals for action-defined targets: a fresh momentum is
drawn from `Normal(0, I)` per step, the pair is integrated with the leapfrog
scheme, and the move is accepted with probability `min(1, exp(-delta_H))`
where `delta_H` is the change of the Hamiltonian `S(x) + |p|^2 / 2` over the
trajectory. The momentum is ephemeral and regenerated every proposal.

The integrator stepsize can be autotuned toward a target acceptance rate with
a bisection search, see [`HmcSampler::autotune_stepsize`].
*/

use crate::action::Action;
use crate::core::{Path, Sampler};
use rand::rngs::SmallRng;
use rand::{thread_rng, Rng, SeedableRng};
use rand_distr::StandardNormal;

/// Leapfrog steps per proposal trajectory.
const LEAPFROG_STEPS: usize = 100;

/// Hamiltonian Monte Carlo sampler for a lattice action.
#[derive(Clone)]
pub struct HmcSampler<A: Action> {
    stepsize: f64,
    action: A,
    rng: SmallRng,
}

impl<A: Action> HmcSampler<A> {
    pub fn new(stepsize: f64, action: A) -> Self {
        assert!(stepsize > 0.0, "stepsize must be positive");
        Self {
            stepsize,
            action,
            rng: SmallRng::seed_from_u64(thread_rng().gen()),
        }
    }

    pub fn set_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    /// The currently configured integrator stepsize.
    pub fn stepsize(&self) -> f64 {
        self.stepsize
    }

    /// Tunes the integrator stepsize toward `target_rate` acceptance by
    /// bisecting over `[0.1, 10]` times the configured stepsize.
    ///
    /// Runs a short burn-in from `initial_path`, then up to 100 repetitions
    /// of 1000-step batches, narrowing the bracket after each batch based on
    /// the empirical acceptance rate. Returns the tuned stepsize once the
    /// rate is within 1% of the target. If the budget is exhausted first,
    /// restores the previously configured stepsize and returns `None` so the
    /// caller can decide how to proceed.
    pub fn autotune_stepsize(&mut self, initial_path: &Path, target_rate: f64) -> Option<f64> {
        const N_SAMPLES: usize = 1000;
        const N_REPETITIONS: usize = 100;
        const N_BURNIN: usize = 100;
        const TOLERANCE: f64 = 1e-2;

        let initial_stepsize = self.stepsize;
        let mut stepsize_min = 0.1 * initial_stepsize;
        let mut stepsize_max = 10.0 * initial_stepsize;

        let mut current = initial_path.clone();
        for _ in 0..N_BURNIN {
            if let Some(proposal) = self.perform_step(&current) {
                current = proposal;
            }
        }

        for _ in 0..N_REPETITIONS {
            self.stepsize = 0.5 * (stepsize_min + stepsize_max);

            let mut accepted = 0;
            for _ in 0..N_SAMPLES {
                if let Some(proposal) = self.perform_step(&current) {
                    current = proposal;
                    accepted += 1;
                }
            }
            let acceptance_rate = accepted as f64 / N_SAMPLES as f64;

            if acceptance_rate > target_rate {
                stepsize_min = self.stepsize;
            } else {
                stepsize_max = self.stepsize;
            }

            if (acceptance_rate - target_rate).abs() < TOLERANCE {
                return Some(self.stepsize);
            }
        }

        self.stepsize = initial_stepsize;
        None
    }

    /// Integrates one leapfrog trajectory from `current` with a fresh
    /// momentum, returning the end point and the Hamiltonian change.
    fn generate_proposal(&mut self, current: &Path) -> (Path, f64) {
        let mut position = current.clone();
        let mut momentum = Path::zeros(current.len());
        for p in momentum.iter_mut() {
            *p = self.rng.sample(StandardNormal);
        }
        let initial_kinetic = 0.5 * momentum.norm_squared();

        // Symmetrized leapfrog: momentum half-steps at both trajectory ends,
        // no position update after the final momentum half-step.
        for k in 0..LEAPFROG_STEPS {
            let stepsize_momentum = if k == 0 || k == LEAPFROG_STEPS - 1 {
                0.5 * self.stepsize
            } else {
                self.stepsize
            };
            let stepsize_position = if k == LEAPFROG_STEPS - 1 {
                0.0
            } else {
                self.stepsize
            };

            let grad = self.action.grad_potential(&position);
            momentum.axpy(-stepsize_momentum, &grad, 1.0);
            position.axpy(stepsize_position, &momentum, 1.0);
        }

        let final_kinetic = 0.5 * momentum.norm_squared();
        let delta_s = self.action.evaluate(&position) - self.action.evaluate(current);
        let delta_h = delta_s + final_kinetic - initial_kinetic;
        (position, delta_h)
    }
}

impl<A: Action> Sampler for HmcSampler<A> {
    fn perform_step(&mut self, current: &Path) -> Option<Path> {
        let (proposal, delta_h) = self.generate_proposal(current);

        if delta_h < 0.0 {
            return Some(proposal);
        }
        if self.rng.gen::<f64>() < (-delta_h).exp() {
            Some(proposal)
        } else {
            None
        }
    }
}
