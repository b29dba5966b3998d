/*!
# Sampler Trait and MCMC Drivers

The building blocks every algorithm in this crate composes around:

- [`Path`], the state type, a dynamically sized real vector on a periodic
  lattice.
- [`Sampler`], the single-step contract `perform_step(current) -> Option<Path>`.
  `None` means the proposal was rejected and the caller keeps its current
  state; rejection is a normal outcome, not a fault.
- [`partition_odd_even`]/[`combine_odd_even`], the even/odd lattice split used
  by the multilevel samplers.
- [`Mcmc`], the driver running burn-in followed by a fixed-length or adaptive
  sampling loop, recording a scalar quantity of interest per step.
- [`run_ensemble`], running independent chains in parallel.

# Examples

```rust
use multilevel_mcmc::action::HarmonicOscillatorAction;
use multilevel_mcmc::core::{mean_square_displacement, Mcmc};
use multilevel_mcmc::random_walk::RandomWalkSampler;
use nalgebra::{DMatrix, DVector};

let action = HarmonicOscillatorAction::new(8, 0.5, 1.0, 1.0);
let sigma = DMatrix::identity(8, 8) * 0.1;
let sampler = RandomWalkSampler::new(sigma, action).set_seed(42);

let mut mcmc = Mcmc::new(sampler, mean_square_displacement);
let result = mcmc.run(100, 500, DVector::zeros(8));
assert_eq!(result.num_samples(), 500);
```
*/

use crate::stats::McmcResult;
use indicatif::{ProgressBar, ProgressStyle};
use nalgebra::DVector;
use rayon::prelude::*;
use std::collections::VecDeque;

/// State of a chain: a discretized periodic trajectory.
pub type Path = DVector<f64>;

/// Number of steps between convergence checks of the adaptive loop.
const ADAPT_CHECK_INTERVAL: usize = 100;

/// A single-step MCMC proposal sampler.
pub trait Sampler {
    /// Performs one Metropolis-Hastings step from `current`.
    ///
    /// Returns `Some(next)` if the proposal was accepted and `None` if it was
    /// rejected, in which case the caller keeps `current`.
    fn perform_step(&mut self, current: &Path) -> Option<Path>;
}

/// Splits a path into its odd- and even-indexed subsequences.
///
/// The even sites form the next-coarser lattice, the odd sites the residual
/// fine detail. Panics when called on an odd-length path.
///
/// ```rust
/// use multilevel_mcmc::core::{combine_odd_even, partition_odd_even, Path};
///
/// let path = Path::from_vec(vec![0.0, 1.0, 2.0, 3.0]);
/// let (odd, even) = partition_odd_even(&path);
/// assert_eq!(odd.as_slice(), &[1.0, 3.0]);
/// assert_eq!(even.as_slice(), &[0.0, 2.0]);
/// assert_eq!(combine_odd_even(&odd, &even), path);
/// ```
pub fn partition_odd_even(path: &Path) -> (Path, Path) {
    assert!(
        path.len() % 2 == 0,
        "cannot partition a path with an odd number of sites"
    );
    let half = path.len() / 2;
    let mut odd = Path::zeros(half);
    let mut even = Path::zeros(half);
    for i in 0..half {
        even[i] = path[2 * i];
        odd[i] = path[2 * i + 1];
    }
    (odd, even)
}

/// Interleaves odd and even subsequences back into a full path.
/// Inverse of [`partition_odd_even`].
pub fn combine_odd_even(odd: &Path, even: &Path) -> Path {
    assert_eq!(odd.len(), even.len(), "odd/even partitions differ in length");
    let mut path = Path::zeros(2 * even.len());
    for i in 0..even.len() {
        path[2 * i] = even[i];
        path[2 * i + 1] = odd[i];
    }
    path
}

/// Mean squared displacement `mean(path^2)`, the standard quantity of
/// interest for the harmonic oscillator.
pub fn mean_square_displacement(path: &Path) -> f64 {
    path.iter().map(|x| x * x).sum::<f64>() / path.len() as f64
}

/// MCMC driver: burn-in followed by a sampling loop that records a scalar
/// quantity of interest and the per-step acceptance flag.
///
/// The quantity of interest is any pure function `Path -> f64`; it has no
/// access to sampler internals.
pub struct Mcmc<S, F> {
    sampler: S,
    qoi: F,
    convergence_epsilon: f64,
}

impl<S, F> Mcmc<S, F>
where
    S: Sampler,
    F: Fn(&Path) -> f64,
{
    pub fn new(sampler: S, qoi: F) -> Self {
        Self {
            sampler,
            qoi,
            convergence_epsilon: 1e-12,
        }
    }

    /// Sets the variance threshold below which the adaptive loop treats the
    /// chain as converged instead of dividing by a vanishing error estimate.
    pub fn set_convergence_epsilon(mut self, epsilon: f64) -> Self {
        assert!(epsilon > 0.0, "convergence epsilon must be positive");
        self.convergence_epsilon = epsilon;
        self
    }

    /// Runs `n_burnin` discarded steps followed by `n_samples` recorded ones.
    pub fn run(&mut self, n_burnin: usize, n_samples: usize, initial: Path) -> McmcResult {
        let mut current = self.burn_in(n_burnin, initial);
        let mut result = McmcResult::with_capacity(n_samples);
        for _ in 0..n_samples {
            let accepted = self.advance(&mut current);
            result.add_sample((self.qoi)(&current), accepted);
        }
        result
    }

    /// Like [`Mcmc::run`], but renders a progress bar with a sliding-window
    /// estimate of the acceptance rate.
    pub fn run_progress(
        &mut self,
        n_burnin: usize,
        n_samples: usize,
        initial: Path,
    ) -> McmcResult {
        let mut current = self.burn_in(n_burnin, initial);
        let mut result = McmcResult::with_capacity(n_samples);

        let pb = ProgressBar::new(n_samples as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{prefix:8} {bar:40.white} ETA {eta:3} | {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );
        pb.set_prefix("MCMC");

        let window_size = 100;
        let mut accept_window: VecDeque<bool> = VecDeque::with_capacity(window_size);

        for _ in 0..n_samples {
            let accepted = self.advance(&mut current);
            result.add_sample((self.qoi)(&current), accepted);

            accept_window.push_front(accepted);
            if accept_window.len() > window_size {
                accept_window.pop_back();
            }
            let rate = accept_window.iter().filter(|&&a| a).count() as f64
                / accept_window.len() as f64;
            pb.set_message(format!("p(accept)≈{rate:.2}"));
            pb.inc(1);
        }
        pb.finish();
        result
    }

    /// Runs `n_burnin` discarded steps, then samples in blocks of 100 steps
    /// until the estimated number of samples needed to reach `target_error`
    /// has been collected, or until `max_steps` recorded steps as a bounded
    /// iteration cutoff.
    ///
    /// The required sample count is re-estimated after every block from the
    /// current variance and integrated autocorrelation time. A variance below
    /// the configured epsilon counts as converged.
    pub fn run_adaptive(
        &mut self,
        n_burnin: usize,
        initial: Path,
        target_error: f64,
        max_steps: usize,
    ) -> McmcResult {
        assert!(target_error > 0.0, "target error must be positive");
        let mut current = self.burn_in(n_burnin, initial);
        let mut result = McmcResult::new();

        loop {
            for _ in 0..ADAPT_CHECK_INTERVAL {
                let accepted = self.advance(&mut current);
                result.add_sample((self.qoi)(&current), accepted);
            }
            if result.num_samples() >= max_steps {
                break;
            }
            if result.variance() < self.convergence_epsilon {
                break;
            }
            if result.num_samples() >= result.required_samples(target_error) {
                break;
            }
        }
        result
    }

    fn burn_in(&mut self, n_burnin: usize, initial: Path) -> Path {
        let mut current = initial;
        for _ in 0..n_burnin {
            self.advance(&mut current);
        }
        current
    }

    fn advance(&mut self, current: &mut Path) -> bool {
        match self.sampler.perform_step(current) {
            Some(proposal) => {
                *current = proposal;
                true
            }
            None => false,
        }
    }
}

/// Runs one independent chain per sampler in parallel, each starting from
/// `initial`.
///
/// Every sampler owns its random source, so chains share no mutable state;
/// seed them distinctly before calling for reproducible, decorrelated runs.
pub fn run_ensemble<S, F>(
    samplers: Vec<S>,
    qoi: F,
    n_burnin: usize,
    n_samples: usize,
    initial: &Path,
) -> Vec<McmcResult>
where
    S: Sampler + Send,
    F: Fn(&Path) -> f64 + Sync,
{
    samplers
        .into_par_iter()
        .map(|sampler| Mcmc::new(sampler, &qoi).run(n_burnin, n_samples, initial.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::HarmonicOscillatorAction;
    use crate::random_walk::RandomWalkSampler;
    use approx::assert_abs_diff_eq;
    use nalgebra::DMatrix;

    fn test_sampler(seed: u64) -> RandomWalkSampler<HarmonicOscillatorAction> {
        let action = HarmonicOscillatorAction::new(8, 0.5, 1.0, 1.0);
        let sigma = DMatrix::identity(8, 8) * 0.1;
        RandomWalkSampler::new(sigma, action).set_seed(seed)
    }

    #[test]
    fn partition_and_combine_round_trip() {
        let path = Path::from_vec(vec![0.5, -1.0, 2.0, 0.25, -0.75, 3.0]);
        let (odd, even) = partition_odd_even(&path);
        assert_eq!(even.as_slice(), &[0.5, 2.0, -0.75]);
        assert_eq!(odd.as_slice(), &[-1.0, 0.25, 3.0]);
        assert_eq!(combine_odd_even(&odd, &even), path);
    }

    #[test]
    #[should_panic(expected = "odd number of sites")]
    fn partitioning_odd_length_path_panics() {
        partition_odd_even(&Path::from_vec(vec![1.0, 2.0, 3.0]));
    }

    #[test]
    fn mean_square_displacement_averages_squares() {
        let path = Path::from_vec(vec![1.0, -2.0, 2.0]);
        assert_abs_diff_eq!(mean_square_displacement(&path), 3.0, epsilon = 1e-15);
    }

    #[test]
    fn fixed_run_records_requested_samples() {
        let mut mcmc = Mcmc::new(test_sampler(3), mean_square_displacement);
        let result = mcmc.run(200, 1_000, Path::zeros(8));
        assert_eq!(result.num_samples(), 1_000);
        let rate = result.acceptance_rate();
        assert!(rate > 0.0 && rate < 1.0, "acceptance rate {rate} degenerate");
    }

    #[test]
    fn adaptive_run_respects_step_ceiling() {
        // An unreachable target error must stop at the ceiling.
        let mut mcmc = Mcmc::new(test_sampler(4), mean_square_displacement);
        let result = mcmc.run_adaptive(100, Path::zeros(8), 1e-9, 2_000);
        assert_eq!(result.num_samples(), 2_000);
    }

    #[test]
    fn adaptive_run_stops_once_target_error_is_reached() {
        let mut mcmc = Mcmc::new(test_sampler(5), mean_square_displacement);
        let result = mcmc.run_adaptive(500, Path::zeros(8), 0.05, 200_000);
        assert!(result.num_samples() < 200_000);
        assert!(result.mean_error() < 0.1);
    }

    #[test]
    fn adaptive_run_treats_degenerate_variance_as_converged() {
        // A constant quantity of interest has zero variance; the loop must
        // stop after the first block instead of dividing by zero.
        let mut mcmc = Mcmc::new(test_sampler(6), |_: &Path| 1.0);
        let result = mcmc.run_adaptive(10, Path::zeros(8), 1e-3, 100_000);
        assert_eq!(result.num_samples(), 100);
        assert_abs_diff_eq!(result.mean(), 1.0, epsilon = 1e-15);
    }

    #[test]
    fn ensemble_chains_are_independent() {
        let samplers = vec![test_sampler(10), test_sampler(11)];
        let results = run_ensemble(samplers, mean_square_displacement, 100, 500, &Path::zeros(8));
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].num_samples(), 500);
        // Distinct seeds must give distinct sample sequences.
        assert_ne!(results[0].samples, results[1].samples);
    }
}
