//! End-to-end checks of the two-level and multilevel delayed-acceptance
//! samplers on the discretized harmonic oscillator.

use multilevel_mcmc::action::{Action, HarmonicOscillatorAction};
use multilevel_mcmc::core::{mean_square_displacement, Mcmc};
use multilevel_mcmc::hmc::HmcSampler;
use multilevel_mcmc::multilevel::MultilevelSampler;
use multilevel_mcmc::random_walk::RandomWalkSampler;
use multilevel_mcmc::two_level::TwoLevelSampler;
use nalgebra::{DMatrix, DVector};

#[cfg(test)]
mod tests {
    use super::*;

    /// Two-level sampling with an HMC-driven coarse level must reproduce the
    /// fine-level analytic `<x^2>`.
    #[test]
    fn two_level_with_hmc_coarse_level_converges() {
        const N: usize = 8;

        let action = HarmonicOscillatorAction::new(N, 0.5, 1.0, 1.0);
        let coarse_sampler = HmcSampler::new(0.1, action.make_coarsened_action()).set_seed(31);
        let sampler = TwoLevelSampler::new(action, coarse_sampler).set_seed(32);

        let mut mcmc = Mcmc::new(sampler, mean_square_displacement);
        let result = mcmc.run(1_000, 20_000, DVector::zeros(N));

        let analytic = action.analytic_solution();
        let relative_error = (result.mean() - analytic).abs() / analytic;
        assert!(
            relative_error < 0.08,
            "mean {} deviates from analytic {} by {:.1}%",
            result.mean(),
            analytic,
            100.0 * relative_error
        );
        assert!(result.acceptance_rate() > 0.05, "chain barely moves");
    }

    /// Two-level sampling with a random-walk coarse level agrees with the
    /// HMC-driven variant; the composition must not depend on which plain
    /// sampler drives the coarse lattice.
    #[test]
    fn two_level_is_agnostic_to_the_coarse_sampler() {
        const N: usize = 8;

        let action = HarmonicOscillatorAction::new(N, 0.5, 1.0, 1.0);
        let coarse_action = action.make_coarsened_action();
        let coarse_sampler =
            RandomWalkSampler::new(DMatrix::identity(N / 2, N / 2) * 0.15, coarse_action)
                .set_seed(41);
        let sampler = TwoLevelSampler::new(action, coarse_sampler).set_seed(42);

        let mut mcmc = Mcmc::new(sampler, mean_square_displacement);
        let result = mcmc.run(1_000, 20_000, DVector::zeros(N));

        let analytic = action.analytic_solution();
        let relative_error = (result.mean() - analytic).abs() / analytic;
        assert!(
            relative_error < 0.08,
            "mean {} deviates from analytic {} by {:.1}%",
            result.mean(),
            analytic,
            100.0 * relative_error
        );
    }

    /// A three-level hierarchy must converge on its finest lattice.
    #[test]
    fn three_level_hierarchy_converges_on_the_finest_lattice() {
        let coarsest_action = HarmonicOscillatorAction::new(4, 1.0, 1.0, 1.0);
        let coarse_sampler =
            RandomWalkSampler::new(DMatrix::identity(4, 4) * 0.2, coarsest_action).set_seed(51);
        let sampler = MultilevelSampler::new(3, coarsest_action, coarse_sampler).set_seed(52);
        let fine_action = *sampler.action(2);

        let mut mcmc = Mcmc::new(sampler, mean_square_displacement);
        let result = mcmc.run(2_000, 40_000, DVector::zeros(16));

        let analytic = fine_action.analytic_solution();
        let relative_error = (result.mean() - analytic).abs() / analytic;
        assert!(
            relative_error < 0.1,
            "mean {} deviates from analytic {} by {:.1}%",
            result.mean(),
            analytic,
            100.0 * relative_error
        );
    }
}
