use multilevel_mcmc::action::HarmonicOscillatorAction;
use multilevel_mcmc::core::{mean_square_displacement, Mcmc};
use multilevel_mcmc::multilevel::MultilevelSampler;
use multilevel_mcmc::random_walk::RandomWalkSampler;
use nalgebra::{DMatrix, DVector};

fn main() {
    // Three-level hierarchy: 8 -> 16 -> 32 sites, T = 8. The run stops
    // adaptively once the mean error estimate drops below the target.
    let coarsest_action = HarmonicOscillatorAction::new(8, 1.0, 1.0, 1.0);
    let coarse_sampler =
        RandomWalkSampler::new(DMatrix::identity(8, 8) * 0.1, coarsest_action).set_seed(7);

    let sampler = MultilevelSampler::new(3, coarsest_action, coarse_sampler).set_seed(8);
    let fine_action = *sampler.action(2);

    let mut mcmc = Mcmc::new(sampler, mean_square_displacement);
    let result = mcmc.run_adaptive(1_000, DVector::zeros(32), 0.01, 500_000);

    println!("Result          = {:.6} ± {:.6}", result.mean(), result.mean_error());
    println!("Analytic        = {:.6}", fine_action.analytic_solution());
    println!("Samples         = {}", result.num_samples());
    println!("Acceptance rate = {:.3}", result.acceptance_rate());
}
