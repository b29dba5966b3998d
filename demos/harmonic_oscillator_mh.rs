use multilevel_mcmc::action::HarmonicOscillatorAction;
use multilevel_mcmc::core::{mean_square_displacement, Mcmc};
use multilevel_mcmc::random_walk::RandomWalkSampler;
use multilevel_mcmc::stats::DEFAULT_AUTOCORR_WINDOW;
use nalgebra::{DMatrix, DVector};

fn main() {
    // Discretized harmonic oscillator with T = 4 at spacing 0.5.
    let action = HarmonicOscillatorAction::new(8, 0.5, 1.0, 1.0);

    let sigma = DMatrix::identity(8, 8) * 0.1;
    let sampler = RandomWalkSampler::new(sigma, action).set_seed(42);

    let mut mcmc = Mcmc::new(sampler, mean_square_displacement);
    let result = mcmc.run(1_000, 20_000, DVector::zeros(8));

    println!("Result          = {:.6} ± {:.6}", result.mean(), result.mean_error());
    println!("Analytic        = {:.6}", action.analytic_solution());
    println!("Acceptance rate = {:.3}", result.acceptance_rate());
    println!(
        "Autocorr. time  = {:.2}",
        result.integrated_autocorrelation_time(DEFAULT_AUTOCORR_WINDOW)
    );
}
