use multilevel_mcmc::action::{Action, HarmonicOscillatorAction};
use multilevel_mcmc::core::{mean_square_displacement, Mcmc};
use multilevel_mcmc::hmc::HmcSampler;
use multilevel_mcmc::stats::DEFAULT_AUTOCORR_WINDOW;
use multilevel_mcmc::two_level::TwoLevelSampler;
use nalgebra::DVector;

fn main() {
    // Fine lattice with T = 4 at spacing 0.25; HMC drives the coarse level.
    let action = HarmonicOscillatorAction::new(16, 0.25, 1.0, 1.0);
    let coarse_action = action.make_coarsened_action();

    let mut coarse_sampler = HmcSampler::new(0.1, coarse_action).set_seed(1);
    match coarse_sampler.autotune_stepsize(&DVector::zeros(8), 0.8) {
        Some(stepsize) => println!("Tuned HMC sampler with stepsize {stepsize:.4}"),
        None => println!("Failed to tune HMC sampler, keeping the configured stepsize"),
    }

    let sampler = TwoLevelSampler::new(action, coarse_sampler).set_seed(2);
    let mut mcmc = Mcmc::new(sampler, mean_square_displacement);
    let result = mcmc.run_progress(1_000, 10_000, DVector::zeros(16));

    println!("Result          = {:.6} ± {:.6}", result.mean(), result.mean_error());
    println!("Analytic        = {:.6}", action.analytic_solution());
    println!("Acceptance rate = {:.3}", result.acceptance_rate());
    println!(
        "Autocorr. time  = {:.2}",
        result.integrated_autocorrelation_time(DEFAULT_AUTOCORR_WINDOW)
    );
}
