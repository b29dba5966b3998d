/*!
# Two-Level Delayed-Acceptance Sampler

Composes a coarse-level sampler with the analytic odd-even conditional into a
single fine-level Metropolis-Hastings step:

1. Partition the current fine path into even (coarse) and odd sites.
2. Ask the coarse sampler for a step on the even sites. A coarse rejection
   rejects the whole step before any fine-level work is done.
3. Fill in new odd sites from the conditional given the accepted coarse
   proposal and recombine into a fine proposal.
4. Accept or reject with the telescoped action difference

```text
delta_S =  [S_f(proposal) - S_f(current)]
         + [log q(odd' | even') - log q(odd | even)]
         + [S_c(current_even) - S_c(proposal_even)]
```

which equals the exact fine-level Metropolis-Hastings log-ratio while only
requiring local evaluations at each level.
*/

use crate::action::Action;
use crate::core::{combine_odd_even, partition_odd_even, Path, Sampler};
use crate::distributions::GaussianEvenOddConditional;
use rand::rngs::SmallRng;
use rand::{thread_rng, Rng, SeedableRng};

/// Two-level delayed-acceptance sampler over a fine action and a coarse
/// single-step sampler.
#[derive(Clone)]
pub struct TwoLevelSampler<A: Action, S: Sampler> {
    action: A,
    coarse_action: A,
    coarse_sampler: S,
    conditional: GaussianEvenOddConditional<A>,
    rng: SmallRng,
}

impl<A: Action, S: Sampler> TwoLevelSampler<A, S> {
    /// Creates a two-level sampler for `action`; `coarse_sampler` must
    /// operate on the coarsened lattice (half the sites).
    pub fn new(action: A, coarse_sampler: S) -> Self {
        let coarse_action = action.make_coarsened_action();
        let conditional = GaussianEvenOddConditional::new(action.clone());
        Self {
            action,
            coarse_action,
            coarse_sampler,
            conditional,
            rng: SmallRng::seed_from_u64(thread_rng().gen()),
        }
    }

    /// Seeds the accept/reject stream and, with a derived seed, the odd-even
    /// conditional. The coarse sampler keeps its own seed; set it before
    /// composing.
    pub fn set_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self.conditional = self.conditional.set_seed(seed + 1);
        self
    }

    /// Telescoped acceptance log-ratio for moving from `current` (even part
    /// `current_even`) to `proposal` (even part `proposal_even`).
    fn delta_s(
        &self,
        current: &Path,
        current_even: &Path,
        proposal: &Path,
        proposal_even: &Path,
    ) -> f64 {
        let fine_action_diff = self.action.evaluate(proposal) - self.action.evaluate(current);
        let conditional_diff =
            self.conditional.log_density(proposal) - self.conditional.log_density(current);
        let coarse_action_diff = self.coarse_action.evaluate(current_even)
            - self.coarse_action.evaluate(proposal_even);
        fine_action_diff + conditional_diff + coarse_action_diff
    }
}

impl<A: Action, S: Sampler> Sampler for TwoLevelSampler<A, S> {
    fn perform_step(&mut self, current: &Path) -> Option<Path> {
        assert_eq!(
            current.len(),
            self.action.path_length(),
            "path length does not match the fine action"
        );

        let (_, current_even) = partition_odd_even(current);
        let coarse_proposal = self.coarse_sampler.perform_step(&current_even)?;

        let odd = self.conditional.sample(&coarse_proposal);
        let fine_proposal = combine_odd_even(&odd, &coarse_proposal);

        let delta_s = self.delta_s(current, &current_even, &fine_proposal, &coarse_proposal);

        if delta_s < 0.0 {
            return Some(fine_proposal);
        }
        if self.rng.gen::<f64>() < (-delta_s).exp() {
            Some(fine_proposal)
        } else {
            None
        }
    }
}
