/*!
# Multilevel Delayed-Acceptance Sampler

Generalizes the two-level composition to an arbitrary hierarchy of lattice
resolutions. A chain step proceeds coarsest-first:

1. Restrict the current fine path level by level, keeping the even sites at
   each restriction.
2. Perform one step of the plain sampler on the coarsest lattice. A rejection
   there rejects the whole chain step.
3. For each finer level, fill in odd sites from the odd-even conditional of
   that level, recombine, and apply the same telescoped accept/reject test as
   the two-level sampler. Any rejection rejects the whole chain step, so no
   finer level does wasted work.

The coarse term of each level's telescoped ratio is evaluated at the even
sublattices of the current and proposed paths of that level.
*/

use crate::action::Action;
use crate::core::{combine_odd_even, partition_odd_even, Path, Sampler};
use crate::distributions::GaussianEvenOddConditional;
use rand::rngs::SmallRng;
use rand::{thread_rng, Rng, SeedableRng};

/// Delayed-acceptance sampler over a hierarchy of coarsened actions, driven
/// by a plain sampler on the coarsest level.
#[derive(Clone)]
pub struct MultilevelSampler<A: Action, S: Sampler> {
    /// Actions from coarsest to finest; `actions[l + 1]` refines `actions[l]`.
    actions: Vec<A>,
    /// `conditionals[l]` fills in the odd sites of level `l + 1`.
    conditionals: Vec<GaussianEvenOddConditional<A>>,
    coarse_sampler: S,
    rng: SmallRng,
}

impl<A: Action, S: Sampler> MultilevelSampler<A, S> {
    /// Builds a hierarchy of `levels` actions by refining `coarsest_action`;
    /// `coarse_sampler` must operate on the coarsest lattice.
    pub fn new(levels: usize, coarsest_action: A, coarse_sampler: S) -> Self {
        assert!(levels >= 2, "a multilevel sampler needs at least two levels");

        let mut actions = vec![coarsest_action];
        for level in 1..levels {
            actions.push(actions[level - 1].make_finer_action());
        }
        let conditionals = actions[1..]
            .iter()
            .map(|action| GaussianEvenOddConditional::new(action.clone()))
            .collect();

        Self {
            actions,
            conditionals,
            coarse_sampler,
            rng: SmallRng::seed_from_u64(thread_rng().gen()),
        }
    }

    /// Seeds the accept/reject stream and, with derived seeds, the per-level
    /// conditionals. The coarse sampler keeps its own seed; set it before
    /// composing.
    pub fn set_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self.conditionals = self
            .conditionals
            .into_iter()
            .enumerate()
            .map(|(l, conditional)| conditional.set_seed(seed + 1 + l as u64))
            .collect();
        self
    }

    pub fn finest_path_length(&self) -> usize {
        self.actions[self.actions.len() - 1].path_length()
    }

    /// The action at `level`, 0 being the coarsest.
    pub fn action(&self, level: usize) -> &A {
        &self.actions[level]
    }

    /// Telescoped acceptance log-ratio at the refinement from `level` to
    /// `level + 1`; `current` and `proposal` live on level `level + 1`,
    /// `proposal_even` is the coarse proposal accepted on `level`.
    fn delta_s(
        &self,
        level: usize,
        current: &Path,
        proposal: &Path,
        proposal_even: &Path,
    ) -> f64 {
        let (_, current_even) = partition_odd_even(current);

        let fine_action_diff =
            self.actions[level + 1].evaluate(proposal) - self.actions[level + 1].evaluate(current);
        let conditional_diff = self.conditionals[level].log_density(proposal)
            - self.conditionals[level].log_density(current);
        let coarse_action_diff = self.actions[level].evaluate(&current_even)
            - self.actions[level].evaluate(proposal_even);

        fine_action_diff + conditional_diff + coarse_action_diff
    }
}

impl<A: Action, S: Sampler> Sampler for MultilevelSampler<A, S> {
    fn perform_step(&mut self, current: &Path) -> Option<Path> {
        let levels = self.actions.len();
        assert_eq!(
            current.len(),
            self.finest_path_length(),
            "path length does not match the finest action"
        );

        // Restrict down the hierarchy; after the reversal index l holds the
        // current path on level l.
        let mut current_on_level = vec![current.clone()];
        for _ in 0..levels - 1 {
            let (_, even) = partition_odd_even(current_on_level.last().unwrap());
            current_on_level.push(even);
        }
        current_on_level.reverse();

        let mut proposal = self.coarse_sampler.perform_step(&current_on_level[0])?;

        for level in 0..levels - 1 {
            let coarse_proposal = proposal;
            let odd = self.conditionals[level].sample(&coarse_proposal);
            proposal = combine_odd_even(&odd, &coarse_proposal);

            let delta_s = self.delta_s(
                level,
                &current_on_level[level + 1],
                &proposal,
                &coarse_proposal,
            );
            if delta_s < 0.0 {
                continue;
            }
            if self.rng.gen::<f64>() >= (-delta_s).exp() {
                return None;
            }
        }

        Some(proposal)
    }
}
