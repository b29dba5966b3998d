/*!
# Lattice Actions

Defines the [`Action`] trait describing a discretized Euclidean action over a
periodic 1-D lattice, together with [`HarmonicOscillatorAction`], the
discretized harmonic oscillator. The unnormalized target density of every
sampler in this crate is `exp(-action.evaluate(path))`.

An action knows how to evaluate itself, how to compute its exact gradient
(used by Hamiltonian Monte Carlo), how to describe the local quadratic form
governing an odd lattice site between two even neighbours (used by the
odd-even conditional), and how to move between lattice resolutions.

# Examples

```rust
use multilevel_mcmc::action::{Action, HarmonicOscillatorAction};
use nalgebra::DVector;

let action = HarmonicOscillatorAction::new(8, 0.5, 1.0, 1.0);
let path = DVector::zeros(8);
assert_eq!(action.evaluate(&path), 0.0);

let coarse = action.make_coarsened_action();
assert_eq!(coarse.path_length(), 4);
assert_eq!(coarse.make_finer_action(), action);
```
*/

use crate::core::Path;

/// A discretized action over a periodic path of real degrees of freedom.
///
/// Implementations must keep `evaluate` and `grad_potential` consistent
/// (the gradient is the exact derivative of the action) and must derive
/// `w_curvature`/`w_minimum` algebraically from the same action so that
/// odd-even conditional sampling is exact rather than approximate.
pub trait Action: Clone {
    /// Evaluates the action of `path` under periodic boundary conditions.
    fn evaluate(&self, path: &Path) -> f64;

    /// Exact gradient of the action with respect to each site.
    fn grad_potential(&self, path: &Path) -> Path;

    /// Curvature of the local quadratic form governing the odd site between
    /// the adjacent even pair `(x_minus, x_plus)`.
    fn w_curvature(&self, x_minus: f64, x_plus: f64) -> f64;

    /// Location of the minimum of that local quadratic form.
    fn w_minimum(&self, x_minus: f64, x_plus: f64) -> f64;

    /// The same action on a lattice with half the sites and twice the spacing.
    fn make_coarsened_action(&self) -> Self;

    /// The same action on a lattice with twice the sites and half the spacing.
    /// Inverse of [`Action::make_coarsened_action`].
    fn make_finer_action(&self) -> Self;

    /// Number of lattice sites this action is configured for.
    fn path_length(&self) -> usize;
}

/// The discretized harmonic oscillator on a periodic lattice:
///
/// ```text
/// S(x) = sum_i  m0/(2 dt) (x_i - x_{i-1})^2  +  dt/2 mu2 x_i^2
/// ```
///
/// with the site index wrapping at the path boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HarmonicOscillatorAction {
    /// Number of lattice sites N.
    pub n: usize,
    /// Lattice spacing in imaginary time.
    pub delta_t: f64,
    /// Particle mass.
    pub m0: f64,
    /// Quadratic coupling (squared frequency).
    pub mu2: f64,
}

impl HarmonicOscillatorAction {
    pub fn new(n: usize, delta_t: f64, m0: f64, mu2: f64) -> Self {
        assert!(n > 0, "path length must be positive");
        assert!(delta_t > 0.0, "lattice spacing must be positive");
        assert!(m0 > 0.0, "mass must be positive");
        assert!(mu2 > 0.0, "coupling must be positive");
        Self { n, delta_t, m0, mu2 }
    }

    /// Closed-form value of the mean squared displacement `<x^2>` for this
    /// discretization, from the discretized propagator ratio formula.
    pub fn analytic_solution(&self) -> f64 {
        let dt2mu2 = self.delta_t * self.delta_t * self.mu2;
        let r = 1.0 + dt2mu2 / (2.0 * self.m0)
            - self.delta_t
                * self.mu2.sqrt()
                * (1.0 / self.m0 + dt2mu2 / (4.0 * self.m0)).sqrt();
        let rn = r.powi(self.n as i32);
        1.0 / (2.0 * self.mu2.sqrt() * (self.m0 + 0.25 * dt2mu2).sqrt()) * (1.0 + rn)
            / (1.0 - rn)
    }
}

impl Action for HarmonicOscillatorAction {
    fn evaluate(&self, path: &Path) -> f64 {
        assert_eq!(path.len(), self.n, "path length does not match action");
        let kinetic_weight = 0.5 * self.m0 / self.delta_t;
        let potential_weight = 0.5 * self.delta_t * self.mu2;

        let mut res = 0.0;
        for i in 0..self.n {
            let prev = path[(i + self.n - 1) % self.n];
            let dx = path[i] - prev;
            res += kinetic_weight * dx * dx + potential_weight * path[i] * path[i];
        }
        res
    }

    fn grad_potential(&self, path: &Path) -> Path {
        assert_eq!(path.len(), self.n, "path length does not match action");
        let a = self.m0 / self.delta_t;
        let b = self.delta_t * self.mu2;

        let mut force = Path::zeros(self.n);
        for i in 0..self.n {
            let prev = path[(i + self.n - 1) % self.n];
            let next = path[(i + 1) % self.n];
            force[i] = a * (2.0 * path[i] - prev - next) + b * path[i];
        }
        force
    }

    fn w_curvature(&self, _x_minus: f64, _x_plus: f64) -> f64 {
        2.0 * self.m0 / self.delta_t + self.delta_t * self.mu2
    }

    fn w_minimum(&self, x_minus: f64, x_plus: f64) -> f64 {
        self.m0 / self.delta_t * (x_minus + x_plus) / self.w_curvature(x_minus, x_plus)
    }

    fn make_coarsened_action(&self) -> Self {
        assert!(
            self.n % 2 == 0,
            "cannot coarsen an action with an odd number of sites"
        );
        Self {
            n: self.n / 2,
            delta_t: 2.0 * self.delta_t,
            ..*self
        }
    }

    fn make_finer_action(&self) -> Self {
        Self {
            n: 2 * self.n,
            delta_t: 0.5 * self.delta_t,
            ..*self
        }
    }

    fn path_length(&self) -> usize {
        self.n
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    fn random_path(n: usize, rng: &mut SmallRng) -> Path {
        Path::from_iterator(n, (0..n).map(|_| rng.gen_range(-2.0..2.0)))
    }

    #[test]
    fn evaluate_matches_hand_computed_value() {
        let action = HarmonicOscillatorAction::new(2, 0.5, 1.0, 1.0);
        let path = Path::from_vec(vec![1.0, -1.0]);
        // Kinetic: two hops of length 2, each 1/(2*0.5)*4 = 4.
        // Potential: 0.5*0.5*1 per site.
        assert_abs_diff_eq!(action.evaluate(&path), 8.5, epsilon = 1e-12);
    }

    #[test]
    fn gradient_matches_finite_differences() {
        let action = HarmonicOscillatorAction::new(8, 0.5, 1.3, 0.7);
        let mut rng = SmallRng::seed_from_u64(7);
        let path = random_path(8, &mut rng);
        let grad = action.grad_potential(&path);

        let h = 1e-6;
        for i in 0..8 {
            let mut plus = path.clone();
            let mut minus = path.clone();
            plus[i] += h;
            minus[i] -= h;
            let numerical = (action.evaluate(&plus) - action.evaluate(&minus)) / (2.0 * h);
            assert_relative_eq!(grad[i], numerical, epsilon = 1e-5, max_relative = 1e-5);
        }
    }

    #[test]
    fn local_quadratic_form_matches_action() {
        // The odd-site quadratic form must have its stationary point at
        // w_minimum and second derivative w_curvature, measured on the
        // action itself.
        let action = HarmonicOscillatorAction::new(4, 0.5, 1.2, 0.9);
        let (x_minus, x_plus) = (0.7, -0.3);
        let local = |y: f64| {
            let path = Path::from_vec(vec![x_minus, y, x_plus, 0.0]);
            action.evaluate(&path)
        };

        let y0 = action.w_minimum(x_minus, x_plus);
        let h = 1e-5;
        let first = (local(y0 + h) - local(y0 - h)) / (2.0 * h);
        let second = (local(y0 + h) - 2.0 * local(y0) + local(y0 - h)) / (h * h);
        assert_abs_diff_eq!(first, 0.0, epsilon = 1e-6);
        assert_relative_eq!(second, action.w_curvature(x_minus, x_plus), epsilon = 1e-4);
    }

    #[test]
    fn coarsen_then_refine_round_trips() {
        let action = HarmonicOscillatorAction::new(16, 0.25, 1.0, 2.0);
        let coarse = action.make_coarsened_action();
        assert_eq!(coarse.path_length(), 8);
        assert_abs_diff_eq!(coarse.delta_t, 0.5, epsilon = 1e-15);
        assert_eq!(coarse.make_finer_action(), action);
    }

    #[test]
    #[should_panic(expected = "cannot coarsen")]
    fn coarsening_odd_lattice_panics() {
        HarmonicOscillatorAction::new(7, 0.5, 1.0, 1.0).make_coarsened_action();
    }

    #[test]
    fn analytic_solution_approaches_continuum_limit() {
        // For dt -> 0 and T large, <x^2> -> 1/(2 sqrt(m0 mu2)) = 0.5.
        let action = HarmonicOscillatorAction::new(10_000, 0.01, 1.0, 1.0);
        assert_relative_eq!(action.analytic_solution(), 0.5, max_relative = 1e-2);
    }
}
