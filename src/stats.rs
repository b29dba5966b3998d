//! Accumulation of chain samples and derived MCMC statistics.

/// Default lag window for the integrated autocorrelation time.
pub const DEFAULT_AUTOCORR_WINDOW: usize = 30;

/// Recorded samples of a scalar quantity of interest, one entry per
/// post-burn-in chain step, together with the per-step acceptance flags.
///
/// The record grows monotonically through [`McmcResult::add_sample`]; every
/// derived statistic is a pure function of the recorded sequence.
///
/// # Examples
///
/// ```rust
/// use multilevel_mcmc::stats::McmcResult;
///
/// let mut result = McmcResult::new();
/// result.add_sample(1.0, true);
/// result.add_sample(3.0, false);
/// assert_eq!(result.num_samples(), 2);
/// assert_eq!(result.mean(), 2.0);
/// assert_eq!(result.acceptance_rate(), 0.5);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct McmcResult {
    /// Quantity-of-interest values in recording order.
    pub samples: Vec<f64>,
    /// Whether the step that produced each sample was accepted.
    pub accepted: Vec<bool>,
}

impl McmcResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n_samples: usize) -> Self {
        Self {
            samples: Vec::with_capacity(n_samples),
            accepted: Vec::with_capacity(n_samples),
        }
    }

    pub fn add_sample(&mut self, sample: f64, was_accepted: bool) {
        self.samples.push(sample);
        self.accepted.push(was_accepted);
    }

    pub fn num_samples(&self) -> usize {
        self.samples.len()
    }

    pub fn mean(&self) -> f64 {
        assert!(!self.samples.is_empty(), "no samples recorded");
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// Sample variance with the `n - 1` denominator.
    pub fn variance(&self) -> f64 {
        assert!(self.samples.len() > 1, "variance needs at least two samples");
        let mean = self.mean();
        let sum_sq = self
            .samples
            .iter()
            .map(|x| (x - mean) * (x - mean))
            .sum::<f64>();
        sum_sq / (self.samples.len() - 1) as f64
    }

    /// Fraction of recorded steps that were accepted.
    pub fn acceptance_rate(&self) -> f64 {
        if self.accepted.is_empty() {
            return 0.0;
        }
        self.accepted.iter().filter(|&&a| a).count() as f64 / self.accepted.len() as f64
    }

    /// Integrated autocorrelation time `tau = 1 + 2 sum_s rho(s)` over lags
    /// `1..window`, with the normalized autocorrelation computed by direct
    /// summation.
    ///
    /// Floored at 1 so that [`McmcResult::mean_error`] never shrinks below
    /// the uncorrelated estimate; a degenerate chain with zero lag-0
    /// autocovariance also reports 1.
    pub fn integrated_autocorrelation_time(&self, window: usize) -> f64 {
        let n = self.samples.len();
        if n < 2 {
            return 1.0;
        }
        let window = window.min(n);
        let mean = self.mean();

        let autocovariance = |s: usize| {
            let mut sum = 0.0;
            for j in 0..n - s {
                sum += (self.samples[j] - mean) * (self.samples[j + s] - mean);
            }
            sum / (n - s) as f64
        };

        let lag_zero = autocovariance(0);
        if lag_zero <= 0.0 {
            return 1.0;
        }

        let mut rho_sum = 0.0;
        for s in 1..window {
            rho_sum += autocovariance(s) / lag_zero;
        }
        (1.0 + 2.0 * rho_sum).max(1.0)
    }

    /// Statistical error of the mean, corrected for autocorrelation:
    /// `sqrt(tau * variance / n)`.
    pub fn mean_error(&self) -> f64 {
        let tau = self.integrated_autocorrelation_time(DEFAULT_AUTOCORR_WINDOW);
        (tau * self.variance() / self.samples.len() as f64).sqrt()
    }

    /// Number of samples needed to push [`McmcResult::mean_error`] below
    /// `target_error`, from the current variance and autocorrelation-time
    /// estimates.
    pub fn required_samples(&self, target_error: f64) -> usize {
        assert!(target_error > 0.0, "target error must be positive");
        let tau = self.integrated_autocorrelation_time(DEFAULT_AUTOCORR_WINDOW);
        (tau * self.variance() / (target_error * target_error)).ceil() as usize
    }
}
