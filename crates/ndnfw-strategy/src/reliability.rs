//! # ndnfw-strategy: RTT Smoothing
//!
//! Turns raw round-trip samples into the smoothed RTT and RTT variation the
//! ranking consumes.

use std::time::Duration;

use ndnfw_core::RttConfig;

/// Folds one RTT sample into the running estimate.
///
/// Decision logic is O(1) with no allocation; it runs inside the ranking
/// table's write lock.
pub trait RttSmoother: Send + Sync {
    /// Returns the new `(srtt, rttvar)`. A zero `srtt` means "no sample yet",
    /// so a measured estimate must never be zero.
    fn smooth(&self, srtt: Duration, rttvar: Duration, sample: Duration) -> (Duration, Duration);
}

const MIN_SAMPLE: Duration = Duration::from_nanos(1);

/// Exponentially weighted estimator (RFC 6298 gains by default).
#[derive(Debug, Clone, Copy)]
pub struct ExponentialSmoother {
    alpha: f64,
    beta: f64,
}

impl ExponentialSmoother {
    /// # Panics
    /// Panics unless both gains are in (0, 1].
    pub fn new(alpha: f64, beta: f64) -> Self {
        assert!(alpha > 0.0 && alpha <= 1.0, "alpha must be in (0, 1]");
        assert!(beta > 0.0 && beta <= 1.0, "beta must be in (0, 1]");
        Self { alpha, beta }
    }

    pub fn from_config(config: &RttConfig) -> Self {
        Self::new(config.alpha, config.beta)
    }
}

impl Default for ExponentialSmoother {
    fn default() -> Self {
        Self::new(0.125, 0.25)
    }
}

impl RttSmoother for ExponentialSmoother {
    fn smooth(&self, srtt: Duration, rttvar: Duration, sample: Duration) -> (Duration, Duration) {
        // Sub-nanosecond samples count as 1ns.
        let sample = sample.max(MIN_SAMPLE);
        if srtt.is_zero() {
            return (sample, sample / 2);
        }
        let deviation = if srtt > sample { srtt - sample } else { sample - srtt };
        let rttvar = rttvar.mul_f64(1.0 - self.beta) + deviation.mul_f64(self.beta);
        let srtt = srtt.mul_f64(1.0 - self.alpha) + sample.mul_f64(self.alpha);
        (srtt, rttvar)
    }
}
