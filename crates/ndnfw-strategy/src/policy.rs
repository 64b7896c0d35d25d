use std::sync::Arc;

use ndnfw_core::ForwarderConfig;
use ndnfw_dsa::Status;

use crate::limiter::{AdmissionPolicy, OutstandingLimiter};
use crate::reliability::{ExponentialSmoother, RttSmoother};
use crate::score::{ScoreEngine, ScoringPolicy, WeightedScoring};

/// Decides what status a face moves to when a new one is reported.
pub trait StatusPolicy: Send + Sync {
    fn accept(&self, current: Status, reported: Status) -> Status;
}

/// Takes every reported status as-is.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustReported;

impl StatusPolicy for TrustReported {
    fn accept(&self, _current: Status, reported: Status) -> Status {
        reported
    }
}

/// The pluggable pieces of a forwarding strategy.
#[derive(Clone)]
pub struct ForwardingPolicy {
    pub scoring: Arc<dyn ScoringPolicy>,
    pub smoothing: Arc<dyn RttSmoother>,
    pub status: Arc<dyn StatusPolicy>,
    pub admission: Arc<dyn AdmissionPolicy>,
    /// Skip RED candidates entirely instead of only ranking them last.
    pub exclude_red: bool,
}

impl ForwardingPolicy {
    pub fn from_config(config: &ForwarderConfig) -> Self {
        Self {
            scoring: Arc::new(WeightedScoring::from_config(&config.scoring)),
            smoothing: Arc::new(ExponentialSmoother::from_config(&config.rtt)),
            status: Arc::new(TrustReported),
            admission: Arc::new(OutstandingLimiter),
            exclude_red: config.decision.exclude_red,
        }
    }

    pub fn with_scoring(mut self, scoring: impl ScoringPolicy + 'static) -> Self {
        self.scoring = Arc::new(scoring);
        self
    }

    pub fn with_smoothing(mut self, smoothing: impl RttSmoother + 'static) -> Self {
        self.smoothing = Arc::new(smoothing);
        self
    }

    pub fn with_status_policy(mut self, status: impl StatusPolicy + 'static) -> Self {
        self.status = Arc::new(status);
        self
    }

    pub fn with_admission(mut self, admission: impl AdmissionPolicy + 'static) -> Self {
        self.admission = Arc::new(admission);
        self
    }

    pub fn with_exclude_red(mut self, exclude_red: bool) -> Self {
        self.exclude_red = exclude_red;
        self
    }

    pub fn score_engine(&self) -> ScoreEngine {
        ScoreEngine::new(
            Arc::clone(&self.scoring),
            Arc::clone(&self.smoothing),
            Arc::clone(&self.status),
        )
    }
}

impl Default for ForwardingPolicy {
    fn default() -> Self {
        Self::from_config(&ForwarderConfig::default())
    }
}
