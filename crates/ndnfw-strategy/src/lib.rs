pub mod decision;
pub mod forwarder;
pub mod limiter;
pub mod policy;
pub mod reliability;
pub mod score;

pub use decision::{DecisionLoop, ForwardOutcome};
pub use forwarder::Forwarder;
pub use limiter::{Admission, AdmissionPolicy, OutstandingLimiter, Release, Unlimited};
pub use policy::{ForwardingPolicy, StatusPolicy, TrustReported};
pub use reliability::{ExponentialSmoother, RttSmoother};
pub use score::{Applied, ScoreEngine, ScoreFn, ScoringPolicy, TelemetrySample, WeightedScoring};
