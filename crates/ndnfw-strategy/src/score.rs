use std::sync::Arc;
use std::time::Duration;

use ndnfw_core::ScoringConfig;
use ndnfw_dsa::{FaceId, Normalized, Placement, RankingTable, Scorer, Status, Telemetry};

use crate::policy::StatusPolicy;
use crate::reliability::RttSmoother;

/// Maps raw telemetry to normalized values and a composite score.
/// Higher scores forward first.
pub trait ScoringPolicy: Send + Sync {
    fn normalize(&self, status: Status, srtt: Duration, pi: f64, routing_cost: i32) -> Normalized;
}

/// GREEN = 1, YELLOW = 0.5, RED = 0.
pub fn status_norm(status: Status) -> f64 {
    match status {
        Status::Green => 1.0,
        Status::Yellow => 0.5,
        Status::Red => 0.0,
    }
}

/// 1 at zero delay falling linearly to 0 at `ceiling`. An unmeasured (zero)
/// RTT sits in the middle so new faces neither lead nor trail on delay.
pub fn rtt_norm(srtt: Duration, ceiling: Duration) -> f64 {
    if srtt.is_zero() {
        return 0.5;
    }
    1.0 - (srtt.as_secs_f64() / ceiling.as_secs_f64()).min(1.0)
}

pub fn pi_norm(pi: f64) -> f64 {
    if pi.is_nan() {
        0.0
    } else {
        pi.clamp(0.0, 1.0)
    }
}

pub fn cost_norm(routing_cost: i32) -> f64 {
    1.0 / (1.0 + f64::from(routing_cost.max(0)))
}

/// Weighted mean of the normalized status, RTT, PI and routing cost.
#[derive(Debug, Clone)]
pub struct WeightedScoring {
    status_weight: f64,
    rtt_weight: f64,
    pi_weight: f64,
    cost_weight: f64,
    rtt_ceiling: Duration,
}

impl WeightedScoring {
    pub fn from_config(config: &ScoringConfig) -> Self {
        Self {
            status_weight: config.status_weight,
            rtt_weight: config.rtt_weight,
            pi_weight: config.pi_weight,
            cost_weight: config.cost_weight,
            rtt_ceiling: Duration::from_millis(config.rtt_ceiling_ms),
        }
    }
}

impl Default for WeightedScoring {
    fn default() -> Self {
        Self::from_config(&ScoringConfig::default())
    }
}

impl ScoringPolicy for WeightedScoring {
    fn normalize(&self, status: Status, srtt: Duration, pi: f64, routing_cost: i32) -> Normalized {
        let status = status_norm(status);
        let rtt = rtt_norm(srtt, self.rtt_ceiling);
        let pi = pi_norm(pi);
        let cost = cost_norm(routing_cost);

        let total = self.status_weight + self.rtt_weight + self.pi_weight + self.cost_weight;
        let weighted = self.status_weight * status
            + self.rtt_weight * rtt
            + self.pi_weight * pi
            + self.cost_weight * cost;
        let score = if total > 0.0 { weighted / total } else { 0.0 };

        Normalized { status, rtt, pi, score }
    }
}

/// Adapts a plain function `(status, srtt, pi, cost) -> score` into a
/// [`ScoringPolicy`]. The normalized fields use the default normalizers with
/// the same RTT ceiling as [`WeightedScoring`].
pub struct ScoreFn<F> {
    score: F,
    rtt_ceiling: Duration,
}

impl<F> ScoreFn<F> {
    /// Uses the default `scoring.rtt_ceiling_ms`.
    pub fn new(score: F) -> Self {
        Self::from_config(&ScoringConfig::default(), score)
    }

    pub fn from_config(config: &ScoringConfig, score: F) -> Self {
        Self {
            score,
            rtt_ceiling: Duration::from_millis(config.rtt_ceiling_ms),
        }
    }

    pub fn with_rtt_ceiling(mut self, rtt_ceiling: Duration) -> Self {
        self.rtt_ceiling = rtt_ceiling;
        self
    }

    pub fn rtt_ceiling(&self) -> Duration {
        self.rtt_ceiling
    }
}

impl<F> ScoringPolicy for ScoreFn<F>
where
    F: Fn(Status, Duration, f64, i32) -> f64 + Send + Sync,
{
    fn normalize(&self, status: Status, srtt: Duration, pi: f64, routing_cost: i32) -> Normalized {
        Normalized {
            status: status_norm(status),
            rtt: rtt_norm(srtt, self.rtt_ceiling),
            pi: pi_norm(pi),
            score: (self.score)(status, srtt, pi, routing_cost),
        }
    }
}

/// One inbound telemetry observation for a (route, face) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TelemetrySample {
    Rtt(Duration),
    RoutingCost(i32),
    PerformanceIndicator(f64),
    Status(Status),
}

/// Result of applying a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Applied {
    pub placement: Placement,
    /// `(from, to)` when the stored status changed.
    pub status_change: Option<(Status, Status)>,
}

/// Recomputes candidate scores and repositions records on every input change.
#[derive(Clone)]
pub struct ScoreEngine {
    scoring: Arc<dyn ScoringPolicy>,
    smoothing: Arc<dyn RttSmoother>,
    status: Arc<dyn StatusPolicy>,
}

impl ScoreEngine {
    pub fn new(
        scoring: Arc<dyn ScoringPolicy>,
        smoothing: Arc<dyn RttSmoother>,
        status: Arc<dyn StatusPolicy>,
    ) -> Self {
        Self {
            scoring,
            smoothing,
            status,
        }
    }

    /// Rescores `face` from unchanged inputs. Repeated calls never reorder.
    pub fn recompute(&self, table: &mut RankingTable, face: FaceId) -> Option<Placement> {
        table.recompute(face, self)
    }

    /// Folds `sample` into the record for `face` and repositions it.
    /// Returns `None` if the table has no record for `face`.
    pub fn apply(&self, table: &mut RankingTable, face: FaceId, sample: TelemetrySample) -> Option<Applied> {
        let mut status_change = None;
        let placement = table.modify(
            face,
            |t| match sample {
                TelemetrySample::Rtt(rtt) => {
                    let (srtt, rttvar) = self.smoothing.smooth(t.srtt, t.rttvar, rtt);
                    t.srtt = srtt;
                    t.rttvar = rttvar;
                }
                TelemetrySample::RoutingCost(cost) => t.routing_cost = cost,
                TelemetrySample::PerformanceIndicator(pi) => t.pi = pi,
                TelemetrySample::Status(reported) => {
                    let next = self.status.accept(t.status, reported);
                    if next != t.status {
                        status_change = Some((t.status, next));
                        t.status = next;
                    }
                }
            },
            self,
        )?;
        Some(Applied {
            placement,
            status_change,
        })
    }
}

impl Scorer for ScoreEngine {
    fn score(&self, t: &Telemetry) -> Normalized {
        let mut normalized = self.scoring.normalize(t.status, t.srtt, t.pi, t.routing_cost);
        if normalized.score.is_nan() {
            tracing::warn!("ScoreEngine: policy produced NaN, ranking candidate last");
            normalized.score = f64::NEG_INFINITY;
        }
        normalized
    }
}
