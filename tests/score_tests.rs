//! # Score Engine Tests: Normalization, Weighting, RTT Smoothing
//!
//! Validates the default weighted scoring formula, the pluggable `ScoreFn`
//! hook, RTT smoothing, and how telemetry samples reposition records.

use ndnfw_core::ScoringConfig;
use ndnfw_dsa::{FaceId, Placement, RankingTable, Status, Telemetry};
use ndnfw_strategy::score::{cost_norm, pi_norm, rtt_norm, status_norm};
use ndnfw_strategy::{
    ExponentialSmoother, ForwardingPolicy, RttSmoother, ScoreFn, ScoringPolicy, TelemetrySample, WeightedScoring,
};
use std::time::{Duration, Instant};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

fn close_duration(a: Duration, b: Duration) -> bool {
    let diff = if a > b { a - b } else { b - a };
    diff <= Duration::from_micros(1)
}

#[test]
fn test_normalizers() {
    let t = Instant::now();

    assert_eq!(status_norm(Status::Green), 1.0);
    assert_eq!(status_norm(Status::Yellow), 0.5);
    assert_eq!(status_norm(Status::Red), 0.0);

    let ceiling = Duration::from_millis(1000);
    assert!(close(rtt_norm(Duration::ZERO, ceiling), 0.5), "unmeasured RTT is neutral");
    assert!(close(rtt_norm(Duration::from_millis(250), ceiling), 0.75));
    assert!(close(rtt_norm(Duration::from_secs(5), ceiling), 0.0));

    assert_eq!(pi_norm(f64::NAN), 0.0);
    assert_eq!(pi_norm(-3.0), 0.0);
    assert_eq!(pi_norm(7.0), 1.0);

    assert_eq!(cost_norm(0), 1.0);
    assert_eq!(cost_norm(-4), 1.0);
    assert!(close(cost_norm(3), 0.25));

    let overhead = t.elapsed();
    println!("test_normalizers: Testing Overhead = {:?}", overhead);
}

#[test]
fn test_weighted_scoring_default_formula() {
    let t = Instant::now();

    let scoring = WeightedScoring::default();
    let n = scoring.normalize(Status::Green, Duration::from_millis(250), 0.8, 1);

    assert!(close(n.status, 1.0));
    assert!(close(n.rtt, 0.75));
    assert!(close(n.pi, 0.8));
    // 0.4*1 + 0.3*0.75 + 0.2*0.8 + 0.1*0.5
    assert!(close(n.score, 0.835), "score was {}", n.score);

    // A healthier face outranks a RED one with otherwise identical inputs.
    let red = scoring.normalize(Status::Red, Duration::from_millis(250), 0.8, 1);
    assert!(n.score > red.score);

    let overhead = t.elapsed();
    println!("test_weighted_scoring_default_formula: Testing Overhead = {:?}", overhead);
}

#[test]
fn test_exponential_smoother() {
    let t = Instant::now();

    let smoother = ExponentialSmoother::default();

    let (srtt, rttvar) = smoother.smooth(Duration::ZERO, Duration::ZERO, Duration::from_millis(100));
    assert_eq!(srtt, Duration::from_millis(100), "first sample seeds srtt");
    assert_eq!(rttvar, Duration::from_millis(50), "first sample seeds rttvar at half");

    let (srtt, rttvar) = smoother.smooth(srtt, rttvar, Duration::from_millis(200));
    assert!(close_duration(srtt, Duration::from_micros(112_500)), "srtt was {:?}", srtt);
    assert!(close_duration(rttvar, Duration::from_micros(62_500)), "rttvar was {:?}", rttvar);

    let overhead = t.elapsed();
    println!("test_exponential_smoother: Testing Overhead = {:?}", overhead);
}

/// A 0ns sample is still a measurement: the next sample is blended in
/// rather than reseeding the estimate.
#[test]
fn test_zero_sample_counts_as_measured() {
    let t = Instant::now();

    let smoother = ExponentialSmoother::default();

    let (srtt, rttvar) = smoother.smooth(Duration::ZERO, Duration::ZERO, Duration::ZERO);
    assert!(!srtt.is_zero(), "a measured srtt is never zero");
    assert_eq!(srtt, Duration::from_nanos(1));
    assert_eq!(rttvar, Duration::ZERO);

    let (srtt, _) = smoother.smooth(srtt, rttvar, Duration::from_millis(100));
    assert!(close_duration(srtt, Duration::from_micros(12_500)), "srtt was {:?}", srtt);

    let overhead = t.elapsed();
    println!("test_zero_sample_counts_as_measured: Testing Overhead = {:?}", overhead);
}

/// `ScoreFn` normalizes RTT against the same ceiling as the weighted formula.
#[test]
fn test_score_fn_uses_configured_rtt_ceiling() {
    let t = Instant::now();

    let config = ScoringConfig { rtt_ceiling_ms: 400, ..ScoringConfig::default() };
    let weighted = WeightedScoring::from_config(&config);
    let custom = ScoreFn::from_config(&config, |_: Status, _: Duration, _: f64, _: i32| 0.0);
    assert_eq!(custom.rtt_ceiling(), Duration::from_millis(400));

    let samples = [
        Duration::from_millis(1),
        Duration::from_millis(100),
        Duration::from_millis(399),
        Duration::from_secs(2),
    ];
    for srtt in samples {
        let expected = weighted.normalize(Status::Green, srtt, 0.5, 1).rtt;
        let actual = custom.normalize(Status::Green, srtt, 0.5, 1).rtt;
        assert_eq!(actual, expected, "rtt_norm differs at {:?}", srtt);
    }
    assert!(close(custom.normalize(Status::Green, Duration::from_millis(100), 0.5, 1).rtt, 0.75));

    let defaulted = ScoreFn::new(|_: Status, _: Duration, _: f64, _: i32| 0.0);
    assert_eq!(defaulted.rtt_ceiling(), Duration::from_millis(ScoringConfig::default().rtt_ceiling_ms));
    let widened = defaulted.with_rtt_ceiling(Duration::from_millis(200));
    assert!(close(widened.normalize(Status::Green, Duration::from_millis(50), 0.0, 0).rtt, 0.75));

    let overhead = t.elapsed();
    println!("test_score_fn_uses_configured_rtt_ceiling: Testing Overhead = {:?}", overhead);
}

#[test]
#[should_panic(expected = "alpha")]
fn test_smoother_rejects_zero_gain() {
    let _ = ExponentialSmoother::new(0.0, 0.25);
}

#[test]
fn test_apply_samples_reposition_records() {
    let t = Instant::now();

    let engine = ForwardingPolicy::default().score_engine();
    let mut table = RankingTable::new();
    table.upsert(FaceId(1), Telemetry::default(), &engine);
    table.upsert(FaceId(2), Telemetry::default(), &engine);
    // Identical inputs: identity breaks the tie.
    assert_eq!(table.nth(0).map(|r| r.face()), Some(FaceId(1)));

    let applied = engine
        .apply(&mut table, FaceId(2), TelemetrySample::Status(Status::Green))
        .expect("face 2 is in the table");
    assert_eq!(applied.status_change, Some((Status::Yellow, Status::Green)));
    assert_eq!(applied.placement, Placement::Moved);
    assert_eq!(table.nth(0).map(|r| r.face()), Some(FaceId(2)));

    // Re-reporting the same status is not a transition.
    let applied = engine
        .apply(&mut table, FaceId(2), TelemetrySample::Status(Status::Green))
        .expect("face 2 is in the table");
    assert_eq!(applied.status_change, None);
    assert_eq!(applied.placement, Placement::Stayed);

    engine.apply(&mut table, FaceId(1), TelemetrySample::Rtt(Duration::from_millis(40)));
    let record = table.get(FaceId(1)).copied().expect("face 1 is in the table");
    assert_eq!(record.srtt(), Duration::from_millis(40));
    assert_eq!(record.rttvar(), Duration::from_millis(20));

    engine.apply(&mut table, FaceId(1), TelemetrySample::RoutingCost(9));
    engine.apply(&mut table, FaceId(1), TelemetrySample::PerformanceIndicator(0.6));
    let record = table.get(FaceId(1)).copied().expect("face 1 is in the table");
    assert_eq!(record.routing_cost(), 9);
    assert!(close(record.pi_norm(), 0.6));

    assert!(engine
        .apply(&mut table, FaceId(42), TelemetrySample::RoutingCost(1))
        .is_none());

    assert_eq!(engine.recompute(&mut table, FaceId(1)), Some(Placement::Stayed));

    let overhead = t.elapsed();
    println!("test_apply_samples_reposition_records: Testing Overhead = {:?}", overhead);
}

/// Custom formulas plug in through `ScoreFn`; NaN results rank last.
#[test]
fn test_score_fn_policy() {
    let t = Instant::now();

    let policy = ForwardingPolicy::default()
        .with_scoring(ScoreFn::new(|_status: Status, _srtt: Duration, pi: f64, cost: i32| {
            if cost < 0 {
                f64::NAN
            } else {
                pi - f64::from(cost)
            }
        }));
    let engine = policy.score_engine();

    let mut table = RankingTable::new();
    table.upsert(FaceId(1), Telemetry::new(Status::Green, Duration::ZERO, 2, 0.5), &engine);
    table.upsert(FaceId(2), Telemetry::new(Status::Green, Duration::ZERO, 0, 0.1), &engine);
    table.upsert(FaceId(3), Telemetry::new(Status::Green, Duration::ZERO, -1, 0.9), &engine);

    let order: Vec<_> = table.iter_by_score().map(|r| r.face().0).collect();
    assert_eq!(order, vec![2, 1, 3]);
    assert_eq!(table.get(FaceId(3)).map(|r| r.score()), Some(f64::NEG_INFINITY));

    let overhead = t.elapsed();
    println!("test_score_fn_policy: Testing Overhead = {:?}", overhead);
}
