use alloc::collections::{BTreeMap, BTreeSet};
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;
use core::time::Duration;

/// Identity of an outbound face. Ordering is identity-based.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct FaceId(pub u32);

impl From<u32> for FaceId {
    fn from(id: u32) -> Self {
        FaceId(id)
    }
}

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "face#{}", self.0)
    }
}

/// Tri-state health of a next hop. Healthier sorts first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
#[repr(u8)]
pub enum Status {
    Green = 0,
    Yellow = 1,
    Red = 2,
}

static_assertions::assert_eq_size!(Status, u8);

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Green => "GREEN",
            Status::Yellow => "YELLOW",
            Status::Red => "RED",
        })
    }
}

/// Raw telemetry for one (route, face) pair.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Telemetry {
    pub status: Status,
    /// Smoothed round-trip time. Zero means no sample yet.
    pub srtt: Duration,
    pub rttvar: Duration,
    pub routing_cost: i32,
    /// Performance indicator.
    pub pi: f64,
}

impl Telemetry {
    pub fn new(status: Status, srtt: Duration, routing_cost: i32, pi: f64) -> Self {
        Self {
            status,
            srtt,
            rttvar: Duration::ZERO,
            routing_cost,
            pi,
        }
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::new(Status::Yellow, Duration::ZERO, 0, 0.0)
    }
}

/// Normalized ("formal") values and the composite score derived from them.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Normalized {
    pub status: f64,
    pub rtt: f64,
    pub pi: f64,
    pub score: f64,
}

/// Derives normalized values and the score from raw telemetry.
pub trait Scorer {
    fn score(&self, telemetry: &Telemetry) -> Normalized;
}

impl<F> Scorer for F
where
    F: Fn(&Telemetry) -> Normalized,
{
    fn score(&self, telemetry: &Telemetry) -> Normalized {
        self(telemetry)
    }
}

/// One candidate next hop inside a [`RankingTable`].
///
/// Records handed out by the table are copies; the only way to change a stored
/// record is through the table, which keeps every index consistent.
#[derive(Clone, Copy, Debug)]
pub struct CandidateRecord {
    face: FaceId,
    telemetry: Telemetry,
    formal: Normalized,
}

impl CandidateRecord {
    pub fn face(&self) -> FaceId {
        self.face
    }
    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }
    pub fn status(&self) -> Status {
        self.telemetry.status
    }
    pub fn srtt(&self) -> Duration {
        self.telemetry.srtt
    }
    pub fn rttvar(&self) -> Duration {
        self.telemetry.rttvar
    }
    pub fn routing_cost(&self) -> i32 {
        self.telemetry.routing_cost
    }
    pub fn pi(&self) -> f64 {
        self.telemetry.pi
    }
    pub fn status_norm(&self) -> f64 {
        self.formal.status
    }
    pub fn rtt_norm(&self) -> f64 {
        self.formal.rtt
    }
    pub fn pi_norm(&self) -> f64 {
        self.formal.pi
    }
    pub fn score(&self) -> f64 {
        self.formal.score
    }

    fn score_key(&self) -> ScoreKey {
        ScoreKey::new(self)
    }
}

/// Composite key of the forwarding order:
/// score descending, status ascending, routing cost ascending, face identity.
#[derive(Clone, Copy, Debug)]
struct ScoreKey {
    score: f64,
    status: Status,
    cost: i32,
    face: FaceId,
}

impl ScoreKey {
    fn new(record: &CandidateRecord) -> Self {
        Self {
            // NaN never reaches the index; -0.0 folds into +0.0.
            score: if record.formal.score.is_nan() {
                f64::NEG_INFINITY
            } else {
                record.formal.score + 0.0
            },
            status: record.telemetry.status,
            cost: record.telemetry.routing_cost,
            face: record.face,
        }
    }
}

impl Ord for ScoreKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then(self.status.cmp(&other.status))
            .then(self.cost.cmp(&other.cost))
            .then(self.face.cmp(&other.face))
    }
}

impl PartialOrd for ScoreKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ScoreKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScoreKey {}

/// Total order over the performance indicator.
#[derive(Clone, Copy, Debug)]
struct PiKey(f64);

impl Ord for PiKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl PartialOrd for PiKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PiKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PiKey {}

/// How an upsert or modification affected the score order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    Inserted,
    /// The record moved within the score order.
    Moved,
    /// The score key did not change; no reordering took place.
    Stayed,
}

/// Candidate next hops of one forwarding context, kept in four simultaneous
/// orders plus a positional index.
///
/// ## Layout
/// - `records`: primary store keyed by face identity (uniqueness).
/// - `by_status`, `by_srtt`, `by_pi`: secondary orders, ascending.
/// - `by_score`: the forwarding order (score desc, status asc, cost asc).
/// - `nth`: faces in forwarding order for O(1) "k-th best" access.
///
/// Every mutation removes the stale keys and re-inserts fresh ones, so no
/// index is ever left ordered by values the record no longer holds.
#[derive(Clone, Default)]
pub struct RankingTable {
    records: BTreeMap<FaceId, CandidateRecord>,
    by_status: BTreeSet<(Status, FaceId)>,
    by_srtt: BTreeSet<(Duration, FaceId)>,
    by_pi: BTreeSet<(PiKey, FaceId)>,
    by_score: BTreeSet<ScoreKey>,
    nth: Vec<FaceId>,
    reorders: u64,
}

impl fmt::Debug for RankingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RankingTable")
            .field("len", &self.records.len())
            .field("nth", &self.nth)
            .field("reorders", &self.reorders)
            .finish()
    }
}

impl RankingTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, face: FaceId) -> bool {
        self.records.contains_key(&face)
    }

    pub fn get(&self, face: FaceId) -> Option<&CandidateRecord> {
        self.records.get(&face)
    }

    /// Number of times a record changed position in the score order.
    pub fn reorders(&self) -> u64 {
        self.reorders
    }

    /// Inserts a record for `face` or overwrites its telemetry, then scores it.
    pub fn upsert<S: Scorer + ?Sized>(
        &mut self,
        face: FaceId,
        telemetry: Telemetry,
        scorer: &S,
    ) -> Placement {
        if self.records.contains_key(&face) {
            return self
                .modify(face, |t| *t = telemetry, scorer)
                .unwrap_or(Placement::Stayed);
        }

        let record = CandidateRecord {
            face,
            telemetry,
            formal: scorer.score(&telemetry),
        };
        let key = record.score_key();
        self.by_status.insert((telemetry.status, face));
        self.by_srtt.insert((telemetry.srtt, face));
        self.by_pi.insert((PiKey(telemetry.pi), face));
        self.by_score.insert(key);
        self.records.insert(face, record);
        let pos = self.position_for(&key);
        self.nth.insert(pos, face);
        tracing::trace!("Ranking: inserted {} at position {}", face, pos);
        Placement::Inserted
    }

    /// Applies `f` to the telemetry of `face`, rescoring and repositioning it.
    /// Returns `None` if the face has no record.
    pub fn modify<S, F>(&mut self, face: FaceId, f: F, scorer: &S) -> Option<Placement>
    where
        S: Scorer + ?Sized,
        F: FnOnce(&mut Telemetry),
    {
        let old = *self.records.get(&face)?;
        let mut telemetry = old.telemetry;
        f(&mut telemetry);
        let new = CandidateRecord {
            face,
            telemetry,
            formal: scorer.score(&telemetry),
        };

        if old.telemetry.status != new.telemetry.status {
            self.by_status.remove(&(old.telemetry.status, face));
            self.by_status.insert((new.telemetry.status, face));
        }
        if old.telemetry.srtt != new.telemetry.srtt {
            self.by_srtt.remove(&(old.telemetry.srtt, face));
            self.by_srtt.insert((new.telemetry.srtt, face));
        }
        if PiKey(old.telemetry.pi) != PiKey(new.telemetry.pi) {
            self.by_pi.remove(&(PiKey(old.telemetry.pi), face));
            self.by_pi.insert((PiKey(new.telemetry.pi), face));
        }

        let old_key = old.score_key();
        let new_key = new.score_key();
        if old_key == new_key {
            self.records.insert(face, new);
            return Some(Placement::Stayed);
        }

        // Locate the old slot while the stored record still carries the old key.
        let old_pos = self.position_of(&old_key);
        self.nth.remove(old_pos);
        self.by_score.remove(&old_key);

        self.records.insert(face, new);
        self.by_score.insert(new_key);
        let new_pos = self.position_for(&new_key);
        self.nth.insert(new_pos, face);

        if old_pos == new_pos {
            return Some(Placement::Stayed);
        }
        self.reorders += 1;
        tracing::trace!("Ranking: moved {} from {} to {}", face, old_pos, new_pos);
        Some(Placement::Moved)
    }

    /// Rescores `face` from its current telemetry. Idempotent.
    pub fn recompute<S: Scorer + ?Sized>(&mut self, face: FaceId, scorer: &S) -> Option<Placement> {
        self.modify(face, |_| {}, scorer)
    }

    /// Rescores every record, e.g. after the scoring policy changed.
    pub fn recompute_all<S: Scorer + ?Sized>(&mut self, scorer: &S) {
        let faces: Vec<FaceId> = self.records.keys().copied().collect();
        for face in faces {
            let _ = self.recompute(face, scorer);
        }
    }

    /// Removes the record for `face`. No-op if absent.
    pub fn remove(&mut self, face: FaceId) -> Option<CandidateRecord> {
        let record = *self.records.get(&face)?;
        let key = record.score_key();
        let pos = self.position_of(&key);
        self.nth.remove(pos);
        self.by_score.remove(&key);
        self.by_status.remove(&(record.telemetry.status, face));
        self.by_srtt.remove(&(record.telemetry.srtt, face));
        self.by_pi.remove(&(PiKey(record.telemetry.pi), face));
        self.records.remove(&face)
    }

    /// The `k`-th best candidate in forwarding order.
    #[inline]
    pub fn nth(&self, k: usize) -> Option<&CandidateRecord> {
        self.nth.get(k).and_then(|face| self.records.get(face))
    }

    /// Up to `k` best candidates in forwarding order.
    pub fn best_n(&self, k: usize) -> Vec<CandidateRecord> {
        self.nth
            .iter()
            .take(k)
            .filter_map(|face| self.records.get(face).copied())
            .collect()
    }

    pub fn iter_by_score(&self) -> impl Iterator<Item = &CandidateRecord> + '_ {
        self.nth.iter().filter_map(move |face| self.records.get(face))
    }

    pub fn by_status(&self) -> impl Iterator<Item = &CandidateRecord> + '_ {
        self.by_status
            .iter()
            .filter_map(move |(_, face)| self.records.get(face))
    }

    pub fn by_srtt(&self) -> impl Iterator<Item = &CandidateRecord> + '_ {
        self.by_srtt
            .iter()
            .filter_map(move |(_, face)| self.records.get(face))
    }

    pub fn by_pi(&self) -> impl Iterator<Item = &CandidateRecord> + '_ {
        self.by_pi
            .iter()
            .filter_map(move |(_, face)| self.records.get(face))
    }

    /// Freezes the current forwarding order.
    pub fn snapshot(&self) -> RankingSnapshot {
        RankingSnapshot {
            records: self.iter_by_score().copied().collect(),
        }
    }

    /// Index of the face holding `key`; the key must be present.
    fn position_of(&self, key: &ScoreKey) -> usize {
        match self.nth.binary_search_by(|face| self.key_of(face).cmp(key)) {
            Ok(pos) => pos,
            // Unreachable while the indexes are in sync.
            Err(_) => panic!("Ranking: positional index out of sync for {}", key.face),
        }
    }

    /// Insertion index for `key`; the key must not be in `nth` yet.
    fn position_for(&self, key: &ScoreKey) -> usize {
        self.nth
            .binary_search_by(|face| self.key_of(face).cmp(key))
            .unwrap_or_else(|pos| pos)
    }

    #[inline]
    fn key_of(&self, face: &FaceId) -> ScoreKey {
        match self.records.get(face) {
            Some(record) => record.score_key(),
            None => panic!("Ranking: {} indexed but not stored", face),
        }
    }
}

/// An immutable, cheaply clonable copy of a table's forwarding order.
///
/// Iteration is restartable and never observes later table mutations.
#[derive(Clone, Debug)]
pub struct RankingSnapshot {
    records: Arc<[CandidateRecord]>,
}

impl Default for RankingSnapshot {
    fn default() -> Self {
        Self {
            records: Arc::from(Vec::new()),
        }
    }
}

impl RankingSnapshot {
    pub fn iter(&self) -> core::slice::Iter<'_, CandidateRecord> {
        self.records.iter()
    }

    pub fn best_n(&self, k: usize) -> &[CandidateRecord] {
        &self.records[..k.min(self.records.len())]
    }

    pub fn nth(&self, k: usize) -> Option<&CandidateRecord> {
        self.records.get(k)
    }

    pub fn faces(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.records.iter().map(|r| r.face)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a RankingSnapshot {
    type Item = &'a CandidateRecord;
    type IntoIter = core::slice::Iter<'a, CandidateRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
