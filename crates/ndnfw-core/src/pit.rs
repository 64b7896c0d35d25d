use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use bytes::Bytes;
use ndnfw_dsa::{FaceId, Name};

use crate::face::Face;

/// A named data request.
#[derive(Debug, Clone, PartialEq)]
pub struct Interest {
    pub name: Name,
    pub nonce: u32,
    pub payload: Bytes,
}

impl Interest {
    pub fn new(name: Name, nonce: u32) -> Self {
        Self {
            name,
            nonce,
            payload: Bytes::new(),
        }
    }

    pub fn with_payload(mut self, payload: Bytes) -> Self {
        self.payload = payload;
        self
    }
}

/// Terminal event of a pending interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalOutcome {
    /// Data arrived on `via`.
    Satisfied { via: FaceId },
    TimedOut,
}

struct OutRecord {
    face: Arc<Face>,
    sent_at: Instant,
}

#[derive(Default)]
struct OutState {
    outgoing: Vec<OutRecord>,
    released: Option<TerminalOutcome>,
}

/// Bookkeeping for one interest awaiting data: where it came from and every
/// face it has been admitted onto.
///
/// Outgoing records hold the face itself, so a face withdrawn while the
/// interest is in flight still gets its budget back on release.
pub struct PendingEntry {
    interest: Interest,
    incoming: FaceId,
    state: Mutex<OutState>,
}

impl PendingEntry {
    pub fn new(interest: Interest, incoming: FaceId) -> Self {
        Self {
            interest,
            incoming,
            state: Mutex::new(OutState::default()),
        }
    }

    pub fn interest(&self) -> &Interest {
        &self.interest
    }

    pub fn name(&self) -> &Name {
        &self.interest.name
    }

    pub fn incoming_face(&self) -> FaceId {
        self.incoming
    }

    /// Locks the outgoing set. Admission and release both go through this
    /// guard, which is what makes release exactly-once.
    pub fn outgoing(&self) -> OutgoingSet<'_> {
        OutgoingSet {
            state: self.state.lock().unwrap_or_else(|e| e.into_inner()),
        }
    }

    pub fn outgoing_faces(&self) -> Vec<FaceId> {
        self.outgoing().faces().collect()
    }

    pub fn contains_outgoing(&self, face: FaceId) -> bool {
        self.outgoing().contains(face)
    }

    pub fn sent_at(&self, face: FaceId) -> Option<Instant> {
        self.outgoing().sent_at(face)
    }

    pub fn is_released(&self) -> bool {
        self.outgoing().is_released()
    }

    pub fn terminal_outcome(&self) -> Option<TerminalOutcome> {
        self.outgoing().state.released
    }
}

/// Exclusive view of a pending entry's outgoing set.
pub struct OutgoingSet<'a> {
    state: MutexGuard<'a, OutState>,
}

impl OutgoingSet<'_> {
    pub fn contains(&self, face: FaceId) -> bool {
        self.state.outgoing.iter().any(|r| r.face.id() == face)
    }

    pub fn is_released(&self) -> bool {
        self.state.released.is_some()
    }

    pub fn faces(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.state.outgoing.iter().map(|r| r.face.id())
    }

    pub fn len(&self) -> usize {
        self.state.outgoing.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.outgoing.is_empty()
    }

    pub fn sent_at(&self, face: FaceId) -> Option<Instant> {
        self.state
            .outgoing
            .iter()
            .find(|r| r.face.id() == face)
            .map(|r| r.sent_at)
    }

    /// Records `face` as attempted. Returns `false` if it already was or the
    /// entry has been released.
    pub fn insert(&mut self, face: Arc<Face>) -> bool {
        if self.is_released() || self.contains(face.id()) {
            return false;
        }
        self.state.outgoing.push(OutRecord {
            face,
            sent_at: Instant::now(),
        });
        true
    }

    /// Marks the entry released and hands back every attempted face.
    /// Returns `None` if it was already released.
    pub fn release(&mut self, outcome: TerminalOutcome) -> Option<Vec<Arc<Face>>> {
        if self.is_released() {
            return None;
        }
        self.state.released = Some(outcome);
        Some(self.state.outgoing.iter().map(|r| Arc::clone(&r.face)).collect())
    }
}
