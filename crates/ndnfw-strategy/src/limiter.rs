//! # ndnfw-strategy: Admission Control
//!
//! Per (request, face) the state machine is `untried -> sent -> {satisfied | timed out}`.
//! The pending entry's outgoing lock is held across the duplicate check, the
//! budget CAS and the insert, so a cancellation racing an in-flight attempt
//! either sees the face (and releases it) or the attempt sees the released
//! flag (and never takes budget).

use std::sync::Arc;

use ndnfw_core::{Face, PendingEntry, TerminalOutcome};
use ndnfw_dsa::FaceId;

/// Result of one forwarding attempt. Only `Sent` changes any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Sent,
    /// The face is at its outstanding limit.
    OverBudget,
    /// The face is already in the request's outgoing set.
    Duplicate,
    /// The request already reached a terminal event.
    Closed,
}

impl Admission {
    pub fn is_sent(self) -> bool {
        self == Admission::Sent
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Release {
    /// Budget returned to each listed face, once.
    Released(Vec<FaceId>),
    AlreadyReleased,
}

pub trait AdmissionPolicy: Send + Sync {
    fn try_forward(&self, face: &Arc<Face>, entry: &PendingEntry) -> Admission;

    /// Must be called once per terminal event. Later calls return
    /// [`Release::AlreadyReleased`] and touch nothing.
    fn release(&self, entry: &PendingEntry, outcome: TerminalOutcome) -> Release;
}

/// Gates sends on each face's outstanding budget.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutstandingLimiter;

impl AdmissionPolicy for OutstandingLimiter {
    fn try_forward(&self, face: &Arc<Face>, entry: &PendingEntry) -> Admission {
        let mut outgoing = entry.outgoing();
        if outgoing.is_released() {
            return Admission::Closed;
        }
        if outgoing.contains(face.id()) {
            return Admission::Duplicate;
        }
        if !face.limits().try_increment_outstanding() {
            tracing::debug!(
                "Limiter: {} over budget ({}/{}) for {}",
                face.id(),
                face.limits().outstanding(),
                face.limits().max_outstanding(),
                entry.name()
            );
            return Admission::OverBudget;
        }
        outgoing.insert(Arc::clone(face));
        drop(outgoing);

        face.send(entry.interest());
        Admission::Sent
    }

    fn release(&self, entry: &PendingEntry, outcome: TerminalOutcome) -> Release {
        let Some(faces) = entry.outgoing().release(outcome) else {
            tracing::debug!("Limiter: {} already released", entry.name());
            return Release::AlreadyReleased;
        };
        for face in &faces {
            face.limits().decrement_outstanding();
        }
        Release::Released(faces.iter().map(|f| f.id()).collect())
    }
}

/// Duplicate suppression only; budgets are neither checked nor charged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unlimited;

impl AdmissionPolicy for Unlimited {
    fn try_forward(&self, face: &Arc<Face>, entry: &PendingEntry) -> Admission {
        let mut outgoing = entry.outgoing();
        if outgoing.is_released() {
            return Admission::Closed;
        }
        if !outgoing.insert(Arc::clone(face)) {
            return Admission::Duplicate;
        }
        drop(outgoing);

        face.send(entry.interest());
        Admission::Sent
    }

    fn release(&self, entry: &PendingEntry, outcome: TerminalOutcome) -> Release {
        match entry.outgoing().release(outcome) {
            Some(faces) => Release::Released(faces.iter().map(|f| f.id()).collect()),
            None => Release::AlreadyReleased,
        }
    }
}
