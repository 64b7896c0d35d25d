use ndnfw_core::{EventBus, FaceTable, ForwarderEvent, PendingEntry};
use ndnfw_dsa::{FaceId, RankingSnapshot, Status};

use crate::limiter::Admission;
use crate::policy::ForwardingPolicy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardOutcome {
    Forwarded(FaceId),
    /// Every candidate was skipped or over budget. Not an error; the caller
    /// decides whether to retry later.
    NotForwarded,
}

impl ForwardOutcome {
    pub fn face(self) -> Option<FaceId> {
        match self {
            ForwardOutcome::Forwarded(face) => Some(face),
            ForwardOutcome::NotForwarded => None,
        }
    }
}

/// Walks one ranking in score order and sends on the first admissible face.
///
/// One call makes at most one send. Retransmissions call it again; faces
/// already in the outgoing set are then skipped.
pub struct DecisionLoop<'a> {
    policy: &'a ForwardingPolicy,
    faces: &'a FaceTable,
    events: Option<&'a EventBus>,
}

impl<'a> DecisionLoop<'a> {
    pub fn new(policy: &'a ForwardingPolicy, faces: &'a FaceTable) -> Self {
        Self {
            policy,
            faces,
            events: None,
        }
    }

    pub fn with_events(mut self, events: &'a EventBus) -> Self {
        self.events = Some(events);
        self
    }

    pub fn decide(&self, entry: &PendingEntry, ranking: &RankingSnapshot) -> ForwardOutcome {
        let incoming = entry.incoming_face();

        for candidate in ranking {
            let id = candidate.face();
            if id == incoming {
                tracing::trace!("Decision: skip {} (incoming)", id);
                continue;
            }
            if self.policy.exclude_red && candidate.status() == Status::Red {
                tracing::trace!("Decision: skip {} (RED)", id);
                continue;
            }
            if entry.contains_outgoing(id) {
                tracing::trace!("Decision: skip {} (already sent)", id);
                continue;
            }
            let Some(face) = self.faces.get(id) else {
                tracing::debug!("Decision: {} ranked but not registered", id);
                continue;
            };

            match self.policy.admission.try_forward(&face, entry) {
                Admission::Sent => {
                    tracing::debug!("Decision: {} -> {} (score {:.3})", entry.name(), id, candidate.score());
                    self.publish(ForwarderEvent::InterestSent {
                        name: entry.name().clone(),
                        face: id,
                    });
                    return ForwardOutcome::Forwarded(id);
                }
                Admission::OverBudget | Admission::Duplicate => continue,
                Admission::Closed => break,
            }
        }

        tracing::debug!("Decision: {} not forwarded", entry.name());
        self.publish(ForwarderEvent::NotForwarded {
            name: entry.name().clone(),
        });
        ForwardOutcome::NotForwarded
    }

    fn publish(&self, event: ForwarderEvent) {
        if let Some(events) = self.events {
            events.publish(event);
        }
    }
}
