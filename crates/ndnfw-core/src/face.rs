use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use ndnfw_dsa::FaceId;
use tokio::sync::mpsc;

use crate::limits::FaceLimits;
use crate::pit::Interest;

/// Link-level send path of a face. Sending is fire-and-forget.
pub trait FaceTransport: Send + Sync {
    fn send(&self, face: FaceId, interest: &Interest);
}

/// Hands outgoing interests to an async consumer (e.g. a socket task).
pub struct ChannelTransport {
    tx: mpsc::UnboundedSender<(FaceId, Interest)>,
}

impl ChannelTransport {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<(FaceId, Interest)>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl FaceTransport for ChannelTransport {
    fn send(&self, face: FaceId, interest: &Interest) {
        if self.tx.send((face, interest.clone())).is_err() {
            tracing::warn!("ChannelTransport: receiver gone, dropping {} on {}", interest.name, face);
        }
    }
}

/// Discards everything. Useful for faces that only take part in ranking.
pub struct NullTransport;

impl FaceTransport for NullTransport {
    fn send(&self, _face: FaceId, _interest: &Interest) {}
}

/// An outbound interface: identity, outstanding budget and send path.
pub struct Face {
    id: FaceId,
    limits: FaceLimits,
    transport: Arc<dyn FaceTransport>,
    sent: AtomicU64,
}

impl fmt::Debug for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Face")
            .field("id", &self.id)
            .field("limits", &self.limits)
            .field("sent", &self.sent.load(Ordering::Relaxed))
            .finish()
    }
}

impl Face {
    pub fn new(id: FaceId, max_outstanding: usize, transport: Arc<dyn FaceTransport>) -> Self {
        Self {
            id,
            limits: FaceLimits::new(max_outstanding),
            transport,
            sent: AtomicU64::new(0),
        }
    }

    pub fn id(&self) -> FaceId {
        self.id
    }

    pub fn limits(&self) -> &FaceLimits {
        &self.limits
    }

    pub fn send(&self, interest: &Interest) {
        self.sent.fetch_add(1, Ordering::Relaxed);
        self.transport.send(self.id, interest);
    }

    /// Interests handed to the transport so far.
    pub fn sent_count(&self) -> u64 {
        self.sent.load(Ordering::Relaxed)
    }
}

impl PartialEq for Face {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Face {}

/// Registered faces by identity.
#[derive(Default)]
pub struct FaceTable {
    faces: RwLock<BTreeMap<FaceId, Arc<Face>>>,
}

impl FaceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `face`, replacing any face with the same identity.
    pub fn insert(&self, face: Arc<Face>) -> Option<Arc<Face>> {
        let mut faces = self.faces.write().unwrap_or_else(|e| e.into_inner());
        faces.insert(face.id(), face)
    }

    pub fn get(&self, id: FaceId) -> Option<Arc<Face>> {
        let faces = self.faces.read().unwrap_or_else(|e| e.into_inner());
        faces.get(&id).cloned()
    }

    pub fn remove(&self, id: FaceId) -> Option<Arc<Face>> {
        let mut faces = self.faces.write().unwrap_or_else(|e| e.into_inner());
        faces.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.faces.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
