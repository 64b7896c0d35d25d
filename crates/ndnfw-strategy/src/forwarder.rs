//! # ndnfw-strategy: Forwarder
//!
//! The facade a request-processing pipeline drives. It owns the face table,
//! the FIB and the event bus, and routes the three inbound entry points:
//!
//! - `on_telemetry_update`: probing results into the Score Engine.
//! - `decide`: one forwarding opportunity through the Decision Loop.
//! - `on_request_terminal`: satisfied / timed out into the Limiter's release.

use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use ndnfw_core::{
    EventBus, Face, FaceTable, FaceTransport, ForwarderConfig, ForwarderEvent, FwError, PendingEntry, RouteEntry,
    RouteRegistry, TerminalOutcome,
};
use ndnfw_dsa::{CandidateRecord, FaceId, Name, Placement, RankingSnapshot, Telemetry};
use tokio::sync::broadcast;

use crate::decision::{DecisionLoop, ForwardOutcome};
use crate::limiter::Release;
use crate::policy::ForwardingPolicy;
use crate::score::{Applied, ScoreEngine, TelemetrySample};

pub struct Forwarder {
    config: ForwarderConfig,
    policy: ForwardingPolicy,
    engine: ScoreEngine,
    faces: FaceTable,
    routes: RwLock<RouteRegistry>,
    events: EventBus,
}

impl Forwarder {
    /// An empty forwarder: no faces, no routes.
    pub fn new(config: ForwarderConfig) -> Result<Self, FwError> {
        config.validate()?;
        let policy = ForwardingPolicy::from_config(&config);
        let engine = policy.score_engine();
        let events = EventBus::new(config.event_capacity);
        Ok(Self {
            config,
            policy,
            engine,
            faces: FaceTable::new(),
            routes: RwLock::new(RouteRegistry::new()),
            events,
        })
    }

    /// Creates every face and route declared in `config`. All faces share
    /// `transport`.
    pub fn from_config(config: ForwarderConfig, transport: Arc<dyn FaceTransport>) -> Result<Self, FwError> {
        let forwarder = Self::new(config)?;

        for face in &forwarder.config.faces {
            forwarder.add_face(face.id, Arc::clone(&transport));
        }
        for route in &forwarder.config.routes {
            let prefix = Name::parse(&route.prefix).map_err(|_| FwError::InvalidName(route.prefix.clone()))?;
            forwarder.register_route(&prefix);
            for hop in &route.nexthops {
                forwarder.add_next_hop(&prefix, hop.face, hop.cost)?;
            }
        }

        tracing::info!(
            "Forwarder: bootstrapped {} faces, {} routes",
            forwarder.faces.len(),
            forwarder.read_routes().len()
        );
        Ok(forwarder)
    }

    /// Swaps the strategy components and rescores every route under the new
    /// scoring policy.
    pub fn with_policy(mut self, policy: ForwardingPolicy) -> Self {
        self.engine = policy.score_engine();
        self.policy = policy;
        for route in self.read_routes().routes() {
            route.update(|table| table.recompute_all(&self.engine));
        }
        self
    }

    pub fn config(&self) -> &ForwarderConfig {
        &self.config
    }

    pub fn policy(&self) -> &ForwardingPolicy {
        &self.policy
    }

    pub fn engine(&self) -> &ScoreEngine {
        &self.engine
    }

    pub fn faces(&self) -> &FaceTable {
        &self.faces
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ForwarderEvent> {
        self.events.subscribe()
    }

    // ---- Faces ----

    /// Registers a face with the budget configured for `id`.
    pub fn add_face(&self, id: FaceId, transport: Arc<dyn FaceTransport>) -> Arc<Face> {
        self.add_face_with_limit(id, self.config.max_outstanding_for(id), transport)
    }

    pub fn add_face_with_limit(
        &self,
        id: FaceId,
        max_outstanding: usize,
        transport: Arc<dyn FaceTransport>,
    ) -> Arc<Face> {
        let face = Arc::new(Face::new(id, max_outstanding, transport));
        if self.faces.insert(Arc::clone(&face)).is_some() {
            tracing::warn!("Forwarder: replaced existing {}", id);
        } else {
            tracing::info!("Forwarder: added {} (max_outstanding {})", id, max_outstanding);
        }
        face
    }

    pub fn face(&self, id: FaceId) -> Option<Arc<Face>> {
        self.faces.get(id)
    }

    /// Unregisters the face and withdraws it from every route. Interests
    /// already in flight on it still release its budget.
    pub fn remove_face(&self, id: FaceId) -> Option<Arc<Face>> {
        let face = self.faces.remove(id)?;
        for route in self.read_routes().routes() {
            if route.update(|table| table.remove(id)).is_some() {
                tracing::debug!("Forwarder: withdrew {} from {}", id, route.prefix());
            }
        }
        tracing::info!("Forwarder: removed {}", id);
        Some(face)
    }

    /// Changes the budget of a registered face. A limit below the face's
    /// current outstanding count is refused and the old limit stays.
    pub fn set_max_outstanding(&self, id: FaceId, max_outstanding: usize) -> Result<(), FwError> {
        let face = self.faces.get(id).ok_or(FwError::UnknownFace(id))?;
        if !face.limits().set_max_outstanding(max_outstanding) {
            let outstanding = face.limits().outstanding();
            tracing::warn!(
                "Forwarder: refused limit {} on {} ({} outstanding)",
                max_outstanding,
                id,
                outstanding
            );
            return Err(FwError::LimitBelowOutstanding { face: id, outstanding, requested: max_outstanding });
        }
        tracing::debug!("Forwarder: {} max_outstanding now {}", id, max_outstanding);
        Ok(())
    }

    // ---- Routes ----

    pub fn register_route(&self, prefix: &Name) -> Arc<RouteEntry> {
        self.write_routes().route(prefix)
    }

    pub fn unregister_route(&self, prefix: &Name) -> Option<Arc<RouteEntry>> {
        self.write_routes().unregister(prefix)
    }

    /// Longest-prefix match.
    pub fn route(&self, name: &Name) -> Option<Arc<RouteEntry>> {
        self.read_routes().lookup(name)
    }

    /// Attaches `face` as a next hop of `prefix`, creating the route if
    /// needed. A face that is already a next hop only has its cost updated.
    pub fn add_next_hop(&self, prefix: &Name, face: FaceId, cost: i32) -> Result<Placement, FwError> {
        self.ensure_registered(face)?;
        let route = self.register_route(prefix);
        let initial = self.config.initial_status;
        let placement = route.update(|table| -> Result<Placement, FwError> {
            self.ensure_registered(face)?;
            Ok(if table.contains(face) {
                table
                    .modify(face, |t| t.routing_cost = cost, &self.engine)
                    .unwrap_or(Placement::Stayed)
            } else {
                table.upsert(face, Telemetry::new(initial, Duration::ZERO, cost, 0.0), &self.engine)
            })
        })?;
        tracing::debug!("Forwarder: next hop {} on {} cost {} ({:?})", face, prefix, cost, placement);
        Ok(placement)
    }

    pub fn withdraw_next_hop(&self, prefix: &Name, face: FaceId) -> Option<CandidateRecord> {
        let route = self.read_routes().exact(prefix)?;
        route.update(|table| table.remove(face))
    }

    /// Inserts or overwrites the full telemetry of `face` on `prefix`.
    pub fn upsert(&self, prefix: &Name, face: FaceId, telemetry: Telemetry) -> Result<Placement, FwError> {
        self.ensure_registered(face)?;
        let route = self.register_route(prefix);
        route.update(|table| {
            self.ensure_registered(face)?;
            Ok(table.upsert(face, telemetry, &self.engine))
        })
    }

    // `remove_face` drops the face from the table before it takes any route
    // lock, so a check made under the route lock cannot miss a removal.
    fn ensure_registered(&self, face: FaceId) -> Result<(), FwError> {
        match self.faces.get(face) {
            Some(_) => Ok(()),
            None => Err(FwError::UnknownFace(face)),
        }
    }

    /// Current forwarding order of exactly `prefix`.
    pub fn ranking(&self, prefix: &Name) -> Option<RankingSnapshot> {
        Some(self.read_routes().exact(prefix)?.snapshot())
    }

    /// Up to `k` best candidates for `name` (longest-prefix match).
    pub fn best_n(&self, name: &Name, k: usize) -> Vec<CandidateRecord> {
        match self.route(name) {
            Some(route) => route.snapshot().best_n(k).to_vec(),
            None => Vec::new(),
        }
    }

    // ---- Entry points ----

    /// Feeds one telemetry sample for `face` on the route matching `name`.
    pub fn on_telemetry_update(
        &self,
        name: &Name,
        face: FaceId,
        sample: TelemetrySample,
    ) -> Result<Applied, FwError> {
        let route = self.route(name).ok_or_else(|| FwError::NoRoute(name.clone()))?;
        let applied = route
            .update(|table| self.engine.apply(table, face, sample))
            .ok_or(FwError::UnknownFace(face))?;

        if let Some((from, to)) = applied.status_change {
            tracing::info!("Forwarder: {} on {} {} -> {}", face, route.prefix(), from, to);
            self.events.publish(ForwarderEvent::StatusChanged {
                prefix: route.prefix().clone(),
                face,
                from,
                to,
            });
        }
        Ok(applied)
    }

    /// One forwarding opportunity for `entry`. A name with no route is simply
    /// not forwarded.
    pub fn decide(&self, entry: &PendingEntry) -> ForwardOutcome {
        let ranking = match self.route(entry.name()) {
            Some(route) => route.snapshot(),
            None => {
                tracing::debug!("Forwarder: no route for {}", entry.name());
                RankingSnapshot::default()
            }
        };
        DecisionLoop::new(&self.policy, &self.faces)
            .with_events(&self.events)
            .decide(entry, &ranking)
    }

    /// Releases the budget held by `entry`. Safe to call from both the data
    /// path and a timeout; only the first call has any effect.
    pub fn on_request_terminal(&self, entry: &PendingEntry, outcome: TerminalOutcome) -> Release {
        let release = self.policy.admission.release(entry, outcome);
        if let Release::Released(faces) = &release {
            for &face in faces {
                self.events.publish(ForwarderEvent::BudgetReleased {
                    name: entry.name().clone(),
                    face,
                    outcome,
                });
            }
            if let TerminalOutcome::Satisfied { via } = outcome {
                self.sample_rtt(entry, via);
            }
        }
        release
    }

    fn sample_rtt(&self, entry: &PendingEntry, via: FaceId) {
        let Some(sent_at) = entry.sent_at(via) else {
            return;
        };
        let rtt = Instant::now().saturating_duration_since(sent_at);
        if let Err(e) = self.on_telemetry_update(entry.name(), via, TelemetrySample::Rtt(rtt)) {
            tracing::debug!("Forwarder: dropped RTT sample for {}: {}", via, e);
        }
    }

    fn read_routes(&self) -> std::sync::RwLockReadGuard<'_, RouteRegistry> {
        self.routes.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_routes(&self) -> std::sync::RwLockWriteGuard<'_, RouteRegistry> {
        self.routes.write().unwrap_or_else(|e| e.into_inner())
    }
}

static_assertions::assert_impl_all!(Forwarder: Send, Sync);
