pub mod config;
pub mod error;
pub mod events;
pub mod face;
pub mod limits;
pub mod pit;
pub mod registry;
pub mod route;

pub use config::{DecisionConfig, FaceConfig, ForwarderConfig, NextHopConfig, RouteConfig, RttConfig, ScoringConfig};
pub use error::FwError;
pub use events::{EventBus, ForwarderEvent};
pub use face::{ChannelTransport, Face, FaceTable, FaceTransport, NullTransport};
pub use limits::FaceLimits;
pub use pit::{Interest, OutgoingSet, PendingEntry, TerminalOutcome};
pub use registry::RouteRegistry;
pub use route::RouteEntry;

pub use ndnfw_dsa::{
    CandidateRecord, FaceId, Name, Normalized, Placement, RankingSnapshot, RankingTable, Status, Telemetry,
};
