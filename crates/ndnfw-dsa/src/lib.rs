#![no_std]
extern crate alloc;

pub mod name;
pub mod ranking;
pub mod trie;

pub use name::{Name, NameError};
pub use ranking::{
    CandidateRecord, FaceId, Normalized, Placement, RankingSnapshot, RankingTable, Scorer, Status,
    Telemetry,
};
pub use trie::NameTrie;
