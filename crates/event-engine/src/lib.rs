//! Event Reconciliation Engine
//!
//! Turns raw trigger snapshots into a ranked list of display-ready events:
//! normalization, acknowledgment merging, and worst-and-oldest-first ranking.

mod error;
mod event;
mod fuzzy;
mod merger;
mod normalizer;
mod poller;
mod ranker;

pub use error::EngineError;
pub use event::{Event, NormalizedEvent, Severity};
pub use fuzzy::{bucket_rank, format_fuzzy, FuzzyDuration, FuzzyUnit};
pub use merger::{AckStatusMerger, MergeReport, Merged, UnacknowledgedSet};
pub use normalizer::{strip_hostname, EventNormalizer};
pub use poller::{EventPoller, EventSnapshot, PollSettings};
pub use ranker::EventRanker;
