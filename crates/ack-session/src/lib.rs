//! Acknowledgment Session
//!
//! Interactive batch acknowledgment:
//! - Pattern filtering of ranked events
//! - Acknowledgment-event lookup per match
//! - Selection and message prompts over a line port
//! - One acknowledgment call per selected event

mod error;
mod port;
mod selection;
mod session;

pub use error::{AbortReason, SessionError};
pub use port::{LinePort, ScriptedPort};
pub use selection::parse_selection;
pub use session::{AckItem, AckReport, AckSession, Candidate, SessionOutcome, SessionState};
