//! Event Model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Trigger severity code, higher is more urgent
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Severity(u8);

impl Severity {
    pub const AVERAGE: Severity = Severity(2);
    pub const WARNING: Severity = Severity(3);
    pub const HIGH: Severity = Severity(4);
    pub const DISASTER: Severity = Severity(5);

    /// Wrap a raw priority code
    pub fn new(code: u8) -> Self {
        Severity(code)
    }

    /// Raw priority code
    pub fn code(&self) -> u8 {
        self.0
    }

    /// Full label
    pub fn label(&self) -> &'static str {
        match self.0 {
            5 => "Disaster",
            4 => "High",
            3 => "Warning",
            2 => "Average",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A trigger after normalization, before its acknowledgment state is known
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    /// Trigger id
    pub id: u64,
    /// Unix time of the last state change
    pub occurred_at: i64,
    /// Fuzzy age at normalization time
    pub age: String,
    pub severity: Severity,
    pub hostname: String,
    /// Description with host self-references removed
    pub description: String,
}

impl NormalizedEvent {
    pub(crate) fn into_event(self, acknowledged: bool) -> Event {
        Event {
            id: self.id,
            occurred_at: self.occurred_at,
            age: self.age,
            severity: self.severity,
            hostname: self.hostname,
            description: self.description,
            acknowledged,
            ack_event_id: None,
        }
    }
}

/// A display-ready active trigger with its acknowledgment state
///
/// Rebuilt from scratch on every poll cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Trigger id, unique within one poll cycle
    pub id: u64,
    /// Unix time of the last state change
    pub occurred_at: i64,
    /// Fuzzy age at normalization time
    pub age: String,
    pub severity: Severity,
    pub hostname: String,
    pub description: String,
    pub acknowledged: bool,
    /// Event id to acknowledge, resolved only inside an acknowledgment session
    pub ack_event_id: Option<u64>,
}
