//! Engine Error Types

use thiserror::Error;
use zabbix_protocol::{ApiError, TriggerQuery};

/// Errors that end a poll cycle
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A backend call failed
    #[error("Backend request failed: {0}")]
    Backend(#[from] ApiError),

    /// The two snapshots of a merge were fetched with different filters
    #[error("Snapshot queries differ beyond acknowledgment: {all:?} vs {unacknowledged:?}")]
    QueryMismatch {
        all: TriggerQuery,
        unacknowledged: TriggerQuery,
    },
}

impl EngineError {
    /// Whether the cycle failed before any network I/O
    pub fn is_precondition(&self) -> bool {
        matches!(self, EngineError::Backend(err) if err.is_precondition())
    }

    /// Whether a later cycle may succeed without operator action
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::Backend(err) if err.is_transport())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        let transport = EngineError::from(ApiError::Transport("timed out".to_string()));
        assert!(transport.is_transient());
        assert!(!transport.is_precondition());

        let unauthorised = EngineError::from(ApiError::NotAuthorised {
            method: "trigger.get".to_string(),
        });
        assert!(unauthorised.is_precondition());
        assert!(!unauthorised.is_transient());

        let mismatch = EngineError::QueryMismatch {
            all: TriggerQuery::active(2),
            unacknowledged: TriggerQuery::active(3).unacknowledged(),
        };
        assert!(!mismatch.is_transient());
    }
}
