//! Session Outcomes and Errors

use thiserror::Error;
use zabbix_protocol::ApiError;

/// Why a session ended without acknowledging anything
///
/// These are expected outcomes, not failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    #[error("No unacknowledged alerts match '{0}'")]
    NoMatches(String),

    #[error("No input. Not acknowledging anything.")]
    EmptySelection,

    #[error("Invalid input '{0}'. Not acknowledging anything.")]
    InvalidSelection(String),

    #[error("Selection {index} is outside 1-{max}, please double check. Not acknowledging anything.")]
    IndexOutOfRange { index: String, max: usize },

    #[error("Input closed. Not acknowledging anything.")]
    InputClosed,
}

/// Fatal session errors
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid match pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("Backend error: {0}")]
    Backend(#[from] ApiError),

    #[error("Terminal I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Session already finished")]
    AlreadyFinished,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_abort_messages() {
        assert_eq!(
            AbortReason::EmptySelection.to_string(),
            "No input. Not acknowledging anything."
        );
        assert_eq!(
            AbortReason::IndexOutOfRange {
                index: "99".to_string(),
                max: 5
            }
            .to_string(),
            "Selection 99 is outside 1-5, please double check. Not acknowledging anything."
        );
    }

    #[test]
    fn test_backend_error_converts() {
        let err: SessionError = ApiError::Transport("timeout".to_string()).into();
        assert!(matches!(err, SessionError::Backend(ApiError::Transport(_))));
    }
}
