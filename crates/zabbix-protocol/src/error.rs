//! Zabbix API Error Types

use thiserror::Error;

/// Errors that can occur while talking to the Zabbix API
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// A call other than `user.login` was attempted without a session token
    #[error("Not authorised: no session token available for {method}")]
    NotAuthorised { method: String },

    /// The configured server URL cannot be used
    #[error("Invalid server URL '{0}'")]
    InvalidUrl(String),

    /// Connection, DNS, timeout, or non-200 HTTP failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Well-formed response carrying an error envelope
    #[error("Backend error {code}: {message} ({data})")]
    Backend {
        code: i64,
        message: String,
        data: String,
    },

    /// Response body could not be decoded
    #[error("Malformed response: {0}")]
    Decode(String),
}

impl ApiError {
    /// Whether this failure was detected before any network I/O
    pub fn is_precondition(&self) -> bool {
        matches!(self, ApiError::NotAuthorised { .. } | ApiError::InvalidUrl(_))
    }

    /// Whether this failure came from the transport layer
    pub fn is_transport(&self) -> bool {
        matches!(self, ApiError::Transport(_))
    }

    /// Whether the server refused the session token (expired or logged out)
    pub fn is_session_rejected(&self) -> bool {
        match self {
            ApiError::Backend { data, .. } => {
                let data = data.to_ascii_lowercase();
                data.contains("re-login")
                    || data.contains("not authorised")
                    || data.contains("not authorized")
            }
            _ => false,
        }
    }
}


impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}
