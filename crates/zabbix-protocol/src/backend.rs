//! Backend Seam

use async_trait::async_trait;

use crate::error::ApiError;
use crate::event::AckEvent;
use crate::trigger::{RawTrigger, TriggerQuery};

/// Read/write alerting operations the monitor depends on
///
/// Implementations must already hold a valid session; a missing token is
/// reported as [`ApiError::NotAuthorised`] before any I/O.
#[async_trait]
pub trait AlertBackend: Send + Sync {
    /// List active triggers matching `query`
    async fn fetch_active_triggers(&self, query: &TriggerQuery)
        -> Result<Vec<RawTrigger>, ApiError>;

    /// Resolve a trigger to its latest event record, if it has one
    async fn resolve_ack_event(&self, trigger_id: u64) -> Result<Option<AckEvent>, ApiError>;

    /// Acknowledge one event; `None` lets the backend pick the message
    ///
    /// Returns the event ids the backend reports as acknowledged.
    async fn acknowledge_event(
        &self,
        event_id: u64,
        message: Option<&str>,
    ) -> Result<Vec<u64>, ApiError>;
}
