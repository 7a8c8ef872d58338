//! In-Memory Backend
//!
//! Serves a fixed set of triggers without a Zabbix server and records every
//! call, for tests and offline runs.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};
use tracing::debug;

use crate::backend::AlertBackend;
use crate::error::ApiError;
use crate::event::AckEvent;
use crate::trigger::{RawTrigger, TriggerQuery};

/// Offset between a trigger id and the id of its mock event
pub const MOCK_EVENT_OFFSET: u64 = 100_000;

/// A call received by [`MockBackend`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Fetch(TriggerQuery),
    Resolve(u64),
    Acknowledge {
        event_id: u64,
        message: Option<String>,
    },
}

#[derive(Debug, Default)]
struct MockState {
    /// Trigger ids whose latest event is acknowledged
    acknowledged: HashSet<u64>,
    /// Acknowledged by someone else right after the next fetch
    acknowledged_after_fetch: Vec<u64>,
    calls: Vec<BackendCall>,
}

/// Backend answering from memory
#[derive(Debug, Default)]
pub struct MockBackend {
    triggers: Vec<RawTrigger>,
    /// Triggers `resolve_ack_event` reports as having no event
    without_event: HashSet<u64>,
    /// Event ids whose acknowledgment fails
    failing_acks: HashMap<u64, ApiError>,
    fetch_failure: Option<ApiError>,
    state: Mutex<MockState>,
}

impl MockBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a trigger whose latest event is unacknowledged
    pub fn with_trigger(self, trigger: RawTrigger) -> Self {
        self.with_trigger_acknowledged(trigger, false)
    }

    /// Add a trigger with an explicit acknowledgment state
    pub fn with_trigger_acknowledged(mut self, trigger: RawTrigger, acknowledged: bool) -> Self {
        if acknowledged {
            self.lock().acknowledged.insert(trigger.trigger_id);
        }
        self.triggers.push(trigger);
        self
    }

    /// Make `resolve_ack_event` find no event for this trigger
    pub fn without_event(mut self, trigger_id: u64) -> Self {
        self.without_event.insert(trigger_id);
        self
    }

    /// Make acknowledging this event fail
    pub fn with_failing_ack(mut self, event_id: u64, error: ApiError) -> Self {
        self.failing_acks.insert(event_id, error);
        self
    }

    /// Make every trigger fetch fail
    pub fn with_fetch_failure(mut self, error: ApiError) -> Self {
        self.fetch_failure = Some(error);
        self
    }

    /// Event id the mock assigns to a trigger's latest event
    pub fn event_id_for(trigger_id: u64) -> u64 {
        trigger_id + MOCK_EVENT_OFFSET
    }

    /// Every call received so far, oldest first
    pub fn calls(&self) -> Vec<BackendCall> {
        self.lock().calls.clone()
    }

    /// Only the acknowledgment calls
    pub fn acknowledge_calls(&self) -> Vec<(u64, Option<String>)> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::Acknowledge { event_id, message } => {
                    Some((*event_id, message.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// Have someone else acknowledge a trigger as soon as the next fetch returns
    pub fn with_external_ack_after_fetch(self, trigger_id: u64) -> Self {
        self.lock().acknowledged_after_fetch.push(trigger_id);
        self
    }

    /// Simulate someone else acknowledging a trigger
    pub fn acknowledge_externally(&self, trigger_id: u64) {
        debug!("Trigger {} acknowledged outside this client", trigger_id);
        self.lock().acknowledged.insert(trigger_id);
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn matches(trigger: &RawTrigger, query: &TriggerQuery, acknowledged: &HashSet<u64>) -> bool {
        trigger.priority >= query.min_severity
            && (query.priorities.is_empty() || query.priorities.contains(&trigger.priority))
            && query.host_filter.as_ref().map_or(true, |host| &trigger.host == host)
            && !(query.only_unacknowledged && acknowledged.contains(&trigger.trigger_id))
    }
}

#[async_trait]
impl AlertBackend for MockBackend {
    async fn fetch_active_triggers(
        &self,
        query: &TriggerQuery,
    ) -> Result<Vec<RawTrigger>, ApiError> {
        let mut state = self.lock();
        state.calls.push(BackendCall::Fetch(query.clone()));

        if let Some(error) = &self.fetch_failure {
            return Err(error.clone());
        }

        let triggers: Vec<RawTrigger> = self
            .triggers
            .iter()
            .filter(|t| Self::matches(t, query, &state.acknowledged))
            .cloned()
            .collect();
        debug!("Mock backend returning {} triggers", triggers.len());

        let late = std::mem::take(&mut state.acknowledged_after_fetch);
        state.acknowledged.extend(late);
        Ok(triggers)
    }

    async fn resolve_ack_event(&self, trigger_id: u64) -> Result<Option<AckEvent>, ApiError> {
        let mut state = self.lock();
        state.calls.push(BackendCall::Resolve(trigger_id));

        if self.without_event.contains(&trigger_id)
            || !self.triggers.iter().any(|t| t.trigger_id == trigger_id)
        {
            return Ok(None);
        }

        Ok(Some(AckEvent {
            event_id: Self::event_id_for(trigger_id),
            acknowledged: state.acknowledged.contains(&trigger_id),
        }))
    }

    async fn acknowledge_event(
        &self,
        event_id: u64,
        message: Option<&str>,
    ) -> Result<Vec<u64>, ApiError> {
        let mut state = self.lock();
        state.calls.push(BackendCall::Acknowledge {
            event_id,
            message: message.map(str::to_string),
        });

        if let Some(error) = self.failing_acks.get(&event_id) {
            return Err(error.clone());
        }

        if let Some(trigger_id) = event_id.checked_sub(MOCK_EVENT_OFFSET) {
            state.acknowledged.insert(trigger_id);
        }
        Ok(vec![event_id])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> MockBackend {
        MockBackend::new()
            .with_trigger(RawTrigger::new(1, 100, 5, "db01", "Disk full"))
            .with_trigger_acknowledged(RawTrigger::new(2, 200, 3, "web02", "Load high"), true)
            .with_trigger(RawTrigger::new(3, 300, 2, "web02", "Ping slow"))
    }

    #[tokio::test]
    async fn test_fetch_applies_filters() {
        let backend = backend();

        let all = backend
            .fetch_active_triggers(&TriggerQuery::active(2))
            .await
            .unwrap();
        assert_eq!(all.len(), 3);

        let unacked = backend
            .fetch_active_triggers(&TriggerQuery::active(2).unacknowledged())
            .await
            .unwrap();
        let ids: Vec<u64> = unacked.iter().map(|t| t.trigger_id).collect();
        assert_eq!(ids, vec![1, 3]);

        let severe = backend
            .fetch_active_triggers(&TriggerQuery::active(4))
            .await
            .unwrap();
        assert_eq!(severe.len(), 1);
    }

    #[tokio::test]
    async fn test_acknowledge_updates_state() {
        let backend = backend();
        let event = backend.resolve_ack_event(3).await.unwrap().unwrap();
        assert!(!event.acknowledged);

        backend.acknowledge_event(event.event_id, None).await.unwrap();

        let event = backend.resolve_ack_event(3).await.unwrap().unwrap();
        assert!(event.acknowledged);
        assert_eq!(backend.acknowledge_calls(), vec![(event.event_id, None)]);
    }

    #[tokio::test]
    async fn test_failures() {
        let error = ApiError::Transport("connection refused".to_string());
        let backend = backend()
            .with_failing_ack(MockBackend::event_id_for(1), error.clone())
            .without_event(3);

        assert_eq!(
            backend.acknowledge_event(MockBackend::event_id_for(1), None).await,
            Err(error.clone())
        );
        assert_eq!(backend.resolve_ack_event(3).await.unwrap(), None);

        let backend = backend.with_fetch_failure(error.clone());
        assert_eq!(
            backend.fetch_active_triggers(&TriggerQuery::active(2)).await,
            Err(error)
        );
    }
}
