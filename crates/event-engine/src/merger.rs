//! Acknowledgment Reconciliation
//!
//! Zabbix is asked twice per cycle: once for every active trigger and once
//! for the active triggers whose last event is unacknowledged. An event is
//! acknowledged exactly when it appears in the first snapshot but not in the
//! second.
//!
//! The two queries are not atomic. Someone acknowledging between them shows
//! up as a transient inconsistency that the next cycle corrects.

use std::collections::HashSet;
use tracing::{debug, warn};
use zabbix_protocol::{RawTrigger, TriggerQuery};

use crate::error::EngineError;
use crate::event::{Event, NormalizedEvent};

/// Trigger ids returned by the "unacknowledged" query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnacknowledgedSet {
    query: TriggerQuery,
    ids: HashSet<u64>,
}

impl UnacknowledgedSet {
    /// Wrap ids fetched with `query`
    pub fn new(query: TriggerQuery, ids: impl IntoIterator<Item = u64>) -> Self {
        Self {
            query,
            ids: ids.into_iter().collect(),
        }
    }

    /// Collect ids from a fetched snapshot, skipping disabled triggers the
    /// normalizer would drop anyway
    pub fn from_triggers(query: TriggerQuery, triggers: &[RawTrigger]) -> Self {
        Self::new(
            query,
            triggers
                .iter()
                .filter(|t| !t.is_disabled())
                .map(|t| t.trigger_id),
        )
    }

    pub fn query(&self) -> &TriggerQuery {
        &self.query
    }

    pub fn contains(&self, id: u64) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Counts from one merge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    pub acknowledged: usize,
    pub unacknowledged: usize,
    /// Ids only the "unacknowledged" snapshot contained, sorted
    pub orphaned: Vec<u64>,
}

/// Merge output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merged {
    pub events: Vec<Event>,
    pub report: MergeReport,
}

/// Computes the `acknowledged` flag of every event
pub struct AckStatusMerger;

impl AckStatusMerger {
    /// Set-difference merge of the "all active" events against the
    /// "unacknowledged" ids
    ///
    /// `all_query` is the query the events were fetched with. It must match
    /// the unacknowledged set's query in every filter, and only the latter
    /// may be restricted to unacknowledged triggers.
    pub fn merge(
        all_query: &TriggerQuery,
        events: Vec<NormalizedEvent>,
        unacknowledged: &UnacknowledgedSet,
    ) -> Result<Merged, EngineError> {
        let unacked_query = unacknowledged.query();
        if all_query.only_unacknowledged
            || !unacked_query.only_unacknowledged
            || !all_query.same_filters(unacked_query)
        {
            return Err(EngineError::QueryMismatch {
                all: all_query.clone(),
                unacknowledged: unacked_query.clone(),
            });
        }

        let mut report = MergeReport::default();
        let mut seen = HashSet::with_capacity(events.len());

        let events: Vec<Event> = events
            .into_iter()
            .map(|event| {
                seen.insert(event.id);
                let acknowledged = !unacknowledged.contains(event.id);
                if acknowledged {
                    report.acknowledged += 1;
                } else {
                    report.unacknowledged += 1;
                }
                event.into_event(acknowledged)
            })
            .collect();

        let mut orphaned: Vec<u64> = unacknowledged
            .ids
            .iter()
            .copied()
            .filter(|id| !seen.contains(id))
            .collect();
        orphaned.sort_unstable();

        if !orphaned.is_empty() {
            warn!(
                "{} unacknowledged triggers missing from the active snapshot: {:?}",
                orphaned.len(),
                orphaned
            );
        }
        report.orphaned = orphaned;

        debug!(
            "Merged {} events ({} acknowledged)",
            events.len(),
            report.acknowledged
        );
        Ok(Merged { events, report })
    }

    /// Bypass for cycles that only fetched unacknowledged triggers
    pub fn assume_unacknowledged(events: Vec<NormalizedEvent>) -> Vec<Event> {
        events
            .into_iter()
            .map(|event| event.into_event(false))
            .collect()
    }
}
