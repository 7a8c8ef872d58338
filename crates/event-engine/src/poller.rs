//! Poll Cycle
//!
//! One cycle fetches the active triggers, fetches the unacknowledged subset
//! with the same filters, then normalizes, merges, and ranks. The second
//! fetch is skipped when only unacknowledged events are wanted.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use zabbix_protocol::{AlertBackend, TriggerQuery};

use crate::error::EngineError;
use crate::event::Event;
use crate::merger::{AckStatusMerger, MergeReport, UnacknowledgedSet};
use crate::normalizer::EventNormalizer;
use crate::ranker::EventRanker;

/// Lowest severity shown when nothing else is configured (Average)
pub const DEFAULT_MIN_SEVERITY: u8 = 2;

/// Filters applied to every poll cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollSettings {
    /// Lowest severity to fetch
    pub min_severity: u8,
    /// Leave out hosts in maintenance
    pub exclude_maintenance: bool,
    /// Fetch only unacknowledged triggers (skips the second query)
    pub hide_acknowledged: bool,
    /// Restrict to one host
    pub host_filter: Option<String>,
    /// Restrict to explicit severities
    pub priorities: Vec<u8>,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            min_severity: DEFAULT_MIN_SEVERITY,
            exclude_maintenance: false,
            hide_acknowledged: false,
            host_filter: None,
            priorities: Vec::new(),
        }
    }
}

impl PollSettings {
    /// Query for the first fetch of a cycle
    pub fn query(&self) -> TriggerQuery {
        TriggerQuery {
            min_severity: self.min_severity,
            exclude_maintenance: self.exclude_maintenance,
            only_unacknowledged: self.hide_acknowledged,
            host_filter: self.host_filter.clone(),
            priorities: self.priorities.clone(),
        }
    }
}

/// Ranked result of one cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSnapshot {
    /// Worst and oldest first
    pub events: Vec<Event>,
    /// Merge counts; default when the merge was bypassed
    pub report: MergeReport,
    /// Unix time ages were computed against
    pub taken_at: i64,
}

impl EventSnapshot {
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn unacknowledged_count(&self) -> usize {
        self.events.iter().filter(|e| !e.acknowledged).count()
    }
}

/// Runs poll cycles against a backend
pub struct EventPoller {
    settings: PollSettings,
    normalizer: EventNormalizer,
}

impl EventPoller {
    /// Create a poller with the given filters
    pub fn new(settings: PollSettings) -> Self {
        info!("Creating event poller with settings: {:?}", settings);
        Self {
            settings,
            normalizer: EventNormalizer::new(),
        }
    }

    pub fn settings(&self) -> &PollSettings {
        &self.settings
    }

    /// Run one cycle; `now` is the unix time ages are measured from
    pub async fn poll<B>(&self, backend: &B, now: i64) -> Result<EventSnapshot, EngineError>
    where
        B: AlertBackend + ?Sized,
    {
        let query = self.settings.query();
        let triggers = backend.fetch_active_triggers(&query).await?;
        let normalized = self.normalizer.normalize(&triggers, now);

        let (events, report) = if self.settings.hide_acknowledged {
            debug!("Only unacknowledged triggers requested, skipping merge");
            (
                AckStatusMerger::assume_unacknowledged(normalized),
                MergeReport::default(),
            )
        } else {
            let unacked_query = query.unacknowledged();
            let unacked = backend.fetch_active_triggers(&unacked_query).await?;
            let unacked = UnacknowledgedSet::from_triggers(unacked_query, &unacked);
            let merged = AckStatusMerger::merge(&query, normalized, &unacked)?;
            (merged.events, merged.report)
        };

        let events = EventRanker::rank(events);
        debug!("Poll cycle produced {} events", events.len());

        Ok(EventSnapshot {
            events,
            report,
            taken_at: now,
        })
    }
}
