//! Trigger Normalization
//!
//! Converts raw `trigger.get` records into [`NormalizedEvent`]s: triggers on
//! disabled hosts or items are dropped, ages are bucketed, and descriptions
//! lose their redundant "on <host>" suffixes.

use regex::Regex;
use std::collections::HashMap;
use tracing::{debug, warn};
use zabbix_protocol::RawTrigger;

use crate::event::{NormalizedEvent, Severity};
use crate::fuzzy::format_fuzzy;

/// Stateless normalizer for one trigger snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct EventNormalizer;

impl EventNormalizer {
    /// Create a new normalizer
    pub fn new() -> Self {
        Self
    }

    /// Normalize a snapshot taken at unix time `now`
    ///
    /// Output order follows input order.
    pub fn normalize(&self, triggers: &[RawTrigger], now: i64) -> Vec<NormalizedEvent> {
        let mut patterns: HashMap<&str, Option<Regex>> = HashMap::new();
        let mut dropped = 0usize;
        let mut events = Vec::with_capacity(triggers.len());

        for trigger in triggers {
            if trigger.is_disabled() {
                dropped += 1;
                continue;
            }

            let pattern = patterns
                .entry(trigger.host.as_str())
                .or_insert_with(|| hostname_pattern(&trigger.host));
            let description = match pattern {
                Some(pattern) => pattern.replace_all(&trigger.description, "").into_owned(),
                None => trigger.description.clone(),
            };

            events.push(NormalizedEvent {
                id: trigger.trigger_id,
                occurred_at: trigger.last_change,
                age: format_fuzzy(now.saturating_sub(trigger.last_change)),
                severity: Severity::new(trigger.priority),
                hostname: trigger.host.clone(),
                description,
            });
        }

        if dropped > 0 {
            debug!("Dropped {} triggers on disabled hosts or items", dropped);
        }
        events
    }
}

/// Pattern matching " on <host>", " on server <host>", " to <host>", and
/// " <host>"
///
/// `None` for an empty hostname, which would otherwise match every space.
fn hostname_pattern(hostname: &str) -> Option<Regex> {
    if hostname.is_empty() {
        return None;
    }

    let pattern = format!(" (?:on(?: server)? |to )?{}", regex::escape(hostname));
    match Regex::new(&pattern) {
        Ok(regex) => Some(regex),
        Err(e) => {
            warn!("Cannot build hostname pattern for '{}': {}", hostname, e);
            None
        }
    }
}

/// Remove self-references to `hostname` from a trigger description
pub fn strip_hostname(description: &str, hostname: &str) -> String {
    match hostname_pattern(hostname) {
        Some(pattern) => pattern.replace_all(description, "").into_owned(),
        None => description.to_string(),
    }
}
