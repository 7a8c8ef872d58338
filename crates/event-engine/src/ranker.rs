//! Event Ranking

use std::cmp::Ordering;

use crate::event::Event;

/// Orders events worst and oldest first
pub struct EventRanker;

impl EventRanker {
    /// Sort by severity descending, then by last change ascending
    ///
    /// The sort is stable: events with equal keys keep their input order.
    pub fn rank(mut events: Vec<Event>) -> Vec<Event> {
        events.sort_by(Self::compare);
        events
    }

    /// Ranking order of two events
    pub fn compare(a: &Event, b: &Event) -> Ordering {
        b.severity
            .cmp(&a.severity)
            .then_with(|| a.occurred_at.cmp(&b.occurred_at))
    }
}
