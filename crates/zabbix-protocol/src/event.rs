//! Event Records Behind Triggers

use serde::Deserialize;
use serde_json::{json, Value};

use crate::rpc::Scalar;

/// Latest event recorded for a trigger, as far as acknowledgment goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "EventWire")]
pub struct AckEvent {
    /// Identifier to pass to `event.acknowledge`
    pub event_id: u64,
    /// Whether someone already acknowledged the event
    pub acknowledged: bool,
}

#[derive(Debug, Deserialize)]
struct EventWire {
    eventid: Scalar,
    #[serde(default)]
    acknowledged: Option<Scalar>,
}

impl TryFrom<EventWire> for AckEvent {
    type Error = String;

    fn try_from(wire: EventWire) -> Result<Self, Self::Error> {
        let acknowledged = match wire.acknowledged {
            Some(flag) => flag.to_i64("acknowledged")? == 1,
            None => false,
        };
        Ok(Self {
            event_id: wire.eventid.to_u64("eventid")?,
            acknowledged,
        })
    }
}

/// `event.get` params selecting the newest event of one trigger
pub(crate) fn latest_event_params(trigger_id: u64) -> Value {
    json!({
        "output": "extend",
        "objectids": trigger_id.to_string(),
        "sortfield": ["clock", "eventid"],
        "sortorder": "DESC",
        "limit": 1,
    })
}

/// `event.acknowledge` params
pub(crate) fn acknowledge_params(event_id: u64, message: &str) -> Value {
    json!({
        "eventids": event_id.to_string(),
        "message": message,
    })
}

#[derive(Debug, Deserialize)]
pub(crate) struct AcknowledgeResult {
    #[serde(default)]
    eventids: Vec<Scalar>,
}

impl AcknowledgeResult {
    pub(crate) fn event_ids(&self) -> Result<Vec<u64>, String> {
        self.eventids.iter().map(|id| id.to_u64("eventids")).collect()
    }
}
