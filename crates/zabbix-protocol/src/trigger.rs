//! Trigger Records and the `trigger.get` Query

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::rpc::Scalar;

/// Enabled/disabled flag Zabbix attaches to hosts and items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityStatus {
    /// Status `0`, or no status reported
    Enabled,
    /// Status `1`
    Disabled,
}

impl EntityStatus {
    fn from_code(code: i64) -> Self {
        if code == 1 {
            EntityStatus::Disabled
        } else {
            EntityStatus::Enabled
        }
    }
}

/// An active trigger as returned by `trigger.get`
///
/// Read-only input for the reconciliation engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "TriggerWire")]
pub struct RawTrigger {
    /// Trigger identifier
    pub trigger_id: u64,
    /// Unix time of the last state change
    pub last_change: i64,
    /// Severity code (0-5)
    pub priority: u8,
    /// Name of the host the trigger belongs to
    pub host: String,
    /// Status of that host
    pub host_status: EntityStatus,
    /// Status of the item the trigger evaluates
    pub item_status: EntityStatus,
    /// Description with macros already expanded by the server
    pub description: String,
}

impl RawTrigger {
    /// Create an enabled trigger
    pub fn new(
        trigger_id: u64,
        last_change: i64,
        priority: u8,
        host: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            trigger_id,
            last_change,
            priority,
            host: host.into(),
            host_status: EntityStatus::Enabled,
            item_status: EntityStatus::Enabled,
            description: description.into(),
        }
    }

    /// Set host and item status
    pub fn with_status(mut self, host_status: EntityStatus, item_status: EntityStatus) -> Self {
        self.host_status = host_status;
        self.item_status = item_status;
        self
    }

    /// Whether the host or the item behind this trigger is disabled
    pub fn is_disabled(&self) -> bool {
        self.host_status == EntityStatus::Disabled || self.item_status == EntityStatus::Disabled
    }
}

#[derive(Debug, Deserialize)]
struct HostWire {
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    status: Option<Scalar>,
}

#[derive(Debug, Deserialize)]
struct ItemWire {
    #[serde(default)]
    status: Option<Scalar>,
}

#[derive(Debug, Deserialize)]
struct TriggerWire {
    triggerid: Scalar,
    lastchange: Scalar,
    priority: Scalar,
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    hosts: Vec<HostWire>,
    #[serde(default)]
    items: Vec<ItemWire>,
    #[serde(default)]
    description: String,
}

fn status_of(status: Option<&Scalar>, field: &str) -> Result<EntityStatus, String> {
    match status {
        Some(status) => Ok(EntityStatus::from_code(status.to_i64(field)?)),
        None => Ok(EntityStatus::Enabled),
    }
}

impl TryFrom<TriggerWire> for RawTrigger {
    type Error = String;

    fn try_from(wire: TriggerWire) -> Result<Self, Self::Error> {
        let first_host = wire.hosts.first();
        let host = wire
            .host
            .or_else(|| first_host.and_then(|h| h.host.clone()))
            .unwrap_or_default();

        let priority = wire.priority.to_i64("priority")?;
        let priority =
            u8::try_from(priority).map_err(|_| format!("priority out of range: {}", priority))?;

        Ok(Self {
            trigger_id: wire.triggerid.to_u64("triggerid")?,
            last_change: wire.lastchange.to_i64("lastchange")?,
            priority,
            host,
            host_status: status_of(first_host.and_then(|h| h.status.as_ref()), "hosts.status")?,
            item_status: status_of(
                wire.items.first().and_then(|i| i.status.as_ref()),
                "items.status",
            )?,
            description: wire.description,
        })
    }
}

/// Filters for one `trigger.get` call
///
/// The "all active" and "unacknowledged" snapshots of a poll cycle must be
/// fetched with queries that differ only in `only_unacknowledged`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TriggerQuery {
    /// Lowest severity to return
    pub min_severity: u8,
    /// Leave out hosts currently in maintenance
    pub exclude_maintenance: bool,
    /// Return only triggers whose last event is unacknowledged
    pub only_unacknowledged: bool,
    /// Restrict to one host name
    pub host_filter: Option<String>,
    /// Restrict to these severities (empty = no restriction)
    pub priorities: Vec<u8>,
}

impl TriggerQuery {
    /// Query for every active trigger at or above `min_severity`
    pub fn active(min_severity: u8) -> Self {
        Self {
            min_severity,
            ..Default::default()
        }
    }

    /// The same query restricted to unacknowledged triggers
    pub fn unacknowledged(&self) -> Self {
        Self {
            only_unacknowledged: true,
            ..self.clone()
        }
    }

    /// Whether both queries use identical filters apart from acknowledgment
    pub fn same_filters(&self, other: &TriggerQuery) -> bool {
        self.min_severity == other.min_severity
            && self.exclude_maintenance == other.exclude_maintenance
            && self.host_filter == other.host_filter
            && self.priorities == other.priorities
    }

    /// Build the `trigger.get` params object
    pub fn to_params(&self) -> Value {
        let mut filter = json!({ "value": ["1"] });
        if !self.priorities.is_empty() {
            let priorities: Vec<String> = self.priorities.iter().map(|p| p.to_string()).collect();
            filter["priority"] = json!(priorities);
        }

        let mut params = json!({
            "output": "extend",
            "sortfield": ["priority", "lastchange"],
            "sortorder": "DESC",
            "templated": "0",
            "filter": filter,
            "expandData": "host",
            "expandDescription": "1",
            "min_severity": self.min_severity.to_string(),
            "selectHosts": ["host", "status"],
            "selectItems": ["status"],
        });

        if self.exclude_maintenance {
            params["maintenance"] = json!(false);
        }
        if self.only_unacknowledged {
            params["withLastEventUnacknowledged"] = json!("1");
        }
        if let Some(host) = &self.host_filter {
            params["host"] = json!(host);
        }

        params
    }
}
