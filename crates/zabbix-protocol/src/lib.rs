//! Zabbix JSON-RPC Protocol
//!
//! This crate provides the async client used to read active triggers from a
//! Zabbix server and to acknowledge their underlying events. The
//! [`AlertBackend`] trait is the seam the reconciliation engine and the
//! acknowledgment session depend on; [`ZabbixClient`] implements it over
//! HTTP and [`MockBackend`] implements it in memory.

mod backend;
mod client;
mod error;
mod event;
mod mock;
mod rpc;
mod trigger;

pub use backend::AlertBackend;
pub use client::{validate_server_url, ClientOptions, ZabbixClient};
pub use error::ApiError;
pub use event::AckEvent;
pub use mock::{BackendCall, MockBackend};
pub use rpc::{parse_response, RpcRequest};
pub use trigger::{EntityStatus, RawTrigger, TriggerQuery};

/// JSON-RPC method names used by this client
pub mod method {
    /// Exchange credentials for a session token
    pub const USER_LOGIN: &str = "user.login";
    /// Describe the user owning a session token
    pub const USER_CHECK_AUTHENTICATION: &str = "user.checkAuthentication";
    /// List triggers
    pub const TRIGGER_GET: &str = "trigger.get";
    /// List events
    pub const EVENT_GET: &str = "event.get";
    /// Acknowledge one or more events
    pub const EVENT_ACKNOWLEDGE: &str = "event.acknowledge";
}

/// Path of the JSON-RPC endpoint below a Zabbix frontend URL
pub const API_ENDPOINT: &str = "/api_jsonrpc.php";
