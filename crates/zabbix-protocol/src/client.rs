//! Zabbix JSON-RPC Client
//!
//! Provides async HTTP communication with a Zabbix frontend.

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Url;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::backend::AlertBackend;
use crate::error::ApiError;
use crate::event::{acknowledge_params, latest_event_params, AckEvent, AcknowledgeResult};
use crate::method;
use crate::rpc::{parse_response, RpcRequest};
use crate::trigger::{RawTrigger, TriggerQuery};
use crate::API_ENDPOINT;

/// Default timeout for a single API call
const DEFAULT_TIMEOUT_SECS: u64 = 30;

const CONTENT_TYPE_JSON_RPC: &str = "application/json-rpc";

/// HTTP settings for [`ZabbixClient`]
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Per-request timeout
    pub timeout: Duration,
    /// Skip TLS certificate verification (self-signed frontends)
    pub accept_invalid_certs: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            accept_invalid_certs: false,
        }
    }
}

/// JSON-RPC client for one Zabbix server
pub struct ZabbixClient {
    /// Full endpoint URL, e.g. `https://zabbix.example.com/api_jsonrpc.php`
    server: Url,
    http: reqwest::Client,
    /// Session token returned by `user.login`
    token: Option<String>,
    next_id: AtomicU64,
    /// Display name of the logged-in user, fetched on first use
    full_name: OnceCell<String>,
}

impl ZabbixClient {
    /// Create a client for `server`
    ///
    /// The URL must be absolute and use `http` or `https`.
    pub fn new(server: &str, options: ClientOptions) -> Result<Self, ApiError> {
        let server = parse_server_url(server)?;

        let http = reqwest::Client::builder()
            .timeout(options.timeout)
            .danger_accept_invalid_certs(options.accept_invalid_certs)
            .build()?;

        info!("Creating Zabbix client for {}", server);
        if options.accept_invalid_certs {
            warn!("TLS certificate verification is disabled for {}", server);
        }

        Ok(Self {
            server,
            http,
            token: None,
            next_id: AtomicU64::new(1),
            full_name: OnceCell::new(),
        })
    }

    /// Attach an existing session token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.set_token(token);
        self
    }

    /// Replace the session token
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.token = Some(token.into());
        self.full_name = OnceCell::new();
    }

    /// Whether a session token is present
    pub fn has_token(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Endpoint URL
    pub fn server(&self) -> &Url {
        &self.server
    }

    /// Frontend URL a human would open in a browser
    pub fn frontend_url(&self) -> String {
        let url = self.server.as_str();
        url.strip_suffix(API_ENDPOINT).unwrap_or(url).to_string()
    }

    /// Issue one JSON-RPC call and return its `result`
    pub async fn call(&self, method: &str, params: Value) -> Result<Value, ApiError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = RpcRequest::new(method, params, id, self.token.as_deref())?;
        let body = serde_json::to_vec(&request)?;

        debug!("Sending {} (id {}) to {}", method, id, self.server);

        let response = self
            .http
            .post(self.server.clone())
            .header(CONTENT_TYPE, CONTENT_TYPE_JSON_RPC)
            .body(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await?;
        debug!("Received HTTP {} for {} (id {})", status, method, id);

        parse_response(status, &text)
    }

    /// Log in and keep the returned session token
    pub async fn login(&mut self, user: &str, password: &str) -> Result<String, ApiError> {
        let result = self
            .call(
                method::USER_LOGIN,
                json!({ "user": user, "password": password }),
            )
            .await?;

        let token = result
            .as_str()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Decode("user.login did not return a token".to_string()))?;

        info!("Logged in to {} as {}", self.server, user);
        self.set_token(token.clone());
        Ok(token)
    }

    /// Display name of the session's user
    pub async fn full_name(&self) -> Result<String, ApiError> {
        let name = self
            .full_name
            .get_or_try_init(|| async {
                let session = self.token.clone().unwrap_or_default();
                let user = self
                    .call(
                        method::USER_CHECK_AUTHENTICATION,
                        json!({ "sessionid": session }),
                    )
                    .await?;
                Ok::<String, ApiError>(full_name_of(&user))
            })
            .await?;
        Ok(name.clone())
    }

    /// Message used when the operator leaves the acknowledgment text empty
    pub async fn default_ack_message(&self) -> Result<String, ApiError> {
        Ok(format!("{} is working on this.", self.full_name().await?))
    }
}

#[async_trait]
impl AlertBackend for ZabbixClient {
    async fn fetch_active_triggers(
        &self,
        query: &TriggerQuery,
    ) -> Result<Vec<RawTrigger>, ApiError> {
        let result = self.call(method::TRIGGER_GET, query.to_params()).await?;
        let triggers: Vec<RawTrigger> = serde_json::from_value(result)?;
        debug!(
            "Fetched {} active triggers (unacknowledged only: {})",
            triggers.len(),
            query.only_unacknowledged
        );
        Ok(triggers)
    }

    async fn resolve_ack_event(&self, trigger_id: u64) -> Result<Option<AckEvent>, ApiError> {
        let result = self
            .call(method::EVENT_GET, latest_event_params(trigger_id))
            .await?;
        let events: Vec<AckEvent> = serde_json::from_value(result)?;
        Ok(events.into_iter().next())
    }

    async fn acknowledge_event(
        &self,
        event_id: u64,
        message: Option<&str>,
    ) -> Result<Vec<u64>, ApiError> {
        let message = match message {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => self.default_ack_message().await?,
        };

        let result = self
            .call(method::EVENT_ACKNOWLEDGE, acknowledge_params(event_id, &message))
            .await?;
        let result: AcknowledgeResult = serde_json::from_value(result)?;
        let acknowledged = result.event_ids().map_err(ApiError::Decode)?;

        info!("Acknowledged event {}", event_id);
        Ok(acknowledged)
    }
}

/// Check that `server` is an absolute `http` or `https` URL
pub fn validate_server_url(server: &str) -> Result<(), ApiError> {
    parse_server_url(server).map(|_| ())
}

fn parse_server_url(server: &str) -> Result<Url, ApiError> {
    let url = Url::parse(server.trim()).map_err(|_| ApiError::InvalidUrl(server.to_string()))?;
    match url.scheme() {
        "http" | "https" if url.host_str().is_some() => Ok(url),
        _ => Err(ApiError::InvalidUrl(server.to_string())),
    }
}

fn full_name_of(user: &Value) -> String {
    let name = user["name"].as_str().unwrap_or_default().trim();
    let surname = user["surname"].as_str().unwrap_or_default().trim();
    let full = format!("{} {}", name, surname).trim().to_string();
    if !full.is_empty() {
        return full;
    }

    // Zabbix 5.4 renamed `alias` to `username`
    user["username"]
        .as_str()
        .or_else(|| user["alias"].as_str())
        .unwrap_or("Someone")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{self, body_partial_json, header, path};
    use wiremock::{Mock, MockBuilder, MockServer, ResponseTemplate};

    fn client() -> ZabbixClient {
        ZabbixClient::new("http://127.0.0.1:9/api_jsonrpc.php", ClientOptions::default()).unwrap()
    }

    fn served_client(server: &MockServer) -> ZabbixClient {
        let url = format!("{}{}", server.uri(), API_ENDPOINT);
        ZabbixClient::new(&url, ClientOptions::default()).unwrap()
    }

    fn rpc_result(result: Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "result": result,
            "id": 1,
        }))
    }

    fn rpc_call(method_name: &str) -> MockBuilder {
        Mock::given(matchers::method("POST"))
            .and(path(API_ENDPOINT))
            .and(header("content-type", CONTENT_TYPE_JSON_RPC))
            .and(body_partial_json(json!({ "jsonrpc": "2.0", "method": method_name })))
    }

    async fn request_bodies(server: &MockServer) -> Vec<Value> {
        server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|request| request.body_json::<Value>().unwrap())
            .collect()
    }

    #[test]
    fn test_server_url_validation() {
        assert!(parse_server_url("https://zabbix.example.com/api_jsonrpc.php").is_ok());
        assert!(parse_server_url(" http://localhost/api_jsonrpc.php\n").is_ok());
        assert!(parse_server_url("").is_err());
        assert!(parse_server_url("zabbix.example.com").is_err());
        assert!(parse_server_url("ftp://zabbix.example.com/").is_err());
    }

    #[test]
    fn test_invalid_url_is_precondition() {
        let err = ZabbixClient::new("not a url", ClientOptions::default())
            .err()
            .unwrap();
        assert!(err.is_precondition());
    }

    #[test]
    fn test_frontend_url() {
        assert_eq!(client().frontend_url(), "http://127.0.0.1:9");
    }

    #[test]
    fn test_token_handling() {
        let client = client();
        assert!(!client.has_token());
        let client = client.with_token("abc");
        assert!(client.has_token());
    }

    #[tokio::test]
    async fn test_calls_without_token_fail_before_io() {
        let client = client();

        let err = client
            .fetch_active_triggers(&TriggerQuery::active(2))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ApiError::NotAuthorised {
                method: method::TRIGGER_GET.to_string()
            }
        );

        let err = client.acknowledge_event(1, Some("on it")).await.unwrap_err();
        assert!(err.is_precondition());
    }

    #[tokio::test]
    async fn test_login_stores_token() {
        let server = MockServer::start().await;
        rpc_call(method::USER_LOGIN)
            .and(body_partial_json(json!({
                "params": { "user": "admin", "password": "secret" }
            })))
            .respond_with(rpc_result(json!("0424bd59b807674191e7d77572075f33")))
            .expect(1)
            .mount(&server)
            .await;

        let mut client = served_client(&server);
        let token = client.login("admin", "secret").await.unwrap();

        assert_eq!(token, "0424bd59b807674191e7d77572075f33");
        assert!(client.has_token());
        let bodies = request_bodies(&server).await;
        assert_eq!(bodies.len(), 1);
        assert!(bodies[0].get("auth").is_none());
    }

    #[tokio::test]
    async fn test_trigger_query_reaches_server() {
        let server = MockServer::start().await;
        rpc_call(method::TRIGGER_GET)
            .and(body_partial_json(json!({
                "auth": "abc",
                "params": {
                    "min_severity": "4",
                    "withLastEventUnacknowledged": "1",
                    "host": "db01",
                }
            })))
            .respond_with(rpc_result(json!([{
                "triggerid": "13",
                "lastchange": "1700000000",
                "priority": "4",
                "description": "Disk full on db01",
                "hosts": [{ "host": "db01", "status": "0" }],
                "items": [{ "status": "0" }],
            }])))
            .expect(1)
            .mount(&server)
            .await;

        let client = served_client(&server).with_token("abc");
        let mut query = TriggerQuery::active(4).unacknowledged();
        query.host_filter = Some("db01".to_string());
        let triggers = client.fetch_active_triggers(&query).await.unwrap();

        assert_eq!(triggers.len(), 1);
        assert_eq!(triggers[0].trigger_id, 13);
        assert_eq!(triggers[0].host, "db01");
        assert_eq!(triggers[0].priority, 4);
    }

    #[tokio::test]
    async fn test_non_200_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(matchers::method("POST"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = served_client(&server).with_token("abc");
        let err = client
            .call(method::TRIGGER_GET, json!({}))
            .await
            .unwrap_err();

        assert!(err.is_transport());
        assert!(err.to_string().contains("502"));
    }

    #[tokio::test]
    async fn test_default_message_fetches_name_once() {
        let server = MockServer::start().await;
        rpc_call(method::USER_CHECK_AUTHENTICATION)
            .and(body_partial_json(json!({ "params": { "sessionid": "abc" } })))
            .respond_with(rpc_result(json!({
                "userid": "1",
                "username": "Admin",
                "name": "Zabbix",
                "surname": "Administrator",
            })))
            .expect(1)
            .mount(&server)
            .await;
        rpc_call(method::EVENT_ACKNOWLEDGE)
            .and(body_partial_json(json!({
                "params": {
                    "eventids": "9001",
                    "message": "Zabbix Administrator is working on this.",
                }
            })))
            .respond_with(rpc_result(json!({ "eventids": [9001] })))
            .expect(2)
            .mount(&server)
            .await;

        let client = served_client(&server).with_token("abc");
        assert_eq!(client.acknowledge_event(9001, None).await.unwrap(), vec![9001]);
        assert_eq!(client.acknowledge_event(9001, Some("")).await.unwrap(), vec![9001]);
        assert_eq!(request_bodies(&server).await.len(), 3);
    }

    #[tokio::test]
    async fn test_error_envelope_over_http() {
        let server = MockServer::start().await;
        rpc_call(method::EVENT_GET)
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "error": {
                    "code": -32602,
                    "message": "Invalid params.",
                    "data": "Session terminated, re-login, please.",
                },
                "id": 1,
            })))
            .mount(&server)
            .await;

        let client = served_client(&server).with_token("expired");
        let err = client.resolve_ack_event(13).await.unwrap_err();
        assert!(err.is_session_rejected());
    }

    #[test]
    fn test_full_name_of() {
        assert_eq!(
            full_name_of(&json!({ "name": "Ada", "surname": "Lovelace", "alias": "ada" })),
            "Ada Lovelace"
        );
        assert_eq!(full_name_of(&json!({ "name": "", "alias": "ada" })), "ada");
        assert_eq!(full_name_of(&json!({ "username": "root" })), "root");
        assert_eq!(full_name_of(&json!({})), "Someone");
    }
}
