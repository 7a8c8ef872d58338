//! JSON-RPC 2.0 Envelope
//!
//! Zabbix wraps every call in a JSON-RPC request carrying the session token
//! in an `auth` member, and answers with either `result` or `error`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ApiError;
use crate::method::USER_LOGIN;

/// A single JSON-RPC request
#[derive(Debug, Clone, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub method: &'a str,
    pub params: Value,
    pub id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<&'a str>,
}

impl<'a> RpcRequest<'a> {
    /// Build a request, attaching the session token to every method except
    /// `user.login`
    ///
    /// Fails with [`ApiError::NotAuthorised`] when a token is required but
    /// missing, so no request is ever sent unauthenticated.
    pub fn new(
        method: &'a str,
        params: Value,
        id: u64,
        token: Option<&'a str>,
    ) -> Result<Self, ApiError> {
        let auth = if method == USER_LOGIN {
            None
        } else {
            match token {
                Some(token) if !token.is_empty() => Some(token),
                _ => {
                    return Err(ApiError::NotAuthorised {
                        method: method.to_string(),
                    })
                }
            }
        };

        Ok(Self {
            jsonrpc: "2.0",
            method,
            params,
            id,
            auth,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
}

/// Turn an HTTP status and body into the call result
pub fn parse_response(status: u16, body: &str) -> Result<Value, ApiError> {
    if status != 200 {
        return Err(ApiError::Transport(format!(
            "did not receive 200 OK, but HTTP code {}",
            status
        )));
    }

    let response: RpcResponse = serde_json::from_str(body)?;

    if let Some(error) = response.error {
        let data = match error.data {
            Some(Value::String(text)) => text,
            Some(other) => other.to_string(),
            None => String::new(),
        };
        return Err(ApiError::Backend {
            code: error.code,
            message: error.message,
            data,
        });
    }

    response
        .result
        .ok_or_else(|| ApiError::Decode("response has neither result nor error".to_string()))
}

/// Zabbix sends most numbers as JSON strings; accept both forms
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Scalar {
    Int(i64),
    Text(String),
}

impl Scalar {
    pub(crate) fn to_i64(&self, field: &str) -> Result<i64, String> {
        match self {
            Scalar::Int(value) => Ok(*value),
            Scalar::Text(text) => text
                .trim()
                .parse()
                .map_err(|_| format!("{} is not an integer: '{}'", field, text)),
        }
    }

    pub(crate) fn to_u64(&self, field: &str) -> Result<u64, String> {
        let value = self.to_i64(field)?;
        u64::try_from(value).map_err(|_| format!("{} is negative: {}", field, value))
    }
}
