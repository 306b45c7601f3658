//! JSON-RPC envelope framing.
//!
//! One request/response shape serves both the session-authentication
//! endpoint and generic `call_kw` invocations; the differences are the
//! params payload and the request id the upstream server expects on each
//! (a string on authenticate, a number on `call_kw`).

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

pub(crate) const JSONRPC_VERSION: &str = "2.0";

/// Request body for `/web/session/authenticate`.
#[derive(Debug, Serialize)]
pub(crate) struct AuthRequest<'a> {
    pub id: &'static str,
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: AuthParams<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AuthParams<'a> {
    pub db: &'a str,
    pub login: &'a str,
    pub password: &'a str,
}

/// Request body for `/web/dataset/call_kw/{model}/{method}`.
#[derive(Debug, Serialize)]
pub(crate) struct CallRequest<'a> {
    pub id: u32,
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: CallParams<'a>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CallParams<'a> {
    pub model: &'a str,
    pub method: &'a str,
    pub args: &'a [Value],
    pub kwargs: &'a Map<String, Value>,
}

/// Response envelope. A conforming server sends exactly one of `result` or
/// `error`; the pipeline reports both-absent as a protocol violation.
#[derive(Debug, Deserialize)]
pub(crate) struct RpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcFault>,
}

/// The error object of a response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct RpcFault {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<FaultData>,
}

impl RpcFault {
    /// Best human-readable message: the structured exception message when
    /// the server sent one, the envelope-level message otherwise.
    pub fn display_message(&self) -> &str {
        match &self.data {
            Some(data) if !data.message.is_empty() => &data.message,
            _ => &self.message,
        }
    }
}

impl fmt::Display for RpcFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_message())
    }
}

/// Structured exception details, when the server supplies them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FaultData {
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub debug: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub message: String,
    #[serde(default)]
    pub arguments: Vec<Value>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub exception_type: String,
}

/// Fault payload strings are as loosely typed as record fields: a server
/// may send the `false` placeholder (or nothing at all) where a string
/// belongs. Anything non-string reads as empty; a fault payload is already
/// an error report and must not fail to decode.
fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(v.as_str().map(str::to_owned).unwrap_or_default())
}
