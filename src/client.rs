//! Authenticated client: session, call pipeline, CRUD facade.

use std::sync::Arc;

use serde_json::{json, Map, Value};
use tracing::debug;

use crate::error::RpcError;
use crate::protocol::{
    AuthParams, AuthRequest, CallParams, CallRequest, RpcResponse, JSONRPC_VERSION,
};
use crate::record;
use crate::value::{self, DecodeError};

/// Positional arguments of a remote call.
pub type CallArgs = Vec<Value>;

/// Keyword arguments of a remote call.
pub type CallKwargs = Map<String, Value>;

/// Execution context threaded into every call (language, timezone, acting
/// user, ...).
pub type Context = Map<String, Value>;

// ── Session ─────────────────────────────────────────────────────────

/// Identity and server metadata captured from a successful authentication.
///
/// Immutable for the life of the session. Only `uid` is required of the
/// server; the metadata fields vary across server versions, and the ones a
/// server omits (or sends as the `false` placeholder) are left at their
/// empty values.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub uid: i64,
    pub is_admin: bool,
    pub is_system: bool,
    pub db: String,
    pub server_version: String,
    pub server_version_info: Vec<Value>,
    pub name: String,
    pub username: String,
    pub partner_display_name: String,
    pub company_id: i64,
    pub partner_id: i64,
    pub web_base_url: String,
    /// The server-side default execution context for this user.
    pub user_context: Context,
}

impl SessionInfo {
    /// Build from the `result` record of the authenticate envelope.
    /// `None` when the record carries no positive user id.
    fn from_record(result: &Value) -> Option<Self> {
        let uid = record::int_field(result, "uid").ok()?;
        if uid <= 0 {
            return None;
        }
        Some(Self {
            uid,
            is_admin: bool_meta(result, "is_admin"),
            is_system: bool_meta(result, "is_system"),
            db: string_meta(result, "db"),
            server_version: string_meta(result, "server_version"),
            server_version_info: result
                .get("server_version_info")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
            name: string_meta(result, "name"),
            username: string_meta(result, "username"),
            partner_display_name: string_meta(result, "partner_display_name"),
            company_id: int_meta(result, "company_id"),
            partner_id: int_meta(result, "partner_id"),
            web_base_url: string_meta(result, "web.base.url"),
            user_context: result
                .get("user_context")
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
        })
    }
}

fn string_meta(rec: &Value, name: &str) -> String {
    record::string_field(rec, name).unwrap_or_default()
}

fn int_meta(rec: &Value, name: &str) -> i64 {
    record::int_field(rec, name).unwrap_or_default()
}

fn bool_meta(rec: &Value, name: &str) -> bool {
    rec.get(name).and_then(Value::as_bool).unwrap_or(false)
}

// ── Client ──────────────────────────────────────────────────────────

/// Authenticated handle to one server.
///
/// Exists only after a successful [`authenticate`], so holding a `Client`
/// is holding a session. Cheap to clone; clones and [`Client::with_context`]
/// views share the session identity and the cookie-bearing transport, so
/// every call made through any of them rides the same server-side session.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::blocking::Client,
    base_url: String,
    session: Arc<SessionInfo>,
    /// Default execution context of this view. Deriving a view copies and
    /// merges; nothing ever writes back into this map.
    context: Context,
}

/// Authenticate against `{base_url}/web/session/authenticate` and build a
/// client around the resulting session.
///
/// The transport keeps a cookie store: the session cookie the server sets
/// here is what ties later `call_kw` requests to this login, and every call
/// made through the returned client (or a derived view) reuses it.
pub fn authenticate(
    base_url: &str,
    db: &str,
    login: &str,
    password: &str,
) -> Result<Client, RpcError> {
    let base_url = base_url.trim_end_matches('/').to_string();
    let http = reqwest::blocking::Client::builder()
        .cookie_store(true)
        .build()?;

    let request = AuthRequest {
        id: "1",
        jsonrpc: JSONRPC_VERSION,
        method: "call",
        params: AuthParams {
            db,
            login,
            password,
        },
    };

    let response: RpcResponse = http
        .post(format!("{base_url}/web/session/authenticate"))
        .header(reqwest::header::ACCEPT, "application/json")
        .json(&request)
        .send()?
        .json()?;

    if let Some(fault) = response.error {
        return Err(RpcError::AuthenticationFailed(
            fault.display_message().to_string(),
        ));
    }
    let result = response.result.ok_or(RpcError::ProtocolViolation)?;

    let session = SessionInfo::from_record(&result).ok_or_else(|| {
        RpcError::AuthenticationFailed("server returned no user id".to_string())
    })?;
    debug!("authenticated uid {} on {}", session.uid, session.db);

    let context = session.user_context.clone();
    Ok(Client {
        http,
        base_url,
        session: Arc::new(session),
        context,
    })
}

impl Client {
    /// Whether this client holds a usable authenticated session.
    pub fn is_valid(&self) -> bool {
        self.session.uid > 0
    }

    /// The authentication result this client was built from.
    pub fn session(&self) -> &SessionInfo {
        &self.session
    }

    /// The default execution context of this view.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// The server base URL, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Derive an independent view with `overrides` merged over this view's
    /// context. Same session, same transport; this view's own context is
    /// left untouched.
    pub fn with_context(&self, overrides: Context) -> Client {
        let mut derived = self.clone();
        derived.context = merge_context(&self.context, &overrides);
        derived
    }

    /// Invoke `method` on `model` with positional and keyword arguments.
    ///
    /// The effective execution context — this view's default overlaid with
    /// whatever `kwargs` carries under `"context"`, per-call keys winning —
    /// replaces the `context` kwarg before the envelope is built. Returns
    /// the raw `result` value; shape it with the [`crate::record`]
    /// accessors.
    pub fn call(
        &self,
        model: &str,
        method: &str,
        args: CallArgs,
        mut kwargs: CallKwargs,
    ) -> Result<Value, RpcError> {
        let overrides = match kwargs.remove("context") {
            Some(Value::Object(map)) => map,
            _ => Context::new(),
        };
        kwargs.insert(
            "context".to_string(),
            Value::Object(merge_context(&self.context, &overrides)),
        );

        debug!("call {model}.{method}");
        let request = CallRequest {
            id: 1,
            jsonrpc: JSONRPC_VERSION,
            method: "call",
            params: CallParams {
                model,
                method,
                args: &args,
                kwargs: &kwargs,
            },
        };

        let response: RpcResponse = self
            .http
            .post(format!(
                "{}/web/dataset/call_kw/{model}/{method}",
                self.base_url
            ))
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&request)
            .send()?
            .json()?;

        match (response.result, response.error) {
            (_, Some(fault)) => Err(RpcError::Remote(fault)),
            (Some(result), None) => Ok(result),
            (None, None) => Err(RpcError::ProtocolViolation),
        }
    }

    // ── CRUD facade ─────────────────────────────────────────────────

    /// `read`: fetch `fields` of the given records. An empty `fields` asks
    /// the server for all of them.
    pub fn read(&self, model: &str, ids: &[i64], fields: &[&str]) -> Result<Vec<Value>, RpcError> {
        let result = self.call(model, "read", vec![json!(ids)], fields_kwargs(fields))?;
        shape_records(result)
    }

    /// `search`: ids of the records matching `domain`.
    pub fn search(&self, model: &str, domain: Value) -> Result<Vec<i64>, RpcError> {
        let result = self.call(model, "search", vec![domain], CallKwargs::new())?;
        Ok(value::decode_id_list(&result)?)
    }

    /// `search_read`: records matching `domain`, restricted to `fields`.
    pub fn search_read(
        &self,
        model: &str,
        domain: Value,
        fields: &[&str],
    ) -> Result<Vec<Value>, RpcError> {
        let result = self.call(model, "search_read", vec![domain], fields_kwargs(fields))?;
        shape_records(result)
    }

    /// `write`: update `values` on the given records.
    pub fn write(&self, model: &str, ids: &[i64], values: Value) -> Result<bool, RpcError> {
        let result = self.call(model, "write", vec![json!(ids), values], CallKwargs::new())?;
        shape_bool(result)
    }

    /// `create`: insert one record, returning its id.
    pub fn create(&self, model: &str, values: Value) -> Result<i64, RpcError> {
        let result = self.call(model, "create", vec![values], CallKwargs::new())?;
        Ok(value::decode_int(&result)?)
    }

    /// `unlink`: delete the given records.
    pub fn unlink(&self, model: &str, ids: &[i64]) -> Result<bool, RpcError> {
        let result = self.call(model, "unlink", vec![json!(ids)], CallKwargs::new())?;
        shape_bool(result)
    }
}

/// Merge `overrides` over `base` into a fresh map; keys present in both
/// take the override's value. Neither input is modified.
fn merge_context(base: &Context, overrides: &Context) -> Context {
    let mut merged = base.clone();
    for (key, value) in overrides {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// `fields` goes into kwargs only when non-empty.
fn fields_kwargs(fields: &[&str]) -> CallKwargs {
    let mut kwargs = CallKwargs::new();
    if !fields.is_empty() {
        kwargs.insert("fields".to_string(), json!(fields));
    }
    kwargs
}

fn shape_records(result: Value) -> Result<Vec<Value>, RpcError> {
    match result {
        Value::Array(records) => Ok(records),
        other => Err(RpcError::ResultShape(DecodeError::new(
            "record list",
            &other,
        ))),
    }
}

fn shape_bool(result: Value) -> Result<bool, RpcError> {
    result
        .as_bool()
        .ok_or_else(|| RpcError::ResultShape(DecodeError::new("boolean", &result)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(pairs: &[(&str, Value)]) -> Context {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn merge_override_wins_and_sources_survive() {
        let base = ctx(&[("lang", json!("en_US"))]);
        let overrides = ctx(&[("lang", json!("fr_FR")), ("tz", json!("UTC"))]);

        let merged = merge_context(&base, &overrides);
        assert_eq!(
            Value::Object(merged),
            json!({"lang": "fr_FR", "tz": "UTC"})
        );

        // Neither source map was touched.
        assert_eq!(Value::Object(base.clone()), json!({"lang": "en_US"}));
        assert_eq!(
            Value::Object(overrides),
            json!({"lang": "fr_FR", "tz": "UTC"})
        );

        // The base stays reusable for a later, different merge.
        let merged = merge_context(&base, &ctx(&[("tz", json!("Europe/Paris"))]));
        assert_eq!(
            Value::Object(merged),
            json!({"lang": "en_US", "tz": "Europe/Paris"})
        );
    }

    #[test]
    fn merge_keeps_base_only_keys() {
        let base = ctx(&[("lang", json!("en_US")), ("uid", json!(2))]);
        let merged = merge_context(&base, &ctx(&[("lang", json!("nl_NL"))]));
        assert_eq!(merged["uid"], json!(2));
        assert_eq!(merged["lang"], json!("nl_NL"));
    }

    #[test]
    fn session_info_from_full_record() {
        let info = SessionInfo::from_record(&json!({
            "uid": 2,
            "is_system": true,
            "is_admin": true,
            "user_context": {"lang": "en_US", "tz": "UTC", "uid": 2},
            "db": "demo",
            "server_version": "17.0",
            "server_version_info": [17, 0, 0, "final", 0, ""],
            "name": "Mitchell Admin",
            "username": "admin",
            "partner_display_name": "Mitchell Admin",
            "company_id": 1,
            "partner_id": 3,
            "web.base.url": "http://localhost:8069",
        }))
        .unwrap();

        assert_eq!(info.uid, 2);
        assert!(info.is_admin);
        assert_eq!(info.db, "demo");
        assert_eq!(info.server_version, "17.0");
        assert_eq!(info.server_version_info.len(), 6);
        assert_eq!(info.partner_id, 3);
        assert_eq!(info.web_base_url, "http://localhost:8069");
        assert_eq!(info.user_context["lang"], json!("en_US"));
    }

    #[test]
    fn session_info_tolerates_sparse_metadata() {
        // An older server: most fields missing, some sent as the false
        // placeholder. Login must still succeed.
        let info = SessionInfo::from_record(&json!({
            "uid": 7,
            "db": false,
            "user_context": false,
        }))
        .unwrap();
        assert_eq!(info.uid, 7);
        assert_eq!(info.db, "");
        assert!(info.user_context.is_empty());
        assert!(!info.is_admin);
    }

    #[test]
    fn session_info_requires_a_user_id() {
        assert!(SessionInfo::from_record(&json!({"db": "demo"})).is_none());
        assert!(SessionInfo::from_record(&json!({"uid": false})).is_none());
        assert!(SessionInfo::from_record(&json!({"uid": 0})).is_none());
        assert!(SessionInfo::from_record(&json!("nonsense")).is_none());
    }

    #[test]
    fn fields_kwarg_omitted_when_empty() {
        assert!(fields_kwargs(&[]).is_empty());
        let kwargs = fields_kwargs(&["name", "email"]);
        assert_eq!(kwargs["fields"], json!(["name", "email"]));
    }

    #[test]
    fn result_shaping() {
        assert_eq!(shape_bool(json!(true)).unwrap(), true);
        assert!(matches!(
            shape_bool(json!([1])),
            Err(RpcError::ResultShape(_))
        ));
        assert_eq!(shape_records(json!([{"id": 1}])).unwrap().len(), 1);
        assert!(matches!(
            shape_records(json!(42)),
            Err(RpcError::ResultShape(_))
        ));
    }
}
