//! Wire value decoders.
//!
//! The wire protocol encodes "this field has no value" as the JSON boolean
//! `false`, whatever the field's declared type. Every decoder here absorbs
//! that sentinel: scalars fall back to their empty value, relational
//! references and timestamps decode to an explicit `None`. Only shapes the
//! protocol never produces (an object where a scalar was expected, a
//! three-element reference pair) are decode failures.

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

/// The wire value had a shape the target type cannot accept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("expected {expected}, got {found}")]
pub struct DecodeError {
    pub expected: &'static str,
    pub found: &'static str,
}

impl DecodeError {
    pub(crate) fn new(expected: &'static str, found: &Value) -> Self {
        Self {
            expected,
            found: kind_of(found),
        }
    }
}

/// JSON kind name, for error messages.
fn kind_of(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

/// A many2one reference: the id of the target record plus its display label.
///
/// On the wire this is the pair `[id, label]`, or `false` when the field is
/// not set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Many2one {
    pub id: i64,
    pub label: String,
}

/// Decode a string field. The `false` placeholder decodes to `""`.
pub fn decode_string(v: &Value) -> Result<String, DecodeError> {
    match v {
        Value::String(s) => Ok(s.clone()),
        Value::Bool(false) => Ok(String::new()),
        other => Err(DecodeError::new("string", other)),
    }
}

/// Decode a float field. The `false` placeholder decodes to `0.0`.
pub fn decode_float(v: &Value) -> Result<f64, DecodeError> {
    match v {
        Value::Number(n) => n.as_f64().ok_or_else(|| DecodeError::new("float", v)),
        Value::Bool(false) => Ok(0.0),
        other => Err(DecodeError::new("float", other)),
    }
}

/// Decode an integer field.
///
/// The transport tags all numbers as floating point, so a float narrows to
/// its integer value. The `false` placeholder decodes to `0`.
pub fn decode_int(v: &Value) -> Result<i64, DecodeError> {
    match v {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(i)
            } else if let Some(f) = n.as_f64() {
                Ok(f as i64)
            } else {
                Err(DecodeError::new("integer", v))
            }
        }
        Value::Bool(false) => Ok(0),
        other => Err(DecodeError::new("integer", other)),
    }
}

/// Decode a many2one field: `[id, label]` or the `false` placeholder.
///
/// Absence decodes to `None`, never to a zero-valued reference; callers
/// branch on presence instead of comparing ids against 0. The pair elements
/// are matched strictly (a bare number and a bare string), so a degenerate
/// value like `[false, false]` cannot pass as a reference.
pub fn decode_many2one(v: &Value) -> Result<Option<Many2one>, DecodeError> {
    match v {
        Value::Array(pair) => match pair.as_slice() {
            [Value::Number(id), Value::String(label)] => {
                let id = id
                    .as_i64()
                    .or_else(|| id.as_f64().map(|f| f as i64))
                    .ok_or_else(|| DecodeError::new("many2one pair", v))?;
                Ok(Some(Many2one {
                    id,
                    label: label.clone(),
                }))
            }
            _ => Err(DecodeError::new("many2one pair", v)),
        },
        Value::Bool(false) => Ok(None),
        other => Err(DecodeError::new("many2one pair", other)),
    }
}

/// Decode a datetime field.
///
/// Returns `None` both for the `false` placeholder and for a string that
/// does not parse as RFC3339: the legacy wire format gives a client no way
/// to tell malformed data from an unset field, and this decoder keeps that
/// ambiguity instead of guessing. Neither case ever turns into a zero
/// instant.
pub fn decode_datetime(v: &Value) -> Result<Option<DateTime<Utc>>, DecodeError> {
    match v {
        Value::String(s) => Ok(DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc))),
        Value::Bool(false) => Ok(None),
        other => Err(DecodeError::new("datetime", other)),
    }
}

/// Decode a sequence of record ids (a one2many field, or a `search` result).
///
/// Elements may arrive integer-tagged or floating point. An empty list and
/// the `false` placeholder both decode to an empty vec.
pub fn decode_id_list(v: &Value) -> Result<Vec<i64>, DecodeError> {
    match v {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::Number(_) => decode_int(item),
                other => Err(DecodeError::new("integer", other)),
            })
            .collect(),
        Value::Bool(false) => Ok(Vec::new()),
        other => Err(DecodeError::new("id list", other)),
    }
}
