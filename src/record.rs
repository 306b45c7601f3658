//! Typed field access over generic records.
//!
//! A record is one element of a `read`/`search_read` result: a JSON object
//! mapping field names to loosely typed wire values. These accessors look a
//! field up and decode it, keeping a missing key, a non-record input, and a
//! present-but-undecodable value apart.

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;

use crate::value::{self, DecodeError, Many2one};

/// Field extraction failure. Local to one accessor call; never affects the
/// session or other in-flight calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// The value holding the fields is not an object.
    #[error("not a record")]
    NotARecord,

    /// The record has no field of that name.
    #[error("field not found: {0}")]
    FieldMissing(String),

    /// The field is present but its value has the wrong shape.
    #[error("field {field}: {source}")]
    Decode { field: String, source: DecodeError },
}

fn lookup<'a>(rec: &'a Value, name: &str) -> Result<&'a Value, FieldError> {
    rec.as_object()
        .ok_or(FieldError::NotARecord)?
        .get(name)
        .ok_or_else(|| FieldError::FieldMissing(name.to_string()))
}

fn decoded<T>(field: &str, result: Result<T, DecodeError>) -> Result<T, FieldError> {
    result.map_err(|source| FieldError::Decode {
        field: field.to_string(),
        source,
    })
}

/// Get a string field. The `false` placeholder reads as `""`.
pub fn string_field(rec: &Value, name: &str) -> Result<String, FieldError> {
    decoded(name, value::decode_string(lookup(rec, name)?))
}

/// Get a float field. The `false` placeholder reads as `0.0`.
pub fn float_field(rec: &Value, name: &str) -> Result<f64, FieldError> {
    decoded(name, value::decode_float(lookup(rec, name)?))
}

/// Get an integer field. The `false` placeholder reads as `0`.
pub fn int_field(rec: &Value, name: &str) -> Result<i64, FieldError> {
    decoded(name, value::decode_int(lookup(rec, name)?))
}

/// Get a many2one field. `Ok(None)` means the reference is not set, which
/// is a valid outcome, distinct from any decode error.
pub fn many2one_field(rec: &Value, name: &str) -> Result<Option<Many2one>, FieldError> {
    decoded(name, value::decode_many2one(lookup(rec, name)?))
}

/// Get a datetime field. `Ok(None)` means unset or unparseable; see
/// [`value::decode_datetime`] for why the two collapse.
pub fn datetime_field(rec: &Value, name: &str) -> Result<Option<DateTime<Utc>>, FieldError> {
    decoded(name, value::decode_datetime(lookup(rec, name)?))
}

/// Get a one2many field as the ids of the related records. An unset or
/// empty field reads as an empty vec.
pub fn one2many_field(rec: &Value, name: &str) -> Result<Vec<i64>, FieldError> {
    decoded(name, value::decode_id_list(lookup(rec, name)?))
}
