//! Blocking JSON-RPC client for OpenERP/Odoo-style business-object servers.
//!
//! The wire protocol has two quirks this crate is built around. First,
//! every field value that may legitimately be absent arrives as the JSON
//! boolean `false`, whatever the field's declared type; the [`value`]
//! decoders and [`record`] accessors absorb that convention. Second, every
//! call carries an execution context (language, timezone, acting user)
//! merged from the session's default and per-call overrides; [`Client`]
//! threads it through each request.
//!
//! # Usage
//!
//! ```no_run
//! use openerp_rpc::{authenticate, record};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let client = authenticate("https://erp.example.com", "prod", "admin", "secret")?;
//!
//! let ids = client.search("res.partner", json!([["is_company", "=", true]]))?;
//! for rec in client.read("res.partner", &ids, &["name", "country_id"])? {
//!     let name = record::string_field(&rec, "name")?;
//!     let country = record::many2one_field(&rec, "country_id")?;
//!     println!("{name}: {country:?}");
//! }
//!
//! // A view with a different language; the original client is unaffected.
//! let fr = client.with_context(json!({"lang": "fr_FR"}).as_object().unwrap().clone());
//! fr.write("res.partner", &ids, json!({"comment": "société"}))?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod protocol;
pub mod record;
pub mod value;

mod client;

pub use client::{authenticate, CallArgs, CallKwargs, Client, Context, SessionInfo};
pub use config::{connect_profile, ConfigError, ConnectError, ProfileConfig, ServerProfile};
pub use error::RpcError;
pub use protocol::{FaultData, RpcFault};
pub use record::FieldError;
pub use value::{DecodeError, Many2one};
