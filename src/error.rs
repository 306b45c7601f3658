//! Error surface of the call pipeline.

use thiserror::Error;

use crate::protocol::RpcFault;
use crate::value::DecodeError;

/// Everything that can go wrong authenticating or making a call.
///
/// No variant is retried or recovered internally; each is returned to the
/// caller as-is. Field-level extraction failures are a separate, call-local
/// concern — see [`crate::record::FieldError`].
#[derive(Debug, Error)]
pub enum RpcError {
    /// Network, connection, or JSON-framing failure.
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server rejected the credentials, or the authentication exchange
    /// itself reported a remote error. Fatal to the attempted session.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// The remote method reported an error: a business-rule violation, a
    /// permission denial, an expired session. Carries the server's fault
    /// payload, including structured exception details when present.
    #[error("remote error: {0}")]
    Remote(RpcFault),

    /// The response envelope carried neither a result nor an error.
    #[error("protocol violation: response carries neither result nor error")]
    ProtocolViolation,

    /// A CRUD result payload did not have the contracted shape.
    #[error("unexpected result shape: {0}")]
    ResultShape(#[from] DecodeError),
}
