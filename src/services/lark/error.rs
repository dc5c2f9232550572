//! Failures surfaced by the Lark-facing services.
use serde_json::Value;
use thiserror::Error;

pub type LarkResult<T> = Result<T, LarkError>;

/// Error taxonomy shared by the token, ticket, login and message services.
///
/// `Clone` is required because a single ticket refresh outcome is handed to
/// every caller that joined it. Upstream payloads are kept verbatim for
/// diagnostics.
#[derive(Debug, Clone, Error)]
pub enum LarkError {
    /// Required application identity is not configured.
    #[error("missing configuration: {0}")]
    Configuration(&'static str),

    /// Caller input is missing or empty.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The app access token endpoint failed or was unreachable.
    #[error("failed to get app access token: {payload}")]
    UpstreamAuth { payload: Value },

    /// The jsapi ticket endpoint failed or returned a malformed payload.
    #[error("failed to get jsapi ticket: {payload}")]
    UpstreamTicket { payload: Value },

    /// Any other upstream call (login, messaging) failed.
    #[error("lark {operation} failed: {payload}")]
    Upstream {
        operation: &'static str,
        payload: Value,
    },

    /// Local failure unrelated to the caller or upstream (e.g. no entropy).
    #[error("internal error: {0}")]
    Internal(String),
}

impl LarkError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn upstream(operation: &'static str, payload: Value) -> Self {
        Self::Upstream { operation, payload }
    }
}
