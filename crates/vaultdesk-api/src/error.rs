use std::collections::BTreeMap;

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Top-level error type for the `vaultdesk-api` crate.
///
/// Covers every failure mode of the request pipeline: transport,
/// HTTP status, session refresh, cancellation, and decoding.
/// `vaultdesk-core` maps these into domain errors, and
/// [`ErrorReport`](crate::ErrorReport) turns them into display text.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// A 401 with no recovery path: the refresh call itself was rejected,
    /// the request body could not be replayed, or no identity is cached.
    /// A replayed request that is rejected again keeps its body as
    /// [`Error::Http`] with status 401.
    #[error("Not authenticated -- sign in required")]
    Unauthorized,

    /// The refresh call of a refresh cycle failed. Every request queued
    /// on that cycle receives this error.
    #[error("Session refresh failed: {message}")]
    RefreshFailed { message: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// The request was superseded by a newer one on the same search slot.
    #[error("Request cancelled")]
    Cancelled,

    // ── HTTP ────────────────────────────────────────────────────────
    /// Non-success status with the server-provided error body (if any).
    #[error("HTTP {status}: {}", body.message.as_deref().unwrap_or("no message"))]
    Http { status: u16, body: ApiErrorBody },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },

    /// A request parameter could not be encoded.
    #[error("Encoding error: {0}")]
    Encoding(String),
}

/// Structured error body returned by the back office on 4xx/5xx.
///
/// `errors` holds field-level validation messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

impl Error {
    /// Build an [`Error::Http`] from a status and a raw body, keeping
    /// whatever structure the body carries.
    pub(crate) fn from_status(status: StatusCode, raw: &str) -> Self {
        let body = serde_json::from_str::<ApiErrorBody>(raw).unwrap_or_default();
        Self::Http {
            status: status.as_u16(),
            body,
        }
    }

    /// HTTP status, if the error carries one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            Self::Unauthorized => Some(401),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if the session is gone and the user must sign in again.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized | Self::RefreshFailed { .. })
            || self.status() == Some(401)
    }

    /// Returns `true` for a 403 (authorization, not authentication).
    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(403)
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns `true` if the request was superseded and dropped.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns `true` if no response was received at all.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(e) if e.status().is_none())
    }

    /// Field-level validation errors, if the server sent any.
    pub fn field_errors(&self) -> Option<&BTreeMap<String, Vec<String>>> {
        match self {
            Self::Http { body, .. } => body.errors.as_ref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_status_keeps_structured_body() {
        let err = Error::from_status(
            StatusCode::UNPROCESSABLE_ENTITY,
            r#"{"message":"Invalid data","errors":{"name":["name is required"]}}"#,
        );
        assert_eq!(err.status(), Some(422));
        let fields = err.field_errors().expect("field errors");
        assert_eq!(fields["name"], vec!["name is required".to_owned()]);
    }

    #[test]
    fn from_status_tolerates_plain_text() {
        let err = Error::from_status(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(matches!(
            err,
            Error::Http {
                status: 502,
                ref body
            } if body.message.is_none()
        ));
    }

    #[test]
    fn rejected_replay_keeps_its_body() {
        let err = Error::from_status(StatusCode::UNAUTHORIZED, r#"{"message":"Account locked"}"#);
        assert!(err.is_unauthorized());
        assert!(Error::Unauthorized.is_unauthorized());
        assert!(matches!(
            err,
            Error::Http {
                status: 401,
                ref body
            } if body.message.as_deref() == Some("Account locked")
        ));
    }

    #[test]
    fn refresh_failure_counts_as_unauthorized() {
        let err = Error::RefreshFailed {
            message: "HTTP 401".into(),
        };
        assert!(err.is_unauthorized());
        assert!(!err.is_not_found());
    }
}
