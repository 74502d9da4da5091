// ── Core error types ──
//
// User-facing errors from vaultdesk-core. Consumers never match on HTTP
// status codes or JSON failures directly; the `From<vaultdesk_api::Error>`
// impl sorts transport-layer errors into domain variants and keeps the
// normalized `ErrorReport` for anything a form has to render.

use thiserror::Error;
use vaultdesk_api::{ErrorReport, report};

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach back office at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    Timeout,

    // ── Session errors ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    AuthenticationFailed { message: String },

    /// The session could not be refreshed; the user is signed out.
    #[error("Session expired: {message}")]
    SessionExpired { message: String },

    #[error("Permission denied: {message}")]
    Forbidden { message: String },

    // ── Data errors ──────────────────────────────────────────────────
    #[error("{}", report::NOT_FOUND_MESSAGE)]
    NotFound,

    /// The server rejected the request with a message and possibly
    /// field-level validation errors.
    #[error("Request rejected ({status}): {}", report.message.as_deref().unwrap_or("no message"))]
    Rejected { status: u16, report: ErrorReport },

    /// Superseded by a newer call on the same search slot.
    #[error("Request cancelled")]
    Cancelled,

    // ── Server / internal errors ─────────────────────────────────────
    #[error("Server error: {message}")]
    Server { message: String, status: Option<u16> },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// The display contract for this error.
    ///
    /// `Rejected` keeps the server's message and field errors, and any
    /// status other than 404 or 500 ends up there. Not-found gets the
    /// short fixed message; transport faults are generic.
    pub fn report(&self) -> ErrorReport {
        match self {
            Self::Rejected { report, .. } => report.clone(),
            Self::NotFound => ErrorReport {
                message: Some(report::NOT_FOUND_MESSAGE.to_owned()),
                ..ErrorReport::default()
            },
            Self::AuthenticationFailed { message }
            | Self::SessionExpired { message }
            | Self::Forbidden { message } => ErrorReport {
                message: Some(message.clone()),
                ..ErrorReport::default()
            },
            _ => ErrorReport::unhandled(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<vaultdesk_api::Error> for CoreError {
    fn from(err: vaultdesk_api::Error) -> Self {
        use vaultdesk_api::Error as Api;

        match err {
            Api::Unauthorized => Self::AuthenticationFailed {
                message: "Not signed in or session expired".into(),
            },
            Api::RefreshFailed { message } => Self::SessionExpired { message },
            Api::Cancelled => Self::Cancelled,
            Api::Transport(ref e) => {
                if e.is_timeout() {
                    Self::Timeout
                } else if e.is_connect() {
                    Self::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    Self::Server {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            Api::InvalidUrl(e) => Self::Config {
                message: format!("Invalid URL: {e}"),
            },
            Api::Tls(msg) => Self::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            Api::Http { status: 401, body } => Self::AuthenticationFailed {
                message: body
                    .message
                    .unwrap_or_else(|| "Not signed in or session expired".into()),
            },
            Api::Http { status: 403, body } => Self::Forbidden {
                message: body
                    .message
                    .unwrap_or_else(|| "You do not have access to this resource".into()),
            },
            Api::Http { status: 404, .. } => Self::NotFound,
            Api::Http { status: 500, body } => Self::Server {
                message: body
                    .message
                    .unwrap_or_else(|| report::UNHANDLED_ERROR_MESSAGE.into()),
                status: Some(500),
            },
            Api::Http { status, body } => Self::Rejected {
                status,
                report: ErrorReport::from(Api::Http { status, body }),
            },
            Api::Deserialization { message, body: _ } => {
                Self::Internal(format!("Deserialization error: {message}"))
            }
            Api::Encoding(msg) => Self::Internal(format!("Encoding error: {msg}")),
        }
    }
}
