//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use vaultdesk_config::ConfigError;
use vaultdesk_core::{CoreError, ErrorReport};

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const REJECTED: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to back office at {url}")]
    #[diagnostic(
        code(vaultdesk::connection_failed),
        help(
            "Check that the back office is reachable.\n\
             Reason: {reason}\n\
             Self-signed certificate? Try --insecure (-k) or set ca_cert in your profile."
        )
    )]
    ConnectionFailed { url: String, reason: String },

    #[error("Request timed out")]
    #[diagnostic(
        code(vaultdesk::timeout),
        help("Increase timeout with --timeout or check back-office responsiveness.")
    )]
    Timeout,

    // ── Authentication ───────────────────────────────────────────────
    #[error("Authentication failed: {message}")]
    #[diagnostic(
        code(vaultdesk::auth_failed),
        help(
            "Verify your username and password.\n\
             Run: vaultdesk config set-password"
        )
    )]
    AuthFailed { message: String },

    #[error("Session expired: {message}")]
    #[diagnostic(code(vaultdesk::session_expired), help("Sign in again."))]
    SessionExpired { message: String },

    #[error("Permission denied: {message}")]
    #[diagnostic(
        code(vaultdesk::forbidden),
        help("Your role lacks the permission this operation needs. Check: vaultdesk auth me")
    )]
    Forbidden { message: String },

    #[error("No password configured for profile '{profile}'")]
    #[diagnostic(
        code(vaultdesk::no_credentials),
        help(
            "Store one with: vaultdesk config set-password\n\
             Or set the VAULTDESK_PASSWORD environment variable."
        )
    )]
    NoCredentials { profile: String },

    // ── Data ─────────────────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(code(vaultdesk::not_found))]
    NotFound { message: String },

    /// The server refused the request; the normalized report is kept
    /// so validation errors can be printed per field.
    #[error("{}", report.message.as_deref().unwrap_or("Request rejected"))]
    #[diagnostic(code(vaultdesk::rejected))]
    Rejected {
        status: u16,
        report: ErrorReport,
        #[help]
        details: Option<String>,
    },

    #[error("Server error: {message}")]
    #[diagnostic(code(vaultdesk::server))]
    Server { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(vaultdesk::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(vaultdesk::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: vaultdesk config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error("No back office configured")]
    #[diagnostic(
        code(vaultdesk::no_config),
        help(
            "Create a profile with: vaultdesk config init\n\
             Or pass --url. Expected config at: {path}"
        )
    )]
    NoConfig { path: String },

    #[error(transparent)]
    #[diagnostic(code(vaultdesk::config))]
    Config(#[from] ConfigError),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(vaultdesk::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(vaultdesk::json), help("Check the JSON contents and try again."))]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    #[diagnostic(code(vaultdesk::internal))]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::Timeout => exit_code::TIMEOUT,
            Self::AuthFailed { .. } | Self::SessionExpired { .. } | Self::NoCredentials { .. } => {
                exit_code::AUTH
            }
            Self::Forbidden { .. } => exit_code::PERMISSION,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Rejected { .. } => exit_code::REJECTED,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

/// Field errors and extra messages, one per line.
fn report_details(report: &ErrorReport) -> Option<String> {
    let mut lines: Vec<String> = report.lists.clone();
    for (field, messages) in &report.errors {
        lines.extend(messages.iter().map(|m| format!("{field}: {m}")));
    }
    (!lines.is_empty()).then(|| lines.join("\n"))
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => Self::ConnectionFailed { url, reason },
            CoreError::Timeout => Self::Timeout,
            CoreError::AuthenticationFailed { message } => Self::AuthFailed { message },
            CoreError::SessionExpired { message } => Self::SessionExpired { message },
            CoreError::Forbidden { message } => Self::Forbidden { message },
            e @ CoreError::NotFound => Self::NotFound {
                message: e.to_string(),
            },
            CoreError::Rejected { status, report } => Self::Rejected {
                status,
                details: report_details(&report),
                report,
            },
            CoreError::Server { message, .. } => Self::Server { message },
            CoreError::Config { message } => Self::Validation {
                field: "url".into(),
                reason: message,
            },
            e @ CoreError::Cancelled => Self::Internal(e.to_string()),
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

impl CliError {
    /// Lift a config-crate error, turning the common cases into their
    /// dedicated diagnostics.
    pub fn from_config(err: ConfigError, available: &[&str]) -> Self {
        match err {
            ConfigError::UnknownProfile { name } => Self::ProfileNotFound {
                name,
                available: if available.is_empty() {
                    "(none)".into()
                } else {
                    available.join(", ")
                },
            },
            ConfigError::NoCredentials { profile } => Self::NoCredentials { profile },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn rejected_keeps_field_errors_for_display() {
        let report = ErrorReport {
            message: Some("Validation failed".into()),
            lists: vec!["Check the highlighted fields".into()],
            errors: BTreeMap::from([("amount".into(), vec!["Amount is required".into()])]),
        };
        let err = CliError::from(CoreError::Rejected {
            status: 422,
            report,
        });

        assert_eq!(err.exit_code(), exit_code::REJECTED);
        assert_eq!(err.to_string(), "Validation failed");
        let CliError::Rejected { details, .. } = err else {
            panic!("expected Rejected");
        };
        assert_eq!(
            details.as_deref(),
            Some("Check the highlighted fields\namount: Amount is required")
        );
    }

    #[test]
    fn exit_codes_follow_error_class() {
        assert_eq!(CliError::from(CoreError::NotFound).exit_code(), exit_code::NOT_FOUND);
        assert_eq!(
            CliError::from(CoreError::SessionExpired {
                message: "refresh rejected".into()
            })
            .exit_code(),
            exit_code::AUTH
        );
        assert_eq!(CliError::from(CoreError::Timeout).exit_code(), exit_code::TIMEOUT);
    }
}
