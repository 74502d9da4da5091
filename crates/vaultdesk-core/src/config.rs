// ── Runtime connection configuration ──
//
// These types describe *how* to reach a back office. They carry
// credential data and connection tuning, but never touch disk.
// The CLI builds a `BackofficeConfig` and hands it in.

use std::time::Duration;

use secrecy::SecretString;
use url::Url;
use vaultdesk_api::transport::{TlsMode, TransportConfig};

/// How to establish the session.
#[derive(Debug, Clone)]
pub enum AuthCredentials {
    /// Username/password sign-in; the server answers with session cookies.
    Credentials {
        username: String,
        password: SecretString,
        remember_me: bool,
    },
    /// No sign-in; only the public auth endpoints will succeed.
    Anonymous,
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed development back ends).
    DangerAcceptInvalid,
}

/// Configuration for one back-office connection.
#[derive(Debug, Clone)]
pub struct BackofficeConfig {
    /// API root, e.g. `https://backoffice.example.com/api`.
    pub url: Url,
    pub auth: AuthCredentials,
    pub tls: TlsVerification,
    pub timeout: Duration,
}

impl BackofficeConfig {
    pub fn new(url: Url, auth: AuthCredentials) -> Self {
        Self {
            url,
            auth,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
        }
    }

    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
            // ApiClient::new adds one automatically
            cookie_jar: None,
        }
    }
}
