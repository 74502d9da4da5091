// Client context header
//
// Every request carries a JSON description of the calling client
// (browser / os / device) so the back office can attribute audit
// entries. Absent values are omitted from the JSON.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Header carrying the serialized [`ClientContext`].
pub const CLIENT_CONTEXT_HEADER: &str = "client-user-agent";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrowserInfo {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
}

/// Fingerprint of the calling client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientContext {
    pub browser: BrowserInfo,
    pub os: OsInfo,
    pub device: DeviceInfo,
}

impl ClientContext {
    /// Describe the running process: this library as the "browser",
    /// the compile target as OS and device.
    pub fn detect() -> Self {
        Self {
            browser: BrowserInfo {
                kind: Some("cli".into()),
                name: Some(env!("CARGO_PKG_NAME").into()),
                version: Some(env!("CARGO_PKG_VERSION").into()),
            },
            os: OsInfo {
                name: Some(std::env::consts::OS.into()),
                version: None,
            },
            device: DeviceInfo {
                kind: Some("desktop".into()),
                model: Some(std::env::consts::ARCH.into()),
                vendor: None,
            },
        }
    }

    /// The header value; `None` only if serialization produced bytes
    /// a header cannot carry.
    pub fn header_value(&self) -> Option<HeaderValue> {
        let json = serde_json::to_string(self).ok()?;
        HeaderValue::from_str(&json).ok()
    }

    /// Attach the context header to an outgoing request.
    pub fn apply(&self, headers: &mut HeaderMap) {
        match self.header_value() {
            Some(value) => {
                headers.insert(HeaderName::from_static(CLIENT_CONTEXT_HEADER), value);
            }
            None => warn!("client context is not a valid header value; sending without it"),
        }
    }
}
