// Back-office response types
//
// Typed records for master data and the audit trail. The server is loose
// about field presence (drafts carry half a record), so nearly everything
// is optional and unknown fields land in `extra`. Instrument records
// (deposits, bonds, stocks, ...) stay as `serde_json::Value`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::context::{BrowserInfo, DeviceInfo, OsInfo};

/// `is_archived` arrives as a bool or as `"true"`/`"false"`.
fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Text(String),
        Null(()),
    }
    Ok(match Raw::deserialize(deserializer)? {
        Raw::Bool(b) => b,
        Raw::Text(s) => s.eq_ignore_ascii_case("true"),
        Raw::Null(()) => false,
    })
}

// ── Master data ──────────────────────────────────────────────────────

/// Fields shared by every master-data record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordMeta {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_archived: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_by_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bank {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub account_name: Option<String>,
}

/// Entry of `GET /v1/master/banks/accounts`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BankAccount {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub bank_id: Option<String>,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Brokers, issuers and owners share the bare master shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MasterRecord {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

pub type Broker = MasterRecord;
pub type Issuer = MasterRecord;
pub type Owner = MasterRecord;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoleRecord {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(default)]
    pub permissions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<RoleRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Permission {
    #[serde(flatten)]
    pub meta: RecordMeta,
    #[serde(default)]
    pub description: Option<String>,
}

// ── Audit trail ──────────────────────────────────────────────────────

/// Request metadata recorded with an audit entry (from the client
/// context header).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditMetadata {
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default)]
    pub device: Option<DeviceInfo>,
    #[serde(default)]
    pub browser: Option<BrowserInfo>,
    #[serde(default)]
    pub os: Option<OsInfo>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeSummary {
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default)]
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChangeSnapshot {
    #[serde(default)]
    pub before: Option<BTreeMap<String, serde_json::Value>>,
    #[serde(default)]
    pub after: Option<BTreeMap<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Changes {
    #[serde(default)]
    pub summary: Option<ChangeSummary>,
    #[serde(default)]
    pub snapshot: Option<ChangeSnapshot>,
}

/// Who did what to which entity, and when.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    #[serde(rename = "_id", default)]
    pub id: Option<String>,
    #[serde(default)]
    pub operation_id: Option<String>,
    #[serde(default)]
    pub entity_type: Option<String>,
    #[serde(default)]
    pub entity_id: Option<String>,
    #[serde(default)]
    pub entity_ref: Option<String>,
    #[serde(default)]
    pub actor_type: Option<String>,
    #[serde(default)]
    pub actor_id: Option<String>,
    #[serde(default)]
    pub actor_name: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub module: Option<String>,
    #[serde(default)]
    pub system_reason: Option<String>,
    #[serde(default)]
    pub user_reason: Option<String>,
    #[serde(default)]
    pub metadata: Option<AuditMetadata>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Entry of `GET /v1/audit-logs`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditLog {
    #[serde(flatten)]
    pub entry: AuditEntry,
    #[serde(default)]
    pub changes: Option<Changes>,
}

/// One field change of an entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldHistory {
    #[serde(flatten)]
    pub entry: AuditEntry,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub before: Option<serde_json::Value>,
    #[serde(default)]
    pub after: Option<serde_json::Value>,
}

/// Latest change per field of an entity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldSummary {
    #[serde(default)]
    pub actor_id: Option<String>,
    #[serde(default)]
    pub actor_name: Option<String>,
    #[serde(default)]
    pub field: Option<String>,
    #[serde(default)]
    pub newest_created_at: Option<DateTime<Utc>>,
}

/// Named sequence used for document numbering.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Counter {
    pub name: String,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub seq: u64,
    #[serde(default)]
    pub seq_pad: u32,
    #[serde(default)]
    pub value: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}
