//! Audit trail command handlers.

use serde_json::Value;
use tabled::Tabled;
use vaultdesk_core::models::{AuditLog, FieldHistory, FieldSummary};
use vaultdesk_core::table::DEFAULT_PAGE_SIZE;
use vaultdesk_core::{Backoffice, BackofficeConfig, entity_link};

use crate::cli::{AuditArgs, AuditCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct AuditLogRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Entity")]
    entity: String,
    #[tabled(rename = "Actor")]
    actor: String,
    #[tabled(rename = "Fields")]
    fields: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

impl From<&AuditLog> for AuditLogRow {
    fn from(log: &AuditLog) -> Self {
        let e = &log.entry;
        let entity = entity_link(e.entity_type.as_deref(), e.entity_id.as_deref())
            .or_else(|| e.entity_ref.clone())
            .or_else(|| e.entity_type.clone())
            .unwrap_or_default();
        let fields = log
            .changes
            .as_ref()
            .and_then(|c| c.summary.as_ref())
            .map(|s| s.fields.join(", "))
            .unwrap_or_default();
        Self {
            time: util::display_time(e.created_at.as_ref()),
            action: e.action.clone().unwrap_or_default(),
            entity,
            actor: e.actor_name.clone().unwrap_or_default(),
            fields,
            reason: e
                .user_reason
                .clone()
                .or_else(|| e.system_reason.clone())
                .unwrap_or_default(),
        }
    }
}

fn value_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "-".into(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[derive(Tabled)]
struct FieldHistoryRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Before")]
    before: String,
    #[tabled(rename = "After")]
    after: String,
    #[tabled(rename = "Actor")]
    actor: String,
}

impl From<&FieldHistory> for FieldHistoryRow {
    fn from(h: &FieldHistory) -> Self {
        Self {
            time: util::display_time(h.entry.created_at.as_ref()),
            field: h.field.clone().unwrap_or_default(),
            before: value_text(h.before.as_ref()),
            after: value_text(h.after.as_ref()),
            actor: h.entry.actor_name.clone().unwrap_or_default(),
        }
    }
}

#[derive(Tabled)]
struct FieldSummaryRow {
    #[tabled(rename = "Field")]
    field: String,
    #[tabled(rename = "Last changed by")]
    actor: String,
    #[tabled(rename = "Last changed")]
    time: String,
}

impl From<&FieldSummary> for FieldSummaryRow {
    fn from(s: &FieldSummary) -> Self {
        Self {
            field: s.field.clone().unwrap_or_default(),
            actor: s.actor_name.clone().unwrap_or_default(),
            time: util::display_time(s.newest_created_at.as_ref()),
        }
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    config: BackofficeConfig,
    args: &AuditArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        AuditCommand::Logs { group, ref list } => {
            let query = util::list_query(list, DEFAULT_PAGE_SIZE)?;
            let page = Backoffice::oneshot(config, |bo| async move {
                bo.audit_logs(&query, group).await
            })
            .await?;
            let out = output::render_list(
                &global.output,
                &page.data,
                |l| AuditLogRow::from(l),
                |l| l.entry.id.clone().unwrap_or_default(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AuditCommand::FieldHistories {
            ref entity_id,
            ref list,
        } => {
            let query = util::list_query(list, DEFAULT_PAGE_SIZE)?;
            let entity_id = entity_id.clone();
            let page = Backoffice::oneshot(config, |bo| async move {
                bo.field_histories(&entity_id, &query).await
            })
            .await?;
            let out = output::render_list(
                &global.output,
                &page.data,
                |h| FieldHistoryRow::from(h),
                |h| h.field.clone().unwrap_or_default(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AuditCommand::FieldsSummary {
            ref entity_id,
            ref list,
        } => {
            let query = util::list_query(list, DEFAULT_PAGE_SIZE)?;
            let entity_id = entity_id.clone();
            let page = Backoffice::oneshot(config, |bo| async move {
                bo.fields_summary(&entity_id, &query).await
            })
            .await?;
            let out = output::render_list(
                &global.output,
                &page.data,
                |s| FieldSummaryRow::from(s),
                |s| s.field.clone().unwrap_or_default(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn audit_row_links_known_entities() {
        let log: AuditLog = serde_json::from_value(serde_json::json!({
            "_id": "a1",
            "entity_type": "users",
            "entity_id": "u1",
            "action": "update",
            "actor_name": "Ana",
            "user_reason": "typo",
            "created_at": "2024-05-01T08:30:00Z",
            "changes": { "summary": { "fields": ["name", "email"], "count": 2 } },
        }))
        .expect("audit log");

        let row = AuditLogRow::from(&log);
        assert_eq!(row.entity, "/master/users/u1");
        assert_eq!(row.fields, "name, email");
        assert_eq!(row.reason, "typo");
        assert_eq!(row.time, "2024-05-01 08:30:00");
    }

    #[test]
    fn history_renders_missing_values_as_dash() {
        let history: FieldHistory = serde_json::from_value(serde_json::json!({
            "field": "amount",
            "before": null,
            "after": 1500,
        }))
        .expect("field history");
        let row = FieldHistoryRow::from(&history);
        assert_eq!(row.before, "-");
        assert_eq!(row.after, "1500");
    }
}
