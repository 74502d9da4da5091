//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::Path;

use serde_json::Value;
use vaultdesk_core::format::format_datetime;
use vaultdesk_core::{ListQuery, QueryContext, TableFilter};

use crate::cli::{BodyArgs, ListArgs};
use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal to ask on, `action` fails instead of proceeding.
pub fn confirm(action: &str, message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.to_owned(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Read and parse a JSON file for `--from-file` flags.
pub fn read_json_file(path: &Path) -> Result<Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents).map_err(|e| CliError::Validation {
        field: "from-file".into(),
        reason: format!("invalid JSON: {e}"),
    })
}

/// The request body from `--data` or `--from-file`, `{}` when neither.
pub fn read_body(body: &BodyArgs) -> Result<Value, CliError> {
    match (&body.data, &body.from_file) {
        (Some(data), _) => serde_json::from_str(data).map_err(|e| CliError::Validation {
            field: "data".into(),
            reason: format!("invalid JSON: {e}"),
        }),
        (None, Some(path)) => read_json_file(path),
        (None, None) => Ok(Value::Object(serde_json::Map::new())),
    }
}

/// `{"reason": ...}` for audited actions, `{}` without one.
pub fn reason_body(reason: Option<&str>) -> Value {
    reason.map_or_else(
        || Value::Object(serde_json::Map::new()),
        |r| serde_json::json!({ "reason": r }),
    )
}

// ── List arguments ───────────────────────────────────────────────────

/// Decode list flags the way a list view decodes its URL.
///
/// `--query` is applied first, so explicit `--search`, `--sort`,
/// `--page` and `--page-size` flags override it.
pub fn list_context(args: &ListArgs, default_page_size: u32) -> Result<QueryContext, CliError> {
    let mut pairs: Vec<(String, String)> = Vec::new();

    if let Some(ref query) = args.query {
        pairs.extend(
            url::form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
                .map(|(k, v)| (k.into_owned(), v.into_owned())),
        );
    }

    for term in &args.search {
        let (field, value) = term.split_once('=').ok_or_else(|| CliError::Validation {
            field: "search".into(),
            reason: format!("expected FIELD=VALUE, got '{term}'"),
        })?;
        pairs.push((format!("search.{}", field.trim()), value.to_owned()));
    }
    if let Some(ref sort) = args.sort {
        pairs.push(("sort".into(), sort.clone()));
    }
    if let Some(ref page) = args.page {
        pairs.push(("page".into(), page.clone()));
    }
    if let Some(ref size) = args.page_size {
        pairs.push(("page-size".into(), size.clone()));
    }

    let mut ctx = QueryContext::new(TableFilter::default().with_default_page_size(default_page_size));
    ctx.apply(&pairs);
    Ok(ctx)
}

pub fn list_query(args: &ListArgs, default_page_size: u32) -> Result<ListQuery, CliError> {
    Ok(list_context(args, default_page_size)?.table.to_list_query())
}

// ── Display helpers ──────────────────────────────────────────────────

/// RFC 3339 timestamp as `YYYY-MM-DD HH:MM:SS` (UTC); other text as-is.
pub fn display_timestamp(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map_or_else(|_| raw.to_owned(), |t| format_datetime(t.naive_utc(), None))
}

pub fn display_time(at: Option<&chrono::DateTime<chrono::Utc>>) -> String {
    at.map(|t| format_datetime(t.naive_utc(), None)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(query: Option<&str>, search: &[&str], page: Option<&str>) -> ListArgs {
        ListArgs {
            search: search.iter().map(|s| (*s).to_owned()).collect(),
            sort: None,
            page: page.map(str::to_owned),
            page_size: None,
            query: query.map(str::to_owned),
        }
    }

    #[test]
    fn flags_override_url_query() {
        let ctx = list_context(
            &args(Some("?search.name=old&sort=-code&page=3"), &["name=new"], Some("2")),
            10,
        )
        .expect("context");

        assert_eq!(ctx.table.filter.get("name").map(String::as_str), Some("new"));
        assert_eq!(ctx.table.sort_string(), "-code");
        assert_eq!(ctx.table.pagination.page, 2);
    }

    #[test]
    fn malformed_search_is_rejected() {
        assert!(matches!(
            list_context(&args(None, &["name"], None), 10),
            Err(CliError::Validation { .. })
        ));
    }

    #[test]
    fn garbage_page_falls_back_to_first() {
        let ctx = list_context(&args(None, &[], Some("-4")), 10).expect("context");
        assert_eq!(ctx.table.pagination.page, 1);
    }

    #[test]
    fn timestamps_are_reformatted() {
        assert_eq!(display_timestamp("2024-03-01T08:15:00Z"), "2024-03-01 08:15:00");
        assert_eq!(display_timestamp("yesterday"), "yesterday");
    }
}
