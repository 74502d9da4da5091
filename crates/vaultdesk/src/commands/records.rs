//! Record command handlers.
//!
//! Records stay as JSON values here: instrument collections carry
//! per-product fields, and structured output should pass them through
//! untouched. The table view picks the common columns.

use serde_json::Value;
use tabled::Tabled;
use vaultdesk_core::format::{format_number, parse_number};
use vaultdesk_core::{Backoffice, BackofficeConfig, Page, Pagination, Resource};

use crate::cli::{GlobalOpts, RecordsArgs, RecordsCommand, ResourceArg};
use crate::error::CliError;
use crate::output::{self, field_text, first_field};

use super::util;

// ── Resource mapping ────────────────────────────────────────────────

pub fn resource(arg: ResourceArg) -> Resource {
    match arg {
        ResourceArg::Banks => Resource::Banks,
        ResourceArg::Brokers => Resource::Brokers,
        ResourceArg::Issuers => Resource::Issuers,
        ResourceArg::Owners => Resource::Owners,
        ResourceArg::Users => Resource::Users,
        ResourceArg::Roles => Resource::Roles,
        ResourceArg::Permissions => Resource::Permissions,
        ResourceArg::Examples => Resource::Examples,
        ResourceArg::Deposits => Resource::Deposits,
        ResourceArg::Savings => Resource::Savings,
        ResourceArg::Insurances => Resource::Insurances,
        ResourceArg::Bonds => Resource::Bonds,
        ResourceArg::DividendStocks => Resource::DividendStocks,
        ResourceArg::PaymentStocks => Resource::PaymentStocks,
        ResourceArg::Stocks => Resource::Stocks,
    }
}

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Code")]
    code: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Amount")]
    amount: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Created")]
    created: String,
}

/// Amounts arrive as numbers or as formatted strings.
fn amount_text(record: &Value) -> String {
    let value = match record.get("amount").or_else(|| record.get("nominal")) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => Some(parse_number(s)),
        _ => return String::new(),
    };
    format_number(value, 2)
}

fn status_text(record: &Value) -> String {
    let archived = match record.get("is_archived") {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    };
    if archived {
        "archived".into()
    } else {
        field_text(record, "status")
    }
}

impl From<&Value> for RecordRow {
    fn from(r: &Value) -> Self {
        Self {
            id: field_text(r, "_id"),
            code: first_field(r, &["code", "transaction_number"]),
            name: first_field(r, &["name", "username", "title"]),
            amount: amount_text(r),
            status: status_text(r),
            created: util::display_timestamp(&field_text(r, "created_at")),
        }
    }
}

// ── Detail view ─────────────────────────────────────────────────────

fn record_detail(record: &Value, color: bool) -> String {
    let Value::Object(map) = record else {
        return record.to_string();
    };
    map.iter()
        .map(|(key, value)| {
            let text = match value {
                Value::Null => "-".to_owned(),
                Value::String(s) if key.ends_with("_at") => util::display_timestamp(s),
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            output::detail_line(key, &text, color)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn pagination_summary(pagination: &Pagination) -> String {
    format!(
        "Page {} of {} ({} records)",
        pagination.page,
        pagination.page_count.max(1),
        pagination.total_document
    )
}

fn print_page(page: &Page<Value>, global: &GlobalOpts) {
    let out = output::render_list(
        &global.output,
        &page.data,
        |r| RecordRow::from(r),
        |r| field_text(r, "_id"),
    );
    output::print_output(&out, global.quiet);
    if !global.quiet && matches!(global.output, crate::cli::OutputFormat::Table) {
        eprintln!("{}", pagination_summary(&page.pagination));
    }
}

fn print_record(record: &Value, global: &GlobalOpts) {
    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        record,
        |r| record_detail(r, color),
        |r| field_text(r, "_id"),
    );
    output::print_output(&out, global.quiet);
}

fn done(global: &GlobalOpts, message: &str) {
    if !global.quiet {
        eprintln!("{message}");
    }
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub async fn handle(
    config: BackofficeConfig,
    args: &RecordsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        RecordsCommand::List {
            resource: arg,
            ref nested,
            ref list,
        } => {
            let res = resource(arg);
            let query = util::list_query(list, res.list_defaults().page_size)?;
            let nested = nested.clone();
            let page: Page<Value> = Backoffice::oneshot(config, |bo| async move {
                match nested {
                    Some(collection) => bo.list_nested(res, &collection, &query).await,
                    None => bo.list(res, &query).await,
                }
            })
            .await?;
            print_page(&page, global);
            Ok(())
        }

        RecordsCommand::Get { resource: arg, ref id } => {
            let id = id.clone();
            let record: Value = Backoffice::oneshot(config, |bo| async move {
                bo.find(resource(arg), &id).await
            })
            .await?;
            print_record(&record, global);
            Ok(())
        }

        RecordsCommand::Create { resource: arg, ref body } => {
            let body = util::read_body(body)?;
            let inserted = Backoffice::oneshot(config, |bo| async move {
                bo.create(resource(arg), &body).await
            })
            .await?;
            output::print_output(&inserted.inserted_id, global.quiet);
            done(global, "Record created");
            Ok(())
        }

        RecordsCommand::Draft { resource: arg, ref body } => {
            let body = util::read_body(body)?;
            let inserted = Backoffice::oneshot(config, |bo| async move {
                bo.draft(resource(arg), &body).await
            })
            .await?;
            output::print_output(&inserted.inserted_id, global.quiet);
            done(global, "Draft saved");
            Ok(())
        }

        RecordsCommand::Update {
            resource: arg,
            ref id,
            draft,
            ref body,
        } => {
            let body = util::read_body(body)?;
            let id = id.clone();
            let result = Backoffice::oneshot(config, |bo| async move {
                if draft {
                    bo.update_draft(resource(arg), &id, &body).await
                } else {
                    bo.update(resource(arg), &id, &body).await
                }
            })
            .await?;
            done(global, &format!("Updated {} record(s)", result.modified_count));
            Ok(())
        }

        RecordsCommand::Archive {
            resource: arg,
            ref id,
            ref reason,
        } => {
            let body = util::reason_body(reason.as_deref());
            let id = id.clone();
            Backoffice::oneshot(config, |bo| async move {
                bo.archive(resource(arg), &id, &body).await
            })
            .await?;
            done(global, "Record archived");
            Ok(())
        }

        RecordsCommand::Restore {
            resource: arg,
            ref id,
            ref reason,
        } => {
            let body = util::reason_body(reason.as_deref());
            let id = id.clone();
            Backoffice::oneshot(config, |bo| async move {
                bo.restore(resource(arg), &id, &body).await
            })
            .await?;
            done(global, "Record restored");
            Ok(())
        }

        RecordsCommand::Delete {
            resource: arg,
            ref id,
            ref reason,
        } => {
            if !util::confirm(
                "delete",
                &format!("Delete {} record '{id}'? This cannot be undone.", resource(arg)),
                global.yes,
            )? {
                return Ok(());
            }
            let id = id.clone();
            let reason = reason.clone();
            let result = Backoffice::oneshot(config, |bo| async move {
                bo.delete(resource(arg), &id, reason.as_deref()).await
            })
            .await?;
            done(global, &format!("Deleted {} record(s)", result.deleted_count));
            Ok(())
        }

        RecordsCommand::Action {
            resource: arg,
            ref id,
            ref action,
            ref body,
        } => {
            let body = util::read_body(body)?;
            let id = id.clone();
            let action = action.clone();
            let response: Value = Backoffice::oneshot(config, |bo| async move {
                bo.action(resource(arg), &id, &action, &body).await
            })
            .await?;
            print_record(&response, global);
            Ok(())
        }
    }
}
