//! Counter command handler.

use vaultdesk_core::models::Counter;
use vaultdesk_core::{Backoffice, BackofficeConfig};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util;

fn counter_detail(counter: &Counter, color: bool) -> String {
    [
        output::detail_line("Name", &counter.name, color),
        output::detail_line("Value", counter.value.as_deref().unwrap_or("-"), color),
        output::detail_line("Template", counter.template.as_deref().unwrap_or("-"), color),
        output::detail_line("Sequence", &counter.seq.to_string(), color),
        output::detail_line("Padding", &counter.seq_pad.to_string(), color),
        output::detail_line("Created", &util::display_time(counter.created_at.as_ref()), color),
    ]
    .join("\n")
}

pub async fn handle(
    config: BackofficeConfig,
    name: &str,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let name = name.to_owned();
    let counter =
        Backoffice::oneshot(config, |bo| async move { bo.counter(&name).await }).await?;

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &counter,
        |c| counter_detail(c, color),
        |c| c.value.clone().unwrap_or_default(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
