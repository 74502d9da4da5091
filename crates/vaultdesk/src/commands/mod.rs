//! Command dispatch: bridges CLI args -> `Backoffice` calls -> output formatting.

pub mod audit;
pub mod auth;
pub mod config_cmd;
pub mod counter;
pub mod records;
pub mod util;

use vaultdesk_core::BackofficeConfig;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a back-office-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: &Command,
    config: BackofficeConfig,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Auth(args) => auth::handle(config, args, global).await,
        Command::Records(args) => records::handle(config, args, global).await,
        Command::Audit(args) => audit::handle(config, args, global).await,
        Command::Counter { name } => counter::handle(config, name, global).await,
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "config and completions run without a back office".into(),
        )),
    }
}
