//! Clap derive structures for the `vaultdesk` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// vaultdesk -- command-line access to a financial back office
#[derive(Debug, Parser)]
#[command(
    name = "vaultdesk",
    version,
    about = "Work with a vaultdesk back office from the command line",
    long_about = "Browse and manage back-office records (deposits, savings, bonds,\n\
        stocks, insurances and master data), read audit trails and\n\
        sequence counters over the back office's REST API.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Back-office profile to use
    #[arg(long, short = 'p', env = "VAULTDESK_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API root URL (overrides profile)
    #[arg(long, short = 'u', env = "VAULTDESK_URL", global = true)]
    pub url: Option<String>,

    /// Username to sign in with (overrides profile)
    #[arg(long, env = "VAULTDESK_USERNAME", global = true)]
    pub username: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "VAULTDESK_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "VAULTDESK_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds [default: profile value, else 30]
    #[arg(long, env = "VAULTDESK_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in, inspect and rotate the session
    Auth(AuthArgs),

    /// List, inspect and change back-office records
    #[command(alias = "rec", alias = "r")]
    Records(RecordsArgs),

    /// Read audit logs and field histories
    Audit(AuditArgs),

    /// Show the next value of a sequence counter
    Counter {
        /// Counter name, e.g. "deposit"
        name: String,
    },

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Auth ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Verify credentials by signing in and out again
    Signin,

    /// End the server session
    Signout,

    /// Show the signed-in identity and its permissions
    Me,

    /// Rotate the session credential
    Refresh,

    /// Email a password-reset code
    RequestPassword {
        /// Account email address
        email: String,
    },

    /// Set a new password with a reset code (prompts for the password)
    ResetPassword {
        /// Code from the reset email
        #[arg(long)]
        code: String,
    },
}

// ── Records ──────────────────────────────────────────────────────────

/// Record collections exposed by the back office.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ResourceArg {
    Banks,
    Brokers,
    Issuers,
    Owners,
    Users,
    Roles,
    Permissions,
    Examples,
    Deposits,
    Savings,
    Insurances,
    Bonds,
    DividendStocks,
    PaymentStocks,
    Stocks,
}

#[derive(Debug, Args)]
pub struct RecordsArgs {
    #[command(subcommand)]
    pub command: RecordsCommand,
}

/// Shared filtering, sorting and paging for list commands.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Filter by field, repeatable (e.g. --search name=Central)
    #[arg(long, short = 's', value_name = "FIELD=VALUE")]
    pub search: Vec<String>,

    /// Sort expression, `-` for descending (e.g. "-created_at,name")
    #[arg(long)]
    pub sort: Option<String>,

    /// Page number (1-based)
    #[arg(long)]
    pub page: Option<String>,

    /// Records per page
    #[arg(long)]
    pub page_size: Option<String>,

    /// A list-view URL query string (e.g. "search.name=a&sort=-code&page=2");
    /// explicit flags win over it
    #[arg(long, value_name = "QUERY")]
    pub query: Option<String>,
}

/// A JSON request body, inline or from a file.
#[derive(Debug, Args)]
pub struct BodyArgs {
    /// Inline JSON body
    #[arg(long, short = 'd', conflicts_with = "from_file")]
    pub data: Option<String>,

    /// Read the JSON body from a file
    #[arg(long, short = 'F')]
    pub from_file: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
pub enum RecordsCommand {
    /// List records
    #[command(alias = "ls")]
    List {
        resource: ResourceArg,

        /// List a nested collection instead (e.g. "accounts" of banks)
        #[arg(long)]
        nested: Option<String>,

        #[command(flatten)]
        list: ListArgs,
    },

    /// Show one record
    Get { resource: ResourceArg, id: String },

    /// Create a record
    Create {
        resource: ResourceArg,
        #[command(flatten)]
        body: BodyArgs,
    },

    /// Save a draft record
    Draft {
        resource: ResourceArg,
        #[command(flatten)]
        body: BodyArgs,
    },

    /// Update a record (or its draft with --draft)
    Update {
        resource: ResourceArg,
        id: String,
        /// Update the draft instead of the record
        #[arg(long)]
        draft: bool,
        #[command(flatten)]
        body: BodyArgs,
    },

    /// Archive a record
    Archive {
        resource: ResourceArg,
        id: String,
        /// Reason recorded in the audit trail
        #[arg(long)]
        reason: Option<String>,
    },

    /// Restore an archived record
    Restore {
        resource: ResourceArg,
        id: String,
        #[arg(long)]
        reason: Option<String>,
    },

    /// Delete a record
    #[command(alias = "rm")]
    Delete {
        resource: ResourceArg,
        id: String,
        /// Reason recorded in the audit trail
        #[arg(long)]
        reason: Option<String>,
    },

    /// Run a named instrument action (e.g. withdraw, redeem)
    Action {
        resource: ResourceArg,
        id: String,
        action: String,
        #[command(flatten)]
        body: BodyArgs,
    },
}

// ── Audit ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AuditArgs {
    #[command(subcommand)]
    pub command: AuditCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuditCommand {
    /// List audit log entries
    Logs {
        /// One entry per operation instead of per record change
        #[arg(long)]
        group: bool,

        #[command(flatten)]
        list: ListArgs,
    },

    /// Change history of one entity's fields
    FieldHistories {
        entity_id: String,

        #[command(flatten)]
        list: ListArgs,
    },

    /// Latest change per field of one entity
    FieldsSummary {
        entity_id: String,

        #[command(flatten)]
        list: ListArgs,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current configuration (secrets masked)
    Show,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a password in the system keyring
    SetPassword {
        /// Profile to store the password for (defaults to the active one)
        #[arg(long)]
        profile: Option<String>,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
