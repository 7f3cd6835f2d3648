//! Clap derive structures for the `stackvault` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// stackvault -- scheduled backups for container-platform stacks
#[derive(Debug, Parser)]
#[command(
    name = "stackvault",
    version,
    about = "Back up container-platform stacks and configuration",
    long_about = "Exports the platform configuration archive and every stack's compose\n\
        file plus metadata into a dated directory tree, then prunes backups\n\
        older than the retention window.",
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
    /// Platform profile to use
    #[arg(long, short = 'p', env = "STACKVAULT_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Platform base URL (overrides profile)
    #[arg(long, short = 'u', env = "STACKVAULT_URL", global = true)]
    pub url: Option<String>,

    /// Platform API key
    #[arg(long, env = "STACKVAULT_API_KEY", global = true, hide_env = true)]
    pub api_key: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "STACKVAULT_OUTPUT",
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
    #[arg(long, short = 'k', env = "STACKVAULT_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "STACKVAULT_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Connection timeout in seconds
    #[arg(long, global = true)]
    pub connect_timeout: Option<u64>,

    /// Retries after a transient failure
    #[arg(long, global = true)]
    pub retries: Option<u32>,

    /// Seconds to wait between retries
    #[arg(long, global = true)]
    pub retry_delay: Option<u64>,

    /// Retry every failed request, not only transient ones
    #[arg(long, global = true)]
    pub retry_all_errors: bool,

    /// Log line format on stderr
    #[arg(long, env = "STACKVAULT_LOG_FORMAT", default_value = "text", global = true)]
    pub log_format: LogFormat,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
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

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per event
    Json,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a full backup: platform export, stack files, optional cleanup
    #[command(alias = "run")]
    Backup(BackupArgs),

    /// Inspect stacks on the platform
    #[command(alias = "st")]
    Stacks(StacksArgs),

    /// Inspect endpoints (environments) on the platform
    #[command(alias = "ep")]
    Endpoints(EndpointsArgs),

    /// Remove dated backup directories past the retention window
    Clean(CleanArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  BACKUP
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct BackupArgs {
    /// Root directory for dated backup folders
    #[arg(long, short = 'd', env = "STACKVAULT_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Password for the platform export archive
    #[arg(long, env = "STACKVAULT_BACKUP_PASSWORD", hide_env = true)]
    pub backup_password: Option<String>,

    /// Remove old backups after this run
    #[arg(long)]
    pub cleanup: bool,

    /// Retention window in days (used with --cleanup)
    #[arg(long)]
    pub retention_days: Option<u32>,

    /// Stack files fetched in parallel
    #[arg(long, short = 'j')]
    pub concurrency: Option<usize>,

    /// Fail the run when the platform export fails
    #[arg(long)]
    pub require_platform_backup: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  STACKS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct StacksArgs {
    #[command(subcommand)]
    pub command: StacksCommand,
}

#[derive(Debug, Subcommand)]
pub enum StacksCommand {
    /// List stacks with their endpoint and source
    #[command(alias = "ls")]
    List,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  ENDPOINTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct EndpointsArgs {
    #[command(subcommand)]
    pub command: EndpointsCommand,
}

#[derive(Debug, Subcommand)]
pub enum EndpointsCommand {
    /// List endpoints and the folder names they back up to
    #[command(alias = "ls")]
    List,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CLEAN
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CleanArgs {
    /// Root directory for dated backup folders
    #[arg(long, short = 'd', env = "STACKVAULT_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Retention window in days
    #[arg(long)]
    pub retention_days: Option<u32>,

    /// Show what would be removed without deleting anything
    #[arg(long, short = 'n')]
    pub dry_run: bool,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a configuration value
    Set {
        /// Config key (dot-separated path, e.g., "profiles.home.url")
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store the API key (or export password) in the system keyring
    SetKey {
        /// Profile name
        #[arg(long)]
        profile: Option<String>,

        /// Store the export archive password instead of the API key
        #[arg(long)]
        backup_password: bool,
    },

    /// Print the config file location
    Path,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
