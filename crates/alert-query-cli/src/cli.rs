//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// alertq - inspect alert filters and the store keys they resolve to.
#[derive(Parser, Debug, Clone)]
#[command(name = "alertq")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "ALERTQ_CONFIG")]
    pub config: Option<PathBuf>,

    /// Namespace root, overriding the configuration file.
    #[arg(long, env = "ALERTQ_NAMESPACE_ROOT")]
    pub namespace_root: Option<String>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(short, long)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print the store keys a filter file resolves to.
    Keys(FilterArgs),

    /// Print the processing order of a filter file and its keys.
    Plan(FilterArgs),

    /// Print the alerts in a file that match every filter.
    Match(AlertArgs),

    /// Load alerts into an in-memory store and run the full query.
    Query(AlertArgs),
}

/// Arguments naming a filter file.
#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Filter file (`.json` or TOML).
    #[arg(long = "filters", value_name = "FILE")]
    pub filters: PathBuf,
}

/// Arguments naming a filter file and an alert file.
#[derive(Args, Debug, Clone)]
pub struct AlertArgs {
    /// Filter file (`.json` or TOML).
    #[arg(long = "filters", value_name = "FILE")]
    pub filters: PathBuf,

    /// JSON file holding an array of alerts.
    #[arg(long = "alerts", value_name = "FILE")]
    pub alerts: PathBuf,
}
