//! `alertq` binary entrypoint.

use std::io;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use alert_query_cli::cli::{Cli, Commands};
use alert_query_cli::commands::{
    resolve_schema, KeysCommand, MatchCommand, PlanCommand, QueryCommand,
};
use alert_query_cli::output::OutputFormat;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let schema = resolve_schema(cli.config.as_deref(), cli.namespace_root.as_deref())
        .context("failed to resolve key schema")?;
    let format = OutputFormat::new(cli.format);
    let mut stdout = io::stdout().lock();

    match cli.command {
        Commands::Keys(args) => {
            KeysCommand::new(schema)
                .execute(&mut stdout, &format, &args)
                .with_context(|| format!("keys for {}", args.filters.display()))?;
        }
        Commands::Plan(args) => {
            PlanCommand::new(schema)
                .execute(&mut stdout, &format, &args)
                .with_context(|| format!("plan for {}", args.filters.display()))?;
        }
        Commands::Match(args) => {
            MatchCommand::new(schema)
                .execute(&mut stdout, &format, &args)
                .with_context(|| format!("match against {}", args.alerts.display()))?;
        }
        Commands::Query(args) => {
            QueryCommand::new(schema)
                .execute(&mut stdout, &format, &args)
                .with_context(|| format!("query against {}", args.alerts.display()))?;
        }
    }

    Ok(())
}
