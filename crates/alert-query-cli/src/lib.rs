//! # alert-query-cli
//!
//! The `alertq` command-line tool.
//!
//! Provides commands for:
//! - Printing the minimal store keys for a filter file
//! - Showing filter processing order
//! - Screening an alert file against filters
//! - Running a full query against an in-memory alert store
//!
//! Filter files are JSON (`.json`) or TOML; alert files are JSON arrays.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::{AlertArgs, Cli, Commands, FilterArgs, Format};
pub use error::CliError;
pub use output::OutputFormat;
