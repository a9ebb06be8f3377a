//! CLI command implementations.
//!
//! Each submodule implements a specific CLI command:
//! - [`keys`] - Derived store keys
//! - [`plan`] - Filter processing order
//! - [`screen`] - Matching alerts from a file
//! - [`query`] - End-to-end query against an in-memory store

pub mod keys;
pub mod plan;
pub mod query;
pub mod screen;

use std::path::Path;

use alert_query::{Alert, AlertQueryConfig, Filter, FilterFile, KeySchema};
use tracing::debug;

use crate::error::CliError;

pub use keys::KeysCommand;
pub use plan::PlanCommand;
pub use query::QueryCommand;
pub use screen::MatchCommand;

/// Builds the key schema from an optional config file and root override.
///
/// # Errors
///
/// Returns an error if the config file is unreadable or the resulting
/// schema is malformed.
pub fn resolve_schema(
    config: Option<&Path>,
    namespace_root: Option<&str>,
) -> Result<KeySchema, CliError> {
    let mut settings = match config {
        Some(path) => AlertQueryConfig::from_file(path)?,
        None => AlertQueryConfig::default(),
    };
    if let Some(root) = namespace_root {
        settings.namespace_root = root.to_string();
    }
    debug!(
        root = %settings.namespace_root,
        suffix = %settings.data_suffix,
        "resolved key schema"
    );
    Ok(settings.schema()?)
}

/// Reads and decodes a filter file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, or decoded.
pub fn load_filters(path: &Path) -> Result<Vec<Filter>, CliError> {
    let filters = FilterFile::from_path(path)?.decode()?;
    debug!(path = %path.display(), count = filters.len(), "loaded filters");
    Ok(filters)
}

/// Reads a JSON array of alerts.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not an alert array.
pub fn load_alerts(path: &Path) -> Result<Vec<Alert>, CliError> {
    let content = std::fs::read_to_string(path)?;
    let alerts: Vec<Alert> = serde_json::from_str(&content).map_err(|e| {
        CliError::InvalidInput(format!("alert file '{}': {e}", path.display()))
    })?;
    debug!(path = %path.display(), count = alerts.len(), "loaded alerts");
    Ok(alerts)
}
