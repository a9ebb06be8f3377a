//! Output formatting for CLI commands.
//!
//! Supports table (human-readable) and JSON output formats.

use std::io::Write;

use alert_query::Alert;
use serde::Serialize;

use crate::cli::Format;
use crate::error::CliError;

/// Output formatter that handles both table and JSON output.
#[derive(Debug, Clone)]
pub struct OutputFormat {
    format: Format,
}

impl OutputFormat {
    /// Create a new output formatter.
    #[must_use]
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    /// Check if JSON format is selected.
    #[must_use]
    pub const fn is_json(&self) -> bool {
        matches!(self.format, Format::Json)
    }

    /// Write a serializable value to the output.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write<W, T>(&self, writer: &mut W, value: &T) -> Result<(), CliError>
    where
        W: Write,
        T: Serialize + TableDisplay,
    {
        match self.format {
            Format::Json => {
                serde_json::to_writer_pretty(&mut *writer, value)
                    .map_err(|e| CliError::Format(format!("JSON serialization failed: {e}")))?;
                writeln!(writer)?;
            }
            Format::Table => {
                value.write_table(writer)?;
            }
        }
        Ok(())
    }

    /// Write a serializable value to a string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_string<T>(&self, value: &T) -> Result<String, CliError>
    where
        T: Serialize + TableDisplay,
    {
        let mut buf = Vec::new();
        self.write(&mut buf, value)?;
        String::from_utf8(buf).map_err(|e| CliError::Format(format!("UTF-8 error: {e}")))
    }
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::new(Format::Table)
    }
}

/// Trait for types that can be displayed as a table.
pub trait TableDisplay {
    /// Write the value as a human-readable table.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError>;
}

/// Keys derived from a filter file.
#[derive(Debug, Clone, Serialize)]
pub struct KeyReport {
    /// Namespace root the keys were derived under.
    pub root: String,
    /// Keys to enumerate, in lexical order.
    pub keys: Vec<String>,
}

impl TableDisplay for KeyReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        for key in &self.keys {
            writeln!(writer, "{key}")?;
        }
        Ok(())
    }
}

/// One filter in a plan.
#[derive(Debug, Clone, Serialize)]
pub struct PlanStep {
    /// Position in processing order.
    pub position: usize,
    /// Filter kind.
    pub kind: String,
    /// Whether the filter narrows the store key space.
    pub query: bool,
    /// Human-readable filter description.
    pub filter: String,
}

/// A filter file's processing order and keys.
#[derive(Debug, Clone, Serialize)]
pub struct PlanReport {
    /// Filters in processing order.
    pub steps: Vec<PlanStep>,
    /// Keys to enumerate.
    pub keys: Vec<String>,
}

impl TableDisplay for PlanReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        writeln!(writer, "Filters")?;
        writeln!(writer, "══════════════════════════════════")?;
        if self.steps.is_empty() {
            writeln!(writer, "  (none)")?;
        }
        for step in &self.steps {
            let marker = if step.query { "query" } else { "post" };
            writeln!(writer, "  {:>2}. {:<6} {}", step.position, marker, step.filter)?;
        }
        writeln!(writer)?;
        writeln!(writer, "Keys")?;
        writeln!(writer, "══════════════════════════════════")?;
        for key in &self.keys {
            writeln!(writer, "  {key}")?;
        }
        Ok(())
    }
}

/// Alerts that passed the filters.
#[derive(Debug, Clone, Serialize)]
pub struct AlertReport {
    /// Keys enumerated (zero when matching a file directly).
    pub keys_enumerated: usize,
    /// Alerts examined.
    pub examined: usize,
    /// Alerts that matched every filter.
    pub alerts: Vec<Alert>,
}

impl TableDisplay for AlertReport {
    fn write_table<W: Write>(&self, writer: &mut W) -> Result<(), CliError> {
        if self.alerts.is_empty() {
            writeln!(writer, "No matching alerts")?;
        } else {
            writeln!(
                writer,
                "{:<36}  {:<8}  {:<20}  {:>6}  {:>5}  {:<20}",
                "ID", "RESOURCE", "RESOURCE ID", "TYPE", "COUNT", "TIMESTAMP"
            )?;
            writeln!(writer, "{}", "─".repeat(104))?;
            for alert in &self.alerts {
                writeln!(
                    writer,
                    "{:<36}  {:<8}  {:<20}  {:>6}  {:>5}  {:<20}",
                    truncate(&alert.id, 36),
                    alert.resource.as_str(),
                    truncate(&alert.resource_id, 20),
                    alert.alert_type,
                    alert.count,
                    alert.timestamp.format("%Y-%m-%dT%H:%M:%SZ")
                )?;
            }
        }
        writeln!(writer)?;
        writeln!(
            writer,
            "Matched {} of {} alert(s)",
            self.alerts.len(),
            self.examined
        )?;
        if self.keys_enumerated > 0 {
            writeln!(writer, "Keys enumerated: {}", self.keys_enumerated)?;
        }
        Ok(())
    }
}

/// Truncate a string to a maximum length, adding "..." if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}
