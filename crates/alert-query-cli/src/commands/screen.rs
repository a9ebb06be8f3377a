//! `alertq match` - screen an alert file against a filter file.

use std::io::Write;

use alert_query::{KeySchema, QueryPlan};
use tracing::info;

use crate::cli::AlertArgs;
use crate::commands::{load_alerts, load_filters};
use crate::error::CliError;
use crate::output::{AlertReport, OutputFormat};

/// Applies every filter directly to the alerts in a file.
#[derive(Debug, Clone)]
pub struct MatchCommand {
    schema: KeySchema,
}

impl MatchCommand {
    /// Create a new match command under `schema`.
    #[must_use]
    pub const fn new(schema: KeySchema) -> Self {
        Self { schema }
    }

    /// Build the report without writing it.
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be loaded or a filter fails.
    pub fn report(&self, args: &AlertArgs) -> Result<AlertReport, CliError> {
        let plan = QueryPlan::with_schema(&self.schema, load_filters(&args.filters)?)?;
        let alerts = load_alerts(&args.alerts)?;
        let examined = alerts.len();
        let matched = plan.screen(alerts)?;
        info!(examined, matched = matched.len(), "screened alert file");
        Ok(AlertReport {
            keys_enumerated: 0,
            examined,
            alerts: matched,
        })
    }

    /// Execute the match command.
    ///
    /// # Errors
    ///
    /// Returns an error if the report cannot be built or written.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        args: &AlertArgs,
    ) -> Result<(), CliError> {
        let report = self.report(args)?;
        format.write(writer, &report)?;
        Ok(())
    }
}
