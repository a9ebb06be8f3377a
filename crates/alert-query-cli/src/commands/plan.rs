//! `alertq plan` - show filter processing order and derived keys.

use std::io::Write;

use alert_query::{KeySchema, QueryPlan};

use crate::cli::FilterArgs;
use crate::commands::load_filters;
use crate::error::CliError;
use crate::output::{OutputFormat, PlanReport, PlanStep};

/// Describes how a filter file would be executed.
#[derive(Debug, Clone)]
pub struct PlanCommand {
    schema: KeySchema,
}

impl PlanCommand {
    /// Create a new plan command under `schema`.
    #[must_use]
    pub const fn new(schema: KeySchema) -> Self {
        Self { schema }
    }

    /// Build the report without writing it.
    ///
    /// # Errors
    ///
    /// Returns an error if the filter file cannot be loaded or planned.
    pub fn report(&self, args: &FilterArgs) -> Result<PlanReport, CliError> {
        let plan = QueryPlan::with_schema(&self.schema, load_filters(&args.filters)?)?;
        let steps = plan
            .filters()
            .iter()
            .enumerate()
            .map(|(i, filter)| PlanStep {
                position: i + 1,
                kind: filter.kind().to_string(),
                query: filter.kind().is_query(),
                filter: filter.to_string(),
            })
            .collect();
        Ok(PlanReport {
            steps,
            keys: plan.keys().iter().map(str::to_string).collect(),
        })
    }

    /// Execute the plan command.
    ///
    /// # Errors
    ///
    /// Returns an error if the report cannot be built or written.
    pub fn execute<W: Write>(
        &self,
        writer: &mut W,
        format: &OutputFormat,
        args: &FilterArgs,
    ) -> Result<(), CliError> {
        let report = self.report(args)?;
        format.write(writer, &report)?;
        Ok(())
    }
}
