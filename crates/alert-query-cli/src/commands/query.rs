//! `alertq query` - run a filter file against an in-memory alert store.

use std::io::Write;

use alert_query::{KeySchema, MemoryAlertSource, QueryPlan};

use crate::cli::AlertArgs;
use crate::commands::{load_alerts, load_filters};
use crate::error::CliError;
use crate::output::{AlertReport, OutputFormat};

/// Stores the alert file under schema keys, then enumerates only the
/// planned keys.
#[derive(Debug, Clone)]
pub struct QueryCommand {
    schema: KeySchema,
}

impl QueryCommand {
    /// Create a new query command under `schema`.
    #[must_use]
    pub const fn new(schema: KeySchema) -> Self {
        Self { schema }
    }

    /// Build the report without writing it.
    ///
    /// # Errors
    ///
    /// Returns an error if either file cannot be loaded, an alert cannot
    /// be keyed, or the query fails.
    pub fn report(&self, args: &AlertArgs) -> Result<AlertReport, CliError> {
        let plan = QueryPlan::with_schema(&self.schema, load_filters(&args.filters)?)?;

        let source = MemoryAlertSource::new(self.schema.clone());
        for alert in load_alerts(&args.alerts)? {
            source.insert(alert)?;
        }

        let outcome = plan.execute(&source)?;
        Ok(AlertReport {
            keys_enumerated: outcome.keys_enumerated,
            examined: outcome.candidates,
            alerts: outcome.alerts,
        })
    }

    /// Execute the query command.
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    fn json_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const ALERTS: &str = r#"[
        {"id": "a1", "alert_type": 5, "resource": "volume", "resource_id": "vol-1",
         "timestamp": "2026-01-01T00:00:00Z"},
        {"id": "a2", "alert_type": 6, "resource": "volume", "resource_id": "vol-1",
         "timestamp": "2026-01-01T00:00:00Z"},
        {"id": "a3", "alert_type": 5, "resource": "node", "resource_id": "n1",
         "timestamp": "2026-01-01T00:00:00Z"}
    ]"#;

    #[test]
    fn query_enumerates_only_planned_subtrees() {
        let filters = json_file(
            r#"[{"kind": "query_alert_type",
                 "value": {"alert_type": 5, "resource_type": "volume"}}]"#,
        );
        let alerts = json_file(ALERTS);
        let report = QueryCommand::new(KeySchema::default())
            .report(&AlertArgs {
                filters: filters.path().to_path_buf(),
                alerts: alerts.path().to_path_buf(),
            })
            .unwrap();
        assert_eq!(report.keys_enumerated, 1);
        assert_eq!(report.examined, 1);
        assert_eq!(report.alerts.len(), 1);
        assert_eq!(report.alerts[0].id, "a1");
    }

    #[test]
    fn query_without_query_filters_scans_root() {
        let filters = json_file(r#"[{"kind": "alert_type", "value": 5}]"#);
        let alerts = json_file(ALERTS);
        let report = QueryCommand::new(KeySchema::default())
            .report(&AlertArgs {
                filters: filters.path().to_path_buf(),
                alerts: alerts.path().to_path_buf(),
            })
            .unwrap();
        assert_eq!(report.keys_enumerated, 1);
        assert_eq!(report.examined, 3);
        assert_eq!(report.alerts.len(), 2);
    }
}
