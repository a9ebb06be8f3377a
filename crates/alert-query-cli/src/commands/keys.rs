//! `alertq keys` - print the store keys a filter file resolves to.

use std::io::Write;

use alert_query::KeySchema;

use crate::cli::FilterArgs;
use crate::commands::load_filters;
use crate::error::CliError;
use crate::output::{KeyReport, OutputFormat};

/// Derives the minimal key set for a filter file.
#[derive(Debug, Clone)]
pub struct KeysCommand {
    schema: KeySchema,
}

impl KeysCommand {
    /// Create a new keys command under `schema`.
    #[must_use]
    pub const fn new(schema: KeySchema) -> Self {
        Self { schema }
    }

    /// Build the report without writing it.
    ///
    /// # Errors
    ///
    /// Returns an error if the filter file cannot be loaded or a key
    /// segment is invalid.
    pub fn report(&self, args: &FilterArgs) -> Result<KeyReport, CliError> {
        let filters = load_filters(&args.filters)?;
        let keys = self.schema.derive(&filters)?;
        Ok(KeyReport {
            root: self.schema.root().to_string(),
            keys: keys.iter().map(str::to_string).collect(),
        })
    }

    /// Execute the keys command.
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
