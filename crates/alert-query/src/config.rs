//! Query engine configuration.
//!
//! ```toml
//! namespace_root = "alerts"
//! data_suffix = "data"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AlertQueryError, Result};
use crate::keys::{KeySchema, DEFAULT_DATA_SUFFIX, DEFAULT_NAMESPACE_ROOT};

/// Configuration for key derivation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AlertQueryConfig {
    /// Key prefix under which all alerts are stored.
    #[serde(default = "default_namespace_root")]
    pub namespace_root: String,
    /// Final segment of every full alert key.
    #[serde(default = "default_data_suffix")]
    pub data_suffix: String,
}

fn default_namespace_root() -> String {
    DEFAULT_NAMESPACE_ROOT.to_string()
}

fn default_data_suffix() -> String {
    DEFAULT_DATA_SUFFIX.to_string()
}

impl Default for AlertQueryConfig {
    fn default() -> Self {
        Self {
            namespace_root: default_namespace_root(),
            data_suffix: default_data_suffix(),
        }
    }
}

impl AlertQueryConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            AlertQueryError::Config(format!(
                "failed to read config file '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or fails validation.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| AlertQueryError::Config(format!("invalid TOML: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the root or suffix cannot form store keys.
    pub fn validate(&self) -> Result<()> {
        self.schema().map(|_| ())
    }

    /// Builds the key schema described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns `AlertQueryError::Config` if the root or suffix is malformed.
    pub fn schema(&self) -> Result<KeySchema> {
        KeySchema::with_suffix(self.namespace_root.clone(), self.data_suffix.clone())
    }
}
