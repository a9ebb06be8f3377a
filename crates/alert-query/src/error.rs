//! Error types for the alert-query crate.

use thiserror::Error;

use crate::kind::FilterKind;

/// Errors that can occur while matching alerts or deriving query keys.
///
/// None of these are retried internally. A caller that receives one must treat
/// the call as having no safe answer, never as "no match" or "no keys".
#[derive(Debug, Error)]
pub enum AlertQueryError {
    /// A filter payload does not have the shape its kind requires.
    #[error("filter value does not match kind {kind}: expected {expected}")]
    ValueShapeMismatch {
        /// The declared kind of the filter.
        kind: FilterKind,
        /// Description of the payload shape the kind requires.
        expected: &'static str,
    },

    /// A filter kind name or code outside the registry.
    #[error("unknown filter kind: {kind}")]
    UnknownFilterKind {
        /// The offending kind as it was received.
        kind: String,
    },

    /// A caller-supplied predicate failed.
    #[error("custom predicate failed: {reason}")]
    Predicate {
        /// The reason reported by the predicate.
        reason: String,
    },

    /// A value cannot be rendered as a single store path segment.
    #[error("invalid key segment '{segment}': {reason}")]
    InvalidKeySegment {
        /// The rejected segment.
        segment: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A time window whose stop precedes its start.
    #[error("invalid time window: {reason}")]
    InvalidTimeWindow {
        /// The reason the window is invalid.
        reason: String,
    },

    /// The alert source failed while enumerating a key.
    #[error("alert source failed for key '{key}': {reason}")]
    Source {
        /// The key being enumerated.
        key: String,
        /// The reason reported by the source.
        reason: String,
    },

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl AlertQueryError {
    /// Builds a [`AlertQueryError::Predicate`] from anything displayable.
    pub fn predicate(reason: impl std::fmt::Display) -> Self {
        Self::Predicate {
            reason: reason.to_string(),
        }
    }
}

impl From<serde_json::Error> for AlertQueryError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for AlertQueryError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for alert query operations.
pub type Result<T> = std::result::Result<T, AlertQueryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_value_shape_mismatch() {
        let err = AlertQueryError::ValueShapeMismatch {
            kind: FilterKind::Count,
            expected: "integer",
        };
        assert_eq!(
            err.to_string(),
            "filter value does not match kind count: expected integer"
        );
    }

    #[test]
    fn error_display_unknown_filter_kind() {
        let err = AlertQueryError::UnknownFilterKind {
            kind: "severity".to_string(),
        };
        assert_eq!(err.to_string(), "unknown filter kind: severity");
    }

    #[test]
    fn error_display_predicate() {
        let err = AlertQueryError::predicate("label lookup failed");
        assert_eq!(err.to_string(), "custom predicate failed: label lookup failed");
    }

    #[test]
    fn error_display_invalid_key_segment() {
        let err = AlertQueryError::InvalidKeySegment {
            segment: "a/b".to_string(),
            reason: "contains '/'".to_string(),
        };
        assert_eq!(err.to_string(), "invalid key segment 'a/b': contains '/'");
    }

    #[test]
    fn error_display_source() {
        let err = AlertQueryError::Source {
            key: "alerts/RESOURCE_TYPE_NODE".to_string(),
            reason: "timeout".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "alert source failed for key 'alerts/RESOURCE_TYPE_NODE': timeout"
        );
    }

    #[test]
    fn error_from_serde_json() {
        let json_err = serde_json::from_str::<String>("invalid json");
        assert!(json_err.is_err());
        let err: AlertQueryError = json_err.unwrap_err().into();
        assert!(matches!(err, AlertQueryError::Serialization(_)));
    }
}
