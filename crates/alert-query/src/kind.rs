//! The filter kind registry.
//!
//! [`FilterKind`] is a closed, totally ordered set. The order is the sort
//! priority used by [`Filters`](crate::Filters). Kinds that narrow the store
//! key space carry an explicit [`tree_depth`](FilterKind::tree_depth); the
//! remaining kinds are only evaluated against fetched alerts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AlertQueryError;

/// The kind of a filter.
///
/// Declaration order is the sort priority. Post-filter kinds come first,
/// query-capable kinds last, ordered from the shallowest to the deepest key
/// level they name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FilterKind {
    /// Caller-supplied predicate.
    Custom,
    /// Inclusive time window on the alert timestamp.
    Time,
    /// Exact alert type code.
    AlertType,
    /// Exact resource id.
    ResourceId,
    /// Exact occurrence count.
    Count,
    /// Resource type subtree.
    QueryResourceType,
    /// Resource type and alert type subtree.
    QueryAlertType,
    /// Resource type, alert type and resource id subtree.
    QueryResourceId,
}

impl FilterKind {
    /// Every kind, in priority order.
    pub const ALL: [Self; 8] = [
        Self::Custom,
        Self::Time,
        Self::AlertType,
        Self::ResourceId,
        Self::Count,
        Self::QueryResourceType,
        Self::QueryAlertType,
        Self::QueryResourceId,
    ];

    /// Returns the kind as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Custom => "custom",
            Self::Time => "time",
            Self::AlertType => "alert_type",
            Self::ResourceId => "resource_id",
            Self::Count => "count",
            Self::QueryResourceType => "query_resource_type",
            Self::QueryAlertType => "query_alert_type",
            Self::QueryResourceId => "query_resource_id",
        }
    }

    /// Returns the stable numeric code of this kind.
    #[must_use]
    pub const fn code(&self) -> u8 {
        match self {
            Self::Custom => 0,
            Self::Time => 1,
            Self::AlertType => 2,
            Self::ResourceId => 3,
            Self::Count => 4,
            Self::QueryResourceType => 5,
            Self::QueryAlertType => 6,
            Self::QueryResourceId => 7,
        }
    }

    /// Looks a kind up by numeric code.
    ///
    /// # Errors
    ///
    /// Returns `AlertQueryError::UnknownFilterKind` for codes outside the registry.
    pub fn from_code(code: i64) -> Result<Self, AlertQueryError> {
        Self::ALL
            .into_iter()
            .find(|k| i64::from(k.code()) == code)
            .ok_or_else(|| AlertQueryError::UnknownFilterKind {
                kind: code.to_string(),
            })
    }

    /// Returns the sort priority (lower sorts first).
    #[must_use]
    pub const fn priority(&self) -> u8 {
        self.code()
    }

    /// Returns how many key segments below the namespace root this kind
    /// pins, or `None` for post-filter kinds.
    #[must_use]
    pub const fn tree_depth(&self) -> Option<usize> {
        match self {
            Self::QueryResourceType => Some(1),
            Self::QueryAlertType => Some(2),
            Self::QueryResourceId => Some(3),
            Self::Custom | Self::Time | Self::AlertType | Self::ResourceId | Self::Count => None,
        }
    }

    /// Returns true if filters of this kind narrow the store key space.
    #[must_use]
    pub const fn is_query(&self) -> bool {
        self.tree_depth().is_some()
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FilterKind {
    type Err = AlertQueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(code) = s.parse::<i64>() {
            return Self::from_code(code);
        }
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| AlertQueryError::UnknownFilterKind {
                kind: s.to_string(),
            })
    }
}
