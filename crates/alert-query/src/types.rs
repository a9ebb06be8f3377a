//! Alert record types.
//!
//! This module provides the alert shape the query engine reads:
//! - [`ResourceType`]: The kind of resource an alert was raised against
//! - [`AlertSeverity`]: The severity level of an alert
//! - [`Alert`]: A recorded alert instance
//!
//! Alerts are produced and persisted elsewhere; nothing in this crate mutates
//! a stored alert.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AlertQueryError;

/// The kind of resource an alert refers to.
///
/// Serializes as the short lowercase name; deserializes from anything
/// [`FromStr`] accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum ResourceType {
    /// No particular resource.
    #[default]
    None,
    /// A storage volume.
    Volume,
    /// A cluster node.
    Node,
    /// The cluster as a whole.
    Cluster,
    /// A physical drive.
    Drive,
}

impl ResourceType {
    /// Every resource type, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::None,
        Self::Volume,
        Self::Node,
        Self::Cluster,
        Self::Drive,
    ];

    /// Returns the short lowercase name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Volume => "volume",
            Self::Node => "node",
            Self::Cluster => "cluster",
            Self::Drive => "drive",
        }
    }

    /// Returns the canonical name used as a store key segment.
    #[must_use]
    pub const fn key_segment(&self) -> &'static str {
        match self {
            Self::None => "RESOURCE_TYPE_NONE",
            Self::Volume => "RESOURCE_TYPE_VOLUME",
            Self::Node => "RESOURCE_TYPE_NODE",
            Self::Cluster => "RESOURCE_TYPE_CLUSTER",
            Self::Drive => "RESOURCE_TYPE_DRIVE",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = AlertQueryError;

    /// Accepts either the short name or the canonical key segment.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|rt| rt.as_str().eq_ignore_ascii_case(s) || rt.key_segment() == s)
            .ok_or_else(|| AlertQueryError::Serialization(format!("unknown resource type '{s}'")))
    }
}

impl TryFrom<String> for ResourceType {
    type Error = AlertQueryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The severity level of an alert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    /// No severity assigned.
    None,
    /// Informational notification.
    #[default]
    Notify,
    /// Should be investigated.
    Warning,
    /// Requires immediate attention.
    Alarm,
}

impl AlertSeverity {
    /// Returns the severity as a string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Notify => "notify",
            Self::Warning => "warning",
            Self::Alarm => "alarm",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A recorded alert.
///
/// Only `alert_type`, `resource`, `resource_id`, `count` and `timestamp`
/// take part in filtering. The rest is carried for callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Unique identifier for this alert.
    pub id: String,
    /// Numeric alert type code.
    pub alert_type: i64,
    /// The resource type the alert refers to.
    pub resource: ResourceType,
    /// Identifier of the resource.
    pub resource_id: String,
    /// How many times the alert has been raised.
    #[serde(default = "default_count")]
    pub count: i64,
    /// When the alert was last raised.
    pub timestamp: DateTime<Utc>,
    /// When the alert was first raised.
    #[serde(default)]
    pub first_seen: Option<DateTime<Utc>>,
    /// The severity of the alert.
    #[serde(default)]
    pub severity: AlertSeverity,
    /// Human-readable message.
    #[serde(default)]
    pub message: String,
    /// Whether the alert has been cleared.
    #[serde(default)]
    pub cleared: bool,
    /// Time to live once cleared (in seconds, 0 = forever).
    #[serde(default)]
    pub ttl_secs: u64,
    /// Tag used by the producer to collapse repeats.
    #[serde(default)]
    pub unique_tag: String,
}

const fn default_count() -> i64 {
    1
}

impl Alert {
    /// Creates a new alert raised now, with a count of one.
    #[must_use]
    pub fn new(resource: ResourceType, resource_id: impl Into<String>, alert_type: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            alert_type,
            resource,
            resource_id: resource_id.into(),
            count: 1,
            timestamp: now,
            first_seen: Some(now),
            severity: AlertSeverity::default(),
            message: String::new(),
            cleared: false,
            ttl_secs: 0,
            unique_tag: String::new(),
        }
    }

    /// Sets the timestamp.
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Sets the occurrence count.
    #[must_use]
    pub fn with_count(mut self, count: i64) -> Self {
        self.count = count;
        self
    }

    /// Sets the severity.
    #[must_use]
    pub fn with_severity(mut self, severity: AlertSeverity) -> Self {
        self.severity = severity;
        self
    }

    /// Sets the message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Returns the timestamp truncated to whole seconds since the epoch.
    #[must_use]
    pub fn timestamp_secs(&self) -> i64 {
        self.timestamp.timestamp()
    }
}
