//! Filters and the match evaluator.
//!
//! A [`Filter`] is a closed sum type with one variant per [`FilterKind`], so a
//! constructed filter always carries the payload its kind requires. The
//! untyped [`FilterValue`] exists for callers that assemble filters from a
//! kind tag and a loose value; [`Filter::from_parts`] is where such pairs are
//! checked.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AlertQueryError, Result};
use crate::kind::FilterKind;
use crate::types::{Alert, ResourceType};

/// Signature of a caller-supplied match predicate.
pub type PredicateFn = dyn Fn(&Alert) -> Result<bool> + Send + Sync;

/// A named caller-supplied predicate.
///
/// Two predicates are equal only if they share the same function object.
#[derive(Clone)]
pub struct CustomPredicate {
    name: String,
    func: Arc<PredicateFn>,
}

impl CustomPredicate {
    /// Wraps a predicate function under a descriptive name.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Alert) -> Result<bool> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Returns the predicate's name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invokes the predicate.
    ///
    /// # Errors
    ///
    /// Whatever the predicate returns, unchanged.
    pub fn call(&self, alert: &Alert) -> Result<bool> {
        (self.func)(alert)
    }
}

impl fmt::Debug for CustomPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomPredicate")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl PartialEq for CustomPredicate {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && Arc::ptr_eq(&self.func, &other.func)
    }
}

/// An inclusive window of alert timestamps, compared at second resolution.
///
/// Built through [`TimeWindow::new`], so a window held by a [`Filter`] is
/// never inverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    stop: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a new window.
    ///
    /// # Errors
    ///
    /// Returns `AlertQueryError::InvalidTimeWindow` if `stop` is before `start`.
    pub fn new(start: DateTime<Utc>, stop: DateTime<Utc>) -> Result<Self> {
        let window = Self { start, stop };
        window.validate()?;
        Ok(window)
    }

    /// Returns the first second included in the window.
    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Returns the last second included in the window.
    #[must_use]
    pub const fn stop(&self) -> DateTime<Utc> {
        self.stop
    }

    /// Checks that the window is not inverted.
    ///
    /// # Errors
    ///
    /// Returns `AlertQueryError::InvalidTimeWindow` if `stop` is before `start`.
    pub fn validate(&self) -> Result<()> {
        if self.stop.timestamp() < self.start.timestamp() {
            return Err(AlertQueryError::InvalidTimeWindow {
                reason: format!("stop {} is before start {}", self.stop, self.start),
            });
        }
        Ok(())
    }

    /// Returns true if the timestamp falls within the window, bounds included.
    #[must_use]
    pub fn contains(&self, timestamp_secs: i64) -> bool {
        timestamp_secs >= self.start.timestamp() && timestamp_secs <= self.stop.timestamp()
    }
}

/// Composite payload shared by the alert-type and resource-id query kinds.
///
/// `resource_id` is ignored by [`FilterKind::QueryAlertType`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertInfo {
    /// Alert type code.
    pub alert_type: i64,
    /// Resource type.
    pub resource_type: ResourceType,
    /// Resource id.
    #[serde(default)]
    pub resource_id: String,
}

/// An untyped filter payload.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// A caller-supplied predicate.
    Predicate(CustomPredicate),
    /// A time window.
    Window(TimeWindow),
    /// An integer.
    Integer(i64),
    /// A string.
    Text(String),
    /// A resource type.
    Resource(ResourceType),
    /// A composite alert type / resource payload.
    Info(AlertInfo),
}

impl FilterValue {
    const fn shape(&self) -> &'static str {
        match self {
            Self::Predicate(_) => "predicate",
            Self::Window(_) => "time window",
            Self::Integer(_) => "integer",
            Self::Text(_) => "string",
            Self::Resource(_) => "resource type",
            Self::Info(_) => "alert info",
        }
    }
}

/// A single matching criterion over alerts.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches when the predicate returns true.
    Custom(CustomPredicate),
    /// Matches alerts whose timestamp lies in the window.
    Time(TimeWindow),
    /// Matches alerts with this alert type.
    AlertType(i64),
    /// Matches alerts on this resource id.
    ResourceId(String),
    /// Matches alerts raised exactly this many times.
    Count(i64),
    /// Matches alerts on this resource type.
    QueryResourceType(ResourceType),
    /// Matches alerts with this alert type on this resource type.
    QueryAlertType {
        /// Alert type code.
        alert_type: i64,
        /// Resource type.
        resource_type: ResourceType,
    },
    /// Matches alerts with this alert type on this exact resource.
    QueryResourceId {
        /// Alert type code.
        alert_type: i64,
        /// Resource type.
        resource_type: ResourceType,
        /// Resource id.
        resource_id: String,
    },
}

impl Filter {
    /// Creates a custom predicate filter.
    pub fn custom<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Alert) -> Result<bool> + Send + Sync + 'static,
    {
        Self::Custom(CustomPredicate::new(name, func))
    }

    /// Creates a time window filter.
    ///
    /// # Errors
    ///
    /// Returns `AlertQueryError::InvalidTimeWindow` if `stop` is before `start`.
    pub fn time(start: DateTime<Utc>, stop: DateTime<Utc>) -> Result<Self> {
        TimeWindow::new(start, stop).map(Self::Time)
    }

    /// Creates an alert type filter.
    #[must_use]
    pub const fn alert_type(alert_type: i64) -> Self {
        Self::AlertType(alert_type)
    }

    /// Creates a resource id filter.
    pub fn resource_id(resource_id: impl Into<String>) -> Self {
        Self::ResourceId(resource_id.into())
    }

    /// Creates an occurrence count filter.
    #[must_use]
    pub const fn count(count: i64) -> Self {
        Self::Count(count)
    }

    /// Creates a resource type query filter.
    #[must_use]
    pub const fn query_resource_type(resource_type: ResourceType) -> Self {
        Self::QueryResourceType(resource_type)
    }

    /// Creates an alert type query filter.
    #[must_use]
    pub const fn query_alert_type(alert_type: i64, resource_type: ResourceType) -> Self {
        Self::QueryAlertType {
            alert_type,
            resource_type,
        }
    }

    /// Creates a resource id query filter.
    pub fn query_resource_id(
        alert_type: i64,
        resource_type: ResourceType,
        resource_id: impl Into<String>,
    ) -> Self {
        Self::QueryResourceId {
            alert_type,
            resource_type,
            resource_id: resource_id.into(),
        }
    }

    /// Builds a filter from a kind tag and an untyped value.
    ///
    /// # Errors
    ///
    /// Returns `AlertQueryError::ValueShapeMismatch` if the value does not have
    /// the shape the kind requires, and `AlertQueryError::InvalidTimeWindow`
    /// for an inverted window.
    pub fn from_parts(kind: FilterKind, value: FilterValue) -> Result<Self> {
        let filter = match (kind, value) {
            (FilterKind::Custom, FilterValue::Predicate(p)) => Self::Custom(p),
            (FilterKind::Time, FilterValue::Window(w)) => {
                w.validate()?;
                Self::Time(w)
            }
            (FilterKind::AlertType, FilterValue::Integer(v)) => Self::AlertType(v),
            (FilterKind::ResourceId, FilterValue::Text(v)) => Self::ResourceId(v),
            (FilterKind::Count, FilterValue::Integer(v)) => Self::Count(v),
            (FilterKind::QueryResourceType, FilterValue::Resource(v)) => {
                Self::QueryResourceType(v)
            }
            (FilterKind::QueryAlertType, FilterValue::Info(info)) => Self::QueryAlertType {
                alert_type: info.alert_type,
                resource_type: info.resource_type,
            },
            (FilterKind::QueryResourceId, FilterValue::Info(info)) => Self::QueryResourceId {
                alert_type: info.alert_type,
                resource_type: info.resource_type,
                resource_id: info.resource_id,
            },
            (kind, value) => {
                return Err(AlertQueryError::ValueShapeMismatch {
                    kind,
                    expected: expected_shape(kind, &value),
                });
            }
        };
        Ok(filter)
    }

    /// Returns the kind of this filter.
    #[must_use]
    pub const fn kind(&self) -> FilterKind {
        match self {
            Self::Custom(_) => FilterKind::Custom,
            Self::Time(_) => FilterKind::Time,
            Self::AlertType(_) => FilterKind::AlertType,
            Self::ResourceId(_) => FilterKind::ResourceId,
            Self::Count(_) => FilterKind::Count,
            Self::QueryResourceType(_) => FilterKind::QueryResourceType,
            Self::QueryAlertType { .. } => FilterKind::QueryAlertType,
            Self::QueryResourceId { .. } => FilterKind::QueryResourceId,
        }
    }

    /// Returns the payload of this filter in untyped form.
    #[must_use]
    pub fn value(&self) -> FilterValue {
        match self {
            Self::Custom(p) => FilterValue::Predicate(p.clone()),
            Self::Time(w) => FilterValue::Window(*w),
            Self::AlertType(v) | Self::Count(v) => FilterValue::Integer(*v),
            Self::ResourceId(v) => FilterValue::Text(v.clone()),
            Self::QueryResourceType(v) => FilterValue::Resource(*v),
            Self::QueryAlertType {
                alert_type,
                resource_type,
            } => FilterValue::Info(AlertInfo {
                alert_type: *alert_type,
                resource_type: *resource_type,
                resource_id: String::new(),
            }),
            Self::QueryResourceId {
                alert_type,
                resource_type,
                resource_id,
            } => FilterValue::Info(AlertInfo {
                alert_type: *alert_type,
                resource_type: *resource_type,
                resource_id: resource_id.clone(),
            }),
        }
    }

    /// Evaluates this filter against one alert.
    ///
    /// Every built-in kind is an exact comparison (or an inclusive window) and
    /// is pure. A custom predicate is invoked as is.
    ///
    /// # Errors
    ///
    /// Only a custom predicate can fail; its error is returned unchanged.
    pub fn matches(&self, alert: &Alert) -> Result<bool> {
        let matched = match self {
            Self::Custom(p) => return p.call(alert),
            Self::Time(w) => w.contains(alert.timestamp_secs()),
            Self::AlertType(v) => alert.alert_type == *v,
            Self::ResourceId(v) => alert.resource_id == *v,
            Self::Count(v) => alert.count == *v,
            Self::QueryResourceType(v) => alert.resource == *v,
            Self::QueryAlertType {
                alert_type,
                resource_type,
            } => alert.alert_type == *alert_type && alert.resource == *resource_type,
            Self::QueryResourceId {
                alert_type,
                resource_type,
                resource_id,
            } => {
                alert.alert_type == *alert_type
                    && alert.resource == *resource_type
                    && alert.resource_id == *resource_id
            }
        };
        Ok(matched)
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self.kind();
        match self {
            Self::Custom(p) => write!(f, "{kind}({})", p.name()),
            Self::Time(w) => write!(f, "{kind}({}..={})", w.start.to_rfc3339(), w.stop.to_rfc3339()),
            Self::AlertType(v) | Self::Count(v) => write!(f, "{kind}({v})"),
            Self::ResourceId(v) => write!(f, "{kind}({v})"),
            Self::QueryResourceType(rt) => write!(f, "{kind}({rt})"),
            Self::QueryAlertType {
                alert_type,
                resource_type,
            } => write!(f, "{kind}({resource_type}, {alert_type})"),
            Self::QueryResourceId {
                alert_type,
                resource_type,
                resource_id,
            } => write!(f, "{kind}({resource_type}, {alert_type}, {resource_id})"),
        }
    }
}

fn expected_shape(kind: FilterKind, got: &FilterValue) -> &'static str {
    tracing::trace!(%kind, got = got.shape(), "filter value shape mismatch");
    match kind {
        FilterKind::Custom => "predicate",
        FilterKind::Time => "time window",
        FilterKind::AlertType | FilterKind::Count => "integer",
        FilterKind::ResourceId => "string",
        FilterKind::QueryResourceType => "resource type",
        FilterKind::QueryAlertType | FilterKind::QueryResourceId => "alert info",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use test_case::test_case;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn volume_alert() -> Alert {
        Alert::new(ResourceType::Volume, "vol-1", 5)
            .with_timestamp(ts(1_700_000_000))
            .with_count(4)
    }

    mod match_tests {
        use super::*;
        use test_case::test_case;

        #[test]
        fn time_window_inclusive_lower_bound() {
            let alert = volume_alert();
            let filter = Filter::time(alert.timestamp, alert.timestamp + Duration::hours(1)).unwrap();
            assert!(filter.matches(&alert).unwrap());
        }

        #[test]
        fn time_window_inclusive_upper_bound() {
            let alert = volume_alert();
            let filter = Filter::time(alert.timestamp - Duration::hours(1), alert.timestamp).unwrap();
            assert!(filter.matches(&alert).unwrap());
        }

        #[test]
        fn time_window_ignores_sub_second_precision() {
            let alert = volume_alert().with_timestamp(ts(1_700_000_000) + Duration::milliseconds(900));
            let filter = Filter::time(ts(1_699_999_000), ts(1_700_000_000)).unwrap();
            assert!(filter.matches(&alert).unwrap());
        }

        #[test]
        fn time_window_outside() {
            let alert = volume_alert();
            let filter = Filter::time(ts(1_700_000_001), ts(1_700_000_100)).unwrap();
            assert!(!filter.matches(&alert).unwrap());
        }

        #[test]
        fn inverted_time_window_is_rejected() {
            let err = Filter::time(ts(10), ts(9)).unwrap_err();
            assert!(matches!(err, AlertQueryError::InvalidTimeWindow { .. }));
        }

        #[test]
        fn deserialized_inverted_window_is_rejected_by_from_parts() {
            let window: TimeWindow = serde_json::from_str(
                r#"{"start": "1970-01-01T00:00:10Z", "stop": "1970-01-01T00:00:09Z"}"#,
            )
            .unwrap();
            assert_eq!(window.start(), ts(10));
            assert_eq!(window.stop(), ts(9));
            let err = Filter::from_parts(FilterKind::Time, FilterValue::Window(window)).unwrap_err();
            assert!(matches!(err, AlertQueryError::InvalidTimeWindow { .. }));
        }

        #[test_case(Filter::count(3), false ; "count differs")]
        #[test_case(Filter::count(4), true ; "count equal")]
        #[test_case(Filter::alert_type(5), true ; "alert type equal")]
        #[test_case(Filter::alert_type(6), false ; "alert type differs")]
        #[test_case(Filter::resource_id("vol-1"), true ; "resource id equal")]
        #[test_case(Filter::resource_id("vol-10"), false ; "resource id is not a prefix match")]
        #[test_case(Filter::query_resource_type(ResourceType::Volume), true ; "resource type equal")]
        #[test_case(Filter::query_resource_type(ResourceType::Node), false ; "resource type differs")]
        #[test_case(Filter::query_alert_type(5, ResourceType::Volume), true ; "alert query equal")]
        #[test_case(Filter::query_alert_type(5, ResourceType::Drive), false ; "alert query wrong resource")]
        #[test_case(Filter::query_resource_id(5, ResourceType::Volume, "vol-1"), true ; "resource query equal")]
        #[test_case(Filter::query_resource_id(5, ResourceType::Volume, "vol-2"), false ; "resource query wrong id")]
        #[test_case(Filter::query_resource_id(6, ResourceType::Volume, "vol-1"), false ; "resource query wrong type")]
        fn equality_filters(filter: Filter, expected: bool) {
            assert_eq!(filter.matches(&volume_alert()).unwrap(), expected);
        }

        #[test]
        fn custom_predicate_is_invoked() {
            let filter = Filter::custom("has message", |a: &Alert| Ok(!a.message.is_empty()));
            assert!(!filter.matches(&volume_alert()).unwrap());
            assert!(filter.matches(&volume_alert().with_message("x")).unwrap());
        }

        #[test]
        fn custom_predicate_error_propagates() {
            let filter = Filter::custom("broken", |_: &Alert| Err(AlertQueryError::predicate("boom")));
            let err = filter.matches(&volume_alert()).unwrap_err();
            assert!(matches!(err, AlertQueryError::Predicate { reason } if reason == "boom"));
        }

        #[test]
        fn matching_is_repeatable() {
            let alert = volume_alert();
            let filter = Filter::query_alert_type(5, ResourceType::Volume);
            let first = filter.matches(&alert).unwrap();
            for _ in 0..10 {
                assert_eq!(filter.matches(&alert).unwrap(), first);
            }
        }
    }

    mod parts_tests {
        use super::*;
        use test_case::test_case;

        fn info() -> AlertInfo {
            AlertInfo {
                alert_type: 9,
                resource_type: ResourceType::Node,
                resource_id: "node-a".to_string(),
            }
        }

        #[test]
        fn from_parts_builds_each_kind() {
            let window = TimeWindow::new(ts(0), ts(10)).unwrap();
            let cases = vec![
                (FilterKind::Time, FilterValue::Window(window)),
                (FilterKind::AlertType, FilterValue::Integer(3)),
                (FilterKind::ResourceId, FilterValue::Text("x".into())),
                (FilterKind::Count, FilterValue::Integer(2)),
                (FilterKind::QueryResourceType, FilterValue::Resource(ResourceType::Cluster)),
                (FilterKind::QueryAlertType, FilterValue::Info(info())),
                (FilterKind::QueryResourceId, FilterValue::Info(info())),
            ];
            for (kind, value) in cases {
                let filter = Filter::from_parts(kind, value).unwrap();
                assert_eq!(filter.kind(), kind);
            }
        }

        #[test]
        fn from_parts_custom() {
            let pred = CustomPredicate::new("always", |_: &Alert| Ok(true));
            let filter = Filter::from_parts(FilterKind::Custom, FilterValue::Predicate(pred.clone())).unwrap();
            assert_eq!(filter, Filter::Custom(pred));
        }

        #[test_case(FilterKind::Count, FilterValue::Text("3".into()), "integer" ; "count given text")]
        #[test_case(FilterKind::AlertType, FilterValue::Resource(ResourceType::Volume), "integer" ; "alert type given resource")]
        #[test_case(FilterKind::ResourceId, FilterValue::Integer(1), "string" ; "resource id given integer")]
        #[test_case(FilterKind::QueryResourceType, FilterValue::Integer(1), "resource type" ; "resource query given integer")]
        #[test_case(FilterKind::QueryAlertType, FilterValue::Resource(ResourceType::Volume), "alert info" ; "alert query given resource")]
        #[test_case(FilterKind::Time, FilterValue::Integer(0), "time window" ; "time given integer")]
        #[test_case(FilterKind::Custom, FilterValue::Text("f".into()), "predicate" ; "custom given text")]
        fn from_parts_rejects_wrong_shape(kind: FilterKind, value: FilterValue, shape: &str) {
            let err = Filter::from_parts(kind, value).unwrap_err();
            match err {
                AlertQueryError::ValueShapeMismatch { kind: k, expected } => {
                    assert_eq!(k, kind);
                    assert_eq!(expected, shape);
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[test]
        fn query_alert_type_drops_resource_id() {
            let filter = Filter::from_parts(FilterKind::QueryAlertType, FilterValue::Info(info())).unwrap();
            assert_eq!(filter, Filter::query_alert_type(9, ResourceType::Node));
        }

        #[test]
        fn value_round_trips_through_from_parts() {
            let filters = vec![
                Filter::alert_type(1),
                Filter::count(2),
                Filter::resource_id("r"),
                Filter::query_resource_type(ResourceType::Drive),
                Filter::query_alert_type(4, ResourceType::Volume),
                Filter::query_resource_id(4, ResourceType::Volume, "v"),
            ];
            for filter in filters {
                let rebuilt = Filter::from_parts(filter.kind(), filter.value()).unwrap();
                assert_eq!(rebuilt, filter);
            }
        }
    }

    #[test]
    fn display_names_kind_and_payload() {
        assert_eq!(
            Filter::query_alert_type(5, ResourceType::Volume).to_string(),
            "query_alert_type(volume, 5)"
        );
        assert_eq!(Filter::count(3).to_string(), "count(3)");
        assert_eq!(
            Filter::custom("recent", |_: &Alert| Ok(true)).to_string(),
            "custom(recent)"
        );
    }
}
