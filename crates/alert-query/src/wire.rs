//! Untyped filter descriptions.
//!
//! Filters that arrive as data (a JSON request body, a TOML file) carry a
//! kind tag and a loose value. [`WireFilter::decode`] checks both against the
//! registry and produces a typed [`Filter`]. Custom predicates have no wire
//! form.
//!
//! ```toml
//! [[filters]]
//! kind = "query_alert_type"
//! value = { alert_type = 5, resource_type = "volume" }
//!
//! [[filters]]
//! kind = "count"
//! value = 3
//!
//! [[filters]]
//! kind = "time"
//! value = { start = 2024-01-01T00:00:00Z, stop = 2024-01-02T00:00:00Z }
//! ```
//!
//! TOML datetimes must carry an offset; local datetimes are rejected.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::{AlertQueryError, Result};
use crate::filter::{AlertInfo, Filter, FilterValue, TimeWindow};
use crate::kind::FilterKind;
use crate::types::ResourceType;

/// A filter kind as it appears on the wire: a name or a numeric code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireKind {
    /// Kind name, e.g. `query_alert_type`.
    Name(String),
    /// Numeric kind code.
    Code(i64),
}

impl WireKind {
    /// Resolves the kind against the registry.
    ///
    /// # Errors
    ///
    /// Returns `AlertQueryError::UnknownFilterKind` if no kind matches.
    pub fn resolve(&self) -> Result<FilterKind> {
        match self {
            Self::Name(name) => name.parse(),
            Self::Code(code) => FilterKind::from_code(*code),
        }
    }
}

/// An untyped filter: a kind tag and a value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireFilter {
    /// The filter kind.
    pub kind: WireKind,
    /// The kind-specific payload.
    #[serde(default)]
    pub value: Value,
}

impl WireFilter {
    /// Describes a typed filter, or returns `None` for a custom predicate.
    #[must_use]
    pub fn from_filter(filter: &Filter) -> Option<Self> {
        let value = match filter.value() {
            FilterValue::Predicate(_) => return None,
            FilterValue::Window(w) => serde_json::to_value(w).ok()?,
            FilterValue::Integer(v) => Value::from(v),
            FilterValue::Text(v) => Value::from(v),
            FilterValue::Resource(rt) => Value::from(rt.as_str()),
            FilterValue::Info(info) => {
                let mut value = serde_json::to_value(info).ok()?;
                if filter.kind() == FilterKind::QueryAlertType {
                    if let Some(obj) = value.as_object_mut() {
                        obj.remove("resource_id");
                    }
                }
                value
            }
        };
        Some(Self {
            kind: WireKind::Name(filter.kind().as_str().to_string()),
            value,
        })
    }

    /// Decodes into a typed filter.
    ///
    /// # Errors
    ///
    /// Returns `AlertQueryError::UnknownFilterKind` for a kind outside the
    /// registry, `AlertQueryError::ValueShapeMismatch` when the value does not
    /// fit the kind, and `AlertQueryError::InvalidTimeWindow` for an inverted
    /// window.
    pub fn decode(&self) -> Result<Filter> {
        let kind = self.kind.resolve()?;
        let value = decode_value(kind, &self.value).ok_or_else(|| {
            warn!(%kind, value = %self.value, "rejected filter value");
            AlertQueryError::ValueShapeMismatch {
                kind,
                expected: kind_shape(kind),
            }
        })?;
        Filter::from_parts(kind, value)
    }
}

fn decode_value(kind: FilterKind, value: &Value) -> Option<FilterValue> {
    match kind {
        FilterKind::Custom => None,
        FilterKind::Time => serde_json::from_value::<TimeWindow>(value.clone())
            .ok()
            .map(FilterValue::Window),
        FilterKind::AlertType | FilterKind::Count => value.as_i64().map(FilterValue::Integer),
        FilterKind::ResourceId => value.as_str().map(|s| FilterValue::Text(s.to_string())),
        FilterKind::QueryResourceType => value
            .as_str()
            .and_then(|s| s.parse::<ResourceType>().ok())
            .map(FilterValue::Resource),
        FilterKind::QueryAlertType => serde_json::from_value::<AlertInfo>(value.clone())
            .ok()
            .map(FilterValue::Info),
        FilterKind::QueryResourceId => {
            value.get("resource_id").and_then(Value::as_str)?;
            serde_json::from_value::<AlertInfo>(value.clone())
                .ok()
                .map(FilterValue::Info)
        }
    }
}

/// Converts a TOML value into the JSON shape wire filters are decoded from.
/// Datetimes become RFC 3339 strings.
fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::from(i),
        toml::Value::Float(f) => serde_json::Number::from_f64(f).map_or(Value::Null, Value::Number),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(key, value)| (key, toml_to_json(value)))
                .collect(),
        ),
    }
}

const fn kind_shape(kind: FilterKind) -> &'static str {
    match kind {
        FilterKind::Custom => "predicate",
        FilterKind::Time => "time window",
        FilterKind::AlertType | FilterKind::Count => "integer",
        FilterKind::ResourceId => "string",
        FilterKind::QueryResourceType => "resource type",
        FilterKind::QueryAlertType => "alert info",
        FilterKind::QueryResourceId => "alert info with resource id",
    }
}

/// A document holding a list of wire filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterFile {
    /// The filters, in file order.
    #[serde(default)]
    pub filters: Vec<WireFilter>,
}

impl FilterFile {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `AlertQueryError::Serialization` if the TOML is invalid.
    pub fn from_toml(content: &str) -> Result<Self> {
        let table: toml::Table = toml::from_str(content)?;
        Ok(serde_json::from_value(toml_to_json(toml::Value::Table(table)))?)
    }

    /// Parses a JSON document, either `{"filters": [...]}` or a bare array.
    ///
    /// # Errors
    ///
    /// Returns `AlertQueryError::Serialization` if the JSON is invalid.
    pub fn from_json(content: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(content)?;
        if value.is_array() {
            let filters = serde_json::from_value(value)?;
            return Ok(Self { filters });
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Reads a filter file, choosing the format from the extension
    /// (`.json` for JSON, anything else for TOML).
    ///
    /// # Errors
    ///
    /// Returns `AlertQueryError::Config` if the file cannot be read and
    /// `AlertQueryError::Serialization` if it cannot be parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            AlertQueryError::Config(format!(
                "failed to read filter file '{}': {e}",
                path.display()
            ))
        })?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json(&content),
            _ => Self::from_toml(&content),
        }
    }

    /// Decodes every filter.
    ///
    /// # Errors
    ///
    /// Returns the first decoding error.
    pub fn decode(&self) -> Result<Vec<Filter>> {
        self.filters.iter().map(WireFilter::decode).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn wire(kind: &str, value: Value) -> WireFilter {
        WireFilter {
            kind: WireKind::Name(kind.to_string()),
            value,
        }
    }

    mod decode_tests {
        use super::*;
        use test_case::test_case;

        #[test]
        fn decode_each_kind() {
            let cases = vec![
                (
                    wire("time", json!({"start": "2024-01-01T00:00:00Z", "stop": "2024-01-02T00:00:00Z"})),
                    FilterKind::Time,
                ),
                (wire("alert_type", json!(5)), FilterKind::AlertType),
                (wire("resource_id", json!("vol-1")), FilterKind::ResourceId),
                (wire("count", json!(2)), FilterKind::Count),
                (wire("query_resource_type", json!("volume")), FilterKind::QueryResourceType),
                (
                    wire("query_alert_type", json!({"alert_type": 5, "resource_type": "node"})),
                    FilterKind::QueryAlertType,
                ),
                (
                    wire(
                        "query_resource_id",
                        json!({"alert_type": 5, "resource_type": "node", "resource_id": "n1"}),
                    ),
                    FilterKind::QueryResourceId,
                ),
            ];
            for (wf, kind) in cases {
                assert_eq!(wf.decode().unwrap().kind(), kind);
            }
        }

        #[test]
        fn decode_by_numeric_code() {
            let wf = WireFilter {
                kind: WireKind::Code(6),
                value: json!({"alert_type": 1, "resource_type": "drive"}),
            };
            assert_eq!(wf.decode().unwrap(), Filter::query_alert_type(1, ResourceType::Drive));
        }

        #[test]
        fn decode_resource_type_by_key_segment() {
            let wf = wire("query_resource_type", json!("RESOURCE_TYPE_CLUSTER"));
            assert_eq!(wf.decode().unwrap(), Filter::query_resource_type(ResourceType::Cluster));
        }

        #[test_case("RESOURCE_TYPE_VOLUME" ; "key segment")]
        #[test_case("Volume" ; "mixed case")]
        fn decode_nested_resource_type_like_query_resource_type(name: &str) {
            let wf = wire("query_alert_type", json!({"alert_type": 5, "resource_type": name}));
            assert_eq!(wf.decode().unwrap(), Filter::query_alert_type(5, ResourceType::Volume));

            let wf = wire(
                "query_resource_id",
                json!({"alert_type": 5, "resource_type": name, "resource_id": "v1"}),
            );
            assert_eq!(
                wf.decode().unwrap(),
                Filter::query_resource_id(5, ResourceType::Volume, "v1")
            );
        }

        #[test_case(WireKind::Name("severity".into()) ; "unknown name")]
        #[test_case(WireKind::Code(42) ; "unknown code")]
        fn unknown_kind(kind: WireKind) {
            let wf = WireFilter {
                kind,
                value: json!(1),
            };
            assert!(matches!(
                wf.decode(),
                Err(AlertQueryError::UnknownFilterKind { .. })
            ));
        }

        #[test_case("count", json!("three") ; "count as string")]
        #[test_case("alert_type", json!(1.5) ; "alert type as float")]
        #[test_case("resource_id", json!(7) ; "resource id as number")]
        #[test_case("query_resource_type", json!("pool") ; "unknown resource type")]
        #[test_case("query_alert_type", json!({"alert_type": "x", "resource_type": "node"}) ; "alert type not integer")]
        #[test_case("query_resource_id", json!({"alert_type": 1, "resource_type": "node"}) ; "missing resource id")]
        #[test_case("time", json!({"start": "yesterday"}) ; "malformed window")]
        #[test_case("custom", json!("fn") ; "custom over the wire")]
        fn value_shape_mismatch(kind: &str, value: Value) {
            assert!(matches!(
                wire(kind, value).decode(),
                Err(AlertQueryError::ValueShapeMismatch { .. })
            ));
        }

        #[test]
        fn inverted_window() {
            let wf = wire("time", json!({"start": "2024-01-02T00:00:00Z", "stop": "2024-01-01T00:00:00Z"}));
            assert!(matches!(
                wf.decode(),
                Err(AlertQueryError::InvalidTimeWindow { .. })
            ));
        }

        #[test]
        fn from_filter_round_trips() {
            let filters = vec![
                Filter::count(3),
                Filter::resource_id("r1"),
                Filter::query_resource_type(ResourceType::Node),
                Filter::query_alert_type(2, ResourceType::Volume),
                Filter::query_resource_id(2, ResourceType::Volume, "v"),
            ];
            for filter in filters {
                let wf = WireFilter::from_filter(&filter).unwrap();
                assert_eq!(wf.decode().unwrap(), filter);
            }
        }

        #[test]
        fn from_filter_skips_custom() {
            let filter = Filter::custom("x", |_: &crate::types::Alert| Ok(true));
            assert!(WireFilter::from_filter(&filter).is_none());
        }
    }

    mod file_tests {
        use super::*;
        use std::io::Write;
        use tempfile::NamedTempFile;

        const TOML: &str = r#"
            [[filters]]
            kind = "query_alert_type"
            value = { alert_type = 5, resource_type = "volume" }

            [[filters]]
            kind = "count"
            value = 3
        "#;

        #[test]
        fn parse_toml() {
            let file = FilterFile::from_toml(TOML).unwrap();
            let filters = file.decode().unwrap();
            assert_eq!(
                filters,
                vec![
                    Filter::query_alert_type(5, ResourceType::Volume),
                    Filter::count(3)
                ]
            );
        }

        #[test]
        fn parse_toml_native_datetimes() {
            let file = FilterFile::from_toml(
                r#"
                [[filters]]
                kind = "time"
                value = { start = 2024-01-01T00:00:00Z, stop = 2024-01-02T00:00:00Z }
                "#,
            )
            .unwrap();
            let filters = file.decode().unwrap();
            let window = TimeWindow::new(
                "2024-01-01T00:00:00Z".parse().unwrap(),
                "2024-01-02T00:00:00Z".parse().unwrap(),
            )
            .unwrap();
            assert_eq!(filters, vec![Filter::Time(window)]);
        }

        #[test]
        fn parse_toml_quoted_datetimes() {
            let file = FilterFile::from_toml(
                r#"
                [[filters]]
                kind = "time"
                value = { start = "2024-01-01T00:00:00Z", stop = "2024-01-02T00:00:00Z" }
                "#,
            )
            .unwrap();
            assert_eq!(file.decode().unwrap()[0].kind(), FilterKind::Time);
        }

        #[test]
        fn parse_json_array_and_object() {
            let array = r#"[{"kind": "count", "value": 1}]"#;
            let object = r#"{"filters": [{"kind": "count", "value": 1}]}"#;
            assert_eq!(
                FilterFile::from_json(array).unwrap(),
                FilterFile::from_json(object).unwrap()
            );
        }

        #[test]
        fn empty_toml_has_no_filters() {
            assert!(FilterFile::from_toml("").unwrap().filters.is_empty());
        }

        #[test]
        fn from_path_by_extension() {
            let mut toml_file = NamedTempFile::with_suffix(".toml").unwrap();
            toml_file.write_all(TOML.as_bytes()).unwrap();
            assert_eq!(FilterFile::from_path(toml_file.path()).unwrap().filters.len(), 2);

            let mut json_file = NamedTempFile::with_suffix(".json").unwrap();
            json_file
                .write_all(br#"[{"kind": "query_resource_type", "value": "node"}]"#)
                .unwrap();
            assert_eq!(FilterFile::from_path(json_file.path()).unwrap().filters.len(), 1);
        }

        #[test]
        fn from_path_missing_file() {
            let err = FilterFile::from_path("/nonexistent/filters.toml").unwrap_err();
            assert!(matches!(err, AlertQueryError::Config(_)));
        }

        #[test]
        fn decode_stops_at_first_bad_filter() {
            let file = FilterFile::from_json(r#"[{"kind": "count", "value": 1}, {"kind": "bogus"}]"#)
                .unwrap();
            assert!(file.decode().is_err());
        }
    }
}
