//! Store key derivation and minimization.
//!
//! Alerts live in a prefix-ordered tree:
//!
//! ```text
//! <root>/<resourceType>/<alertType>/<resourceId>/data
//! ```
//!
//! Query-capable filters pin a prefix of this path. [`KeySchema::derive`]
//! turns a filter list into the smallest set of prefixes whose subtrees
//! together hold every alert those filters can match, with no prefix lying
//! inside another.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::collection::Filters;
use crate::error::{AlertQueryError, Result};
use crate::filter::Filter;
use crate::types::{Alert, ResourceType};

/// Default namespace root under which all alerts are stored.
pub const DEFAULT_NAMESPACE_ROOT: &str = "alerts";

/// Default final segment of a full alert key.
pub const DEFAULT_DATA_SUFFIX: &str = "data";

const SEPARATOR: char = '/';

/// A set of store key prefixes, none an ancestor of another.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeySet(BTreeSet<String>);

impl KeySet {
    /// Returns the number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns true if `key` is a member.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    /// Iterates the keys in lexical order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Returns true if some member equals `path` or is an ancestor of it.
    #[must_use]
    pub fn covers(&self, path: &str) -> bool {
        self.0
            .iter()
            .any(|key| key == path || is_ancestor(key, path))
    }

    /// Returns the keys as a presence map.
    #[must_use]
    pub fn to_map(&self) -> HashMap<String, bool> {
        self.0.iter().map(|k| (k.clone(), true)).collect()
    }
}

impl IntoIterator for KeySet {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for KeySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&str> = self.iter().collect();
        write!(f, "{{{}}}", keys.join(", "))
    }
}

/// Returns true if `ancestor` is a strict path ancestor of `key`.
#[must_use]
pub fn is_ancestor(ancestor: &str, key: &str) -> bool {
    key.len() > ancestor.len()
        && key.starts_with(ancestor)
        && key[ancestor.len()..].starts_with(SEPARATOR)
}

/// Reduces candidate keys to those with no ancestor among the candidates.
///
/// The most general key present wins: enumerating it already yields every
/// alert below it.
pub fn minimize<I>(candidates: I) -> KeySet
where
    I: IntoIterator<Item = String>,
{
    let all: BTreeSet<String> = candidates.into_iter().collect();
    let kept = all
        .iter()
        .filter(|key| !has_ancestor_in(key, &all))
        .cloned()
        .collect();
    KeySet(kept)
}

fn has_ancestor_in(key: &str, set: &BTreeSet<String>) -> bool {
    let mut path = key;
    while let Some(idx) = path.rfind(SEPARATOR) {
        path = &path[..idx];
        if set.contains(path) {
            trace!(key, ancestor = path, "dropping covered key");
            return true;
        }
    }
    false
}

/// The layout of alert keys in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchema {
    root: String,
    data_suffix: String,
}

impl Default for KeySchema {
    fn default() -> Self {
        Self {
            root: DEFAULT_NAMESPACE_ROOT.to_string(),
            data_suffix: DEFAULT_DATA_SUFFIX.to_string(),
        }
    }
}

impl KeySchema {
    /// Creates a schema rooted at `root`.
    ///
    /// # Errors
    ///
    /// Returns `AlertQueryError::Config` if the root is empty, starts or ends
    /// with a separator, or contains an empty segment.
    pub fn new(root: impl Into<String>) -> Result<Self> {
        Self::with_suffix(root, DEFAULT_DATA_SUFFIX)
    }

    /// Creates a schema with a custom data suffix.
    ///
    /// # Errors
    ///
    /// Returns `AlertQueryError::Config` if either part is malformed.
    pub fn with_suffix(root: impl Into<String>, data_suffix: impl Into<String>) -> Result<Self> {
        let root = root.into();
        let data_suffix = data_suffix.into();
        validate_root(&root)?;
        if data_suffix.is_empty() || data_suffix.contains(SEPARATOR) {
            return Err(AlertQueryError::Config(format!(
                "data suffix '{data_suffix}' must be a single non-empty segment"
            )));
        }
        Ok(Self { root, data_suffix })
    }

    /// Returns the namespace root key.
    #[must_use]
    pub fn root(&self) -> &str {
        &self.root
    }

    /// Returns the key of the resource-type subtree.
    #[must_use]
    pub fn resource_type_key(&self, resource_type: ResourceType) -> String {
        format!("{}/{}", self.root, resource_type.key_segment())
    }

    /// Returns the key of the alert-type subtree of a resource type.
    #[must_use]
    pub fn alert_type_key(&self, resource_type: ResourceType, alert_type: i64) -> String {
        format!(
            "{}/{}",
            self.resource_type_key(resource_type),
            alert_type_segment(alert_type)
        )
    }

    /// Returns the key of a single resource's subtree.
    ///
    /// An empty resource id contributes no segment, so alerts without a
    /// resource id live directly under their alert-type key.
    ///
    /// # Errors
    ///
    /// Returns `AlertQueryError::InvalidKeySegment` if the resource id is not
    /// a usable path segment.
    pub fn resource_id_key(
        &self,
        resource_type: ResourceType,
        alert_type: i64,
        resource_id: &str,
    ) -> Result<String> {
        let prefix = self.alert_type_key(resource_type, alert_type);
        match resource_id_segment(resource_id)? {
            Some(segment) => Ok(format!("{prefix}/{segment}")),
            None => Ok(prefix),
        }
    }

    /// Returns the full key an alert is stored under.
    ///
    /// # Errors
    ///
    /// Returns `AlertQueryError::InvalidKeySegment` if the alert's resource id
    /// is not a usable path segment.
    pub fn alert_key(&self, alert: &Alert) -> Result<String> {
        let prefix = self.resource_id_key(alert.resource, alert.alert_type, &alert.resource_id)?;
        Ok(format!("{prefix}/{}", self.data_suffix))
    }

    /// Returns the subtree key a single filter pins, or `None` for a
    /// post-filter.
    ///
    /// Composite payloads supply every segment they name, so the key never
    /// depends on other filters.
    ///
    /// # Errors
    ///
    /// Returns `AlertQueryError::InvalidKeySegment` for an unusable resource id.
    pub fn query_key(&self, filter: &Filter) -> Result<Option<String>> {
        let key = match filter {
            Filter::QueryResourceType(resource_type) => self.resource_type_key(*resource_type),
            Filter::QueryAlertType {
                alert_type,
                resource_type,
            } => self.alert_type_key(*resource_type, *alert_type),
            Filter::QueryResourceId {
                alert_type,
                resource_type,
                resource_id,
            } => self.resource_id_key(*resource_type, *alert_type, resource_id)?,
            Filter::Custom(_)
            | Filter::Time(_)
            | Filter::AlertType(_)
            | Filter::ResourceId(_)
            | Filter::Count(_) => return Ok(None),
        };
        Ok(Some(key))
    }

    /// Derives the minimal set of keys to enumerate for `filters`.
    ///
    /// Filters are put into processing order first, so the input order does
    /// not matter. With no filters, or with only post-filters, the result is
    /// the namespace root alone.
    ///
    /// # Errors
    ///
    /// Returns `AlertQueryError::InvalidKeySegment` if a query filter names a
    /// resource id that cannot be a path segment. Post-filters never fail here.
    pub fn derive(&self, filters: &[Filter]) -> Result<KeySet> {
        let sorted = Filters::from(filters).sorted();

        let mut candidates = Vec::new();
        for filter in &sorted {
            if let Some(key) = self.query_key(filter)? {
                trace!(%filter, %key, "candidate key");
                candidates.push(key);
            }
        }

        if candidates.is_empty() {
            candidates.push(self.root.clone());
        }
        let candidate_count = candidates.len();
        let keys = minimize(candidates);

        debug!(
            filters = filters.len(),
            candidates = candidate_count,
            keys = keys.len(),
            "derived alert query keys"
        );
        Ok(keys)
    }
}

/// Derives query keys under the default namespace root.
///
/// # Errors
///
/// See [`KeySchema::derive`].
pub fn derive_keys(filters: &[Filter]) -> Result<KeySet> {
    KeySchema::default().derive(filters)
}

/// Renders an alert type code as lowercase hexadecimal.
#[must_use]
pub fn alert_type_segment(alert_type: i64) -> String {
    if alert_type < 0 {
        format!("-{:x}", alert_type.unsigned_abs())
    } else {
        format!("{alert_type:x}")
    }
}

fn resource_id_segment(resource_id: &str) -> Result<Option<&str>> {
    if resource_id.is_empty() {
        return Ok(None);
    }
    let reason = if resource_id.contains(SEPARATOR) {
        "resource id contains '/'"
    } else if resource_id == "." || resource_id == ".." {
        "resource id is a relative path component"
    } else {
        return Ok(Some(resource_id));
    };
    Err(AlertQueryError::InvalidKeySegment {
        segment: resource_id.to_string(),
        reason: reason.to_string(),
    })
}

fn validate_root(root: &str) -> Result<()> {
    if root.is_empty() {
        return Err(AlertQueryError::Config(
            "namespace root cannot be empty".to_string(),
        ));
    }
    if root.starts_with(SEPARATOR) || root.ends_with(SEPARATOR) {
        return Err(AlertQueryError::Config(format!(
            "namespace root '{root}' must not start or end with '/'"
        )));
    }
    if root.split(SEPARATOR).any(str::is_empty) {
        return Err(AlertQueryError::Config(format!(
            "namespace root '{root}' contains an empty segment"
        )));
    }
    Ok(())
}
