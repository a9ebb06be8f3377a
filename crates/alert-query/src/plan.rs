//! Query plans and the alert source seam.
//!
//! A [`QueryPlan`] fixes the processing order of a filter list and the keys
//! to enumerate, then screens each enumerated alert against every filter.
//! The store itself is reached through the [`AlertSource`] trait so the
//! plan never performs I/O of its own.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use crate::collection::Filters;
use crate::error::Result;
use crate::filter::Filter;
use crate::keys::{KeySchema, KeySet};
use crate::types::Alert;

/// Something that can list the alerts stored under a key prefix.
pub trait AlertSource: Send + Sync {
    /// Returns every alert whose full key equals `prefix` or lies below it.
    ///
    /// # Errors
    ///
    /// Implementations report store failures as `AlertQueryError::Source`.
    fn enumerate(&self, prefix: &str) -> Result<Vec<Alert>>;
}

/// An in-memory [`AlertSource`] keyed by full alert key.
///
/// Several alerts can share a key; they are told apart by alert id.
#[derive(Debug, Clone, Default)]
pub struct MemoryAlertSource {
    schema: KeySchema,
    alerts: Arc<RwLock<BTreeMap<String, Vec<Alert>>>>,
}

impl MemoryAlertSource {
    /// Creates an empty source using `schema` to place alerts.
    #[must_use]
    pub fn new(schema: KeySchema) -> Self {
        Self {
            schema,
            alerts: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Stores an alert under its full key, replacing a stored alert only if
    /// it has the same key and the same id.
    ///
    /// # Errors
    ///
    /// Returns `AlertQueryError::InvalidKeySegment` if the alert cannot be keyed.
    pub fn insert(&self, alert: Alert) -> Result<String> {
        let key = self.schema.alert_key(&alert)?;
        let mut alerts = self.alerts.write();
        let slot = alerts.entry(key.clone()).or_default();
        match slot.iter_mut().find(|stored| stored.id == alert.id) {
            Some(stored) => *stored = alert,
            None => slot.push(alert),
        }
        Ok(key)
    }

    /// Returns the number of stored alerts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.alerts.read().values().map(Vec::len).sum()
    }

    /// Returns true if no alerts are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.alerts.read().is_empty()
    }

    /// Returns the schema used to place alerts.
    #[must_use]
    pub const fn schema(&self) -> &KeySchema {
        &self.schema
    }
}

impl AlertSource for MemoryAlertSource {
    fn enumerate(&self, prefix: &str) -> Result<Vec<Alert>> {
        let alerts = self.alerts.read();
        let below = format!("{prefix}/");
        let exact = alerts.get(prefix).into_iter().flatten();
        let nested = alerts
            .range(below.clone()..)
            .take_while(|(key, _)| key.starts_with(&below))
            .flat_map(|(_, stored)| stored);
        Ok(exact.chain(nested).cloned().collect())
    }
}

/// The result of executing a plan.
#[derive(Debug, Clone, Default)]
pub struct QueryOutcome {
    /// Keys that were enumerated.
    pub keys_enumerated: usize,
    /// Alerts returned by the source.
    pub candidates: usize,
    /// Alerts that matched every filter.
    pub alerts: Vec<Alert>,
}

/// Filters in processing order together with the keys they resolve to.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    filters: Filters,
    keys: KeySet,
}

impl QueryPlan {
    /// Builds a plan under the default schema.
    ///
    /// # Errors
    ///
    /// See [`KeySchema::derive`].
    pub fn new(filters: impl Into<Filters>) -> Result<Self> {
        Self::with_schema(&KeySchema::default(), filters)
    }

    /// Builds a plan under `schema`.
    ///
    /// # Errors
    ///
    /// See [`KeySchema::derive`].
    pub fn with_schema(schema: &KeySchema, filters: impl Into<Filters>) -> Result<Self> {
        let filters = filters.into().sorted();
        let keys = schema.derive(&filters)?;
        Ok(Self { filters, keys })
    }

    /// Returns the filters in processing order.
    #[must_use]
    pub const fn filters(&self) -> &Filters {
        &self.filters
    }

    /// Returns the keys to enumerate.
    #[must_use]
    pub const fn keys(&self) -> &KeySet {
        &self.keys
    }

    /// Returns true if `alert` passes every filter in the plan.
    ///
    /// # Errors
    ///
    /// Propagates the first filter error.
    pub fn accept(&self, alert: &Alert) -> Result<bool> {
        self.filters.matches_all(alert)
    }

    /// Keeps the alerts that pass every filter.
    ///
    /// # Errors
    ///
    /// Propagates the first filter error; no partial result is returned.
    pub fn screen<I>(&self, alerts: I) -> Result<Vec<Alert>>
    where
        I: IntoIterator<Item = Alert>,
    {
        let mut accepted = Vec::new();
        for alert in alerts {
            if self.accept(&alert)? {
                accepted.push(alert);
            }
        }
        Ok(accepted)
    }

    /// Enumerates every planned key through `source` and screens the results.
    ///
    /// # Errors
    ///
    /// Propagates source and filter errors unchanged.
    pub fn execute(&self, source: &dyn AlertSource) -> Result<QueryOutcome> {
        let mut outcome = QueryOutcome::default();
        for key in self.keys.iter() {
            let candidates = source.enumerate(key)?;
            debug!(key, candidates = candidates.len(), "enumerated key");
            outcome.keys_enumerated += 1;
            outcome.candidates += candidates.len();
            outcome.alerts.extend(self.screen(candidates)?);
        }
        info!(
            keys = outcome.keys_enumerated,
            candidates = outcome.candidates,
            accepted = outcome.alerts.len(),
            "alert query complete"
        );
        Ok(outcome)
    }
}

/// Runs `filters` against `source` in one call.
///
/// # Errors
///
/// Propagates derivation, source and filter errors.
pub fn query(
    schema: &KeySchema,
    source: &dyn AlertSource,
    filters: Vec<Filter>,
) -> Result<Vec<Alert>> {
    QueryPlan::with_schema(schema, filters)?
        .execute(source)
        .map(|outcome| outcome.alerts)
}
