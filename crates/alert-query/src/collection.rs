//! An orderable collection of filters.

use std::ops::Deref;

use crate::error::Result;
use crate::filter::Filter;
use crate::kind::FilterKind;
use crate::types::Alert;

/// A list of filters that can be put into processing order.
///
/// Sorting is stable and keyed on [`FilterKind::priority`], so filters of the
/// same kind keep their relative order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filters(Vec<Filter>);

impl Filters {
    /// Creates an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Appends a filter.
    pub fn push(&mut self, filter: Filter) {
        self.0.push(filter);
    }

    /// Sorts the filters by kind priority.
    pub fn sort(&mut self) {
        self.0.sort_by_key(|f| f.kind().priority());
    }

    /// Returns a sorted copy.
    #[must_use]
    pub fn sorted(&self) -> Self {
        let mut copy = self.clone();
        copy.sort();
        copy
    }

    /// Returns true if the filters are in processing order.
    #[must_use]
    pub fn is_sorted(&self) -> bool {
        self.0
            .windows(2)
            .all(|pair| pair[0].kind().priority() <= pair[1].kind().priority())
    }

    /// Returns the kinds of the filters, in their current order.
    #[must_use]
    pub fn kinds(&self) -> Vec<FilterKind> {
        self.0.iter().map(Filter::kind).collect()
    }

    /// Returns true if any filter narrows the store key space.
    #[must_use]
    pub fn has_query_filters(&self) -> bool {
        self.0.iter().any(|f| f.kind().is_query())
    }

    /// Evaluates every filter against the alert.
    ///
    /// Evaluation stops at the first filter that rejects the alert or fails.
    ///
    /// # Errors
    ///
    /// Propagates the first error returned by a filter.
    pub fn matches_all(&self, alert: &Alert) -> Result<bool> {
        for filter in &self.0 {
            if !filter.matches(alert)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    /// Consumes the collection and returns the filters.
    #[must_use]
    pub fn into_inner(self) -> Vec<Filter> {
        self.0
    }
}

impl Deref for Filters {
    type Target = [Filter];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Filter>> for Filters {
    fn from(filters: Vec<Filter>) -> Self {
        Self(filters)
    }
}

impl From<&[Filter]> for Filters {
    fn from(filters: &[Filter]) -> Self {
        Self(filters.to_vec())
    }
}

impl FromIterator<Filter> for Filters {
    fn from_iter<I: IntoIterator<Item = Filter>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for Filters {
    type Item = Filter;
    type IntoIter = std::vec::IntoIter<Filter>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Filters {
    type Item = &'a Filter;
    type IntoIter = std::slice::Iter<'a, Filter>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
