//! Alert filtering and store key derivation.
//!
//! `alert-query` decides which parts of a hierarchical alert store must be
//! read to answer a filtered alert lookup, and whether a fetched alert
//! satisfies the filters.
//!
//! # Features
//!
//! - **Filters**: exact-match and time-window criteria, plus caller predicates
//! - **Key derivation**: the smallest non-overlapping set of key prefixes to enumerate
//! - **Query plans**: sort, derive and screen in one value, over any [`AlertSource`]
//! - **Wire filters**: decode `{kind, value}` filter descriptions from JSON or TOML
//!
//! # Example
//!
//! ```rust
//! use alert_query::{derive_keys, Alert, Filter, ResourceType};
//!
//! let filters = vec![
//!     Filter::query_alert_type(5, ResourceType::Volume),
//!     Filter::count(3),
//! ];
//!
//! let keys = derive_keys(&filters).unwrap();
//! assert!(keys.contains("alerts/RESOURCE_TYPE_VOLUME/5"));
//!
//! let alert = Alert::new(ResourceType::Volume, "vol-1", 5).with_count(3);
//! assert!(filters.iter().all(|f| f.matches(&alert).unwrap()));
//! ```
//!
//! # Running a query
//!
//! ```rust
//! use alert_query::{Alert, Filter, KeySchema, MemoryAlertSource, QueryPlan, ResourceType};
//!
//! let source = MemoryAlertSource::new(KeySchema::default());
//! source.insert(Alert::new(ResourceType::Node, "node-1", 2)).unwrap();
//! source.insert(Alert::new(ResourceType::Volume, "vol-1", 2)).unwrap();
//!
//! let plan = QueryPlan::new(vec![Filter::query_resource_type(ResourceType::Node)]).unwrap();
//! let outcome = plan.execute(&source).unwrap();
//! assert_eq!(outcome.alerts.len(), 1);
//! ```

#![forbid(unsafe_code)]
#![doc(html_root_url = "https://docs.rs/alert-query/0.1.0")]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod collection;
pub mod config;
pub mod error;
pub mod filter;
pub mod keys;
pub mod kind;
pub mod plan;
pub mod types;
pub mod wire;


// Re-export main types at crate root
pub use collection::Filters;
pub use config::AlertQueryConfig;
pub use error::{AlertQueryError, Result};
pub use filter::{AlertInfo, CustomPredicate, Filter, FilterValue, PredicateFn, TimeWindow};
pub use keys::{
    derive_keys, is_ancestor, minimize, KeySchema, KeySet, DEFAULT_DATA_SUFFIX,
    DEFAULT_NAMESPACE_ROOT,
};
pub use kind::FilterKind;
pub use plan::{query, AlertSource, MemoryAlertSource, QueryOutcome, QueryPlan};
pub use types::{Alert, AlertSeverity, ResourceType};
pub use wire::{FilterFile, WireFilter, WireKind};
