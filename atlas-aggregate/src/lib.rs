//! # Atlas Aggregate
//!
//! Groups a lazily produced sequence of records into a nested tree, in one
//! pass, without holding more than the retained records in memory.
//!
//! ## Features
//!
//! - **Key extractors**: one per tree level ("country", then "asn_v4", ...)
//! - **Caps**: per-leaf (`max_per_branch`) and global (`max_total`) limits
//! - **Rendering support**: key-sorted depth-first traversal of every leaf,
//!   plus retained/total counts for "Showing X of Y" footers
//!
//! ## Example
//!
//! ```rust
//! use atlas_aggregate::{Aggregator, IterSource, ValueKeyExtractor};
//! use atlas_core::Probe;
//!
//! let probes = vec![
//!     Probe::new(1).with_country("GR"),
//!     Probe::new(2).with_country("DE"),
//!     Probe::new(3).with_country("GR"),
//! ];
//!
//! let aggregator = Aggregator::new(vec![ValueKeyExtractor::from_name("country").unwrap().boxed()]);
//! let aggregation = aggregator.aggregate(IterSource::infallible(probes)).unwrap();
//!
//! let groups: Vec<String> = aggregation
//!     .leaves()
//!     .map(|leaf| leaf.path.last().unwrap().to_string())
//!     .collect();
//! assert_eq!(groups, ["Country: DE", "Country: GR"]);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod aggregator;
mod extract;
mod source;
mod tree;

pub use aggregator::{Aggregation, AggregationReport, Aggregator};
pub use extract::{KeyExtractor, KeyFn, ValueKeyExtractor};
pub use source::{IterSource, RecordSource};
pub use tree::{AggregationNode, Leaf, Leaves, PathSegment};
