//! Streaming aggregation of records into a nested tree.

use tracing::{debug, instrument};

use atlas_core::error::Result;
use atlas_core::types::AttributeValue;

use crate::extract::KeyExtractor;
use crate::source::RecordSource;
use crate::tree::{AggregationNode, Leaves};

/// Groups records by an ordered list of key extractors.
///
/// With no extractors the result is a single flat leaf.
pub struct Aggregator<R> {
    extractors: Vec<Box<dyn KeyExtractor<R>>>,
    max_per_branch: Option<usize>,
    max_total: Option<usize>,
}

impl<R> Aggregator<R> {
    /// Creates an aggregator with one tree level per extractor.
    pub fn new(extractors: Vec<Box<dyn KeyExtractor<R>>>) -> Self {
        Self {
            extractors,
            max_per_branch: None,
            max_total: None,
        }
    }

    /// Creates an aggregator that does not group.
    pub fn flat() -> Self {
        Self::new(Vec::new())
    }

    /// Caps the number of records kept in any one leaf.
    pub fn max_per_branch(mut self, max: Option<usize>) -> Self {
        self.max_per_branch = max;
        self
    }

    /// Caps the number of records kept across the whole tree.
    pub fn max_total(mut self, max: Option<usize>) -> Self {
        self.max_total = max;
        self
    }

    /// Returns the number of tree levels.
    pub fn depth(&self) -> usize {
        self.extractors.len()
    }

    /// Pulls every record from `source` and builds the tree.
    ///
    /// Once `max_total` records are retained, the rest of the source is
    /// drained for counting only, unless the source already declares its
    /// total, in which case pulling stops. An error from the source or from
    /// an extractor aborts the pass.
    #[instrument(skip_all, fields(depth = self.extractors.len()))]
    pub fn aggregate<S>(&self, mut source: S) -> Result<Aggregation<R>>
    where
        S: RecordSource<R>,
    {
        let mut root = AggregationNode::empty(self.extractors.len());
        let mut retained = 0usize;
        let mut seen = 0u64;
        let mut dropped = 0u64;

        loop {
            let full = self.max_total.is_some_and(|max| retained >= max);
            if full && source.total_hint().is_some() {
                debug!(retained, seen, "Result cap reached, source total known; stopping");
                break;
            }

            let Some(record) = source.next() else {
                break;
            };
            let record = record?;
            seen += 1;

            if full {
                continue;
            }

            let keys = self
                .extractors
                .iter()
                .map(|extractor| extractor.extract(&record))
                .collect::<Result<Vec<AttributeValue>>>()?;

            if root.insert(&keys, record, self.max_per_branch) {
                retained += 1;
            } else {
                dropped += 1;
            }
        }

        debug!(retained, seen, dropped, "Aggregation complete");

        Ok(Aggregation {
            root,
            labels: self
                .extractors
                .iter()
                .map(|extractor| extractor.label().to_string())
                .collect(),
            retained,
            seen,
            declared_total: source.total_hint(),
        })
    }
}

/// Counts a renderer needs for its footer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AggregationReport {
    /// Records retained in the tree
    pub shown: usize,
    /// Records pulled from the source
    pub seen: u64,
    /// Declared source total, or `seen` when the source declared none
    pub total: u64,
}

/// The result of one aggregation pass.
#[derive(Clone, Debug)]
pub struct Aggregation<R> {
    root: AggregationNode<R>,
    labels: Vec<String>,
    retained: usize,
    seen: u64,
    declared_total: Option<u64>,
}

impl<R> Aggregation<R> {
    /// Returns the tree root.
    pub fn root(&self) -> &AggregationNode<R> {
        &self.root
    }

    /// Returns the header label of each tree level.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Returns true if records were grouped by at least one key.
    pub fn is_grouped(&self) -> bool {
        !self.labels.is_empty()
    }

    /// Returns the number of records retained.
    pub fn retained(&self) -> usize {
        self.retained
    }

    /// Returns the number of records pulled from the source.
    pub fn seen(&self) -> u64 {
        self.seen
    }

    /// Returns the source's declared total, falling back to the records seen.
    pub fn total(&self) -> u64 {
        self.declared_total.unwrap_or(self.seen)
    }

    /// Returns the footer counts.
    pub fn report(&self) -> AggregationReport {
        AggregationReport {
            shown: self.retained,
            seen: self.seen,
            total: self.total(),
        }
    }

    /// Iterates every leaf, depth-first in key order.
    pub fn leaves(&self) -> Leaves<'_, R> {
        Leaves::new(&self.root, &self.labels)
    }

    /// Iterates every retained record in render order.
    pub fn records(&self) -> impl Iterator<Item = &R> + '_ {
        self.leaves().flat_map(|leaf| leaf.records.iter())
    }
}
