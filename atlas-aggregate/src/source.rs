//! Record sources the aggregator pulls from.

use atlas_core::error::Result;

/// A lazily produced sequence of records.
///
/// Sources may know how many records exist in total before yielding them all
/// (the platform reports a count with its first page). That count is what
/// "Showing X of Y" reports, and knowing it lets the aggregator stop pulling
/// once its global cap is reached.
pub trait RecordSource<R>: Iterator<Item = Result<R>> {
    /// Total number of records the source declares, if known yet.
    fn total_hint(&self) -> Option<u64> {
        None
    }
}

/// Adapts any iterator of `Result<R>` into a [`RecordSource`].
#[derive(Clone, Debug)]
pub struct IterSource<I> {
    inner: I,
    total: Option<u64>,
}

impl<I> IterSource<I> {
    /// Wraps an iterator with no declared total.
    pub fn new(inner: I) -> Self {
        Self { inner, total: None }
    }

    /// Declares the total number of records.
    pub fn with_total(mut self, total: u64) -> Self {
        self.total = Some(total);
        self
    }
}

impl<R> IterSource<std::iter::Map<std::vec::IntoIter<R>, fn(R) -> Result<R>>> {
    /// Wraps records that cannot fail.
    pub fn infallible(records: Vec<R>) -> Self {
        Self::new(records.into_iter().map(Ok as fn(R) -> Result<R>))
    }
}

impl<R, I: Iterator<Item = Result<R>>> Iterator for IterSource<I> {
    type Item = Result<R>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<R, I: Iterator<Item = Result<R>>> RecordSource<R> for IterSource<I> {
    fn total_hint(&self) -> Option<u64> {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infallible_source() {
        let mut source = IterSource::infallible(vec![1, 2]);
        assert_eq!(source.total_hint(), None);
        assert_eq!(source.next().unwrap().unwrap(), 1);
        assert_eq!(source.next().unwrap().unwrap(), 2);
        assert!(source.next().is_none());
    }

    #[test]
    fn test_declared_total() {
        let source = IterSource::infallible(vec![1, 2, 3]).with_total(40);
        assert_eq!(source.total_hint(), Some(40));
    }
}
