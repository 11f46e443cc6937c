//! Aggregation key extractors.
//!
//! Each extractor produces the grouping key for one level of the tree.

use atlas_core::error::{AtlasError, Result};
use atlas_core::traits::ProbeRecord;
use atlas_core::types::AttributeValue;

/// Maps a record to the key it is grouped under at one tree level.
pub trait KeyExtractor<R> {
    /// Label shown in group headers, e.g. `Country` or `ASN_V4`.
    fn label(&self) -> &str;

    /// Extracts the grouping key.
    ///
    /// An error aborts the whole aggregation pass.
    fn extract(&self, record: &R) -> Result<AttributeValue>;
}

/// Groups records by one named attribute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValueKeyExtractor {
    attribute: String,
    label: String,
}

impl ValueKeyExtractor {
    /// Aggregation names accepted by [`from_name`](Self::from_name).
    pub const NAMES: [&'static str; 6] =
        ["country", "asn_v4", "asn_v6", "prefix_v4", "prefix_v6", "status"];

    /// Groups by `attribute`, with its upper-cased name as the header label.
    pub fn new(attribute: impl Into<String>) -> Self {
        let attribute = attribute.into();
        let label = attribute.to_uppercase();
        Self { attribute, label }
    }

    /// Overrides the header label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Builds the extractor for a user-facing aggregation name.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "country" => Ok(Self::new("country_code").with_label("Country")),
            "asn_v4" | "asn_v6" | "prefix_v4" | "prefix_v6" | "status" => Ok(Self::new(name)),
            other => Err(AtlasError::UnknownAggregation(format!(
                "{} (choose from {})",
                other,
                Self::NAMES.join(", ")
            ))),
        }
    }

    /// Returns the attribute read from each record.
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Boxes the extractor for an [`Aggregator`](crate::Aggregator).
    pub fn boxed<R: ProbeRecord>(self) -> Box<dyn KeyExtractor<R>> {
        Box::new(self)
    }
}

impl<R: ProbeRecord> KeyExtractor<R> for ValueKeyExtractor {
    fn label(&self) -> &str {
        &self.label
    }

    fn extract(&self, record: &R) -> Result<AttributeValue> {
        record.attribute(&self.attribute)
    }
}

/// Groups records by the result of a closure.
pub struct KeyFn<F> {
    label: String,
    function: F,
}

impl<F> KeyFn<F> {
    /// Wraps `function` under a header label.
    pub fn new(label: impl Into<String>, function: F) -> Self {
        Self {
            label: label.into(),
            function,
        }
    }
}

impl<R, F> KeyExtractor<R> for KeyFn<F>
where
    F: Fn(&R) -> Result<AttributeValue>,
{
    fn label(&self) -> &str {
        &self.label
    }

    fn extract(&self, record: &R) -> Result<AttributeValue> {
        (self.function)(record)
    }
}
