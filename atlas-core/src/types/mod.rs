//! Domain types for atlas.
//!
//! - [`Probe`]: one probe as listed by the measurement platform
//! - [`AttributeValue`]: a named attribute read off a record
//! - [`MeasurementSpec`]: the closed set of measurement request variants

mod measurement;
mod probe;

pub use measurement::*;
pub use probe::*;
