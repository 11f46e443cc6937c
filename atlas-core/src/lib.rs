//! # Atlas Core
//!
//! Core types, errors, and traits shared by every atlas crate.
//!
//! - **Types**: probe records and measurement request variants
//! - **Errors**: one error enum for the cache, aggregator and client layers
//! - **Constants**: tool name, file names, API defaults
//! - **Traits**: attribute lookup on records
//!
//! ## Example
//!
//! ```rust
//! use atlas_core::{AttributeValue, Probe, ProbeRecord};
//!
//! let probe: Probe = serde_json::from_str(r#"{"id": 1, "country_code": "GR"}"#).unwrap();
//! assert_eq!(probe.attribute("country_code").unwrap(), AttributeValue::Text("GR".into()));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{AtlasError, Result};
pub use traits::*;
pub use types::*;
