//! Probe records as listed by the measurement platform.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{AtlasError, Result};
use crate::traits::ProbeRecord;

/// A single attribute value read off a record.
///
/// Variant order defines the sort order of mixed values: nulls first, then
/// booleans, integers and text.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AttributeValue {
    /// Attribute exists but is unset
    Null,
    /// Boolean flag
    Bool(bool),
    /// Integer (ids, AS numbers)
    Int(i64),
    /// Free text (country codes, prefixes, names)
    Text(String),
}

impl AttributeValue {
    /// Returns true for [`AttributeValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, AttributeValue::Null)
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => f.write_str("None"),
            AttributeValue::Bool(b) => write!(f, "{}", b),
            AttributeValue::Int(n) => write!(f, "{}", n),
            AttributeValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<Option<String>> for AttributeValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(AttributeValue::Null, AttributeValue::Text)
    }
}

impl From<Option<u32>> for AttributeValue {
    fn from(value: Option<u32>) -> Self {
        value.map_or(AttributeValue::Null, |n| AttributeValue::Int(i64::from(n)))
    }
}

/// Connection status of a probe.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeStatus {
    /// Numeric status code
    #[serde(default)]
    pub id: Option<u8>,
    /// Human-readable status ("Connected", "Disconnected", ...)
    pub name: String,
}

/// GeoJSON point of a probe's location.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    /// GeoJSON type, always "Point"
    #[serde(rename = "type")]
    pub kind: String,
    /// Longitude, latitude
    pub coordinates: [f64; 2],
}

/// A probe as returned by the platform's probe listing.
///
/// Every field except `id` may be absent or null in the payload.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Probe {
    /// Probe id
    pub id: u64,
    /// IPv4 autonomous system number
    #[serde(default)]
    pub asn_v4: Option<u32>,
    /// IPv6 autonomous system number
    #[serde(default)]
    pub asn_v6: Option<u32>,
    /// ISO 3166-1 alpha-2 country code
    #[serde(default)]
    pub country_code: Option<String>,
    /// IPv4 prefix the probe lives in
    #[serde(default)]
    pub prefix_v4: Option<String>,
    /// IPv6 prefix the probe lives in
    #[serde(default)]
    pub prefix_v6: Option<String>,
    /// Public IPv4 address
    #[serde(default)]
    pub address_v4: Option<String>,
    /// Public IPv6 address
    #[serde(default)]
    pub address_v6: Option<String>,
    /// Whether the probe's details are public
    #[serde(default)]
    pub is_public: Option<bool>,
    /// Owner-supplied description
    #[serde(default)]
    pub description: Option<String>,
    /// Connection status
    #[serde(default)]
    pub status: Option<ProbeStatus>,
    /// Location
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

impl Probe {
    /// Attribute names a probe answers to.
    pub const ATTRIBUTES: [&'static str; 11] = [
        "id",
        "asn_v4",
        "asn_v6",
        "country_code",
        "prefix_v4",
        "prefix_v6",
        "address_v4",
        "address_v6",
        "is_public",
        "description",
        "status",
    ];

    /// Creates a probe with only an id set.
    pub fn new(id: u64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Sets the country code.
    pub fn with_country(mut self, country_code: impl Into<String>) -> Self {
        self.country_code = Some(country_code.into());
        self
    }

    /// Sets the IPv4 AS number.
    pub fn with_asn_v4(mut self, asn: u32) -> Self {
        self.asn_v4 = Some(asn);
        self
    }

    /// Sets the IPv6 AS number.
    pub fn with_asn_v6(mut self, asn: u32) -> Self {
        self.asn_v6 = Some(asn);
        self
    }

    /// Sets the IPv4 prefix.
    pub fn with_prefix_v4(mut self, prefix: impl Into<String>) -> Self {
        self.prefix_v4 = Some(prefix.into());
        self
    }

    /// Sets the status name.
    pub fn with_status(mut self, name: impl Into<String>) -> Self {
        self.status = Some(ProbeStatus {
            id: None,
            name: name.into(),
        });
        self
    }

    /// Returns the status name, if known.
    pub fn status_name(&self) -> Option<&str> {
        self.status.as_ref().map(|s| s.name.as_str())
    }

    /// Returns (latitude, longitude), if the probe has a location.
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.geometry
            .as_ref()
            .map(|g| (g.coordinates[1], g.coordinates[0]))
    }
}

impl ProbeRecord for Probe {
    fn id(&self) -> u64 {
        self.id
    }

    fn attribute(&self, name: &str) -> Result<AttributeValue> {
        let value = match name {
            "id" => AttributeValue::Int(self.id as i64),
            "asn_v4" => self.asn_v4.into(),
            "asn_v6" => self.asn_v6.into(),
            "country_code" => self.country_code.clone().into(),
            "prefix_v4" => self.prefix_v4.clone().into(),
            "prefix_v6" => self.prefix_v6.clone().into(),
            "address_v4" => self.address_v4.clone().into(),
            "address_v6" => self.address_v6.clone().into(),
            "is_public" => self.is_public.map_or(AttributeValue::Null, AttributeValue::Bool),
            "description" => self.description.clone().into(),
            "status" => self.status_name().map(str::to_string).into(),
            other => return Err(AtlasError::UnknownAttribute(other.to_string())),
        };
        Ok(value)
    }
}
