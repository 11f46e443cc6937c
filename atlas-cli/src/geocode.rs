//! Place-name to coordinates lookups.

use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

use atlas_core::error::{AtlasError, Result};

/// A latitude/longitude pair.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    /// Latitude in degrees
    pub lat: f64,
    /// Longitude in degrees
    pub lng: f64,
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

/// Client for a Google-style geocoding endpoint.
pub struct Geocoder {
    http: Client,
    url: String,
    key: Option<String>,
}

impl Geocoder {
    /// Creates a geocoder for `url`.
    pub fn new(url: impl Into<String>, key: Option<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AtlasError::Http(e.to_string()))?;
        Ok(Self {
            http,
            url: url.into(),
            key,
        })
    }

    /// Resolves `location` to the coordinates of its best match.
    ///
    /// Transport failures and unexpected responses are both reported as
    /// [`AtlasError::Geocoding`].
    #[instrument(skip(self))]
    pub fn lookup(&self, location: &str) -> Result<Coordinates> {
        let mut request = self.http.get(&self.url).query(&[("address", location)]);
        if let Some(key) = &self.key {
            request = request.query(&[("key", key)]);
        }

        let body: Value = request
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.json())
            .map_err(|e| {
                AtlasError::Geocoding(format!("could not reach the geocoding service: {}", e))
            })?;

        let coordinates = parse_response(&body, location)?;
        debug!(%coordinates, "Location resolved");
        Ok(coordinates)
    }
}

/// Extracts the first result's location from a geocoding response.
pub fn parse_response(body: &Value, location: &str) -> Result<Coordinates> {
    let point = body.pointer("/results/0/geometry/location");
    let lat = point.and_then(|p| p.get("lat")).and_then(Value::as_f64);
    let lng = point.and_then(|p| p.get("lng")).and_then(Value::as_f64);

    match (lat, lng) {
        (Some(lat), Some(lng)) => Ok(Coordinates { lat, lng }),
        _ => Err(AtlasError::Geocoding(format!(
            "the geocoding service returned no usable result for \"{}\"",
            location
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_first_result() {
        let body = json!({"results": [
            {"geometry": {"location": {"lat": 52.37, "lng": 4.89}}},
            {"geometry": {"location": {"lat": 0.0, "lng": 0.0}}}
        ]});
        let coordinates = parse_response(&body, "Amsterdam").unwrap();
        assert_eq!(coordinates, Coordinates { lat: 52.37, lng: 4.89 });
    }

    #[test]
    fn test_parse_integer_degrees() {
        let body = json!({"results": [{"geometry": {"location": {"lat": 1, "lng": 2}}}]});
        let coordinates = parse_response(&body, "x").unwrap();
        assert_eq!(coordinates.to_string(), "1,2");
    }

    #[test]
    fn test_unexpected_shape() {
        let err = parse_response(&json!({"blaaa": "bla"}), "blaaaa").unwrap_err();
        assert!(matches!(err, AtlasError::Geocoding(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_no_results() {
        assert!(parse_response(&json!({"results": []}), "nowhere").is_err());
    }

    #[test]
    fn test_unreachable_service() {
        let geocoder = Geocoder::new("http://127.0.0.1:9/geocode/json", None).unwrap();
        let err = geocoder.lookup("Amsterdam").unwrap_err();
        assert!(matches!(err, AtlasError::Geocoding(_)));
    }
}
