//! Blocking client for the measurement platform's REST API.

use std::collections::{BTreeMap, VecDeque};
use std::time::Duration;

use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use atlas_aggregate::RecordSource;
use atlas_core::constants::PROBE_PAGE_SIZE;
use atlas_core::error::{AtlasError, Result};
use atlas_core::types::{create_request_body, MeasurementSpec, Probe, ProbeSelection};

/// Probe-listing filters, as sent in the query string.
pub type RequestArgs = BTreeMap<&'static str, String>;

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// One page of a paginated listing.
#[derive(Clone, Debug, Deserialize)]
pub struct Page<T> {
    /// Total number of results across all pages
    #[serde(default)]
    pub count: Option<u64>,
    /// URL of the next page
    #[serde(default)]
    pub next: Option<String>,
    /// Results on this page
    pub results: Vec<T>,
}

/// Pulls a paginated listing one page at a time.
///
/// The declared total becomes known once the first page arrives. A failed
/// fetch is yielded once as an error and ends the sequence.
pub struct Paginated<T, F> {
    fetch: F,
    next: Option<String>,
    buffer: VecDeque<T>,
    total: Option<u64>,
}

impl<T, F> Paginated<T, F>
where
    F: FnMut(&str) -> Result<Page<T>>,
{
    /// Starts a listing at `first`.
    pub fn new(first: impl Into<String>, fetch: F) -> Self {
        Self {
            fetch,
            next: Some(first.into()),
            buffer: VecDeque::new(),
            total: None,
        }
    }
}

impl<T, F> Iterator for Paginated<T, F>
where
    F: FnMut(&str) -> Result<Page<T>>,
{
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(item) = self.buffer.pop_front() {
                return Some(Ok(item));
            }
            let url = self.next.take()?;
            match (self.fetch)(&url) {
                Ok(page) => {
                    if self.total.is_none() {
                        self.total = page.count;
                    }
                    self.next = page.next.filter(|next| !next.is_empty());
                    self.buffer.extend(page.results);
                }
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

impl<T, F> RecordSource<T> for Paginated<T, F>
where
    F: FnMut(&str) -> Result<Page<T>>,
{
    fn total_hint(&self) -> Option<u64> {
        self.total
    }
}

/// API client.
pub struct AtlasClient {
    http: Client,
    base_url: Url,
    create_key: Option<String>,
}

impl AtlasClient {
    /// Creates a client for the platform at `base_url`.
    pub fn new(base_url: &str, create_key: Option<String>) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| AtlasError::Config(format!("invalid API URL {}: {}", base_url, e)))?;
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(concat!("atlas/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AtlasError::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            create_key,
        })
    }

    /// Returns true if measurements can be created.
    pub fn can_create(&self) -> bool {
        self.create_key.is_some()
    }

    /// Builds the first probe-listing URL for `args`.
    pub fn probes_url(&self, args: &RequestArgs) -> Result<Url> {
        let mut url = self
            .base_url
            .join("/api/v2/probes/")
            .map_err(|e| AtlasError::Config(e.to_string()))?;
        {
            let mut query = url.query_pairs_mut();
            for (name, value) in args {
                query.append_pair(name, value);
            }
            query.append_pair("page_size", &PROBE_PAGE_SIZE.to_string());
        }
        Ok(url)
    }

    /// Lists probes matching `args`, lazily, page by page.
    pub fn probes<'a>(
        &'a self,
        args: &RequestArgs,
    ) -> Result<Paginated<Probe, impl FnMut(&str) -> Result<Page<Probe>> + 'a>> {
        let first = self.probes_url(args)?;
        Ok(Paginated::new(first.to_string(), move |url: &str| self.get_json(url)))
    }

    /// Creates one measurement and returns the ids the platform assigned.
    #[instrument(skip(self, spec, probes), fields(kind = %spec.kind()))]
    pub fn create_measurement(
        &self,
        spec: &MeasurementSpec,
        probes: &ProbeSelection,
    ) -> Result<Vec<u64>> {
        let key = self.create_key.as_deref().ok_or_else(|| {
            AtlasError::Config("no API key configured for measurement creation".into())
        })?;

        let mut url = self
            .base_url
            .join("/api/v2/measurements/")
            .map_err(|e| AtlasError::Config(e.to_string()))?;
        url.query_pairs_mut().append_pair("key", key);

        let body = create_request_body(spec, probes)?;
        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .map_err(|e| AtlasError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(AtlasError::Api {
                status: status.as_u16(),
                message: error_detail(&text),
            });
        }

        let created: Created = response
            .json()
            .map_err(|e| AtlasError::Http(e.to_string()))?;
        debug!(ids = ?created.measurements, "Measurement created");
        Ok(created.measurements)
    }

    #[instrument(skip(self))]
    fn get_json<T: for<'de> Deserialize<'de>>(&self, url: &str) -> Result<T> {
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|e| AtlasError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            return Err(AtlasError::Api {
                status: status.as_u16(),
                message: error_detail(&text),
            });
        }

        response.json().map_err(|e| AtlasError::Http(e.to_string()))
    }
}

#[derive(Deserialize)]
struct Created {
    measurements: Vec<u64>,
}

/// Pulls the human-readable message out of an API error body.
fn error_detail(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.pointer("/error/detail")
                .or_else(|| v.pointer("/detail"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}
