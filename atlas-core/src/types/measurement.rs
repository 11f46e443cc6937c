//! Measurement request variants.
//!
//! The platform accepts six measurement types. Each is a variant of
//! [`MeasurementSpec`] carrying the options shared by every type plus its own
//! type-specific options, and each knows how to turn itself into the JSON
//! definition the platform expects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::constants::{DEFAULT_PROBES_REQUESTED, MEASUREMENT_KINDS};
use crate::error::{AtlasError, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// KIND
// ═══════════════════════════════════════════════════════════════════════════════

/// Measurement type name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementKind {
    /// ICMP echo
    Ping,
    /// Path discovery
    Traceroute,
    /// DNS query
    Dns,
    /// TLS certificate fetch
    Sslcert,
    /// HTTP request
    Http,
    /// NTP query
    Ntp,
}

impl MeasurementKind {
    /// Returns the wire name of the type.
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasurementKind::Ping => "ping",
            MeasurementKind::Traceroute => "traceroute",
            MeasurementKind::Dns => "dns",
            MeasurementKind::Sslcert => "sslcert",
            MeasurementKind::Http => "http",
            MeasurementKind::Ntp => "ntp",
        }
    }

    /// Returns the name used in generated descriptions.
    pub fn label(&self) -> &'static str {
        match self {
            MeasurementKind::Ping => "Ping",
            MeasurementKind::Traceroute => "Traceroute",
            MeasurementKind::Dns => "DNS",
            MeasurementKind::Sslcert => "Sslcert",
            MeasurementKind::Http => "HTTP",
            MeasurementKind::Ntp => "NTP",
        }
    }
}

impl fmt::Display for MeasurementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeasurementKind {
    type Err = AtlasError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "ping" => Ok(MeasurementKind::Ping),
            "traceroute" => Ok(MeasurementKind::Traceroute),
            "dns" => Ok(MeasurementKind::Dns),
            "sslcert" => Ok(MeasurementKind::Sslcert),
            "http" => Ok(MeasurementKind::Http),
            "ntp" => Ok(MeasurementKind::Ntp),
            _ => Err(AtlasError::Validation(format!(
                "The measurement type you requested is invalid. Please choose one of {}.",
                MEASUREMENT_KINDS.join(", ")
            ))),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// OPTIONS
// ═══════════════════════════════════════════════════════════════════════════════

/// Options every measurement type accepts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommonOptions {
    /// Host name or address to measure towards
    pub target: Option<String>,
    /// Address family, 4 or 6
    pub af: u8,
    /// Free-text description; generated when absent
    pub description: Option<String>,
    /// Resolve the target on the probe rather than once up front
    pub resolve_on_probe: bool,
    /// Seconds between runs; absent for a one-off measurement
    pub interval: Option<u32>,
}

impl Default for CommonOptions {
    fn default() -> Self {
        Self {
            target: None,
            af: 4,
            description: None,
            resolve_on_probe: false,
            interval: None,
        }
    }
}

impl CommonOptions {
    /// Creates options aimed at `target`.
    pub fn with_target(target: impl Into<String>) -> Self {
        Self {
            target: Some(target.into()),
            ..Self::default()
        }
    }

    fn target(&self) -> Option<&str> {
        self.target.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// Ping options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingOptions {
    /// Packets per run
    pub packets: u32,
    /// Payload size in bytes
    pub size: u32,
    /// Milliseconds between packets
    pub packet_interval: Option<u32>,
}

impl Default for PingOptions {
    fn default() -> Self {
        Self {
            packets: 3,
            size: 48,
            packet_interval: None,
        }
    }
}

/// Traceroute options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracerouteOptions {
    /// ICMP, UDP or TCP
    pub protocol: String,
    /// Packets per hop
    pub packets: u32,
    /// Payload size in bytes
    pub size: u32,
    /// TTL of the first hop
    pub first_hop: u32,
    /// Highest TTL tried
    pub max_hops: u32,
    /// Number of Paris variations, 0 disables
    pub paris: u32,
    /// Per-packet timeout in milliseconds
    pub timeout: u32,
    /// Set the don't-fragment bit
    pub dont_fragment: bool,
    /// Destination port for TCP traceroutes
    pub port: Option<u16>,
}

impl Default for TracerouteOptions {
    fn default() -> Self {
        Self {
            protocol: "ICMP".into(),
            packets: 3,
            size: 48,
            first_hop: 1,
            max_hops: 32,
            paris: 16,
            timeout: 4000,
            dont_fragment: false,
            port: None,
        }
    }
}

/// DNS options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsOptions {
    /// UDP or TCP
    pub protocol: String,
    /// IN or CHAOS
    pub query_class: String,
    /// Record type (A, AAAA, TXT, ...)
    pub query_type: String,
    /// Label to query
    pub query_argument: Option<String>,
    /// DNSSEC Checking Disabled flag
    pub set_cd_bit: bool,
    /// DNSSEC OK flag
    pub set_do_bit: bool,
    /// EDNS name server id request
    pub set_nsid_bit: bool,
    /// Recursion Desired flag
    pub set_rd_bit: bool,
    /// Retries on timeout
    pub retry: u32,
    /// Advertised EDNS UDP payload size
    pub udp_payload_size: u32,
}

impl Default for DnsOptions {
    fn default() -> Self {
        Self {
            protocol: "UDP".into(),
            query_class: "IN".into(),
            query_type: "A".into(),
            query_argument: None,
            set_cd_bit: false,
            set_do_bit: false,
            set_nsid_bit: false,
            set_rd_bit: true,
            retry: 0,
            udp_payload_size: 512,
        }
    }
}

/// SSL certificate options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SslcertOptions {
    /// TLS port
    pub port: u16,
}

impl Default for SslcertOptions {
    fn default() -> Self {
        Self { port: 443 }
    }
}

/// HTTP options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpOptions {
    /// GET, HEAD or POST
    pub method: String,
    /// Request path
    pub path: String,
    /// Query string without the leading `?`
    pub query_string: Option<String>,
    /// User-Agent header
    pub user_agent: Option<String>,
    /// Response header bytes to keep
    pub header_bytes: u32,
    /// HTTP version
    pub version: String,
    /// 0, 1 or 2
    pub timing_verbosity: u8,
    /// Destination port
    pub port: u16,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            method: "GET".into(),
            path: "/".into(),
            query_string: None,
            user_agent: None,
            header_bytes: 0,
            version: "1.1".into(),
            timing_verbosity: 0,
            port: 80,
        }
    }
}

/// NTP options.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NtpOptions {
    /// Packets per run
    pub packets: u32,
    /// Per-packet timeout in milliseconds
    pub timeout: u32,
}

impl Default for NtpOptions {
    fn default() -> Self {
        Self {
            packets: 3,
            timeout: 4000,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SPEC
// ═══════════════════════════════════════════════════════════════════════════════

/// A measurement request of one of the six supported types.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MeasurementSpec {
    /// Ping measurement
    Ping {
        /// Shared options
        common: CommonOptions,
        /// Ping options
        options: PingOptions,
    },
    /// Traceroute measurement
    Traceroute {
        /// Shared options
        common: CommonOptions,
        /// Traceroute options
        options: TracerouteOptions,
    },
    /// DNS measurement
    Dns {
        /// Shared options
        common: CommonOptions,
        /// DNS options
        options: DnsOptions,
    },
    /// SSL certificate measurement
    Sslcert {
        /// Shared options
        common: CommonOptions,
        /// Certificate options
        options: SslcertOptions,
    },
    /// HTTP measurement
    Http {
        /// Shared options
        common: CommonOptions,
        /// HTTP options
        options: HttpOptions,
    },
    /// NTP measurement
    Ntp {
        /// Shared options
        common: CommonOptions,
        /// NTP options
        options: NtpOptions,
    },
}

impl MeasurementSpec {
    /// Returns the measurement type.
    pub fn kind(&self) -> MeasurementKind {
        match self {
            MeasurementSpec::Ping { .. } => MeasurementKind::Ping,
            MeasurementSpec::Traceroute { .. } => MeasurementKind::Traceroute,
            MeasurementSpec::Dns { .. } => MeasurementKind::Dns,
            MeasurementSpec::Sslcert { .. } => MeasurementKind::Sslcert,
            MeasurementSpec::Http { .. } => MeasurementKind::Http,
            MeasurementSpec::Ntp { .. } => MeasurementKind::Ntp,
        }
    }

    /// Returns the shared options.
    pub fn common(&self) -> &CommonOptions {
        match self {
            MeasurementSpec::Ping { common, .. }
            | MeasurementSpec::Traceroute { common, .. }
            | MeasurementSpec::Dns { common, .. }
            | MeasurementSpec::Sslcert { common, .. }
            | MeasurementSpec::Http { common, .. }
            | MeasurementSpec::Ntp { common, .. } => common,
        }
    }

    /// Returns true if the measurement runs once.
    pub fn is_oneoff(&self) -> bool {
        self.common().interval.is_none()
    }

    /// Returns the description sent with the request.
    pub fn description(&self) -> String {
        let common = self.common();
        if let Some(description) = common.description.as_deref().filter(|d| !d.is_empty()) {
            return description.to_string();
        }
        match (self, common.target()) {
            (MeasurementSpec::Dns { options, .. }, None) => format!(
                "DNS measurement for {}",
                options.query_argument.as_deref().unwrap_or_default()
            ),
            (_, Some(target)) => format!("{} measurement to {}", self.kind().label(), target),
            (_, None) => format!("{} measurement", self.kind().label()),
        }
    }

    /// Validates the request without building it.
    pub fn validate(&self) -> Result<()> {
        let common = self.common();
        if common.af != 4 && common.af != 6 {
            return Err(AtlasError::Validation(format!(
                "address family must be 4 or 6, got {}",
                common.af
            )));
        }

        match self {
            MeasurementSpec::Dns { options, .. } => {
                let missing = |v: &str| v.trim().is_empty();
                if missing(&options.query_class)
                    || missing(&options.query_type)
                    || options.query_argument.as_deref().map_or(true, missing)
                {
                    return Err(AtlasError::Validation(
                        "At a minimum, DNS measurements require a query argument.".into(),
                    ));
                }
                one_of("protocol", &options.protocol, &["UDP", "TCP"])?;
                one_of("query class", &options.query_class, &["IN", "CHAOS"])?;
            }
            _ if common.target().is_none() => {
                return Err(AtlasError::Validation(format!(
                    "You must specify a target for {} measurements.",
                    self.kind()
                )));
            }
            MeasurementSpec::Traceroute { options, .. } => {
                one_of("protocol", &options.protocol, &["ICMP", "UDP", "TCP"])?;
            }
            MeasurementSpec::Http { options, .. } => {
                one_of("method", &options.method, &["GET", "HEAD", "POST"])?;
            }
            _ => {}
        }

        Ok(())
    }

    /// Builds the JSON definition object the platform expects for this request.
    pub fn build_request_parameters(&self) -> Result<Value> {
        self.validate()?;

        let common = self.common();
        let mut params = Map::new();
        params.insert("type".into(), json!(self.kind().as_str()));
        params.insert("af".into(), json!(common.af));
        params.insert("description".into(), json!(self.description()));
        if let Some(target) = common.target() {
            params.insert("target".into(), json!(target));
        }
        if common.resolve_on_probe {
            params.insert("resolve_on_probe".into(), json!(true));
        }
        if let Some(interval) = common.interval {
            params.insert("interval".into(), json!(interval));
        }

        match self {
            MeasurementSpec::Ping { options, .. } => {
                params.insert("packets".into(), json!(options.packets));
                params.insert("size".into(), json!(options.size));
                if let Some(interval) = options.packet_interval {
                    params.insert("packet_interval".into(), json!(interval));
                }
            }
            MeasurementSpec::Traceroute { options, .. } => {
                params.insert("protocol".into(), json!(options.protocol));
                params.insert("packets".into(), json!(options.packets));
                params.insert("size".into(), json!(options.size));
                params.insert("first_hop".into(), json!(options.first_hop));
                params.insert("max_hops".into(), json!(options.max_hops));
                params.insert("paris".into(), json!(options.paris));
                params.insert("timeout".into(), json!(options.timeout));
                params.insert("dont_fragment".into(), json!(options.dont_fragment));
                if let Some(port) = options.port {
                    params.insert("port".into(), json!(port));
                }
            }
            MeasurementSpec::Dns { options, .. } => {
                params.insert("query_class".into(), json!(options.query_class));
                params.insert("query_type".into(), json!(options.query_type));
                params.insert("query_argument".into(), json!(options.query_argument));
                params.insert("set_cd_bit".into(), json!(options.set_cd_bit));
                params.insert("set_do_bit".into(), json!(options.set_do_bit));
                params.insert("set_rd_bit".into(), json!(options.set_rd_bit));
                params.insert("set_nsid_bit".into(), json!(options.set_nsid_bit));
                params.insert("protocol".into(), json!(options.protocol));
                params.insert("retry".into(), json!(options.retry));
                params.insert("udp_payload_size".into(), json!(options.udp_payload_size));
                params.insert("use_probe_resolver".into(), json!(common.target().is_none()));
            }
            MeasurementSpec::Sslcert { options, .. } => {
                params.insert("port".into(), json!(options.port));
            }
            MeasurementSpec::Http { options, .. } => {
                params.insert("method".into(), json!(options.method));
                params.insert("path".into(), json!(options.path));
                if let Some(query) = &options.query_string {
                    params.insert("query_string".into(), json!(query));
                }
                if let Some(agent) = &options.user_agent {
                    params.insert("user_agent".into(), json!(agent));
                }
                params.insert("header_bytes".into(), json!(options.header_bytes));
                params.insert("version".into(), json!(options.version));
                params.insert("timing_verbosity".into(), json!(options.timing_verbosity));
                params.insert("port".into(), json!(options.port));
            }
            MeasurementSpec::Ntp { options, .. } => {
                params.insert("packets".into(), json!(options.packets));
                params.insert("timeout".into(), json!(options.timeout));
            }
        }

        Ok(Value::Object(params))
    }
}

fn one_of(what: &str, value: &str, allowed: &[&str]) -> Result<()> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(AtlasError::Validation(format!(
            "{} must be one of {}, got \"{}\"",
            what,
            allowed.join(", "),
            value
        )))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROBE SELECTION
// ═══════════════════════════════════════════════════════════════════════════════

/// Which probes a new measurement should run on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeSelection {
    /// Number of probes requested
    pub requested: u32,
    /// Selection type: area, country, prefix, asn, probes or msm
    #[serde(rename = "type")]
    pub kind: String,
    /// Selection value, e.g. "WW" or a comma-separated id list
    pub value: String,
}

impl Default for ProbeSelection {
    fn default() -> Self {
        Self {
            requested: DEFAULT_PROBES_REQUESTED,
            kind: "area".into(),
            value: "WW".into(),
        }
    }
}

/// Builds the full creation body for one measurement.
pub fn create_request_body(spec: &MeasurementSpec, probes: &ProbeSelection) -> Result<Value> {
    Ok(json!({
        "definitions": [spec.build_request_parameters()?],
        "probes": [probes],
        "is_oneoff": spec.is_oneoff(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn dns(target: Option<&str>, argument: Option<&str>) -> MeasurementSpec {
        MeasurementSpec::Dns {
            common: CommonOptions {
                target: target.map(str::to_string),
                ..CommonOptions::default()
            },
            options: DnsOptions {
                query_argument: argument.map(str::to_string),
                ..DnsOptions::default()
            },
        }
    }

    #[test_case("ping", MeasurementKind::Ping)]
    #[test_case("TRACEROUTE", MeasurementKind::Traceroute)]
    #[test_case("Dns", MeasurementKind::Dns)]
    #[test_case("sslcert", MeasurementKind::Sslcert)]
    #[test_case("http", MeasurementKind::Http)]
    #[test_case("ntp", MeasurementKind::Ntp)]
    fn test_kind_from_str(name: &str, expected: MeasurementKind) {
        assert_eq!(name.parse::<MeasurementKind>().unwrap(), expected);
    }

    #[test]
    fn test_unknown_kind() {
        let err = "smoke-signal".parse::<MeasurementKind>().unwrap_err();
        assert!(err.is_validation_error());
        assert!(err.to_string().contains("ping, traceroute, dns, sslcert, http, ntp"));
    }

    #[test]
    fn test_ping_parameters() {
        let spec = MeasurementSpec::Ping {
            common: CommonOptions::with_target("ripe.net"),
            options: PingOptions::default(),
        };
        let params = spec.build_request_parameters().unwrap();
        assert_eq!(params["type"], "ping");
        assert_eq!(params["target"], "ripe.net");
        assert_eq!(params["af"], 4);
        assert_eq!(params["packets"], 3);
        assert_eq!(params["description"], "Ping measurement to ripe.net");
        assert!(params.get("interval").is_none());
    }

    #[test]
    fn test_target_required() {
        let spec = MeasurementSpec::Ping {
            common: CommonOptions::default(),
            options: PingOptions::default(),
        };
        assert!(spec.build_request_parameters().unwrap_err().is_validation_error());
    }

    #[test]
    fn test_dns_without_target_uses_probe_resolver() {
        let params = dns(None, Some("example.com")).build_request_parameters().unwrap();
        assert_eq!(params["use_probe_resolver"], true);
        assert_eq!(params["description"], "DNS measurement for example.com");
        assert!(params.get("target").is_none());
    }

    #[test]
    fn test_dns_with_target() {
        let params = dns(Some("k.root-servers.net"), Some("example.com"))
            .build_request_parameters()
            .unwrap();
        assert_eq!(params["use_probe_resolver"], false);
        assert_eq!(params["target"], "k.root-servers.net");
        assert_eq!(params["description"], "DNS measurement to k.root-servers.net");
    }

    #[test]
    fn test_dns_requires_query_argument() {
        let err = dns(None, None).build_request_parameters().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation error: At a minimum, DNS measurements require a query argument."
        );
    }

    #[test]
    fn test_invalid_af() {
        let spec = MeasurementSpec::Ntp {
            common: CommonOptions {
                af: 5,
                ..CommonOptions::with_target("pool.ntp.org")
            },
            options: NtpOptions::default(),
        };
        assert!(spec.validate().is_err());
    }

    #[test]
    fn test_create_body() {
        let spec = MeasurementSpec::Http {
            common: CommonOptions {
                interval: Some(900),
                description: Some("homepage".into()),
                ..CommonOptions::with_target("example.com")
            },
            options: HttpOptions::default(),
        };
        let body = create_request_body(&spec, &ProbeSelection::default()).unwrap();
        assert_eq!(body["is_oneoff"], false);
        assert_eq!(body["definitions"][0]["interval"], 900);
        assert_eq!(body["definitions"][0]["description"], "homepage");
        assert_eq!(body["probes"][0]["type"], "area");
        assert_eq!(body["probes"][0]["requested"], 50);
    }
}
