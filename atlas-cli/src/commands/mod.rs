//! CLI command implementations.

pub mod cache;
pub mod measure;
pub mod probes;

use clap::{Args, Subcommand, ValueEnum};

use atlas_core::constants::{DEFAULT_PROBES_REQUESTED, DEFAULT_PROBE_LIMIT};

/// Attributes probes can be grouped by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AggregateBy {
    /// Country code
    #[value(name = "country")]
    Country,
    /// IPv4 AS number
    #[value(name = "asn_v4")]
    AsnV4,
    /// IPv6 AS number
    #[value(name = "asn_v6")]
    AsnV6,
    /// IPv4 prefix
    #[value(name = "prefix_v4")]
    PrefixV4,
    /// IPv6 prefix
    #[value(name = "prefix_v6")]
    PrefixV6,
    /// Connection status
    #[value(name = "status")]
    Status,
}

impl AggregateBy {
    /// Returns the aggregation name.
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateBy::Country => "country",
            AggregateBy::AsnV4 => "asn_v4",
            AggregateBy::AsnV6 => "asn_v6",
            AggregateBy::PrefixV4 => "prefix_v4",
            AggregateBy::PrefixV6 => "prefix_v6",
            AggregateBy::Status => "status",
        }
    }
}

/// Arguments for the probes command.
#[derive(Args, Clone, Debug)]
pub struct ProbesArgs {
    /// Maximum number of probes to show.
    #[arg(long, default_value_t = DEFAULT_PROBE_LIMIT)]
    pub limit: usize,

    /// Maximum number of probes shown per group.
    #[arg(long)]
    pub max_per_aggregation: Option<usize>,

    /// Print only probe ids, one per line.
    #[arg(long)]
    pub ids_only: bool,

    /// Group probes by an attribute; repeat to nest groups.
    #[arg(long, value_enum)]
    pub aggregate_by: Vec<AggregateBy>,

    /// AS number, IPv4 or IPv6.
    #[arg(long)]
    pub asn: Option<u32>,

    /// IPv4 AS number.
    #[arg(long)]
    pub asnv4: Option<u32>,

    /// IPv6 AS number.
    #[arg(long)]
    pub asnv6: Option<u32>,

    /// Prefix, IPv4 or IPv6.
    #[arg(long)]
    pub prefix: Option<String>,

    /// IPv4 prefix.
    #[arg(long)]
    pub prefixv4: Option<String>,

    /// IPv6 prefix.
    #[arg(long)]
    pub prefixv6: Option<String>,

    /// Place name, geocoded to a centre point.
    #[arg(long)]
    pub location: Option<String>,

    /// Centre point as LAT,LNG.
    #[arg(long)]
    pub center: Option<String>,

    /// Radius in kilometres around the centre point.
    #[arg(long)]
    pub radius: Option<u32>,

    /// Two-letter country code.
    #[arg(long)]
    pub country: Option<String>,

    /// List every probe; no filter required.
    #[arg(long)]
    pub all: bool,
}

/// Arguments for the measure command.
#[derive(Args, Clone, Debug)]
pub struct MeasureArgs {
    /// API key allowed to create measurements.
    #[arg(long, global = true, env = "ATLAS_CREATE_KEY", hide_env_values = true)]
    pub key: Option<String>,

    #[command(subcommand)]
    pub kind: MeasureKind,
}

/// Options shared by every measurement type.
#[derive(Args, Clone, Debug)]
pub struct CommonArgs {
    /// Host name or address to measure.
    #[arg(long)]
    pub target: Option<String>,

    /// Address family.
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u8).range(4..=6))]
    pub af: u8,

    /// Measurement description.
    #[arg(long)]
    pub description: Option<String>,

    /// Resolve the target on each probe.
    #[arg(long)]
    pub resolve_on_probe: bool,

    /// Seconds between runs; omit for a one-off measurement.
    #[arg(long)]
    pub interval: Option<u32>,

    /// Number of probes to request.
    #[arg(long, default_value_t = DEFAULT_PROBES_REQUESTED)]
    pub probes: u32,

    /// Run from probes in an area (WW, West, North-Central, ...).
    #[arg(long, group = "origin")]
    pub from_area: Option<String>,

    /// Run from probes in a country.
    #[arg(long, group = "origin")]
    pub from_country: Option<String>,

    /// Run from probes in an AS.
    #[arg(long, group = "origin")]
    pub from_asn: Option<u32>,

    /// Run from probes in a prefix.
    #[arg(long, group = "origin")]
    pub from_prefix: Option<String>,

    /// Run from a comma-separated list of probe ids.
    #[arg(long, group = "origin")]
    pub from_probes: Option<String>,

    /// Run from the probes used by an earlier measurement.
    #[arg(long, group = "origin")]
    pub from_measurement: Option<u64>,

    /// Print the request instead of sending it.
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Subcommand, Clone, Debug)]
pub enum MeasureKind {
    /// Create a ping measurement.
    Ping {
        #[command(flatten)]
        common: CommonArgs,
        /// Packets per run.
        #[arg(long)]
        packets: Option<u32>,
        /// Payload size in bytes.
        #[arg(long)]
        size: Option<u32>,
        /// Milliseconds between packets.
        #[arg(long)]
        packet_interval: Option<u32>,
    },
    /// Create a traceroute measurement.
    Traceroute {
        #[command(flatten)]
        common: CommonArgs,
        /// ICMP, UDP or TCP.
        #[arg(long, value_parser = ["ICMP", "UDP", "TCP"])]
        protocol: Option<String>,
        /// Packets per hop.
        #[arg(long)]
        packets: Option<u32>,
        /// Payload size in bytes.
        #[arg(long)]
        size: Option<u32>,
        /// TTL of the first hop.
        #[arg(long)]
        first_hop: Option<u32>,
        /// Highest TTL tried.
        #[arg(long)]
        max_hops: Option<u32>,
        /// Paris variations, 0 disables.
        #[arg(long)]
        paris: Option<u32>,
        /// Per-packet timeout in milliseconds.
        #[arg(long)]
        timeout: Option<u32>,
        /// Set the don't-fragment bit.
        #[arg(long)]
        dont_fragment: bool,
        /// Destination port (TCP only).
        #[arg(long)]
        port: Option<u16>,
    },
    /// Create a DNS measurement.
    Dns {
        #[command(flatten)]
        common: CommonArgs,
        /// UDP or TCP.
        #[arg(long, value_parser = ["UDP", "TCP"])]
        protocol: Option<String>,
        /// IN or CHAOS.
        #[arg(long, value_parser = ["IN", "CHAOS"])]
        query_class: Option<String>,
        /// Record type.
        #[arg(long)]
        query_type: Option<String>,
        /// Label to query.
        #[arg(long)]
        query_argument: Option<String>,
        /// Set the DNSSEC Checking Disabled flag.
        #[arg(long)]
        set_cd_bit: bool,
        /// Set the DNSSEC OK flag.
        #[arg(long)]
        set_do_bit: bool,
        /// Request the name server id.
        #[arg(long)]
        set_nsid_bit: bool,
        /// Set the Recursion Desired flag; `--set-rd-bit false` clears it.
        #[arg(long, num_args = 0..=1, default_missing_value = "true")]
        set_rd_bit: Option<bool>,
        /// Retries on timeout.
        #[arg(long)]
        retry: Option<u32>,
        /// Advertised EDNS UDP payload size.
        #[arg(long, value_parser = clap::value_parser!(u32).range(512..=4096))]
        udp_payload_size: Option<u32>,
    },
    /// Create an SSL certificate measurement.
    Sslcert {
        #[command(flatten)]
        common: CommonArgs,
        /// TLS port.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Create an HTTP measurement.
    Http {
        #[command(flatten)]
        common: CommonArgs,
        /// GET, HEAD or POST.
        #[arg(long, value_parser = ["GET", "HEAD", "POST"])]
        method: Option<String>,
        /// Request path.
        #[arg(long)]
        path: Option<String>,
        /// Query string without the leading '?'.
        #[arg(long)]
        query_string: Option<String>,
        /// User-Agent header.
        #[arg(long)]
        user_agent: Option<String>,
        /// Response header bytes to keep.
        #[arg(long)]
        header_bytes: Option<u32>,
        /// HTTP version.
        #[arg(long)]
        version: Option<String>,
        /// Timing detail, 0 to 2.
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=2))]
        timing_verbosity: Option<u8>,
        /// Destination port.
        #[arg(long)]
        port: Option<u16>,
    },
    /// Create an NTP measurement.
    Ntp {
        #[command(flatten)]
        common: CommonArgs,
        /// Packets per run.
        #[arg(long)]
        packets: Option<u32>,
        /// Per-packet timeout in milliseconds.
        #[arg(long)]
        timeout: Option<u32>,
    },
}

/// Arguments for the cache command.
#[derive(Args, Clone, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub command: CacheCommand,
}

#[derive(Subcommand, Clone, Debug)]
pub enum CacheCommand {
    /// Remove one key, or every key.
    Clear {
        /// Key to remove, as shown by `atlas cache keys`.
        #[arg(long)]
        key: Option<String>,
        /// Skip confirmation.
        #[arg(short, long)]
        yes: bool,
    },
    /// Remove expired entries.
    Expire,
    /// Show entry counts.
    Stats,
    /// List stored keys.
    Keys,
}
