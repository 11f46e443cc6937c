//! Measurement creation.

use colored::*;
use tracing::info;

use atlas_cache::Store;
use atlas_core::error::Result;
use atlas_core::types::{
    create_request_body, CommonOptions, DnsOptions, HttpOptions, MeasurementSpec, NtpOptions,
    PingOptions, ProbeSelection, SslcertOptions, TracerouteOptions,
};

use super::{CommonArgs, MeasureArgs, MeasureKind};
use crate::context::AppContext;

/// Run the measure command.
pub fn run<S: Store>(args: &MeasureArgs, ctx: &mut AppContext<S>) -> Result<()> {
    let (spec, common) = build_spec(&args.kind);
    let probes = probe_selection(common);
    let body = create_request_body(&spec, &probes)?;

    if common.dry_run || !ctx.client().can_create() {
        if !common.dry_run {
            eprintln!(
                "{}",
                "No API key configured (--key or ATLAS_CREATE_KEY); printing the request instead.".yellow()
            );
        }
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    let ids = ctx.client().create_measurement(&spec, &probes)?;
    info!(?ids, kind = %spec.kind(), "Created measurement");

    println!("{}", "Looking good! Your measurement was created.".green().bold());
    for id in ids {
        println!(
            "   {} {}/measurements/{}/",
            "Details:".dimmed(),
            ctx.settings().api_url.trim_end_matches('/'),
            id
        );
    }
    Ok(())
}

/// Maps command-line flags onto a measurement request.
///
/// Flags left unset take the platform's defaults for that type.
pub fn build_spec(kind: &MeasureKind) -> (MeasurementSpec, &CommonArgs) {
    match kind {
        MeasureKind::Ping {
            common,
            packets,
            size,
            packet_interval,
        } => {
            let defaults = PingOptions::default();
            let options = PingOptions {
                packets: packets.unwrap_or(defaults.packets),
                size: size.unwrap_or(defaults.size),
                packet_interval: packet_interval.or(defaults.packet_interval),
            };
            (
                MeasurementSpec::Ping {
                    common: common_options(common),
                    options,
                },
                common,
            )
        }
        MeasureKind::Traceroute {
            common,
            protocol,
            packets,
            size,
            first_hop,
            max_hops,
            paris,
            timeout,
            dont_fragment,
            port,
        } => {
            let defaults = TracerouteOptions::default();
            let options = TracerouteOptions {
                protocol: protocol.clone().unwrap_or(defaults.protocol),
                packets: packets.unwrap_or(defaults.packets),
                size: size.unwrap_or(defaults.size),
                first_hop: first_hop.unwrap_or(defaults.first_hop),
                max_hops: max_hops.unwrap_or(defaults.max_hops),
                paris: paris.unwrap_or(defaults.paris),
                timeout: timeout.unwrap_or(defaults.timeout),
                dont_fragment: *dont_fragment || defaults.dont_fragment,
                port: port.or(defaults.port),
            };
            (
                MeasurementSpec::Traceroute {
                    common: common_options(common),
                    options,
                },
                common,
            )
        }
        MeasureKind::Dns {
            common,
            protocol,
            query_class,
            query_type,
            query_argument,
            set_cd_bit,
            set_do_bit,
            set_nsid_bit,
            set_rd_bit,
            retry,
            udp_payload_size,
        } => {
            let defaults = DnsOptions::default();
            let options = DnsOptions {
                protocol: protocol.clone().unwrap_or(defaults.protocol),
                query_class: query_class.clone().unwrap_or(defaults.query_class),
                query_type: query_type.clone().unwrap_or(defaults.query_type),
                query_argument: query_argument.clone().or(defaults.query_argument),
                set_cd_bit: *set_cd_bit || defaults.set_cd_bit,
                set_do_bit: *set_do_bit || defaults.set_do_bit,
                set_nsid_bit: *set_nsid_bit || defaults.set_nsid_bit,
                set_rd_bit: set_rd_bit.unwrap_or(defaults.set_rd_bit),
                retry: retry.unwrap_or(defaults.retry),
                udp_payload_size: udp_payload_size.unwrap_or(defaults.udp_payload_size),
            };
            (
                MeasurementSpec::Dns {
                    common: common_options(common),
                    options,
                },
                common,
            )
        }
        MeasureKind::Sslcert { common, port } => {
            let defaults = SslcertOptions::default();
            (
                MeasurementSpec::Sslcert {
                    common: common_options(common),
                    options: SslcertOptions {
                        port: port.unwrap_or(defaults.port),
                    },
                },
                common,
            )
        }
        MeasureKind::Http {
            common,
            method,
            path,
            query_string,
            user_agent,
            header_bytes,
            version,
            timing_verbosity,
            port,
        } => {
            let defaults = HttpOptions::default();
            let options = HttpOptions {
                method: method.clone().unwrap_or(defaults.method),
                path: path.clone().unwrap_or(defaults.path),
                query_string: query_string.clone().or(defaults.query_string),
                user_agent: user_agent.clone().or(defaults.user_agent),
                header_bytes: header_bytes.unwrap_or(defaults.header_bytes),
                version: version.clone().unwrap_or(defaults.version),
                timing_verbosity: timing_verbosity.unwrap_or(defaults.timing_verbosity),
                port: port.unwrap_or(defaults.port),
            };
            (
                MeasurementSpec::Http {
                    common: common_options(common),
                    options,
                },
                common,
            )
        }
        MeasureKind::Ntp {
            common,
            packets,
            timeout,
        } => {
            let defaults = NtpOptions::default();
            (
                MeasurementSpec::Ntp {
                    common: common_options(common),
                    options: NtpOptions {
                        packets: packets.unwrap_or(defaults.packets),
                        timeout: timeout.unwrap_or(defaults.timeout),
                    },
                },
                common,
            )
        }
    }
}

fn common_options(args: &CommonArgs) -> CommonOptions {
    CommonOptions {
        target: args.target.clone(),
        af: args.af,
        description: args.description.clone(),
        resolve_on_probe: args.resolve_on_probe,
        interval: args.interval,
    }
}

/// Picks the probe selection from the `--from-*` flags, worldwide by default.
pub fn probe_selection(args: &CommonArgs) -> ProbeSelection {
    let (kind, value) = if let Some(area) = &args.from_area {
        ("area", area.clone())
    } else if let Some(country) = &args.from_country {
        ("country", country.to_uppercase())
    } else if let Some(asn) = args.from_asn {
        ("asn", asn.to_string())
    } else if let Some(prefix) = &args.from_prefix {
        ("prefix", prefix.clone())
    } else if let Some(ids) = &args.from_probes {
        ("probes", ids.replace(' ', ""))
    } else if let Some(msm) = args.from_measurement {
        ("msm", msm.to_string())
    } else {
        return ProbeSelection {
            requested: args.probes,
            ..ProbeSelection::default()
        };
    };

    ProbeSelection {
        requested: args.probes,
        kind: kind.into(),
        value,
    }
}
