//! Probe listing.

use std::io::Write;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, instrument};

use atlas_aggregate::{Aggregator, KeyExtractor, RecordSource, ValueKeyExtractor};
use atlas_cache::Store;
use atlas_core::error::{AtlasError, Result};
use atlas_core::types::Probe;

use super::ProbesArgs;
use crate::api::RequestArgs;
use crate::context::AppContext;
use crate::geocode::Coordinates;
use crate::render::{write_filters, ProbeTable};

/// Run the probes command.
pub fn run<S: Store>(args: &ProbesArgs, ctx: &mut AppContext<S>) -> Result<()> {
    let filters = build_request_args(args, |location| ctx.location_to_degrees(location))?;
    debug!(?filters, "Probe filters");

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Fetching probes...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let source = ctx.client().probes(&filters)?;
    let mut buffer = Vec::new();
    let result = render(args, &filters, source, &mut buffer);
    spinner.finish_and_clear();
    result?;

    std::io::stdout().write_all(&buffer)?;
    Ok(())
}

/// Turns the filter flags into probe-listing query arguments.
///
/// `locate` geocodes `--location`; it is only called when that flag is set.
pub fn build_request_args<F>(args: &ProbesArgs, mut locate: F) -> Result<RequestArgs>
where
    F: FnMut(&str) -> Result<Coordinates>,
{
    if args.asn.is_some() && (args.asnv4.is_some() || args.asnv6.is_some()) {
        return Err(AtlasError::Validation(
            "Specifying an ASN together with IPv4 or IPv6 ASNs is not allowed.".into(),
        ));
    }
    if args.prefix.is_some() && (args.prefixv4.is_some() || args.prefixv6.is_some()) {
        return Err(AtlasError::Validation(
            "Specifying a prefix together with IPv4 or IPv6 prefixes is not allowed.".into(),
        ));
    }

    let mut request = RequestArgs::new();

    if let Some(asn) = args.asn {
        request.insert("asn", asn.to_string());
    }
    if let Some(asn) = args.asnv4 {
        request.insert("asn_v4", asn.to_string());
    }
    if let Some(asn) = args.asnv6 {
        request.insert("asn_v6", asn.to_string());
    }
    if let Some(prefix) = &args.prefix {
        request.insert("prefix", prefix.clone());
    }
    if let Some(prefix) = &args.prefixv4 {
        request.insert("prefix_v4", prefix.clone());
    }
    if let Some(prefix) = &args.prefixv6 {
        request.insert("prefix_v6", prefix.clone());
    }

    if let Some(country) = &args.country {
        request.insert("country_code", country.clone());
    } else if let Some((lat, lng)) = centre(args, &mut locate)? {
        match args.radius {
            Some(radius) => {
                request.insert("radius", format!("{},{}:{}", lat, lng, radius));
            }
            None => {
                request.insert("latitude", lat);
                request.insert("longitude", lng);
            }
        }
    }

    if request.is_empty() && !args.all {
        return Err(AtlasError::Validation(
            "For this kind of query, at least one filter is required. Use --all to list every probe."
                .into(),
        ));
    }

    Ok(request)
}

/// Returns the centre point as text, from `--location` or `--center`.
fn centre<F>(args: &ProbesArgs, locate: &mut F) -> Result<Option<(String, String)>>
where
    F: FnMut(&str) -> Result<Coordinates>,
{
    if let Some(location) = &args.location {
        let Coordinates { lat, lng } = locate(location)?;
        return Ok(Some((lat.to_string(), lng.to_string())));
    }

    let Some(center) = &args.center else {
        return Ok(None);
    };
    let invalid = || {
        AtlasError::Validation(format!(
            "Invalid center \"{}\"; expected LAT,LNG, e.g. 48.45,9.16",
            center
        ))
    };
    let (lat, lng) = center.split_once(',').ok_or_else(invalid)?;
    let (lat, lng) = (lat.trim(), lng.trim());
    if lat.parse::<f64>().is_err() || lng.parse::<f64>().is_err() {
        return Err(invalid());
    }
    Ok(Some((lat.to_string(), lng.to_string())))
}

/// Builds the aggregator for `--aggregate-by` and the caps.
pub fn aggregator(args: &ProbesArgs) -> Result<Aggregator<Probe>> {
    let extractors = args
        .aggregate_by
        .iter()
        .map(|by| ValueKeyExtractor::from_name(by.as_str()).map(ValueKeyExtractor::boxed))
        .collect::<Result<Vec<Box<dyn KeyExtractor<Probe>>>>>()?;

    Ok(Aggregator::new(extractors)
        .max_per_branch(args.max_per_aggregation)
        .max_total(Some(args.limit)))
}

/// Writes the listing for records pulled from `source`.
#[instrument(skip_all, fields(ids_only = args.ids_only))]
pub fn render<Src, W>(args: &ProbesArgs, filters: &RequestArgs, source: Src, out: &mut W) -> Result<()>
where
    Src: RecordSource<Probe>,
    W: Write,
{
    if args.ids_only {
        for probe in source.take(args.limit) {
            writeln!(out, "{}", probe?.id)?;
        }
        return Ok(());
    }

    let aggregation = aggregator(args)?.aggregate(source)?;

    write_filters(out, filters)?;
    ProbeTable::new(aggregation.labels().len()).write(out, &aggregation)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command};
    use clap::Parser;

    fn parse(argv: &[&str]) -> ProbesArgs {
        let argv = ["atlas", "probes"].iter().chain(argv);
        match Cli::parse_from(argv).command {
            Command::Probes(args) => args,
            _ => unreachable!(),
        }
    }

    fn no_geocoding(_: &str) -> Result<Coordinates> {
        panic!("geocoder called")
    }

    fn build(argv: &[&str]) -> Result<RequestArgs> {
        build_request_args(&parse(argv), no_geocoding)
    }

    fn pairs(request: &RequestArgs) -> Vec<(&str, &str)> {
        request.iter().map(|(k, v)| (*k, v.as_str())).collect()
    }

    #[test]
    fn test_aggregator_depth() {
        let args = parse(&["--aggregate-by", "asn_v4", "--aggregate-by", "country"]);
        assert_eq!(aggregator(&args).unwrap().depth(), 2);
    }

    #[test]
    fn test_location_failure_propagates() {
        let args = parse(&["--location", "blaaaa"]);
        let err = build_request_args(&args, |_| Err(AtlasError::Geocoding("down".into())))
            .unwrap_err();
        assert!(matches!(err, AtlasError::Geocoding(_)));
    }

    #[test]
    fn test_location_not_geocoded_with_country() {
        let request = build(&["--country", "GR", "--location", "Athens"]).unwrap();
        assert_eq!(pairs(&request), vec![("country_code", "GR")]);
    }

    #[test]
    fn test_center_whitespace_trimmed() {
        let request = build(&["--center", " 1 , 2 "]).unwrap();
        assert_eq!(pairs(&request), vec![("latitude", "1"), ("longitude", "2")]);
    }
}
