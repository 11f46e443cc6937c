//! Plain-text rendering of probe listings.

use std::io::{self, Write};

use atlas_aggregate::{Aggregation, PathSegment};
use atlas_core::types::Probe;

use crate::api::RequestArgs;

const ROW_WIDTH: usize = 40;

/// Writes the "Filters:" block naming every active filter.
pub fn write_filters<W: Write>(out: &mut W, filters: &RequestArgs) -> io::Result<()> {
    writeln!(out)?;
    if filters.is_empty() {
        return Ok(());
    }
    writeln!(out, "Filters:")?;
    for (name, value) in filters {
        writeln!(out, "  {}: {}", filter_label(name), value)?;
    }
    writeln!(out)
}

fn filter_label(name: &str) -> &str {
    match name {
        "country_code" => "Country",
        "asn" => "ASN",
        "asn_v4" => "ASN (IPv4)",
        "asn_v6" => "ASN (IPv6)",
        "prefix" => "Prefix",
        "prefix_v4" => "Prefix (IPv4)",
        "prefix_v6" => "Prefix (IPv6)",
        "latitude" => "Latitude",
        "longitude" => "Longitude",
        "radius" => "Radius",
        other => other,
    }
}

/// Fixed-width probe table.
///
/// Grouped listings indent every row by one space per grouping level and
/// print each group header once, indented by its own level.
#[derive(Clone, Copy, Debug)]
pub struct ProbeTable {
    indent: usize,
}

impl ProbeTable {
    /// Creates a table for `depth` grouping levels.
    pub fn new(depth: usize) -> Self {
        Self { indent: depth }
    }

    /// Returns the full line width.
    pub fn width(&self) -> usize {
        ROW_WIDTH + self.indent
    }

    /// Writes header, rows and footer for `aggregation`.
    pub fn write<W: Write>(&self, out: &mut W, aggregation: &Aggregation<Probe>) -> io::Result<()> {
        let rule = "=".repeat(self.width());
        let pad = " ".repeat(self.indent);

        writeln!(out, "{}{:<5} {:<6} {:<6} {:<7} {:<12}", pad, "ID", "Asn_v4", "Asn_v6", "Country", "Status")?;
        writeln!(out, "{}", rule)?;

        let mut previous: Vec<PathSegment<'_>> = Vec::new();
        for leaf in aggregation.leaves() {
            let shared = previous
                .iter()
                .zip(&leaf.path)
                .take_while(|(a, b)| a == b)
                .count();

            for (level, segment) in leaf.path.iter().enumerate().skip(shared) {
                if level == 0 && !previous.is_empty() {
                    writeln!(out)?;
                }
                writeln!(out, "{}{}", " ".repeat(level), segment)?;
            }

            for probe in leaf.records {
                writeln!(out, "{}{}", pad, row(probe))?;
            }
            previous = leaf.path;
        }

        // The declared total can trail what a listing actually returns.
        let report = aggregation.report();
        let shown = (report.shown as u64).min(report.total);
        writeln!(out, "{}", rule)?;
        writeln!(
            out,
            "{:>width$}",
            format!("Showing {} of {} total probes", shown, report.total),
            width = self.width()
        )?;
        writeln!(out)
    }
}

fn row(probe: &Probe) -> String {
    let asn = |asn: Option<u32>| asn.map(|a| a.to_string()).unwrap_or_default();
    format!(
        "{:<5} {:<6} {:<6} {:^7} {:<12}",
        probe.id,
        asn(probe.asn_v4),
        asn(probe.asn_v6),
        probe
            .country_code
            .as_deref()
            .map(str::to_lowercase)
            .unwrap_or_default(),
        probe.status_name().unwrap_or("None"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use atlas_aggregate::{Aggregator, IterSource};

    #[test]
    fn test_row_layout() {
        let probe = Probe::new(1).with_country("GR").with_asn_v4(3333);
        assert_eq!(row(&probe), "1     3333            gr    None        ");
        assert_eq!(row(&probe).len(), ROW_WIDTH);
    }

    #[test]
    fn test_row_with_status() {
        let probe = Probe::new(12345).with_asn_v6(3333).with_status("Connected");
        assert_eq!(row(&probe), "12345        3333           Connected   ");
    }

    #[test]
    fn test_filters_block() {
        let mut filters = RequestArgs::new();
        filters.insert("country_code", "GR".into());
        filters.insert("asn_v4", "3333".into());
        let mut out = Vec::new();
        write_filters(&mut out, &filters).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "\nFilters:\n  ASN (IPv4): 3333\n  Country: GR\n\n"
        );
    }

    #[test]
    fn test_no_filters() {
        let mut out = Vec::new();
        write_filters(&mut out, &RequestArgs::new()).unwrap();
        assert_eq!(out, b"\n");
    }

    #[test]
    fn test_empty_listing() {
        let aggregation = Aggregator::<Probe>::flat()
            .aggregate(IterSource::infallible(Vec::new()))
            .unwrap();
        let mut out = Vec::new();
        ProbeTable::new(0).write(&mut out, &aggregation).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with("Showing 0 of 0 total probes\n\n"));
    }
}
