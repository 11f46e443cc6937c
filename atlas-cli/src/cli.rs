//! Command-line definition.

use clap::{Parser, Subcommand};

use crate::commands::{CacheArgs, MeasureArgs, ProbesArgs};

/// Atlas - query probes and create measurements on a network measurement platform
#[derive(Parser, Debug)]
#[command(name = "atlas")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Neither read nor write the local cache
    #[arg(long, global = true)]
    pub no_cache: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List probes, optionally grouped
    Probes(ProbesArgs),

    /// Create a measurement
    Measure(MeasureArgs),

    /// Inspect or clean the local cache
    Cache(CacheArgs),
}
