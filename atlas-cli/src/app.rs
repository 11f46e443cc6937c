//! Top-level dispatch: which settings apply and which cache each command gets.

use anyhow::{Context, Result};

use atlas_cache::{ExpiringCache, FileStore, Store};

use crate::cli::{Cli, Command};
use crate::commands::{self, CacheArgs};
use crate::config::Settings;
use crate::context::AppContext;

/// Default log filter.
pub fn log_filter(verbose: bool) -> &'static str {
    if verbose {
        "atlas=debug,atlas_cli=debug,atlas_cache=debug,atlas_aggregate=debug,info"
    } else {
        "warn"
    }
}

/// Where a command's cache lives for this run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheBacking {
    /// The cache file named by the settings.
    File,
    /// A throwaway in-memory cache.
    Memory,
}

/// Applies command-line overrides on top of the environment settings.
pub fn apply_overrides(cli: &Cli, mut settings: Settings) -> Settings {
    if cli.no_cache {
        settings.use_cache = false;
    }
    if let Command::Measure(args) = &cli.command {
        if let Some(key) = args.key.as_ref().filter(|k| !k.trim().is_empty()) {
            settings.create_key = Some(key.clone());
        }
    }
    settings
}

/// Cache housekeeping always works on the file, even under `--no-cache`.
pub fn cache_backing(command: &Command, settings: &Settings) -> CacheBacking {
    match command {
        Command::Cache(_) => CacheBacking::File,
        _ if settings.use_cache => CacheBacking::File,
        _ => CacheBacking::Memory,
    }
}

/// Runs one parsed command line against `settings`.
pub fn run(cli: Cli, settings: Settings) -> Result<()> {
    let settings = apply_overrides(&cli, settings);

    match (cache_backing(&cli.command, &settings), cli.command) {
        (_, Command::Cache(args)) => cmd_cache(&args, &settings),
        (CacheBacking::File, command) => {
            let mut ctx = AppContext::open(settings).context("Failed to open the local cache")?;
            dispatch(command, &mut ctx)
        }
        (CacheBacking::Memory, command) => {
            let mut ctx = AppContext::ephemeral(settings)?;
            dispatch(command, &mut ctx)
        }
    }
}

fn dispatch<S: Store>(command: Command, ctx: &mut AppContext<S>) -> Result<()> {
    match command {
        Command::Probes(args) => commands::probes::run(&args, ctx)?,
        Command::Measure(args) => commands::measure::run(&args, ctx)?,
        Command::Cache(args) => commands::cache::run(&args, ctx.cache())?,
    }
    Ok(())
}

fn cmd_cache(args: &CacheArgs, settings: &Settings) -> Result<()> {
    let store = FileStore::open(&settings.cache_path).with_context(|| {
        format!("Failed to open cache at {}", settings.cache_path.display())
    })?;
    let mut cache = ExpiringCache::new(store);
    commands::cache::run(args, &mut cache)?;
    Ok(())
}
