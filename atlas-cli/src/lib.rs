//! # Atlas CLI
//!
//! Library half of the `atlas` binary: argument definitions, the API and
//! geocoding clients, per-run context, and text rendering.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod api;
pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod geocode;
pub mod render;

pub use cli::{Cli, Command};
pub use config::Settings;
pub use context::AppContext;
