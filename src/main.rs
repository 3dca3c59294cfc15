//! PLADS coordinator entry point.
//!
//! Parses the CLI, initializes structured logging, and hands off to
//! [`plads::cli::run`]. See SPEC_FULL.md §4.11-4.12.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use plads::cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    plads::cli::run(cli)
}
