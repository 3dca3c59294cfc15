//! CLI entry point (C11): a single `clap`-derived command, no subcommands
//! (§4.11, §6).

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use crate::config::PladsConfig;
use crate::window::WindowController;

#[derive(Debug, Parser)]
#[command(name = "plads", about = "Streaming graph anomaly detection coordinator")]
pub struct Cli {
    /// Path to the `plads.cfg` configuration file.
    #[arg(long, default_value = "plads.cfg")]
    pub config: PathBuf,

    /// Logging verbosity: error, warn, info, debug, trace.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Run exactly one window-controller pass (bootstrap, or one S1->S7
    /// cycle if state already exists) and exit, instead of looping forever.
    #[arg(long)]
    pub once: bool,

    /// Override the worker-pool concurrency bound.
    #[arg(long, value_parser = parse_workers)]
    pub workers: Option<usize>,
}

fn parse_workers(raw: &str) -> Result<usize, String> {
    let n: usize = raw
        .parse()
        .map_err(|_| format!("'{raw}' is not a valid worker count"))?;
    if (1..=64).contains(&n) {
        Ok(n)
    } else {
        Err(format!("worker count must be between 1 and 64, got {n}"))
    }
}

/// Entry point invoked from `main`. Exit code 0 only for a `--once` pass
/// completing cleanly; the default infinite loop never returns normally
/// (§4.11, §6).
pub fn run(cli: Cli) -> Result<()> {
    let config = PladsConfig::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;

    let mut controller = WindowController::new(config, cli.workers)
        .context("initializing the window controller")?;

    if cli.once {
        match controller.run_pass() {
            Ok(_) => return Ok(()),
            Err(e) => {
                error!(error = %e, "fatal error during --once pass");
                return Err(e.into());
            }
        }
    }

    let retry_delay = controller.retry_interval();
    loop {
        match controller.run_pass() {
            Ok(true) => {}
            Ok(false) => {
                info!("intake empty, waiting before retry");
                std::thread::sleep(retry_delay);
            }
            Err(e) => {
                error!(error = %e, "fatal error, terminating");
                return Err(e.into());
            }
        }
    }
}
