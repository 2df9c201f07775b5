use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::Config;

/// Send `tracing` output to the log file. Nothing goes to the terminal,
/// which the TUI owns.
pub(crate) fn init(config: &Config) -> Result<()> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .with_context(|| format!("Could not open log file: {}", config.log_file.display()))?;

    let filter = EnvFilter::try_new(&config.log_filter)
        .with_context(|| format!("Invalid log filter '{}'", config.log_filter))?;

    let file_log = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(Arc::new(log_file))
        .with_filter(filter);

    tracing_subscriber::registry()
        .with(file_log)
        .try_init()
        .context("Logger already initialised")?;
    Ok(())
}
