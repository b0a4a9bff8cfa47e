//! Tracing subscriber setup
//!
//! Hosts embedding the grammar loader log to a file; this module builds the
//! subscriber they install.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global tracing subscriber, logging to `log_file_path`.
///
/// Filtering follows RUST_LOG with a DEBUG default.
pub fn init_global(log_file_path: &Path) -> Result<()> {
    let log_file = File::create(log_file_path)
        .with_context(|| format!("Failed to create log file {}", log_file_path.display()))?;
    build_subscriber(log_file)
        .try_init()
        .context("Failed to install tracing subscriber")?;
    Ok(())
}

/// Build a subscriber writing formatted events to `log_file`.
///
/// Directives come from RUST_LOG; DEBUG applies when it is unset or empty.
pub fn build_subscriber(log_file: File) -> impl tracing::Subscriber + Send + Sync {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::DEBUG.into())
        .from_env_lossy();
    layered(log_file, env_filter)
}

/// Like [`build_subscriber`], but filtered by `directives` instead of RUST_LOG.
pub fn build_subscriber_with_directives(
    log_file: File,
    directives: &str,
) -> impl tracing::Subscriber + Send + Sync {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::DEBUG.into())
        .parse_lossy(directives);
    layered(log_file, env_filter)
}

fn layered(log_file: File, env_filter: EnvFilter) -> impl tracing::Subscriber + Send + Sync {
    let fmt_layer = fmt::layer()
        .with_ansi(false)
        .with_writer(Arc::new(log_file));

    tracing_subscriber::registry().with(fmt_layer).with(env_filter)
}
