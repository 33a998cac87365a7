//! Diagnostic logging for the command-line adapter.
//!
//! Stdout carries the command stream, so every log line goes to stderr.

use std::io;

use anyhow::Result;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Installs the global subscriber.
///
/// `RUST_LOG` takes precedence; otherwise the level is `warn`, or `debug`
/// when `verbose` is set.
pub(crate) fn init(verbose: bool) -> Result<()> {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(fallback))?;

    Registry::default()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(io::stderr))
        .try_init()?;
    Ok(())
}
