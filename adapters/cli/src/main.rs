#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that streams a tile workload to stdout.

use std::io::{self, LineWriter, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tilegen_assembler::{StreamAssembler, StreamError};
use tilegen_core::{ConfigError, Profile, ProfileId};
use tracing::{info, warn};

mod logging;

/// Streams a synthetic command workload for the tile engine.
#[derive(Debug, Parser)]
#[command(name = "tilegen", version, about)]
struct Cli {
    /// Canonical profile to run, by name (`links`) or schema version (`v5`).
    #[arg(long, default_value = "links", value_parser = parse_profile)]
    profile: ProfileId,
    /// Seed for the random source; drawn from the OS when omitted.
    #[arg(long)]
    seed: Option<u64>,
    /// Print every canonical profile as TOML and exit.
    #[arg(long)]
    list_profiles: bool,
    /// Log at debug level unless `RUST_LOG` is set.
    #[arg(short, long)]
    verbose: bool,
}

fn parse_profile(value: &str) -> Result<ProfileId, ConfigError> {
    value.parse()
}

/// Entry point for the tile workload generator.
fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose).context("failed to initialise logging")?;

    if cli.list_profiles {
        return list_profiles();
    }

    let seed = cli.seed.unwrap_or_else(rand::random);
    let profile = Profile::canonical(cli.profile)
        .with_context(|| format!("profile {} is misconfigured", cli.profile))?;
    info!(profile = %cli.profile, seed, "selected profile");

    let assembler = StreamAssembler::new(profile, seed)?;
    let mut out = LineWriter::new(io::stdout().lock());
    match assembler.run(&mut out) {
        Ok(stats) => {
            info!(lines = stats.lines(), "stream written");
            Ok(())
        }
        Err(StreamError::Io(error)) if error.kind() == io::ErrorKind::BrokenPipe => {
            warn!("consumer closed the stream early");
            Ok(())
        }
        Err(error) => Err(error).context("failed to stream commands"),
    }
}

fn list_profiles() -> Result<()> {
    let mut out = io::stdout().lock();
    for profile in Profile::all_canonical()? {
        let rendered = toml::to_string(&profile)
            .with_context(|| format!("failed to render profile {}", profile.id))?;
        writeln!(out, "# {}\n{rendered}", profile.id)?;
    }
    out.flush()?;
    Ok(())
}
