#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Stream assembly for the tile workload generator.
//!
//! The [`StreamAssembler`] owns the run's only random source and walks the
//! phases of a [`Profile`], asking the emitters for commands and writing each
//! one as a line the moment it is produced. Ordering constraints between
//! phases live here: the [`RuleLedger`] decides when a rule burst must be
//! closed by a sort request, and a propagation burst that reordered rules is
//! followed by a full-grid scan when the profile asks for it.

use std::io::{self, Write};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tilegen_core::{Command, ConfigError, Phase, PhaseKind, Profile};
use tilegen_system_emitters::CommandEmitters;
use tracing::{debug, info};

mod ledger;
mod stats;

pub use ledger::{RuleLedger, RuleSetState};
pub use stats::StreamStats;

/// Failures that abort a run.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The profile was rejected before any line was written.
    #[error("invalid profile: {0}")]
    Config(#[from] ConfigError),
    /// The output stream refused a line.
    #[error("failed to write command stream: {0}")]
    Io(#[from] io::Error),
}

/// Run-wide emission indices used for parity-based alternation.
#[derive(Clone, Copy, Debug, Default)]
struct EmissionCounters {
    propagation: u64,
    links: u64,
}

impl EmissionCounters {
    fn next_propagation(&mut self) -> u64 {
        let index = self.propagation;
        self.propagation += 1;
        index
    }

    fn next_link(&mut self) -> u64 {
        let index = self.links;
        self.links += 1;
        index
    }
}

/// Drives the emitters through a profile and writes the resulting stream.
#[derive(Debug)]
pub struct StreamAssembler {
    profile: Profile,
    seed: u64,
    emitters: CommandEmitters,
    rng: ChaCha8Rng,
    ledger: RuleLedger,
    counters: EmissionCounters,
    stats: StreamStats,
    scratch: Vec<Command>,
}

impl StreamAssembler {
    /// Validates the profile and seeds the random source.
    ///
    /// Every configuration error surfaces here, before a single line exists.
    pub fn new(profile: Profile, seed: u64) -> Result<Self, StreamError> {
        let emitters = CommandEmitters::from_profile(&profile)?;
        Ok(Self {
            profile,
            seed,
            emitters,
            rng: ChaCha8Rng::seed_from_u64(seed),
            ledger: RuleLedger::default(),
            counters: EmissionCounters::default(),
            stats: StreamStats::default(),
            scratch: Vec::with_capacity(3),
        })
    }

    /// Profile driving the run.
    #[must_use]
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Seed of the run's random source.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Writes the whole stream to `out` and reports what was written.
    pub fn run<W: Write + ?Sized>(mut self, out: &mut W) -> Result<StreamStats, StreamError> {
        info!(
            profile = %self.profile.id,
            seed = self.seed,
            phases = self.profile.phases.len(),
            "starting command stream"
        );

        let phases = self.profile.phases.clone();
        for phase in &phases {
            self.run_phase(*phase, out)?;
        }

        if self.profile.terminate {
            self.write(out, &Command::Quit)?;
        }
        out.flush()?;

        self.stats.set_rules_committed(self.ledger.committed());
        info!(
            lines = self.stats.lines(),
            reorders = self.stats.reorders(),
            scans = self.stats.scans(),
            "command stream complete"
        );
        Ok(self.stats)
    }

    fn run_phase<W: Write + ?Sized>(&mut self, phase: Phase, out: &mut W) -> io::Result<()> {
        let count = phase.count.get();
        debug!(phase = %phase.kind, count, "emitting phase");

        match phase.kind {
            PhaseKind::Tiles => {
                for _ in 0..count {
                    let command = self.emitters.tile_create(&mut self.rng);
                    self.write(out, &command)?;
                }
            }
            PhaseKind::Deactivations => {
                for _ in 0..count {
                    let command = self.emitters.tile_deactivate(&mut self.rng);
                    self.write(out, &command)?;
                }
            }
            PhaseKind::Rules => self.rule_burst(count, out)?,
            PhaseKind::Blocks => {
                for _ in 0..count {
                    self.scratch.clear();
                    self.emitters.block_place(&mut self.rng, &mut self.scratch);
                    self.flush_scratch(out)?;
                }
            }
            PhaseKind::Propagation => self.propagation_burst(count, out)?,
            PhaseKind::Tracks => {
                for _ in 0..count {
                    let command = self.emitters.track_define(&mut self.rng);
                    self.write(out, &command)?;
                }
            }
            PhaseKind::Links => {
                for _ in 0..count {
                    let index = self.counters.next_link();
                    let command = self.emitters.link_define(&mut self.rng, index);
                    self.write(out, &command)?;
                }
            }
            PhaseKind::QueryAll => {
                for _ in 0..count {
                    self.scan(out)?;
                }
            }
        }
        Ok(())
    }

    fn rule_burst<W: Write + ?Sized>(&mut self, count: u64, out: &mut W) -> io::Result<()> {
        for _ in 0..count {
            let command = self.emitters.rule_define(&mut self.rng);
            self.write(out, &command)?;
            self.ledger.record_definition();
        }
        if let Some(sort) = self.ledger.close_burst(self.profile.commit_rules) {
            self.write(out, &sort)?;
        }
        Ok(())
    }

    fn propagation_burst<W: Write + ?Sized>(
        &mut self,
        count: u64,
        out: &mut W,
    ) -> io::Result<()> {
        let mut reordered = false;
        for _ in 0..count {
            let index = self.counters.next_propagation();
            self.scratch.clear();
            if self
                .emitters
                .propagate_step(&mut self.rng, index, &mut self.scratch)
            {
                reordered = true;
                self.stats.record_reorder();
                self.ledger.commit();
            }
            self.flush_scratch(out)?;
        }

        if reordered && self.profile.scan_after_reorder {
            debug!("propagation burst reordered rules; scanning grid");
            self.scan(out)?;
        }
        Ok(())
    }

    fn scan<W: Write + ?Sized>(&mut self, out: &mut W) -> io::Result<()> {
        for command in self.emitters.query_all() {
            writeln!(out, "{command}")?;
            self.stats.record(&command);
        }
        self.stats.record_scan();
        Ok(())
    }

    fn flush_scratch<W: Write + ?Sized>(&mut self, out: &mut W) -> io::Result<()> {
        for command in &self.scratch {
            writeln!(out, "{command}")?;
            self.stats.record(command);
        }
        Ok(())
    }

    fn write<W: Write + ?Sized>(&mut self, out: &mut W, command: &Command) -> io::Result<()> {
        writeln!(out, "{command}")?;
        self.stats.record(command);
        Ok(())
    }
}

/// Runs `profile` with `seed` and collects the stream into memory.
///
/// Meant for small profiles and tests; large runs should stream through
/// [`StreamAssembler::run`] instead.
pub fn render(profile: Profile, seed: u64) -> Result<(String, StreamStats), StreamError> {
    let mut buffer = Vec::new();
    let stats = StreamAssembler::new(profile, seed)?.run(&mut buffer)?;
    let text = String::from_utf8(buffer)
        .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))?;
    Ok((text, stats))
}
