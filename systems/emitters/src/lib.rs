#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command emission system.
//!
//! Each emitter turns a draw from the shared random source into one or more
//! [`Command`] values. Emitters that always produce exactly one line return
//! it; emitters that may produce several append to a caller-owned buffer so
//! the assembler controls when lines reach the output. The full-grid scan is
//! the exception: it is returned as a lazy [`GridScan`] iterator because its
//! size grows with the square of the domain side.

use rand::Rng;
use tilegen_core::{
    Command, ConfigError, Coordinate, Direction, Domain, Intensity, Palette, Profile,
    PropagationKind,
};
use tilegen_system_rules::RuleGenerator;
use tilegen_system_sampler::SpatialSampler;

/// Odds that a propagation step is followed by a reorder pair.
const REORDER_NUMERATOR: u32 = 1;
const REORDER_DENOMINATOR: u32 = 10;

/// Per-run settings consumed by [`CommandEmitters`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmitterSettings {
    /// Sampler shared by every coordinate-bearing command.
    pub sampler: SpatialSampler,
    /// Rule generator used by rule definitions.
    pub rules: RuleGenerator,
    /// Colors available to tiles.
    pub palette: Palette,
    /// Appends an intensity to created tiles.
    pub intensity: bool,
    /// Enables the one-in-ten reorder pair after propagation steps.
    pub maybe_reorder: bool,
    /// Jitter radius for local link endpoints.
    pub link_radius: i32,
}

/// Stateless bundle of emitters configured for one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandEmitters {
    settings: EmitterSettings,
}

impl CommandEmitters {
    /// Creates emitters from explicit settings.
    #[must_use]
    pub fn new(settings: EmitterSettings) -> Self {
        Self { settings }
    }

    /// Derives emitter settings from a profile.
    pub fn from_profile(profile: &Profile) -> Result<Self, ConfigError> {
        profile.validate()?;
        Ok(Self::new(EmitterSettings {
            sampler: SpatialSampler::new(profile.domain, profile.jitter.clamp),
            rules: RuleGenerator::new(profile.rule_mode, profile.max_threshold)?,
            palette: profile.palette.clone(),
            intensity: profile.intensity,
            maybe_reorder: profile.maybe_reorder,
            link_radius: profile.jitter.radius,
        }))
    }

    /// Settings the emitters were built from.
    #[must_use]
    pub fn settings(&self) -> &EmitterSettings {
        &self.settings
    }

    /// Emits a `C` line: a random tile, a random color and, when enabled, an
    /// intensity in `[1, 1000]`.
    pub fn tile_create<R: Rng + ?Sized>(&self, rng: &mut R) -> Command {
        let at = self.settings.sampler.sample(rng);
        let colors = self.settings.palette.colors();
        let color = colors[rng.gen_range(0..colors.len())].clone();
        let intensity = self.settings.intensity.then(|| random_intensity(rng));
        Command::CreateTile {
            at,
            color,
            intensity,
        }
    }

    /// Emits an `S` line for a random tile.
    pub fn tile_deactivate<R: Rng + ?Sized>(&self, rng: &mut R) -> Command {
        Command::DeactivateTile {
            at: self.settings.sampler.sample(rng),
        }
    }

    /// Emits the `b`/`B` pair for one random tile.
    pub fn block_place<R: Rng + ?Sized>(&self, rng: &mut R, out: &mut Vec<Command>) {
        let at = self.settings.sampler.sample(rng);
        out.push(Command::PlaceBlock { at });
        out.push(Command::Homogenize { at });
    }

    /// Emits an `r` line built by the partition generator.
    pub fn rule_define<R: Rng + ?Sized>(&self, rng: &mut R) -> Command {
        Command::DefineRule {
            rule: self.settings.rules.generate(rng, &self.settings.palette),
        }
    }

    /// Emits a propagation step for the `index`-th emission of the run.
    ///
    /// Even indices yield `p`, odd indices `P`. With maybe-reorder enabled the
    /// step is followed by `o` and `s` one time in ten; the return value
    /// reports whether that happened.
    pub fn propagate_step<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        index: u64,
        out: &mut Vec<Command>,
    ) -> bool {
        out.push(Command::Propagate {
            at: self.settings.sampler.sample(rng),
            kind: PropagationKind::for_index(index),
        });

        let reorder = self.settings.maybe_reorder
            && rng.gen_ratio(REORDER_NUMERATOR, REORDER_DENOMINATOR);
        if reorder {
            out.push(Command::Reorder);
            out.push(Command::Sort);
        }
        reorder
    }

    /// Emits a `t` line: a random origin and `[1, ⌊√bound⌋]` random steps.
    pub fn track_define<R: Rng + ?Sized>(&self, rng: &mut R) -> Command {
        let origin = self.settings.sampler.sample(rng);
        let ceiling = track_length_ceiling(self.settings.sampler.domain());
        let length = rng.gen_range(1..=ceiling);
        let path = (0..length)
            .map(|_| Direction::ALL[rng.gen_range(0..Direction::ALL.len())])
            .collect();
        Command::DefineTrack { origin, path }
    }

    /// Emits an `L` line for the `index`-th link of the run.
    ///
    /// Even indices jitter the second endpoint around the first; odd indices
    /// draw it uniformly.
    pub fn link_define<R: Rng + ?Sized>(&self, rng: &mut R, index: u64) -> Command {
        let sampler = &self.settings.sampler;
        let from = sampler.sample(rng);
        let to = if index % 2 == 0 {
            sampler.sample_nearby(rng, from, self.settings.link_radius)
        } else {
            sampler.sample(rng)
        };
        Command::DefineLink { from, to }
    }

    /// Lazily enumerates a `?` line for every tile of the domain.
    #[must_use]
    pub fn query_all(&self) -> GridScan {
        GridScan::new(self.settings.sampler.domain())
    }
}

fn random_intensity<R: Rng + ?Sized>(rng: &mut R) -> Intensity {
    Intensity::saturating(rng.gen_range(Intensity::MIN..=Intensity::MAX))
}

/// Longest track the domain allows: `⌊√bound⌋`, never below one.
#[must_use]
pub fn track_length_ceiling(domain: Domain) -> usize {
    let bound = u64::from(domain.bound().unsigned_abs());
    let mut root = (bound as f64).sqrt() as u64;
    while root * root > bound {
        root -= 1;
    }
    while (root + 1) * (root + 1) <= bound {
        root += 1;
    }
    usize::try_from(root.max(1)).unwrap_or(usize::MAX)
}

/// Row-major walk over every tile of a domain, yielding `?` commands.
///
/// Rows ascend in `y`; within a row `x` ascends. Nothing is buffered, so the
/// scan costs constant memory regardless of the domain size.
#[derive(Clone, Debug)]
pub struct GridScan {
    domain: Domain,
    cursor: Coordinate,
    remaining: u64,
}

impl GridScan {
    /// Starts a scan at the domain's lowest corner.
    #[must_use]
    pub fn new(domain: Domain) -> Self {
        Self {
            domain,
            cursor: Coordinate::new(domain.lo(), domain.lo()),
            remaining: domain.cell_count(),
        }
    }

    /// Number of lines the scan has yet to produce.
    #[must_use]
    pub const fn remaining(&self) -> u64 {
        self.remaining
    }
}

impl Iterator for GridScan {
    type Item = Command;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let at = self.cursor;
        self.cursor = if at.x() >= self.domain.hi() {
            Coordinate::new(self.domain.lo(), at.y().saturating_add(1))
        } else {
            Coordinate::new(at.x() + 1, at.y())
        };
        Some(Command::QueryTile { at })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match usize::try_from(self.remaining) {
            Ok(remaining) => (remaining, Some(remaining)),
            Err(_) => (usize::MAX, None),
        }
    }
}
