//! Declarative run configurations.
//!
//! A [`Profile`] fixes every constant of a generator run: the coordinate
//! domain, the palette, the rule mode, the optional behaviours and the ordered
//! list of [`Phase`] entries the assembler walks. The canonical schema
//! versions are enumerated by [`ProfileId`]; adding a new one means declaring
//! another record in [`Profile::canonical`].

use std::{fmt, str::FromStr};

use serde::Serialize;

use crate::{ConfigError, Domain, DomainShape, Palette, MAX_RULE_THRESHOLD};

/// Identifier of a canonical profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ProfileId {
    /// Tiles and blocks over a symmetric domain.
    #[serde(rename = "tiles")]
    V1,
    /// Adds rule bursts and deactivations.
    #[serde(rename = "rules")]
    V2,
    /// Zero-based domain, named colors, intensities and propagation.
    #[serde(rename = "propagation")]
    V3,
    /// Adds tracks.
    #[serde(rename = "tracks")]
    V4,
    /// Adds links and the full-grid scan.
    #[serde(rename = "links")]
    V5,
}

impl ProfileId {
    /// Every canonical profile, oldest first.
    pub const ALL: [ProfileId; 5] = [
        ProfileId::V1,
        ProfileId::V2,
        ProfileId::V3,
        ProfileId::V4,
        ProfileId::V5,
    ];

    /// Human-readable name accepted by [`ProfileId::from_str`].
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::V1 => "tiles",
            Self::V2 => "rules",
            Self::V3 => "propagation",
            Self::V4 => "tracks",
            Self::V5 => "links",
        }
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ProfileId {
    type Err = ConfigError;

    /// Accepts either the profile name (`links`) or its schema version (`v5`).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .zip(["v1", "v2", "v3", "v4", "v5"])
            .find(|(id, version)| id.name() == wanted || *version == wanted)
            .map(|(id, _)| id)
            .ok_or_else(|| ConfigError::UnknownProfile(value.to_owned()))
    }
}

/// Whether rule terms may reuse source colors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleMode {
    /// Colors may repeat and zero-weight terms are allowed.
    WithReplacement,
    /// Each color is used at most once and every term weighs at least one.
    WithoutReplacement,
}

impl RuleMode {
    /// Smallest threshold a rule may draw.
    #[must_use]
    pub const fn threshold_floor(self) -> u8 {
        match self {
            Self::WithReplacement => 0,
            Self::WithoutReplacement => 1,
        }
    }

    /// Smallest coefficient a single term may draw.
    #[must_use]
    pub const fn coefficient_floor(self) -> u8 {
        match self {
            Self::WithReplacement => 0,
            Self::WithoutReplacement => 1,
        }
    }
}

/// How a jittered coordinate is pulled back into the domain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JitterClamp {
    /// Clamp to the lower bound only; the upper bound may be exceeded.
    ///
    /// Matches the historical generator output and is kept so that existing
    /// engine test suites stay reproducible.
    LowerOnly,
    /// Clamp to both bounds so every coordinate stays inside the domain.
    Both,
}

/// Local-jitter settings used for link endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct JitterConfig {
    /// Maximum per-axis offset from the origin.
    pub radius: i32,
    /// Clamping applied after the offset.
    pub clamp: JitterClamp,
}

/// Command family driven by a single phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    /// `C` lines.
    Tiles,
    /// `S` lines.
    Deactivations,
    /// `r` lines, optionally closed by a sort request.
    Rules,
    /// `b`/`B` pairs.
    Blocks,
    /// `p`/`P` lines with optional reorder pairs.
    Propagation,
    /// `t` lines.
    Tracks,
    /// `L` lines.
    Links,
    /// Full-grid `?` scans; the quantity counts scans, not lines.
    QueryAll,
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Tiles => "tiles",
            Self::Deactivations => "deactivations",
            Self::Rules => "rules",
            Self::Blocks => "blocks",
            Self::Propagation => "propagation",
            Self::Tracks => "tracks",
            Self::Links => "links",
            Self::QueryAll => "query_all",
        };
        f.write_str(name)
    }
}

/// Non-negative number of emissions requested by a phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Quantity(u64);

impl Quantity {
    /// Validates a requested quantity for the given phase kind.
    pub fn new(kind: PhaseKind, requested: i64) -> Result<Self, ConfigError> {
        u64::try_from(requested)
            .map(Self)
            .map_err(|_| ConfigError::NegativeQuantity { kind, requested })
    }

    /// Retrieves the validated quantity.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

/// One step of a profile's emission plan.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Phase {
    /// Command family emitted by the phase.
    pub kind: PhaseKind,
    /// Number of emissions.
    pub count: Quantity,
}

impl Phase {
    /// Declares a phase, rejecting negative quantities.
    pub fn new(kind: PhaseKind, count: i64) -> Result<Self, ConfigError> {
        Ok(Self {
            kind,
            count: Quantity::new(kind, count)?,
        })
    }
}

/// Complete set of constants governing one generator run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Profile {
    /// Canonical identifier the profile was derived from.
    pub id: ProfileId,
    /// Rule term sampling mode.
    pub rule_mode: RuleMode,
    /// Largest threshold a rule may draw.
    pub max_threshold: u8,
    /// Appends an intensity field to every created tile.
    pub intensity: bool,
    /// Follows a propagation step with a reorder pair one time in ten.
    pub maybe_reorder: bool,
    /// Closes every rule burst with a sort request.
    pub commit_rules: bool,
    /// Scans the whole grid after a propagation burst that reordered rules.
    pub scan_after_reorder: bool,
    /// Ends the stream with a quit line.
    pub terminate: bool,
    /// Colors available to tiles and rules.
    pub palette: Palette,
    /// Coordinate domain shared by every command.
    pub domain: Domain,
    /// Jitter applied to local link endpoints.
    pub jitter: JitterConfig,
    /// Emission plan, walked in order.
    pub phases: Vec<Phase>,
}

const LETTER_COLORS: [&str; 4] = ["q", "w", "e", "r"];
const NAMED_COLORS: [&str; 6] = ["red", "green", "blue", "yellow", "orange", "purple"];

const CANONICAL_JITTER: JitterConfig = JitterConfig {
    radius: 10,
    clamp: JitterClamp::LowerOnly,
};

impl Profile {
    /// Builds the canonical profile for the given identifier.
    pub fn canonical(id: ProfileId) -> Result<Self, ConfigError> {
        use PhaseKind::*;

        let profile = match id {
            ProfileId::V1 => Self {
                id,
                rule_mode: RuleMode::WithReplacement,
                max_threshold: MAX_RULE_THRESHOLD,
                intensity: false,
                maybe_reorder: false,
                commit_rules: false,
                scan_after_reorder: false,
                terminate: false,
                palette: Palette::new(LETTER_COLORS)?,
                domain: Domain::new(DomainShape::Symmetric, 500)?,
                jitter: CANONICAL_JITTER,
                phases: phases(&[(Tiles, 500_000), (Blocks, 1_000)])?,
            },
            ProfileId::V2 => Self {
                phases: phases(&[
                    (Tiles, 100_000),
                    (Rules, 1_000),
                    (Blocks, 1_000),
                    (Deactivations, 10_000),
                ])?,
                ..Self::canonical(ProfileId::V1)?
            }
            .with_id(id),
            ProfileId::V3 => Self {
                id,
                rule_mode: RuleMode::WithoutReplacement,
                max_threshold: MAX_RULE_THRESHOLD,
                intensity: true,
                maybe_reorder: true,
                commit_rules: true,
                scan_after_reorder: false,
                terminate: true,
                palette: Palette::new(NAMED_COLORS[..4].iter().copied())?,
                domain: Domain::new(DomainShape::ZeroBased, 200)?,
                jitter: CANONICAL_JITTER,
                phases: phases(&[
                    (Tiles, 20_000),
                    (Rules, 200),
                    (Propagation, 5_000),
                    (Deactivations, 2_000),
                    (Blocks, 500),
                ])?,
            },
            ProfileId::V4 => {
                let base = Self::canonical(ProfileId::V3)?;
                let mut plan = base.phases.clone();
                plan.push(Phase::new(Tracks, 2_000)?);
                Self {
                    palette: Palette::new(NAMED_COLORS[..5].iter().copied())?,
                    phases: plan,
                    ..base
                }
                .with_id(id)
            }
            ProfileId::V5 => Self {
                scan_after_reorder: true,
                palette: Palette::new(NAMED_COLORS)?,
                domain: Domain::new(DomainShape::ZeroBased, 100)?,
                phases: phases(&[
                    (Tiles, 5_000),
                    (Rules, 100),
                    (Propagation, 2_000),
                    (Tracks, 1_000),
                    (Links, 2_000),
                    (Blocks, 200),
                    (Deactivations, 500),
                    (QueryAll, 1),
                ])?,
                ..Self::canonical(ProfileId::V4)?
            }
            .with_id(id),
        };

        profile.validate()?;
        Ok(profile)
    }

    /// Every canonical profile, oldest first.
    pub fn all_canonical() -> Result<Vec<Self>, ConfigError> {
        ProfileId::ALL.into_iter().map(Self::canonical).collect()
    }

    /// Checks the cross-field constraints constructors cannot see on their own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let minimum = self.rule_mode.threshold_floor();
        if self.max_threshold < minimum || self.max_threshold > MAX_RULE_THRESHOLD {
            return Err(ConfigError::ThresholdOutOfRange {
                requested: self.max_threshold,
                minimum,
            });
        }
        if self.jitter.radius < 0 {
            return Err(ConfigError::NegativeRadius(self.jitter.radius));
        }
        Ok(())
    }

    /// Total quantity requested for the given phase kind across the plan.
    #[must_use]
    pub fn quantity_of(&self, kind: PhaseKind) -> u64 {
        self.phases
            .iter()
            .filter(|phase| phase.kind == kind)
            .map(|phase| phase.count.get())
            .sum()
    }

    fn with_id(mut self, id: ProfileId) -> Self {
        self.id = id;
        self
    }
}

fn phases(plan: &[(PhaseKind, i64)]) -> Result<Vec<Phase>, ConfigError> {
    plan.iter()
        .map(|&(kind, count)| Phase::new(kind, count))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_canonical_profile_validates() {
        let profiles = Profile::all_canonical().expect("canonical profiles are valid");
        let ids: Vec<_> = profiles.iter().map(|profile| profile.id).collect();
        assert_eq!(ids, ProfileId::ALL);
    }

    #[test]
    fn profiles_grow_monotonically_in_command_kinds() {
        let profiles = Profile::all_canonical().expect("canonical profiles are valid");
        for pair in profiles.windows(2) {
            let earlier: Vec<_> = pair[0].phases.iter().map(|phase| phase.kind).collect();
            let later: Vec<_> = pair[1].phases.iter().map(|phase| phase.kind).collect();
            assert!(
                earlier.iter().all(|kind| later.contains(kind)),
                "{} drops a command kind used by {}",
                pair[1].id,
                pair[0].id,
            );
        }
    }

    #[test]
    fn later_profiles_use_zero_based_domains_and_named_colors() {
        let v3 = Profile::canonical(ProfileId::V3).expect("valid profile");
        assert_eq!(v3.domain.shape(), DomainShape::ZeroBased);
        assert_eq!(v3.rule_mode, RuleMode::WithoutReplacement);
        assert!(v3.palette.colors().iter().all(|c| c.as_str().len() > 1));

        let v1 = Profile::canonical(ProfileId::V1).expect("valid profile");
        assert_eq!(v1.domain.shape(), DomainShape::Symmetric);
        assert_eq!(v1.quantity_of(PhaseKind::Tiles), 500_000);
    }

    #[test]
    fn profile_names_parse_case_insensitively() {
        assert_eq!("links".parse::<ProfileId>(), Ok(ProfileId::V5));
        assert_eq!("V2".parse::<ProfileId>(), Ok(ProfileId::V2));
        assert_eq!(
            "gliders".parse::<ProfileId>(),
            Err(ConfigError::UnknownProfile("gliders".to_owned()))
        );
    }

    #[test]
    fn negative_quantities_are_rejected() {
        assert_eq!(
            Phase::new(PhaseKind::Links, -1),
            Err(ConfigError::NegativeQuantity {
                kind: PhaseKind::Links,
                requested: -1,
            })
        );
    }

    #[test]
    fn threshold_ceiling_must_fit_rule_mode() {
        let mut profile = Profile::canonical(ProfileId::V3).expect("valid profile");
        profile.max_threshold = 0;
        assert_eq!(
            profile.validate(),
            Err(ConfigError::ThresholdOutOfRange {
                requested: 0,
                minimum: 1,
            })
        );

        profile.max_threshold = 9;
        assert!(profile.validate().is_err());
    }

    #[test]
    fn negative_jitter_radius_is_rejected() {
        let mut profile = Profile::canonical(ProfileId::V5).expect("valid profile");
        profile.jitter.radius = -3;
        assert_eq!(profile.validate(), Err(ConfigError::NegativeRadius(-3)));
    }

    #[test]
    fn profiles_serialize_for_inspection() {
        let profile = Profile::canonical(ProfileId::V5).expect("valid profile");
        let rendered = toml::to_string(&profile).expect("profile serializes");
        assert!(rendered.contains("id = \"links\""));
        assert!(rendered.contains("rule_mode = \"without_replacement\""));
        assert!(rendered.contains("kind = \"query_all\""));
    }
}
