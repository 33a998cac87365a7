#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the tile workload generator.
//!
//! This crate defines the vocabulary every other member speaks. Systems draw
//! [`Coordinate`] values from a [`Domain`], pick [`Color`] tokens from a
//! [`Palette`], and describe each emitted line as a [`Command`]. The textual
//! wire form consumed by the tile engine is the [`std::fmt::Display`]
//! rendering of a command. Run-wide constants are grouped into a
//! [`Profile`], and every validating constructor reports a [`ConfigError`]
//! so a misconfigured run aborts before any output is produced.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

pub mod profile;

pub use profile::{
    JitterClamp, JitterConfig, Phase, PhaseKind, Profile, ProfileId, Quantity, RuleMode,
};

/// Largest rule threshold the tile engine accepts for a single rule.
pub const MAX_RULE_THRESHOLD: u8 = 8;

/// Fatal configuration problems detected before a run starts.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A palette was declared without any color tokens.
    #[error("palette must contain at least one color")]
    EmptyPalette,
    /// A color token was empty or contained whitespace.
    #[error("color token {0:?} must be non-empty and free of whitespace")]
    InvalidColor(String),
    /// The domain bound was zero or negative.
    #[error("domain bound must be positive, got {0}")]
    NonPositiveBound(i64),
    /// The domain bound does not fit the coordinate range.
    #[error("domain bound {0} exceeds {max}", max = i32::MAX)]
    BoundTooLarge(i64),
    /// A phase requested a negative number of emissions.
    #[error("quantity for {kind} must not be negative, got {requested}")]
    NegativeQuantity {
        /// Phase whose quantity was rejected.
        kind: PhaseKind,
        /// Quantity supplied by the profile declaration.
        requested: i64,
    },
    /// The rule threshold ceiling is outside the range the rule mode supports.
    #[error("rule threshold ceiling {requested} must lie in [{minimum}, {max}]", max = MAX_RULE_THRESHOLD)]
    ThresholdOutOfRange {
        /// Ceiling supplied by the profile declaration.
        requested: u8,
        /// Smallest ceiling the active rule mode can satisfy.
        minimum: u8,
    },
    /// The link jitter radius was negative.
    #[error("jitter radius must not be negative, got {0}")]
    NegativeRadius(i32),
    /// A tile intensity fell outside the accepted range.
    #[error("intensity {0} must lie in [{min}, {max}]", min = Intensity::MIN, max = Intensity::MAX)]
    IntensityOutOfRange(u32),
    /// A profile name did not match any canonical profile.
    #[error("unknown profile {0:?}")]
    UnknownProfile(String),
}

/// Location of a single tile expressed as signed column and row values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Coordinate {
    x: i32,
    y: i32,
}

impl Coordinate {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Horizontal component of the coordinate.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical component of the coordinate.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.x, self.y)
    }
}

/// Shape of the square region coordinates are drawn from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainShape {
    /// Both axes span `[-bound, bound]`.
    Symmetric,
    /// Both axes span `[0, bound]`.
    ZeroBased,
}

/// Square coordinate domain shared by every axis of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct Domain {
    shape: DomainShape,
    bound: i32,
}

impl Domain {
    /// Creates a domain, rejecting bounds that are not strictly positive.
    pub fn new(shape: DomainShape, bound: i64) -> Result<Self, ConfigError> {
        if bound <= 0 {
            return Err(ConfigError::NonPositiveBound(bound));
        }
        let bound = i32::try_from(bound).map_err(|_| ConfigError::BoundTooLarge(bound))?;
        Ok(Self { shape, bound })
    }

    /// Shape selected for the domain.
    #[must_use]
    pub const fn shape(&self) -> DomainShape {
        self.shape
    }

    /// Configured bound; always strictly positive.
    #[must_use]
    pub const fn bound(&self) -> i32 {
        self.bound
    }

    /// Smallest value either axis may take.
    #[must_use]
    pub const fn lo(&self) -> i32 {
        match self.shape {
            DomainShape::Symmetric => -self.bound,
            DomainShape::ZeroBased => 0,
        }
    }

    /// Largest value either axis may take.
    #[must_use]
    pub const fn hi(&self) -> i32 {
        self.bound
    }

    /// Number of distinct values along one axis.
    #[must_use]
    pub const fn side(&self) -> u64 {
        (self.hi() as i64 - self.lo() as i64 + 1) as u64
    }

    /// Number of coordinates contained in the domain.
    #[must_use]
    pub const fn cell_count(&self) -> u64 {
        self.side() * self.side()
    }

    /// Reports whether the coordinate lies inside the domain on both axes.
    #[must_use]
    pub fn contains(&self, at: Coordinate) -> bool {
        let range = self.lo()..=self.hi();
        range.contains(&at.x()) && range.contains(&at.y())
    }
}

/// Color token understood by the tile engine.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    /// Creates a color token, rejecting empty tokens and embedded whitespace.
    pub fn new(token: impl Into<String>) -> Result<Self, ConfigError> {
        let token = token.into();
        if token.is_empty() || token.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidColor(token));
        }
        Ok(Self(token))
    }

    /// Token written to the command stream.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Non-empty, ordered set of color tokens available to a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Palette {
    colors: Vec<Color>,
}

impl Palette {
    /// Builds a palette from raw tokens.
    ///
    /// Fails with [`ConfigError::EmptyPalette`] when no tokens are supplied so
    /// that color selection can never be asked to pick from nothing.
    pub fn new<I, S>(tokens: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let colors = tokens
            .into_iter()
            .map(Color::new)
            .collect::<Result<Vec<_>, _>>()?;
        if colors.is_empty() {
            return Err(ConfigError::EmptyPalette);
        }
        Ok(Self { colors })
    }

    /// Colors in declaration order; never empty.
    #[must_use]
    pub fn colors(&self) -> &[Color] {
        &self.colors
    }

    /// Number of colors in the palette.
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    /// Always `false`; provided for API symmetry with slices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}

/// Compass directions a track may follow, one step at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// One step toward increasing `y`.
    North,
    /// One step toward decreasing `y`.
    South,
    /// One step toward increasing `x`.
    East,
    /// One step toward decreasing `x`.
    West,
    /// Diagonal step toward increasing `x` and `y`.
    NorthEast,
    /// Diagonal step toward decreasing `x` and increasing `y`.
    NorthWest,
    /// Diagonal step toward increasing `x` and decreasing `y`.
    SouthEast,
    /// Diagonal step toward decreasing `x` and `y`.
    SouthWest,
}

impl Direction {
    /// Every direction, in a stable order used for uniform selection.
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::South,
        Direction::East,
        Direction::West,
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::SouthEast,
        Direction::SouthWest,
    ];

    /// Two-letter wire code for the direction.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::North => "NN",
            Self::South => "SS",
            Self::East => "EE",
            Self::West => "WW",
            Self::NorthEast => "NE",
            Self::NorthWest => "NW",
            Self::SouthEast => "SE",
            Self::SouthWest => "SW",
        }
    }

    /// Parses a two-letter wire code.
    #[must_use]
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|direction| direction.code() == code)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Brightness attached to a freshly created tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Intensity(u16);

impl Intensity {
    /// Smallest accepted intensity.
    pub const MIN: u16 = 1;
    /// Largest accepted intensity.
    pub const MAX: u16 = 1000;

    /// Creates an intensity, rejecting values outside `[MIN, MAX]`.
    pub fn new(value: u32) -> Result<Self, ConfigError> {
        match u16::try_from(value) {
            Ok(narrow) if (Self::MIN..=Self::MAX).contains(&narrow) => Ok(Self(narrow)),
            _ => Err(ConfigError::IntensityOutOfRange(value)),
        }
    }

    /// Creates an intensity, pulling `value` into `[MIN, MAX]`.
    #[must_use]
    pub fn saturating(value: u16) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    /// Retrieves the numeric intensity.
    #[must_use]
    pub const fn get(&self) -> u16 {
        self.0
    }
}

/// Single weighted requirement of a rule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleTerm {
    /// Number of neighbours of `color` the term contributes to the threshold.
    pub coefficient: u8,
    /// Source color counted by the term.
    pub color: Color,
}

/// Propagation rule: a target color reached when its weighted terms are met.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rule {
    target: Color,
    threshold: u8,
    terms: Vec<RuleTerm>,
}

impl Rule {
    /// Assembles a rule from its parts.
    ///
    /// The caller is responsible for keeping the coefficient sum equal to the
    /// threshold; [`Rule::is_balanced`] reports whether it does.
    #[must_use]
    pub fn new(target: Color, threshold: u8, terms: Vec<RuleTerm>) -> Self {
        Self {
            target,
            threshold,
            terms,
        }
    }

    /// Color produced when the rule fires.
    #[must_use]
    pub fn target(&self) -> &Color {
        &self.target
    }

    /// Threshold drawn for the rule; not part of the wire form.
    #[must_use]
    pub const fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Weighted requirements in emission order.
    #[must_use]
    pub fn terms(&self) -> &[RuleTerm] {
        &self.terms
    }

    /// Sum of every term coefficient.
    #[must_use]
    pub fn coefficient_sum(&self) -> u32 {
        self.terms
            .iter()
            .map(|term| u32::from(term.coefficient))
            .sum()
    }

    /// Reports whether the coefficients add up to the threshold exactly.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.coefficient_sum() == u32::from(self.threshold)
    }
}

/// The two flavours of propagation step the engine distinguishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropagationKind {
    /// Propagate a single tile (`p`).
    Single,
    /// Propagate across the whole block containing the tile (`P`).
    Block,
}

impl PropagationKind {
    /// Selects the kind for the given emission index: even indices propagate
    /// single tiles, odd indices propagate blocks.
    #[must_use]
    pub const fn for_index(index: u64) -> Self {
        if index % 2 == 0 {
            Self::Single
        } else {
            Self::Block
        }
    }
}

/// Every line the generator can emit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Creates or recolors a tile.
    CreateTile {
        /// Tile being created.
        at: Coordinate,
        /// Color assigned to the tile.
        color: Color,
        /// Optional brightness, present only when the profile enables it.
        intensity: Option<Intensity>,
    },
    /// Switches a tile off.
    DeactivateTile {
        /// Tile being switched off.
        at: Coordinate,
    },
    /// Asks the engine for the state of a tile.
    QueryTile {
        /// Tile being inspected.
        at: Coordinate,
    },
    /// Asks the engine for the block containing the tile.
    PlaceBlock {
        /// Seed tile of the block.
        at: Coordinate,
    },
    /// Asks the engine for the single-colored block containing the tile.
    Homogenize {
        /// Seed tile of the block.
        at: Coordinate,
    },
    /// Appends a propagation rule.
    DefineRule {
        /// Rule being appended.
        rule: Rule,
    },
    /// Requests that rules be reordered by usage.
    Reorder,
    /// Requests that the rule set be committed and printed.
    Sort,
    /// Applies propagation at a tile.
    Propagate {
        /// Tile at which propagation starts.
        at: Coordinate,
        /// Flavour of propagation.
        kind: PropagationKind,
    },
    /// Walks a track from an origin.
    DefineTrack {
        /// First tile of the track.
        origin: Coordinate,
        /// Steps taken from the origin; never empty.
        path: Vec<Direction>,
    },
    /// Relates two tiles by their shortest weighted path.
    DefineLink {
        /// Start of the link.
        from: Coordinate,
        /// End of the link.
        to: Coordinate,
    },
    /// Ends the input for the engine.
    Quit,
}

impl Command {
    /// Leading token identifying the command on the wire.
    #[must_use]
    pub const fn token(&self) -> &'static str {
        match self {
            Self::CreateTile { .. } => "C",
            Self::DeactivateTile { .. } => "S",
            Self::QueryTile { .. } => "?",
            Self::PlaceBlock { .. } => "b",
            Self::Homogenize { .. } => "B",
            Self::DefineRule { .. } => "r",
            Self::Reorder => "o",
            Self::Sort => "s",
            Self::Propagate {
                kind: PropagationKind::Single,
                ..
            } => "p",
            Self::Propagate {
                kind: PropagationKind::Block,
                ..
            } => "P",
            Self::DefineTrack { .. } => "t",
            Self::DefineLink { .. } => "L",
            Self::Quit => "q",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())?;
        match self {
            Self::CreateTile {
                at,
                color,
                intensity,
            } => {
                write!(f, " {at} {color}")?;
                if let Some(intensity) = intensity {
                    write!(f, " {}", intensity.get())?;
                }
                Ok(())
            }
            Self::DeactivateTile { at }
            | Self::QueryTile { at }
            | Self::PlaceBlock { at }
            | Self::Homogenize { at }
            | Self::Propagate { at, .. } => write!(f, " {at}"),
            Self::DefineRule { rule } => {
                write!(f, " {}", rule.target())?;
                for RuleTerm { coefficient, color } in rule.terms() {
                    write!(f, " {coefficient} {color}")?;
                }
                Ok(())
            }
            Self::DefineTrack { origin, path } => {
                write!(f, " {origin}")?;
                for direction in path {
                    write!(f, " {direction}")?;
                }
                Ok(())
            }
            Self::DefineLink { from, to } => write!(f, " {from} {to}"),
            Self::Reorder | Self::Sort | Self::Quit => Ok(()),
        }
    }
}
