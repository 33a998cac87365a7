#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Partition-based rule generation system.
//!
//! A rule is an integer partition of a randomly drawn threshold, with every
//! part labelled by a source color. Each coefficient is drawn from
//! `[floor, threshold - sum]`, so the running sum can never overshoot and the
//! loop ends exactly on the threshold.

use rand::Rng;
use tilegen_core::{
    Color, ConfigError, Palette, Rule, RuleMode, RuleTerm, MAX_RULE_THRESHOLD,
};

/// Produces color-weighted partitions in a single run-wide [`RuleMode`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RuleGenerator {
    mode: RuleMode,
    max_threshold: u8,
}

impl RuleGenerator {
    /// Creates a generator, rejecting ceilings the mode cannot satisfy.
    pub fn new(mode: RuleMode, max_threshold: u8) -> Result<Self, ConfigError> {
        let minimum = mode.threshold_floor();
        if max_threshold < minimum || max_threshold > MAX_RULE_THRESHOLD {
            return Err(ConfigError::ThresholdOutOfRange {
                requested: max_threshold,
                minimum,
            });
        }
        Ok(Self {
            mode,
            max_threshold,
        })
    }

    /// Sampling mode applied to every rule.
    #[must_use]
    pub const fn mode(&self) -> RuleMode {
        self.mode
    }

    /// Largest threshold a rule may draw.
    #[must_use]
    pub const fn max_threshold(&self) -> u8 {
        self.max_threshold
    }

    /// Draws a threshold from `[floor, max_threshold]` and partitions it.
    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R, palette: &Palette) -> Rule {
        let threshold = rng.gen_range(self.mode.threshold_floor()..=self.max_threshold);
        self.generate_with_threshold(rng, palette, threshold)
    }

    /// Partitions a caller-chosen threshold.
    ///
    /// A threshold of zero yields a rule with no terms, which renders as the
    /// header and target color only.
    pub fn generate_with_threshold<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        palette: &Palette,
        threshold: u8,
    ) -> Rule {
        let target = pick(rng, palette.colors()).clone();
        let terms = match self.mode {
            RuleMode::WithReplacement => partition_with_replacement(rng, palette, threshold),
            RuleMode::WithoutReplacement => partition_without_replacement(rng, palette, threshold),
        };
        Rule::new(target, threshold, terms)
    }
}

fn partition_with_replacement<R: Rng + ?Sized>(
    rng: &mut R,
    palette: &Palette,
    threshold: u8,
) -> Vec<RuleTerm> {
    let floor = RuleMode::WithReplacement.coefficient_floor();
    let mut terms = Vec::new();
    let mut sum = 0u8;

    while sum < threshold {
        let coefficient = rng.gen_range(floor..=threshold - sum);
        let color = pick(rng, palette.colors()).clone();
        terms.push(RuleTerm { coefficient, color });
        sum += coefficient;
    }

    terms
}

fn partition_without_replacement<R: Rng + ?Sized>(
    rng: &mut R,
    palette: &Palette,
    threshold: u8,
) -> Vec<RuleTerm> {
    let floor = RuleMode::WithoutReplacement.coefficient_floor();
    let mut available: Vec<&Color> = palette.colors().iter().collect();
    let mut terms = Vec::with_capacity(available.len().min(usize::from(threshold)));
    let mut sum = 0u8;

    while sum < threshold && !available.is_empty() {
        let remaining = threshold - sum;
        let index = rng.gen_range(0..available.len());
        let color = available.swap_remove(index).clone();
        // The last unused color absorbs the rest of the budget.
        let coefficient = if available.is_empty() {
            remaining
        } else {
            rng.gen_range(floor..=remaining)
        };
        terms.push(RuleTerm { coefficient, color });
        sum += coefficient;
    }

    terms
}

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, colors: &'a [Color]) -> &'a Color {
    &colors[rng.gen_range(0..colors.len())]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_ceilings_outside_the_mode_range() {
        assert_eq!(
            RuleGenerator::new(RuleMode::WithoutReplacement, 0),
            Err(ConfigError::ThresholdOutOfRange {
                requested: 0,
                minimum: 1,
            })
        );
        assert!(RuleGenerator::new(RuleMode::WithReplacement, 0).is_ok());
        assert!(RuleGenerator::new(RuleMode::WithReplacement, 9).is_err());
    }
}
