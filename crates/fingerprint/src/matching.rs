//! Tolerance based template comparison.
//!
//! Matching is a single greedy pass: every point of the probe template, in
//! order, takes the first point of the reference template that has the same
//! kind and lies within the tolerance. There is no backtracking, so this is
//! not a maximum bipartite matching and `compare(a, b)` may differ from
//! `compare(b, a)`. Under [`MatchStrategy::Greedy`] a reference point may be
//! taken by several probe points. The acceptance threshold in
//! [`AcceptancePolicy`] was tuned against that behaviour.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString, VariantNames};

use crate::template::Template;

/// Tolerance used when neither the config nor the caller provides one
pub const DEFAULT_TOLERANCE: f64 = 0.05;

/// Score above which the default acceptance policy verifies a match
pub const DEFAULT_ACCEPTANCE_THRESHOLD: f64 = 90.0;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq,
    Serialize, Deserialize, JsonSchema,
    Display, EnumString, VariantNames,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MatchStrategy {
    /// First hit wins; reference points can be matched repeatedly
    #[default]
    Greedy,
    /// First unclaimed hit wins; each reference point is matched at most once.
    /// Not monotone in the tolerance.
    Exclusive,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct MatchConfig {
    /// Maximum normalized distance between corresponding minutiae
    #[schemars(range(min = 0.0, max = 1.5))]
    pub tolerance: f64,
    pub strategy: MatchStrategy,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            strategy: MatchStrategy::Greedy,
        }
    }
}

/// Percentage of matched minutiae relative to the larger template, in [0, 100]
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize, JsonSchema)]
pub struct MatchScore(f64);

impl MatchScore {
    pub const ZERO: MatchScore = MatchScore(0.0);

    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<MatchScore> for f64 {
    fn from(score: MatchScore) -> Self {
        score.0
    }
}

impl fmt::Display for MatchScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}%", self.0)
    }
}

/// Caller-side decision rule: verified iff score > threshold
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AcceptancePolicy {
    #[schemars(range(min = 0.0, max = 100.0))]
    pub threshold: f64,
}

impl Default for AcceptancePolicy {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_ACCEPTANCE_THRESHOLD,
        }
    }
}

impl AcceptancePolicy {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn accepts(&self, score: MatchScore) -> bool {
        score.value() > self.threshold
    }
}

#[derive(Debug, Clone, Default)]
pub struct Matcher {
    config: MatchConfig,
}

impl Matcher {
    pub fn new(config: MatchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Compare with the configured tolerance
    pub fn compare(&self, probe: &Template, reference: &Template) -> MatchScore {
        self.compare_with_tolerance(probe, reference, None)
    }

    /// Compare, letting `tolerance` override the configured one for this call
    pub fn compare_with_tolerance(
        &self,
        probe: &Template,
        reference: &Template,
        tolerance: Option<f32>,
    ) -> MatchScore {
        let tolerance = tolerance.unwrap_or(self.config.tolerance as f32);
        if probe.is_empty() || reference.is_empty() {
            return MatchScore::ZERO;
        }

        let matches = count_matches(probe, reference, tolerance, self.config.strategy);
        let denominator = probe.len().max(reference.len()) as f64;
        MatchScore(matches as f64 / denominator * 100.0)
    }
}

fn count_matches(probe: &Template, reference: &Template, tolerance: f32, strategy: MatchStrategy) -> usize {
    let mut claimed = vec![false; reference.len()];
    let mut matches = 0;

    for source in probe {
        let hit = reference.iter().enumerate().position(|(j, target)| {
            let available = strategy == MatchStrategy::Greedy || !claimed[j];
            available && target.kind == source.kind && source.distance_to(target) <= tolerance
        });

        if let Some(j) = hit {
            claimed[j] = true;
            matches += 1;
        }
    }

    matches
}
