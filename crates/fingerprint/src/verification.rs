#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::Serialize;
use strum::Display;
use tracing::{info, warn};

use crate::{
    config::EngineConfig,
    error::Result,
    matching::{AcceptancePolicy, MatchScore, Matcher},
    store::{StoredTemplate, TemplateStore},
    template::Template,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VerificationStatus {
    /// At least one enrolled template scored above the threshold
    Verified,
    /// No enrolled template scored above the threshold
    Rejected,
    /// The probe template is empty; nothing was compared
    NoSignal,
    /// The identity exists but has nothing enrolled
    NoEnrolledTemplates,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateScore {
    pub label: String,
    pub score: MatchScore,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationOutcome {
    pub identity: String,
    pub status: VerificationStatus,
    /// One entry per enrolled template, in store order
    pub scores: Vec<TemplateScore>,
}

impl VerificationOutcome {
    pub fn is_verified(&self) -> bool {
        self.status == VerificationStatus::Verified
    }

    /// Highest scoring enrolled template; the earliest one wins ties
    pub fn best(&self) -> Option<&TemplateScore> {
        self.scores.iter().fold(None, |best: Option<&TemplateScore>, candidate| match best {
            Some(current) if current.score >= candidate.score => Some(current),
            _ => Some(candidate),
        })
    }
}

/// Compares a fresh probe against an identity's enrolled templates
#[derive(Debug, Clone, Default)]
pub struct Verifier {
    matcher: Matcher,
    policy: AcceptancePolicy,
}

impl Verifier {
    pub fn new(matcher: Matcher, policy: AcceptancePolicy) -> Self {
        Self { matcher, policy }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(Matcher::new(config.matching.clone()), config.acceptance.clone())
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn policy(&self) -> &AcceptancePolicy {
        &self.policy
    }

    /// Score the probe against every stored template, keeping store order
    pub fn score_all(&self, probe: &Template, stored: &[StoredTemplate]) -> Vec<TemplateScore> {
        let score_one = |entry: &StoredTemplate| TemplateScore {
            label: entry.label.clone(),
            score: self.matcher.compare(probe, &entry.template),
        };

        #[cfg(feature = "parallel")]
        let scores = stored.par_iter().map(score_one).collect();

        #[cfg(not(feature = "parallel"))]
        let scores = stored.iter().map(score_one).collect();

        scores
    }

    /// Fetch the identity's templates and decide whether the probe matches any
    pub fn verify<S>(&self, store: &S, identity: &str, probe: &Template) -> Result<VerificationOutcome>
    where
        S: TemplateStore + ?Sized,
    {
        let stored = store.fetch_templates(identity)?;

        if probe.is_empty() {
            warn!(identity, "probe has no minutiae, treating as non-match");
            return Ok(VerificationOutcome {
                identity: identity.to_string(),
                status: VerificationStatus::NoSignal,
                scores: Vec::new(),
            });
        }

        if stored.is_empty() {
            warn!(identity, "no templates enrolled");
            return Ok(VerificationOutcome {
                identity: identity.to_string(),
                status: VerificationStatus::NoEnrolledTemplates,
                scores: Vec::new(),
            });
        }

        let scores = self.score_all(probe, &stored);
        let verified = scores.iter().any(|s| self.policy.accepts(s.score));
        let outcome = VerificationOutcome {
            identity: identity.to_string(),
            status: if verified {
                VerificationStatus::Verified
            } else {
                VerificationStatus::Rejected
            },
            scores,
        };

        if let Some(best) = outcome.best() {
            info!(
                identity,
                status = %outcome.status,
                best_label = %best.label,
                best_score = best.score.value(),
                compared = outcome.scores.len(),
                "verification finished"
            );
        }

        Ok(outcome)
    }
}
