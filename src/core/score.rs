//! Trust score ledger.

use serde::{Deserialize, Serialize};

pub const MAX_SCORE: f64 = 100.0;
pub const MIN_SCORE: f64 = 0.0;

/// Bounded integrity score. Starts at 100 and never leaves `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrustScore {
    value: f64,
}

impl TrustScore {
    pub fn new() -> Self {
        Self { value: MAX_SCORE }
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Subtract `amount`, floored at 0. Returns the amount actually removed.
    pub fn penalize(&mut self, amount: f64) -> f64 {
        let before = self.value;
        self.value = (self.value - amount).max(MIN_SCORE);
        before - self.value
    }

    /// Add `amount`, capped at 100. Returns the amount actually added.
    pub fn recover(&mut self, amount: f64) -> f64 {
        let before = self.value;
        self.value = (self.value + amount).min(MAX_SCORE);
        self.value - before
    }

    pub fn tier(&self) -> ScoreTier {
        ScoreTier::from_score(self.value)
    }
}

impl Default for TrustScore {
    fn default() -> Self {
        Self::new()
    }
}

/// Presentation bands for the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTier {
    /// Above 80
    Nominal,
    /// Above 50, up to 80
    Caution,
    /// 50 and below
    HighRisk,
}

impl ScoreTier {
    pub fn from_score(score: f64) -> Self {
        if score > 80.0 {
            ScoreTier::Nominal
        } else if score > 50.0 {
            ScoreTier::Caution
        } else {
            ScoreTier::HighRisk
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ScoreTier::Nominal => "LOW RISK",
            ScoreTier::Caution => "MODERATE",
            ScoreTier::HighRisk => "HIGH RISK",
        }
    }

    /// Reviewer-facing summary of what the tier means.
    pub fn narrative(&self) -> &'static str {
        match self {
            ScoreTier::Nominal => {
                "Candidate exhibited high integrity throughout the session with minimal deviations."
            }
            ScoreTier::Caution => {
                "Moderate deviations detected. Recommend reviewing specific behavioral logs before finalizing."
            }
            ScoreTier::HighRisk => {
                "High-risk behavior detected. Integrity score fell below the recommended threshold."
            }
        }
    }
}

impl std::fmt::Display for ScoreTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
