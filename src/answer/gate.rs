//! Confidence gate

use crate::search::FinalResult;

/// Minimum top score that still produces an answer.
pub const ANSWER_THRESHOLD: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Answer,
    Abstain,
}

#[derive(Debug, Clone, Copy)]
pub struct ConfidenceGate {
    pub threshold: f64,
}

impl Default for ConfidenceGate {
    fn default() -> Self {
        Self {
            threshold: ANSWER_THRESHOLD,
        }
    }
}

impl ConfidenceGate {
    #[must_use]
    pub const fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Abstain on an empty list or when the top score is strictly below the
    /// threshold. The same threshold is used for every mode even though their
    /// score scales differ.
    #[must_use]
    pub fn decide(&self, results: &[FinalResult]) -> GateDecision {
        match results.first() {
            Some(top) if top.score >= self.threshold => GateDecision::Answer,
            _ => GateDecision::Abstain,
        }
    }
}
