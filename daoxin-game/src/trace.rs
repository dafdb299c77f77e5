//! Explainability telemetry for weighted selections.
//!
//! Traces are optional by-products of a roll; they never influence the
//! outcome and cost no extra draws.
use serde::{Deserialize, Serialize};

/// Record of a single weighted draw.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDecisionTrace {
    /// Identifier for the selection pool (e.g., `exploration.tier`).
    pub pool_id: String,
    /// Raw uniform variate consumed by the draw.
    pub roll: f64,
    /// Variate scaled by the total candidate weight.
    pub scaled_roll: f64,
    /// Candidate weights considered during selection.
    pub candidates: Vec<WeightedCandidate>,
    /// Identifier of the selected candidate.
    pub chosen_id: String,
}

impl EventDecisionTrace {
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.candidates.iter().map(|c| c.final_weight).sum()
    }
}

/// Candidate weight telemetry captured during selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedCandidate {
    pub id: String,
    pub base_weight: f64,
    /// Multipliers applied in order.
    pub multipliers: Vec<WeightFactor>,
    pub final_weight: f64,
}

/// Single multiplicative weight factor used in a selection trace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightFactor {
    pub label: String,
    pub value: f64,
}

impl WeightFactor {
    #[must_use]
    pub fn new(label: &str, value: f64) -> Self {
        Self {
            label: label.to_string(),
            value,
        }
    }
}

/// Both stages of a loot roll.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootTrace {
    pub tier: EventDecisionTrace,
    pub item: EventDecisionTrace,
}
