//! Rarity weight calculator.
//!
//! A tier's weight is an ordered pipeline of pure factors:
//! danger band base → streak bonus → kungfu multiplier → pity multiplier.
//! A tier locked by danger (base weight 0) stays at 0 through every
//! multiplier; only the explicit `PityMod::ForceLegendary` override can
//! reach past the danger gate.
use serde::{Deserialize, Serialize};

use crate::constants::{
    DANGER_BAND_FLOORS, DANGER_BAND_WEIGHTS, STREAK_BLAZING, STREAK_BLAZING_EPIC_MUL,
    STREAK_BLAZING_LEGEND_MUL, STREAK_HOT, STREAK_HOT_HIGH_MUL, STREAK_HOT_RARE_MUL,
    STREAK_WARM, STREAK_WARM_RARE_MUL,
};
use crate::numbers::sanitize_multiplier;
use crate::rarity::RarityTier;
use crate::trace::{WeightFactor, WeightedCandidate};

/// Equipment-derived loot multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KungfuMod {
    #[serde(default = "KungfuMod::neutral")]
    pub loot_rare_mul: f64,
    /// Falls back to `loot_rare_mul` when absent.
    #[serde(default)]
    pub loot_epic_mul: Option<f64>,
    #[serde(default = "KungfuMod::neutral")]
    pub loot_legend_mul: f64,
}

impl Default for KungfuMod {
    fn default() -> Self {
        Self {
            loot_rare_mul: 1.0,
            loot_epic_mul: None,
            loot_legend_mul: 1.0,
        }
    }
}

impl KungfuMod {
    const fn neutral() -> f64 {
        1.0
    }

    #[must_use]
    pub fn multiplier(&self, tier: RarityTier) -> f64 {
        let raw = match tier {
            RarityTier::Common => 1.0,
            RarityTier::Rare => self.loot_rare_mul,
            RarityTier::Epic => self.loot_epic_mul.unwrap_or(self.loot_rare_mul),
            RarityTier::Legendary => self.loot_legend_mul,
        };
        sanitize_multiplier(raw)
    }
}

/// Modifier derived from a pity counter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum PityMod {
    /// Soft pity: scales the legendary weight.
    Scale { legendary: f64 },
    /// Hard pity: the next draw is legendary, bypassing the weighted path.
    ForceLegendary,
}

impl Default for PityMod {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl PityMod {
    pub const NEUTRAL: Self = Self::Scale { legendary: 1.0 };

    #[must_use]
    pub const fn is_forced(&self) -> bool {
        matches!(self, Self::ForceLegendary)
    }

    /// Multiplier on the weighted path. The forced override is handled by
    /// `weight` before multipliers are consulted.
    #[must_use]
    pub fn multiplier(&self, tier: RarityTier) -> f64 {
        match (self, tier) {
            (Self::Scale { legendary }, RarityTier::Legendary) => sanitize_multiplier(*legendary),
            _ => 1.0,
        }
    }
}

/// Index of the danger band containing `danger`.
#[must_use]
pub fn danger_band(danger: u32) -> usize {
    DANGER_BAND_FLOORS
        .iter()
        .rposition(|floor| danger >= *floor)
        .unwrap_or(0)
}

/// Base weight of `tier` for the band containing `danger`.
#[must_use]
pub fn base_weight(tier: RarityTier, danger: u32) -> f64 {
    DANGER_BAND_WEIGHTS[danger_band(danger)][tier.index()]
}

/// Streak bonus for `tier`. Common never receives a streak bonus.
#[must_use]
pub fn streak_multiplier(tier: RarityTier, streak: u32) -> f64 {
    match tier {
        RarityTier::Common => 1.0,
        RarityTier::Rare => {
            if streak >= STREAK_HOT {
                STREAK_HOT_RARE_MUL
            } else if streak >= STREAK_WARM {
                STREAK_WARM_RARE_MUL
            } else {
                1.0
            }
        }
        RarityTier::Epic => {
            if streak >= STREAK_BLAZING {
                STREAK_BLAZING_EPIC_MUL
            } else if streak >= STREAK_HOT {
                STREAK_HOT_HIGH_MUL
            } else {
                1.0
            }
        }
        RarityTier::Legendary => {
            if streak >= STREAK_BLAZING {
                STREAK_BLAZING_LEGEND_MUL
            } else if streak >= STREAK_HOT {
                STREAK_HOT_HIGH_MUL
            } else {
                1.0
            }
        }
    }
}

/// Final non-negative weight of `tier`.
#[must_use]
pub fn weight(
    tier: RarityTier,
    danger: u32,
    streak: u32,
    kungfu: Option<&KungfuMod>,
    pity: Option<&PityMod>,
) -> f64 {
    if pity.is_some_and(PityMod::is_forced) {
        return forced_weight(tier);
    }
    let base = base_weight(tier, danger);
    if base <= 0.0 {
        return 0.0;
    }
    let mut value = base * streak_multiplier(tier, streak);
    if let Some(kungfu) = kungfu {
        value *= kungfu.multiplier(tier);
    }
    if let Some(pity) = pity {
        value *= pity.multiplier(tier);
    }
    sanitize_multiplier(value)
}

/// Weights for every tier, ordered like `RarityTier::ALL`.
#[must_use]
pub fn tier_weights(
    danger: u32,
    streak: u32,
    kungfu: Option<&KungfuMod>,
    pity: Option<&PityMod>,
) -> [f64; 4] {
    RarityTier::ALL.map(|tier| weight(tier, danger, streak, kungfu, pity))
}

/// Same value as `weight`, with each applied factor labelled for traces.
#[must_use]
pub fn weight_breakdown(
    tier: RarityTier,
    danger: u32,
    streak: u32,
    kungfu: Option<&KungfuMod>,
    pity: Option<&PityMod>,
) -> WeightedCandidate {
    if pity.is_some_and(PityMod::is_forced) {
        return WeightedCandidate {
            id: tier.as_str().to_string(),
            base_weight: base_weight(tier, danger),
            multipliers: vec![WeightFactor::new("pity.force", forced_weight(tier))],
            final_weight: forced_weight(tier),
        };
    }

    let base = base_weight(tier, danger);
    let mut multipliers = Vec::new();
    if base > 0.0 {
        let streak_mul = streak_multiplier(tier, streak);
        if (streak_mul - 1.0).abs() > f64::EPSILON {
            multipliers.push(WeightFactor::new("streak", streak_mul));
        }
        if let Some(kungfu) = kungfu {
            multipliers.push(WeightFactor::new("kungfu", kungfu.multiplier(tier)));
        }
        if let Some(pity) = pity {
            multipliers.push(WeightFactor::new("pity", pity.multiplier(tier)));
        }
    }
    WeightedCandidate {
        id: tier.as_str().to_string(),
        base_weight: base,
        multipliers,
        final_weight: weight(tier, danger, streak, kungfu, pity),
    }
}

const fn forced_weight(tier: RarityTier) -> f64 {
    match tier {
        RarityTier::Legendary => 1.0,
        _ => 0.0,
    }
}
