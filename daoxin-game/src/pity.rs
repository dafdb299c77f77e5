//! Pity ledger: monotone streak counters and the modifiers derived from them.
//!
//! Every track follows the same shape. A bad outcome bumps the counter by one,
//! the tracked good outcome resets it to zero, and the current value maps to a
//! neutral, soft or hard modifier. `PityState` is a plain `Copy` value: each
//! transition returns a new state and never touches the caller's copy.
use serde::{Deserialize, Serialize};

use crate::alchemy::{PillQuality, QualityNudge};
use crate::config::ConfigError;
use crate::constants::{
    ALCHEMY_PITY_HARD, ALCHEMY_PITY_SOFT, ALCHEMY_SOFT_SHIFT, DUPLICATE_SHARDS_EPIC,
    DUPLICATE_SHARDS_LEGENDARY, DUPLICATE_SHARDS_RARE, LOG_TARGET_PITY, LOOT_PITY_HARD,
    LOOT_PITY_SOFT, LOOT_PITY_SOFT_MUL, SCRIPTURE_PITY_SOFT, SCRIPTURE_PITY_SOFT_MUL,
};
use crate::rarity::RarityTier;
use crate::weights::PityMod;

/// Counters owned by the player's meta-progression record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct PityState {
    /// Brews in a row below the alchemy quality floor.
    #[serde(default)]
    pub alchemy_top: u32,
    /// Exploration rewards in a row without a legendary.
    #[serde(default)]
    pub legend_loot: u32,
    /// Skill-book drops in a row without a legendary.
    #[serde(default)]
    pub legend_kungfu: u32,
    /// Convertible currency; only decreases through a successful exchange.
    #[serde(default)]
    pub kungfu_shards: u32,
}

/// The three streak tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    Alchemy,
    Loot,
    Scripture,
}

impl Track {
    pub const ALL: [Self; 3] = [Self::Alchemy, Self::Loot, Self::Scripture];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Alchemy => "alchemy",
            Self::Loot => "loot",
            Self::Scripture => "scripture",
        }
    }
}

/// Shared update rule: +1 on a bad outcome, 0 on a good one.
#[must_use]
pub const fn advance(counter: u32, good: bool) -> u32 {
    if good { 0 } else { counter.saturating_add(1) }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlchemyPityTuning {
    pub soft: u32,
    pub hard: u32,
    /// Grades added while in the soft range.
    pub soft_shift: u8,
    /// Quality that counts as a good brew; also the hard-pity floor.
    pub floor: PillQuality,
}

impl Default for AlchemyPityTuning {
    fn default() -> Self {
        Self {
            soft: ALCHEMY_PITY_SOFT,
            hard: ALCHEMY_PITY_HARD,
            soft_shift: ALCHEMY_SOFT_SHIFT,
            floor: PillQuality::Superior,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LootPityTuning {
    pub soft: u32,
    pub hard: u32,
    pub soft_mul: f64,
}

impl Default for LootPityTuning {
    fn default() -> Self {
        Self {
            soft: LOOT_PITY_SOFT,
            hard: LOOT_PITY_HARD,
            soft_mul: LOOT_PITY_SOFT_MUL,
        }
    }
}

impl LootPityTuning {
    #[must_use]
    pub const fn forces(&self, pity: u32) -> bool {
        pity >= self.hard
    }
}

/// Skill-book track: soft multiplier only, no guaranteed floor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScripturePityTuning {
    pub soft: u32,
    pub soft_mul: f64,
}

impl Default for ScripturePityTuning {
    fn default() -> Self {
        Self {
            soft: SCRIPTURE_PITY_SOFT,
            soft_mul: SCRIPTURE_PITY_SOFT_MUL,
        }
    }
}

/// Thresholds for every track, kept apart from the algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct PityTuning {
    #[serde(default)]
    pub alchemy: AlchemyPityTuning,
    #[serde(default)]
    pub loot: LootPityTuning,
    #[serde(default)]
    pub scripture: ScripturePityTuning,
}

impl PityTuning {
    /// Validate threshold ordering and multiplier ranges.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a soft threshold exceeds its hard threshold,
    /// a threshold is zero, or a soft multiplier is below 1 or non-finite.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_thresholds(Track::Alchemy, self.alchemy.soft, self.alchemy.hard)?;
        check_thresholds(Track::Loot, self.loot.soft, self.loot.hard)?;
        check_thresholds(Track::Scripture, self.scripture.soft, self.scripture.soft)?;
        check_multiplier("loot.soft_mul", self.loot.soft_mul)?;
        check_multiplier("scripture.soft_mul", self.scripture.soft_mul)?;
        Ok(())
    }
}

fn check_thresholds(track: Track, soft: u32, hard: u32) -> Result<(), ConfigError> {
    if soft == 0 || soft > hard {
        return Err(ConfigError::PityThresholds {
            track: track.as_str(),
            soft,
            hard,
        });
    }
    Ok(())
}

fn check_multiplier(field: &'static str, value: f64) -> Result<(), ConfigError> {
    const MAX_MUL: f64 = 100.0;
    if !value.is_finite() || !(1.0..=MAX_MUL).contains(&value) {
        return Err(ConfigError::RangeViolation {
            field,
            min: 1.0,
            max: MAX_MUL,
            value,
        });
    }
    Ok(())
}

/// Hard-pity check for the loot track with the shipped thresholds.
#[must_use]
pub fn should_force_legend_loot(pity: u32) -> bool {
    LootPityTuning::default().forces(pity)
}

/// Shards granted when a drop of `tier` turns out to be a wasted duplicate.
#[must_use]
pub const fn duplicate_shards(tier: RarityTier) -> u32 {
    match tier {
        RarityTier::Common => 0,
        RarityTier::Rare => DUPLICATE_SHARDS_RARE,
        RarityTier::Epic => DUPLICATE_SHARDS_EPIC,
        RarityTier::Legendary => DUPLICATE_SHARDS_LEGENDARY,
    }
}

impl PityState {
    #[must_use]
    pub const fn counter(&self, track: Track) -> u32 {
        match track {
            Track::Alchemy => self.alchemy_top,
            Track::Loot => self.legend_loot,
            Track::Scripture => self.legend_kungfu,
        }
    }

    /// Apply the shared update rule to one track.
    #[must_use]
    pub fn record(&self, track: Track, good: bool) -> Self {
        let mut next = *self;
        let slot = match track {
            Track::Alchemy => &mut next.alchemy_top,
            Track::Loot => &mut next.legend_loot,
            Track::Scripture => &mut next.legend_kungfu,
        };
        if good && *slot > 0 {
            log::debug!(target: LOG_TARGET_PITY, "{} pity reset after {}", track.as_str(), *slot);
        }
        *slot = advance(*slot, good);
        next
    }

    #[must_use]
    pub fn after_alchemy(&self, quality: PillQuality, tuning: &PityTuning) -> Self {
        self.record(Track::Alchemy, quality >= tuning.alchemy.floor)
    }

    #[must_use]
    pub fn after_loot(&self, tier: RarityTier) -> Self {
        self.record(Track::Loot, tier == RarityTier::Legendary)
    }

    #[must_use]
    pub fn after_scripture(&self, tier: RarityTier) -> Self {
        self.record(Track::Scripture, tier == RarityTier::Legendary)
    }

    #[must_use]
    pub const fn add_shards(&self, amount: u32) -> Self {
        let mut next = *self;
        next.kungfu_shards = next.kungfu_shards.saturating_add(amount);
        next
    }

    #[must_use]
    pub fn alchemy_nudge(&self, tuning: &PityTuning) -> QualityNudge {
        let cfg = &tuning.alchemy;
        if self.alchemy_top >= cfg.hard {
            QualityNudge::Floor(cfg.floor)
        } else if self.alchemy_top >= cfg.soft {
            QualityNudge::Shift(cfg.soft_shift)
        } else {
            QualityNudge::None
        }
    }

    #[must_use]
    pub fn loot_mod(&self, tuning: &PityTuning) -> PityMod {
        let cfg = &tuning.loot;
        if cfg.forces(self.legend_loot) {
            PityMod::ForceLegendary
        } else if self.legend_loot >= cfg.soft {
            PityMod::Scale {
                legendary: cfg.soft_mul,
            }
        } else {
            PityMod::NEUTRAL
        }
    }

    #[must_use]
    pub fn scripture_mod(&self, tuning: &PityTuning) -> PityMod {
        let cfg = &tuning.scripture;
        if self.legend_kungfu >= cfg.soft {
            PityMod::Scale {
                legendary: cfg.soft_mul,
            }
        } else {
            PityMod::NEUTRAL
        }
    }
}
