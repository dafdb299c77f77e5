//! Rarity tiers and reward items.
use serde::{Deserialize, Serialize};

/// Ordered rarity ladder. Ordering is load-bearing: "at least X" checks and
/// the highest-drop selection rely on `Ord`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum RarityTier {
    #[default]
    Common,
    Rare,
    Epic,
    Legendary,
}

impl RarityTier {
    /// Every tier in ascending order.
    pub const ALL: [Self; 4] = [Self::Common, Self::Rare, Self::Epic, Self::Legendary];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Common => 0,
            Self::Rare => 1,
            Self::Epic => 2,
            Self::Legendary => 3,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
        }
    }

    #[must_use]
    pub fn at_least(self, floor: Self) -> bool {
        self >= floor
    }

    /// Highest tier among several simultaneous drops.
    #[must_use]
    pub fn highest<I>(tiers: I) -> Option<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        tiers.into_iter().max()
    }
}

impl std::fmt::Display for RarityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Category of a reward item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardCategory {
    Material,
    Fragment,
    CurrencyPack,
    RelicFragment,
    SkillBook,
}

/// A concrete reward handed to the caller, who merges it into inventory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RewardItem {
    Material { id: String, count: u32 },
    Fragment { id: String, count: u32 },
    CurrencyPack { id: String, count: u32 },
    RelicFragment { id: String, count: u32 },
    SkillBook { id: String, count: u32 },
}

impl RewardItem {
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Material { id, .. }
            | Self::Fragment { id, .. }
            | Self::CurrencyPack { id, .. }
            | Self::RelicFragment { id, .. }
            | Self::SkillBook { id, .. } => id,
        }
    }

    #[must_use]
    pub const fn count(&self) -> u32 {
        match self {
            Self::Material { count, .. }
            | Self::Fragment { count, .. }
            | Self::CurrencyPack { count, .. }
            | Self::RelicFragment { count, .. }
            | Self::SkillBook { count, .. } => *count,
        }
    }

    #[must_use]
    pub const fn category(&self) -> RewardCategory {
        match self {
            Self::Material { .. } => RewardCategory::Material,
            Self::Fragment { .. } => RewardCategory::Fragment,
            Self::CurrencyPack { .. } => RewardCategory::CurrencyPack,
            Self::RelicFragment { .. } => RewardCategory::RelicFragment,
            Self::SkillBook { .. } => RewardCategory::SkillBook,
        }
    }

    /// Whether this reward can ever be a duplicate that converts into shards.
    #[must_use]
    pub const fn is_collectible(&self) -> bool {
        matches!(self, Self::RelicFragment { .. } | Self::SkillBook { .. })
    }
}

/// A rolled reward together with the tier it was drawn from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolledReward {
    pub tier: RarityTier,
    pub item: RewardItem,
}
