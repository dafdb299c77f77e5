//! Shard exchange: turn banked shards into a guaranteed rarity.
use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::constants::{LOG_TARGET_PITY, SHARD_PRICE_EPIC, SHARD_PRICE_LEGENDARY, SHARD_PRICE_RARE};
use crate::pity::PityState;
use crate::rarity::RarityTier;

/// Fixed shard price per purchasable rarity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShardPrices {
    pub rare: u32,
    pub epic: u32,
    pub legendary: u32,
}

impl Default for ShardPrices {
    fn default() -> Self {
        Self {
            rare: SHARD_PRICE_RARE,
            epic: SHARD_PRICE_EPIC,
            legendary: SHARD_PRICE_LEGENDARY,
        }
    }
}

impl ShardPrices {
    /// Price for `tier`, or `None` when the tier cannot be bought.
    #[must_use]
    pub const fn price(&self, tier: RarityTier) -> Option<u32> {
        match tier {
            RarityTier::Common => None,
            RarityTier::Rare => Some(self.rare),
            RarityTier::Epic => Some(self.epic),
            RarityTier::Legendary => Some(self.legendary),
        }
    }

    /// # Errors
    ///
    /// Returns `ConfigError::PricesNotIncreasing` unless
    /// `0 < rare < epic < legendary`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rare == 0 || self.rare >= self.epic || self.epic >= self.legendary {
            return Err(ConfigError::PricesNotIncreasing {
                rare: self.rare,
                epic: self.epic,
                legendary: self.legendary,
            });
        }
        Ok(())
    }
}

/// Result of a spend attempt. On failure `ledger` equals the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardExchange {
    pub success: bool,
    pub ledger: PityState,
    pub cost: u32,
}

/// Spend shards on a guaranteed `tier` reward. All or nothing.
///
/// The caller grants the reward itself when `success` is set.
#[must_use]
pub fn spend(ledger: &PityState, tier: RarityTier, prices: &ShardPrices) -> ShardExchange {
    let Some(cost) = prices.price(tier) else {
        return ShardExchange {
            success: false,
            ledger: *ledger,
            cost: 0,
        };
    };
    let Some(balance) = ledger.kungfu_shards.checked_sub(cost) else {
        log::debug!(
            target: LOG_TARGET_PITY,
            "shard exchange refused: {} costs {cost}, balance {}",
            tier,
            ledger.kungfu_shards
        );
        return ShardExchange {
            success: false,
            ledger: *ledger,
            cost,
        };
    };
    ShardExchange {
        success: true,
        ledger: PityState {
            kungfu_shards: balance,
            ..*ledger
        },
        cost,
    }
}

/// Tiers the current balance can buy, ascending.
#[must_use]
pub fn affordable_tiers(ledger: &PityState, prices: &ShardPrices) -> Vec<RarityTier> {
    RarityTier::ALL
        .into_iter()
        .filter(|tier| {
            prices
                .price(*tier)
                .is_some_and(|cost| cost <= ledger.kungfu_shards)
        })
        .collect()
}
