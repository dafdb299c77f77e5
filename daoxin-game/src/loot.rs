//! Two-stage weighted loot roller.
//!
//! Stage one picks a rarity tier from `weights::tier_weights`; stage two picks
//! an item template inside that tier's pool. Each stage consumes exactly one
//! variate, so every roll costs exactly two draws.
use serde::{Deserialize, Serialize};
use std::hash::Hasher;
use twox_hash::XxHash64;

use crate::config::ConfigError;
use crate::constants::LOG_TARGET_LOOT;
use crate::rarity::{RarityTier, RewardItem, RolledReward};
use crate::rng::UnitRng;
use crate::trace::{EventDecisionTrace, LootTrace, WeightedCandidate};
use crate::weights::{KungfuMod, PityMod, tier_weights, weight_breakdown};

const DEFAULT_EXPLORATION_TABLE: &str = include_str!("../assets/data/exploration.json");
const DEFAULT_SCRIPTURE_TABLE: &str = include_str!("../assets/data/scripture.json");

/// Draws consumed by a single `roll`.
pub const DRAWS_PER_ROLL: u64 = 2;

/// An item template and its selection weight inside a tier pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedItem {
    pub weight: u32,
    pub item: RewardItem,
}

/// Per-tier item pools.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TierPools {
    #[serde(default)]
    pub common: Vec<WeightedItem>,
    #[serde(default)]
    pub rare: Vec<WeightedItem>,
    #[serde(default)]
    pub epic: Vec<WeightedItem>,
    #[serde(default)]
    pub legendary: Vec<WeightedItem>,
}

impl TierPools {
    #[must_use]
    pub fn get(&self, tier: RarityTier) -> &[WeightedItem] {
        match tier {
            RarityTier::Common => &self.common,
            RarityTier::Rare => &self.rare,
            RarityTier::Epic => &self.epic,
            RarityTier::Legendary => &self.legendary,
        }
    }

    fn all(&self) -> impl Iterator<Item = &WeightedItem> {
        RarityTier::ALL.into_iter().flat_map(move |tier| self.get(tier))
    }
}

/// Serialized form of a loot table, validated into `LootTable`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LootTableDef {
    pub id: String,
    pub pools: TierPools,
}

/// Immutable, validated weight table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "LootTableDef", into = "LootTableDef")]
pub struct LootTable {
    id: String,
    pools: TierPools,
    fallback: RewardItem,
}

impl TryFrom<LootTableDef> for LootTable {
    type Error = ConfigError;

    fn try_from(def: LootTableDef) -> Result<Self, Self::Error> {
        Self::new(def.id, def.pools)
    }
}

impl From<LootTable> for LootTableDef {
    fn from(table: LootTable) -> Self {
        Self {
            id: table.id,
            pools: table.pools,
        }
    }
}

impl LootTable {
    /// Build a table, rejecting missing tiers and zero-count items.
    ///
    /// Every tier needs at least one item so the tier picked by the first
    /// stage is always the tier handed back, forced legendaries included.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the table id is blank, a tier pool is empty,
    /// an item has an empty id or a zero count, or no item carries positive
    /// weight.
    pub fn new(id: impl Into<String>, pools: TierPools) -> Result<Self, ConfigError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ConfigError::BlankTableId);
        }
        if let Some(tier) = RarityTier::ALL
            .into_iter()
            .find(|tier| pools.get(*tier).is_empty())
        {
            return Err(ConfigError::EmptyTier { table: id, tier });
        }
        for entry in pools.all() {
            if entry.item.id().trim().is_empty() {
                return Err(ConfigError::BlankItemId { table: id });
            }
            if entry.item.count() == 0 {
                return Err(ConfigError::ZeroCount {
                    table: id,
                    item: entry.item.id().to_string(),
                });
            }
        }
        let fallback = pools
            .all()
            .find(|entry| entry.weight > 0)
            .map(|entry| entry.item.clone())
            .ok_or_else(|| ConfigError::EmptyTable { table: id.clone() })?;
        Ok(Self {
            id,
            pools,
            fallback,
        })
    }

    /// Parse and validate a table from JSON.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Parse` for malformed JSON and the `new` errors for
    /// invalid content.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let def: LootTableDef = serde_json::from_str(json)?;
        Self::try_from(def)
    }

    /// Exploration rewards shipped with the game.
    #[must_use]
    pub fn exploration() -> Self {
        Self::from_json(DEFAULT_EXPLORATION_TABLE)
            .unwrap_or_else(|_| Self::emergency("exploration"))
    }

    /// Skill-book (scripture) drops shipped with the game.
    #[must_use]
    pub fn scripture() -> Self {
        Self::from_json(DEFAULT_SCRIPTURE_TABLE).unwrap_or_else(|_| Self::emergency("scripture"))
    }

    fn emergency(id: &str) -> Self {
        let fallback = RewardItem::Material {
            id: String::from("material.spirit_dust"),
            count: 1,
        };
        let pool = vec![WeightedItem {
            weight: 1,
            item: fallback.clone(),
        }];
        Self {
            id: id.to_string(),
            pools: TierPools {
                common: pool.clone(),
                rare: pool.clone(),
                epic: pool.clone(),
                legendary: pool,
            },
            fallback,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub const fn pools(&self) -> &TierPools {
        &self.pools
    }

    /// Item pool for `tier`; never empty on a constructed table.
    #[must_use]
    pub fn pool_for(&self, tier: RarityTier) -> &[WeightedItem] {
        self.pools.get(tier)
    }

    /// Stable digest of the canonical table, for reports and save metadata.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(self.id.as_bytes());
        if let Ok(bytes) = serde_json::to_vec(&self.pools) {
            hasher.write(&bytes);
        }
        hasher.finish()
    }
}

/// Inputs read from the player/run snapshot for a roll.
#[derive(Debug, Clone, Copy, Default)]
pub struct RollContext<'a> {
    pub danger: u32,
    pub streak: u32,
    pub kungfu: Option<&'a KungfuMod>,
    pub pity: Option<&'a PityMod>,
}

impl<'a> RollContext<'a> {
    #[must_use]
    pub const fn new(danger: u32, streak: u32) -> Self {
        Self {
            danger,
            streak,
            kungfu: None,
            pity: None,
        }
    }

    #[must_use]
    pub const fn with_kungfu(mut self, kungfu: &'a KungfuMod) -> Self {
        self.kungfu = Some(kungfu);
        self
    }

    #[must_use]
    pub const fn with_pity(mut self, pity: &'a PityMod) -> Self {
        self.pity = Some(pity);
        self
    }
}

/// Roll one reward. Consumes exactly `DRAWS_PER_ROLL` variates.
#[must_use]
pub fn roll<R>(table: &LootTable, rng: &mut R, ctx: &RollContext<'_>) -> RolledReward
where
    R: UnitRng + ?Sized,
{
    let tier_draw = rng.next_unit();
    let item_draw = rng.next_unit();
    resolve_draws(table, ctx, tier_draw, item_draw)
}

/// Same draws and outcome as `roll`, plus a decision trace for both stages.
#[must_use]
pub fn roll_with_trace<R>(
    table: &LootTable,
    rng: &mut R,
    ctx: &RollContext<'_>,
) -> (RolledReward, LootTrace)
where
    R: UnitRng + ?Sized,
{
    let tier_draw = rng.next_unit();
    let item_draw = rng.next_unit();
    let reward = resolve_draws(table, ctx, tier_draw, item_draw);

    let candidates: Vec<WeightedCandidate> = RarityTier::ALL
        .iter()
        .map(|tier| weight_breakdown(*tier, ctx.danger, ctx.streak, ctx.kungfu, ctx.pity))
        .collect();
    let tier_total: f64 = candidates.iter().map(|c| c.final_weight).sum();
    let tier_trace = EventDecisionTrace {
        pool_id: format!("{}.tier", table.id()),
        roll: tier_draw,
        scaled_roll: tier_draw * tier_total,
        candidates,
        chosen_id: reward.tier.as_str().to_string(),
    };

    let pool = table.pool_for(reward.tier);
    let item_candidates: Vec<WeightedCandidate> = pool
        .iter()
        .map(|entry| WeightedCandidate {
            id: entry.item.id().to_string(),
            base_weight: f64::from(entry.weight),
            multipliers: Vec::new(),
            final_weight: f64::from(entry.weight),
        })
        .collect();
    let item_total: f64 = item_candidates.iter().map(|c| c.final_weight).sum();
    let item_trace = EventDecisionTrace {
        pool_id: format!("{}.{}", table.id(), reward.tier),
        roll: item_draw,
        scaled_roll: item_draw * item_total,
        candidates: item_candidates,
        chosen_id: reward.item.id().to_string(),
    };

    (
        reward,
        LootTrace {
            tier: tier_trace,
            item: item_trace,
        },
    )
}

fn resolve_draws(
    table: &LootTable,
    ctx: &RollContext<'_>,
    tier_draw: f64,
    item_draw: f64,
) -> RolledReward {
    let weights = tier_weights(ctx.danger, ctx.streak, ctx.kungfu, ctx.pity);
    let tier = pick_index(&weights, tier_draw)
        .and_then(|pick| RarityTier::ALL.get(pick.index).copied())
        .unwrap_or(RarityTier::Common);
    let item = pick_item(table, tier, item_draw);

    log::trace!(
        target: LOG_TARGET_LOOT,
        "roll table={} danger={} streak={} tier={} item={}",
        table.id(),
        ctx.danger,
        ctx.streak,
        tier,
        item.id()
    );
    if ctx.pity.is_some_and(PityMod::is_forced) {
        log::debug!(target: LOG_TARGET_LOOT, "hard pity forced legendary from {}", table.id());
    }

    RolledReward { tier, item }
}

fn pick_item(table: &LootTable, tier: RarityTier, draw: f64) -> RewardItem {
    let pool = table.pool_for(tier);
    let weights: Vec<f64> = pool.iter().map(|entry| f64::from(entry.weight)).collect();
    let index = pick_index(&weights, draw).map_or(0, |pick| pick.index);
    pool.get(index)
        .map_or_else(|| table.fallback.clone(), |entry| entry.item.clone())
}

/// Result of a cumulative-weight selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedPick {
    pub index: usize,
    pub scaled: f64,
}

/// Select the first positive-weight entry whose running total reaches or
/// exceeds `draw × total`. Returns `None` when no entry has positive weight.
#[must_use]
pub fn pick_index(weights: &[f64], draw: f64) -> Option<WeightedPick> {
    let total: f64 = weights.iter().filter(|w| **w > 0.0).sum();
    if total <= 0.0 || !total.is_finite() {
        return None;
    }
    let scaled = draw * total;
    let mut running = 0.0;
    let mut last_positive = None;
    for (index, value) in weights.iter().enumerate() {
        if *value <= 0.0 {
            continue;
        }
        running += value;
        last_positive = Some(index);
        if running >= scaled {
            return Some(WeightedPick { index, scaled });
        }
    }
    last_positive.map(|index| WeightedPick { index, scaled })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{CountingRng, ScriptedRolls};

    fn item(id: &str) -> RewardItem {
        RewardItem::Material {
            id: id.to_string(),
            count: 1,
        }
    }

    fn small_table() -> LootTable {
        LootTable::new(
            "test",
            TierPools {
                common: vec![
                    WeightedItem { weight: 3, item: item("c1") },
                    WeightedItem { weight: 1, item: item("c2") },
                ],
                rare: vec![WeightedItem { weight: 1, item: item("r1") }],
                epic: vec![WeightedItem { weight: 1, item: item("e1") }],
                legendary: vec![
                    WeightedItem { weight: 1, item: item("l1") },
                    WeightedItem { weight: 1, item: item("l2") },
                ],
            },
        )
        .unwrap()
    }

    #[test]
    fn pick_index_uses_cumulative_reach() {
        let weights = [100.0, 60.0, 30.0, 5.0];
        assert_eq!(pick_index(&weights, 0.0).unwrap().index, 0);
        assert_eq!(pick_index(&weights, 0.5).unwrap().index, 0);
        assert_eq!(pick_index(&weights, 0.6).unwrap().index, 1);
        assert_eq!(pick_index(&weights, 0.99).unwrap().index, 3);
        assert!(pick_index(&[0.0, 0.0], 0.5).is_none());
    }

    #[test]
    fn pick_index_skips_zero_weight_entries() {
        let weights = [0.0, 0.0, 0.0, 1.0];
        assert_eq!(pick_index(&weights, 0.0).unwrap().index, 3);
        assert_eq!(pick_index(&weights, 0.999).unwrap().index, 3);
    }

    #[test]
    fn roll_consumes_two_draws_on_every_path() {
        let table = small_table();
        let force = PityMod::ForceLegendary;
        let contexts = [
            RollContext::new(0, 0),
            RollContext::new(90, 9),
            RollContext::new(10, 0).with_pity(&force),
        ];
        for ctx in contexts {
            let mut rng = CountingRng::wrap(ScriptedRolls::new(vec![0.3, 0.7]));
            let _ = roll(&table, &mut rng, &ctx);
            assert_eq!(rng.draws(), DRAWS_PER_ROLL);
        }
    }

    #[test]
    fn tables_missing_a_tier_are_rejected() {
        let common_only = TierPools {
            common: vec![WeightedItem { weight: 1, item: item("dust") }],
            ..TierPools::default()
        };
        assert!(matches!(
            LootTable::new("custom", common_only),
            Err(ConfigError::EmptyTier { tier: RarityTier::Rare, .. })
        ));

        let mut no_legendary = small_table().pools().clone();
        no_legendary.legendary.clear();
        let err = LootTable::new("custom", no_legendary).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::EmptyTier { tier: RarityTier::Legendary, .. }
        ));
        assert!(err.to_string().contains("legendary"));
    }

    #[test]
    fn forced_rolls_keep_the_selected_tier() {
        let table = small_table();
        let force = PityMod::ForceLegendary;
        for danger in [0, 45, 90] {
            for draws in [[0.0, 0.0], [0.5, 0.5], [0.99, 0.99]] {
                let mut rng = ScriptedRolls::new(draws.to_vec());
                let ctx = RollContext::new(danger, 0).with_pity(&force);
                let reward = roll(&table, &mut rng, &ctx);
                assert_eq!(reward.tier, RarityTier::Legendary);
                assert!(reward.item.id().starts_with('l'));
            }
        }
    }

    #[test]
    fn every_roll_reports_the_pool_it_drew_from() {
        let table = small_table();
        for danger in [0, 35, 60, 75, 95] {
            for draw in [0.0, 0.3, 0.6, 0.9, 0.999] {
                let mut rng = ScriptedRolls::new(vec![draw, draw]);
                let reward = roll(&table, &mut rng, &RollContext::new(danger, 8));
                assert!(
                    table
                        .pool_for(reward.tier)
                        .iter()
                        .any(|entry| entry.item == reward.item)
                );
            }
        }
    }

    #[test]
    fn zero_weight_items_fall_back_to_first_item() {
        let table = LootTable::new(
            "zeroes",
            TierPools {
                common: vec![
                    WeightedItem { weight: 0, item: item("z1") },
                    WeightedItem { weight: 0, item: item("z2") },
                ],
                rare: vec![WeightedItem { weight: 5, item: item("r") }],
                epic: vec![WeightedItem { weight: 1, item: item("e") }],
                legendary: vec![WeightedItem { weight: 1, item: item("l") }],
            },
        )
        .unwrap();
        let mut rng = ScriptedRolls::new(vec![0.0, 0.9]);
        let reward = roll(&table, &mut rng, &RollContext::new(0, 0));
        assert_eq!(reward.tier, RarityTier::Common);
        assert_eq!(reward.item.id(), "z1");
    }

    #[test]
    fn trace_matches_plain_roll() {
        let table = LootTable::exploration();
        let kungfu = KungfuMod {
            loot_rare_mul: 1.4,
            ..KungfuMod::default()
        };
        let ctx = RollContext::new(77, 5).with_kungfu(&kungfu);
        for draws in [[0.1, 0.2], [0.55, 0.9], [0.99, 0.01]] {
            let mut plain = ScriptedRolls::new(draws.to_vec());
            let mut traced = CountingRng::wrap(ScriptedRolls::new(draws.to_vec()));
            let expected = roll(&table, &mut plain, &ctx);
            let (reward, trace) = roll_with_trace(&table, &mut traced, &ctx);
            assert_eq!(reward, expected);
            assert_eq!(traced.draws(), DRAWS_PER_ROLL);
            assert_eq!(trace.tier.chosen_id, reward.tier.as_str());
            assert_eq!(trace.item.chosen_id, reward.item.id());
            assert_eq!(trace.tier.candidates.len(), 4);
        }
    }

    #[test]
    fn rolled_items_are_owned_copies() {
        let table = small_table();
        let mut rng = ScriptedRolls::new(vec![0.0, 0.0]);
        let mut reward = roll(&table, &mut rng, &RollContext::new(0, 0));
        if let RewardItem::Material { count, .. } = &mut reward.item {
            *count = 99;
        }
        assert_eq!(table.pools().common[0].item.count(), 1);
    }

    #[test]
    fn invalid_tables_are_rejected() {
        assert!(matches!(
            LootTable::new("", TierPools::default()),
            Err(ConfigError::BlankTableId)
        ));
        assert!(matches!(
            LootTable::new("empty", TierPools::default()),
            Err(ConfigError::EmptyTier { tier: RarityTier::Common, .. })
        ));
        let weightless = WeightedItem { weight: 0, item: item("w") };
        let all_zero = TierPools {
            common: vec![weightless.clone()],
            rare: vec![weightless.clone()],
            epic: vec![weightless.clone()],
            legendary: vec![weightless],
        };
        assert!(matches!(
            LootTable::new("weightless", all_zero),
            Err(ConfigError::EmptyTable { .. })
        ));
        let mut zero = small_table().pools().clone();
        zero.common[0].item = RewardItem::Fragment {
            id: String::from("f"),
            count: 0,
        };
        assert!(matches!(
            LootTable::new("zero", zero),
            Err(ConfigError::ZeroCount { .. })
        ));
        assert!(matches!(
            LootTable::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn shipped_tables_parse_and_fingerprint_stably() {
        let exploration = LootTable::from_json(DEFAULT_EXPLORATION_TABLE).unwrap();
        let scripture = LootTable::from_json(DEFAULT_SCRIPTURE_TABLE).unwrap();
        assert_eq!(exploration.id(), "exploration");
        assert_eq!(scripture.id(), "scripture");
        for tier in RarityTier::ALL {
            assert!(!exploration.pools().get(tier).is_empty());
            assert!(
                scripture
                    .pools()
                    .get(tier)
                    .iter()
                    .all(|entry| matches!(entry.item, RewardItem::SkillBook { .. }))
            );
        }
        assert_eq!(exploration.fingerprint(), LootTable::exploration().fingerprint());
        assert_ne!(exploration.fingerprint(), scripture.fingerprint());
    }

    #[test]
    fn table_serde_roundtrip_keeps_validation() {
        let table = small_table();
        let json = serde_json::to_string(&table).unwrap();
        let back: LootTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
        let bad = r#"{"id":"bad","pools":{}}"#;
        assert!(serde_json::from_str::<LootTable>(bad).is_err());
    }
}
