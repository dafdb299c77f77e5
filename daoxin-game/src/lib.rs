//! Daoxin Reward Engine
//!
//! Platform-agnostic reward and progression logic for the Daoxin cultivation RPG:
//! danger-keyed loot rolls, pity tracks, the shard exchange and the final trial.
//! Every operation takes owned snapshots plus an injected random source and
//! returns new values; nothing here performs I/O or keeps hidden state.

pub mod alchemy;
pub mod config;
pub mod constants;
pub mod exchange;
pub mod loot;
pub mod numbers;
pub mod pity;
pub mod rarity;
pub mod rng;
pub mod trace;
pub mod trial;
pub mod weights;

// Re-export commonly used types
pub use alchemy::{BrewOutcome, PillQuality, QualityNudge, brew_outcome, roll_pill_quality};
pub use config::{BuiltinConfig, ConfigError, ConfigLoader, EngineConfig, JsonConfig};
pub use exchange::{ShardExchange, ShardPrices, affordable_tiers, spend};
pub use loot::{
    DRAWS_PER_ROLL, LootTable, RollContext, TierPools, WeightedItem, pick_index, roll,
    roll_with_trace,
};
pub use pity::{
    PityState, PityTuning, Track, advance, duplicate_shards, should_force_legend_loot,
};
pub use rarity::{RarityTier, RewardCategory, RewardItem, RolledReward};
pub use rng::{CountingRng, RngBundle, ScriptedRolls, UnitRng};
pub use trace::{EventDecisionTrace, LootTrace, WeightFactor, WeightedCandidate};
pub use trial::{
    EndingId, EndingReward, SacrificeKind, StepOutcome, StepRecord, TrialAction, TrialError,
    TrialLog, TrialPolicy, TrialPurse, TrialRun, TrialSnapshot, TrialState, TrialTuning,
    available_actions, begin_trial, classify_ending, dmg_base, resolve_action, run_trial,
};
pub use weights::{KungfuMod, PityMod, tier_weights, weight};

/// A loot roll together with the ledger it leaves behind.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LootDrop {
    pub reward: RolledReward,
    /// Hard pity decided this roll.
    pub forced: bool,
    pub pity: PityState,
}

/// Main entry point tying the reward modules to one validated configuration.
#[derive(Debug, Clone, Default)]
pub struct RewardEngine {
    config: EngineConfig,
}

impl RewardEngine {
    /// Create an engine from an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if any tunable is out of range.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Create an engine from a platform loader.
    ///
    /// # Errors
    ///
    /// Returns an error if the loader fails or the loaded configuration is invalid.
    pub fn from_loader<L>(loader: &L) -> anyhow::Result<Self>
    where
        L: ConfigLoader,
    {
        let config = loader.load_engine_config()?;
        Ok(Self::new(config)?)
    }

    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Roll the exploration table with the loot pity applied, then settle the ledger.
    #[must_use]
    pub fn roll_exploration<R>(
        &self,
        pity: &PityState,
        danger: u32,
        streak: u32,
        kungfu: Option<&KungfuMod>,
        rng: &mut R,
    ) -> LootDrop
    where
        R: UnitRng + ?Sized,
    {
        let pity_mod = pity.loot_mod(&self.config.pity);
        let ctx = RollContext {
            danger,
            streak,
            kungfu,
            pity: Some(&pity_mod),
        };
        let reward = roll(&self.config.exploration, rng, &ctx);
        LootDrop {
            pity: Self::settle_loot(pity, &reward),
            forced: pity_mod.is_forced(),
            reward,
        }
    }

    /// Roll the skill-book table with the scripture pity applied.
    #[must_use]
    pub fn roll_scripture<R>(
        &self,
        pity: &PityState,
        danger: u32,
        streak: u32,
        kungfu: Option<&KungfuMod>,
        rng: &mut R,
    ) -> LootDrop
    where
        R: UnitRng + ?Sized,
    {
        let pity_mod = pity.scripture_mod(&self.config.pity);
        let ctx = RollContext {
            danger,
            streak,
            kungfu,
            pity: Some(&pity_mod),
        };
        let reward = roll(&self.config.scripture, rng, &ctx);
        LootDrop {
            pity: pity.after_scripture(reward.tier),
            forced: false,
            reward,
        }
    }

    /// Loot-track transition for a reward the caller rolled itself.
    ///
    /// Independent of configuration: only legendary counts as a good roll.
    #[must_use]
    pub fn settle_loot(pity: &PityState, rolled: &RolledReward) -> PityState {
        pity.after_loot(rolled.tier)
    }

    /// Credit shards for a drop the player already owns.
    #[must_use]
    pub fn record_duplicate(pity: &PityState, tier: RarityTier) -> PityState {
        pity.add_shards(duplicate_shards(tier))
    }

    /// Brew one pill at `mastery`, applying the alchemy pity.
    #[must_use]
    pub fn brew<R>(&self, pity: &PityState, mastery: u32, rng: &mut R) -> BrewOutcome
    where
        R: UnitRng + ?Sized,
    {
        let rolled = roll_pill_quality(rng, mastery);
        brew_outcome(rolled, pity, &self.config.pity)
    }

    #[must_use]
    pub fn spend_shards(&self, pity: &PityState, tier: RarityTier) -> ShardExchange {
        spend(pity, tier, &self.config.prices)
    }

    #[must_use]
    pub fn begin_trial(&self, snapshot: &TrialSnapshot) -> TrialState {
        begin_trial(snapshot)
    }

    /// Resolve one trial action with the configured tuning.
    ///
    /// # Errors
    ///
    /// Returns `TrialError` for an unaffordable sacrifice or a concluded trial.
    pub fn trial_step<R>(
        &self,
        state: &TrialState,
        action: TrialAction,
        purse: &TrialPurse,
        rng: &mut R,
    ) -> Result<StepOutcome, TrialError>
    where
        R: UnitRng + ?Sized,
    {
        self.config.trial.resolve(state, action, purse, rng)
    }

    /// Play a whole trial with `policy`.
    ///
    /// # Errors
    ///
    /// Returns `TrialError::Unaffordable` if the policy picks an unaffordable sacrifice.
    pub fn run_trial<P, R>(
        &self,
        snapshot: &TrialSnapshot,
        purse: TrialPurse,
        policy: &mut P,
        rng: &mut R,
    ) -> Result<TrialRun, TrialError>
    where
        P: TrialPolicy + ?Sized,
        R: UnitRng + ?Sized,
    {
        run_trial(snapshot, purse, &self.config.trial, policy, rng)
    }
}
