//! Centralized balance and tuning constants for Daoxin reward logic.
//!
//! These values define the deterministic math for loot, pity, shards and the
//! final trial. Tunable structs (`PityTuning`, `ShardPrices`, `TrialTuning`)
//! take their defaults from here so balance changes go through review.

// Danger bands -------------------------------------------------------------
/// Lower bounds of the five danger bands, ascending.
pub(crate) const DANGER_BAND_FLOORS: [u32; 5] = [0, 30, 50, 70, 85];
/// Base weights per band, columns ordered common/rare/epic/legendary.
pub(crate) const DANGER_BAND_WEIGHTS: [[f64; 4]; 5] = [
    [100.0, 20.0, 0.0, 0.0],
    [100.0, 30.0, 8.0, 0.0],
    [100.0, 40.0, 15.0, 0.0],
    [100.0, 50.0, 22.0, 2.0],
    [100.0, 60.0, 30.0, 5.0],
];

// Streak bonuses -----------------------------------------------------------
pub(crate) const STREAK_WARM: u32 = 3;
pub(crate) const STREAK_HOT: u32 = 5;
pub(crate) const STREAK_BLAZING: u32 = 8;
pub(crate) const STREAK_WARM_RARE_MUL: f64 = 1.15;
pub(crate) const STREAK_HOT_RARE_MUL: f64 = 1.30;
pub(crate) const STREAK_HOT_HIGH_MUL: f64 = 1.25;
pub(crate) const STREAK_BLAZING_EPIC_MUL: f64 = 1.50;
pub(crate) const STREAK_BLAZING_LEGEND_MUL: f64 = 1.60;

// Pity tracks --------------------------------------------------------------
pub(crate) const ALCHEMY_PITY_SOFT: u32 = 6;
pub(crate) const ALCHEMY_PITY_HARD: u32 = 10;
pub(crate) const ALCHEMY_SOFT_SHIFT: u8 = 1;
pub(crate) const LOOT_PITY_SOFT: u32 = 12;
pub(crate) const LOOT_PITY_HARD: u32 = 12;
pub(crate) const LOOT_PITY_SOFT_MUL: f64 = 1.5;
pub(crate) const SCRIPTURE_PITY_SOFT: u32 = 10;
pub(crate) const SCRIPTURE_PITY_SOFT_MUL: f64 = 1.5;

// Shard economy ------------------------------------------------------------
pub(crate) const SHARD_PRICE_RARE: u32 = 40;
pub(crate) const SHARD_PRICE_EPIC: u32 = 120;
pub(crate) const SHARD_PRICE_LEGENDARY: u32 = 360;
pub(crate) const DUPLICATE_SHARDS_RARE: u32 = 2;
pub(crate) const DUPLICATE_SHARDS_EPIC: u32 = 8;
pub(crate) const DUPLICATE_SHARDS_LEGENDARY: u32 = 30;

// Final trial --------------------------------------------------------------
pub(crate) const TRIAL_STEPS: u8 = 3;
pub(crate) const TRIAL_THREAT_BASE: i32 = 20;
pub(crate) const TRIAL_THREAT_PER_REALM: i32 = 10;
pub(crate) const TRIAL_THREAT_PER_DANGER_DECADE: i32 = 2;
pub(crate) const TRIAL_THREAT_PER_CHAIN: i32 = 5;
pub(crate) const TRIAL_THREAT_PER_PILL_RANK: i32 = 3;
pub(crate) const TRIAL_RESOLVE_HP_RATIO: f64 = 0.3;
pub(crate) const TRIAL_RESOLVE_PER_REALM: i32 = 10;
pub(crate) const TRIAL_THREAT_DAMAGE_RATIO: f64 = 0.12;
pub(crate) const TRIAL_STEP_DAMAGE: i32 = 2;
pub(crate) const TRIAL_STEADY_RESOLVE_RATIO: f64 = 0.1;
pub(crate) const TRIAL_STEADY_RESOLVE_GAIN: i32 = 2;
pub(crate) const TRIAL_GAMBLE_SUCCESS_RATE: f64 = 0.55;
pub(crate) const TRIAL_GAMBLE_WIN_DAMAGE: f64 = 0.6;
pub(crate) const TRIAL_GAMBLE_LOSS_DAMAGE: f64 = 1.4;
pub(crate) const TRIAL_GAMBLE_WIN_RESOLVE: i32 = 6;
pub(crate) const TRIAL_ASCEND_SCORE: i32 = 20;
pub(crate) const TRIAL_RETIRE_SCORE: i32 = -5;

// Sacrifices: (cost, shield, heal, resolve) --------------------------------
pub(crate) const SACRIFICE_STONES: (u32, i32, i32, i32) = (60, 3, 0, 4);
pub(crate) const SACRIFICE_PILL: (u32, i32, i32, i32) = (1, 2, 15, 0);
pub(crate) const SACRIFICE_TALISMAN: (u32, i32, i32, i32) = (1, 6, 0, 1);
pub(crate) const SACRIFICE_HERBS: (u32, i32, i32, i32) = (3, 1, 6, 2);

// Ending rewards: (spirit stones, shards) ----------------------------------
pub(crate) const ENDING_REWARD_ASCEND: (u32, u32) = (600, 60);
pub(crate) const ENDING_REWARD_RETIRE: (u32, u32) = (250, 20);
pub(crate) const ENDING_REWARD_DEMON: (u32, u32) = (300, 40);
pub(crate) const ENDING_REWARD_DEAD: (u32, u32) = (0, 5);

// Logging targets ----------------------------------------------------------
pub(crate) const LOG_TARGET_LOOT: &str = "daoxin::loot";
pub(crate) const LOG_TARGET_PITY: &str = "daoxin::pity";
pub(crate) const LOG_TARGET_TRIAL: &str = "daoxin::trial";
