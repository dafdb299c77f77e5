//! Final trial: a three-step resolve-versus-threat encounter.
//!
//! `threat` is fixed when the encounter begins. Each step the player picks an
//! action, takes damage, and gains resolve. Hit points at or below zero end
//! the trial at once; otherwise the ending is read from `resolve - threat`
//! after the third step.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use thiserror::Error;

use crate::alchemy::PillQuality;
use crate::config::ConfigError;
use crate::constants::{
    ENDING_REWARD_ASCEND, ENDING_REWARD_DEAD, ENDING_REWARD_DEMON, ENDING_REWARD_RETIRE,
    LOG_TARGET_TRIAL, SACRIFICE_HERBS, SACRIFICE_PILL, SACRIFICE_STONES, SACRIFICE_TALISMAN,
    TRIAL_ASCEND_SCORE, TRIAL_GAMBLE_LOSS_DAMAGE, TRIAL_GAMBLE_SUCCESS_RATE,
    TRIAL_GAMBLE_WIN_DAMAGE, TRIAL_GAMBLE_WIN_RESOLVE, TRIAL_RESOLVE_HP_RATIO,
    TRIAL_RESOLVE_PER_REALM, TRIAL_RETIRE_SCORE, TRIAL_STEADY_RESOLVE_GAIN,
    TRIAL_STEADY_RESOLVE_RATIO, TRIAL_STEP_DAMAGE, TRIAL_STEPS, TRIAL_THREAT_BASE,
    TRIAL_THREAT_DAMAGE_RATIO, TRIAL_THREAT_PER_CHAIN, TRIAL_THREAT_PER_DANGER_DECADE,
    TRIAL_THREAT_PER_PILL_RANK, TRIAL_THREAT_PER_REALM,
};
use crate::numbers::{round_f64_to_i32, u32_to_i32};
use crate::rng::UnitRng;

/// Read-only view of run progress taken when the trial opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TrialSnapshot {
    pub realm: u32,
    pub danger: u32,
    pub milestone_chains: u32,
    /// Best pill ever brewed this run, if any.
    #[serde(default)]
    pub best_pill: Option<PillQuality>,
    pub hp: i32,
    pub max_hp: i32,
}

/// In-progress encounter. `step` is 1-based; `TRIAL_STEPS + 1` means done.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialState {
    pub step: u8,
    pub threat: i32,
    pub resolve: i32,
    pub hp: i32,
    pub max_hp: i32,
}

impl TrialState {
    #[must_use]
    pub const fn is_concluded(&self) -> bool {
        self.hp <= 0 || self.step > TRIAL_STEPS
    }

    /// Ending, once the encounter is over.
    #[must_use]
    pub fn ending(&self) -> Option<EndingId> {
        self.is_concluded()
            .then(|| classify_ending(self.hp, self.resolve, self.threat))
    }

    #[must_use]
    pub const fn score(&self) -> i32 {
        self.resolve.saturating_sub(self.threat)
    }
}

/// Consumables the player can burn during the trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct TrialPurse {
    #[serde(default)]
    pub spirit_stones: u32,
    #[serde(default)]
    pub pills: u32,
    #[serde(default)]
    pub talismans: u32,
    #[serde(default)]
    pub herbs: u32,
}

impl TrialPurse {
    #[must_use]
    pub const fn holding(&self, kind: SacrificeKind) -> u32 {
        match kind {
            SacrificeKind::SpiritStones => self.spirit_stones,
            SacrificeKind::Pill => self.pills,
            SacrificeKind::Talisman => self.talismans,
            SacrificeKind::Herbs => self.herbs,
        }
    }

    #[must_use]
    pub const fn can_afford(&self, kind: SacrificeKind) -> bool {
        self.holding(kind) >= kind.cost()
    }

    /// Purse after paying for `kind`, or `None` if it cannot be paid.
    #[must_use]
    pub fn pay(&self, kind: SacrificeKind) -> Option<Self> {
        let remaining = self.holding(kind).checked_sub(kind.cost())?;
        let mut next = *self;
        match kind {
            SacrificeKind::SpiritStones => next.spirit_stones = remaining,
            SacrificeKind::Pill => next.pills = remaining,
            SacrificeKind::Talisman => next.talismans = remaining,
            SacrificeKind::Herbs => next.herbs = remaining,
        }
        Some(next)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SacrificeKind {
    SpiritStones,
    Pill,
    Talisman,
    Herbs,
}

impl SacrificeKind {
    pub const ALL: [Self; 4] = [Self::SpiritStones, Self::Pill, Self::Talisman, Self::Herbs];

    const fn profile(self) -> (u32, i32, i32, i32) {
        match self {
            Self::SpiritStones => SACRIFICE_STONES,
            Self::Pill => SACRIFICE_PILL,
            Self::Talisman => SACRIFICE_TALISMAN,
            Self::Herbs => SACRIFICE_HERBS,
        }
    }

    #[must_use]
    pub const fn cost(self) -> u32 {
        self.profile().0
    }

    /// Flat damage reduction.
    #[must_use]
    pub const fn shield(self) -> i32 {
        self.profile().1
    }

    #[must_use]
    pub const fn heal(self) -> i32 {
        self.profile().2
    }

    #[must_use]
    pub const fn resolve_bonus(self) -> i32 {
        self.profile().3
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SpiritStones => "spirit_stones",
            Self::Pill => "pill",
            Self::Talisman => "talisman",
            Self::Herbs => "herbs",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "action", content = "kind", rename_all = "snake_case")]
pub enum TrialAction {
    Steady,
    Gamble,
    Sacrifice(SacrificeKind),
}

impl TrialAction {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Steady => "steady",
            Self::Gamble => "gamble",
            Self::Sacrifice(kind) => kind.as_str(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndingId {
    Ascend,
    Retire,
    Demon,
    Dead,
}

impl EndingId {
    pub const ALL: [Self; 4] = [Self::Ascend, Self::Retire, Self::Demon, Self::Dead];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ascend => "ascend",
            Self::Retire => "retire",
            Self::Demon => "demon",
            Self::Dead => "dead",
        }
    }

    /// Permanent reward granted for reaching this ending.
    #[must_use]
    pub const fn reward(self) -> EndingReward {
        let ((spirit_stones, shards), unlocks_demon_path) = match self {
            Self::Ascend => (ENDING_REWARD_ASCEND, false),
            Self::Retire => (ENDING_REWARD_RETIRE, false),
            Self::Demon => (ENDING_REWARD_DEMON, true),
            Self::Dead => (ENDING_REWARD_DEAD, false),
        };
        EndingReward {
            ending: self,
            spirit_stones,
            shards,
            unlocks_demon_path,
        }
    }
}

impl std::fmt::Display for EndingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndingReward {
    pub ending: EndingId,
    pub spirit_stones: u32,
    pub shards: u32,
    pub unlocks_demon_path: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TrialError {
    #[error("cannot afford {kind:?}: need {needed}, holding {held}")]
    Unaffordable {
        kind: SacrificeKind,
        needed: u32,
        held: u32,
    },
    #[error("trial already concluded at step {step} with hp {hp}")]
    Concluded { step: u8, hp: i32 },
}

/// Tunable trial knobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrialTuning {
    pub gamble_success_rate: f64,
}

impl Default for TrialTuning {
    fn default() -> Self {
        Self {
            gamble_success_rate: TRIAL_GAMBLE_SUCCESS_RATE,
        }
    }
}

impl TrialTuning {
    /// # Errors
    ///
    /// Returns `ConfigError::RangeViolation` when the success rate is outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let rate = self.gamble_success_rate;
        if !(0.0..=1.0).contains(&rate) {
            return Err(ConfigError::RangeViolation {
                field: "trial.gamble_success_rate",
                min: 0.0,
                max: 1.0,
                value: rate,
            });
        }
        Ok(())
    }
}

/// Threat contributed by the best pill; none and flawed count as zero.
fn pill_rank(best: Option<PillQuality>) -> i32 {
    best.map_or(0, |quality| i32::from(quality.rank()))
}

#[must_use]
pub fn threat_for(snapshot: &TrialSnapshot) -> i32 {
    TRIAL_THREAT_BASE
        .saturating_add(TRIAL_THREAT_PER_REALM.saturating_mul(u32_to_i32(snapshot.realm)))
        .saturating_add(
            TRIAL_THREAT_PER_DANGER_DECADE.saturating_mul(u32_to_i32(snapshot.danger / 10)),
        )
        .saturating_add(
            TRIAL_THREAT_PER_CHAIN.saturating_mul(u32_to_i32(snapshot.milestone_chains)),
        )
        .saturating_add(TRIAL_THREAT_PER_PILL_RANK * pill_rank(snapshot.best_pill))
}

#[must_use]
pub fn initial_resolve(snapshot: &TrialSnapshot) -> i32 {
    round_f64_to_i32(f64::from(snapshot.max_hp) * TRIAL_RESOLVE_HP_RATIO)
        .saturating_add(TRIAL_RESOLVE_PER_REALM.saturating_mul(u32_to_i32(snapshot.realm)))
}

/// Open the encounter at step 1.
#[must_use]
pub fn begin_trial(snapshot: &TrialSnapshot) -> TrialState {
    let max_hp = snapshot.max_hp.max(1);
    let state = TrialState {
        step: 1,
        threat: threat_for(snapshot),
        resolve: initial_resolve(snapshot),
        hp: snapshot.hp.min(max_hp),
        max_hp,
    };
    log::debug!(
        target: LOG_TARGET_TRIAL,
        "trial begins: threat {} resolve {} hp {}/{}",
        state.threat,
        state.resolve,
        state.hp,
        state.max_hp
    );
    state
}

/// Damage baseline for `step` (1-based).
#[must_use]
pub fn dmg_base(threat: i32, step: u8) -> i32 {
    round_f64_to_i32(f64::from(threat) * TRIAL_THREAT_DAMAGE_RATIO)
        .saturating_add(TRIAL_STEP_DAMAGE * i32::from(step))
}

#[must_use]
pub fn steady_damage(base: i32, resolve: i32) -> i32 {
    let soak = round_f64_to_i32(f64::from(resolve) * TRIAL_STEADY_RESOLVE_RATIO);
    base.saturating_sub(soak).max(1)
}

#[must_use]
pub fn gamble_damage(base: i32, won: bool) -> i32 {
    let ratio = if won {
        TRIAL_GAMBLE_WIN_DAMAGE
    } else {
        TRIAL_GAMBLE_LOSS_DAMAGE
    };
    round_f64_to_i32(f64::from(base) * ratio).max(1)
}

#[must_use]
pub fn sacrifice_damage(base: i32, kind: SacrificeKind) -> i32 {
    base.saturating_sub(kind.shield()).max(1)
}

/// Pure ending classifier. Death wins over any score.
#[must_use]
pub fn classify_ending(hp: i32, resolve: i32, threat: i32) -> EndingId {
    if hp <= 0 {
        return EndingId::Dead;
    }
    let score = resolve.saturating_sub(threat);
    if score >= TRIAL_ASCEND_SCORE {
        EndingId::Ascend
    } else if score >= TRIAL_RETIRE_SCORE {
        EndingId::Retire
    } else {
        EndingId::Demon
    }
}

/// Actions the player may pick right now; empty once concluded.
#[must_use]
pub fn available_actions(state: &TrialState, purse: &TrialPurse) -> Vec<TrialAction> {
    if state.is_concluded() {
        return Vec::new();
    }
    let mut actions = vec![TrialAction::Steady, TrialAction::Gamble];
    actions.extend(
        SacrificeKind::ALL
            .into_iter()
            .filter(|kind| purse.can_afford(*kind))
            .map(TrialAction::Sacrifice),
    );
    actions
}

/// Everything one resolved action produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub state: TrialState,
    pub purse: TrialPurse,
    pub action: TrialAction,
    pub damage: i32,
    pub heal: i32,
    /// Gamble result; `None` for the other actions.
    pub gamble_won: Option<bool>,
    pub ending: Option<EndingId>,
}

/// Resolve one action with the shipped tuning.
///
/// # Errors
///
/// See [`TrialTuning::resolve`].
pub fn resolve_action<R>(
    state: &TrialState,
    action: TrialAction,
    purse: &TrialPurse,
    rng: &mut R,
) -> Result<StepOutcome, TrialError>
where
    R: UnitRng + ?Sized,
{
    TrialTuning::default().resolve(state, action, purse, rng)
}

impl TrialTuning {
    /// Resolve one action. `Gamble` draws exactly once; other actions draw nothing.
    ///
    /// Heals land before the blow and are capped at `max_hp`.
    ///
    /// # Errors
    ///
    /// `TrialError::Concluded` once the encounter is over and
    /// `TrialError::Unaffordable` for a sacrifice the purse cannot cover. In
    /// both cases nothing is consumed, including random draws.
    pub fn resolve<R>(
        &self,
        state: &TrialState,
        action: TrialAction,
        purse: &TrialPurse,
        rng: &mut R,
    ) -> Result<StepOutcome, TrialError>
    where
        R: UnitRng + ?Sized,
    {
        if state.is_concluded() {
            return Err(TrialError::Concluded {
                step: state.step,
                hp: state.hp,
            });
        }

        let base = dmg_base(state.threat, state.step);
        let mut next = *state;
        let mut next_purse = *purse;
        let mut heal = 0;
        let mut gamble_won = None;

        let damage = match action {
            TrialAction::Steady => {
                next.resolve = next.resolve.saturating_add(TRIAL_STEADY_RESOLVE_GAIN);
                steady_damage(base, state.resolve)
            }
            TrialAction::Gamble => {
                let won = rng.next_unit() < self.gamble_success_rate;
                gamble_won = Some(won);
                if won {
                    next.resolve = next.resolve.saturating_add(TRIAL_GAMBLE_WIN_RESOLVE);
                }
                gamble_damage(base, won)
            }
            TrialAction::Sacrifice(kind) => {
                next_purse = purse.pay(kind).ok_or(TrialError::Unaffordable {
                    kind,
                    needed: kind.cost(),
                    held: purse.holding(kind),
                })?;
                next.resolve = next.resolve.saturating_add(kind.resolve_bonus());
                let healed = next.hp.saturating_add(kind.heal()).min(next.max_hp);
                heal = healed.saturating_sub(next.hp).max(0);
                next.hp = next.hp.saturating_add(heal);
                sacrifice_damage(base, kind)
            }
        };

        next.hp = next.hp.saturating_sub(damage);
        next.step = next.step.saturating_add(1);
        let ending = next.ending();

        log::trace!(
            target: LOG_TARGET_TRIAL,
            "step {} {}: dmg {damage} heal {heal} hp {} resolve {}",
            state.step,
            action.label(),
            next.hp,
            next.resolve
        );
        if let Some(ending) = ending {
            log::debug!(
                target: LOG_TARGET_TRIAL,
                "trial ended {ending} (score {}, hp {})",
                next.score(),
                next.hp
            );
        }

        Ok(StepOutcome {
            state: next,
            purse: next_purse,
            action,
            damage,
            heal,
            gamble_won,
            ending,
        })
    }
}

/// One resolved step as kept in a [`TrialLog`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: u8,
    pub action: TrialAction,
    pub damage: i32,
    pub heal: i32,
    pub gamble_won: Option<bool>,
    pub hp_after: i32,
    pub resolve_after: i32,
}

pub type TrialLog = SmallVec<[StepRecord; 3]>;

/// Chooses an action from the offered list.
pub trait TrialPolicy {
    fn choose(
        &mut self,
        state: &TrialState,
        purse: &TrialPurse,
        offered: &[TrialAction],
    ) -> TrialAction;
}

impl<F> TrialPolicy for F
where
    F: FnMut(&TrialState, &TrialPurse, &[TrialAction]) -> TrialAction,
{
    fn choose(
        &mut self,
        state: &TrialState,
        purse: &TrialPurse,
        offered: &[TrialAction],
    ) -> TrialAction {
        self(state, purse, offered)
    }
}

/// A whole encounter driven by a policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialRun {
    pub log: TrialLog,
    pub state: TrialState,
    pub purse: TrialPurse,
    pub reward: EndingReward,
}

impl TrialRun {
    #[must_use]
    pub const fn ending(&self) -> EndingId {
        self.reward.ending
    }
}

/// Drive an encounter from `snapshot` to its ending.
///
/// # Errors
///
/// Propagates `TrialError::Unaffordable` when the policy picks a sacrifice
/// the purse cannot cover.
pub fn run_trial<P, R>(
    snapshot: &TrialSnapshot,
    purse: TrialPurse,
    tuning: &TrialTuning,
    policy: &mut P,
    rng: &mut R,
) -> Result<TrialRun, TrialError>
where
    P: TrialPolicy + ?Sized,
    R: UnitRng + ?Sized,
{
    let mut state = begin_trial(snapshot);
    let mut purse = purse;
    let mut log = TrialLog::new();

    while !state.is_concluded() {
        let offered = available_actions(&state, &purse);
        let action = policy.choose(&state, &purse, &offered);
        let outcome = tuning.resolve(&state, action, &purse, rng)?;
        log.push(StepRecord {
            step: state.step,
            action,
            damage: outcome.damage,
            heal: outcome.heal,
            gamble_won: outcome.gamble_won,
            hp_after: outcome.state.hp,
            resolve_after: outcome.state.resolve,
        });
        state = outcome.state;
        purse = outcome.purse;
    }

    let ending = classify_ending(state.hp, state.resolve, state.threat);
    Ok(TrialRun {
        log,
        state,
        purse,
        reward: ending.reward(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::{CountingRng, ScriptedRolls};

    fn snapshot() -> TrialSnapshot {
        TrialSnapshot {
            realm: 2,
            danger: 47,
            milestone_chains: 1,
            best_pill: Some(PillQuality::Fine),
            hp: 80,
            max_hp: 100,
        }
    }

    #[test]
    fn opening_state_follows_formulas() {
        let state = begin_trial(&snapshot());
        // 20 + 20 + 8 + 5 + 6
        assert_eq!(state.threat, 59);
        // 30 + 20
        assert_eq!(state.resolve, 50);
        assert_eq!(state.step, 1);
        assert_eq!(state.hp, 80);
    }

    #[test]
    fn flawed_best_pill_adds_no_threat() {
        let mut snap = snapshot();
        snap.best_pill = Some(PillQuality::Flawed);
        let flawed = threat_for(&snap);
        snap.best_pill = None;
        assert_eq!(flawed, threat_for(&snap));
    }

    #[test]
    fn damage_baseline_is_pure() {
        assert_eq!(dmg_base(59, 1), 9);
        assert_eq!(dmg_base(59, 3), 13);
        assert_eq!(dmg_base(59, 1), dmg_base(59, 1));
    }

    #[test]
    fn steady_draws_nothing_and_floors_damage() {
        let state = begin_trial(&snapshot());
        let mut rng = CountingRng::wrap(ScriptedRolls::new(vec![0.5]));
        let outcome =
            resolve_action(&state, TrialAction::Steady, &TrialPurse::default(), &mut rng).unwrap();
        assert_eq!(rng.draws(), 0);
        assert_eq!(outcome.damage, 4);
        assert_eq!(outcome.state.resolve, 52);
        assert_eq!(outcome.state.step, 2);
        assert_eq!(steady_damage(3, 100), 1);
    }

    #[test]
    fn gamble_draws_once_and_splits_on_rate() {
        let state = begin_trial(&snapshot());
        let purse = TrialPurse::default();
        let mut win = CountingRng::wrap(ScriptedRolls::new(vec![0.54]));
        let won = resolve_action(&state, TrialAction::Gamble, &purse, &mut win).unwrap();
        assert_eq!(win.draws(), 1);
        assert_eq!(won.gamble_won, Some(true));
        assert_eq!(won.damage, 5);
        assert_eq!(won.state.resolve, 56);

        let mut lose = ScriptedRolls::new(vec![0.55]);
        let lost = resolve_action(&state, TrialAction::Gamble, &purse, &mut lose).unwrap();
        assert_eq!(lost.gamble_won, Some(false));
        assert_eq!(lost.damage, 13);
        assert_eq!(lost.state.resolve, 50);
    }

    #[test]
    fn sacrifice_pays_shields_and_heals_to_cap() {
        let state = TrialState {
            hp: 95,
            ..begin_trial(&snapshot())
        };
        let purse = TrialPurse {
            pills: 1,
            ..TrialPurse::default()
        };
        let mut rng = ScriptedRolls::new(vec![0.0]);
        let outcome =
            resolve_action(&state, TrialAction::Sacrifice(SacrificeKind::Pill), &purse, &mut rng)
                .unwrap();
        assert_eq!(outcome.purse.pills, 0);
        assert_eq!(outcome.heal, 5);
        assert_eq!(outcome.damage, 7);
        assert_eq!(outcome.state.hp, 93);
    }

    #[test]
    fn sacrifices_apply_their_own_effects() {
        let state = begin_trial(&snapshot());
        let full = TrialPurse {
            spirit_stones: 60,
            pills: 1,
            talismans: 1,
            herbs: 3,
        };
        // kind, damage, heal, resolve, hp (base damage 9, resolve 50, hp 80)
        let expected = [
            (SacrificeKind::SpiritStones, 6, 0, 54, 74),
            (SacrificeKind::Pill, 7, 15, 50, 88),
            (SacrificeKind::Talisman, 3, 0, 51, 77),
            (SacrificeKind::Herbs, 8, 6, 52, 78),
        ];
        assert_eq!(expected.len(), SacrificeKind::ALL.len());

        for (kind, damage, heal, resolve, hp) in expected {
            let base = dmg_base(state.threat, state.step);
            assert_eq!(damage, (base - kind.shield()).max(1));

            let mut rng = CountingRng::wrap(ScriptedRolls::new(vec![0.0]));
            let outcome =
                resolve_action(&state, TrialAction::Sacrifice(kind), &full, &mut rng).unwrap();
            assert_eq!(rng.draws(), 0);
            assert_eq!(outcome.damage, damage, "{kind:?}");
            assert_eq!(outcome.heal, heal, "{kind:?}");
            assert_eq!(outcome.state.resolve, resolve, "{kind:?}");
            assert_eq!(outcome.state.resolve - state.resolve, kind.resolve_bonus());
            assert_eq!(outcome.state.hp, hp, "{kind:?}");
            assert_eq!(outcome.state.step, 2);

            assert_eq!(outcome.purse.holding(kind), 0, "{kind:?}");
            for other in SacrificeKind::ALL.into_iter().filter(|other| *other != kind) {
                assert_eq!(outcome.purse.holding(other), full.holding(other));
            }
        }
    }

    #[test]
    fn sacrifice_heals_cap_at_max_hp_and_damage_floors_at_one() {
        let nearly_full = TrialState {
            hp: 99,
            ..begin_trial(&snapshot())
        };
        let purse = TrialPurse {
            spirit_stones: 60,
            pills: 1,
            talismans: 1,
            herbs: 3,
        };
        for kind in SacrificeKind::ALL {
            let mut rng = ScriptedRolls::new(vec![0.0]);
            let outcome =
                resolve_action(&nearly_full, TrialAction::Sacrifice(kind), &purse, &mut rng)
                    .unwrap();
            assert_eq!(outcome.heal, kind.heal().min(1), "{kind:?}");
            assert_eq!(outcome.state.hp, 99 + outcome.heal - outcome.damage);
        }

        let calm = TrialState {
            threat: 0,
            ..begin_trial(&snapshot())
        };
        assert_eq!(dmg_base(calm.threat, calm.step), 2);
        let mut rng = ScriptedRolls::new(vec![0.0]);
        let outcome = resolve_action(
            &calm,
            TrialAction::Sacrifice(SacrificeKind::Talisman),
            &purse,
            &mut rng,
        )
        .unwrap();
        assert_eq!(outcome.damage, 1);
    }

    #[test]
    fn unaffordable_sacrifice_changes_nothing() {
        let state = begin_trial(&snapshot());
        let purse = TrialPurse {
            spirit_stones: 59,
            ..TrialPurse::default()
        };
        let mut rng = CountingRng::wrap(ScriptedRolls::new(vec![0.0]));
        let err = resolve_action(
            &state,
            TrialAction::Sacrifice(SacrificeKind::SpiritStones),
            &purse,
            &mut rng,
        )
        .unwrap_err();
        assert_eq!(
            err,
            TrialError::Unaffordable {
                kind: SacrificeKind::SpiritStones,
                needed: 60,
                held: 59
            }
        );
        assert_eq!(rng.draws(), 0);
        let offered = available_actions(&state, &purse);
        assert!(!offered.contains(&TrialAction::Sacrifice(SacrificeKind::SpiritStones)));
    }

    #[test]
    fn ending_boundaries() {
        assert_eq!(classify_ending(10, 70, 50), EndingId::Ascend);
        assert_eq!(classify_ending(10, 45, 50), EndingId::Retire);
        assert_eq!(classify_ending(10, 44, 50), EndingId::Demon);
        assert_eq!(classify_ending(0, 500, 50), EndingId::Dead);
    }

    #[test]
    fn lethal_step_ends_immediately() {
        let state = TrialState {
            hp: 3,
            ..begin_trial(&snapshot())
        };
        let mut rng = ScriptedRolls::new(vec![0.9]);
        let outcome =
            resolve_action(&state, TrialAction::Gamble, &TrialPurse::default(), &mut rng).unwrap();
        assert_eq!(outcome.ending, Some(EndingId::Dead));
        let again = resolve_action(
            &outcome.state,
            TrialAction::Steady,
            &TrialPurse::default(),
            &mut rng,
        );
        assert!(matches!(again, Err(TrialError::Concluded { .. })));
        assert!(available_actions(&outcome.state, &TrialPurse::default()).is_empty());
    }

    #[test]
    fn rewards_match_endings() {
        let demon = EndingId::Demon.reward();
        assert!(demon.unlocks_demon_path);
        assert_eq!((demon.spirit_stones, demon.shards), (300, 40));
        assert_eq!(EndingId::Dead.reward().shards, 5);
        assert!(!EndingId::Ascend.reward().unlocks_demon_path);
    }

    #[test]
    fn run_trial_logs_three_steps() {
        let mut steady = |_: &TrialState, _: &TrialPurse, _: &[TrialAction]| TrialAction::Steady;
        let mut rng = CountingRng::wrap(ScriptedRolls::new(vec![0.1]));
        let run = run_trial(
            &snapshot(),
            TrialPurse::default(),
            &TrialTuning::default(),
            &mut steady,
            &mut rng,
        )
        .unwrap();
        assert_eq!(run.log.len(), 3);
        assert!(!run.log.spilled());
        assert_eq!(rng.draws(), 0);
        // damage 4, 6, 8 and resolve 50 -> 56 against threat 59
        assert_eq!(run.state.hp, 62);
        assert_eq!(run.state.resolve, 56);
        assert_eq!(run.ending(), EndingId::Retire);
    }

    #[test]
    fn tuning_rejects_rates_outside_unit_interval() {
        assert!(TrialTuning::default().validate().is_ok());
        let bad = TrialTuning {
            gamble_success_rate: 1.5,
        };
        assert!(bad.validate().is_err());
    }
}
