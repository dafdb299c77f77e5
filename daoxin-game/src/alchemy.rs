//! Pill quality ladder and the alchemy pity nudge.
use serde::{Deserialize, Serialize};

use crate::loot::pick_index;
use crate::pity::{PityState, PityTuning};
use crate::rng::UnitRng;

/// Quality of a brewed pill, lowest first.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum PillQuality {
    #[default]
    Flawed,
    Plain,
    Fine,
    Superior,
    Flawless,
}

impl PillQuality {
    pub const ALL: [Self; 5] = [
        Self::Flawed,
        Self::Plain,
        Self::Fine,
        Self::Superior,
        Self::Flawless,
    ];

    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Flawed => 0,
            Self::Plain => 1,
            Self::Fine => 2,
            Self::Superior => 3,
            Self::Flawless => 4,
        }
    }

    #[must_use]
    pub const fn from_rank(rank: u8) -> Self {
        match rank {
            0 => Self::Flawed,
            1 => Self::Plain,
            2 => Self::Fine,
            3 => Self::Superior,
            _ => Self::Flawless,
        }
    }

    /// Move up `steps` grades, stopping at `Flawless`.
    #[must_use]
    pub const fn shifted(self, steps: u8) -> Self {
        Self::from_rank(self.rank().saturating_add(steps))
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Flawed => "flawed",
            Self::Plain => "plain",
            Self::Fine => "fine",
            Self::Superior => "superior",
            Self::Flawless => "flawless",
        }
    }
}

/// Quality adjustment derived from the alchemy pity counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum QualityNudge {
    None,
    Shift(u8),
    Floor(PillQuality),
}

impl QualityNudge {
    #[must_use]
    pub fn apply(self, rolled: PillQuality) -> PillQuality {
        match self {
            Self::None => rolled,
            Self::Shift(steps) => rolled.shifted(steps),
            Self::Floor(floor) => rolled.max(floor),
        }
    }
}

/// A finished brew and the pity state after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrewOutcome {
    pub rolled: PillQuality,
    pub quality: PillQuality,
    pub nudge: QualityNudge,
    pub pity: PityState,
}

/// Apply the alchemy pity nudge to a raw brew and advance the counter.
#[must_use]
pub fn brew_outcome(rolled: PillQuality, pity: &PityState, tuning: &PityTuning) -> BrewOutcome {
    let nudge = pity.alchemy_nudge(tuning);
    let quality = nudge.apply(rolled);
    BrewOutcome {
        rolled,
        quality,
        nudge,
        pity: pity.after_alchemy(quality, tuning),
    }
}

/// Raw furnace roll before pity. Consumes exactly one draw.
///
/// `mastery` (clamped to 100) drains weight from flawed pills into the upper
/// grades.
#[must_use]
pub fn roll_pill_quality<R>(rng: &mut R, mastery: u32) -> PillQuality
where
    R: UnitRng + ?Sized,
{
    let draw = rng.next_unit();
    let m = f64::from(mastery.min(100));
    let weights = [
        (30.0 - m / 4.0).max(5.0),
        35.0,
        22.0 + m / 10.0,
        10.0 + m / 8.0,
        3.0 + m / 20.0,
    ];
    pick_index(&weights, draw)
        .and_then(|pick| PillQuality::ALL.get(pick.index).copied())
        .unwrap_or(PillQuality::Flawed)
}
