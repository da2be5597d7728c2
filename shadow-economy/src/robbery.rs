//! Robbery resolution.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::RobberyDef;
use crate::constants::{
    ROBBERY_CHANCE_CAP, ROBBERY_FAILURE_SUSPICION_FACTOR, ROBBERY_FEAR_CHANCE,
    ROBBERY_FEAR_CHANCE_CAP, ROBBERY_MIN_COOLDOWN_SECONDS,
};
use crate::numbers::{i64_to_f64, round_cents, round_to};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RobberyRoll {
    pub success: bool,
    pub chance: f64,
    /// Cash taken; zero on failure.
    pub reward: f64,
    pub suspicion_gain: f64,
}

/// Success probability with the fear bonus folded in.
#[must_use]
pub fn success_chance(def: &RobberyDef, fear: i64) -> f64 {
    let fear_bonus = (i64_to_f64(fear.max(0)) * ROBBERY_FEAR_CHANCE).min(ROBBERY_FEAR_CHANCE_CAP);
    (def.success_chance + fear_bonus).min(ROBBERY_CHANCE_CAP)
}

/// Cooldown after an attempt, shortened by `reduction_pct` down to a floor.
#[must_use]
pub fn cooldown_secs(def: &RobberyDef, reduction_pct: f64) -> f64 {
    (def.cooldown_seconds * (1.0 - reduction_pct / 100.0)).max(ROBBERY_MIN_COOLDOWN_SECONDS)
}

/// Roll one attempt. `reward_bonus_pct` stacks talent and event bonuses.
pub fn attempt<R: Rng + ?Sized>(
    def: &RobberyDef,
    fear: i64,
    reward_bonus_pct: f64,
    rng: &mut R,
) -> RobberyRoll {
    let chance = success_chance(def, fear);
    if rng.gen_bool(chance.clamp(0.0, 1.0)) {
        let base = if def.max_reward > def.min_reward {
            rng.gen_range(def.min_reward..=def.max_reward)
        } else {
            def.min_reward
        };
        RobberyRoll {
            success: true,
            chance,
            reward: round_cents(base * (1.0 + reward_bonus_pct / 100.0)),
            suspicion_gain: def.suspicion_gain,
        }
    } else {
        RobberyRoll {
            success: false,
            chance,
            reward: 0.0,
            suspicion_gain: round_to(def.suspicion_gain * ROBBERY_FAILURE_SUSPICION_FACTOR, 2),
        }
    }
}
