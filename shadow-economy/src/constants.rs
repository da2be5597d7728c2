//! Centralized balance and tuning constants for the Shadow Empire economy.
//!
//! These values back the `#[serde(default)]` hooks of [`crate::catalog::Tuning`],
//! so a catalog file only has to spell out the numbers it wants to change.

// Logging targets ----------------------------------------------------------
pub(crate) const LOG_TARGET_SYNC: &str = "shadow_economy::sync";
pub(crate) const LOG_TARGET_ENGINE: &str = "shadow_economy::engine";
pub(crate) const LOG_TARGET_PROGRESS: &str = "shadow_economy::progress";
pub(crate) const LOG_TARGET_GUARD: &str = "shadow_economy::guard";

// Suspicion and raids ------------------------------------------------------
pub(crate) const MAX_SUSPICION: f64 = 100.0;
pub(crate) const RAID_THRESHOLD: f64 = 70.0;
pub(crate) const RAID_CASH_PENALTY: f64 = 0.5;
pub(crate) const RAID_PENALTY_FLOOR: f64 = 0.0;
pub(crate) const RAID_SUSPICION_RELIEF: f64 = 40.0;
pub(crate) const SUSPICION_DECAY_PER_SEC: f64 = 0.03;

// Reputation ---------------------------------------------------------------
pub(crate) const FEAR_INCOME_BONUS: f64 = 0.005;
pub(crate) const FEAR_INCOME_BONUS_CAP: f64 = 0.5;
pub(crate) const RESPECT_SUSPICION_REDUCE: f64 = 0.005;
pub(crate) const RESPECT_SUSPICION_REDUCE_CAP: f64 = 0.5;
pub(crate) const FEAR_SHADOW_DISCOUNT: f64 = 0.01;
pub(crate) const RESPECT_LEGAL_DISCOUNT: f64 = 0.01;
pub(crate) const REPUTATION_DISCOUNT_CAP: f64 = 0.3;
pub(crate) const TOTAL_DISCOUNT_CAP: f64 = 0.5;

// Offline window -----------------------------------------------------------
pub(crate) const OFFLINE_BASE_HOURS: f64 = 4.0;
pub(crate) const OFFLINE_VIP_HOURS: f64 = 8.0;
pub(crate) const SECONDS_PER_HOUR: f64 = 3_600.0;

// Multipliers --------------------------------------------------------------
pub(crate) const VIP_INCOME_MULTIPLIER: f64 = 2.0;
pub(crate) const AD_BOOST_MULTIPLIER: f64 = 2.0;
pub(crate) const AD_BOOST_SECONDS: f64 = 300.0;
pub(crate) const AD_COOLDOWN_SECONDS: f64 = 180.0;
pub(crate) const AD_FREE_BET_CASH: f64 = 1_000.0;

// Prestige -----------------------------------------------------------------
pub(crate) const PRESTIGE_BASE_LEVEL: u32 = 15;
pub(crate) const PRESTIGE_LEVEL_INCREMENT: u32 = 5;
pub(crate) const PRESTIGE_MULTIPLIER_BONUS: f64 = 0.12;
pub(crate) const STARTING_CASH: f64 = 1_000.0;

// Robbery ------------------------------------------------------------------
pub(crate) const ROBBERY_FEAR_CHANCE: f64 = 0.005;
pub(crate) const ROBBERY_FEAR_CHANCE_CAP: f64 = 0.15;
pub(crate) const ROBBERY_CHANCE_CAP: f64 = 0.95;
pub(crate) const ROBBERY_MIN_COOLDOWN_SECONDS: f64 = 5.0;
pub(crate) const ROBBERY_FEAR_GAIN: i64 = 2;
pub(crate) const ROBBERY_FAILURE_SUSPICION_FACTOR: f64 = 0.5;

// PvP ----------------------------------------------------------------------
pub(crate) const PVP_COOLDOWN_SECONDS: f64 = 900.0;
pub(crate) const PVP_STEAL_PERCENT: f64 = 0.08;
pub(crate) const PVP_MIN_CASH_TO_ATTACK: f64 = 2_000.0;
pub(crate) const PVP_STEAL_CAP: f64 = 50_000.0;
pub(crate) const PVP_LOSS_CAP: f64 = 25_000.0;
pub(crate) const PVP_DEFENSE_CAP: f64 = 0.15;
pub(crate) const PVP_ROLL_SPREAD: i64 = 20;
pub(crate) const PVP_BODYGUARD_POWER: i64 = 10;

// Loot ---------------------------------------------------------------------
pub(crate) const LOOT_MAX_REROLLS: u32 = 20;
pub(crate) const LOOT_COMPENSATION_FACTOR: f64 = 0.5;

// Progression --------------------------------------------------------------
pub(crate) const DAILY_MISSION_COUNT: usize = 3;
pub(crate) const VIP_DAILY_CASE: &str = "case_premium";
pub(crate) const SECONDS_PER_DAY: f64 = 86_400.0;

// Upgrades -----------------------------------------------------------------
pub(crate) const LAUNDERING_INCOME_PCT_PER_LEVEL: f64 = 10.0;
