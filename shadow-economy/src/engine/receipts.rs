//! Operation results handed back to callers.
use serde::{Deserialize, Serialize};

use crate::accrual::Rates;
use crate::casino::{CasinoRound, Wager};
use crate::catalog::{ItemSlot, Reward, SeasonTrack, TalentKind, UpgradeEffect};
use crate::ledger::PlayerId;
use crate::loot::LootOutcome;
use crate::pvp::{FightOutcome, PowerSheet};
use crate::robbery::RobberyRoll;

/// What the offline sync at the start of an operation settled.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Settlement {
    pub earned: f64,
    pub suspicion: f64,
    pub was_raided: bool,
    pub raid_blocked: bool,
    pub settled_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectReceipt {
    pub settlement: Settlement,
    /// Rates in effect after the sync, at reporting precision.
    pub rates: Rates,
    pub cash: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetReceipt {
    pub asset_id: String,
    pub level: u32,
    pub cost: f64,
    pub discount: f64,
    pub rates: Rates,
    pub settlement: Settlement,
    pub cash: f64,
}

/// A plain purchase: manager hire or shop item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    pub target: String,
    pub cost: f64,
    pub settlement: Settlement,
    pub cash: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipReceipt {
    pub item_id: String,
    pub slot: ItemSlot,
    pub replaced: Option<String>,
    pub settlement: Settlement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeReceipt {
    pub upgrade_id: String,
    pub level: u32,
    pub effect: UpgradeEffect,
    pub cost: f64,
    pub settlement: Settlement,
    pub cash: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseReceipt {
    pub held_case_id: u64,
    pub case_id: String,
    pub cost: f64,
    pub settlement: Settlement,
    pub cash: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootReceipt {
    pub case_id: String,
    pub outcome: LootOutcome,
    pub settlement: Settlement,
    pub cash: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobberyReceipt {
    pub robbery_id: String,
    pub roll: RobberyRoll,
    pub cooldown_until: f64,
    pub settlement: Settlement,
    pub cash: f64,
    pub suspicion: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CasinoReceipt {
    pub wager: Wager,
    pub bet: f64,
    pub round: CasinoRound,
    pub net: f64,
    pub settlement: Settlement,
    pub cash: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PvpReceipt {
    pub defender: PlayerId,
    pub sheet: PowerSheet,
    pub outcome: FightOutcome,
    pub attacker_settlement: Settlement,
    pub defender_settlement: Settlement,
    pub cash: f64,
    pub cooldown_until: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrestigeReceipt {
    pub prestige_level: u32,
    pub prestige_multiplier: f64,
    pub talent_points: u32,
    pub cash: f64,
    pub settlement: Settlement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TalentReceipt {
    pub talent: TalentKind,
    pub level: u32,
    pub points_left: u32,
}

/// Rewards a non-VIP player can earn by watching an ad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdReward {
    IncomeBoost,
    FreeBet,
    ResetCooldown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdReceipt {
    pub reward: AdReward,
    pub settlement: Settlement,
    pub cash: f64,
    pub ad_boost_until: f64,
    pub next_ad_at: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionReceipt {
    pub mission_id: String,
    pub reward: f64,
    pub cash: f64,
}

/// A season-pass level or event milestone payout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimReceipt {
    pub reward: Reward,
    /// Handle of the stashed case, when the reward included one.
    pub held_case_id: Option<u64>,
    pub settlement: Settlement,
    pub cash: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonRewardReceipt {
    pub level: u32,
    pub track: SeasonTrack,
    pub claim: ClaimReceipt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MilestoneReceipt {
    pub event_id: String,
    pub milestone: usize,
    pub claim: ClaimReceipt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginReceipt {
    pub streak: u32,
    /// One-based position in the login reward cycle.
    pub reward_day: u32,
    pub claim: ClaimReceipt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VipCaseReceipt {
    pub held_case_id: u64,
    pub case_id: String,
    pub settlement: Settlement,
}
