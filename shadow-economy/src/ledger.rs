//! Per-player economic state: the ledger, owned assets and the record that
//! is loaded and committed as one unit.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::catalog::{ItemSlot, Reward, TalentKind};
use crate::error::EconomyError;
use crate::progression::ProgressionState;

/// Stable player identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PlayerId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Absolute "available again at" timestamps, Unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Cooldowns {
    pub robbery_until: f64,
    pub pvp_until: f64,
    pub boss_until: f64,
    pub ad_until: f64,
}

impl Cooldowns {
    /// Seconds left before `until` elapses, or `None` when available.
    #[must_use]
    pub fn remaining(until: f64, now: f64) -> Option<f64> {
        (until > now).then_some(until - now)
    }
}

/// Lifetime counters; reset on prestige except the VIP-facing ones.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Counters {
    pub total_earned: f64,
    pub total_robberies: u64,
    pub pvp_wins: u64,
    pub casino_plays: u64,
    pub casino_wins: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerLedger {
    pub cash: f64,
    pub suspicion: f64,
    pub reputation_fear: i64,
    pub reputation_respect: i64,
    pub prestige_level: u32,
    pub prestige_multiplier: f64,
    pub talent_points: u32,
    pub last_checkpoint_ts: f64,
    #[serde(default)]
    pub cooldowns: Cooldowns,
    #[serde(default)]
    pub is_vip: bool,
    #[serde(default)]
    pub vip_until: f64,
    #[serde(default)]
    pub ad_boost_until: f64,
    #[serde(default)]
    pub counters: Counters,
    /// Safe-house charges; one is consumed per blocked raid.
    #[serde(default)]
    pub raid_protection: u32,
    #[serde(default)]
    pub has_premium_pass: bool,
}

impl PlayerLedger {
    #[must_use]
    pub fn new(starting_cash: f64, now: f64) -> Self {
        Self {
            cash: starting_cash.max(0.0),
            suspicion: 0.0,
            reputation_fear: 0,
            reputation_respect: 0,
            prestige_level: 0,
            prestige_multiplier: 1.0,
            talent_points: 0,
            last_checkpoint_ts: now,
            cooldowns: Cooldowns::default(),
            is_vip: false,
            vip_until: 0.0,
            ad_boost_until: 0.0,
            counters: Counters::default(),
            raid_protection: 0,
            has_premium_pass: false,
        }
    }

    #[must_use]
    pub fn is_vip_active(&self, now: f64) -> bool {
        self.is_vip && self.vip_until > now
    }

    #[must_use]
    pub fn has_ad_boost(&self, now: f64) -> bool {
        self.ad_boost_until > now
    }

    /// Withdraw `amount`, failing without side effects when cash is short.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::InsufficientFunds`] if `amount` exceeds cash.
    pub fn debit(&mut self, amount: f64) -> Result<(), EconomyError> {
        if amount > self.cash {
            return Err(EconomyError::InsufficientFunds {
                required: amount,
                available: self.cash,
            });
        }
        self.cash = (self.cash - amount).max(0.0);
        Ok(())
    }

    pub fn credit(&mut self, amount: f64) {
        if amount.is_finite() {
            self.cash = (self.cash + amount).max(0.0);
        }
    }

    /// Add `delta` to suspicion and clamp it into `[0, max]`.
    pub fn adjust_suspicion(&mut self, delta: f64, max: f64) {
        self.suspicion = (self.suspicion + delta).clamp(0.0, max);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnedAsset {
    pub asset_id: String,
    pub level: u32,
    #[serde(default)]
    pub has_manager: bool,
}

impl OwnedAsset {
    #[must_use]
    pub fn new(asset_id: impl Into<String>) -> Self {
        Self {
            asset_id: asset_id.into(),
            level: 1,
            has_manager: false,
        }
    }
}

/// Gang contribution snapshot; membership itself is managed elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GangBonuses {
    pub income_pct: f64,
    pub raid_reduction_pct: f64,
    pub territory_pct: f64,
}

/// An unopened case sitting in the player's stash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldCase {
    pub id: u64,
    pub case_id: String,
}

/// The unit loaded from and committed to a [`crate::store::LedgerStore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub id: PlayerId,
    pub ledger: PlayerLedger,
    #[serde(default)]
    pub assets: Vec<OwnedAsset>,
    #[serde(default)]
    pub inventory: BTreeSet<String>,
    #[serde(default)]
    pub equipment: BTreeMap<ItemSlot, String>,
    #[serde(default)]
    pub upgrades: BTreeMap<String, u32>,
    #[serde(default)]
    pub talents: BTreeMap<TalentKind, u32>,
    #[serde(default)]
    pub held_cases: Vec<HeldCase>,
    #[serde(default)]
    pub next_case_id: u64,
    #[serde(default)]
    pub gang: GangBonuses,
    #[serde(default)]
    pub progression: ProgressionState,
}

impl PlayerRecord {
    #[must_use]
    pub fn new(id: PlayerId, starting_cash: f64, now: f64) -> Self {
        Self {
            id,
            ledger: PlayerLedger::new(starting_cash, now),
            assets: Vec::new(),
            inventory: BTreeSet::new(),
            equipment: BTreeMap::new(),
            upgrades: BTreeMap::new(),
            talents: BTreeMap::new(),
            held_cases: Vec::new(),
            next_case_id: 1,
            gang: GangBonuses::default(),
            progression: ProgressionState::default(),
        }
    }

    /// Player level is the sum of all owned asset levels.
    #[must_use]
    pub fn level(&self) -> u32 {
        self.assets
            .iter()
            .fold(0u32, |acc, asset| acc.saturating_add(asset.level))
    }

    #[must_use]
    pub fn asset(&self, asset_id: &str) -> Option<&OwnedAsset> {
        self.assets.iter().find(|asset| asset.asset_id == asset_id)
    }

    pub fn asset_mut(&mut self, asset_id: &str) -> Option<&mut OwnedAsset> {
        self.assets
            .iter_mut()
            .find(|asset| asset.asset_id == asset_id)
    }

    #[must_use]
    pub fn upgrade_level(&self, upgrade_id: &str) -> u32 {
        self.upgrades.get(upgrade_id).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn talent_level(&self, kind: TalentKind) -> u32 {
        self.talents.get(&kind).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn owns_item(&self, item_id: &str) -> bool {
        self.inventory.contains(item_id)
    }

    /// Stash a case and return its handle.
    pub fn hold_case(&mut self, case_id: impl Into<String>) -> u64 {
        let id = self.next_case_id.max(1);
        self.next_case_id = id.saturating_add(1);
        self.held_cases.push(HeldCase {
            id,
            case_id: case_id.into(),
        });
        id
    }

    /// Pay out a catalog reward; returns the handle of a stashed case.
    /// Item rewards the player already owns are a no-op.
    pub fn grant(&mut self, reward: &Reward) -> Option<u64> {
        match reward {
            Reward::Cash { amount } => {
                self.ledger.credit(*amount);
                None
            }
            Reward::Case { case_id } => Some(self.hold_case(case_id.clone())),
            Reward::Item { item_id } => {
                self.inventory.insert(item_id.clone());
                None
            }
            Reward::CashAndCase { amount, case_id } => {
                self.ledger.credit(*amount);
                Some(self.hold_case(case_id.clone()))
            }
        }
    }

    /// Remove a held case by handle.
    pub fn take_case(&mut self, held_id: u64) -> Option<HeldCase> {
        let index = self.held_cases.iter().position(|case| case.id == held_id)?;
        Some(self.held_cases.remove(index))
    }
}
