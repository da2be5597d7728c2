//! Typed game-balance catalog.
//!
//! Everything the economy treats as configuration lives here: assets,
//! robberies, casino limits, items, cases, upgrades, talents and the
//! progression tables. A catalog is validated once when it is parsed and is
//! immutable afterwards; the engine swaps whole catalogs on reload.
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::constants;
use crate::progression::ActionKind;

const DEFAULT_CATALOG: &str = include_str!("../assets/catalog.json");

/// Errors raised while parsing or validating a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog parse failed: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate {kind} id `{id}`")]
    Duplicate { kind: &'static str, id: String },
    #[error("{owner} references unknown {kind} `{id}`")]
    UnknownReference {
        owner: String,
        kind: &'static str,
        id: String,
    },
    #[error("loot pool of case `{case_id}` is empty")]
    EmptyLootPool { case_id: String },
    #[error("case `{case_id}` has invalid weight {weight} for `{item_id}`")]
    InvalidWeight {
        case_id: String,
        item_id: String,
        weight: f64,
    },
    #[error("{field}: {reason}")]
    Invalid { field: String, reason: &'static str },
}

fn invalid(field: impl Into<String>, reason: &'static str) -> CatalogError {
    CatalogError::Invalid {
        field: field.into(),
        reason,
    }
}

/// Suspicion behaviour of an asset; legal fronts launder heat away, shadow
/// operations generate it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AssetClass {
    Legal { suspicion_reduce: f64 },
    Shadow { suspicion_add: f64 },
}

impl AssetClass {
    #[must_use]
    pub const fn is_shadow(self) -> bool {
        matches!(self, Self::Shadow { .. })
    }
}

/// An income-producing business.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetDef {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub class: AssetClass,
    pub base_cost: f64,
    pub base_income: f64,
    pub cost_multiplier: f64,
    pub income_multiplier: f64,
    pub manager_cost: f64,
    #[serde(default)]
    pub unlock_level: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RobberyDef {
    pub id: String,
    pub name: String,
    pub min_reward: f64,
    pub max_reward: f64,
    pub success_chance: f64,
    pub suspicion_gain: f64,
    pub cooldown_seconds: f64,
    #[serde(default)]
    pub unlock_level: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CasinoGame {
    Coinflip,
    Dice,
    Slots,
    Roulette,
}

impl CasinoGame {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Coinflip => "coinflip",
            Self::Dice => "dice",
            Self::Slots => "slots",
            Self::Roulette => "roulette",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetLimits {
    pub min_bet: f64,
    pub max_bet: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    /// Cash multiplier for duplicate-compensation payouts. Strictly increasing.
    #[must_use]
    pub const fn compensation_multiplier(self) -> f64 {
        match self {
            Self::Common => 1.0,
            Self::Uncommon => 2.0,
            Self::Rare => 4.0,
            Self::Epic => 8.0,
            Self::Legendary => 20.0,
        }
    }

    /// Whether the loot rarity boost applies to this tier.
    #[must_use]
    pub const fn is_boostable(self) -> bool {
        matches!(self, Self::Rare | Self::Epic | Self::Legendary)
    }

    /// Extra steal fraction an equipped weapon of this rarity grants.
    #[must_use]
    pub const fn weapon_steal_bonus(self) -> f64 {
        match self {
            Self::Common => 0.0,
            Self::Uncommon => 0.01,
            Self::Rare => 0.02,
            Self::Epic => 0.03,
            Self::Legendary => 0.05,
        }
    }

    /// Steal reduction each equipped item of this rarity grants a defender.
    #[must_use]
    pub const fn defense_bonus(self) -> f64 {
        match self {
            Self::Common => 0.0,
            Self::Uncommon => 0.005,
            Self::Rare => 0.01,
            Self::Epic => 0.02,
            Self::Legendary => 0.03,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSlot {
    Hat,
    Jacket,
    Accessory,
    Car,
    Weapon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusType {
    #[default]
    None,
    Fear,
    Respect,
    Income,
    SuspicionReduce,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDef {
    pub id: String,
    pub name: String,
    pub slot: ItemSlot,
    #[serde(default)]
    pub price: f64,
    pub rarity: Rarity,
    #[serde(default)]
    pub bonus_type: BonusType,
    #[serde(default)]
    pub bonus: f64,
    #[serde(default)]
    pub case_only: bool,
    #[serde(default)]
    pub vip_only: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LootEntry {
    pub item_id: String,
    pub weight: f64,
}

/// Ordered weighted pool a case draws from.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LootPool {
    pub entries: Vec<LootEntry>,
}

impl LootPool {
    #[must_use]
    pub fn from_entries(entries: Vec<LootEntry>) -> Self {
        Self { entries }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn item_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.item_id.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseDef {
    pub id: String,
    pub name: String,
    pub price: f64,
    pub rarity: Rarity,
    pub loot: LootPool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeEffect {
    SuspicionReset,
    RaidProtection,
    IncomeBoost,
    Territory,
    PvpDefense,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpgradeDef {
    pub id: String,
    pub name: String,
    pub base_cost: f64,
    pub cost_multiplier: f64,
    pub effect: UpgradeEffect,
    #[serde(default)]
    pub fear_gain: i64,
    #[serde(default)]
    pub respect_gain: i64,
}

impl UpgradeDef {
    /// Price of the next purchase given how many times it was bought already.
    #[must_use]
    pub fn cost_at(&self, owned_level: u32) -> f64 {
        self.base_cost * self.cost_multiplier.powi(i32::try_from(owned_level).unwrap_or(i32::MAX))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TalentKind {
    TradeGrip,
    PassiveIncome,
    QuickStart,
    Efficiency,
    RobberyMaster,
    BigLoot,
    Intimidation,
    StreetFighter,
    Lucky,
    LootboxMaster,
    Evasion,
    ShadowTalent,
}

impl TalentKind {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::TradeGrip => "trade_grip",
            Self::PassiveIncome => "passive_income",
            Self::QuickStart => "quick_start",
            Self::Efficiency => "efficiency",
            Self::RobberyMaster => "robbery_master",
            Self::BigLoot => "big_loot",
            Self::Intimidation => "intimidation",
            Self::StreetFighter => "street_fighter",
            Self::Lucky => "lucky",
            Self::LootboxMaster => "lootbox_master",
            Self::Evasion => "evasion",
            Self::ShadowTalent => "shadow_talent",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TalentDef {
    pub id: TalentKind,
    pub name: String,
    pub per_level: f64,
    pub max_level: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionTemplate {
    pub id: String,
    pub name: String,
    pub kind: ActionKind,
    pub target: u64,
    pub reward: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Reward {
    Cash { amount: f64 },
    Case { case_id: String },
    Item { item_id: String },
    CashAndCase { amount: f64, case_id: String },
}

impl Reward {
    #[must_use]
    pub fn cash(&self) -> f64 {
        match self {
            Self::Cash { amount } | Self::CashAndCase { amount, .. } => *amount,
            Self::Case { .. } | Self::Item { .. } => 0.0,
        }
    }

    #[must_use]
    pub fn case_id(&self) -> Option<&str> {
        match self {
            Self::Case { case_id } | Self::CashAndCase { case_id, .. } => Some(case_id),
            Self::Cash { .. } | Self::Item { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestStep {
    pub trigger: ActionKind,
    pub target: u64,
    pub reward: Reward,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestLine {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub unlock_level: u32,
    pub steps: Vec<QuestStep>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalEvent {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub active: bool,
    #[serde(default = "default_multiplier")]
    pub income_multiplier: f64,
    #[serde(default)]
    pub score_events: HashMap<ActionKind, u64>,
    /// Claimable in any order once the event score reaches `target`.
    #[serde(default)]
    pub milestones: Vec<EventMilestone>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMilestone {
    pub target: u64,
    pub reward: Reward,
}

/// Rotating bonus keyed by UTC weekday (0 = Monday).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyEvent {
    pub weekday: u32,
    pub name: String,
    #[serde(default)]
    pub robbery_reward_pct: f64,
    #[serde(default)]
    pub rarity_boost_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonPassConfig {
    pub id: String,
    pub xp_per_level: u64,
    pub max_level: u32,
    #[serde(default)]
    pub xp_events: HashMap<ActionKind, u64>,
    /// Level rewards; a level may pay on one track, both, or neither.
    #[serde(default)]
    pub rewards: Vec<SeasonLevelReward>,
}

impl SeasonPassConfig {
    #[must_use]
    pub fn reward(&self, level: u32, track: SeasonTrack) -> Option<&Reward> {
        let entry = self.rewards.iter().find(|entry| entry.level == level)?;
        match track {
            SeasonTrack::Free => entry.free.as_ref(),
            SeasonTrack::Premium => entry.premium.as_ref(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonTrack {
    Free,
    Premium,
}

impl SeasonTrack {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Premium => "premium",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonLevelReward {
    pub level: u32,
    #[serde(default)]
    pub free: Option<Reward>,
    #[serde(default)]
    pub premium: Option<Reward>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TournamentConfig {
    #[serde(default)]
    pub score_events: HashMap<ActionKind, u64>,
}

const fn default_multiplier() -> f64 {
    1.0
}

/// Thresholds and coefficients of the economy; every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub max_suspicion: f64,
    pub raid_threshold: f64,
    pub raid_cash_penalty: f64,
    /// Lowest cash penalty a raid can be reduced to by gang and talent bonuses.
    pub raid_penalty_floor: f64,
    pub raid_suspicion_relief: f64,
    pub suspicion_decay_per_sec: f64,
    pub fear_income_bonus: f64,
    pub fear_income_bonus_cap: f64,
    pub respect_suspicion_reduce: f64,
    pub respect_suspicion_reduce_cap: f64,
    pub fear_shadow_discount: f64,
    pub respect_legal_discount: f64,
    pub reputation_discount_cap: f64,
    pub total_discount_cap: f64,
    pub offline_base_hours: f64,
    pub offline_vip_hours: f64,
    pub vip_income_multiplier: f64,
    pub ad_boost_multiplier: f64,
    pub ad_boost_seconds: f64,
    pub ad_cooldown_seconds: f64,
    pub ad_free_bet_cash: f64,
    pub prestige_base_level: u32,
    pub prestige_level_increment: u32,
    pub prestige_multiplier_bonus: f64,
    pub starting_cash: f64,
    pub pvp_cooldown_seconds: f64,
    pub pvp_steal_percent: f64,
    pub pvp_min_cash_to_attack: f64,
    pub pvp_steal_cap: f64,
    pub pvp_loss_cap: f64,
    pub loot_max_rerolls: u32,
    pub loot_compensation_factor: f64,
    pub daily_mission_count: usize,
    /// Case handed to active VIPs once per UTC day.
    pub vip_daily_case: String,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            max_suspicion: constants::MAX_SUSPICION,
            raid_threshold: constants::RAID_THRESHOLD,
            raid_cash_penalty: constants::RAID_CASH_PENALTY,
            raid_penalty_floor: constants::RAID_PENALTY_FLOOR,
            raid_suspicion_relief: constants::RAID_SUSPICION_RELIEF,
            suspicion_decay_per_sec: constants::SUSPICION_DECAY_PER_SEC,
            fear_income_bonus: constants::FEAR_INCOME_BONUS,
            fear_income_bonus_cap: constants::FEAR_INCOME_BONUS_CAP,
            respect_suspicion_reduce: constants::RESPECT_SUSPICION_REDUCE,
            respect_suspicion_reduce_cap: constants::RESPECT_SUSPICION_REDUCE_CAP,
            fear_shadow_discount: constants::FEAR_SHADOW_DISCOUNT,
            respect_legal_discount: constants::RESPECT_LEGAL_DISCOUNT,
            reputation_discount_cap: constants::REPUTATION_DISCOUNT_CAP,
            total_discount_cap: constants::TOTAL_DISCOUNT_CAP,
            offline_base_hours: constants::OFFLINE_BASE_HOURS,
            offline_vip_hours: constants::OFFLINE_VIP_HOURS,
            vip_income_multiplier: constants::VIP_INCOME_MULTIPLIER,
            ad_boost_multiplier: constants::AD_BOOST_MULTIPLIER,
            ad_boost_seconds: constants::AD_BOOST_SECONDS,
            ad_cooldown_seconds: constants::AD_COOLDOWN_SECONDS,
            ad_free_bet_cash: constants::AD_FREE_BET_CASH,
            prestige_base_level: constants::PRESTIGE_BASE_LEVEL,
            prestige_level_increment: constants::PRESTIGE_LEVEL_INCREMENT,
            prestige_multiplier_bonus: constants::PRESTIGE_MULTIPLIER_BONUS,
            starting_cash: constants::STARTING_CASH,
            pvp_cooldown_seconds: constants::PVP_COOLDOWN_SECONDS,
            pvp_steal_percent: constants::PVP_STEAL_PERCENT,
            pvp_min_cash_to_attack: constants::PVP_MIN_CASH_TO_ATTACK,
            pvp_steal_cap: constants::PVP_STEAL_CAP,
            pvp_loss_cap: constants::PVP_LOSS_CAP,
            loot_max_rerolls: constants::LOOT_MAX_REROLLS,
            loot_compensation_factor: constants::LOOT_COMPENSATION_FACTOR,
            daily_mission_count: constants::DAILY_MISSION_COUNT,
            vip_daily_case: constants::VIP_DAILY_CASE.to_string(),
        }
    }
}

impl Tuning {
    /// Level a player must reach before their next prestige.
    #[must_use]
    pub const fn prestige_required_level(&self, prestige_level: u32) -> u32 {
        self.prestige_base_level
            .saturating_add(prestige_level.saturating_mul(self.prestige_level_increment))
    }

    #[must_use]
    pub fn prestige_multiplier(&self, prestige_level: u32) -> f64 {
        1.0 + f64::from(prestige_level) * self.prestige_multiplier_bonus
    }
}

/// Complete balance data set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catalog {
    pub assets: Vec<AssetDef>,
    #[serde(default)]
    pub robberies: Vec<RobberyDef>,
    #[serde(default)]
    pub casino: HashMap<CasinoGame, BetLimits>,
    #[serde(default)]
    pub items: Vec<ItemDef>,
    #[serde(default)]
    pub cases: Vec<CaseDef>,
    #[serde(default)]
    pub upgrades: Vec<UpgradeDef>,
    #[serde(default)]
    pub talents: Vec<TalentDef>,
    #[serde(default)]
    pub missions: Vec<MissionTemplate>,
    #[serde(default)]
    pub quests: Vec<QuestLine>,
    #[serde(default)]
    pub seasonal_events: Vec<SeasonalEvent>,
    #[serde(default)]
    pub weekly_events: Vec<WeeklyEvent>,
    pub season_pass: SeasonPassConfig,
    /// Daily login rewards, cycled by streak day.
    #[serde(default)]
    pub login_rewards: Vec<Reward>,
    #[serde(default)]
    pub tournament: TournamentConfig,
    #[serde(default)]
    pub tuning: Tuning,
}

impl Catalog {
    /// Parse and validate a catalog from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or violates a catalog invariant.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(json)?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Load the catalog bundled with the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled catalog fails validation.
    pub fn load_default() -> Result<Self, CatalogError> {
        Self::from_json(DEFAULT_CATALOG)
    }

    #[must_use]
    pub fn asset(&self, id: &str) -> Option<&AssetDef> {
        self.assets.iter().find(|asset| asset.id == id)
    }

    #[must_use]
    pub fn robbery(&self, id: &str) -> Option<&RobberyDef> {
        self.robberies.iter().find(|robbery| robbery.id == id)
    }

    #[must_use]
    pub fn bet_limits(&self, game: CasinoGame) -> Option<BetLimits> {
        self.casino.get(&game).copied()
    }

    #[must_use]
    pub fn item(&self, id: &str) -> Option<&ItemDef> {
        self.items.iter().find(|item| item.id == id)
    }

    #[must_use]
    pub fn case(&self, id: &str) -> Option<&CaseDef> {
        self.cases.iter().find(|case| case.id == id)
    }

    #[must_use]
    pub fn upgrade(&self, id: &str) -> Option<&UpgradeDef> {
        self.upgrades.iter().find(|upgrade| upgrade.id == id)
    }

    #[must_use]
    pub fn talent(&self, kind: TalentKind) -> Option<&TalentDef> {
        self.talents.iter().find(|talent| talent.id == kind)
    }

    #[must_use]
    pub fn mission(&self, id: &str) -> Option<&MissionTemplate> {
        self.missions.iter().find(|mission| mission.id == id)
    }

    #[must_use]
    pub fn quest(&self, id: &str) -> Option<&QuestLine> {
        self.quests.iter().find(|quest| quest.id == id)
    }

    /// The first seasonal event flagged active, if any.
    #[must_use]
    pub fn active_seasonal_event(&self) -> Option<&SeasonalEvent> {
        self.seasonal_events.iter().find(|event| event.active)
    }

    #[must_use]
    pub fn weekly_event(&self, weekday: u32) -> Option<&WeeklyEvent> {
        self.weekly_events
            .iter()
            .find(|event| event.weekday == weekday)
    }

    /// Rarity of a catalog item; unknown ids fall back to common.
    #[must_use]
    pub fn rarity_of(&self, item_id: &str) -> Rarity {
        self.item(item_id).map_or(Rarity::Common, |item| item.rarity)
    }

    /// Check cross references and numeric invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), CatalogError> {
        ensure_unique("asset", self.assets.iter().map(|a| a.id.as_str()))?;
        ensure_unique("robbery", self.robberies.iter().map(|r| r.id.as_str()))?;
        ensure_unique("item", self.items.iter().map(|i| i.id.as_str()))?;
        ensure_unique("case", self.cases.iter().map(|c| c.id.as_str()))?;
        ensure_unique("upgrade", self.upgrades.iter().map(|u| u.id.as_str()))?;
        ensure_unique("mission", self.missions.iter().map(|m| m.id.as_str()))?;
        ensure_unique("quest", self.quests.iter().map(|q| q.id.as_str()))?;
        let mut talents = HashSet::new();
        for talent in &self.talents {
            if !talents.insert(talent.id) {
                return Err(CatalogError::Duplicate {
                    kind: "talent",
                    id: format!("{:?}", talent.id),
                });
            }
            if talent.max_level == 0 {
                return Err(invalid(
                    format!("talent {:?}", talent.id),
                    "max_level must be at least 1",
                ));
            }
        }

        for asset in &self.assets {
            if asset.base_income < 0.0 || asset.base_cost <= 0.0 {
                return Err(invalid(
                    format!("asset {}", asset.id),
                    "base cost must be positive and income non-negative",
                ));
            }
            if asset.cost_multiplier < 1.0 || asset.income_multiplier < 1.0 {
                return Err(invalid(
                    format!("asset {}", asset.id),
                    "level multipliers must be at least 1",
                ));
            }
        }
        for robbery in &self.robberies {
            if robbery.min_reward > robbery.max_reward || robbery.min_reward < 0.0 {
                return Err(invalid(
                    format!("robbery {}", robbery.id),
                    "reward range must satisfy 0 <= min <= max",
                ));
            }
            if !(0.0..=1.0).contains(&robbery.success_chance) {
                return Err(invalid(
                    format!("robbery {}", robbery.id),
                    "success chance must be within [0, 1]",
                ));
            }
        }
        for (game, limits) in &self.casino {
            if limits.min_bet <= 0.0 || limits.min_bet > limits.max_bet {
                return Err(invalid(
                    format!("casino {}", game.key()),
                    "bet limits must satisfy 0 < min <= max",
                ));
            }
        }
        for case in &self.cases {
            self.validate_case(case)?;
        }
        for quest in &self.quests {
            if quest.steps.is_empty() {
                return Err(invalid(format!("quest {}", quest.id), "has no steps"));
            }
            for step in &quest.steps {
                if step.target == 0 {
                    return Err(invalid(format!("quest {}", quest.id), "step target is 0"));
                }
                self.validate_reward(&format!("quest {}", quest.id), &step.reward)?;
            }
        }
        for mission in &self.missions {
            if mission.target == 0 {
                return Err(invalid(format!("mission {}", mission.id), "target is 0"));
            }
        }
        if self.season_pass.xp_per_level == 0 || self.season_pass.max_level == 0 {
            return Err(invalid(
                "season_pass",
                "xp_per_level and max_level must be positive",
            ));
        }
        self.validate_season_rewards()?;
        for event in &self.seasonal_events {
            for milestone in &event.milestones {
                if milestone.target == 0 {
                    return Err(invalid(
                        format!("event {}", event.id),
                        "milestone target is 0",
                    ));
                }
                self.validate_reward(&format!("event {}", event.id), &milestone.reward)?;
            }
        }
        for reward in &self.login_rewards {
            self.validate_reward("login_rewards", reward)?;
        }
        if self.case(&self.tuning.vip_daily_case).is_none() {
            return Err(CatalogError::UnknownReference {
                owner: "tuning.vip_daily_case".to_string(),
                kind: "case",
                id: self.tuning.vip_daily_case.clone(),
            });
        }
        if self.tuning.raid_threshold > self.tuning.max_suspicion {
            return Err(invalid("tuning.raid_threshold", "exceeds max_suspicion"));
        }
        if !(0.0..=1.0).contains(&self.tuning.raid_penalty_floor) {
            return Err(invalid("tuning.raid_penalty_floor", "must be within [0, 1]"));
        }
        Ok(())
    }

    fn validate_season_rewards(&self) -> Result<(), CatalogError> {
        let mut levels = HashSet::new();
        for entry in &self.season_pass.rewards {
            let owner = format!("season_pass level {}", entry.level);
            if entry.level == 0 || entry.level > self.season_pass.max_level {
                return Err(invalid(owner, "level outside 1..=max_level"));
            }
            if !levels.insert(entry.level) {
                return Err(CatalogError::Duplicate {
                    kind: "season level",
                    id: entry.level.to_string(),
                });
            }
            for reward in entry.free.iter().chain(entry.premium.iter()) {
                self.validate_reward(&owner, reward)?;
            }
        }
        Ok(())
    }

    fn validate_reward(&self, owner: &str, reward: &Reward) -> Result<(), CatalogError> {
        if !reward.cash().is_finite() || reward.cash() < 0.0 {
            return Err(invalid(owner, "reward cash must be non-negative"));
        }
        if let Some(case_id) = reward.case_id()
            && self.case(case_id).is_none()
        {
            return Err(CatalogError::UnknownReference {
                owner: owner.to_string(),
                kind: "case",
                id: case_id.to_string(),
            });
        }
        if let Reward::Item { item_id } = reward
            && self.item(item_id).is_none()
        {
            return Err(CatalogError::UnknownReference {
                owner: owner.to_string(),
                kind: "item",
                id: item_id.clone(),
            });
        }
        Ok(())
    }

    fn validate_case(&self, case: &CaseDef) -> Result<(), CatalogError> {
        if case.loot.is_empty() {
            return Err(CatalogError::EmptyLootPool {
                case_id: case.id.clone(),
            });
        }
        for entry in &case.loot.entries {
            if !entry.weight.is_finite() || entry.weight <= 0.0 {
                return Err(CatalogError::InvalidWeight {
                    case_id: case.id.clone(),
                    item_id: entry.item_id.clone(),
                    weight: entry.weight,
                });
            }
            if self.item(&entry.item_id).is_none() {
                return Err(CatalogError::UnknownReference {
                    owner: format!("case {}", case.id),
                    kind: "item",
                    id: entry.item_id.clone(),
                });
            }
        }
        Ok(())
    }
}

fn ensure_unique<'a>(
    kind: &'static str,
    ids: impl Iterator<Item = &'a str>,
) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(CatalogError::Duplicate {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_catalog_validates() {
        let catalog = Catalog::load_default().expect("default catalog");
        assert!(catalog.asset("car_wash").is_some());
        assert!(catalog.case("case_basic").is_some());
        assert!(catalog.talent(TalentKind::LootboxMaster).is_some());
        assert!(
            catalog
                .asset("street_dealer")
                .is_some_and(|asset| asset.class.is_shadow())
        );
    }

    #[test]
    fn rarity_multipliers_strictly_increase() {
        let tiers = [
            Rarity::Common,
            Rarity::Uncommon,
            Rarity::Rare,
            Rarity::Epic,
            Rarity::Legendary,
        ];
        for pair in tiers.windows(2) {
            assert!(pair[0].compensation_multiplier() < pair[1].compensation_multiplier());
        }
    }

    #[test]
    fn tuning_fields_default_when_omitted() {
        let tuning: Tuning = serde_json::from_str(r#"{ "raid_threshold": 80.0 }"#).unwrap();
        assert!((tuning.raid_threshold - 80.0).abs() < f64::EPSILON);
        assert!((tuning.max_suspicion - 100.0).abs() < f64::EPSILON);
        assert_eq!(tuning.prestige_required_level(2), 25);
        assert!((tuning.prestige_multiplier(2) - 1.24).abs() < 1e-12);
    }

    #[test]
    fn validation_rejects_unknown_loot_reference() {
        let mut catalog = Catalog::load_default().unwrap();
        catalog.cases[0].loot.entries.push(LootEntry {
            item_id: "ghost_item".to_string(),
            weight: 1.0,
        });
        let err = catalog.validate().unwrap_err();
        assert!(matches!(err, CatalogError::UnknownReference { kind: "item", .. }));
    }

    #[test]
    fn validation_rejects_zero_weights_and_empty_pools() {
        let mut catalog = Catalog::load_default().unwrap();
        catalog.cases[0].loot.entries[0].weight = 0.0;
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::InvalidWeight { .. })
        ));

        catalog.cases[0].loot.entries.clear();
        assert!(matches!(
            catalog.validate(),
            Err(CatalogError::EmptyLootPool { .. })
        ));
    }

    #[test]
    fn asset_class_parses_from_type_tag() {
        let asset: AssetDef = serde_json::from_str(
            r#"{
                "id": "den", "name": "Den", "type": "shadow", "suspicion_add": 0.5,
                "base_cost": 10, "base_income": 1, "cost_multiplier": 1.5,
                "income_multiplier": 1.1, "manager_cost": 50
            }"#,
        )
        .unwrap();
        assert_eq!(asset.class, AssetClass::Shadow { suspicion_add: 0.5 });
        assert_eq!(asset.unlock_level, 0);
    }

    #[test]
    fn season_rewards_are_looked_up_per_track() {
        let catalog = Catalog::load_default().unwrap();
        let pass = &catalog.season_pass;
        assert_eq!(
            pass.reward(1, SeasonTrack::Free),
            Some(&Reward::Cash { amount: 500.0 })
        );
        assert!(pass.reward(2, SeasonTrack::Premium).is_some());
        assert!(pass.reward(4, SeasonTrack::Free).is_none());
        assert_eq!(catalog.login_rewards.len(), 7);
        assert_eq!(catalog.tuning.vip_daily_case, "case_premium");
    }

    #[test]
    fn validation_rejects_broken_reward_tables() {
        let mut catalog = Catalog::load_default().unwrap();
        catalog.season_pass.rewards[0].level = catalog.season_pass.max_level + 1;
        assert!(matches!(catalog.validate(), Err(CatalogError::Invalid { .. })));

        let mut catalog = Catalog::load_default().unwrap();
        let duplicate = catalog.season_pass.rewards[0].clone();
        catalog.season_pass.rewards.push(duplicate);
        assert!(matches!(catalog.validate(), Err(CatalogError::Duplicate { .. })));

        let mut catalog = Catalog::load_default().unwrap();
        catalog.seasonal_events[0].milestones[0].reward = Reward::Item {
            item_id: "ghost_item".to_string(),
        };
        let err = catalog.validate().unwrap_err();
        assert!(matches!(err, CatalogError::UnknownReference { kind: "item", .. }));

        let mut catalog = Catalog::load_default().unwrap();
        catalog.login_rewards.push(Reward::CashAndCase {
            amount: 10.0,
            case_id: "case_ghost".to_string(),
        });
        let err = catalog.validate().unwrap_err();
        assert!(matches!(err, CatalogError::UnknownReference { kind: "case", .. }));

        let mut catalog = Catalog::load_default().unwrap();
        catalog.tuning.vip_daily_case = "case_ghost".to_string();
        assert!(catalog.validate().is_err());
    }

    #[test]
    fn rewards_parse_from_type_tag() {
        let reward: Reward =
            serde_json::from_str(r#"{"type": "cash_and_case", "amount": 50, "case_id": "c"}"#)
                .unwrap();
        assert!((reward.cash() - 50.0).abs() < f64::EPSILON);
        assert_eq!(reward.case_id(), Some("c"));
    }
}
