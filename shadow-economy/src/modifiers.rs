//! Modifier resolution.
//!
//! Turns raw player and world facts into a [`ModifierBundle`]: the ordered
//! income factors consumed by accrual and offline sync, the talent effects,
//! and the inputs of the buy-cost discount. Resolution never mutates the
//! record and never fails; ids missing from the catalog contribute nothing.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::catalog::{AssetClass, BonusType, Catalog, TalentKind, Tuning, UpgradeEffect};
use crate::clock::utc_weekday;
use crate::constants::LAUNDERING_INCOME_PCT_PER_LEVEL;
use crate::ledger::{PlayerLedger, PlayerRecord};
use crate::numbers::i64_to_f64;

/// Origin of an income factor, in application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierSource {
    Prestige,
    Territory,
    Equipment,
    Upgrades,
    Gang,
    Talents,
    Vip,
    Event,
    AdBoost,
}

impl ModifierSource {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Prestige => "prestige",
            Self::Territory => "territory",
            Self::Equipment => "equipment",
            Self::Upgrades => "upgrades",
            Self::Gang => "gang",
            Self::Talents => "talents",
            Self::Vip => "vip",
            Self::Event => "event",
            Self::AdBoost => "ad_boost",
        }
    }
}

/// One named multiplicative income factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub source: ModifierSource,
    pub factor: f64,
}

/// Inline storage sized for the full factor list.
pub type Contributions = SmallVec<[Contribution; 9]>;

/// Effect magnitudes of the talent tree: level × per-level effect.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TalentBonuses {
    /// Buy-cost discount, percent.
    pub trade_grip: f64,
    /// Income bonus, percent.
    pub passive_income: f64,
    /// Extra starting cash after prestige.
    pub quick_start: f64,
    /// Extra offline hours.
    pub efficiency: f64,
    /// Robbery cooldown reduction, percent.
    pub robbery_master: f64,
    /// Robbery reward bonus, percent.
    pub big_loot: f64,
    /// Starting fear after prestige.
    pub intimidation: f64,
    /// PvP attack power.
    pub street_fighter: f64,
    /// Extra casino max bet.
    pub lucky: f64,
    /// Rare-or-better loot weight boost, percent.
    pub lootbox_master: f64,
    /// Raid penalty reduction, percent.
    pub evasion: f64,
    /// Shadow suspicion reduction, percent.
    pub shadow_talent: f64,
}

impl TalentBonuses {
    #[must_use]
    pub fn from_record(record: &PlayerRecord, catalog: &Catalog) -> Self {
        let effect = |kind: TalentKind| {
            catalog
                .talent(kind)
                .map_or(0.0, |def| f64::from(record.talent_level(kind)) * def.per_level)
        };
        Self {
            trade_grip: effect(TalentKind::TradeGrip),
            passive_income: effect(TalentKind::PassiveIncome),
            quick_start: effect(TalentKind::QuickStart),
            efficiency: effect(TalentKind::Efficiency),
            robbery_master: effect(TalentKind::RobberyMaster),
            big_loot: effect(TalentKind::BigLoot),
            intimidation: effect(TalentKind::Intimidation),
            street_fighter: effect(TalentKind::StreetFighter),
            lucky: effect(TalentKind::Lucky),
            lootbox_master: effect(TalentKind::LootboxMaster),
            evasion: effect(TalentKind::Evasion),
            shadow_talent: effect(TalentKind::ShadowTalent),
        }
    }
}

/// World-level bonuses in effect at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveEvents {
    pub seasonal_event_id: Option<String>,
    pub seasonal_income_multiplier: f64,
    pub weekly_robbery_reward_pct: f64,
    pub weekly_rarity_boost_pct: f64,
}

impl Default for ActiveEvents {
    fn default() -> Self {
        Self {
            seasonal_event_id: None,
            seasonal_income_multiplier: 1.0,
            weekly_robbery_reward_pct: 0.0,
            weekly_rarity_boost_pct: 0.0,
        }
    }
}

impl ActiveEvents {
    /// Events active at `now` according to the catalog.
    #[must_use]
    pub fn at(catalog: &Catalog, now: f64) -> Self {
        let seasonal = catalog.active_seasonal_event();
        let weekly = catalog.weekly_event(utc_weekday(now));
        Self {
            seasonal_event_id: seasonal.map(|event| event.id.clone()),
            seasonal_income_multiplier: seasonal.map_or(1.0, |event| event.income_multiplier),
            weekly_robbery_reward_pct: weekly.map_or(0.0, |event| event.robbery_reward_pct),
            weekly_rarity_boost_pct: weekly.map_or(0.0, |event| event.rarity_boost_pct),
        }
    }
}

/// Reputation-derived coefficients, each clamped independently.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReputationEffects {
    /// Income bonus applied to shadow assets.
    pub fear_income_bonus: f64,
    /// Fraction removed from shadow suspicion.
    pub respect_suspicion_reduce: f64,
    pub shadow_discount: f64,
    pub legal_discount: f64,
}

impl ReputationEffects {
    #[must_use]
    pub fn from_reputation(fear: i64, respect: i64, tuning: &Tuning) -> Self {
        let fear = i64_to_f64(fear.max(0));
        let respect = i64_to_f64(respect.max(0));
        Self {
            fear_income_bonus: (fear * tuning.fear_income_bonus).min(tuning.fear_income_bonus_cap),
            respect_suspicion_reduce: (respect * tuning.respect_suspicion_reduce)
                .min(tuning.respect_suspicion_reduce_cap),
            shadow_discount: (fear * tuning.fear_shadow_discount)
                .min(tuning.reputation_discount_cap),
            legal_discount: (respect * tuning.respect_legal_discount)
                .min(tuning.reputation_discount_cap),
        }
    }

    #[must_use]
    pub fn from_ledger(ledger: &PlayerLedger, tuning: &Tuning) -> Self {
        Self::from_reputation(ledger.reputation_fear, ledger.reputation_respect, tuning)
    }
}

/// Normalized modifiers for one player at one instant. Never persisted.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModifierBundle {
    pub contributions: Contributions,
    pub talents: TalentBonuses,
    /// Shadow suspicion reduction from equipped gear, percent.
    pub equipment_suspicion_pct: f64,
    /// Raid cash penalty reduction from the gang, percent.
    pub gang_raid_reduction_pct: f64,
    pub vip_active: bool,
    pub events: ActiveEvents,
}

impl ModifierBundle {
    #[must_use]
    pub fn factor(&self, source: ModifierSource) -> f64 {
        self.contributions
            .iter()
            .filter(|contribution| contribution.source == source)
            .map(|contribution| contribution.factor)
            .product()
    }

    /// Product of every income factor.
    #[must_use]
    pub fn income_multiplier(&self) -> f64 {
        self.contributions
            .iter()
            .map(|contribution| contribution.factor)
            .product()
    }

    /// Copy of this bundle without the factors of `source`.
    #[must_use]
    pub fn without(&self, source: ModifierSource) -> Self {
        let mut bundle = self.clone();
        bundle
            .contributions
            .retain(|contribution| contribution.source != source);
        bundle
    }

    /// Combined shadow suspicion scale from talents and equipment.
    #[must_use]
    pub fn shadow_suspicion_scale(&self) -> f64 {
        let talent = (1.0 - self.talents.shadow_talent / 100.0).max(0.0);
        let equipment = (1.0 - self.equipment_suspicion_pct / 100.0).max(0.0);
        talent * equipment
    }

    fn push(&mut self, source: ModifierSource, factor: f64) {
        if factor.is_finite() && factor >= 0.0 {
            self.contributions.push(Contribution { source, factor });
        }
    }
}

/// Resolve the modifier bundle for `record` at `now`.
#[must_use]
pub fn resolve(
    record: &PlayerRecord,
    catalog: &Catalog,
    events: &ActiveEvents,
    now: f64,
) -> ModifierBundle {
    let tuning = &catalog.tuning;
    let ledger = &record.ledger;
    let talents = TalentBonuses::from_record(record, catalog);

    let mut equipment_income = 0.0;
    let mut equipment_suspicion = 0.0;
    for item_id in record.equipment.values() {
        let Some(item) = catalog.item(item_id) else {
            continue;
        };
        match item.bonus_type {
            BonusType::Income => equipment_income += item.bonus,
            BonusType::SuspicionReduce => equipment_suspicion += item.bonus,
            BonusType::Fear | BonusType::Respect | BonusType::None => {}
        }
    }

    let upgrade_income: f64 = record
        .upgrades
        .iter()
        .filter_map(|(id, level)| {
            catalog
                .upgrade(id)
                .filter(|def| def.effect == UpgradeEffect::IncomeBoost)
                .map(|_| f64::from(*level) * LAUNDERING_INCOME_PCT_PER_LEVEL)
        })
        .sum();

    let vip_active = ledger.is_vip_active(now);
    let mut bundle = ModifierBundle {
        contributions: Contributions::new(),
        talents,
        equipment_suspicion_pct: equipment_suspicion.min(100.0),
        gang_raid_reduction_pct: record.gang.raid_reduction_pct,
        vip_active,
        events: events.clone(),
    };
    bundle.push(ModifierSource::Prestige, ledger.prestige_multiplier);
    bundle.push(ModifierSource::Territory, pct(record.gang.territory_pct));
    bundle.push(ModifierSource::Equipment, pct(equipment_income));
    bundle.push(ModifierSource::Upgrades, pct(upgrade_income));
    bundle.push(ModifierSource::Gang, pct(record.gang.income_pct));
    bundle.push(ModifierSource::Talents, pct(talents.passive_income));
    if vip_active {
        bundle.push(ModifierSource::Vip, tuning.vip_income_multiplier);
    }
    bundle.push(ModifierSource::Event, events.seasonal_income_multiplier);
    if ledger.has_ad_boost(now) {
        bundle.push(ModifierSource::AdBoost, tuning.ad_boost_multiplier);
    }
    bundle
}

fn pct(percent: f64) -> f64 {
    1.0 + percent / 100.0
}

/// Fractional discount on the next purchase of an asset of `class`.
#[must_use]
pub fn buy_discount(
    class: AssetClass,
    ledger: &PlayerLedger,
    talents: &TalentBonuses,
    tuning: &Tuning,
) -> f64 {
    let reputation = ReputationEffects::from_ledger(ledger, tuning);
    let base = if class.is_shadow() {
        reputation.shadow_discount
    } else {
        reputation.legal_discount
    };
    (base + talents.trade_grip / 100.0).clamp(0.0, tuning.total_discount_cap)
}

/// Sum of rarity-scaled defense bonuses of equipped gear, capped.
#[must_use]
pub fn pvp_defense_bonus(record: &PlayerRecord, catalog: &Catalog, cap: f64) -> f64 {
    record
        .equipment
        .values()
        .filter_map(|item_id| catalog.item(item_id))
        .map(|item| item.rarity.defense_bonus())
        .sum::<f64>()
        .min(cap)
}

/// Flat fear or respect granted by equipped gear.
#[must_use]
pub fn equipment_reputation(record: &PlayerRecord, catalog: &Catalog, bonus: BonusType) -> i64 {
    let total: f64 = record
        .equipment
        .values()
        .filter_map(|item_id| catalog.item(item_id))
        .filter(|item| item.bonus_type == bonus)
        .map(|item| item.bonus)
        .sum();
    num_traits::cast::<f64, i64>(total.floor()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ItemSlot, TalentKind};
    use crate::ledger::PlayerId;

    fn catalog() -> Catalog {
        Catalog::load_default().unwrap()
    }

    #[test]
    fn reputation_clamps_are_independent() {
        let tuning = Tuning::default();
        let effects = ReputationEffects::from_reputation(1_000, 10, &tuning);
        assert!((effects.fear_income_bonus - 0.5).abs() < f64::EPSILON);
        assert!((effects.shadow_discount - 0.3).abs() < f64::EPSILON);
        assert!((effects.respect_suspicion_reduce - 0.05).abs() < 1e-12);
        assert!((effects.legal_discount - 0.1).abs() < 1e-12);
    }

    #[test]
    fn total_discount_caps_at_half() {
        let tuning = Tuning::default();
        let mut ledger = PlayerLedger::new(0.0, 0.0);
        ledger.reputation_fear = 100;
        let talents = TalentBonuses {
            trade_grip: 30.0,
            ..TalentBonuses::default()
        };
        let shadow = AssetClass::Shadow { suspicion_add: 1.0 };
        assert!((buy_discount(shadow, &ledger, &talents, &tuning) - 0.5).abs() < f64::EPSILON);
        let legal = AssetClass::Legal { suspicion_reduce: 1.0 };
        assert!((buy_discount(legal, &ledger, &talents, &tuning) - 0.3).abs() < 1e-12);
    }

    #[test]
    fn resolve_orders_factors_and_skips_inactive_sources() {
        let catalog = catalog();
        let mut record = PlayerRecord::new(PlayerId(1), 0.0, 0.0);
        record.ledger.prestige_multiplier = 1.24;
        record
            .equipment
            .insert(ItemSlot::Jacket, "jacket_neon".to_string());
        record.upgrades.insert("laundering_boost".to_string(), 1);
        record.upgrades.insert("ghost_upgrade".to_string(), 5);

        let bundle = resolve(&record, &catalog, &ActiveEvents::default(), 100.0);
        let sources: Vec<ModifierSource> =
            bundle.contributions.iter().map(|c| c.source).collect();
        assert_eq!(
            sources,
            vec![
                ModifierSource::Prestige,
                ModifierSource::Territory,
                ModifierSource::Equipment,
                ModifierSource::Upgrades,
                ModifierSource::Gang,
                ModifierSource::Talents,
                ModifierSource::Event,
            ]
        );
        assert!((bundle.factor(ModifierSource::Equipment) - 1.03).abs() < 1e-12);
        assert!((bundle.factor(ModifierSource::Upgrades) - 1.10).abs() < 1e-12);
        assert!((bundle.factor(ModifierSource::Vip) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn vip_and_ad_boost_enter_only_while_active() {
        let catalog = catalog();
        let mut record = PlayerRecord::new(PlayerId(1), 0.0, 0.0);
        record.ledger.is_vip = true;
        record.ledger.vip_until = 500.0;
        record.ledger.ad_boost_until = 200.0;

        let active = resolve(&record, &catalog, &ActiveEvents::default(), 100.0);
        assert!((active.income_multiplier() - 4.0).abs() < 1e-12);
        let expired = resolve(&record, &catalog, &ActiveEvents::default(), 600.0);
        assert!((expired.income_multiplier() - 1.0).abs() < 1e-12);
        assert!((active.without(ModifierSource::AdBoost).income_multiplier() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn talents_scale_by_catalog_effect() {
        let catalog = catalog();
        let mut record = PlayerRecord::new(PlayerId(1), 0.0, 0.0);
        record.talents.insert(TalentKind::QuickStart, 2);
        record.talents.insert(TalentKind::LootboxMaster, 3);
        let talents = TalentBonuses::from_record(&record, &catalog);
        assert!((talents.quick_start - 4_000.0).abs() < f64::EPSILON);
        assert!((talents.lootbox_master - 9.0).abs() < f64::EPSILON);
        assert!(talents.evasion.abs() < f64::EPSILON);
    }
}
