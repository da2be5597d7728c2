//! Businesses, upgrades, prestige and talents.
use log::info;
use std::sync::Arc;

use super::{
    AssetReceipt, EconomyEngine, PrestigeReceipt, PurchaseReceipt, TalentReceipt, UpgradeReceipt,
};
use crate::accrual::buy_cost;
use crate::catalog::{AssetClass, TalentKind, UpgradeEffect};
use crate::clock::Clock;
use crate::constants::LOG_TARGET_ENGINE;
use crate::error::{Conflict, EconomyError, EntityKind};
use crate::ledger::{Cooldowns, Counters, OwnedAsset, PlayerId};
use crate::modifiers::{TalentBonuses, buy_discount};
use crate::numbers::round_cents;
use crate::progression::{ActionEvent, ActionKind};
use crate::store::LedgerStore;

impl<S, C> EconomyEngine<S, C>
where
    S: LedgerStore,
    C: Clock,
{
    /// Buy a business, or raise an owned one by a level.
    ///
    /// # Errors
    ///
    /// Fails for unknown ids, locked businesses and short cash.
    pub async fn buy_asset(
        &self,
        id: PlayerId,
        asset_id: &str,
    ) -> Result<AssetReceipt, EconomyError> {
        let _guard = self.locks.acquire(id).await;
        let mut session = self.open_session(id).await?;
        let catalog = Arc::clone(&session.catalog);
        let def = catalog
            .asset(asset_id)
            .ok_or_else(|| EconomyError::not_found(EntityKind::Asset, asset_id))?;

        let record = &mut session.record;
        let current = record.level();
        if current < def.unlock_level {
            return Err(Conflict::LevelLocked {
                required: def.unlock_level,
                current,
            }
            .into());
        }

        let owned_level = record.asset(asset_id).map_or(0, |asset| asset.level);
        let talents = TalentBonuses::from_record(record, &catalog);
        let discount = buy_discount(def.class, &record.ledger, &talents, &catalog.tuning);
        let cost = buy_cost(def, owned_level, discount);
        record.ledger.debit(cost)?;

        let level = match record.asset_mut(asset_id) {
            Some(owned) => {
                owned.level = owned.level.saturating_add(1);
                owned.level
            }
            None => {
                record.assets.push(OwnedAsset::new(asset_id));
                1
            }
        };
        match def.class {
            AssetClass::Shadow { .. } => record.ledger.reputation_fear += 1,
            AssetClass::Legal { .. } => record.ledger.reputation_respect += 1,
        }

        self.track(&mut session, &[ActionEvent::once(id, ActionKind::BuyBusiness)]);
        let rates = self.current_rates(&session);
        self.commit(std::slice::from_ref(&session.record)).await?;
        Ok(AssetReceipt {
            asset_id: asset_id.to_string(),
            level,
            cost,
            discount,
            rates,
            settlement: session.settlement,
            cash: session.record.ledger.cash,
        })
    }

    /// Hire a manager for an owned business.
    ///
    /// # Errors
    ///
    /// Fails for unknown or unowned businesses, an existing manager, and
    /// short cash.
    pub async fn hire_manager(
        &self,
        id: PlayerId,
        asset_id: &str,
    ) -> Result<PurchaseReceipt, EconomyError> {
        let _guard = self.locks.acquire(id).await;
        let mut session = self.open_session(id).await?;
        let cost = session
            .catalog
            .asset(asset_id)
            .ok_or_else(|| EconomyError::not_found(EntityKind::Asset, asset_id))?
            .manager_cost;

        let record = &mut session.record;
        match record.asset(asset_id) {
            None => return Err(Conflict::AssetNotOwned.into()),
            Some(owned) if owned.has_manager => return Err(Conflict::ManagerAlreadyHired.into()),
            Some(_) => {}
        }
        record.ledger.debit(cost)?;
        if let Some(owned) = record.asset_mut(asset_id) {
            owned.has_manager = true;
        }

        self.commit(std::slice::from_ref(&session.record)).await?;
        Ok(PurchaseReceipt {
            target: asset_id.to_string(),
            cost,
            settlement: session.settlement,
            cash: session.record.ledger.cash,
        })
    }

    /// Buy the next level of an upgrade and apply its immediate effect.
    ///
    /// # Errors
    ///
    /// Fails for unknown upgrades and short cash.
    pub async fn buy_upgrade(
        &self,
        id: PlayerId,
        upgrade_id: &str,
    ) -> Result<UpgradeReceipt, EconomyError> {
        let _guard = self.locks.acquire(id).await;
        let mut session = self.open_session(id).await?;
        let catalog = Arc::clone(&session.catalog);
        let def = catalog
            .upgrade(upgrade_id)
            .ok_or_else(|| EconomyError::not_found(EntityKind::Upgrade, upgrade_id))?;

        let record = &mut session.record;
        let cost = round_cents(def.cost_at(record.upgrade_level(upgrade_id)));
        record.ledger.debit(cost)?;
        let level = {
            let entry = record.upgrades.entry(upgrade_id.to_string()).or_default();
            *entry = entry.saturating_add(1);
            *entry
        };

        let ledger = &mut record.ledger;
        match def.effect {
            UpgradeEffect::SuspicionReset => ledger.suspicion = 0.0,
            UpgradeEffect::RaidProtection => {
                ledger.raid_protection = ledger.raid_protection.saturating_add(1);
            }
            // Applied through the modifier bundle and fight power.
            UpgradeEffect::IncomeBoost | UpgradeEffect::Territory | UpgradeEffect::PvpDefense => {}
        }
        ledger.reputation_fear += def.fear_gain;
        ledger.reputation_respect += def.respect_gain;

        self.commit(std::slice::from_ref(&session.record)).await?;
        Ok(UpgradeReceipt {
            upgrade_id: upgrade_id.to_string(),
            level,
            effect: def.effect,
            cost,
            settlement: session.settlement,
            cash: session.record.ledger.cash,
        })
    }

    /// Reset the empire for a permanent income multiplier and a talent point.
    ///
    /// Businesses, upgrades and unopened cases are lost. Items, equipment,
    /// talents, gang standing and progression survive.
    ///
    /// # Errors
    ///
    /// Fails while the player is below the required level.
    pub async fn prestige(&self, id: PlayerId) -> Result<PrestigeReceipt, EconomyError> {
        let _guard = self.locks.acquire(id).await;
        let mut session = self.open_session(id).await?;
        let tuning = &session.catalog.tuning;
        let record = &mut session.record;

        let prestige_level = record.ledger.prestige_level;
        let required = tuning.prestige_required_level(prestige_level);
        let current = record.level();
        if current < required {
            return Err(Conflict::LevelLocked { required, current }.into());
        }

        let talents = TalentBonuses::from_record(record, &session.catalog);
        let next_level = prestige_level.saturating_add(1);
        record.assets.clear();
        record.upgrades.clear();
        record.held_cases.clear();

        let ledger = &mut record.ledger;
        ledger.cash = tuning.starting_cash + talents.quick_start;
        ledger.suspicion = 0.0;
        ledger.reputation_fear =
            num_traits::cast::<f64, i64>(talents.intimidation.floor()).unwrap_or(0);
        ledger.reputation_respect = 0;
        ledger.raid_protection = 0;
        ledger.counters = Counters {
            total_earned: 0.0,
            total_robberies: 0,
            ..ledger.counters
        };
        ledger.cooldowns = Cooldowns {
            ad_until: ledger.cooldowns.ad_until,
            ..Cooldowns::default()
        };
        ledger.prestige_level = next_level;
        ledger.prestige_multiplier = tuning.prestige_multiplier(next_level);
        ledger.talent_points = ledger.talent_points.saturating_add(1);
        info!(
            target: LOG_TARGET_ENGINE,
            "player {id} prestiged to {next_level} (x{:.2})", ledger.prestige_multiplier
        );

        self.commit(std::slice::from_ref(&session.record)).await?;
        let ledger = &session.record.ledger;
        Ok(PrestigeReceipt {
            prestige_level: ledger.prestige_level,
            prestige_multiplier: ledger.prestige_multiplier,
            talent_points: ledger.talent_points,
            cash: ledger.cash,
            settlement: session.settlement,
        })
    }

    /// Spend one talent point on `talent`.
    ///
    /// # Errors
    ///
    /// Fails without points, at max level, or for talents missing from the
    /// catalog.
    pub async fn assign_talent(
        &self,
        id: PlayerId,
        talent: TalentKind,
    ) -> Result<TalentReceipt, EconomyError> {
        let _guard = self.locks.acquire(id).await;
        let mut session = self.open_session(id).await?;
        let max_level = session
            .catalog
            .talent(talent)
            .ok_or_else(|| EconomyError::not_found(EntityKind::Talent, talent.key()))?
            .max_level;

        let record = &mut session.record;
        let level = record.talent_level(talent);
        if level >= max_level {
            return Err(Conflict::TalentMaxed { max_level }.into());
        }
        if record.ledger.talent_points == 0 {
            return Err(Conflict::NoTalentPoints.into());
        }
        record.ledger.talent_points -= 1;
        record.talents.insert(talent, level + 1);

        self.commit(std::slice::from_ref(&session.record)).await?;
        Ok(TalentReceipt {
            talent,
            level: level + 1,
            points_left: session.record.ledger.talent_points,
        })
    }
}
