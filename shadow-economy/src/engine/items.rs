//! Shop items, equipment and cases.
use log::debug;
use std::sync::Arc;

use super::{CaseReceipt, EconomyEngine, EquipReceipt, LootReceipt, PurchaseReceipt, Session};
use crate::clock::Clock;
use crate::constants::LOG_TARGET_ENGINE;
use crate::error::{Conflict, EconomyError, EntityKind};
use crate::ledger::PlayerId;
use crate::loot::{self, LootOutcome, LootRules};
use crate::modifiers::{ActiveEvents, TalentBonuses};
use crate::progression::{ActionEvent, ActionKind};
use crate::rng::RngDomain;
use crate::store::LedgerStore;

impl<S, C> EconomyEngine<S, C>
where
    S: LedgerStore,
    C: Clock,
{
    /// Buy a shop item into the inventory.
    ///
    /// # Errors
    ///
    /// Fails for unknown, case-only, VIP-only or already owned items and for
    /// short cash.
    pub async fn buy_item(
        &self,
        id: PlayerId,
        item_id: &str,
    ) -> Result<PurchaseReceipt, EconomyError> {
        let _guard = self.locks.acquire(id).await;
        let mut session = self.open_session(id).await?;
        let catalog = Arc::clone(&session.catalog);
        let def = catalog
            .item(item_id)
            .ok_or_else(|| EconomyError::not_found(EntityKind::Item, item_id))?;
        if def.case_only {
            return Err(Conflict::CaseOnlyItem.into());
        }
        if def.vip_only {
            return Err(Conflict::VipOnlyItem.into());
        }
        if session.record.owns_item(item_id) {
            return Err(Conflict::ItemAlreadyOwned.into());
        }

        session.record.ledger.debit(def.price)?;
        session.record.inventory.insert(item_id.to_string());

        self.track(&mut session, &[ActionEvent::once(id, ActionKind::ShopBuy)]);
        self.commit(std::slice::from_ref(&session.record)).await?;
        Ok(PurchaseReceipt {
            target: item_id.to_string(),
            cost: def.price,
            settlement: session.settlement,
            cash: session.record.ledger.cash,
        })
    }

    /// Put an owned item into its slot, replacing whatever was there.
    ///
    /// # Errors
    ///
    /// Fails for unknown or unowned items.
    pub async fn equip_item(
        &self,
        id: PlayerId,
        item_id: &str,
    ) -> Result<EquipReceipt, EconomyError> {
        let _guard = self.locks.acquire(id).await;
        let mut session = self.open_session(id).await?;
        let slot = session
            .catalog
            .item(item_id)
            .ok_or_else(|| EconomyError::not_found(EntityKind::Item, item_id))?
            .slot;
        if !session.record.owns_item(item_id) {
            return Err(Conflict::ItemNotOwned.into());
        }

        let replaced = session
            .record
            .equipment
            .insert(slot, item_id.to_string())
            .filter(|previous| previous != item_id);

        self.commit(std::slice::from_ref(&session.record)).await?;
        Ok(EquipReceipt {
            item_id: item_id.to_string(),
            slot,
            replaced,
            settlement: session.settlement,
        })
    }

    /// Buy a case and keep it unopened.
    ///
    /// # Errors
    ///
    /// Fails for unknown cases and short cash.
    pub async fn buy_case(
        &self,
        id: PlayerId,
        case_id: &str,
    ) -> Result<CaseReceipt, EconomyError> {
        let _guard = self.locks.acquire(id).await;
        let mut session = self.open_session(id).await?;
        let cost = session
            .catalog
            .case(case_id)
            .ok_or_else(|| EconomyError::not_found(EntityKind::Case, case_id))?
            .price;

        session.record.ledger.debit(cost)?;
        let held_case_id = session.record.hold_case(case_id);

        self.commit(std::slice::from_ref(&session.record)).await?;
        Ok(CaseReceipt {
            held_case_id,
            case_id: case_id.to_string(),
            cost,
            settlement: session.settlement,
            cash: session.record.ledger.cash,
        })
    }

    /// Open a case bought earlier.
    ///
    /// # Errors
    ///
    /// Fails for unknown handles, cases dropped from the catalog, and
    /// malformed loot pools.
    pub async fn open_case(
        &self,
        id: PlayerId,
        held_case_id: u64,
    ) -> Result<LootReceipt, EconomyError> {
        let _guard = self.locks.acquire(id).await;
        let mut session = self.open_session(id).await?;
        let held = session.record.take_case(held_case_id).ok_or_else(|| {
            EconomyError::not_found(EntityKind::HeldCase, held_case_id.to_string())
        })?;

        let outcome = self.unbox(&mut session, &held.case_id)?;
        self.commit(std::slice::from_ref(&session.record)).await?;
        Ok(LootReceipt {
            case_id: held.case_id,
            outcome,
            settlement: session.settlement,
            cash: session.record.ledger.cash,
        })
    }

    /// Buy a case and open it on the spot.
    ///
    /// # Errors
    ///
    /// Fails for unknown cases, short cash and malformed loot pools.
    pub async fn spin_case(
        &self,
        id: PlayerId,
        case_id: &str,
    ) -> Result<LootReceipt, EconomyError> {
        let _guard = self.locks.acquire(id).await;
        let mut session = self.open_session(id).await?;
        let cost = session
            .catalog
            .case(case_id)
            .ok_or_else(|| EconomyError::not_found(EntityKind::Case, case_id))?
            .price;
        session.record.ledger.debit(cost)?;

        let outcome = self.unbox(&mut session, case_id)?;
        self.commit(std::slice::from_ref(&session.record)).await?;
        Ok(LootReceipt {
            case_id: case_id.to_string(),
            outcome,
            settlement: session.settlement,
            cash: session.record.ledger.cash,
        })
    }

    /// Draw from `case_id` and apply the result to the session record.
    fn unbox(&self, session: &mut Session, case_id: &str) -> Result<LootOutcome, EconomyError> {
        let catalog = Arc::clone(&session.catalog);
        let case = catalog
            .case(case_id)
            .ok_or_else(|| EconomyError::not_found(EntityKind::Case, case_id))?;
        let boost = TalentBonuses::from_record(&session.record, &catalog).lootbox_master
            + ActiveEvents::at(&catalog, session.now).weekly_rarity_boost_pct;
        let rules = LootRules {
            max_rerolls: catalog.tuning.loot_max_rerolls,
            compensation_factor: catalog.tuning.loot_compensation_factor,
        };

        let outcome = {
            let mut rng = self.rng.stream(RngDomain::Loot);
            loot::open(
                &case.loot,
                |item_id| catalog.rarity_of(item_id),
                &session.record.inventory,
                boost,
                case.price,
                rules,
                &mut *rng,
            )?
        };
        match &outcome {
            LootOutcome::Item { item_id, .. } => {
                session.record.inventory.insert(item_id.clone());
            }
            LootOutcome::Compensation { cash, .. } => {
                session.record.ledger.credit(*cash);
            }
        }
        debug!(
            target: LOG_TARGET_ENGINE,
            "player {} opened {case_id}: {outcome:?}", session.record.id
        );

        let player = session.record.id;
        self.track(session, &[ActionEvent::once(player, ActionKind::CaseOpen)]);
        Ok(outcome)
    }
}
