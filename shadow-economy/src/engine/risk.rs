//! Robberies, the casino and PvP fights.
use log::info;
use std::sync::Arc;

use super::{
    CasinoReceipt, EconomyEngine, PvpReceipt, RobberyReceipt, Session, ensure_ready, settle,
};
use crate::casino::{self, Wager};
use crate::catalog::{CasinoGame, Catalog};
use crate::clock::Clock;
use crate::constants::{LOG_TARGET_ENGINE, ROBBERY_FEAR_GAIN};
use crate::error::{Conflict, CooldownKind, EconomyError, EntityKind};
use crate::ledger::PlayerId;
use crate::modifiers::{ActiveEvents, TalentBonuses};
use crate::numbers::{floor_f64_to_u64, is_positive_finite};
use crate::progression::{ActionEvent, ActionKind};
use crate::pvp::{FightStakes, fight, power_sheet};
use crate::rng::RngDomain;
use crate::robbery::{attempt, cooldown_secs};
use crate::store::LedgerStore;

impl<S, C> EconomyEngine<S, C>
where
    S: LedgerStore,
    C: Clock,
{
    /// Attempt a robbery. Success or failure, the cooldown starts and fear
    /// grows.
    ///
    /// # Errors
    ///
    /// Fails for unknown or locked robberies and while the cooldown runs.
    pub async fn rob(
        &self,
        id: PlayerId,
        robbery_id: &str,
    ) -> Result<RobberyReceipt, EconomyError> {
        let _guard = self.locks.acquire(id).await;
        let mut session = self.open_session(id).await?;
        let catalog = Arc::clone(&session.catalog);
        let def = catalog
            .robbery(robbery_id)
            .ok_or_else(|| EconomyError::not_found(EntityKind::Robbery, robbery_id))?;
        let current = session.record.level();
        if current < def.unlock_level {
            return Err(Conflict::LevelLocked {
                required: def.unlock_level,
                current,
            }
            .into());
        }
        let now = session.now;
        ensure_ready(
            CooldownKind::Robbery,
            session.record.ledger.cooldowns.robbery_until,
            now,
        )?;

        let talents = TalentBonuses::from_record(&session.record, &catalog);
        let reward_bonus_pct =
            talents.big_loot + ActiveEvents::at(&catalog, now).weekly_robbery_reward_pct;
        let roll = {
            let mut rng = self.rng.stream(RngDomain::Robbery);
            attempt(
                def,
                session.record.ledger.reputation_fear,
                reward_bonus_pct,
                &mut *rng,
            )
        };

        let ledger = &mut session.record.ledger;
        ledger.credit(roll.reward);
        ledger.adjust_suspicion(roll.suspicion_gain, catalog.tuning.max_suspicion);
        let cooldown_until = now + cooldown_secs(def, talents.robbery_master);
        ledger.cooldowns.robbery_until = cooldown_until;
        ledger.reputation_fear += ROBBERY_FEAR_GAIN;
        ledger.counters.total_robberies += 1;

        let mut events = vec![ActionEvent::once(id, ActionKind::Robbery)];
        if roll.success {
            events.push(ActionEvent::once(id, ActionKind::RobberySuccess));
        }
        self.track(&mut session, &events);
        self.commit(std::slice::from_ref(&session.record)).await?;
        Ok(RobberyReceipt {
            robbery_id: robbery_id.to_string(),
            roll,
            cooldown_until,
            settlement: session.settlement,
            cash: session.record.ledger.cash,
            suspicion: session.record.ledger.suspicion,
        })
    }

    /// Play one casino round.
    ///
    /// # Errors
    ///
    /// Fails for games without limits, bets outside the table limits,
    /// malformed choices and short cash.
    pub async fn play_casino(
        &self,
        id: PlayerId,
        game: CasinoGame,
        choice: &str,
        bet: f64,
    ) -> Result<CasinoReceipt, EconomyError> {
        if !is_positive_finite(bet) {
            return Err(EconomyError::InvalidAmount {
                field: "bet",
                value: bet,
            });
        }
        let _guard = self.locks.acquire(id).await;
        let mut session = self.open_session(id).await?;
        let limits = session
            .catalog
            .bet_limits(game)
            .ok_or_else(|| EconomyError::not_found(EntityKind::CasinoGame, game.key()))?;
        let lucky = TalentBonuses::from_record(&session.record, &session.catalog).lucky;
        if bet < limits.min_bet || bet > limits.max_bet + lucky {
            return Err(EconomyError::InvalidAmount {
                field: "bet",
                value: bet,
            });
        }
        let wager = Wager::parse(game, choice)?;
        session.record.ledger.debit(bet)?;

        let round = {
            let mut rng = self.rng.stream(RngDomain::Casino);
            casino::play(wager, bet, &mut *rng)
        };
        let ledger = &mut session.record.ledger;
        ledger.credit(round.payout);
        ledger.counters.casino_plays += 1;
        let mut events = vec![ActionEvent::once(id, ActionKind::CasinoPlay)];
        if round.is_win() {
            ledger.counters.casino_wins += 1;
            events.push(ActionEvent::once(id, ActionKind::CasinoWin));
        }

        self.track(&mut session, &events);
        self.commit(std::slice::from_ref(&session.record)).await?;
        Ok(CasinoReceipt {
            wager,
            bet,
            net: round.net(bet),
            round,
            settlement: session.settlement,
            cash: session.record.ledger.cash,
        })
    }

    /// Attack another player. Both records are settled and committed
    /// together; the defender is notified afterwards.
    ///
    /// # Errors
    ///
    /// Fails on self-attack, for unknown players, below the cash minimum and
    /// while the attacker's cooldown runs.
    pub async fn pvp_attack(
        &self,
        attacker: PlayerId,
        defender: PlayerId,
    ) -> Result<PvpReceipt, EconomyError> {
        if attacker == defender {
            return Err(Conflict::SelfTarget.into());
        }
        let guard = self.locks.acquire_pair(attacker, defender).await;
        let catalog = self.catalog();
        let now = self.clock.now();
        let mut attacking = self.paired_session(attacker, &catalog, now).await?;
        let mut defending = self.paired_session(defender, &catalog, now).await?;

        let tuning = &catalog.tuning;
        let cash = attacking.record.ledger.cash;
        if cash < tuning.pvp_min_cash_to_attack {
            return Err(EconomyError::InsufficientFunds {
                required: tuning.pvp_min_cash_to_attack,
                available: cash,
            });
        }
        ensure_ready(
            CooldownKind::Pvp,
            attacking.record.ledger.cooldowns.pvp_until,
            now,
        )?;

        let talents = TalentBonuses::from_record(&attacking.record, &catalog);
        let sheet = power_sheet(&attacking.record, &talents, &defending.record, &catalog);
        let stakes = FightStakes {
            attacker_cash: cash,
            defender_cash: defending.record.ledger.cash,
            steal_percent: tuning.pvp_steal_percent,
            steal_cap: tuning.pvp_steal_cap,
            loss_cap: tuning.pvp_loss_cap,
        };
        let outcome = {
            let mut rng = self.rng.stream(RngDomain::Pvp);
            fight(&sheet, &stakes, &mut *rng)
        };

        if outcome.attacker_won {
            defending.record.ledger.debit(outcome.transfer)?;
            attacking.record.ledger.credit(outcome.transfer);
            attacking.record.ledger.counters.pvp_wins += 1;
        } else {
            attacking.record.ledger.debit(outcome.transfer)?;
            defending.record.ledger.credit(outcome.transfer);
        }
        let cooldown_until = now + tuning.pvp_cooldown_seconds;
        attacking.record.ledger.cooldowns.pvp_until = cooldown_until;

        let mut events = vec![ActionEvent::once(attacker, ActionKind::PvpAttack)];
        if outcome.attacker_won {
            events.push(ActionEvent::once(attacker, ActionKind::PvpWin));
        }
        self.track(&mut attacking, &events);

        let records = [attacking.record, defending.record];
        self.commit(&records).await?;
        drop(guard);

        let verb = if outcome.attacker_won { "stole" } else { "lost" };
        info!(
            target: LOG_TARGET_ENGINE,
            "pvp {attacker} -> {defender}: attacker {verb} {:.2}", outcome.transfer
        );
        let amount = floor_f64_to_u64(outcome.transfer);
        let message = if outcome.attacker_won {
            format!("player {attacker} robbed you of ${amount}")
        } else {
            format!("you fought off player {attacker} and took ${amount}")
        };
        self.notify(defender, &message).await;

        Ok(PvpReceipt {
            defender,
            sheet,
            outcome,
            attacker_settlement: attacking.settlement,
            defender_settlement: defending.settlement,
            cash: records[0].ledger.cash,
            cooldown_until,
        })
    }

    /// Load and settle one side of a pair operation against a shared
    /// catalog snapshot and clock reading.
    async fn paired_session(
        &self,
        id: PlayerId,
        catalog: &Arc<Catalog>,
        now: f64,
    ) -> Result<Session, EconomyError> {
        let mut record = self.load(id).await?;
        let settlement = settle(&mut record, catalog, now);
        Ok(Session {
            catalog: Arc::clone(catalog),
            now,
            record,
            settlement,
        })
    }
}
