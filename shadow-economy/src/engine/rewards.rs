//! Ads, daily missions, login streaks and the season, event and VIP claims.
use log::info;
use std::sync::Arc;

use super::{
    AdReceipt, AdReward, ClaimReceipt, EconomyEngine, LoginReceipt, MilestoneReceipt,
    MissionReceipt, SeasonRewardReceipt, Session, VipCaseReceipt, ensure_ready,
};
use crate::catalog::{Reward, SeasonTrack};
use crate::clock::{Clock, utc_day_key};
use crate::constants::{LOG_TARGET_ENGINE, SECONDS_PER_DAY};
use crate::error::{Conflict, CooldownKind, EconomyError, EntityKind};
use crate::ledger::PlayerId;
use crate::progression::season_level;
use crate::store::LedgerStore;

impl<S, C> EconomyEngine<S, C>
where
    S: LedgerStore,
    C: Clock,
{
    /// Grant the reward for a watched ad and start the ad cooldown.
    ///
    /// # Errors
    ///
    /// Fails for VIP players and while the ad cooldown runs.
    pub async fn ad_reward(
        &self,
        id: PlayerId,
        reward: AdReward,
    ) -> Result<AdReceipt, EconomyError> {
        let _guard = self.locks.acquire(id).await;
        let mut session = self.open_session(id).await?;
        let now = session.now;
        let tuning = &session.catalog.tuning;
        let ledger = &mut session.record.ledger;
        if ledger.is_vip_active(now) {
            return Err(Conflict::VipAdBlocked.into());
        }
        ensure_ready(CooldownKind::Ad, ledger.cooldowns.ad_until, now)?;

        match reward {
            AdReward::IncomeBoost => ledger.ad_boost_until = now + tuning.ad_boost_seconds,
            AdReward::FreeBet => ledger.credit(tuning.ad_free_bet_cash),
            AdReward::ResetCooldown => ledger.cooldowns.robbery_until = 0.0,
        }
        ledger.cooldowns.ad_until = now + tuning.ad_cooldown_seconds;

        self.commit(std::slice::from_ref(&session.record)).await?;
        let ledger = &session.record.ledger;
        Ok(AdReceipt {
            reward,
            settlement: session.settlement,
            cash: ledger.cash,
            ad_boost_until: ledger.ad_boost_until,
            next_ad_at: ledger.cooldowns.ad_until,
        })
    }

    /// Pay out a completed daily mission.
    ///
    /// # Errors
    ///
    /// Fails for missions not in the current set, unfinished missions and
    /// repeat claims.
    pub async fn claim_mission(
        &self,
        id: PlayerId,
        mission_id: &str,
    ) -> Result<MissionReceipt, EconomyError> {
        let _guard = self.locks.acquire(id).await;
        let mut session = self.open_session(id).await?;
        let record = &mut session.record;
        let mission = record
            .progression
            .missions
            .iter_mut()
            .find(|mission| mission.mission_id == mission_id)
            .ok_or_else(|| EconomyError::not_found(EntityKind::Mission, mission_id))?;
        if !mission.completed {
            return Err(Conflict::MissionIncomplete.into());
        }
        if mission.claimed {
            return Err(Conflict::AlreadyClaimed.into());
        }
        mission.claimed = true;
        let reward = mission.reward;
        record.ledger.credit(reward);

        self.commit(std::slice::from_ref(&session.record)).await?;
        Ok(MissionReceipt {
            mission_id: mission_id.to_string(),
            reward,
            cash: session.record.ledger.cash,
        })
    }

    /// Claim the reward of a reached season-pass level on one track.
    ///
    /// # Errors
    ///
    /// Fails for levels outside the pass or without a reward on `track`,
    /// levels above the current one, premium claims without the pass and
    /// repeat claims.
    pub async fn claim_season_reward(
        &self,
        id: PlayerId,
        level: u32,
        track: SeasonTrack,
    ) -> Result<SeasonRewardReceipt, EconomyError> {
        let _guard = self.locks.acquire(id).await;
        let mut session = self.open_session(id).await?;
        let catalog = Arc::clone(&session.catalog);
        let pass = &catalog.season_pass;
        let not_found = || {
            EconomyError::not_found(EntityKind::SeasonReward, format!("{level}/{}", track.key()))
        };
        if level == 0 || level > pass.max_level {
            return Err(not_found());
        }
        let record = &mut session.record;
        let current = season_level(record.progression.season_xp, pass);
        if level > current {
            return Err(Conflict::SeasonLevelNotReached {
                required: level,
                current,
            }
            .into());
        }
        if track == SeasonTrack::Premium && !record.ledger.has_premium_pass {
            return Err(Conflict::PremiumPassRequired.into());
        }
        let reward = pass.reward(level, track).ok_or_else(not_found)?;
        if !record.progression.claims.season_track_mut(track).insert(level) {
            return Err(Conflict::AlreadyClaimed.into());
        }

        let claim = self.pay_out(session, reward).await?;
        Ok(SeasonRewardReceipt {
            level,
            track,
            claim,
        })
    }

    /// Claim milestone `milestone` of the active seasonal event.
    ///
    /// # Errors
    ///
    /// Fails when no event is active, for unknown milestones, repeat claims
    /// and scores below the milestone target.
    pub async fn claim_event_milestone(
        &self,
        id: PlayerId,
        milestone: usize,
    ) -> Result<MilestoneReceipt, EconomyError> {
        let _guard = self.locks.acquire(id).await;
        let mut session = self.open_session(id).await?;
        let catalog = Arc::clone(&session.catalog);
        let event = catalog
            .active_seasonal_event()
            .ok_or_else(|| EconomyError::not_found(EntityKind::SeasonalEvent, "active"))?;
        let entry = event.milestones.get(milestone).ok_or_else(|| {
            EconomyError::not_found(EntityKind::Milestone, format!("{}#{milestone}", event.id))
        })?;
        let progression = &mut session.record.progression;
        let claimed = progression
            .claims
            .event_milestones
            .get(&event.id)
            .is_some_and(|claimed| claimed.contains(&milestone));
        if claimed {
            return Err(Conflict::AlreadyClaimed.into());
        }
        let progress = progression.event_scores.get(&event.id).copied().unwrap_or(0);
        if progress < entry.target {
            return Err(Conflict::MilestoneNotReached {
                target: entry.target,
                progress,
            }
            .into());
        }
        progression
            .claims
            .event_milestones
            .entry(event.id.clone())
            .or_default()
            .insert(milestone);

        let claim = self.pay_out(session, &entry.reward).await?;
        Ok(MilestoneReceipt {
            event_id: event.id.clone(),
            milestone,
            claim,
        })
    }

    /// Claim today's login reward. Consecutive UTC days extend the streak,
    /// a missed day restarts it at one.
    ///
    /// # Errors
    ///
    /// Fails on a second claim in the same UTC day or when the catalog has
    /// no login rewards.
    pub async fn claim_login(&self, id: PlayerId) -> Result<LoginReceipt, EconomyError> {
        let _guard = self.locks.acquire(id).await;
        let mut session = self.open_session(id).await?;
        let catalog = Arc::clone(&session.catalog);
        let today = utc_day_key(session.now);
        let yesterday = utc_day_key(session.now - SECONDS_PER_DAY);
        let claims = &mut session.record.progression.claims;
        if claims.last_login_day.as_deref() == Some(today.as_str()) {
            return Err(Conflict::AlreadyClaimed.into());
        }
        let streak = if claims.last_login_day.as_deref() == Some(yesterday.as_str()) {
            claims.login_streak.saturating_add(1)
        } else {
            1
        };
        let cycle = catalog.login_rewards.len();
        let index = usize::try_from(streak - 1).unwrap_or(0) % cycle.max(1);
        let reward = catalog
            .login_rewards
            .get(index)
            .ok_or_else(|| EconomyError::not_found(EntityKind::LoginReward, streak.to_string()))?;
        claims.login_streak = streak;
        claims.last_login_day = Some(today);

        let reward_day = u32::try_from(index + 1).unwrap_or(u32::MAX);
        let claim = self.pay_out(session, reward).await?;
        Ok(LoginReceipt {
            streak,
            reward_day,
            claim,
        })
    }

    /// Hand an active VIP today's free case.
    ///
    /// # Errors
    ///
    /// Fails for players without active VIP and on a second claim in the same
    /// UTC day.
    pub async fn claim_vip_case(&self, id: PlayerId) -> Result<VipCaseReceipt, EconomyError> {
        let _guard = self.locks.acquire(id).await;
        let mut session = self.open_session(id).await?;
        let today = utc_day_key(session.now);
        let case_id = session.catalog.tuning.vip_daily_case.clone();
        let record = &mut session.record;
        if !record.ledger.is_vip_active(session.now) {
            return Err(Conflict::VipRequired.into());
        }
        let claims = &mut record.progression.claims;
        if claims.last_vip_case_day.as_deref() == Some(today.as_str()) {
            return Err(Conflict::AlreadyClaimed.into());
        }
        claims.last_vip_case_day = Some(today);
        let held_case_id = record.hold_case(case_id.clone());

        self.commit(std::slice::from_ref(&session.record)).await?;
        info!(target: LOG_TARGET_ENGINE, "player {id} claimed VIP case {case_id}");
        Ok(VipCaseReceipt {
            held_case_id,
            case_id,
            settlement: session.settlement,
        })
    }

    /// Grant `reward` on an already validated session and commit it.
    async fn pay_out(
        &self,
        mut session: Session,
        reward: &Reward,
    ) -> Result<ClaimReceipt, EconomyError> {
        let held_case_id = session.record.grant(reward);
        self.commit(std::slice::from_ref(&session.record)).await?;
        info!(target: LOG_TARGET_ENGINE, "player {} claimed {reward:?}", session.record.id);
        Ok(ClaimReceipt {
            reward: reward.clone(),
            held_case_id,
            settlement: session.settlement,
            cash: session.record.ledger.cash,
        })
    }
}
