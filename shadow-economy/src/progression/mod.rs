//! Progression fan-out.
//!
//! Every successful action publishes one [`ActionEvent`]. The tracker hands
//! it to each registered [`Subscriber`] in turn; a failing subscriber is
//! rolled back and logged while the others still run.

pub mod missions;
pub mod quests;
pub mod season;
pub mod tournament;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

use crate::catalog::{Catalog, SeasonTrack};
use crate::constants::LOG_TARGET_PROGRESS;
use crate::ledger::{PlayerId, PlayerRecord};

pub use missions::{DailyMission, MissionSubscriber, ensure_daily_missions};
pub use quests::{QuestProgress, QuestSubscriber};
pub use season::{SeasonPassSubscriber, SeasonalEventSubscriber, season_level};
pub use tournament::TournamentSubscriber;

/// Trackable player actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    EarnCash,
    BuyBusiness,
    Robbery,
    RobberySuccess,
    CasinoPlay,
    CasinoWin,
    PvpAttack,
    PvpWin,
    ShopBuy,
    CaseOpen,
}

impl ActionKind {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::EarnCash => "earn_cash",
            Self::BuyBusiness => "buy_business",
            Self::Robbery => "robbery",
            Self::RobberySuccess => "robbery_success",
            Self::CasinoPlay => "casino_play",
            Self::CasinoWin => "casino_win",
            Self::PvpAttack => "pvp_attack",
            Self::PvpWin => "pvp_win",
            Self::ShopBuy => "shop_buy",
            Self::CaseOpen => "case_open",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionEvent {
    pub player: PlayerId,
    pub kind: ActionKind,
    pub amount: u64,
}

impl ActionEvent {
    #[must_use]
    pub const fn new(player: PlayerId, kind: ActionKind, amount: u64) -> Self {
        Self {
            player,
            kind,
            amount,
        }
    }

    /// Event with the default amount of one.
    #[must_use]
    pub const fn once(player: PlayerId, kind: ActionKind) -> Self {
        Self::new(player, kind, 1)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProgressError {
    #[error("quest `{quest_id}` rewards unknown case `{case_id}`")]
    UnknownRewardCase { quest_id: String, case_id: String },
    #[error("{subscriber}: {reason}")]
    Rejected {
        subscriber: &'static str,
        reason: String,
    },
}

/// Per-player progression, persisted as part of the record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionState {
    /// UTC day (`YYYY-MM-DD`) the current mission set was drawn for.
    pub missions_day: Option<String>,
    pub missions: Vec<DailyMission>,
    /// Tournament score keyed by UTC day.
    pub tournament_scores: BTreeMap<String, u64>,
    pub quests: BTreeMap<String, QuestProgress>,
    /// Seasonal event score keyed by event id.
    pub event_scores: BTreeMap<String, u64>,
    pub season_xp: u64,
    pub claims: RewardClaims,
}

/// Rewards already handed out, so each pays at most once.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardClaims {
    pub season_free: BTreeSet<u32>,
    pub season_premium: BTreeSet<u32>,
    /// Claimed milestone indices keyed by event id.
    pub event_milestones: BTreeMap<String, BTreeSet<usize>>,
    pub login_streak: u32,
    /// UTC day of the last login reward.
    pub last_login_day: Option<String>,
    /// UTC day of the last VIP daily case.
    pub last_vip_case_day: Option<String>,
}

impl RewardClaims {
    pub fn season_track_mut(&mut self, track: SeasonTrack) -> &mut BTreeSet<u32> {
        match track {
            SeasonTrack::Free => &mut self.season_free,
            SeasonTrack::Premium => &mut self.season_premium,
        }
    }
}

/// Read-only facts shared by every subscriber for one event.
#[derive(Debug, Clone, Copy)]
pub struct TrackContext<'a> {
    pub catalog: &'a Catalog,
    pub day: &'a str,
    pub player_level: u32,
}

/// A consumer of action events.
pub trait Subscriber: Send + Sync {
    fn name(&self) -> &'static str;

    /// Apply `event` to `record`.
    ///
    /// # Errors
    ///
    /// Returns a [`ProgressError`] when the event cannot be applied; the
    /// tracker then discards every change this subscriber made.
    fn on_event(
        &self,
        record: &mut PlayerRecord,
        event: &ActionEvent,
        ctx: &TrackContext<'_>,
    ) -> Result<(), ProgressError>;
}

/// Which subscribers saw an event and which failed.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TrackReport {
    pub applied: Vec<&'static str>,
    pub failed: Vec<(&'static str, String)>,
}

impl TrackReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct ProgressionTracker {
    subscribers: Vec<Box<dyn Subscriber>>,
}

impl std::fmt::Debug for ProgressionTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.subscribers.iter().map(|s| s.name()).collect();
        f.debug_struct("ProgressionTracker")
            .field("subscribers", &names)
            .finish()
    }
}

impl Default for ProgressionTracker {
    /// Missions, tournament, quests, seasonal event and season pass.
    fn default() -> Self {
        Self::empty()
            .with(MissionSubscriber)
            .with(TournamentSubscriber)
            .with(QuestSubscriber)
            .with(SeasonalEventSubscriber)
            .with(SeasonPassSubscriber)
    }
}

impl ProgressionTracker {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with(mut self, subscriber: impl Subscriber + 'static) -> Self {
        self.subscribers.push(Box::new(subscriber));
        self
    }

    #[must_use]
    pub fn subscriber_names(&self) -> Vec<&'static str> {
        self.subscribers.iter().map(|s| s.name()).collect()
    }

    /// Publish `event` to every subscriber in registration order.
    pub fn track(
        &self,
        record: &mut PlayerRecord,
        event: &ActionEvent,
        ctx: &TrackContext<'_>,
    ) -> TrackReport {
        let mut report = TrackReport::default();
        for subscriber in &self.subscribers {
            let snapshot = record.clone();
            match subscriber.on_event(record, event, ctx) {
                Ok(()) => report.applied.push(subscriber.name()),
                Err(err) => {
                    *record = snapshot;
                    warn!(
                        target: LOG_TARGET_PROGRESS,
                        "{} failed on {} for player {}: {err}",
                        subscriber.name(),
                        event.kind.key(),
                        event.player
                    );
                    report.failed.push((subscriber.name(), err.to_string()));
                }
            }
        }
        debug!(
            target: LOG_TARGET_PROGRESS,
            "tracked {} x{} for player {}: {} applied, {} failed",
            event.kind.key(),
            event.amount,
            event.player,
            report.applied.len(),
            report.failed.len()
        );
        report
    }
}
