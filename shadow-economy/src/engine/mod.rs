//! The economy engine: every player-facing operation.
//!
//! Each operation runs the same pipeline: acquire the player guard, load the
//! record, settle offline time, validate and apply the action on the private
//! copy, publish progression events, then commit once. Validation failures
//! return before the commit, so the store never sees a partial operation.

mod assets;
mod items;
mod receipts;
mod rewards;
mod risk;

use log::{debug, info, warn};
use std::sync::{Arc, PoisonError, RwLock};

use crate::accrual::{Rates, rate};
use crate::catalog::{Catalog, CatalogError};
use crate::clock::{Clock, utc_day_key};
use crate::constants::LOG_TARGET_ENGINE;
use crate::error::{Conflict, CooldownKind, EconomyError};
use crate::guard::LockTable;
use crate::ledger::{Cooldowns, PlayerId, PlayerRecord};
use crate::modifiers::{ActiveEvents, ModifierBundle, resolve};
use crate::numbers::{ceil_f64_to_u64, floor_f64_to_u64};
use crate::offline::{self, SyncOutcome};
use crate::progression::{
    ActionEvent, ActionKind, ProgressionTracker, TrackContext, ensure_daily_missions,
};
use crate::rng::{RngDomain, RngStreams};
use crate::store::LedgerStore;

pub use receipts::{
    AdReward, AdReceipt, AssetReceipt, CaseReceipt, CasinoReceipt, ClaimReceipt, CollectReceipt,
    EquipReceipt, LoginReceipt, LootReceipt, MilestoneReceipt, MissionReceipt, PrestigeReceipt,
    PurchaseReceipt, PvpReceipt, RobberyReceipt, SeasonRewardReceipt, Settlement, TalentReceipt,
    UpgradeReceipt, VipCaseReceipt,
};

/// Out-of-band messages to players, such as "you were attacked".
///
/// Delivery is best effort: the engine logs failures and carries on.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver `message` to `player`.
    ///
    /// # Errors
    ///
    /// Returns an error if the message could not be handed off.
    async fn notify(&self, player: PlayerId, message: &str) -> anyhow::Result<()>;
}

pub struct EconomyEngine<S, C>
where
    S: LedgerStore,
    C: Clock,
{
    store: S,
    clock: C,
    catalog: RwLock<Arc<Catalog>>,
    locks: LockTable,
    rng: RngStreams,
    tracker: ProgressionTracker,
    notifier: Option<Box<dyn Notifier>>,
}

impl<S, C> std::fmt::Debug for EconomyEngine<S, C>
where
    S: LedgerStore,
    C: Clock,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EconomyEngine")
            .field("shards", &self.locks.shard_count())
            .field("tracker", &self.tracker)
            .field("notifier", &self.notifier.is_some())
            .finish_non_exhaustive()
    }
}

/// A loaded record with the catalog snapshot and clock reading it was
/// settled against.
struct Session {
    catalog: Arc<Catalog>,
    now: f64,
    record: PlayerRecord,
    settlement: Settlement,
}

impl<S, C> EconomyEngine<S, C>
where
    S: LedgerStore,
    C: Clock,
{
    /// Engine with entropy-seeded randomness and the default subscribers.
    #[must_use]
    pub fn new(store: S, clock: C, catalog: Catalog) -> Self {
        Self {
            store,
            clock,
            catalog: RwLock::new(Arc::new(catalog)),
            locks: LockTable::default(),
            rng: RngStreams::from_entropy(),
            tracker: ProgressionTracker::default(),
            notifier: None,
        }
    }

    /// Replace the RNG streams with ones derived from `seed`.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = RngStreams::from_user_seed(seed);
        self
    }

    #[must_use]
    pub fn with_tracker(mut self, tracker: ProgressionTracker) -> Self {
        self.tracker = tracker;
        self
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: impl Notifier + 'static) -> Self {
        self.notifier = Some(Box::new(notifier));
        self
    }

    #[must_use]
    pub fn with_lock_shards(mut self, shards: usize) -> Self {
        self.locks = LockTable::new(shards);
        self
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub const fn rng(&self) -> &RngStreams {
        &self.rng
    }

    /// The catalog new operations will start with.
    #[must_use]
    pub fn catalog(&self) -> Arc<Catalog> {
        let active = self.catalog.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&active)
    }

    /// Validate and install a new catalog. Operations already running keep
    /// the snapshot they started with.
    ///
    /// # Errors
    ///
    /// Returns the validation failure; the active catalog is kept then.
    pub fn reload_catalog(&self, catalog: Catalog) -> Result<(), CatalogError> {
        catalog.validate()?;
        *self.catalog.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(catalog);
        info!(target: LOG_TARGET_ENGINE, "catalog reloaded");
        Ok(())
    }

    /// Create a fresh record for `id`.
    ///
    /// # Errors
    ///
    /// Fails with a conflict if the player exists, or on store failure.
    pub async fn register(&self, id: PlayerId) -> Result<PlayerRecord, EconomyError> {
        let _guard = self.locks.acquire(id).await;
        if self.store.load(id).await?.is_some() {
            return Err(Conflict::AlreadyRegistered.into());
        }
        let catalog = self.catalog();
        let record = PlayerRecord::new(id, catalog.tuning.starting_cash, self.clock.now());
        self.commit(std::slice::from_ref(&record)).await?;
        info!(target: LOG_TARGET_ENGINE, "registered player {id}");
        Ok(record)
    }

    /// Current stored record without settling; `None` for unknown players.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn snapshot(&self, id: PlayerId) -> Result<Option<PlayerRecord>, EconomyError> {
        Ok(self.store.load(id).await?)
    }

    /// Settle offline time and report it.
    ///
    /// # Errors
    ///
    /// Fails for unknown players or on store failure.
    pub async fn collect(&self, id: PlayerId) -> Result<CollectReceipt, EconomyError> {
        let _guard = self.locks.acquire(id).await;
        let mut session = self.open_session(id).await?;
        let earned = floor_f64_to_u64(session.settlement.earned);
        if earned > 0 {
            self.track(
                &mut session,
                &[ActionEvent::new(id, ActionKind::EarnCash, earned)],
            );
        }
        let rates = self.current_rates(&session);
        self.commit(std::slice::from_ref(&session.record)).await?;
        Ok(CollectReceipt {
            settlement: session.settlement,
            rates,
            cash: session.record.ledger.cash,
        })
    }

    async fn load(&self, id: PlayerId) -> Result<PlayerRecord, EconomyError> {
        self.store
            .load(id)
            .await?
            .ok_or_else(|| EconomyError::player_not_found(id))
    }

    /// Load and settle one player at a fresh clock reading.
    async fn open_session(&self, id: PlayerId) -> Result<Session, EconomyError> {
        let catalog = self.catalog();
        let now = self.clock.now();
        let mut record = self.load(id).await?;
        let settlement = settle(&mut record, &catalog, now);
        Ok(Session {
            catalog,
            now,
            record,
            settlement,
        })
    }

    /// Draw today's missions if needed and publish `events`.
    fn track(&self, session: &mut Session, events: &[ActionEvent]) {
        if events.is_empty() {
            return;
        }
        let day = utc_day_key(session.now);
        {
            let mut rng = self.rng.stream(RngDomain::Missions);
            ensure_daily_missions(&mut session.record, &session.catalog, &day, &mut *rng);
        }
        let ctx = TrackContext {
            catalog: &session.catalog,
            day: &day,
            player_level: session.record.level(),
        };
        for event in events {
            let report = self.tracker.track(&mut session.record, event, &ctx);
            if !report.is_clean() {
                debug!(
                    target: LOG_TARGET_ENGINE,
                    "player {} progression partially applied: {:?}", event.player, report.failed
                );
            }
        }
    }

    fn current_rates(&self, session: &Session) -> Rates {
        let bundle = bundle_for(&session.record, &session.catalog, session.now);
        let ledger = &session.record.ledger;
        rate(
            &session.catalog,
            &session.record.assets,
            ledger.reputation_fear,
            ledger.reputation_respect,
            &bundle,
        )
        .rounded()
    }

    async fn commit(&self, records: &[PlayerRecord]) -> Result<(), EconomyError> {
        self.store.commit(records).await.map_err(|err| {
            warn!(target: LOG_TARGET_ENGINE, "commit of {} record(s) failed: {err}", records.len());
            EconomyError::from(err)
        })?;
        debug!(target: LOG_TARGET_ENGINE, "committed {} record(s)", records.len());
        Ok(())
    }

    async fn notify(&self, player: PlayerId, message: &str) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        if let Err(err) = notifier.notify(player, message).await {
            warn!(target: LOG_TARGET_ENGINE, "notify player {player} failed: {err:#}");
        }
    }
}

fn bundle_for(record: &PlayerRecord, catalog: &Catalog, now: f64) -> ModifierBundle {
    resolve(record, catalog, &ActiveEvents::at(catalog, now), now)
}

/// Settle `record` up to `now` in place.
fn settle(record: &mut PlayerRecord, catalog: &Catalog, now: f64) -> Settlement {
    let bundle = bundle_for(record, catalog, now);
    let SyncOutcome {
        earned,
        suspicion,
        was_raided,
        raid_blocked,
        settled_secs,
        rates: _,
        ledger,
    } = offline::advance(&record.ledger, &record.assets, &bundle, catalog, now);
    record.ledger = ledger;
    Settlement {
        earned,
        suspicion,
        was_raided,
        raid_blocked,
        settled_secs,
    }
}

/// Fail with [`EconomyError::CooldownActive`] while `until` lies ahead.
fn ensure_ready(action: CooldownKind, until: f64, now: f64) -> Result<(), EconomyError> {
    match Cooldowns::remaining(until, now) {
        Some(remaining) => Err(EconomyError::CooldownActive {
            action,
            remaining_secs: ceil_f64_to_u64(remaining),
        }),
        None => Ok(()),
    }
}
