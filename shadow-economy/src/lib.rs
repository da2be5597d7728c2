//! Shadow Empire Economy
//!
//! Server-side economic core for the Shadow Empire idle game: income accrual,
//! offline settlement with raids, per-player serialization, loot rolls and
//! the progression hooks every action feeds. Storage and time are injected,
//! so the same engine runs against a database, the in-memory store, or a
//! simulation clock.

pub mod accrual;
pub mod casino;
pub mod catalog;
pub mod clock;
pub mod constants;
pub mod engine;
pub mod error;
pub mod guard;
pub mod ledger;
pub mod loot;
pub mod modifiers;
pub mod numbers;
pub mod offline;
pub mod progression;
pub mod pvp;
pub mod rng;
pub mod robbery;
pub mod store;

// Re-export commonly used types
pub use accrual::{Rates, buy_cost, rate};
pub use casino::{CasinoRound, CoinSide, DiceCall, RouletteCall, SlotSymbol, TableResult, Wager};
pub use catalog::{
    AssetClass, AssetDef, BetLimits, BonusType, CaseDef, CasinoGame, Catalog, CatalogError,
    EventMilestone, ItemDef, ItemSlot, LootEntry, LootPool, Rarity, Reward, RobberyDef,
    SeasonLevelReward, SeasonTrack, TalentKind, Tuning, UpgradeDef, UpgradeEffect,
};
pub use clock::{Clock, ManualClock, SystemClock, utc_day_key};
pub use engine::{
    AdReceipt, AdReward, AssetReceipt, CaseReceipt, CasinoReceipt, ClaimReceipt, CollectReceipt,
    EconomyEngine, EquipReceipt, LoginReceipt, LootReceipt, MilestoneReceipt, MissionReceipt,
    Notifier, PrestigeReceipt, PurchaseReceipt, PvpReceipt, RobberyReceipt, SeasonRewardReceipt,
    Settlement, TalentReceipt, UpgradeReceipt, VipCaseReceipt,
};
pub use error::{Conflict, CooldownKind, EconomyError, EntityKind};
pub use guard::{LockTable, PlayerGuard};
pub use ledger::{HeldCase, OwnedAsset, PlayerId, PlayerLedger, PlayerRecord};
pub use loot::{LootError, LootOutcome, LootRules};
pub use modifiers::{ActiveEvents, ModifierBundle, ModifierSource, TalentBonuses, resolve};
pub use offline::{SyncOutcome, advance};
pub use progression::{
    ActionEvent, ActionKind, DailyMission, ProgressError, ProgressionState, ProgressionTracker,
    RewardClaims, Subscriber, TrackReport,
};
pub use rng::{RngDomain, RngStreams};
pub use store::{LedgerStore, MemoryStore, StoreError};

/// Engine over the in-memory store and wall clock with the bundled catalog.
///
/// # Errors
///
/// Returns an error if the bundled catalog fails validation.
pub fn memory_engine() -> Result<EconomyEngine<MemoryStore, SystemClock>, CatalogError> {
    Ok(EconomyEngine::new(
        MemoryStore::new(),
        SystemClock,
        Catalog::load_default()?,
    ))
}
