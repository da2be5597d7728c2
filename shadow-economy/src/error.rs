//! Error taxonomy for economic operations.
use thiserror::Error;

use crate::ledger::PlayerId;
use crate::loot::LootError;
use crate::store::StoreError;

/// What kind of entity a lookup failed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Player,
    Asset,
    Robbery,
    CasinoGame,
    Item,
    Case,
    HeldCase,
    Upgrade,
    Talent,
    Mission,
    SeasonReward,
    SeasonalEvent,
    Milestone,
    LoginReward,
}

impl EntityKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Player => "player",
            Self::Asset => "asset",
            Self::Robbery => "robbery",
            Self::CasinoGame => "casino game",
            Self::Item => "item",
            Self::Case => "case",
            Self::HeldCase => "held case",
            Self::Upgrade => "upgrade",
            Self::Talent => "talent",
            Self::Mission => "mission",
            Self::SeasonReward => "season reward",
            Self::SeasonalEvent => "seasonal event",
            Self::Milestone => "milestone",
            Self::LoginReward => "login reward",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Cooldown-gated actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownKind {
    Robbery,
    Pvp,
    Ad,
}

impl std::fmt::Display for CooldownKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Robbery => "robbery",
            Self::Pvp => "pvp",
            Self::Ad => "ad",
        })
    }
}

/// Terminal failures of an economic operation. Every variant is raised before
/// the first write, so the stored record is untouched when one is returned.
#[derive(Debug, Error)]
pub enum EconomyError {
    #[error("unknown {kind} `{id}`")]
    NotFound { kind: EntityKind, id: String },
    #[error("insufficient funds: need {required:.2}, have {available:.2}")]
    InsufficientFunds { required: f64, available: f64 },
    #[error("{action} cooldown active: {remaining_secs}s remaining")]
    CooldownActive {
        action: CooldownKind,
        remaining_secs: u64,
    },
    #[error("invalid {field}: {value}")]
    InvalidAmount { field: &'static str, value: f64 },
    #[error("{0}")]
    StateConflict(Conflict),
    #[error(transparent)]
    Loot(#[from] LootError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EconomyError {
    pub(crate) fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub(crate) fn player_not_found(id: PlayerId) -> Self {
        Self::not_found(EntityKind::Player, id.to_string())
    }
}

impl From<Conflict> for EconomyError {
    fn from(value: Conflict) -> Self {
        Self::StateConflict(value)
    }
}

/// Reasons an otherwise well-formed request contradicts the current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Conflict {
    #[error("player already registered")]
    AlreadyRegistered,
    #[error("cannot attack yourself")]
    SelfTarget,
    #[error("requires level {required} (current {current})")]
    LevelLocked { required: u32, current: u32 },
    #[error("asset not owned")]
    AssetNotOwned,
    #[error("manager already hired")]
    ManagerAlreadyHired,
    #[error("item already owned")]
    ItemAlreadyOwned,
    #[error("item not owned")]
    ItemNotOwned,
    #[error("item only drops from cases")]
    CaseOnlyItem,
    #[error("item is reserved for VIP rewards")]
    VipOnlyItem,
    #[error("talent already at max level {max_level}")]
    TalentMaxed { max_level: u32 },
    #[error("no talent points available")]
    NoTalentPoints,
    #[error("mission not completed")]
    MissionIncomplete,
    #[error("reward already claimed")]
    AlreadyClaimed,
    #[error("VIP players do not watch ads")]
    VipAdBlocked,
    #[error("season level {required} not reached (current {current})")]
    SeasonLevelNotReached { required: u32, current: u32 },
    #[error("premium pass required")]
    PremiumPassRequired,
    #[error("VIP not active")]
    VipRequired,
    #[error("milestone needs {target} points (have {progress})")]
    MilestoneNotReached { target: u64, progress: u64 },
    #[error("{0}")]
    InvalidChoice(String),
}
