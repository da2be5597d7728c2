//! Income and suspicion rates from owned assets.
use serde::{Deserialize, Serialize};

use crate::catalog::{AssetClass, AssetDef, Catalog};
use crate::ledger::OwnedAsset;
use crate::modifiers::{ModifierBundle, ReputationEffects};
use crate::numbers::{round_cents, round_to};

/// Per-second rates. Values are unrounded until [`Rates::rounded`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rates {
    pub income_per_sec: f64,
    pub suspicion_per_sec: f64,
}

impl Rates {
    /// Rates at reporting precision: income 2 dp, suspicion 4 dp.
    #[must_use]
    pub fn rounded(self) -> Self {
        Self {
            income_per_sec: round_cents(self.income_per_sec),
            suspicion_per_sec: round_to(self.suspicion_per_sec, 4),
        }
    }
}

fn level_exponent(level: u32) -> i32 {
    i32::try_from(level.saturating_sub(1)).unwrap_or(i32::MAX)
}

/// Income per second of one asset at `level`.
#[must_use]
pub fn asset_income(asset: &AssetDef, level: u32) -> f64 {
    asset.base_income * asset.income_multiplier.powi(level_exponent(level))
}

/// Undiscounted price of an asset step at `level`.
#[must_use]
pub fn asset_cost(asset: &AssetDef, level: u32) -> f64 {
    asset.base_cost * asset.cost_multiplier.powi(level_exponent(level))
}

/// Price of the next purchase of `asset` when `owned_level` are already held.
///
/// Both the first purchase and the first upgrade are priced at level 1.
#[must_use]
pub fn buy_cost(asset: &AssetDef, owned_level: u32, discount: f64) -> f64 {
    round_cents(asset_cost(asset, owned_level.max(1)) * (1.0 - discount.clamp(0.0, 1.0)))
}

/// Multiply `raw` income through the bundle factors in order.
#[must_use]
pub fn apply_income_stack(raw: f64, bundle: &ModifierBundle) -> f64 {
    bundle
        .contributions
        .iter()
        .fold(raw, |income, contribution| income * contribution.factor)
}

/// Income and suspicion rates of `assets` under `bundle`.
///
/// Shadow assets earn the fear bonus and add suspicion scaled down by respect,
/// talents and gear; legal assets launder suspicion away. The passive decay
/// is subtracted last.
#[must_use]
pub fn rate(
    catalog: &Catalog,
    assets: &[OwnedAsset],
    fear: i64,
    respect: i64,
    bundle: &ModifierBundle,
) -> Rates {
    let tuning = &catalog.tuning;
    let reputation = ReputationEffects::from_reputation(fear, respect, tuning);
    let shadow_scale = bundle.shadow_suspicion_scale();

    let mut income = 0.0;
    let mut suspicion = 0.0;
    for owned in assets {
        let Some(def) = catalog.asset(&owned.asset_id) else {
            continue;
        };
        let base = asset_income(def, owned.level);
        match def.class {
            AssetClass::Shadow { suspicion_add } => {
                income += base * (1.0 + reputation.fear_income_bonus);
                suspicion +=
                    suspicion_add * (1.0 - reputation.respect_suspicion_reduce) * shadow_scale;
            }
            AssetClass::Legal { suspicion_reduce } => {
                income += base;
                suspicion -= suspicion_reduce;
            }
        }
    }

    Rates {
        income_per_sec: apply_income_stack(income, bundle),
        suspicion_per_sec: suspicion - tuning.suspicion_decay_per_sec,
    }
}
