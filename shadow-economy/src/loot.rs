//! Case opening: weighted draws with duplicate avoidance and a rarity-scaled
//! cash fallback.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

use crate::catalog::{LootPool, Rarity};
use crate::numbers::round_cents;

#[derive(Debug, Error, PartialEq)]
pub enum LootError {
    #[error("loot pool is empty")]
    EmptyPool,
    #[error("loot pool has no positive weight")]
    ZeroWeight,
}

/// What one opening produced: an item or cash, never both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LootOutcome {
    Item { item_id: String, rarity: Rarity },
    Compensation { item_id: String, rarity: Rarity, cash: f64 },
}

impl LootOutcome {
    #[must_use]
    pub fn item_id(&self) -> Option<&str> {
        match self {
            Self::Item { item_id, .. } => Some(item_id),
            Self::Compensation { .. } => None,
        }
    }

    #[must_use]
    pub const fn cash(&self) -> f64 {
        match self {
            Self::Item { .. } => 0.0,
            Self::Compensation { cash, .. } => *cash,
        }
    }
}

/// Draw parameters shared by every opening of one case.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LootRules {
    pub max_rerolls: u32,
    pub compensation_factor: f64,
}

/// Effective weights after the rarity boost, in pool order.
fn boosted_weights(
    pool: &LootPool,
    rarity_of: &impl Fn(&str) -> Rarity,
    rarity_boost_pct: f64,
) -> Vec<f64> {
    pool.entries
        .iter()
        .map(|entry| {
            if rarity_boost_pct > 0.0 && rarity_of(&entry.item_id).is_boostable() {
                entry.weight * (1.0 + rarity_boost_pct / 100.0)
            } else {
                entry.weight
            }
        })
        .collect()
}

/// Inverse-CDF draw over `weights`; returns an index into the pool.
fn draw_index<R: Rng + ?Sized>(weights: &[f64], total: f64, rng: &mut R) -> usize {
    let mut roll = rng.gen_range(0.0..total);
    for (index, weight) in weights.iter().enumerate() {
        if roll < *weight {
            return index;
        }
        roll -= weight;
    }
    // Floating point residue lands on the last positive entry.
    weights.iter().rposition(|weight| *weight > 0.0).unwrap_or(0)
}

/// Open a case drawn from `pool`.
///
/// Up to `rules.max_rerolls` draws are taken with replacement and the first
/// item not in `owned` wins. If every draw hits an owned item, one more draw
/// ignoring ownership decides the rarity of the cash compensation. The pool
/// itself is never modified.
///
/// # Errors
///
/// Returns an error, without drawing, for an empty or zero-weight pool.
pub fn open<R: Rng + ?Sized>(
    pool: &LootPool,
    rarity_of: impl Fn(&str) -> Rarity,
    owned: &BTreeSet<String>,
    rarity_boost_pct: f64,
    case_price: f64,
    rules: LootRules,
    rng: &mut R,
) -> Result<LootOutcome, LootError> {
    if pool.is_empty() {
        return Err(LootError::EmptyPool);
    }
    let weights = boosted_weights(pool, &rarity_of, rarity_boost_pct);
    let total: f64 = weights
        .iter()
        .filter(|weight| weight.is_finite() && **weight > 0.0)
        .sum();
    if total <= 0.0 || !total.is_finite() {
        return Err(LootError::ZeroWeight);
    }

    for _ in 0..rules.max_rerolls {
        let entry = &pool.entries[draw_index(&weights, total, rng)];
        if !owned.contains(&entry.item_id) {
            return Ok(LootOutcome::Item {
                item_id: entry.item_id.clone(),
                rarity: rarity_of(&entry.item_id),
            });
        }
    }

    let entry = &pool.entries[draw_index(&weights, total, rng)];
    let rarity = rarity_of(&entry.item_id);
    Ok(LootOutcome::Compensation {
        item_id: entry.item_id.clone(),
        rarity,
        cash: round_cents(
            case_price * rules.compensation_factor * rarity.compensation_multiplier(),
        ),
    })
}
