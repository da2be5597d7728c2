//! Offline synchronization: settles the time elapsed since the last
//! checkpoint into cash and suspicion.
use log::info;
use serde::{Deserialize, Serialize};

use crate::accrual::{Rates, rate};
use crate::catalog::Catalog;
use crate::constants::{LOG_TARGET_SYNC, SECONDS_PER_HOUR};
use crate::ledger::{OwnedAsset, PlayerLedger};
use crate::modifiers::{ModifierBundle, ModifierSource};
use crate::numbers::{round_cents, round_to};

/// Result of settling one player up to `now`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncOutcome {
    /// Cash credited, after any raid penalty.
    pub earned: f64,
    /// Suspicion after the sync.
    pub suspicion: f64,
    pub was_raided: bool,
    /// A safe-house charge absorbed the raid's cash penalty.
    pub raid_blocked: bool,
    /// Seconds integrated after capping.
    pub settled_secs: f64,
    /// Rates the window was integrated with, ad boost excluded.
    pub rates: Rates,
    pub ledger: PlayerLedger,
}

impl SyncOutcome {
    fn unchanged(ledger: &PlayerLedger) -> Self {
        Self {
            earned: 0.0,
            suspicion: ledger.suspicion,
            was_raided: false,
            raid_blocked: false,
            settled_secs: 0.0,
            rates: Rates::default(),
            ledger: ledger.clone(),
        }
    }
}

/// Longest window a single sync integrates, in seconds.
#[must_use]
pub fn offline_cap_secs(vip_active: bool, bundle: &ModifierBundle, catalog: &Catalog) -> f64 {
    let tuning = &catalog.tuning;
    let base = if vip_active {
        tuning.offline_vip_hours
    } else {
        tuning.offline_base_hours
    };
    (base + bundle.talents.efficiency).max(0.0) * SECONDS_PER_HOUR
}

/// Settle `ledger` up to `now`.
///
/// The window is capped, integrated at the bundle's rates (the ad boost only
/// counts for the part of the window it overlaps), then checked for a raid.
/// Calling again with the same `now` is a no-op.
#[must_use]
pub fn advance(
    ledger: &PlayerLedger,
    assets: &[OwnedAsset],
    bundle: &ModifierBundle,
    catalog: &Catalog,
    now: f64,
) -> SyncOutcome {
    let tuning = &catalog.tuning;
    let elapsed = now - ledger.last_checkpoint_ts;
    if !elapsed.is_finite() || elapsed <= 0.0 {
        return SyncOutcome::unchanged(ledger);
    }

    let vip_active = ledger.is_vip_active(now);
    let window = elapsed.min(offline_cap_secs(vip_active, bundle, catalog));
    let window_start = now - window;

    let base = bundle.without(ModifierSource::AdBoost);
    let rates = rate(
        catalog,
        assets,
        ledger.reputation_fear,
        ledger.reputation_respect,
        &base,
    );

    let boosted_secs = (ledger.ad_boost_until.min(now) - window_start).clamp(0.0, window);
    let effective_secs = window + boosted_secs * (tuning.ad_boost_multiplier - 1.0);
    let mut earned = (rates.income_per_sec * effective_secs).max(0.0);

    let mut suspicion =
        (ledger.suspicion + rates.suspicion_per_sec * window).clamp(0.0, tuning.max_suspicion);

    let mut next = ledger.clone();
    let mut was_raided = false;
    let mut raid_blocked = false;
    if suspicion >= tuning.raid_threshold {
        was_raided = true;
        if next.raid_protection > 0 {
            next.raid_protection -= 1;
            raid_blocked = true;
        } else {
            let penalty = (tuning.raid_cash_penalty
                - bundle.gang_raid_reduction_pct / 100.0
                - bundle.talents.evasion / 100.0)
                .max(tuning.raid_penalty_floor)
                .clamp(0.0, 1.0);
            earned *= 1.0 - penalty;
        }
        info!(
            target: LOG_TARGET_SYNC,
            "raid at suspicion {suspicion:.2}: blocked={raid_blocked} earned={earned:.2}"
        );
        suspicion = (suspicion - tuning.raid_suspicion_relief).max(0.0);
    }

    let earned = round_cents(earned);
    let suspicion = round_to(suspicion, 4);
    next.cash = (next.cash + earned).max(0.0);
    next.suspicion = suspicion;
    next.last_checkpoint_ts = now;
    next.counters.total_earned += earned;

    SyncOutcome {
        earned,
        suspicion,
        was_raided,
        raid_blocked,
        settled_secs: window,
        rates,
        ledger: next,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Tuning;
    use crate::modifiers::{Contribution, Contributions};

    fn catalog() -> Catalog {
        Catalog::load_default().unwrap()
    }

    fn ad_bundle() -> ModifierBundle {
        ModifierBundle {
            contributions: Contributions::from_slice(&[Contribution {
                source: ModifierSource::AdBoost,
                factor: 2.0,
            }]),
            ..ModifierBundle::default()
        }
    }

    #[test]
    fn non_positive_elapsed_is_a_noop() {
        let catalog = catalog();
        let ledger = PlayerLedger::new(100.0, 1_000.0);
        let assets = vec![OwnedAsset::new("car_wash")];
        let outcome = advance(&ledger, &assets, &ModifierBundle::default(), &catalog, 900.0);
        assert_eq!(outcome.ledger, ledger);
        assert!(outcome.earned.abs() < f64::EPSILON);
    }

    #[test]
    fn window_is_capped_at_offline_hours() {
        let catalog = catalog();
        let ledger = PlayerLedger::new(0.0, 0.0);
        let assets = vec![OwnedAsset::new("car_wash")];
        let outcome = advance(
            &ledger,
            &assets,
            &ModifierBundle::default(),
            &catalog,
            10.0 * 3_600.0,
        );
        assert!((outcome.settled_secs - 4.0 * 3_600.0).abs() < f64::EPSILON);
        assert!((outcome.earned - 3.0 * 4.0 * 3_600.0).abs() < 1e-6);
        assert!((outcome.ledger.last_checkpoint_ts - 36_000.0).abs() < f64::EPSILON);
        assert!((outcome.ledger.counters.total_earned - outcome.earned).abs() < f64::EPSILON);
    }

    #[test]
    fn ad_boost_counts_only_over_its_overlap() {
        let catalog = catalog();
        let mut ledger = PlayerLedger::new(0.0, 0.0);
        ledger.ad_boost_until = 100.0;
        let assets = vec![OwnedAsset::new("car_wash")];
        let outcome = advance(&ledger, &assets, &ad_bundle(), &catalog, 1_000.0);
        // 100 boosted seconds at 2x plus 900 plain seconds.
        assert!((outcome.earned - 3.0 * 1_100.0).abs() < 1e-6);
    }

    #[test]
    fn protection_charge_absorbs_raid_penalty() {
        let mut catalog = catalog();
        catalog.tuning = Tuning {
            raid_threshold: 10.0,
            ..Tuning::default()
        };
        let mut ledger = PlayerLedger::new(0.0, 0.0);
        ledger.suspicion = 20.0;
        ledger.raid_protection = 1;
        let assets = vec![OwnedAsset::new("street_dealer")];
        let outcome = advance(&ledger, &assets, &ModifierBundle::default(), &catalog, 10.0);
        assert!(outcome.was_raided);
        assert!(outcome.raid_blocked);
        assert_eq!(outcome.ledger.raid_protection, 0);
        assert!((outcome.earned - 70.0).abs() < 1e-9);
        assert!(outcome.suspicion < 10.0);
    }
}
