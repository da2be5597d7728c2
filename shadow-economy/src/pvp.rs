//! PvP fight resolution between two synced players.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::{BonusType, Catalog, ItemSlot, UpgradeEffect};
use crate::constants::{PVP_BODYGUARD_POWER, PVP_DEFENSE_CAP, PVP_ROLL_SPREAD};
use crate::ledger::PlayerRecord;
use crate::modifiers::{TalentBonuses, equipment_reputation, pvp_defense_bonus};
use crate::numbers::round_cents;

/// Fighting strength of both sides before the dice.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerSheet {
    pub attack_power: i64,
    pub defense_power: i64,
    /// Extra steal fraction from the attacker's weapon.
    pub weapon_bonus: f64,
    /// Fraction of the steal the defender's gear blocks.
    pub defense_bonus: f64,
}

fn level(record: &PlayerRecord) -> i64 {
    i64::from(record.level())
}

fn talent_power(value: f64) -> i64 {
    num_traits::cast::<f64, i64>(value.floor()).unwrap_or(0)
}

/// Assemble both sides' power from levels, reputation, gear and upgrades.
#[must_use]
pub fn power_sheet(
    attacker: &PlayerRecord,
    attacker_talents: &TalentBonuses,
    defender: &PlayerRecord,
    catalog: &Catalog,
) -> PowerSheet {
    let attack_power = level(attacker)
        + attacker.ledger.reputation_fear
        + equipment_reputation(attacker, catalog, BonusType::Fear)
        + talent_power(attacker_talents.street_fighter);

    let bodyguards: i64 = defender
        .upgrades
        .iter()
        .filter(|(id, _)| {
            catalog
                .upgrade(id)
                .is_some_and(|def| def.effect == UpgradeEffect::PvpDefense)
        })
        .map(|(_, level)| i64::from(*level) * PVP_BODYGUARD_POWER)
        .sum();
    let defense_power = level(defender)
        + defender.ledger.reputation_fear
        + defender.ledger.reputation_respect
        + equipment_reputation(defender, catalog, BonusType::Respect)
        + bodyguards;

    let weapon_bonus = attacker
        .equipment
        .get(&ItemSlot::Weapon)
        .and_then(|item_id| catalog.item(item_id))
        .map_or(0.0, |item| item.rarity.weapon_steal_bonus());

    PowerSheet {
        attack_power,
        defense_power,
        weapon_bonus,
        defense_bonus: pvp_defense_bonus(defender, catalog, PVP_DEFENSE_CAP),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FightOutcome {
    pub attacker_won: bool,
    pub attack_roll: i64,
    pub defense_roll: i64,
    /// Cash moved from loser to winner.
    pub transfer: f64,
}

/// Steal and loss limits for one fight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FightStakes {
    pub attacker_cash: f64,
    pub defender_cash: f64,
    pub steal_percent: f64,
    pub steal_cap: f64,
    pub loss_cap: f64,
}

/// Roll the fight. The attacker wins only on a strictly higher roll.
pub fn fight<R: Rng + ?Sized>(
    sheet: &PowerSheet,
    stakes: &FightStakes,
    rng: &mut R,
) -> FightOutcome {
    let attack_roll = sheet.attack_power + rng.gen_range(0..=PVP_ROLL_SPREAD);
    let defense_roll = sheet.defense_power + rng.gen_range(0..=PVP_ROLL_SPREAD);
    let attacker_won = attack_roll > defense_roll;
    let transfer = if attacker_won {
        let steal_pct = stakes.steal_percent + sheet.weapon_bonus;
        (stakes.defender_cash * steal_pct * (1.0 - sheet.defense_bonus))
            .min(stakes.steal_cap)
            .min(stakes.defender_cash)
    } else {
        (stakes.attacker_cash * stakes.steal_percent * 0.5)
            .min(stakes.loss_cap)
            .min(stakes.attacker_cash)
    };
    FightOutcome {
        attacker_won,
        attack_roll,
        defense_roll,
        transfer: round_cents(transfer.max(0.0)),
    }
}
