use std::sync::{Arc, Mutex};

use shadow_economy::store::LedgerStore;
use shadow_economy::{
    AdReward, CasinoGame, Catalog, Conflict, CooldownKind, EconomyEngine, EconomyError, EntityKind,
    ItemSlot, LootOutcome, ManualClock, MemoryStore, Notifier, OwnedAsset, PlayerId, PlayerRecord,
    Reward, SeasonTrack, TalentKind,
};

const START: f64 = 1_700_000_000.0;

type Engine = EconomyEngine<MemoryStore, Arc<ManualClock>>;

fn engine() -> (Engine, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(START));
    let engine = EconomyEngine::new(
        MemoryStore::new(),
        Arc::clone(&clock),
        Catalog::load_default().unwrap(),
    )
    .with_seed(0x5EED);
    (engine, clock)
}

async fn stored(engine: &Engine, id: PlayerId) -> PlayerRecord {
    engine.snapshot(id).await.unwrap().expect("registered")
}

async fn edit(engine: &Engine, id: PlayerId, change: impl FnOnce(&mut PlayerRecord)) {
    let mut record = stored(engine, id).await;
    change(&mut record);
    engine.store().commit(&[record]).await.unwrap();
}

fn conflict(err: EconomyError) -> Conflict {
    match err {
        EconomyError::StateConflict(conflict) => conflict,
        other => panic!("expected a state conflict, got {other:?}"),
    }
}

#[derive(Clone, Default)]
struct Inbox(Arc<Mutex<Vec<(PlayerId, String)>>>);

#[async_trait::async_trait]
impl Notifier for Inbox {
    async fn notify(&self, player: PlayerId, message: &str) -> anyhow::Result<()> {
        self.0.lock().unwrap().push((player, message.to_string()));
        Ok(())
    }
}

struct Unreachable;

#[async_trait::async_trait]
impl Notifier for Unreachable {
    async fn notify(&self, _player: PlayerId, _message: &str) -> anyhow::Result<()> {
        anyhow::bail!("push gateway down")
    }
}

#[tokio::test]
async fn register_twice_conflicts() {
    let (engine, _) = engine();
    engine.register(PlayerId(1)).await.unwrap();
    let err = engine.register(PlayerId(1)).await.unwrap_err();
    assert_eq!(conflict(err), Conflict::AlreadyRegistered);
}

#[tokio::test]
async fn collect_settles_elapsed_income() {
    let (engine, clock) = engine();
    let id = PlayerId(1);
    engine.register(id).await.unwrap();
    engine.buy_asset(id, "car_wash").await.unwrap();
    let cash_after_buy = stored(&engine, id).await.ledger.cash;

    clock.advance(100.0);
    let receipt = engine.collect(id).await.unwrap();
    assert!((receipt.settlement.earned - 300.0).abs() < 1e-6);
    assert!((receipt.rates.income_per_sec - 3.0).abs() < f64::EPSILON);
    assert!((receipt.cash - (cash_after_buy + 300.0)).abs() < 1e-6);

    let again = engine.collect(id).await.unwrap();
    assert!(again.settlement.earned.abs() < f64::EPSILON);
}

#[tokio::test]
async fn buying_a_business_feeds_quests_and_season() {
    let (engine, _) = engine();
    let id = PlayerId(1);
    engine.register(id).await.unwrap();

    let receipt = engine.buy_asset(id, "car_wash").await.unwrap();
    assert_eq!(receipt.level, 1);
    assert!((receipt.cost - 800.0).abs() < f64::EPSILON);
    // 1000 - 800 + 500 rookie quest reward.
    assert!((receipt.cash - 700.0).abs() < 1e-9);

    let record = stored(&engine, id).await;
    assert_eq!(record.ledger.reputation_respect, 1);
    assert_eq!(record.progression.season_xp, 20);
    let rookie = &record.progression.quests["rookie"];
    assert_eq!(rookie.current_step, 1);
    assert_eq!(record.progression.missions.len(), 3);
    assert_eq!(record.progression.tournament_scores.values().sum::<u64>(), 3);

    // Respect discount makes the next level 792, above the remaining cash.
    let err = engine.buy_asset(id, "car_wash").await.unwrap_err();
    assert!(matches!(err, EconomyError::InsufficientFunds { .. }));
    assert_eq!(stored(&engine, id).await, record);
}

#[tokio::test]
async fn locked_and_unknown_businesses_are_rejected() {
    let (engine, _) = engine();
    let id = PlayerId(1);
    engine.register(id).await.unwrap();
    edit(&engine, id, |record| record.ledger.cash = 1_000_000.0).await;

    let err = engine.buy_asset(id, "restaurant").await.unwrap_err();
    assert_eq!(
        conflict(err),
        Conflict::LevelLocked {
            required: 3,
            current: 0
        }
    );
    let err = engine.buy_asset(id, "space_station").await.unwrap_err();
    assert!(matches!(
        err,
        EconomyError::NotFound {
            kind: EntityKind::Asset,
            ..
        }
    ));
}

#[tokio::test]
async fn managers_need_an_owned_business_and_hire_once() {
    let (engine, _) = engine();
    let id = PlayerId(1);
    engine.register(id).await.unwrap();
    edit(&engine, id, |record| record.ledger.cash = 50_000.0).await;

    let err = engine.hire_manager(id, "car_wash").await.unwrap_err();
    assert_eq!(conflict(err), Conflict::AssetNotOwned);

    engine.buy_asset(id, "car_wash").await.unwrap();
    let receipt = engine.hire_manager(id, "car_wash").await.unwrap();
    assert!((receipt.cost - 5_000.0).abs() < f64::EPSILON);
    assert!(stored(&engine, id).await.asset("car_wash").unwrap().has_manager);

    let err = engine.hire_manager(id, "car_wash").await.unwrap_err();
    assert_eq!(conflict(err), Conflict::ManagerAlreadyHired);
}

#[tokio::test]
async fn robbery_starts_cooldown_and_builds_fear() {
    let (engine, clock) = engine();
    let id = PlayerId(1);
    engine.register(id).await.unwrap();

    let receipt = engine.rob(id, "pickpocket").await.unwrap();
    assert!((receipt.cooldown_until - (START + 120.0)).abs() < f64::EPSILON);
    if receipt.roll.success {
        assert!((50.0..=250.0 * 1.25).contains(&receipt.roll.reward));
    } else {
        assert!(receipt.roll.reward.abs() < f64::EPSILON);
        assert!((receipt.roll.suspicion_gain - 2.5).abs() < f64::EPSILON);
    }
    let record = stored(&engine, id).await;
    assert_eq!(record.ledger.reputation_fear, 2);
    assert_eq!(record.ledger.counters.total_robberies, 1);

    let err = engine.rob(id, "pickpocket").await.unwrap_err();
    assert!(matches!(
        err,
        EconomyError::CooldownActive {
            action: CooldownKind::Robbery,
            remaining_secs: 120
        }
    ));

    clock.advance(120.0);
    engine.rob(id, "pickpocket").await.unwrap();

    let err = engine.rob(id, "bank_heist").await.unwrap_err();
    assert!(matches!(
        conflict(err),
        Conflict::LevelLocked { required: 8, .. }
    ));
}

#[tokio::test]
async fn casino_validates_bets_and_choices() {
    let (engine, _) = engine();
    let id = PlayerId(1);
    engine.register(id).await.unwrap();

    for bet in [5.0, 60_000.0, f64::NAN, -10.0] {
        let err = engine
            .play_casino(id, CasinoGame::Coinflip, "heads", bet)
            .await
            .unwrap_err();
        assert!(
            matches!(err, EconomyError::InvalidAmount { field: "bet", .. }),
            "bet {bet} gave {err:?}"
        );
    }
    let err = engine
        .play_casino(id, CasinoGame::Coinflip, "edge", 100.0)
        .await
        .unwrap_err();
    assert!(matches!(conflict(err), Conflict::InvalidChoice(_)));
    let err = engine
        .play_casino(id, CasinoGame::Dice, "over", 5_000.0)
        .await
        .unwrap_err();
    assert!(matches!(err, EconomyError::InsufficientFunds { .. }));

    let receipt = engine
        .play_casino(id, CasinoGame::Roulette, "red", 100.0)
        .await
        .unwrap();
    assert!((receipt.cash - (1_000.0 + receipt.net)).abs() < 1e-9);
    let record = stored(&engine, id).await;
    assert_eq!(record.ledger.counters.casino_plays, 1);
    assert_eq!(
        record.ledger.counters.casino_wins,
        u64::from(receipt.round.is_win())
    );
}

#[tokio::test]
async fn lucky_talent_raises_the_table_limit() {
    let (engine, _) = engine();
    let id = PlayerId(1);
    engine.register(id).await.unwrap();
    edit(&engine, id, |record| {
        record.ledger.cash = 100_000.0;
        record.talents.insert(TalentKind::Lucky, 1);
    })
    .await;
    engine
        .play_casino(id, CasinoGame::Coinflip, "tails", 55_000.0)
        .await
        .unwrap();
}

#[tokio::test]
async fn shop_rules_and_equipment() {
    let (engine, _) = engine();
    let id = PlayerId(1);
    engine.register(id).await.unwrap();

    let err = engine.buy_item(id, "hat_demon").await.unwrap_err();
    assert_eq!(conflict(err), Conflict::CaseOnlyItem);
    let err = engine.buy_item(id, "hat_vip_crown").await.unwrap_err();
    assert_eq!(conflict(err), Conflict::VipOnlyItem);
    let err = engine.equip_item(id, "hat_cap").await.unwrap_err();
    assert_eq!(conflict(err), Conflict::ItemNotOwned);

    let receipt = engine.buy_item(id, "hat_cap").await.unwrap();
    assert!((receipt.cash - 500.0).abs() < 1e-9);
    let err = engine.buy_item(id, "hat_cap").await.unwrap_err();
    assert_eq!(conflict(err), Conflict::ItemAlreadyOwned);

    let equipped = engine.equip_item(id, "hat_cap").await.unwrap();
    assert_eq!(equipped.slot, ItemSlot::Hat);
    assert_eq!(equipped.replaced, None);

    edit(&engine, id, |record| {
        record.inventory.insert("hat_bandana".to_string());
    })
    .await;
    let swapped = engine.equip_item(id, "hat_bandana").await.unwrap();
    assert_eq!(swapped.replaced.as_deref(), Some("hat_cap"));
}

#[tokio::test]
async fn cases_are_held_then_opened_once() {
    let (engine, _) = engine();
    let id = PlayerId(1);
    engine.register(id).await.unwrap();
    edit(&engine, id, |record| record.ledger.cash = 20_000.0).await;

    let bought = engine.buy_case(id, "case_basic").await.unwrap();
    assert!((bought.cash - 12_000.0).abs() < 1e-9);
    assert_eq!(stored(&engine, id).await.held_cases.len(), 1);

    let opened = engine.open_case(id, bought.held_case_id).await.unwrap();
    let record = stored(&engine, id).await;
    assert!(record.held_cases.is_empty());
    match &opened.outcome {
        LootOutcome::Item { item_id, .. } => assert!(record.owns_item(item_id)),
        LootOutcome::Compensation { .. } => panic!("nothing was owned yet"),
    }

    let err = engine.open_case(id, bought.held_case_id).await.unwrap_err();
    assert!(matches!(
        err,
        EconomyError::NotFound {
            kind: EntityKind::HeldCase,
            ..
        }
    ));
}

#[tokio::test]
async fn spinning_a_fully_collected_case_pays_compensation() {
    let (engine, _) = engine();
    let id = PlayerId(1);
    engine.register(id).await.unwrap();
    let pool: Vec<String> = engine
        .catalog()
        .case("case_weapon")
        .unwrap()
        .loot
        .item_ids()
        .map(str::to_string)
        .collect();
    edit(&engine, id, |record| {
        record.ledger.cash = 75_000.0;
        record.inventory.extend(pool);
    })
    .await;

    let receipt = engine.spin_case(id, "case_weapon").await.unwrap();
    let LootOutcome::Compensation { cash, .. } = receipt.outcome else {
        panic!("expected compensation, got {:?}", receipt.outcome);
    };
    assert!(cash >= 75_000.0 * 0.5);
    assert!((receipt.cash - cash).abs() < 1e-6);
}

#[tokio::test]
async fn pvp_moves_cash_and_notifies_defender() {
    let inbox = Inbox::default();
    let (engine, _) = engine();
    let engine = engine.with_notifier(inbox.clone());
    let (attacker, defender) = (PlayerId(1), PlayerId(2));
    engine.register(attacker).await.unwrap();
    engine.register(defender).await.unwrap();

    let err = engine.pvp_attack(attacker, attacker).await.unwrap_err();
    assert_eq!(conflict(err), Conflict::SelfTarget);
    let err = engine.pvp_attack(attacker, defender).await.unwrap_err();
    assert!(matches!(err, EconomyError::InsufficientFunds { .. }));

    edit(&engine, attacker, |record| record.ledger.cash = 10_000.0).await;
    edit(&engine, defender, |record| record.ledger.cash = 10_000.0).await;

    let receipt = engine.pvp_attack(attacker, defender).await.unwrap();
    let a = stored(&engine, attacker).await;
    let d = stored(&engine, defender).await;
    assert!((a.ledger.cash + d.ledger.cash - 20_000.0).abs() < 1e-6);
    assert!(receipt.outcome.transfer > 0.0);
    assert_eq!(
        a.ledger.counters.pvp_wins,
        u64::from(receipt.outcome.attacker_won)
    );

    let messages = inbox.0.lock().unwrap().clone();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].0, defender);

    let err = engine.pvp_attack(attacker, defender).await.unwrap_err();
    assert!(matches!(
        err,
        EconomyError::CooldownActive {
            action: CooldownKind::Pvp,
            remaining_secs: 900
        }
    ));
}

#[tokio::test]
async fn notifier_failure_does_not_fail_the_attack() {
    let (engine, _) = engine();
    let engine = engine.with_notifier(Unreachable);
    let (attacker, defender) = (PlayerId(1), PlayerId(2));
    engine.register(attacker).await.unwrap();
    engine.register(defender).await.unwrap();
    edit(&engine, attacker, |record| record.ledger.cash = 5_000.0).await;

    engine.pvp_attack(attacker, defender).await.unwrap();
    assert!(stored(&engine, attacker).await.ledger.cooldowns.pvp_until > START);
}

#[tokio::test]
async fn prestige_resets_empire_and_grants_a_point() {
    let (engine, _) = engine();
    let id = PlayerId(1);
    engine.register(id).await.unwrap();

    let err = engine.prestige(id).await.unwrap_err();
    assert_eq!(
        conflict(err),
        Conflict::LevelLocked {
            required: 15,
            current: 0
        }
    );

    edit(&engine, id, |record| {
        record.assets.push(OwnedAsset {
            level: 15,
            ..OwnedAsset::new("car_wash")
        });
        record.ledger.cash = 9_999_999.0;
        record.ledger.reputation_fear = 40;
        record.ledger.counters.pvp_wins = 3;
        record.upgrades.insert("bribe_police".to_string(), 2);
        record.inventory.insert("hat_cap".to_string());
    })
    .await;

    let receipt = engine.prestige(id).await.unwrap();
    assert_eq!(receipt.prestige_level, 1);
    assert_eq!(receipt.talent_points, 1);
    assert!((receipt.prestige_multiplier - 1.12).abs() < 1e-9);
    assert!((receipt.cash - 1_000.0).abs() < f64::EPSILON);

    let record = stored(&engine, id).await;
    assert!(record.assets.is_empty());
    assert!(record.upgrades.is_empty());
    assert_eq!(record.ledger.reputation_fear, 0);
    assert_eq!(record.ledger.counters.pvp_wins, 3);
    assert!(record.owns_item("hat_cap"));

    let talent = engine
        .assign_talent(id, TalentKind::QuickStart)
        .await
        .unwrap();
    assert_eq!(talent.level, 1);
    assert_eq!(talent.points_left, 0);
    let err = engine
        .assign_talent(id, TalentKind::QuickStart)
        .await
        .unwrap_err();
    assert_eq!(conflict(err), Conflict::NoTalentPoints);
}

#[tokio::test]
async fn maxed_talent_is_rejected() {
    let (engine, _) = engine();
    let id = PlayerId(1);
    engine.register(id).await.unwrap();
    edit(&engine, id, |record| {
        record.ledger.talent_points = 3;
        record.talents.insert(TalentKind::Efficiency, 4);
    })
    .await;
    let err = engine
        .assign_talent(id, TalentKind::Efficiency)
        .await
        .unwrap_err();
    assert_eq!(conflict(err), Conflict::TalentMaxed { max_level: 4 });
}

#[tokio::test]
async fn upgrades_apply_immediate_effects() {
    let (engine, _) = engine();
    let id = PlayerId(1);
    engine.register(id).await.unwrap();
    edit(&engine, id, |record| {
        record.ledger.cash = 1_000_000.0;
        record.ledger.suspicion = 60.0;
    })
    .await;

    let bribe = engine.buy_upgrade(id, "bribe_police").await.unwrap();
    assert!((bribe.cost - 10_000.0).abs() < f64::EPSILON);
    assert!(stored(&engine, id).await.ledger.suspicion.abs() < f64::EPSILON);

    let second = engine.buy_upgrade(id, "bribe_police").await.unwrap();
    assert_eq!(second.level, 2);
    assert!((second.cost - 30_000.0).abs() < 1e-9);

    engine.buy_upgrade(id, "safe_house").await.unwrap();
    let guards = engine.buy_upgrade(id, "bodyguards").await.unwrap();
    let record = stored(&engine, id).await;
    assert_eq!(record.ledger.raid_protection, 1);
    assert_eq!(record.ledger.reputation_respect, 5);
    let spent = 10_000.0 + 30_000.0 + 100_000.0 + 150_000.0;
    assert!((guards.cash - (1_000_000.0 - spent)).abs() < 1e-6);
}

#[tokio::test]
async fn ads_grant_rewards_on_cooldown() {
    let (engine, clock) = engine();
    let id = PlayerId(1);
    engine.register(id).await.unwrap();

    let receipt = engine.ad_reward(id, AdReward::FreeBet).await.unwrap();
    assert!((receipt.cash - 2_000.0).abs() < f64::EPSILON);
    assert!((receipt.next_ad_at - (START + 180.0)).abs() < f64::EPSILON);

    let err = engine.ad_reward(id, AdReward::IncomeBoost).await.unwrap_err();
    assert!(matches!(
        err,
        EconomyError::CooldownActive {
            action: CooldownKind::Ad,
            ..
        }
    ));

    clock.advance(180.0);
    let boost = engine.ad_reward(id, AdReward::IncomeBoost).await.unwrap();
    assert!((boost.ad_boost_until - (START + 180.0 + 300.0)).abs() < f64::EPSILON);

    edit(&engine, id, |record| {
        record.ledger.cooldowns.robbery_until = START + 10_000.0;
    })
    .await;
    clock.advance(180.0);
    engine.ad_reward(id, AdReward::ResetCooldown).await.unwrap();
    engine.rob(id, "pickpocket").await.unwrap();
}

#[tokio::test]
async fn vip_players_skip_ads() {
    let (engine, _) = engine();
    let id = PlayerId(1);
    engine.register(id).await.unwrap();
    edit(&engine, id, |record| {
        record.ledger.is_vip = true;
        record.ledger.vip_until = START + 86_400.0;
    })
    .await;
    let err = engine.ad_reward(id, AdReward::FreeBet).await.unwrap_err();
    assert_eq!(conflict(err), Conflict::VipAdBlocked);
}

#[tokio::test]
async fn missions_pay_once_when_complete() {
    let (engine, _) = engine();
    let id = PlayerId(1);
    engine.register(id).await.unwrap();
    engine.rob(id, "pickpocket").await.unwrap();

    let record = stored(&engine, id).await;
    let first = record.progression.missions[0].clone();
    assert!(!first.completed);
    let err = engine.claim_mission(id, &first.mission_id).await.unwrap_err();
    assert_eq!(conflict(err), Conflict::MissionIncomplete);
    let err = engine.claim_mission(id, "no_such_mission").await.unwrap_err();
    assert!(matches!(
        err,
        EconomyError::NotFound {
            kind: EntityKind::Mission,
            ..
        }
    ));

    edit(&engine, id, |record| {
        let mission = &mut record.progression.missions[0];
        mission.progress = mission.target;
        mission.completed = true;
    })
    .await;
    let cash_before = stored(&engine, id).await.ledger.cash;
    let receipt = engine.claim_mission(id, &first.mission_id).await.unwrap();
    assert!((receipt.reward - first.reward).abs() < f64::EPSILON);
    assert!((receipt.cash - (cash_before + first.reward)).abs() < 1e-9);

    let err = engine.claim_mission(id, &first.mission_id).await.unwrap_err();
    assert_eq!(conflict(err), Conflict::AlreadyClaimed);
}

#[tokio::test]
async fn failed_commit_leaves_store_untouched() {
    let (engine, _) = engine();
    let id = PlayerId(1);
    engine.register(id).await.unwrap();
    let before = stored(&engine, id).await;

    engine.store().fail_next_commit();
    let err = engine.buy_asset(id, "car_wash").await.unwrap_err();
    assert!(matches!(err, EconomyError::Store(_)));
    assert_eq!(stored(&engine, id).await, before);

    engine.buy_asset(id, "car_wash").await.unwrap();
}

#[tokio::test]
async fn catalog_reload_validates_before_swapping() {
    let (engine, _) = engine();
    let mut broken = Catalog::load_default().unwrap();
    broken.cases[0].loot.entries.clear();
    assert!(engine.reload_catalog(broken).is_err());
    assert!(!engine.catalog().cases[0].loot.is_empty());

    let mut richer = Catalog::load_default().unwrap();
    richer.tuning.starting_cash = 5_000.0;
    engine.reload_catalog(richer).unwrap();
    let record = engine.register(PlayerId(9)).await.unwrap();
    assert!((record.ledger.cash - 5_000.0).abs() < f64::EPSILON);
}

fn missing(err: EconomyError) -> EntityKind {
    match err {
        EconomyError::NotFound { kind, .. } => kind,
        other => panic!("expected a lookup failure, got {other:?}"),
    }
}

#[tokio::test]
async fn season_rewards_pay_once_per_reached_level_and_track() {
    let (engine, _) = engine();
    let id = PlayerId(1);
    engine.register(id).await.unwrap();

    let err = engine
        .claim_season_reward(id, 2, SeasonTrack::Free)
        .await
        .unwrap_err();
    assert_eq!(
        conflict(err),
        Conflict::SeasonLevelNotReached {
            required: 2,
            current: 1
        }
    );

    let receipt = engine
        .claim_season_reward(id, 1, SeasonTrack::Free)
        .await
        .unwrap();
    assert_eq!(receipt.claim.reward, Reward::Cash { amount: 500.0 });
    assert!((receipt.claim.cash - 1_500.0).abs() < 1e-9);
    let err = engine
        .claim_season_reward(id, 1, SeasonTrack::Free)
        .await
        .unwrap_err();
    assert_eq!(conflict(err), Conflict::AlreadyClaimed);

    let err = engine
        .claim_season_reward(id, 1, SeasonTrack::Premium)
        .await
        .unwrap_err();
    assert_eq!(conflict(err), Conflict::PremiumPassRequired);

    edit(&engine, id, |record| {
        record.ledger.has_premium_pass = true;
        record.progression.season_xp = 1_500;
    })
    .await;
    let receipt = engine
        .claim_season_reward(id, 2, SeasonTrack::Premium)
        .await
        .unwrap();
    let held = receipt.claim.held_case_id.expect("case reward");
    let record = stored(&engine, id).await;
    assert!(
        record
            .held_cases
            .iter()
            .any(|case| case.id == held && case.case_id == "case_basic")
    );
    assert!(record.progression.claims.season_premium.contains(&2));
    assert!(!record.progression.claims.season_free.contains(&2));

    // Level 4 has no reward row; level 31 lies past the pass.
    for level in [4, 31, 0] {
        let err = engine
            .claim_season_reward(id, level, SeasonTrack::Free)
            .await
            .unwrap_err();
        assert_eq!(missing(err), EntityKind::SeasonReward);
    }
}

#[tokio::test]
async fn event_milestones_need_an_active_event_and_enough_score() {
    let (engine, _) = engine();
    let id = PlayerId(1);
    engine.register(id).await.unwrap();

    let err = engine.claim_event_milestone(id, 0).await.unwrap_err();
    assert_eq!(missing(err), EntityKind::SeasonalEvent);

    let mut live = Catalog::load_default().unwrap();
    live.seasonal_events[0].active = true;
    engine.reload_catalog(live).unwrap();

    let err = engine.claim_event_milestone(id, 0).await.unwrap_err();
    assert_eq!(
        conflict(err),
        Conflict::MilestoneNotReached {
            target: 50,
            progress: 0
        }
    );

    edit(&engine, id, |record| {
        record
            .progression
            .event_scores
            .insert("winter_heat".to_string(), 160);
    })
    .await;
    let receipt = engine.claim_event_milestone(id, 1).await.unwrap();
    assert_eq!(receipt.event_id, "winter_heat");
    assert!(receipt.claim.held_case_id.is_some());
    let receipt = engine.claim_event_milestone(id, 0).await.unwrap();
    assert!((receipt.claim.cash - 6_000.0).abs() < 1e-9);

    let err = engine.claim_event_milestone(id, 0).await.unwrap_err();
    assert_eq!(conflict(err), Conflict::AlreadyClaimed);
    let err = engine.claim_event_milestone(id, 2).await.unwrap_err();
    assert_eq!(
        conflict(err),
        Conflict::MilestoneNotReached {
            target: 400,
            progress: 160
        }
    );
    let err = engine.claim_event_milestone(id, 9).await.unwrap_err();
    assert_eq!(missing(err), EntityKind::Milestone);

    edit(&engine, id, |record| {
        record
            .progression
            .event_scores
            .insert("winter_heat".to_string(), 400);
    })
    .await;
    engine.claim_event_milestone(id, 2).await.unwrap();
    assert!(stored(&engine, id).await.owns_item("acc_skull"));
}

#[tokio::test]
async fn login_streak_grows_daily_and_restarts_after_a_gap() {
    let (engine, clock) = engine();
    let id = PlayerId(1);
    engine.register(id).await.unwrap();

    let first = engine.claim_login(id).await.unwrap();
    assert_eq!((first.streak, first.reward_day), (1, 1));
    assert!((first.claim.cash - 1_200.0).abs() < 1e-9);
    let err = engine.claim_login(id).await.unwrap_err();
    assert_eq!(conflict(err), Conflict::AlreadyClaimed);

    let mut last = first;
    for day in 2..=8 {
        clock.advance(86_400.0);
        last = engine.claim_login(id).await.unwrap();
        assert_eq!(last.streak, day);
        if day == 6 {
            assert_eq!(
                last.claim.reward,
                Reward::Case {
                    case_id: "case_basic".to_string()
                }
            );
            assert!(last.claim.held_case_id.is_some());
        }
    }
    // Seven rewards per cycle: day 8 pays the day-one reward again.
    assert_eq!(last.reward_day, 1);
    assert_eq!(last.claim.reward, Reward::Cash { amount: 200.0 });

    clock.advance(2.0 * 86_400.0);
    let restarted = engine.claim_login(id).await.unwrap();
    assert_eq!((restarted.streak, restarted.reward_day), (1, 1));
    let record = stored(&engine, id).await;
    assert_eq!(record.progression.claims.login_streak, 1);
}

#[tokio::test]
async fn vip_case_is_daily_and_needs_active_vip() {
    let (engine, clock) = engine();
    let id = PlayerId(1);
    engine.register(id).await.unwrap();

    let err = engine.claim_vip_case(id).await.unwrap_err();
    assert_eq!(conflict(err), Conflict::VipRequired);

    edit(&engine, id, |record| {
        record.ledger.is_vip = true;
        record.ledger.vip_until = START + 1.5 * 86_400.0;
    })
    .await;
    let receipt = engine.claim_vip_case(id).await.unwrap();
    assert_eq!(receipt.case_id, "case_premium");
    let err = engine.claim_vip_case(id).await.unwrap_err();
    assert_eq!(conflict(err), Conflict::AlreadyClaimed);

    clock.advance(86_400.0);
    let next = engine.claim_vip_case(id).await.unwrap();
    assert_ne!(next.held_case_id, receipt.held_case_id);
    let record = stored(&engine, id).await;
    assert_eq!(record.held_cases.len(), 2);

    clock.advance(86_400.0);
    let err = engine.claim_vip_case(id).await.unwrap_err();
    assert_eq!(conflict(err), Conflict::VipRequired);
}
