use anyhow::{Context, Result};
use colored::Colorize;
use serde::{Deserialize, Serialize};
use shadow_economy::{
    Catalog, EconomyEngine, EconomyError, LedgerStore, LootOutcome, ManualClock, MemoryStore,
    PlayerId, Rarity,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

type SimEngine = EconomyEngine<MemoryStore, Arc<ManualClock>>;

/// Simulated wall clock start (2023-11-14, a Tuesday).
const SIM_START: f64 = 1_700_000_000.0;
const IDLE_STAKE: f64 = 10_000.0;
const IDLE_PORTFOLIO: [&str; 2] = ["street_dealer", "speakeasy"];
const CONTENTION_ASSET: &str = "car_wash";
const CONTENTION_BUYERS: usize = 4;
const CONTENTION_COMMIT_DELAY: Duration = Duration::from_millis(2);
const LOOT_CASE: &str = "case_premium";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioKind {
    Idle,
    Contention,
    Loot,
}

impl ScenarioKind {
    pub const ALL: [Self; 3] = [Self::Idle, Self::Contention, Self::Loot];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Contention => "contention",
            Self::Loot => "loot",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Idle => "Offline accrual and raid curve for a shadow-heavy portfolio",
            Self::Contention => "Concurrent purchases racing for the same player's cash",
            Self::Loot => "Premium case spins: rarity distribution and duplicate payouts",
        }
    }

    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == name)
    }
}

pub fn list_scenarios() -> impl Iterator<Item = (&'static str, &'static str)> {
    ScenarioKind::ALL
        .into_iter()
        .map(|kind| (kind.key(), kind.description()))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimPlan {
    pub players: u64,
    pub iterations: usize,
    /// Seconds the clock moves between idle collections.
    pub step_secs: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    pub metrics: BTreeMap<String, f64>,
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

#[derive(Debug, Default)]
struct Tally {
    successes: usize,
    failures: Vec<String>,
    metrics: BTreeMap<String, f64>,
}

impl Tally {
    fn record(&mut self, iteration: usize, problems: Vec<String>) {
        if problems.is_empty() {
            self.successes += 1;
        } else {
            self.failures.extend(
                problems
                    .into_iter()
                    .map(|problem| format!("Iteration {}: {problem}", iteration + 1)),
            );
        }
    }

    fn metric(&mut self, key: &str, value: f64) {
        self.metrics.insert(key.to_string(), value);
    }
}

/// Runs one scenario for one seed.
///
/// # Errors
///
/// Returns an error when the scenario cannot be set up; per-iteration
/// problems are reported as failures instead.
pub async fn run_scenario(
    kind: ScenarioKind,
    seed: u64,
    plan: SimPlan,
) -> Result<ScenarioResult> {
    log::info!(
        "running scenario {} (seed {seed}, players {}, iterations {})",
        kind.key(),
        plan.players,
        plan.iterations
    );
    let started = Instant::now();
    let mut tally = Tally::default();
    match kind {
        ScenarioKind::Idle => run_idle(seed, plan, &mut tally).await,
        ScenarioKind::Contention => run_contention(seed, plan, &mut tally).await,
        ScenarioKind::Loot => run_loot(seed, plan, &mut tally).await,
    }
    .with_context(|| format!("scenario {} failed to run", kind.key()))?;

    Ok(ScenarioResult {
        scenario_name: kind.key().to_string(),
        seed,
        passed: tally.failures.is_empty(),
        iterations_run: plan.iterations,
        successful_iterations: tally.successes,
        failures: tally.failures,
        metrics: tally.metrics,
        duration: started.elapsed(),
    })
}

/// Runs every scenario against every seed, skipping unknown names.
pub async fn run_all(
    names: &[String],
    seeds: &[u64],
    plan: SimPlan,
) -> Result<Vec<ScenarioResult>> {
    let mut results = Vec::new();
    for name in names {
        let Some(kind) = ScenarioKind::parse(name) else {
            eprintln!("⚠️  Unknown scenario: {}", name.yellow());
            continue;
        };
        for &seed in seeds {
            results.push(run_scenario(kind, seed, plan).await?);
        }
    }
    Ok(results)
}

fn sim_engine(seed: u64, clock: &Arc<ManualClock>, store: MemoryStore) -> Result<SimEngine> {
    let catalog = Catalog::load_default().context("bundled catalog is invalid")?;
    Ok(EconomyEngine::new(store, Arc::clone(clock), catalog).with_seed(seed))
}

async fn fund(engine: &SimEngine, id: PlayerId, cash: f64) -> Result<()> {
    let mut record = engine
        .snapshot(id)
        .await?
        .with_context(|| format!("player {id} vanished"))?;
    record.ledger.cash = cash;
    engine.store().commit(&[record]).await?;
    Ok(())
}

fn count(value: usize) -> f64 {
    u32::try_from(value).map_or(f64::from(u32::MAX), f64::from)
}

async fn run_idle(seed: u64, plan: SimPlan, tally: &mut Tally) -> Result<()> {
    let clock = Arc::new(ManualClock::new(SIM_START));
    let engine = sim_engine(seed, &clock, MemoryStore::new())?;
    let players: Vec<PlayerId> = (1..=plan.players).map(PlayerId).collect();
    for &id in &players {
        engine.register(id).await?;
        fund(&engine, id, IDLE_STAKE).await?;
        for asset_id in IDLE_PORTFOLIO {
            engine.buy_asset(id, asset_id).await?;
        }
    }
    let max_suspicion = engine.catalog().tuning.max_suspicion;

    let mut earned = 0.0;
    let mut raids = 0_usize;
    let mut blocked = 0_usize;
    let mut collections = 0_usize;
    for iteration in 0..plan.iterations {
        clock.advance(plan.step_secs);
        let mut problems = Vec::new();
        for &id in &players {
            match engine.collect(id).await {
                Ok(receipt) => {
                    collections += 1;
                    earned += receipt.settlement.earned;
                    raids += usize::from(receipt.settlement.was_raided);
                    blocked += usize::from(receipt.settlement.raid_blocked);
                    if receipt.cash < 0.0 {
                        problems.push(format!("player {id} cash went negative"));
                    }
                    if !(0.0..=max_suspicion).contains(&receipt.settlement.suspicion) {
                        problems.push(format!(
                            "player {id} suspicion {} out of range",
                            receipt.settlement.suspicion
                        ));
                    }
                }
                Err(err) => problems.push(format!("collect for {id}: {err}")),
            }
        }
        tally.record(iteration, problems);
    }

    let simulated = count(collections) * plan.step_secs;
    tally.metric("collections", count(collections));
    tally.metric("total_earned", earned);
    tally.metric("raids", count(raids));
    tally.metric("raids_blocked", count(blocked));
    if collections > 0 {
        tally.metric("raid_rate", count(raids) / count(collections));
    }
    if simulated > 0.0 {
        tally.metric("earned_per_sec", earned / simulated);
    }
    Ok(())
}

async fn run_contention(seed: u64, plan: SimPlan, tally: &mut Tally) -> Result<()> {
    let clock = Arc::new(ManualClock::new(SIM_START));
    let store = MemoryStore::new().with_commit_delay(CONTENTION_COMMIT_DELAY);
    let engine = Arc::new(sim_engine(seed, &clock, store)?);

    let mut committed = 0_usize;
    let mut rejected = 0_usize;
    let started = Instant::now();
    for iteration in 0..plan.iterations {
        let round = u64::try_from(iteration).unwrap_or(u64::MAX);
        let players: Vec<PlayerId> = (1..=plan.players)
            .map(|n| PlayerId(round.saturating_mul(plan.players).saturating_add(n)))
            .collect();
        for &id in &players {
            engine.register(id).await?;
        }

        let mut handles = Vec::new();
        for &id in &players {
            for _ in 0..CONTENTION_BUYERS {
                let engine = Arc::clone(&engine);
                handles.push((
                    id,
                    tokio::spawn(async move { engine.buy_asset(id, CONTENTION_ASSET).await }),
                ));
            }
        }

        let mut wins: BTreeMap<PlayerId, usize> = BTreeMap::new();
        let mut problems = Vec::new();
        for (id, handle) in handles {
            match handle.await.context("purchase task panicked")? {
                Ok(_) => {
                    committed += 1;
                    *wins.entry(id).or_default() += 1;
                }
                Err(EconomyError::InsufficientFunds { .. }) => rejected += 1,
                Err(err) => problems.push(format!("player {id}: unexpected {err}")),
            }
        }
        for &id in &players {
            let record = engine
                .snapshot(id)
                .await?
                .with_context(|| format!("player {id} vanished"))?;
            let level = record.asset(CONTENTION_ASSET).map_or(0, |asset| asset.level);
            let won = wins.get(&id).copied().unwrap_or(0);
            if won != 1 || level != 1 {
                problems.push(format!(
                    "player {id}: {won} purchases committed, asset level {level}"
                ));
            }
            if record.ledger.cash < 0.0 {
                problems.push(format!("player {id} overspent to {}", record.ledger.cash));
            }
        }
        tally.record(iteration, problems);
    }

    let elapsed = started.elapsed().as_secs_f64();
    tally.metric("purchases_committed", count(committed));
    tally.metric("purchases_rejected", count(rejected));
    if elapsed > 0.0 {
        tally.metric("commits_per_sec", count(committed) / elapsed);
    }
    Ok(())
}

fn rarity_label(rarity: Rarity) -> String {
    format!("{rarity:?}").to_lowercase()
}

async fn run_loot(seed: u64, plan: SimPlan, tally: &mut Tally) -> Result<()> {
    let clock = Arc::new(ManualClock::new(SIM_START));
    let engine = sim_engine(seed, &clock, MemoryStore::new())?;
    let catalog = engine.catalog();
    let price = catalog
        .case(LOOT_CASE)
        .map(|case| case.price)
        .with_context(|| format!("{LOOT_CASE} missing from catalog"))?;

    let players: Vec<PlayerId> = (1..=plan.players).map(PlayerId).collect();
    let mut owned: BTreeMap<PlayerId, BTreeSet<String>> = BTreeMap::new();
    for &id in &players {
        engine.register(id).await?;
        fund(&engine, id, price * count(plan.iterations)).await?;
        owned.insert(id, BTreeSet::new());
    }

    let mut drops: BTreeMap<Rarity, usize> = BTreeMap::new();
    let mut compensations = 0_usize;
    let mut compensation_cash = 0.0;
    for iteration in 0..plan.iterations {
        let mut problems = Vec::new();
        for &id in &players {
            let receipt = match engine.spin_case(id, LOOT_CASE).await {
                Ok(receipt) => receipt,
                Err(err) => {
                    problems.push(format!("spin for {id}: {err}"));
                    continue;
                }
            };
            let inventory = owned.entry(id).or_default();
            match receipt.outcome {
                LootOutcome::Item { item_id, rarity } => {
                    *drops.entry(rarity).or_default() += 1;
                    if catalog.item(&item_id).is_none() {
                        problems.push(format!("player {id} received unknown item {item_id}"));
                    }
                    if !inventory.insert(item_id.clone()) {
                        problems.push(format!("player {id} received duplicate {item_id}"));
                    }
                }
                LootOutcome::Compensation { item_id, cash, .. } => {
                    compensations += 1;
                    compensation_cash += cash;
                    if !inventory.contains(&item_id) {
                        problems.push(format!("player {id} compensated for unowned {item_id}"));
                    }
                }
            }
        }
        tally.record(iteration, problems);
    }

    let items: usize = drops.values().sum();
    for (rarity, hits) in &drops {
        tally.metric(&format!("drops_{}", rarity_label(*rarity)), count(*hits));
    }
    if items > 0 {
        let rare: usize = drops
            .iter()
            .filter(|(rarity, _)| rarity.is_boostable())
            .map(|(_, hits)| hits)
            .sum();
        tally.metric("rare_share", count(rare) / count(items));
    }
    tally.metric("compensations", count(compensations));
    tally.metric("compensation_cash", compensation_cash);
    Ok(())
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_millis().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u128::deserialize(deserializer)?;
        Ok(Duration::from_millis(u64::try_from(millis).unwrap_or(0)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan(players: u64, iterations: usize) -> SimPlan {
        SimPlan {
            players,
            iterations,
            step_secs: 900.0,
        }
    }

    #[test]
    fn parses_known_scenario_keys() {
        for kind in ScenarioKind::ALL {
            assert_eq!(ScenarioKind::parse(kind.key()), Some(kind));
        }
        assert_eq!(ScenarioKind::parse("smoke"), None);
        assert_eq!(list_scenarios().count(), 3);
    }

    #[tokio::test]
    async fn idle_portfolio_gets_raided() {
        let result = run_scenario(ScenarioKind::Idle, 7, plan(2, 3)).await.unwrap();
        assert!(result.passed, "{:?}", result.failures);
        assert_eq!(result.successful_iterations, 3);
        assert!((result.metrics["collections"] - 6.0).abs() < f64::EPSILON);
        // 1.5/s of suspicion against 0.03/s decay crosses 70 well inside 900 s.
        assert!(result.metrics["raids"] >= 6.0);
        assert!(result.metrics["total_earned"] > 0.0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn contention_commits_one_purchase_per_player() {
        let result = run_scenario(ScenarioKind::Contention, 3, plan(3, 2))
            .await
            .unwrap();
        assert!(result.passed, "{:?}", result.failures);
        assert!((result.metrics["purchases_committed"] - 6.0).abs() < f64::EPSILON);
        let rejected = f64::from(u32::try_from(6 * (CONTENTION_BUYERS - 1)).unwrap());
        assert!((result.metrics["purchases_rejected"] - rejected).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn loot_never_hands_out_duplicates() {
        let result = run_scenario(ScenarioKind::Loot, 11, plan(1, 40)).await.unwrap();
        assert!(result.passed, "{:?}", result.failures);
        let items: f64 = result
            .metrics
            .iter()
            .filter(|(key, _)| key.starts_with("drops_"))
            .map(|(_, hits)| hits)
            .sum();
        assert!((items + result.metrics["compensations"] - 40.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn unknown_names_are_skipped() {
        let names = vec!["bogus".to_string(), "idle".to_string()];
        let results = run_all(&names, &[1, 2], plan(1, 1)).await.unwrap();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|result| result.scenario_name == "idle"));
    }
}
