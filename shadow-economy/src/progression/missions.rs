//! Daily missions: a fresh draw per UTC day, progress clamped to target.
use log::debug;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::{ActionEvent, ActionKind, ProgressError, Subscriber, TrackContext};
use crate::catalog::{Catalog, MissionTemplate};
use crate::constants::LOG_TARGET_PROGRESS;
use crate::ledger::PlayerRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMission {
    pub mission_id: String,
    pub kind: ActionKind,
    pub target: u64,
    /// Cash paid on claim, fixed when the mission is drawn.
    pub reward: f64,
    pub progress: u64,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub claimed: bool,
}

impl DailyMission {
    fn from_template(template: &MissionTemplate) -> Self {
        Self {
            mission_id: template.id.clone(),
            kind: template.kind,
            target: template.target,
            reward: template.reward,
            progress: 0,
            completed: false,
            claimed: false,
        }
    }

    /// Add `amount` toward the target; returns whether this call completed it.
    pub fn advance(&mut self, amount: u64) -> bool {
        if self.completed {
            return false;
        }
        self.progress = self.progress.saturating_add(amount).min(self.target);
        self.completed = self.progress >= self.target;
        self.completed
    }
}

/// Draw `day`'s missions for `record` unless they already exist.
///
/// Templates are sampled without replacement. Returns whether a new set was
/// drawn.
pub fn ensure_daily_missions<R: Rng + ?Sized>(
    record: &mut PlayerRecord,
    catalog: &Catalog,
    day: &str,
    rng: &mut R,
) -> bool {
    let state = &mut record.progression;
    if state.missions_day.as_deref() == Some(day) {
        return false;
    }
    let count = catalog.tuning.daily_mission_count.min(catalog.missions.len());
    state.missions = catalog
        .missions
        .choose_multiple(rng, count)
        .map(DailyMission::from_template)
        .collect();
    state.missions_day = Some(day.to_string());
    debug!(
        target: LOG_TARGET_PROGRESS,
        "player {} drew {} missions for {day}",
        record.id,
        record.progression.missions.len()
    );
    true
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MissionSubscriber;

impl Subscriber for MissionSubscriber {
    fn name(&self) -> &'static str {
        "missions"
    }

    fn on_event(
        &self,
        record: &mut PlayerRecord,
        event: &ActionEvent,
        ctx: &TrackContext<'_>,
    ) -> Result<(), ProgressError> {
        // Yesterday's set stops counting once the day rolls over.
        if record.progression.missions_day.as_deref() != Some(ctx.day) {
            return Ok(());
        }
        for mission in record
            .progression
            .missions
            .iter_mut()
            .filter(|mission| mission.kind == event.kind)
        {
            if mission.advance(event.amount) {
                debug!(
                    target: LOG_TARGET_PROGRESS,
                    "player {} completed mission {}", event.player, mission.mission_id
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::PlayerId;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use std::collections::BTreeSet;

    fn ctx<'a>(catalog: &'a Catalog, day: &'a str) -> TrackContext<'a> {
        TrackContext {
            catalog,
            day,
            player_level: 0,
        }
    }

    #[test]
    fn draws_distinct_missions_once_per_day() {
        let catalog = Catalog::load_default().unwrap();
        let mut record = PlayerRecord::new(PlayerId(3), 0.0, 0.0);
        let mut rng = SmallRng::seed_from_u64(5);
        assert!(ensure_daily_missions(&mut record, &catalog, "2024-01-01", &mut rng));
        let ids: BTreeSet<&str> = record
            .progression
            .missions
            .iter()
            .map(|m| m.mission_id.as_str())
            .collect();
        assert_eq!(ids.len(), 3);

        let before = record.progression.missions.clone();
        assert!(!ensure_daily_missions(&mut record, &catalog, "2024-01-01", &mut rng));
        assert_eq!(record.progression.missions, before);
        assert!(ensure_daily_missions(&mut record, &catalog, "2024-01-02", &mut rng));
    }

    #[test]
    fn progress_clamps_and_completes_at_target() {
        let catalog = Catalog::load_default().unwrap();
        let mut record = PlayerRecord::new(PlayerId(3), 0.0, 0.0);
        record.progression.missions_day = Some("2024-01-01".to_string());
        record.progression.missions = vec![
            DailyMission::from_template(catalog.mission("robbery").unwrap()),
            DailyMission::from_template(catalog.mission("shop_buy").unwrap()),
        ];
        let ctx = ctx(&catalog, "2024-01-01");
        let robbery = ActionEvent::new(PlayerId(3), ActionKind::Robbery, 2);
        MissionSubscriber.on_event(&mut record, &robbery, &ctx).unwrap();
        assert_eq!(record.progression.missions[0].progress, 2);
        assert!(!record.progression.missions[0].completed);

        MissionSubscriber.on_event(&mut record, &robbery, &ctx).unwrap();
        assert_eq!(record.progression.missions[0].progress, 3);
        assert!(record.progression.missions[0].completed);
        assert_eq!(record.progression.missions[1].progress, 0);
    }

    #[test]
    fn stale_day_is_ignored() {
        let catalog = Catalog::load_default().unwrap();
        let mut record = PlayerRecord::new(PlayerId(3), 0.0, 0.0);
        record.progression.missions_day = Some("2023-12-31".to_string());
        record.progression.missions =
            vec![DailyMission::from_template(catalog.mission("robbery").unwrap())];
        let event = ActionEvent::once(PlayerId(3), ActionKind::Robbery);
        MissionSubscriber
            .on_event(&mut record, &event, &ctx(&catalog, "2024-01-01"))
            .unwrap();
        assert_eq!(record.progression.missions[0].progress, 0);
    }
}
