//! Seasonal event scores and the season pass.
use super::{ActionEvent, ProgressError, Subscriber, TrackContext};
use crate::catalog::SeasonPassConfig;
use crate::ledger::PlayerRecord;

/// Season-pass level for `xp`: one plus whole levels earned, capped.
#[must_use]
pub fn season_level(xp: u64, config: &SeasonPassConfig) -> u32 {
    let earned = xp / config.xp_per_level.max(1);
    u32::try_from(earned.saturating_add(1))
        .unwrap_or(u32::MAX)
        .min(config.max_level)
}

/// Scores the active seasonal event; idle when none is active.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeasonalEventSubscriber;

impl Subscriber for SeasonalEventSubscriber {
    fn name(&self) -> &'static str {
        "seasonal_event"
    }

    fn on_event(
        &self,
        record: &mut PlayerRecord,
        event: &ActionEvent,
        ctx: &TrackContext<'_>,
    ) -> Result<(), ProgressError> {
        let Some(active) = ctx.catalog.active_seasonal_event() else {
            return Ok(());
        };
        let Some(points) = active.score_events.get(&event.kind) else {
            return Ok(());
        };
        let score = record
            .progression
            .event_scores
            .entry(active.id.clone())
            .or_default();
        *score = score.saturating_add(points.saturating_mul(event.amount));
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SeasonPassSubscriber;

impl Subscriber for SeasonPassSubscriber {
    fn name(&self) -> &'static str {
        "season_pass"
    }

    fn on_event(
        &self,
        record: &mut PlayerRecord,
        event: &ActionEvent,
        ctx: &TrackContext<'_>,
    ) -> Result<(), ProgressError> {
        if let Some(xp) = ctx.catalog.season_pass.xp_events.get(&event.kind) {
            let state = &mut record.progression;
            state.season_xp = state.season_xp.saturating_add(xp.saturating_mul(event.amount));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::ledger::PlayerId;
    use crate::progression::ActionKind;

    fn ctx(catalog: &Catalog) -> TrackContext<'_> {
        TrackContext {
            catalog,
            day: "2024-01-01",
            player_level: 0,
        }
    }

    #[test]
    fn level_is_capped() {
        let catalog = Catalog::load_default().unwrap();
        let pass = &catalog.season_pass;
        assert_eq!(season_level(0, pass), 1);
        assert_eq!(season_level(499, pass), 1);
        assert_eq!(season_level(1_000, pass), 3);
        assert_eq!(season_level(u64::MAX, pass), pass.max_level);
    }

    #[test]
    fn xp_is_additive_per_amount() {
        let catalog = Catalog::load_default().unwrap();
        let mut record = PlayerRecord::new(PlayerId(2), 0.0, 0.0);
        let event = ActionEvent::new(PlayerId(2), ActionKind::CaseOpen, 3);
        SeasonPassSubscriber
            .on_event(&mut record, &event, &ctx(&catalog))
            .unwrap();
        assert_eq!(record.progression.season_xp, 60);
    }

    #[test]
    fn seasonal_scores_only_while_active() {
        let mut catalog = Catalog::load_default().unwrap();
        let mut record = PlayerRecord::new(PlayerId(2), 0.0, 0.0);
        let event = ActionEvent::once(PlayerId(2), ActionKind::PvpWin);
        SeasonalEventSubscriber
            .on_event(&mut record, &event, &ctx(&catalog))
            .unwrap();
        assert!(record.progression.event_scores.is_empty());

        catalog.seasonal_events[0].active = true;
        SeasonalEventSubscriber
            .on_event(&mut record, &event, &ctx(&catalog))
            .unwrap();
        assert_eq!(record.progression.event_scores["winter_heat"], 15);
    }
}
