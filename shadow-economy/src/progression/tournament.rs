//! Tournament scoring, additive per UTC day.
use super::{ActionEvent, ProgressError, Subscriber, TrackContext};
use crate::ledger::PlayerRecord;

/// Days of history kept on a record; older days are dropped on write.
pub const RETAINED_DAYS: usize = 7;

#[derive(Debug, Clone, Copy, Default)]
pub struct TournamentSubscriber;

impl Subscriber for TournamentSubscriber {
    fn name(&self) -> &'static str {
        "tournament"
    }

    fn on_event(
        &self,
        record: &mut PlayerRecord,
        event: &ActionEvent,
        ctx: &TrackContext<'_>,
    ) -> Result<(), ProgressError> {
        let Some(points) = ctx.catalog.tournament.score_events.get(&event.kind) else {
            return Ok(());
        };
        let scores = &mut record.progression.tournament_scores;
        let entry = scores.entry(ctx.day.to_string()).or_default();
        *entry = entry.saturating_add(points.saturating_mul(event.amount));
        // Day keys are ISO dates, so map order is chronological.
        while scores.len() > RETAINED_DAYS {
            scores.pop_first();
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

    #[test]
    fn scores_accumulate_per_day_and_prune_old_days() {
        let catalog = Catalog::load_default().unwrap();
        let mut record = PlayerRecord::new(PlayerId(9), 0.0, 0.0);
        let win = ActionEvent::new(PlayerId(9), ActionKind::PvpWin, 2);
        for day in 1..=9 {
            let key = format!("2024-01-{day:02}");
            let ctx = TrackContext {
                catalog: &catalog,
                day: &key,
                player_level: 0,
            };
            TournamentSubscriber.on_event(&mut record, &win, &ctx).unwrap();
            TournamentSubscriber.on_event(&mut record, &win, &ctx).unwrap();
        }
        let scores = &record.progression.tournament_scores;
        assert_eq!(scores.len(), RETAINED_DAYS);
        assert!(!scores.contains_key("2024-01-02"));
        assert_eq!(scores["2024-01-09"], 80);
    }

    #[test]
    fn unscored_actions_leave_no_entry() {
        let catalog = Catalog::load_default().unwrap();
        let mut record = PlayerRecord::new(PlayerId(9), 0.0, 0.0);
        let ctx = TrackContext {
            catalog: &catalog,
            day: "2024-01-01",
            player_level: 0,
        };
        let event = ActionEvent::new(PlayerId(9), ActionKind::EarnCash, 500);
        TournamentSubscriber.on_event(&mut record, &event, &ctx).unwrap();
        assert!(record.progression.tournament_scores.is_empty());
    }
}
