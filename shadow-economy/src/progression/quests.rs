//! Multi-step quest lines.
use log::info;
use serde::{Deserialize, Serialize};

use super::{ActionEvent, ProgressError, Subscriber, TrackContext};
use crate::catalog::{Catalog, QuestLine, Reward};
use crate::constants::LOG_TARGET_PROGRESS;
use crate::ledger::PlayerRecord;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestProgress {
    pub current_step: usize,
    pub step_progress: u64,
    pub completed: bool,
}

/// Start every quest line the player's level has unlocked.
fn unlock_lines(record: &mut PlayerRecord, catalog: &Catalog, level: u32) {
    for line in catalog.quests.iter().filter(|q| q.unlock_level <= level) {
        record.progression.quests.entry(line.id.clone()).or_default();
    }
}

fn grant(
    record: &mut PlayerRecord,
    catalog: &Catalog,
    line: &QuestLine,
    reward: &Reward,
) -> Result<(), ProgressError> {
    if let Some(case_id) = reward.case_id()
        && catalog.case(case_id).is_none()
    {
        return Err(ProgressError::UnknownRewardCase {
            quest_id: line.id.clone(),
            case_id: case_id.to_string(),
        });
    }
    record.grant(reward);
    Ok(())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct QuestSubscriber;

impl Subscriber for QuestSubscriber {
    fn name(&self) -> &'static str {
        "quests"
    }

    fn on_event(
        &self,
        record: &mut PlayerRecord,
        event: &ActionEvent,
        ctx: &TrackContext<'_>,
    ) -> Result<(), ProgressError> {
        unlock_lines(record, ctx.catalog, ctx.player_level);
        let active: Vec<String> = record
            .progression
            .quests
            .iter()
            .filter(|(_, progress)| !progress.completed)
            .map(|(id, _)| id.clone())
            .collect();

        for quest_id in active {
            let Some(line) = ctx.catalog.quest(&quest_id) else {
                continue;
            };
            let Some(progress) = record.progression.quests.get_mut(&quest_id) else {
                continue;
            };
            let Some(step) = line.steps.get(progress.current_step) else {
                // The line shrank under a catalog reload; finished steps stay finished.
                progress.completed = true;
                continue;
            };
            if step.trigger != event.kind {
                continue;
            }
            progress.step_progress = progress
                .step_progress
                .saturating_add(event.amount)
                .min(step.target);
            if progress.step_progress < step.target {
                continue;
            }
            progress.current_step += 1;
            progress.step_progress = 0;
            progress.completed = progress.current_step >= line.steps.len();
            let finished_step = progress.current_step;
            let completed = progress.completed;
            grant(record, ctx.catalog, line, &step.reward)?;
            info!(
                target: LOG_TARGET_PROGRESS,
                "player {} finished step {finished_step} of quest {quest_id} (completed={completed})",
                event.player
            );
        }
        Ok(())
    }
}
