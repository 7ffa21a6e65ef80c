//! Scenarios that run on the quest screen.

use super::{ScenarioCtx, find_bugs_until_failure, fix_bugs_until_victory, reset_progress};
use crate::document::Document;
use crate::error::VerifyResult;
use crate::screens::QuestScreen;
use crate::screens::quest::{INVALID_ACTION_TEXT, QuestAction};
use crate::snapshot::{RewardKind, Rewards};
use crate::verify;

const REWARD_KINDS: [RewardKind; 3] = [RewardKind::Gold, RewardKind::Artifacts, RewardKind::DaysOff];

pub async fn quest_details<D: Document>(ctx: &ScenarioCtx<'_, D>) -> VerifyResult<()> {
    let quest = ctx.enter_quest().await?;
    let data = &ctx.config.quest;
    quest
        .verify_quest_details(&data.quest_name, &data.quest_description)
        .await
}

pub async fn progress_tracking<D: Document>(ctx: &ScenarioCtx<'_, D>) -> VerifyResult<()> {
    let quest = ctx.enter_quest().await?;
    let rules = &ctx.config.rules;
    let cap = ctx.config.poll.drive_iteration_cap;

    quest.verify_progress(rules.starting_progress).await?;

    let up = quest
        .progress_after(QuestAction::FixBug, rules.progress_step)
        .await?;
    verify!(
        up.resolved == up.baseline + rules.progress_step,
        "fixing a bug moved progress {} -> {}",
        up.baseline,
        up.resolved
    );
    ctx.step(&format!("fix bug: {} -> {}", up.baseline, up.resolved));

    let down = quest
        .progress_after(QuestAction::FindBug, -rules.progress_step)
        .await?;
    verify!(
        down.resolved == up.baseline,
        "finding a bug should undo the fix, landed on {}",
        down.resolved
    );
    ctx.step(&format!("find bug: {} -> {}", down.baseline, down.resolved));

    reset_progress(&quest, rules.starting_progress, cap).await?;
    fix_bugs_until_victory(&quest, cap).await?;
    quest.verify_victory().await?;
    hold_at_boundary(&quest, QuestAction::FixBug, rules.progress_step).await?;
    ctx.step("victory reached and held at the upper bound");

    reset_progress(&quest, rules.starting_progress, cap).await?;
    find_bugs_until_failure(&quest, cap).await?;
    quest.verify_failure().await?;
    hold_at_boundary(&quest, QuestAction::FindBug, -rules.progress_step).await?;
    ctx.step("failure reached and held at the lower bound");
    Ok(())
}

/// One more push past a boundary resolves against the clamped value and
/// the value stays there for the settle window.
async fn hold_at_boundary<D: Document>(
    quest: &QuestScreen<'_, D>,
    action: QuestAction,
    delta: i64,
) -> VerifyResult<()> {
    let pushed = quest.progress_after(action, delta).await?;
    verify!(
        pushed.resolved == pushed.baseline,
        "progress moved past its bound: {} -> {}",
        pushed.baseline,
        pushed.resolved
    );
    let held = pushed.resolved;
    quest
        .poller()
        .ensure_stable(
            "progress to stay clamped",
            || quest.progress_value(),
            |value| *value == held,
        )
        .await?;
    Ok(())
}

/// Absolute reward counts from a zero start.
pub async fn rewards<D: Document>(ctx: &ScenarioCtx<'_, D>) -> VerifyResult<()> {
    let quest = ctx.enter_quest().await?;
    let rules = &ctx.config.rules;

    let initial = quest.reward_counts().await?;
    verify!(
        initial == Rewards::default(),
        "a new quest should start without rewards, found {initial:?}"
    );

    quest.claim_bonus().await?;
    let gold = quest
        .poller()
        .await_value("gold coins", || quest.reward_value(RewardKind::Gold), rules.gold_per_bonus)
        .await?;

    quest.obtain_artifact().await?;
    let artifacts = quest
        .poller()
        .await_value(
            "artifacts",
            || quest.reward_value(RewardKind::Artifacts),
            rules.artifacts_per_claim,
        )
        .await?;

    quest.earn_days_off().await?;
    let days_off = quest
        .poller()
        .await_value(
            "days off",
            || quest.reward_value(RewardKind::DaysOff),
            rules.days_off_per_claim,
        )
        .await?;

    ctx.step(&format!(
        "rewards: {gold} gold, {artifacts} artifacts, {days_off} days off"
    ));
    Ok(())
}

/// Every action button moves its value by the documented delta.
pub async fn action_buttons<D: Document>(ctx: &ScenarioCtx<'_, D>) -> VerifyResult<()> {
    let quest = ctx.enter_quest().await?;
    let rules = &ctx.config.rules;

    let initial = quest.current_progress().await?;
    quest
        .progress_after(QuestAction::FixBug, rules.progress_step)
        .await?;
    quest
        .progress_after(QuestAction::FindBug, -rules.progress_step)
        .await?;
    quest.wait_for_progress(initial).await?;

    for kind in REWARD_KINDS {
        let delta = quest.reward_after(kind).await?;
        verify!(
            delta.resolved > delta.baseline,
            "{} did not grow: {} -> {}",
            kind.label(),
            delta.baseline,
            delta.resolved
        );
        ctx.step(&format!(
            "{}: {} -> {}",
            kind.label(),
            delta.baseline,
            delta.resolved
        ));
    }
    Ok(())
}

pub async fn custom_actions<D: Document>(ctx: &ScenarioCtx<'_, D>) -> VerifyResult<()> {
    let quest = ctx.enter_quest().await?;
    let action = &ctx.config.quest.custom_action;

    quest.submit_custom_action(action).await?;
    quest.verify_custom_action_notification(action).await?;

    quest.submit_custom_action("").await?;
    quest.verify_empty_action_notification().await?;

    // An empty action is a notification, not a broken state.
    let snapshot = quest.snapshot().await?;
    verify!(
        snapshot
            .alert
            .as_deref()
            .is_some_and(|alert| alert.contains(INVALID_ACTION_TEXT)),
        "expected the invalid-action notice, snapshot was {snapshot:?}"
    );
    Ok(())
}

pub async fn custom_alerts<D: Document>(ctx: &ScenarioCtx<'_, D>) -> VerifyResult<()> {
    let quest = ctx.enter_quest().await?;
    let rules = &ctx.config.rules;
    let cap = ctx.config.poll.drive_iteration_cap;

    fix_bugs_until_victory(&quest, cap).await?;
    quest.verify_victory().await?;

    quest.reload().await?;
    reset_progress(&quest, rules.starting_progress, cap).await?;
    find_bugs_until_failure(&quest, cap).await?;
    quest.verify_failure().await?;

    quest.reload().await?;
    let action = &ctx.config.quest.custom_action;
    quest.submit_custom_action(action).await?;
    quest.verify_custom_action_notification(action).await
}

pub async fn warriors<D: Document>(ctx: &ScenarioCtx<'_, D>) -> VerifyResult<()> {
    let quest = ctx.enter_quest().await?;
    let names = &ctx.config.quest.warriors;

    quest.verify_warriors(names).await?;

    let count = quest.warrior_count().await?;
    ctx.step(&format!("total warriors found: {count}"));
    verify!(
        count == names.len(),
        "expected {} warriors, found {count}",
        names.len()
    );

    for (index, name) in names.iter().enumerate() {
        let expected = format!("Warrior {}: {name}", index + 1);
        let actual = quest.warrior_name(index).await?;
        verify!(
            actual == expected,
            "warrior {index} reads {actual:?}, expected {expected:?}"
        );
        let description = quest.warrior_description(index).await?;
        verify!(
            !description.is_empty(),
            "warrior {name} has no description"
        );
    }
    Ok(())
}
