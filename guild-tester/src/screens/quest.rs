use super::Surface;
use crate::config::HarnessConfig;
use crate::document::Document;
use crate::error::{VerifyError, VerifyResult};
use crate::locator::{LocatorRegistry, Role, Selector};
use crate::poll::{Delta, Poller};
use crate::snapshot::{RewardKind, Rewards, Snapshot, ValueBounds, parse_counter, parse_progress};

pub const SCREEN: &str = "quest";

pub const QUEST_NAME: &str = "quest name";
pub const QUEST_DESCRIPTION: &str = "quest description";
pub const PROGRESS_BAR: &str = "progress bar";
pub const PROGRESS_TEXT: &str = "progress text";
pub const NOTIFICATION: &str = "notification";
pub const VICTORY_ALERT: &str = "victory alert";
pub const FAILURE_ALERT: &str = "failure alert";
pub const GOLD_COINS: &str = "gold coins";
pub const ARTIFACTS: &str = "artifacts";
pub const DAYS_OFF: &str = "days off";
pub const FIX_BUG_BUTTON: &str = "fix bug button";
pub const FIND_BUG_BUTTON: &str = "find bug button";
pub const CLAIM_BONUS_BUTTON: &str = "claim bonus button";
pub const OBTAIN_ARTIFACT_BUTTON: &str = "obtain artifact button";
pub const EARN_DAYS_OFF_BUTTON: &str = "earn days off button";
pub const CUSTOM_ACTION_INPUT: &str = "custom action input";
pub const SUBMIT_CUSTOM_ACTION: &str = "submit custom action";
pub const WARRIORS_LIST: &str = "warriors list";
pub const WARRIOR_ITEMS: &str = "warrior items";
pub const WARRIOR_NAMES: &str = "warrior names";
pub const WARRIOR_DESCRIPTIONS: &str = "warrior descriptions";
pub const WARRIOR_DETAILS: &str = "warrior details";

pub const VICTORY_TEXT: &str = "Victory! All defects vanquished!";
pub const FAILURE_TEXT: &str = "💀 Quest Failed! The bugs have taken over. 💀";
pub const INVALID_ACTION_TEXT: &str = "Please enter a valid action";

/// The single-click actions on the quest screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestAction {
    FixBug,
    FindBug,
    ClaimBonus,
    ObtainArtifact,
    EarnDaysOff,
}

impl QuestAction {
    const fn concept(self) -> &'static str {
        match self {
            Self::FixBug => FIX_BUG_BUTTON,
            Self::FindBug => FIND_BUG_BUTTON,
            Self::ClaimBonus => CLAIM_BONUS_BUTTON,
            Self::ObtainArtifact => OBTAIN_ARTIFACT_BUTTON,
            Self::EarnDaysOff => EARN_DAYS_OFF_BUTTON,
        }
    }

    #[must_use]
    pub const fn for_reward(kind: RewardKind) -> Self {
        match kind {
            RewardKind::Gold => Self::ClaimBonus,
            RewardKind::Artifacts => Self::ObtainArtifact,
            RewardKind::DaysOff => Self::EarnDaysOff,
        }
    }
}

const fn reward_concept(kind: RewardKind) -> &'static str {
    match kind {
        RewardKind::Gold => GOLD_COINS,
        RewardKind::Artifacts => ARTIFACTS,
        RewardKind::DaysOff => DAYS_OFF,
    }
}

/// Progress, rewards, alerts and the warrior roster.
///
/// Action methods return as soon as the click is acknowledged; the state
/// they change is observed through the sampling methods and the poller.
#[derive(Debug)]
pub struct QuestScreen<'a, D: Document> {
    surface: Surface<'a, D>,
    config: &'a HarnessConfig,
}

impl<'a, D: Document> QuestScreen<'a, D> {
    pub fn new(document: &'a D, poller: Poller, config: &'a HarnessConfig) -> VerifyResult<Self> {
        let registry = LocatorRegistry::builder(SCREEN)
            .register(QUEST_NAME, Selector::role(Role::Heading, "QA Quest:"))
            .register(
                QUEST_DESCRIPTION,
                Selector::text(config.quest.quest_description.as_str()),
            )
            .register(PROGRESS_BAR, Selector::css("#progressBarFill"))
            .register(PROGRESS_TEXT, Selector::text("% Defect-Free"))
            .register(NOTIFICATION, Selector::css("#customAlertMessage"))
            .register(VICTORY_ALERT, Selector::text("🎉 Victory! All defects"))
            .register(FAILURE_ALERT, Selector::text("💀 Quest Failed! The bugs"))
            .register(GOLD_COINS, Selector::css("#goldCount"))
            .register(ARTIFACTS, Selector::css("#artifactCount"))
            .register(DAYS_OFF, Selector::css("#honorCount"))
            .register(FIX_BUG_BUTTON, Selector::role(Role::Button, "Fix Bug"))
            .register(FIND_BUG_BUTTON, Selector::role(Role::Button, "Find Bug"))
            .register(CLAIM_BONUS_BUTTON, Selector::role(Role::Button, "Claim Bonus"))
            .register(
                OBTAIN_ARTIFACT_BUTTON,
                Selector::role(Role::Button, "Obtain QA Artifact"),
            )
            .register(EARN_DAYS_OFF_BUTTON, Selector::role(Role::Button, "Earn Days Off"))
            .register(
                CUSTOM_ACTION_INPUT,
                Selector::role(Role::Textbox, "Enter custom QA action"),
            )
            .register(SUBMIT_CUSTOM_ACTION, Selector::role(Role::Button, "Submit Action"))
            .register(WARRIORS_LIST, Selector::css(".warriors-list"))
            .register(WARRIOR_ITEMS, Selector::css(".warrior-item"))
            .register(WARRIOR_NAMES, Selector::css(".warrior-name"))
            .register(WARRIOR_DESCRIPTIONS, Selector::css(".warrior-description"))
            .register(WARRIOR_DETAILS, Selector::css(".warrior-details"))
            .build()?;
        Ok(Self {
            surface: Surface::new(document, registry, poller),
            config,
        })
    }

    pub const fn surface(&self) -> &Surface<'a, D> {
        &self.surface
    }

    pub fn poller(&self) -> &Poller {
        self.surface.poller()
    }

    pub fn progress_bounds(&self) -> ValueBounds {
        self.config.rules.progress_bounds
    }

    // -- navigation -------------------------------------------------------

    pub async fn reload(&self) -> VerifyResult<()> {
        self.surface.document().reload().await?;
        self.verify_loaded().await
    }

    // -- actions ----------------------------------------------------------

    pub async fn perform(&self, action: QuestAction) -> VerifyResult<()> {
        self.surface.click(action.concept()).await
    }

    pub async fn fix_bug(&self) -> VerifyResult<()> {
        self.perform(QuestAction::FixBug).await
    }

    pub async fn find_bug(&self) -> VerifyResult<()> {
        self.perform(QuestAction::FindBug).await
    }

    pub async fn claim_bonus(&self) -> VerifyResult<()> {
        self.perform(QuestAction::ClaimBonus).await
    }

    pub async fn obtain_artifact(&self) -> VerifyResult<()> {
        self.perform(QuestAction::ObtainArtifact).await
    }

    pub async fn earn_days_off(&self) -> VerifyResult<()> {
        self.perform(QuestAction::EarnDaysOff).await
    }

    pub async fn submit_custom_action(&self, text: &str) -> VerifyResult<()> {
        self.surface.fill(CUSTOM_ACTION_INPUT, text).await?;
        self.surface.click(SUBMIT_CUSTOM_ACTION).await
    }

    // -- sampling ---------------------------------------------------------

    pub async fn quest_title(&self) -> VerifyResult<String> {
        Ok(self.surface.text(QUEST_NAME).await?.unwrap_or_default().trim().to_string())
    }

    pub async fn quest_description(&self) -> VerifyResult<String> {
        Ok(self
            .surface
            .text(QUEST_DESCRIPTION)
            .await?
            .unwrap_or_default()
            .trim()
            .to_string())
    }

    pub async fn progress_text(&self) -> VerifyResult<String> {
        match self.surface.text(PROGRESS_TEXT).await? {
            Some(text) => Ok(text.trim().to_string()),
            None => Err(VerifyError::malformed(PROGRESS_TEXT, None, "progress is not rendered")),
        }
    }

    pub async fn current_progress(&self) -> VerifyResult<u8> {
        let text = self.surface.text(PROGRESS_TEXT).await?;
        parse_progress(text.as_deref())
    }

    pub async fn progress_value(&self) -> VerifyResult<i64> {
        Ok(i64::from(self.current_progress().await?))
    }

    pub async fn reward(&self, kind: RewardKind) -> VerifyResult<u32> {
        let concept = reward_concept(kind);
        let text = self.surface.text(concept).await?;
        parse_counter(concept, text.as_deref())
    }

    pub async fn reward_value(&self, kind: RewardKind) -> VerifyResult<i64> {
        Ok(i64::from(self.reward(kind).await?))
    }

    pub async fn gold_coins(&self) -> VerifyResult<u32> {
        self.reward(RewardKind::Gold).await
    }

    pub async fn artifacts(&self) -> VerifyResult<u32> {
        self.reward(RewardKind::Artifacts).await
    }

    pub async fn days_off(&self) -> VerifyResult<u32> {
        self.reward(RewardKind::DaysOff).await
    }

    pub async fn reward_counts(&self) -> VerifyResult<Rewards> {
        Ok(Rewards {
            gold: self.gold_coins().await?,
            artifacts: self.artifacts().await?,
            days_off: self.days_off().await?,
        })
    }

    /// Text of the notification banner, `None` while it is hidden or empty.
    pub async fn last_alert_text(&self) -> VerifyResult<Option<String>> {
        if !self.surface.is_visible(NOTIFICATION).await? {
            return Ok(None);
        }
        Ok(self
            .surface
            .text(NOTIFICATION)
            .await?
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty()))
    }

    pub async fn snapshot(&self) -> VerifyResult<Snapshot> {
        Ok(Snapshot {
            progress: self.current_progress().await?,
            rewards: self.reward_counts().await?,
            alert: self.last_alert_text().await?,
        })
    }

    pub async fn warrior_count(&self) -> VerifyResult<usize> {
        self.surface.count(WARRIOR_ITEMS).await
    }

    pub async fn warrior_name(&self, index: usize) -> VerifyResult<String> {
        self.warrior_field(index, WARRIOR_NAMES).await
    }

    pub async fn warrior_description(&self, index: usize) -> VerifyResult<String> {
        self.warrior_field(index, WARRIOR_DESCRIPTIONS).await
    }

    /// Text of `concept` inside the `index`-th warrior item. Empty when the
    /// item exists but does not render the field.
    async fn warrior_field(&self, index: usize, concept: &str) -> VerifyResult<String> {
        let items = self.surface.all(WARRIOR_ITEMS).await?;
        let item = items.get(index).ok_or_else(|| {
            VerifyError::assertion(format!(
                "no warrior item at index {index}, {} rendered",
                items.len()
            ))
        })?;
        Ok(self
            .surface
            .text_within(item, concept)
            .await?
            .unwrap_or_default()
            .trim()
            .to_string())
    }

    // -- waits --------------------------------------------------------------

    pub async fn wait_for_progress(&self, expected: u8) -> VerifyResult<u8> {
        self.poller()
            .await_value("progress", || self.current_progress(), expected)
            .await
    }

    /// Delta wait on progress around one action. The rendered text is checked
    /// against the resolved value too.
    pub async fn progress_after(&self, action: QuestAction, delta: i64) -> VerifyResult<Delta> {
        let outcome = self
            .poller()
            .await_delta(
                "progress",
                || self.progress_value(),
                || self.perform(action),
                delta,
                self.progress_bounds(),
            )
            .await?;
        self.surface
            .expect_contains_text(PROGRESS_TEXT, &format!("{}%", outcome.resolved))
            .await?;
        Ok(outcome)
    }

    /// Delta wait on one reward counter after its action.
    pub async fn reward_after(&self, kind: RewardKind) -> VerifyResult<Delta> {
        let rules = &self.config.rules;
        let delta = match kind {
            RewardKind::Gold => rules.gold_per_bonus,
            RewardKind::Artifacts => rules.artifacts_per_claim,
            RewardKind::DaysOff => rules.days_off_per_claim,
        };
        self.poller()
            .await_delta(
                kind.label(),
                || self.reward_value(kind),
                || self.perform(QuestAction::for_reward(kind)),
                delta,
                ValueBounds::COUNTER,
            )
            .await
    }

    // -- verification -----------------------------------------------------

    pub async fn verify_loaded(&self) -> VerifyResult<()> {
        self.surface.expect_visible(QUEST_NAME).await?;
        self.surface.expect_visible(PROGRESS_TEXT).await
    }

    pub async fn verify_quest_details(&self, name: &str, description: &str) -> VerifyResult<()> {
        self.surface
            .expect_text(QUEST_NAME, &format!("QA Quest: {name}"))
            .await?;
        self.surface.expect_text(QUEST_DESCRIPTION, description).await?;
        Ok(())
    }

    pub async fn verify_progress(&self, expected: u8) -> VerifyResult<()> {
        self.surface.expect_visible(PROGRESS_TEXT).await?;
        self.surface.expect_visible(PROGRESS_BAR).await?;
        self.wait_for_progress(expected).await?;
        self.surface
            .expect_contains_text(PROGRESS_TEXT, &format!("{expected}% Defect-Free"))
            .await?;
        Ok(())
    }

    pub async fn verify_victory(&self) -> VerifyResult<()> {
        self.surface.expect_visible(VICTORY_ALERT).await?;
        self.surface
            .expect_contains_text(VICTORY_ALERT, VICTORY_TEXT)
            .await?;
        Ok(())
    }

    pub async fn verify_failure(&self) -> VerifyResult<()> {
        self.surface.expect_visible(FAILURE_ALERT).await?;
        self.surface
            .expect_contains_text(FAILURE_ALERT, FAILURE_TEXT)
            .await?;
        Ok(())
    }

    pub async fn verify_custom_action_notification(&self, action: &str) -> VerifyResult<()> {
        self.surface.expect_contains_text(NOTIFICATION, action).await?;
        Ok(())
    }

    pub async fn verify_empty_action_notification(&self) -> VerifyResult<()> {
        self.surface
            .expect_contains_text(NOTIFICATION, INVALID_ACTION_TEXT)
            .await?;
        Ok(())
    }

    pub async fn verify_warrior_details(&self, name: &str) -> VerifyResult<()> {
        self.surface.expect_contains_text(WARRIOR_DETAILS, name).await?;
        Ok(())
    }

    pub async fn verify_warriors(&self, names: &[String]) -> VerifyResult<()> {
        for name in names {
            self.surface.expect_contains_text(WARRIORS_LIST, name).await?;
        }
        Ok(())
    }
}
