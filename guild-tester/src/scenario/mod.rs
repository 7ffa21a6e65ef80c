//! End-to-end scenarios composed from screens and the poller.
//!
//! Every scenario starts from a fresh baseline: it builds new screens,
//! navigates to the landing page and walks forward from there. Nothing is
//! shared between two scenarios except the document they drive.

use colored::Colorize;
use log::info;
use std::fmt;

use crate::config::HarnessConfig;
use crate::document::Document;
use crate::error::VerifyResult;
use crate::poll::Poller;
use crate::screens::{ConfigurationScreen, LandingScreen, QuestScreen};

pub mod drive;
mod onboarding;
mod quest;

pub use drive::{drive_until, find_bugs_until_failure, fix_bugs_until_victory, reset_progress};

/// What a scenario needs to run: one document, a poller bound to the right
/// clock, and the harness configuration.
#[derive(Debug, Clone)]
pub struct ScenarioCtx<'a, D: Document> {
    pub document: &'a D,
    pub poller: Poller,
    pub config: &'a HarnessConfig,
    pub verbose: bool,
}

impl<'a, D: Document> ScenarioCtx<'a, D> {
    pub const fn new(
        document: &'a D,
        poller: Poller,
        config: &'a HarnessConfig,
        verbose: bool,
    ) -> Self {
        Self {
            document,
            poller,
            config,
            verbose,
        }
    }

    pub fn landing(&self) -> VerifyResult<LandingScreen<'a, D>> {
        LandingScreen::new(self.document, self.poller.clone(), self.config)
    }

    pub fn configuration(&self) -> VerifyResult<ConfigurationScreen<'a, D>> {
        ConfigurationScreen::new(self.document, self.poller.clone(), self.config)
    }

    pub fn quest(&self) -> VerifyResult<QuestScreen<'a, D>> {
        QuestScreen::new(self.document, self.poller.clone(), self.config)
    }

    pub fn step(&self, message: &str) {
        info!("{message}");
        if self.verbose {
            println!("  {} {message}", "↳".dimmed());
        }
    }

    /// Landing, configuration with the default quest data, then the quest
    /// screen once it has rendered.
    pub async fn enter_quest(&self) -> VerifyResult<QuestScreen<'a, D>> {
        let landing = self.landing()?;
        landing.open().await?;
        landing.verify_loaded().await?;
        landing.click_start_quest().await?;

        let configuration = self.configuration()?;
        configuration.verify_loaded().await?;
        configuration
            .configure_quest(&self.config.quest.quest_name, &self.config.quest.quest_description)
            .await?;
        configuration.initiate_adventure().await?;
        configuration.embark_on_testing().await?;

        let quest = self.quest()?;
        quest.verify_loaded().await?;
        self.step("entered the quest screen");
        Ok(quest)
    }
}

/// The scenario catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScenarioId {
    Landing,
    QuestDetails,
    ProgressTracking,
    Rewards,
    ActionButtons,
    CustomActions,
    CustomAlerts,
    Warriors,
    WarriorSelection,
    ConfigValidation,
}

impl ScenarioId {
    pub const ALL: [Self; 10] = [
        Self::Landing,
        Self::QuestDetails,
        Self::ProgressTracking,
        Self::Rewards,
        Self::ActionButtons,
        Self::CustomActions,
        Self::CustomAlerts,
        Self::Warriors,
        Self::WarriorSelection,
        Self::ConfigValidation,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Landing => "landing",
            Self::QuestDetails => "quest-details",
            Self::ProgressTracking => "progress-tracking",
            Self::Rewards => "rewards",
            Self::ActionButtons => "action-buttons",
            Self::CustomActions => "custom-actions",
            Self::CustomAlerts => "custom-alerts",
            Self::Warriors => "warriors",
            Self::WarriorSelection => "warrior-selection",
            Self::ConfigValidation => "config-validation",
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Landing => "Landing Page",
            Self::QuestDetails => "Quest Details",
            Self::ProgressTracking => "Progress Tracking",
            Self::Rewards => "Rewards System",
            Self::ActionButtons => "Action Buttons",
            Self::CustomActions => "Custom Actions",
            Self::CustomAlerts => "Custom Alerts",
            Self::Warriors => "QA Warriors",
            Self::WarriorSelection => "Warrior Selection",
            Self::ConfigValidation => "Configuration Validation",
        }
    }

    pub async fn run<D: Document>(self, ctx: &ScenarioCtx<'_, D>) -> VerifyResult<()> {
        match self {
            Self::Landing => onboarding::landing(ctx).await,
            Self::QuestDetails => quest::quest_details(ctx).await,
            Self::ProgressTracking => quest::progress_tracking(ctx).await,
            Self::Rewards => quest::rewards(ctx).await,
            Self::ActionButtons => quest::action_buttons(ctx).await,
            Self::CustomActions => quest::custom_actions(ctx).await,
            Self::CustomAlerts => quest::custom_alerts(ctx).await,
            Self::Warriors => quest::warriors(ctx).await,
            Self::WarriorSelection => onboarding::warrior_selection(ctx).await,
            Self::ConfigValidation => onboarding::config_validation(ctx).await,
        }
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn get_scenario(name: &str) -> Option<ScenarioId> {
    let key = name.trim().to_lowercase();
    ScenarioId::ALL.into_iter().find(|id| id.key() == key)
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    ScenarioId::ALL
        .into_iter()
        .map(|id| (id.key(), id.name()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_scenario_accepts_catalog_keys() {
        assert_eq!(get_scenario("rewards"), Some(ScenarioId::Rewards));
        assert_eq!(get_scenario(" Custom-Alerts "), Some(ScenarioId::CustomAlerts));
        assert_eq!(get_scenario("smoke"), None);
    }

    #[test]
    fn catalog_keys_are_unique() {
        let listed = list_scenarios();
        assert_eq!(listed.len(), ScenarioId::ALL.len());
        let mut keys: Vec<_> = listed.iter().map(|(key, _)| *key).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), ScenarioId::ALL.len());
        assert!(!keys.contains(&"all"));
    }
}
