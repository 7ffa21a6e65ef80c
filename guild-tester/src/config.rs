use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::snapshot::ValueBounds;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5173/";
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 300;
pub const DEFAULT_NAVIGATION_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_SETTLE_WINDOW_MS: u64 = 1_000;
pub const DEFAULT_DRIVE_ITERATION_CAP: u32 = 25;

/// Poller timing. Interval is fixed; there is no backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub timeout_ms: u64,
    pub interval_ms: u64,
    pub navigation_timeout_ms: u64,
    /// How long `ensure_stable` keeps sampling.
    pub settle_window_ms: u64,
    pub drive_iteration_cap: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            interval_ms: DEFAULT_POLL_INTERVAL_MS,
            navigation_timeout_ms: DEFAULT_NAVIGATION_TIMEOUT_MS,
            settle_window_ms: DEFAULT_SETTLE_WINDOW_MS,
            drive_iteration_cap: DEFAULT_DRIVE_ITERATION_CAP,
        }
    }
}

impl PollConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    #[must_use]
    pub const fn navigation_timeout(&self) -> Duration {
        Duration::from_millis(self.navigation_timeout_ms)
    }

    #[must_use]
    pub const fn settle_window(&self) -> Duration {
        Duration::from_millis(self.settle_window_ms)
    }
}

/// Documented effects of the quest actions, as the scenarios expect them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    pub starting_progress: u8,
    pub progress_step: i64,
    pub progress_bounds: ValueBounds,
    pub gold_per_bonus: i64,
    pub artifacts_per_claim: i64,
    pub days_off_per_claim: i64,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            starting_progress: 30,
            progress_step: 10,
            progress_bounds: ValueBounds::PROGRESS,
            gold_per_bonus: 10,
            artifacts_per_claim: 1,
            days_off_per_claim: 5,
        }
    }
}

/// Data entered by scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuestData {
    pub quest_name: String,
    pub quest_description: String,
    pub custom_action: String,
    pub warrior: String,
    pub warriors: Vec<String>,
    pub landing_title: String,
    pub footer_text: Option<String>,
}

impl Default for QuestData {
    fn default() -> Self {
        Self {
            quest_name: "Go Go Game".to_string(),
            quest_description: "New Game the best".to_string(),
            custom_action: "Perform special test".to_string(),
            warrior: "Code Guardian".to_string(),
            warriors: vec![
                "Bug Hunter".to_string(),
                "Code Guardian".to_string(),
                "Test Mage".to_string(),
            ],
            landing_title: "Legion QA Guild Signup".to_string(),
            footer_text: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub base_url: String,
    pub poll: PollConfig,
    pub rules: GameRules,
    pub quest: QuestData,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll: PollConfig::default(),
            rules: GameRules::default(),
            quest: QuestData::default(),
        }
    }
}

impl HarnessConfig {
    /// Load a JSON config; missing fields keep their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        anyhow::ensure!(config.poll.interval_ms > 0, "poll.interval_ms must be positive");
        anyhow::ensure!(
            config.poll.drive_iteration_cap > 0,
            "poll.drive_iteration_cap must be positive"
        );
        Ok(config)
    }

    /// Resolve a path such as `/quest` against the base URL.
    #[must_use]
    pub fn url_for(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_guild_game() {
        let config = HarnessConfig::default();
        assert_eq!(config.poll.interval(), Duration::from_millis(300));
        assert_eq!(config.poll.timeout(), Duration::from_secs(10));
        assert_eq!(config.rules.starting_progress, 30);
        assert_eq!(config.rules.progress_bounds.max, Some(100));
        assert_eq!(config.quest.warriors.len(), 3);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = HarnessConfig::from_json(
            r#"{ "base_url": "http://guild.test", "poll": { "interval_ms": 100 } }"#,
        )
        .expect("valid config");
        assert_eq!(config.base_url, "http://guild.test");
        assert_eq!(config.poll.interval_ms, 100);
        assert_eq!(config.poll.timeout_ms, DEFAULT_WAIT_TIMEOUT_MS);
        assert_eq!(config.quest.quest_name, "Go Go Game");
    }

    #[test]
    fn zero_interval_is_rejected() {
        let err = HarnessConfig::from_json(r#"{ "poll": { "interval_ms": 0 } }"#)
            .expect_err("zero interval");
        assert!(err.to_string().contains("interval_ms"));
    }

    #[test]
    fn load_reports_the_path_on_failure() {
        let missing = std::env::temp_dir().join("guild-tester-missing-config.json");
        let err = HarnessConfig::load(&missing).expect_err("missing file");
        assert!(format!("{err:#}").contains("guild-tester-missing-config.json"));
    }

    #[test]
    fn url_for_joins_paths() {
        let config = HarnessConfig::default();
        assert_eq!(config.url_for("/quest"), "http://localhost:5173/quest");
        assert_eq!(config.url_for(""), "http://localhost:5173/");
    }
}
