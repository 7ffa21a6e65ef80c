use anyhow::{Context, Result};
use chrono::Utc;
use std::{fs, path::Path};
use thirtyfour::prelude::*;

use crate::snapshot::Snapshot;

pub fn artifacts_dir(base: &str, browser: &str, scenario: &str) -> String {
    let ts = Utc::now().format("%Y%m%dT%H%M%S");
    format!("{base}/{browser}/{scenario}/{ts}")
}

/// Screenshot, DOM source, the last quest snapshot (when one could be read)
/// and the failure reason of a browser scenario.
pub async fn capture_artifacts(
    driver: &WebDriver,
    dir: &str,
    snapshot: Option<&Snapshot>,
    reason: &str,
) -> Result<()> {
    let screenshot = driver.screenshot_as_png().await.ok();
    let source = driver.source().await.ok();
    let url = driver.current_url().await.ok().map(|url| url.to_string());
    let report = match url {
        Some(url) => format!("{reason}\nat {url}\n"),
        None => format!("{reason}\n"),
    };

    write_artifact_files(
        Path::new(dir),
        screenshot.as_deref(),
        source.as_deref(),
        snapshot,
        &report,
    )
}

fn write_artifact_files(
    dir: &Path,
    screenshot: Option<&[u8]>,
    source: Option<&str>,
    snapshot: Option<&Snapshot>,
    error_chain: &str,
) -> Result<()> {
    fs::create_dir_all(dir).context("creating artifacts dir")?;

    if let Some(png) = screenshot {
        let _ = fs::write(dir.join("screenshot.png"), png);
    }

    if let Some(src) = source {
        let _ = fs::write(dir.join("dom.html"), src);
    }

    if let Some(snapshot) = snapshot {
        let payload = serde_json::to_vec_pretty(snapshot).context("serializing snapshot")?;
        let _ = fs::write(dir.join("snapshot.json"), payload);
    }

    fs::write(dir.join("error.txt"), error_chain).context("writing error.txt")?;

    Ok(())
}

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Rewards;

    #[test]
    fn split_csv_trims_and_filters() {
        let parts = split_csv(" rewards, ,warriors,  custom-alerts ");
        assert_eq!(parts, vec!["rewards", "warriors", "custom-alerts"]);
    }

    #[test]
    fn artifacts_dir_includes_key_segments() {
        let dir = artifacts_dir("target/guild-artifacts", "firefox", "rewards");
        assert!(dir.starts_with("target/guild-artifacts/firefox/rewards/"));
    }

    #[test]
    fn write_artifact_files_writes_expected_payloads() {
        let base = std::env::temp_dir().join(format!(
            "guild-artifacts-{}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ));
        let snapshot = Snapshot {
            progress: 40,
            rewards: Rewards {
                gold: 10,
                artifacts: 0,
                days_off: 0,
            },
            alert: None,
        };
        write_artifact_files(
            &base,
            Some(&[1, 2, 3]),
            Some("<html />"),
            Some(&snapshot),
            "timed out",
        )
        .expect("write artifacts");

        assert!(base.join("screenshot.png").exists());
        assert!(base.join("dom.html").exists());
        let written = fs::read_to_string(base.join("snapshot.json")).expect("snapshot written");
        assert!(written.contains("\"progress\": 40"));
        assert_eq!(
            fs::read_to_string(base.join("error.txt")).expect("error written"),
            "timed out"
        );
    }
}
