use colored::Colorize;
use log::{error, info};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;

use crate::clock::VirtualClock;
use crate::config::HarnessConfig;
use crate::document::Document;
use crate::error::VerifyError;
use crate::poll::{AbortSignal, Poller};
use crate::scenario::{ScenarioCtx, ScenarioId};
use crate::simulated::SimulatedGuild;

pub const SIMULATED_TARGET: &str = "simulated";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    /// A wait timed out or a direct assertion did not hold.
    Failed,
    /// The scenario could not be judged: bad locators, unreadable state,
    /// a driver failure or an abort.
    Errored,
}

impl Outcome {
    #[must_use]
    pub const fn from_error(err: &VerifyError) -> Self {
        if err.is_verification_failure() {
            Self::Failed
        } else {
            Self::Errored
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Passed => "PASS",
            Self::Failed => "FAIL",
            Self::Errored => "ERROR",
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_key: String,
    pub scenario_name: String,
    /// `simulated` or the browser the scenario ran in.
    pub target: String,
    pub outcome: Outcome,
    pub reason: Option<String>,
    #[serde(with = "duration_serde")]
    pub duration: Duration,
}

impl ScenarioResult {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.outcome == Outcome::Passed
    }

    pub fn errored(id: ScenarioId, target: &str, reason: String) -> Self {
        Self {
            scenario_key: id.key().to_string(),
            scenario_name: id.name().to_string(),
            target: target.to_string(),
            outcome: Outcome::Errored,
            reason: Some(reason),
            duration: Duration::ZERO,
        }
    }
}

/// Run one scenario and classify how it ended. Duration is measured on the
/// poller's clock, so simulated runs report virtual time.
pub async fn run_scenario<D: Document>(
    id: ScenarioId,
    ctx: &ScenarioCtx<'_, D>,
    target: &str,
) -> ScenarioResult {
    if ctx.verbose {
        println!(
            "🧪 Running scenario: {} ({target})",
            id.name().bright_white()
        );
    }
    info!("scenario {} on {target}: start", id.key());

    let started = ctx.poller.clock().now();
    let outcome = id.run(ctx).await;
    let duration = ctx.poller.clock().now().saturating_sub(started);

    let (outcome, reason) = match outcome {
        Ok(()) => (Outcome::Passed, None),
        Err(err) => (Outcome::from_error(&err), Some(err.to_string())),
    };
    info!("scenario {} on {target}: {outcome} in {duration:?}", id.key());

    if ctx.verbose {
        match &reason {
            None => println!("  ✅ {} passed ({duration:?})", id.name()),
            Some(reason) => println!("  ❌ {} {outcome}: {}", id.name(), reason.red()),
        }
    }

    ScenarioResult {
        scenario_key: id.key().to_string(),
        scenario_name: id.name().to_string(),
        target: target.to_string(),
        outcome,
        reason,
        duration,
    }
}

/// Every scenario gets its own guild and virtual clock and they all run
/// concurrently. Results come back in the order of `ids`.
pub async fn run_simulated(
    ids: &[ScenarioId],
    config: &HarnessConfig,
    latency: Duration,
    verbose: bool,
    abort: &AbortSignal,
) -> Vec<ScenarioResult> {
    let mut tasks = JoinSet::new();
    for (index, id) in ids.iter().copied().enumerate() {
        let config = config.clone();
        let abort = abort.clone();
        tasks.spawn(async move {
            let clock = VirtualClock::new();
            let guild = SimulatedGuild::new(clock.clone(), &config).with_latency(latency);
            let poller = Poller::new(Arc::new(clock), &config.poll, abort);
            let ctx = ScenarioCtx::new(&guild, poller, &config, verbose);
            (index, run_scenario(id, &ctx, SIMULATED_TARGET).await)
        });
    }

    let mut slots: Vec<Option<ScenarioResult>> = vec![None; ids.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, result)) => slots[index] = Some(result),
            Err(err) => error!("simulated scenario task failed: {err}"),
        }
    }

    slots
        .into_iter()
        .zip(ids)
        .map(|(slot, id)| {
            slot.unwrap_or_else(|| {
                ScenarioResult::errored(*id, SIMULATED_TARGET, "scenario task panicked".to_string())
            })
        })
        .collect()
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

    #[test]
    fn outcome_follows_the_error_taxonomy() {
        assert_eq!(
            Outcome::from_error(&VerifyError::assertion("nope")),
            Outcome::Failed
        );
        assert_eq!(
            Outcome::from_error(&VerifyError::configuration("quest", "unknown")),
            Outcome::Errored
        );
        assert_eq!(
            Outcome::from_error(&VerifyError::Aborted {
                expected: "progress".to_string()
            }),
            Outcome::Errored
        );
    }

    #[test]
    fn result_serializes_duration_as_millis() {
        let result = ScenarioResult {
            scenario_key: "rewards".to_string(),
            scenario_name: "Rewards System".to_string(),
            target: SIMULATED_TARGET.to_string(),
            outcome: Outcome::Failed,
            reason: Some("timed out".to_string()),
            duration: Duration::from_millis(1_250),
        };
        let json = serde_json::to_value(&result).expect("serializes");
        assert_eq!(json["duration"], 1_250);
        assert_eq!(json["outcome"], "failed");

        let back: ScenarioResult = serde_json::from_value(json).expect("deserializes");
        assert_eq!(back.duration, Duration::from_millis(1_250));
        assert!(!back.passed());
    }
}
