use log::{debug, warn};
use std::future::Future;

use crate::document::Document;
use crate::error::{VerifyError, VerifyResult};
use crate::poll::Poller;
use crate::screens::QuestScreen;
use crate::snapshot::PROGRESS_MAX;
use crate::verify;

/// Repeat `action` until `done` holds for the sampled value.
///
/// After every action the value must move (or satisfy `done`) within the
/// poller's timeout. More than `cap` actions is reported as a timeout.
pub async fn drive_until<S, Fut, A, AFut, P>(
    poller: &Poller,
    what: &str,
    mut sample: S,
    mut action: A,
    done: P,
    cap: u32,
) -> VerifyResult<i64>
where
    S: FnMut() -> Fut + Send,
    Fut: Future<Output = VerifyResult<i64>> + Send,
    A: FnMut() -> AFut + Send,
    AFut: Future<Output = VerifyResult<()>> + Send,
    P: Fn(i64) -> bool + Send + Sync,
{
    let started = poller.clock().now();
    let mut current = sample().await?;
    let mut steps: u32 = 0;

    while !done(current) {
        if steps >= cap {
            warn!("{what}: gave up after {steps} steps at {current}");
            return Err(VerifyError::Timeout {
                expected: format!("{what} to reach its target within {cap} steps"),
                last_observed: current.to_string(),
                waited: poller.clock().now().saturating_sub(started),
                samples: steps,
            });
        }

        action().await?;
        steps += 1;

        let before = current;
        let description = format!("{what} to move off {before}");
        current = poller
            .await_condition(&description, &mut sample, |value| {
                *value != before || done(*value)
            })
            .await?;
        debug!("{what}: step {steps} moved {before} -> {current}");
    }

    Ok(current)
}

/// Fix or find bugs until progress sits exactly on `target`.
pub async fn reset_progress<D: Document>(
    quest: &QuestScreen<'_, D>,
    target: u8,
    cap: u32,
) -> VerifyResult<()> {
    let target = i64::from(target);
    let current = quest.progress_value().await?;

    let reached = if current > target {
        drive_until(
            quest.poller(),
            "progress",
            || quest.progress_value(),
            || quest.find_bug(),
            |value| value <= target,
            cap,
        )
        .await?
    } else if current < target {
        drive_until(
            quest.poller(),
            "progress",
            || quest.progress_value(),
            || quest.fix_bug(),
            |value| value >= target,
            cap,
        )
        .await?
    } else {
        current
    };

    verify!(
        reached == target,
        "progress reset to {target} overshot and landed on {reached}"
    );
    Ok(())
}

pub async fn fix_bugs_until_victory<D: Document>(
    quest: &QuestScreen<'_, D>,
    cap: u32,
) -> VerifyResult<i64> {
    let max = quest
        .progress_bounds()
        .max
        .unwrap_or_else(|| i64::from(PROGRESS_MAX));
    drive_until(
        quest.poller(),
        "progress",
        || quest.progress_value(),
        || quest.fix_bug(),
        |value| value >= max,
        cap,
    )
    .await
}

pub async fn find_bugs_until_failure<D: Document>(
    quest: &QuestScreen<'_, D>,
    cap: u32,
) -> VerifyResult<i64> {
    let min = quest.progress_bounds().min;
    drive_until(
        quest.poller(),
        "progress",
        || quest.progress_value(),
        || quest.find_bug(),
        |value| value <= min,
        cap,
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::VirtualClock;
    use crate::config::PollConfig;
    use crate::error::ErrorKind;
    use crate::poll::AbortSignal;
    use std::sync::{Arc, Mutex};

    fn poller() -> Poller {
        Poller::new(
            Arc::new(VirtualClock::new()),
            &PollConfig::default(),
            AbortSignal::new(),
        )
    }

    #[tokio::test]
    async fn drives_to_the_clamped_boundary() {
        let value = Arc::new(Mutex::new(70_i64));
        let steps = Arc::new(Mutex::new(0_u32));
        let reached = drive_until(
            &poller(),
            "progress",
            || {
                let value = Arc::clone(&value);
                async move { Ok(*value.lock().unwrap()) }
            },
            || {
                let value = Arc::clone(&value);
                let steps = Arc::clone(&steps);
                async move {
                    *steps.lock().unwrap() += 1;
                    let mut value = value.lock().unwrap();
                    *value = (*value + 10).min(100);
                    Ok(())
                }
            },
            |value| value >= 100,
            25,
        )
        .await
        .expect("reaches 100");
        assert_eq!(reached, 100);
        assert_eq!(*steps.lock().unwrap(), 3);
    }

    #[tokio::test]
    async fn already_at_the_target_takes_no_action() {
        let reached = drive_until(
            &poller(),
            "progress",
            || async { Ok(0_i64) },
            || async { Err(VerifyError::assertion("no action expected")) },
            |value| value <= 0,
            25,
        )
        .await
        .expect("already done");
        assert_eq!(reached, 0);
    }

    #[tokio::test]
    async fn iteration_cap_is_a_timeout() {
        let value = Arc::new(Mutex::new(0_i64));
        let err = drive_until(
            &poller(),
            "progress",
            || {
                let value = Arc::clone(&value);
                async move { Ok(*value.lock().unwrap()) }
            },
            || {
                let value = Arc::clone(&value);
                async move {
                    *value.lock().unwrap() += 1;
                    Ok(())
                }
            },
            |value| value >= 100,
            5,
        )
        .await
        .expect_err("cap is too small");
        assert_eq!(err.kind(), ErrorKind::Timeout);
        assert!(err.to_string().contains("within 5 steps"));
    }

    #[tokio::test]
    async fn a_stuck_value_times_out_after_one_action() {
        let err = drive_until(
            &poller(),
            "progress",
            || async { Ok(50_i64) },
            || async { Ok(()) },
            |value| value >= 100,
            25,
        )
        .await
        .expect_err("value never moves");
        match err {
            VerifyError::Timeout { expected, .. } => {
                assert_eq!(expected, "progress to move off 50");
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }
}
