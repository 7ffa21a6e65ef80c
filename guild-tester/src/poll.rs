//! Eventual-state polling.
//!
//! The UI applies the effect of an action after an unknown delay. Instead of
//! sleeping a fixed amount and hoping, every expectation is a bounded loop:
//! sample, test the predicate, sleep one interval, repeat until the deadline.
//! Samples are side-effect free, so retrying them cannot change the outcome.

use log::{debug, trace, warn};
use regex::Regex;
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::clock::Clock;
use crate::config::PollConfig;
use crate::document::Document;
use crate::error::{VerifyError, VerifyResult};
use crate::snapshot::ValueBounds;

/// External cancellation, checked before every sample.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal(Arc<AtomicBool>);

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Deadline and sampling interval for one expectation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    pub timeout: Duration,
    pub interval: Duration,
}

impl WaitOptions {
    #[must_use]
    pub const fn new(timeout: Duration, interval: Duration) -> Self {
        Self { timeout, interval }
    }

    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl From<&PollConfig> for WaitOptions {
    fn from(config: &PollConfig) -> Self {
        Self::new(config.timeout(), config.interval())
    }
}

/// Outcome of a delta wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delta {
    pub baseline: i64,
    pub target: i64,
    pub resolved: i64,
}

/// Stateless between calls; clone freely.
#[derive(Debug, Clone)]
pub struct Poller {
    clock: Arc<dyn Clock>,
    options: WaitOptions,
    settle_window: Duration,
    abort: AbortSignal,
}

impl Poller {
    pub fn new(clock: Arc<dyn Clock>, config: &PollConfig, abort: AbortSignal) -> Self {
        Self {
            clock,
            options: WaitOptions::from(config),
            settle_window: config.settle_window(),
            abort,
        }
    }

    #[must_use]
    pub const fn options(&self) -> WaitOptions {
        self.options
    }

    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Sample until `predicate` holds, with the default options.
    pub async fn await_condition<T, S, Fut, P>(
        &self,
        expected: &str,
        sample: S,
        predicate: P,
    ) -> VerifyResult<T>
    where
        T: Debug + Send,
        S: FnMut() -> Fut + Send,
        Fut: Future<Output = VerifyResult<T>> + Send,
        P: Fn(&T) -> bool + Send,
    {
        self.await_condition_with(self.options, expected, sample, predicate)
            .await
    }

    pub async fn await_condition_with<T, S, Fut, P>(
        &self,
        options: WaitOptions,
        expected: &str,
        mut sample: S,
        predicate: P,
    ) -> VerifyResult<T>
    where
        T: Debug + Send,
        S: FnMut() -> Fut + Send,
        Fut: Future<Output = VerifyResult<T>> + Send,
        P: Fn(&T) -> bool + Send,
    {
        let started = self.clock.now();
        let deadline = started + options.timeout;
        let mut samples: u32 = 0;

        loop {
            if self.abort.is_aborted() {
                return Err(VerifyError::Aborted {
                    expected: expected.to_string(),
                });
            }

            let observed = sample().await?;
            samples += 1;
            if predicate(&observed) {
                debug!("resolved '{expected}' after {samples} samples: {observed:?}");
                return Ok(observed);
            }

            let now = self.clock.now();
            if now >= deadline {
                warn!("gave up on '{expected}' after {samples} samples; last {observed:?}");
                return Err(VerifyError::Timeout {
                    expected: expected.to_string(),
                    last_observed: format!("{observed:?}"),
                    waited: now.saturating_sub(started),
                    samples,
                });
            }

            trace!("'{expected}' not yet met: {observed:?}");
            self.clock
                .sleep(options.interval.min(deadline.saturating_sub(now)))
                .await;
        }
    }

    /// Absolute-target wait.
    pub async fn await_value<T, S, Fut>(&self, what: &str, sample: S, expected: T) -> VerifyResult<T>
    where
        T: Debug + PartialEq + Send + Sync,
        S: FnMut() -> Fut + Send,
        Fut: Future<Output = VerifyResult<T>> + Send,
    {
        let description = format!("{what} to equal {expected:?}");
        self.await_condition(&description, sample, |observed| *observed == expected)
            .await
    }

    /// Delta wait: read a baseline, run `action`, then wait for the value to
    /// move by `delta`. The target is clamped to `bounds`, so an action that
    /// would push past a boundary resolves at the boundary.
    pub async fn await_delta<S, Fut, A, AFut>(
        &self,
        what: &str,
        mut sample: S,
        action: A,
        delta: i64,
        bounds: ValueBounds,
    ) -> VerifyResult<Delta>
    where
        S: FnMut() -> Fut + Send,
        Fut: Future<Output = VerifyResult<i64>> + Send,
        A: FnOnce() -> AFut + Send,
        AFut: Future<Output = VerifyResult<()>> + Send,
    {
        let baseline = sample().await?;
        action().await?;
        let target = bounds.clamp(baseline.saturating_add(delta));
        let description = format!("{what} to move from {baseline} by {delta:+} to {target}");
        let resolved = self
            .await_condition(&description, sample, |value| *value == target)
            .await?;
        Ok(Delta {
            baseline,
            target,
            resolved,
        })
    }

    /// Keep sampling for the settle window; fail as soon as `predicate`
    /// stops holding. Used to show that something did *not* change.
    pub async fn ensure_stable<T, S, Fut, P>(
        &self,
        what: &str,
        mut sample: S,
        predicate: P,
    ) -> VerifyResult<T>
    where
        T: Debug + Send,
        S: FnMut() -> Fut + Send,
        Fut: Future<Output = VerifyResult<T>> + Send,
        P: Fn(&T) -> bool + Send,
    {
        let deadline = self.clock.now() + self.settle_window;
        loop {
            if self.abort.is_aborted() {
                return Err(VerifyError::Aborted {
                    expected: what.to_string(),
                });
            }
            let observed = sample().await?;
            if !predicate(&observed) {
                return Err(VerifyError::assertion(format!(
                    "{what} did not hold; observed {observed:?}"
                )));
            }
            let now = self.clock.now();
            if now >= deadline {
                return Ok(observed);
            }
            self.clock
                .sleep(self.options.interval.min(deadline.saturating_sub(now)))
                .await;
        }
    }

    /// Wait for the document URL to match `pattern`.
    pub async fn await_url<D: Document>(
        &self,
        document: &D,
        pattern: &Regex,
        timeout: Duration,
    ) -> VerifyResult<String> {
        let description = format!("URL matching /{pattern}/");
        self.await_condition_with(
            self.options.with_timeout(timeout),
            &description,
            || document.current_url(),
            |url| pattern.is_match(url),
        )
        .await
    }
}
