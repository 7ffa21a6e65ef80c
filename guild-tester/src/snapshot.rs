//! Typed state read back from the rendered quest screen.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::error::{VerifyError, VerifyResult};

static PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(-?\d+(?:,\d+)*)\s*%").expect("valid regex"));
static INTEGER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?\d+(?:,\d+)*").expect("valid regex"));

pub const PROGRESS_MAX: u8 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rewards {
    pub gold: u32,
    pub artifacts: u32,
    pub days_off: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardKind {
    Gold,
    Artifacts,
    DaysOff,
}

impl RewardKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Gold => "gold coins",
            Self::Artifacts => "artifacts",
            Self::DaysOff => "days off",
        }
    }
}

impl Rewards {
    #[must_use]
    pub const fn get(&self, kind: RewardKind) -> u32 {
        match kind {
            RewardKind::Gold => self.gold,
            RewardKind::Artifacts => self.artifacts,
            RewardKind::DaysOff => self.days_off,
        }
    }
}

/// Observable quest state at one instant. Never mutated once sampled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub progress: u8,
    pub rewards: Rewards,
    pub alert: Option<String>,
}

/// Inclusive clamping range a value is held to by the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueBounds {
    pub min: i64,
    pub max: Option<i64>,
}

impl ValueBounds {
    pub const PROGRESS: Self = Self {
        min: 0,
        max: Some(PROGRESS_MAX as i64),
    };
    pub const COUNTER: Self = Self { min: 0, max: None };

    #[must_use]
    pub fn clamp(&self, value: i64) -> i64 {
        let floored = value.max(self.min);
        self.max.map_or(floored, |max| floored.min(max))
    }
}

/// Parse a progress read-out such as `"40% Defect-Free"`.
pub fn parse_progress(text: Option<&str>) -> VerifyResult<u8> {
    let raw = text.ok_or_else(|| VerifyError::malformed("progress", None, "no text rendered"))?;
    let captures = PERCENT
        .captures(raw)
        .ok_or_else(|| VerifyError::malformed("progress", Some(raw), "no percentage found"))?;
    let value: u16 = plain_digits("progress", raw, &captures[1])?
        .parse()
        .map_err(|_| VerifyError::malformed("progress", Some(raw), "percentage out of range"))?;
    u8::try_from(value)
        .ok()
        .filter(|v| *v <= PROGRESS_MAX)
        .ok_or_else(|| VerifyError::malformed("progress", Some(raw), "percentage above 100"))
}

/// Parse the first integer in a counter read-out such as `"10"` or `"Gold: 10"`.
pub fn parse_counter(concept: &str, text: Option<&str>) -> VerifyResult<u32> {
    let raw = text.ok_or_else(|| VerifyError::malformed(concept, None, "no text rendered"))?;
    let found = INTEGER
        .find(raw)
        .ok_or_else(|| VerifyError::malformed(concept, Some(raw), "no number found"))?;
    plain_digits(concept, raw, found.as_str())?
        .parse()
        .map_err(|_| VerifyError::malformed(concept, Some(raw), "number out of range"))
}

/// A matched number is only trusted as an unsigned, ungrouped run of digits.
fn plain_digits<'t>(concept: &str, raw: &str, number: &'t str) -> VerifyResult<&'t str> {
    if number.starts_with('-') {
        return Err(VerifyError::malformed(concept, Some(raw), "negative value"));
    }
    if number.contains(',') {
        return Err(VerifyError::malformed(concept, Some(raw), "grouped digits"));
    }
    Ok(number)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn parses_progress_readouts() {
        assert_eq!(parse_progress(Some("30% Defect-Free")).unwrap(), 30);
        assert_eq!(parse_progress(Some("Progress: 100 % Defect-Free")).unwrap(), 100);
        assert_eq!(parse_progress(Some("0%")).unwrap(), 0);
    }

    #[test]
    fn unparsable_progress_fails_loudly() {
        for text in [
            Some("Defect-Free"),
            Some(""),
            None,
            Some("250% Defect-Free"),
            Some("-10% Defect-Free"),
            Some("1,000% Defect-Free"),
        ] {
            let err = parse_progress(text).expect_err("should not default to zero");
            assert_eq!(err.kind(), ErrorKind::MalformedState, "{text:?}");
        }
    }

    #[test]
    fn parses_counters_and_rejects_non_numeric() {
        assert_eq!(parse_counter("gold", Some("10")).unwrap(), 10);
        assert_eq!(parse_counter("gold", Some(" Gold: 25 coins")).unwrap(), 25);
        let err = parse_counter("artifacts", Some("none")).expect_err("no digits");
        assert!(err.to_string().contains("artifacts"));
        assert!(parse_counter("days off", None).is_err());

        let err = parse_counter("gold", Some("Gold: -5")).expect_err("negative");
        assert_eq!(err.kind(), ErrorKind::MalformedState);
        assert!(err.to_string().contains("negative value"));
        let err = parse_counter("gold", Some("1,000")).expect_err("grouped");
        assert!(err.to_string().contains("grouped digits"));
    }

    #[test]
    fn bounds_clamp_both_directions() {
        assert_eq!(ValueBounds::PROGRESS.clamp(110), 100);
        assert_eq!(ValueBounds::PROGRESS.clamp(-10), 0);
        assert_eq!(ValueBounds::PROGRESS.clamp(40), 40);
        assert_eq!(ValueBounds::COUNTER.clamp(1_000), 1_000);
        assert_eq!(ValueBounds::COUNTER.clamp(-5), 0);
    }

    #[test]
    fn rewards_lookup_by_kind() {
        let rewards = Rewards {
            gold: 10,
            artifacts: 1,
            days_off: 5,
        };
        assert_eq!(rewards.get(RewardKind::Gold), 10);
        assert_eq!(rewards.get(RewardKind::Artifacts), 1);
        assert_eq!(rewards.get(RewardKind::DaysOff), 5);
        assert_eq!(RewardKind::DaysOff.label(), "days off");
    }
}
