use std::time::Duration;
use thiserror::Error;

pub type VerifyResult<T> = Result<T, VerifyError>;

/// Every way a scenario step can end early. None of these are retried above
/// the poller; the scenario that raised one is over.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// Unregistered or malformed locator concept.
    #[error("locator configuration error on {screen} screen: {message}")]
    Configuration { screen: String, message: String },

    /// Rendered text could not be read as the expected state shape.
    #[error("malformed state for {concept}: {message} (observed {observed:?})")]
    MalformedState {
        concept: String,
        observed: Option<String>,
        message: String,
    },

    #[error(
        "timed out after {waited:?} ({samples} samples) waiting for {expected}; last observed: {last_observed}"
    )]
    Timeout {
        expected: String,
        last_observed: String,
        waited: Duration,
        samples: u32,
    },

    #[error("assertion failed: {message}")]
    Assertion { message: String },

    #[error("aborted while waiting for {expected}")]
    Aborted { expected: String },

    /// The document collaborator itself failed (transport, stale handle, ...).
    #[error("driver error: {0}")]
    Driver(String),
}

/// Coarse classification used by reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    MalformedState,
    Timeout,
    Assertion,
    Aborted,
    Driver,
}

impl VerifyError {
    pub fn configuration(screen: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            screen: screen.into(),
            message: message.into(),
        }
    }

    pub fn malformed(
        concept: impl Into<String>,
        observed: Option<&str>,
        message: impl Into<String>,
    ) -> Self {
        Self::MalformedState {
            concept: concept.into(),
            observed: observed.map(str::to_string),
            message: message.into(),
        }
    }

    pub fn assertion(message: impl Into<String>) -> Self {
        Self::Assertion {
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration { .. } => ErrorKind::Configuration,
            Self::MalformedState { .. } => ErrorKind::MalformedState,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::Assertion { .. } => ErrorKind::Assertion,
            Self::Aborted { .. } => ErrorKind::Aborted,
            Self::Driver(_) => ErrorKind::Driver,
        }
    }

    /// True when the application under test misbehaved, as opposed to the
    /// harness, its configuration or its driver.
    #[must_use]
    pub const fn is_verification_failure(&self) -> bool {
        matches!(self.kind(), ErrorKind::Timeout | ErrorKind::Assertion)
    }
}

impl From<thirtyfour::error::WebDriverError> for VerifyError {
    fn from(err: thirtyfour::error::WebDriverError) -> Self {
        Self::Driver(err.to_string())
    }
}

/// `anyhow::ensure!`-style direct assertion producing [`VerifyError::Assertion`].
#[macro_export]
macro_rules! verify {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::error::VerifyError::assertion(format!($($arg)+)));
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_positive(n: i32) -> VerifyResult<i32> {
        verify!(n > 0, "expected positive, got {n}");
        Ok(n)
    }

    #[test]
    fn verify_macro_produces_assertion_errors() {
        assert_eq!(check_positive(3).expect("positive"), 3);
        let err = check_positive(-1).expect_err("negative should fail");
        assert_eq!(err.kind(), ErrorKind::Assertion);
        assert!(err.to_string().contains("expected positive, got -1"));
    }

    #[test]
    fn timeout_message_carries_expectation_and_last_value() {
        let err = VerifyError::Timeout {
            expected: "progress to reach 40".to_string(),
            last_observed: "30".to_string(),
            waited: Duration::from_secs(10),
            samples: 34,
        };
        let text = err.to_string();
        assert!(text.contains("progress to reach 40"));
        assert!(text.contains("last observed: 30"));
        assert!(err.is_verification_failure());
    }

    #[test]
    fn configuration_and_malformed_are_not_verification_failures() {
        assert!(!VerifyError::configuration("quest", "unknown concept").is_verification_failure());
        let err = VerifyError::malformed("gold", Some("lots"), "no digits");
        assert_eq!(err.kind(), ErrorKind::MalformedState);
        assert!(err.to_string().contains("\"lots\""));
    }
}
