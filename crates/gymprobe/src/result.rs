//! Result and error types for Gymprobe.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type for Gymprobe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Errors that can occur while driving the application under test
#[derive(Debug, Error)]
pub enum ProbeError {
    /// An awaited UI condition did not hold within its bound
    #[error("Timed out after {timeout_ms}ms waiting for {condition}")]
    WaitTimeout {
        /// Description of the awaited condition
        condition: String,
        /// Bound that elapsed
        timeout_ms: u64,
    },

    /// The element exists but rejected a direct operation
    #[error("{target} rejected interaction: {reason}")]
    InteractionRejected {
        /// Element description
        target: String,
        /// Reason reported by the driver
        reason: String,
    },

    /// An observed outcome did not match the expected one
    #[error("Assertion failed: expected {expected}, got {actual}")]
    AssertionFailed {
        /// Expected outcome
        expected: String,
        /// Observed outcome
        actual: String,
    },

    /// The browser session could not be created, navigated or authenticated
    #[error("Session bootstrap failed: {message}")]
    SessionBootstrap {
        /// Error message
        message: String,
    },

    /// An element collection was indexed past its end
    #[error("{target} has {found} match(es), index {index} is out of range")]
    ElementIndexOutOfRange {
        /// Element description
        target: String,
        /// Requested index
        index: usize,
        /// Number of matches at lookup time
        found: usize,
    },

    /// A page registry has no locator under the requested name
    #[error("Page '{page}' has no locator named '{name}'")]
    UnknownLocator {
        /// Page name
        page: String,
        /// Element name
        name: String,
    },

    /// A locator value is not valid for its strategy
    #[error("Invalid {strategy} locator '{value}': {reason}")]
    InvalidLocator {
        /// Strategy name
        strategy: String,
        /// Offending value
        value: String,
        /// Why it was rejected
        reason: String,
    },

    /// Harness configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Low-level driver failure (protocol error, unexpected alert, closed session)
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Coarse failure classification used in scenario reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A wait condition timed out
    WaitTimeout,
    /// An element rejected an interaction
    InteractionRejected,
    /// An assertion on an outcome failed
    Assertion,
    /// The session never became usable
    SessionBootstrap,
    /// Anything else: driver, configuration, I/O
    Infrastructure,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::WaitTimeout => "wait timeout",
            Self::InteractionRejected => "interaction rejected",
            Self::Assertion => "assertion",
            Self::SessionBootstrap => "session bootstrap",
            Self::Infrastructure => "infrastructure",
        };
        f.write_str(label)
    }
}

impl ProbeError {
    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a session bootstrap error
    #[must_use]
    pub fn bootstrap(message: impl Into<String>) -> Self {
        Self::SessionBootstrap {
            message: message.into(),
        }
    }

    /// Create an assertion failure naming expected vs. actual
    #[must_use]
    pub fn assertion(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::AssertionFailed {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Classify the error for reporting
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::WaitTimeout { .. } => FailureKind::WaitTimeout,
            Self::InteractionRejected { .. } => FailureKind::InteractionRejected,
            Self::AssertionFailed { .. } => FailureKind::Assertion,
            Self::SessionBootstrap { .. } => FailureKind::SessionBootstrap,
            Self::ElementIndexOutOfRange { .. }
            | Self::UnknownLocator { .. }
            | Self::InvalidLocator { .. }
            | Self::Config { .. }
            | Self::Driver { .. }
            | Self::Io(_)
            | Self::Yaml(_)
            | Self::Json(_) => FailureKind::Infrastructure,
        }
    }

    /// Whether this is a wait timeout
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::WaitTimeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_message_names_condition() {
        let err = ProbeError::WaitTimeout {
            condition: "element css=.search-box input to be visible".to_string(),
            timeout_ms: 10_000,
        };
        let msg = err.to_string();
        assert!(msg.contains("10000ms"));
        assert!(msg.contains(".search-box input"));
        assert!(err.is_timeout());
    }

    #[test]
    fn test_assertion_message_names_expected_and_actual() {
        let err = ProbeError::assertion("alert containing 'registered'", "no alert");
        assert_eq!(
            err.to_string(),
            "Assertion failed: expected alert containing 'registered', got no alert"
        );
        assert_eq!(err.kind(), FailureKind::Assertion);
    }

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            ProbeError::bootstrap("no chromium").kind(),
            FailureKind::SessionBootstrap
        );
        assert_eq!(
            ProbeError::driver("socket closed").kind(),
            FailureKind::Infrastructure
        );
        let rejected = ProbeError::InteractionRejected {
            target: "description".to_string(),
            reason: "not editable".to_string(),
        };
        assert_eq!(rejected.kind(), FailureKind::InteractionRejected);
        let index = ProbeError::ElementIndexOutOfRange {
            target: "schedule buttons".to_string(),
            index: 0,
            found: 0,
        };
        assert_eq!(index.kind(), FailureKind::Infrastructure);
        assert!(index.to_string().contains("0 match(es)"));
    }

    #[test]
    fn test_failure_kind_display() {
        assert_eq!(FailureKind::WaitTimeout.to_string(), "wait timeout");
        assert_eq!(FailureKind::Assertion.to_string(), "assertion");
    }

    #[test]
    fn test_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: ProbeError = io.into();
        assert!(matches!(err, ProbeError::Io(_)));
    }
}
