//! Error taxonomy for the monitor
//!
//! Every failure the loop can observe is an explicit variant. Only
//! `ConfigInvalid` and `InsufficientPrivilege` stop the process; the other
//! two are logged and retried on the next tick.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MonitorError {
    /// Ordering or format violation in thresholds, glyphs, colors, etc.
    #[error("invalid configuration: {0}")]
    ConfigInvalid(String),

    /// The stats source could not be read or lacked required fields
    #[error("memory stats unavailable: {0}")]
    StatsUnavailable(String),

    /// An action (swap toggle, operator warning) did not complete
    #[error("action failed: {0}")]
    ActionFailed(String),

    /// The process cannot perform the destructive actions it was asked to
    #[error("insufficient privilege: {0}")]
    InsufficientPrivilege(String),
}

impl MonitorError {
    /// Whether the loop should carry on to the next tick after this error
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            MonitorError::StatsUnavailable(_) | MonitorError::ActionFailed(_)
        )
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        MonitorError::ConfigInvalid(message.into())
    }

    pub(crate) fn stats(message: impl Into<String>) -> Self {
        MonitorError::StatsUnavailable(message.into())
    }

    pub(crate) fn action(message: impl Into<String>) -> Self {
        MonitorError::ActionFailed(message.into())
    }
}

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, MonitorError>;
