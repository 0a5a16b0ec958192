//! Error types for the alert relay.

use notify::ChannelError;
use thiserror::Error;

use crate::store::StoreError;

/// Errors raised while relaying an alert.
///
/// Only [`RelayError::InvalidFormat`] ever reaches the webhook caller; the
/// dispatcher logs and absorbs everything else.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The webhook envelope doesn't carry a subject and a body
    #[error("Invalid message format: {0}")]
    InvalidFormat(String),

    /// A body line couldn't be read as `Label: value`
    #[error("Malformed alert body at line {line}: {reason}")]
    MalformedBody { line: usize, reason: String },

    /// The chat provider rejected a send or delete
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Reading or writing a correlation record failed
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// The correlation store couldn't be opened at startup
    #[error("Correlation store unavailable: {0}")]
    StoreUnavailable(String),

    /// A diagnostic request named something other than an IPv4 address
    #[error("Invalid diagnostic target: {0:?}")]
    InvalidTarget(String),

    /// Running a diagnostic command failed
    #[error("Diagnostic command failed: {0}")]
    Diagnostic(#[from] std::io::Error),

    /// The deletion scheduler has shut down
    #[error("Deletion scheduler is not running")]
    SchedulerStopped,
}
