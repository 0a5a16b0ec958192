//! Error types for the chat channel client.

use thiserror::Error;

/// Errors that can occur when talking to a chat channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Channel is not configured
    #[error("Channel not configured: {0}")]
    NotConfigured(String),

    /// Rate limited by the service
    #[error("Rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// The provider answered but reported a failure
    #[error("Provider returned {status}: {description}")]
    Api { status: u16, description: String },

    /// The provider reported success without a message identifier
    #[error("Provider response did not include a message id")]
    MissingMessageId,
}
