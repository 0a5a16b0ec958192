//! Chat channel implementations.

pub mod telegram;

use async_trait::async_trait;

use crate::error::ChannelError;
use crate::message::MessageId;

/// A chat destination that can post and remove messages.
#[async_trait]
pub trait MessageChannel: Send + Sync {
    /// Get the name of this channel.
    fn name(&self) -> &'static str;

    /// Post a message and return the identifier the provider assigned to it.
    ///
    /// An identifier is only returned when the provider confirms delivery.
    async fn send(&self, text: &str) -> Result<MessageId, ChannelError>;

    /// Remove a previously posted message.
    async fn delete(&self, message_id: &MessageId) -> Result<(), ChannelError>;
}
