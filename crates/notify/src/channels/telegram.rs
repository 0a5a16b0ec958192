//! Telegram Bot API channel.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::ChannelError;
use crate::message::MessageId;
use crate::MessageChannel;

/// Public Bot API endpoint.
pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Default per-request timeout.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Telegram chat channel bound to a single chat.
pub struct TelegramChannel {
    api_base: String,
    bot_token: String,
    chat_id: String,
    client: reqwest::Client,
}

impl TelegramChannel {
    /// Create a channel for `chat_id` using the public Bot API.
    pub fn new(
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Result<Self, ChannelError> {
        Self::with_api_base(DEFAULT_API_BASE, bot_token, chat_id)
    }

    /// Create a channel that talks to a specific Bot API server.
    pub fn with_api_base(
        api_base: impl Into<String>,
        bot_token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Result<Self, ChannelError> {
        let bot_token = bot_token.into();
        let chat_id = chat_id.into();

        if bot_token.trim().is_empty() {
            return Err(ChannelError::NotConfigured("TELEGRAM_BOT_TOKEN".to_string()));
        }
        if chat_id.trim().is_empty() {
            return Err(ChannelError::NotConfigured("TELEGRAM_CHAT_ID".to_string()));
        }

        let client = reqwest::Client::builder().timeout(DEFAULT_TIMEOUT).build()?;

        Ok(Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            bot_token,
            chat_id,
            client,
        })
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_base, self.bot_token)
    }

    /// POST a Bot API method and decode the `{ok, result, description}` envelope.
    async fn call<B, T>(&self, method: &str, body: &B) -> Result<Option<T>, ChannelError>
    where
        B: Serialize + Sync,
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(self.method_url(method))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let retry_after_header = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let text = response.text().await.unwrap_or_default();
        let envelope: Option<ApiResponse<T>> = serde_json::from_str(&text).ok();

        if status.as_u16() == 429 {
            let retry_after = envelope
                .as_ref()
                .and_then(|e| e.parameters.as_ref())
                .and_then(|p| p.retry_after)
                .or(retry_after_header)
                .unwrap_or(5);

            warn!(
                channel = self.name(),
                method,
                retry_after_secs = retry_after,
                "Rate limited by Telegram"
            );

            return Err(ChannelError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        match envelope {
            Some(envelope) if status.is_success() && envelope.ok => Ok(envelope.result),
            Some(envelope) => {
                let description = envelope.description.unwrap_or_else(|| text.clone());
                warn!(
                    channel = self.name(),
                    method,
                    status = %status,
                    description = %description,
                    "Telegram request failed"
                );
                Err(ChannelError::Api {
                    status: status.as_u16(),
                    description,
                })
            }
            None => {
                warn!(
                    channel = self.name(),
                    method,
                    status = %status,
                    body = %text,
                    "Unexpected Telegram response"
                );
                Err(ChannelError::Api {
                    status: status.as_u16(),
                    description: text,
                })
            }
        }
    }
}

#[async_trait]
impl MessageChannel for TelegramChannel {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn send(&self, text: &str) -> Result<MessageId, ChannelError> {
        let request = SendMessageRequest {
            chat_id: &self.chat_id,
            text,
            parse_mode: "HTML",
        };

        debug!(channel = self.name(), length = text.len(), "Sending message");

        let sent: Option<SentMessage> = self.call("sendMessage", &request).await?;
        let message_id = sent
            .map(|m| MessageId::from(m.message_id))
            .ok_or(ChannelError::MissingMessageId)?;

        debug!(channel = self.name(), message_id = %message_id, "Message sent");
        Ok(message_id)
    }

    async fn delete(&self, message_id: &MessageId) -> Result<(), ChannelError> {
        let request = DeleteMessageRequest {
            chat_id: &self.chat_id,
            message_id: message_id
                .as_i64()
                .map_or_else(|| Value::from(message_id.as_str()), Value::from),
        };

        let _: Option<Value> = self.call("deleteMessage", &request).await?;

        debug!(channel = self.name(), message_id = %message_id, "Message deleted");
        Ok(())
    }
}

// =============================================================================
// Telegram API types
// =============================================================================

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

#[derive(Debug, Serialize)]
struct DeleteMessageRequest<'a> {
    chat_id: &'a str,
    message_id: Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
    parameters: Option<ResponseParameters>,
}

#[derive(Debug, Deserialize)]
struct ResponseParameters {
    retry_after: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}
