//! Chat channel client for the alert relay.
//!
//! This crate posts formatted alert messages to a chat service and removes
//! them again later. Unlike fire-and-forget webhooks, every successful send
//! yields a [`MessageId`] so the caller can replace or delete the message
//! when the alert changes.
//!
//! # Usage
//!
//! ```no_run
//! use notify::{MessageChannel, TelegramChannel};
//!
//! # async fn run() -> Result<(), notify::ChannelError> {
//! let channel = TelegramChannel::new("123:abc", "-100123456")?;
//! let id = channel.send("<b>disk full</b> on db-1").await?;
//! channel.delete(&id).await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - [`MessageChannel`] trait defines send/delete for a chat destination
//! - [`TelegramChannel`] implements it on top of the Telegram Bot API

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod channels;
pub mod error;
pub mod message;

pub use channels::telegram::TelegramChannel;
pub use channels::MessageChannel;
pub use error::ChannelError;
pub use message::MessageId;
