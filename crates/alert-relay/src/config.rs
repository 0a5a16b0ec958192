//! Configuration for the relay service.

use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

use notify::channels::telegram::DEFAULT_API_BASE;

use crate::scheduler::MAX_DELAY_SECS;

/// Relay configuration, read from flags or the environment.
#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Telegram bot token.
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub bot_token: String,

    /// Chat that receives alert messages.
    #[arg(long, env = "TELEGRAM_CHAT_ID")]
    pub chat_id: String,

    /// Bot API base URL.
    #[arg(long, env = "TELEGRAM_API_URL", default_value = DEFAULT_API_BASE)]
    pub telegram_api_url: String,

    /// Seconds a resolved alert stays in the chat before it is deleted.
    #[arg(
        long = "delay",
        env = "DELAY",
        default_value_t = 300,
        value_parser = clap::value_parser!(u64).range(..=MAX_DELAY_SECS)
    )]
    pub delay_secs: u64,

    /// SQLite database holding correlation records and pending timers.
    #[arg(long, env = "RELAY_STORE_PATH", default_value = "alert-relay.db")]
    pub store_path: PathBuf,

    /// Refuse to start when the store can't be opened instead of running
    /// without persistence.
    #[arg(long, env = "RELAY_REQUIRE_STORE")]
    pub require_store: bool,

    /// HTTP server port.
    #[arg(long, env = "RELAY_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Seconds a ping or traceroute may run before it is killed.
    #[arg(long, env = "RELAY_DIAGNOSTIC_TIMEOUT", default_value_t = 60)]
    pub diagnostic_timeout_secs: u64,
}

impl Config {
    /// Delay before a resolved alert's message is deleted.
    #[must_use]
    pub const fn deletion_delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }

    /// Time limit for diagnostic commands.
    #[must_use]
    pub const fn diagnostic_timeout(&self) -> Duration {
        Duration::from_secs(self.diagnostic_timeout_secs)
    }
}
