//! Correlation store: which chat message currently represents which alert.
//!
//! Two key families live in one flat key-value namespace:
//!
//! - `message_{eventId}` → channel message id
//! - `timer_{eventId}` → seconds until the resolved message is removed
//!
//! Every removal is delete-if-exists, so replaying a cleanup is harmless.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use notify::MessageId;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::error::RelayError;

const MESSAGE_PREFIX: &str = "message_";
const TIMER_PREFIX: &str = "timer_";

/// Errors from the correlation store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Filesystem error while preparing the database location
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Raw string key-value operations a backend provides.
pub trait KeyValueBackend: Send + Sync {
    /// Read a value.
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Insert or overwrite a value.
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a key, returning whether it existed.
    fn remove(&self, key: &str) -> Result<bool, StoreError>;

    /// All entries whose key starts with `prefix`, ordered by key.
    fn scan_prefix(&self, prefix: &str) -> Result<Vec<(String, String)>, StoreError>;
}

/// Durable alert id → message id mapping plus pending deletion delays.
pub trait CorrelationStore: Send + Sync {
    /// Message currently shown for an alert.
    fn get(&self, event_id: &str) -> Result<Option<MessageId>, StoreError>;

    /// Record the message now shown for an alert.
    fn set(&self, event_id: &str, message_id: &MessageId) -> Result<(), StoreError>;

    /// Forget an alert's message, returning whether a record existed.
    fn delete(&self, event_id: &str) -> Result<bool, StoreError>;

    /// Persist the deletion delay armed for an alert.
    fn set_delay(&self, event_id: &str, seconds: u64) -> Result<(), StoreError>;

    /// Deletion delay armed for an alert, if any.
    fn get_delay(&self, event_id: &str) -> Result<Option<u64>, StoreError>;

    /// Remove an alert's deletion delay, returning whether one existed.
    fn clear_delay(&self, event_id: &str) -> Result<bool, StoreError>;

    /// Every armed deletion delay as `(event_id, seconds)`.
    fn list_delays(&self) -> Result<Vec<(String, u64)>, StoreError>;
}

fn message_key(event_id: &str) -> String {
    format!("{MESSAGE_PREFIX}{event_id}")
}

fn timer_key(event_id: &str) -> String {
    format!("{TIMER_PREFIX}{event_id}")
}

impl<T: KeyValueBackend> CorrelationStore for T {
    fn get(&self, event_id: &str) -> Result<Option<MessageId>, StoreError> {
        Ok(self.read(&message_key(event_id))?.map(MessageId::from))
    }

    fn set(&self, event_id: &str, message_id: &MessageId) -> Result<(), StoreError> {
        self.write(&message_key(event_id), message_id.as_str())
    }

    fn delete(&self, event_id: &str) -> Result<bool, StoreError> {
        self.remove(&message_key(event_id))
    }

    fn set_delay(&self, event_id: &str, seconds: u64) -> Result<(), StoreError> {
        self.write(&timer_key(event_id), &seconds.to_string())
    }

    fn get_delay(&self, event_id: &str) -> Result<Option<u64>, StoreError> {
        Ok(self
            .read(&timer_key(event_id))?
            .and_then(|value| value.parse().ok()))
    }

    fn clear_delay(&self, event_id: &str) -> Result<bool, StoreError> {
        self.remove(&timer_key(event_id))
    }

    fn list_delays(&self) -> Result<Vec<(String, u64)>, StoreError> {
        let mut delays = Vec::new();
        for (key, value) in self.scan_prefix(TIMER_PREFIX)? {
            let event_id = &key[TIMER_PREFIX.len()..];
            match value.parse() {
                Ok(seconds) => delays.push((event_id.to_string(), seconds)),
                Err(_) => warn!(key = %key, value = %value, "Ignoring unreadable timer entry"),
            }
        }
        Ok(delays)
    }
}

/// Open the SQLite store at `path`.
///
/// When the database can't be opened the relay either refuses to start
/// (`require` set) or falls back to an in-memory store that loses all
/// correlation on restart.
pub fn open_store(
    path: impl AsRef<Path>,
    require: bool,
) -> Result<Arc<dyn CorrelationStore>, RelayError> {
    let path = path.as_ref();
    match SqliteStore::open(path) {
        Ok(store) => {
            info!(path = %path.display(), "Correlation store opened");
            Ok(Arc::new(store))
        }
        Err(e) if require => Err(RelayError::StoreUnavailable(format!(
            "{}: {e}",
            path.display()
        ))),
        Err(e) => {
            error!(
                path = %path.display(),
                error = %e,
                "Correlation store unavailable, continuing with in-memory state"
            );
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
