//! Monitoring alert relay.
//!
//! Accepts alert webhooks, posts them to a chat channel and keeps exactly
//! one live message per monitored problem: updates and recoveries delete
//! the previous message and post a fresh one, and resolved alerts are
//! removed from the chat after a delay that survives restarts.
//!
//! - [`alert`] parses webhook texts into [`AlertEvent`]s
//! - [`format`] renders them as chat messages
//! - [`store`] keeps alert id → message id correlation
//! - [`scheduler`] deletes resolved messages later
//! - [`diagnostics`] runs ping/traceroute for diagnostic requests
//! - [`dispatcher`] ties it together behind the [`server`]

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]

pub mod alert;
pub mod config;
pub mod diagnostics;
pub mod dispatcher;
pub mod error;
pub mod format;
pub mod scheduler;
pub mod server;
pub mod store;

#[cfg(test)]
mod test_support;

pub use alert::{AlertEvent, AlertPhase};
pub use config::Config;
pub use dispatcher::{Dispatcher, Outcome};
pub use error::RelayError;
pub use scheduler::{DeletionScheduler, SchedulerHandle};
pub use store::{CorrelationStore, MemoryStore, SqliteStore};
