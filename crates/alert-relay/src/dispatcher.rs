//! Webhook dispatch: one alert in, at most one live chat message out.
//!
//! Every phase of the same event id runs under a per-id lock, so the
//! lookup → delete old → send new → record sequence can't interleave with
//! another webhook for that alert. Different alerts proceed concurrently.

use notify::{MessageChannel, MessageId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{debug, error, info, warn};

use crate::alert::{classify, split_envelope, AlertEvent, AlertPhase, SubjectKind};
use crate::diagnostics::{extract_target, CommandRunner, DiagnosticKind};
use crate::error::RelayError;
use crate::format::{render, render_diagnostic};
use crate::scheduler::SchedulerHandle;
use crate::store::CorrelationStore;

/// What happened to an accepted webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The alert's message was posted
    Sent(MessageId),
    /// No open alert to update
    Skipped,
    /// Processing failed and was logged
    Dropped,
    /// The subject matched no known request
    Ignored,
    /// Diagnostic output was posted
    Diagnostic(MessageId),
}

/// Routes webhook texts through parsing, formatting, the channel, the
/// store and the deletion scheduler.
pub struct Dispatcher {
    channel: Arc<dyn MessageChannel>,
    store: Arc<dyn CorrelationStore>,
    scheduler: SchedulerHandle,
    runner: Arc<dyn CommandRunner>,
    deletion_delay: Duration,
    locks: KeyedLocks,
}

impl Dispatcher {
    pub fn new(
        channel: Arc<dyn MessageChannel>,
        store: Arc<dyn CorrelationStore>,
        scheduler: SchedulerHandle,
        runner: Arc<dyn CommandRunner>,
        deletion_delay: Duration,
    ) -> Self {
        Self {
            channel,
            store,
            scheduler,
            runner,
            deletion_delay,
            locks: KeyedLocks::default(),
        }
    }

    /// Handle one webhook text.
    ///
    /// Only an envelope without a body is an error; every other failure is
    /// logged and reported as [`Outcome::Dropped`] so the monitoring system
    /// never retries because of a downstream problem.
    pub async fn dispatch(&self, text: &str) -> Result<Outcome, RelayError> {
        let (subject, body) = split_envelope(text)?;

        let result = match classify(subject) {
            SubjectKind::Alert(phase) => self.handle_alert(phase, body).await,
            SubjectKind::Diagnostic(kind) => self.handle_diagnostic(kind, body).await,
            SubjectKind::Unknown => {
                warn!(subject = %subject, "Ignoring webhook with unrecognised subject");
                Ok(Outcome::Ignored)
            }
        };

        Ok(result.unwrap_or_else(|e| {
            error!(subject = %subject, error = %e, "Failed to relay alert");
            Outcome::Dropped
        }))
    }

    async fn handle_alert(&self, phase: AlertPhase, body: &str) -> Result<Outcome, RelayError> {
        let event = AlertEvent::parse(body, phase)?;
        let event_id = event.event_id();
        let _guard = self.locks.lock(event_id).await;

        info!(event_id = %event_id, phase = %phase, "Processing alert");

        let previous = self.store.get(event_id)?;
        if phase != AlertPhase::New && previous.is_none() {
            warn!(
                event_id = %event_id,
                phase = %phase,
                "No message found for event, skipping"
            );
            return Ok(Outcome::Skipped);
        }

        let message_id = self.replace(event_id, previous, &render(&event)).await?;

        if phase == AlertPhase::Recovered {
            self.scheduler
                .arm(event_id, &message_id, self.deletion_delay)?;
        }

        Ok(Outcome::Sent(message_id))
    }

    /// Delete the alert's current message (if any), post `text` and record
    /// the new message id.
    async fn replace(
        &self,
        event_id: &str,
        previous: Option<MessageId>,
        text: &str,
    ) -> Result<MessageId, RelayError> {
        if let Some(previous) = &previous {
            debug!(event_id = %event_id, message_id = %previous, "Deleting previous message");
            if let Err(e) = self.channel.delete(previous).await {
                warn!(
                    channel = self.channel.name(),
                    event_id = %event_id,
                    message_id = %previous,
                    error = %e,
                    "Failed to delete previous message"
                );
            }
        }

        let message_id = match self.channel.send(text).await {
            Ok(id) => id,
            Err(e) => {
                // The old message is gone; keep no record pointing at it.
                if previous.is_some() {
                    self.store.delete(event_id)?;
                }
                return Err(e.into());
            }
        };

        self.store.set(event_id, &message_id)?;
        info!(
            channel = self.channel.name(),
            event_id = %event_id,
            message_id = %message_id,
            "Alert message posted"
        );
        Ok(message_id)
    }

    async fn handle_diagnostic(
        &self,
        kind: DiagnosticKind,
        body: &str,
    ) -> Result<Outcome, RelayError> {
        let target = extract_target(body)?;

        info!(command = %kind, target = %target, "Running diagnostic");

        let output = self.runner.run(kind.program(), &kind.args(target)).await?;
        let message_id = self
            .channel
            .send(&render_diagnostic(kind, target, &output))
            .await?;

        Ok(Outcome::Diagnostic(message_id))
    }
}

/// Async mutexes keyed by event id, pruned once nobody holds or awaits them.
#[derive(Default)]
struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl KeyedLocks {
    async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.retain(|_, m| Arc::strong_count(m) > 1);
            Arc::clone(locks.entry(key.to_string()).or_default())
        };
        mutex.lock_owned().await
    }
}
