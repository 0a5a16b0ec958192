//! Delayed removal of resolved alerts.
//!
//! Arming a deletion persists the delay under `timer_{eventId}` and queues
//! two jobs on a background loop: the chat message is deleted after the
//! delay, and the correlation record plus its timer are dropped ten seconds
//! later. On startup every persisted timer is queued again with its stored
//! delay, so pending deletions survive a restart (the countdown restarts
//! from the stored value).

use futures::StreamExt;
use notify::{MessageChannel, MessageId};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::time::DelayQueue;
use tracing::{debug, info, warn};

use crate::error::RelayError;
use crate::store::CorrelationStore;

/// Gap between deleting the message and forgetting the alert.
pub const CLEANUP_GRACE: Duration = Duration::from_secs(10);

/// Longest accepted deletion delay, in seconds (30 days).
pub const MAX_DELAY_SECS: u64 = 30 * 24 * 60 * 60;

/// Longest accepted deletion delay. Longer delays are clamped to this.
pub const MAX_DELAY: Duration = Duration::from_secs(MAX_DELAY_SECS);

/// Furthest ahead the timer wheel can hold an entry. `DelayQueue` panics
/// beyond this, so the loop refuses such entries.
const QUEUE_HORIZON: Duration = Duration::from_millis((1 << 36) - 1);

/// Work the scheduler performs when a timer expires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Job {
    /// Remove the resolved alert's chat message
    DeleteMessage {
        event_id: String,
        message_id: MessageId,
    },
    /// Drop the alert's correlation record and timer marker
    ForgetAlert { event_id: String },
}

#[derive(Debug)]
struct Scheduled {
    job: Job,
    delay: Duration,
}

/// Cloneable handle for arming deletions.
#[derive(Clone)]
pub struct SchedulerHandle {
    tx: mpsc::UnboundedSender<Scheduled>,
    store: Arc<dyn CorrelationStore>,
}

impl SchedulerHandle {
    /// Schedule removal of `message_id` after `delay`, and of the alert's
    /// correlation record after `delay` plus [`CLEANUP_GRACE`].
    pub fn arm(
        &self,
        event_id: &str,
        message_id: &MessageId,
        delay: Duration,
    ) -> Result<(), RelayError> {
        let delay = clamp_delay(event_id, delay);

        // Timers still run in this process if the marker can't be written;
        // only restart safety is lost.
        if let Err(e) = self.store.set_delay(event_id, delay.as_secs()) {
            warn!(event_id, error = %e, "Failed to persist deletion timer");
        }

        self.queue_pair(event_id, Some(message_id.clone()), delay)?;

        info!(
            event_id,
            message_id = %message_id,
            delay_secs = delay.as_secs(),
            "Deletion scheduled"
        );
        Ok(())
    }

    /// Queue every persisted timer again. Returns how many were re-armed.
    pub fn rearm_pending(&self) -> Result<usize, RelayError> {
        let pending = self.store.list_delays()?;

        for (event_id, seconds) in &pending {
            let message_id = match self.store.get(event_id) {
                Ok(id) => id,
                Err(e) => {
                    warn!(event_id = %event_id, error = %e, "Failed to read message for pending timer");
                    None
                }
            };

            if message_id.is_none() {
                debug!(event_id = %event_id, "Pending timer has no message, only cleaning up");
            }

            let delay = clamp_delay(event_id, Duration::from_secs(*seconds));
            self.queue_pair(event_id, message_id, delay)?;
        }

        if !pending.is_empty() {
            info!(count = pending.len(), "Re-armed pending deletions");
        }
        Ok(pending.len())
    }

    fn queue_pair(
        &self,
        event_id: &str,
        message_id: Option<MessageId>,
        delay: Duration,
    ) -> Result<(), RelayError> {
        if let Some(message_id) = message_id {
            self.enqueue(
                Job::DeleteMessage {
                    event_id: event_id.to_string(),
                    message_id,
                },
                delay,
            )?;
        }
        self.enqueue(
            Job::ForgetAlert {
                event_id: event_id.to_string(),
            },
            delay + CLEANUP_GRACE,
        )
    }

    fn enqueue(&self, job: Job, delay: Duration) -> Result<(), RelayError> {
        self.tx
            .send(Scheduled { job, delay })
            .map_err(|_| RelayError::SchedulerStopped)
    }
}

/// Background loop that runs jobs as their timers expire.
pub struct DeletionScheduler {
    channel: Arc<dyn MessageChannel>,
    store: Arc<dyn CorrelationStore>,
    rx: mpsc::UnboundedReceiver<Scheduled>,
}

impl DeletionScheduler {
    /// Start the loop on the current runtime.
    ///
    /// The loop exits once every handle is dropped and the queue is empty.
    pub fn spawn(
        channel: Arc<dyn MessageChannel>,
        store: Arc<dyn CorrelationStore>,
    ) -> (SchedulerHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = SchedulerHandle {
            tx,
            store: Arc::clone(&store),
        };
        let scheduler = Self { channel, store, rx };
        (handle, tokio::spawn(scheduler.run()))
    }

    async fn run(mut self) {
        let mut queue: DelayQueue<Job> = DelayQueue::new();
        let mut accepting = true;

        loop {
            tokio::select! {
                scheduled = self.rx.recv(), if accepting => match scheduled {
                    Some(Scheduled { job, delay }) if delay >= QUEUE_HORIZON => {
                        warn!(?job, delay_secs = delay.as_secs(), "Dropping job beyond the timer horizon");
                    }
                    Some(Scheduled { job, delay }) => {
                        debug!(?job, delay_secs = delay.as_secs(), "Job queued");
                        queue.insert(job, delay);
                    }
                    None => accepting = false,
                },
                Some(expired) = queue.next(), if !queue.is_empty() => {
                    let job = expired.into_inner();
                    let channel = Arc::clone(&self.channel);
                    let store = Arc::clone(&self.store);
                    tokio::spawn(execute(channel, store, job));
                }
                else => break,
            }
        }

        debug!("Deletion scheduler stopped");
    }
}

async fn execute(channel: Arc<dyn MessageChannel>, store: Arc<dyn CorrelationStore>, job: Job) {
    match job {
        Job::DeleteMessage {
            event_id,
            message_id,
        } => match channel.delete(&message_id).await {
            Ok(()) => info!(event_id = %event_id, message_id = %message_id, "Resolved message deleted"),
            Err(e) => warn!(
                channel = channel.name(),
                event_id = %event_id,
                message_id = %message_id,
                error = %e,
                "Failed to delete resolved message"
            ),
        },

        Job::ForgetAlert { event_id } => {
            match store.delete(&event_id) {
                Ok(true) => info!(event_id = %event_id, "Correlation record removed"),
                Ok(false) => debug!(event_id = %event_id, "Correlation record already gone"),
                Err(e) => warn!(event_id = %event_id, error = %e, "Failed to remove correlation record"),
            }
            if let Err(e) = store.clear_delay(&event_id) {
                warn!(event_id = %event_id, error = %e, "Failed to clear deletion timer");
            }
        }
    }
}

/// Cap `delay` at [`MAX_DELAY`], logging when it had to be shortened.
fn clamp_delay(event_id: &str, delay: Duration) -> Duration {
    if delay > MAX_DELAY {
        warn!(
            event_id,
            requested_secs = delay.as_secs(),
            max_secs = MAX_DELAY_SECS,
            "Deletion delay too long, clamping"
        );
        MAX_DELAY
    } else {
        delay
    }
}
