//! In-process fakes for unit tests.

use async_trait::async_trait;
use notify::{ChannelError, MessageChannel, MessageId};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;

use crate::diagnostics::CommandRunner;
use crate::error::RelayError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelCall {
    Send(String),
    Delete(MessageId),
}

/// Records every call and hands out sequential message ids starting at 1.
#[derive(Default)]
pub struct FakeChannel {
    next_id: AtomicI64,
    calls: Mutex<Vec<ChannelCall>>,
    fail_sends: AtomicBool,
    fail_deletes: AtomicBool,
}

impl FakeChannel {
    pub fn calls(&self) -> Vec<ChannelCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                ChannelCall::Send(text) => Some(text),
                ChannelCall::Delete(_) => None,
            })
            .collect()
    }

    pub fn fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl MessageChannel for FakeChannel {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn send(&self, text: &str) -> Result<MessageId, ChannelError> {
        self.calls
            .lock()
            .unwrap()
            .push(ChannelCall::Send(text.to_string()));
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(ChannelError::Api {
                status: 500,
                description: "send failed".to_string(),
            });
        }
        Ok(MessageId::from(self.next_id.fetch_add(1, Ordering::SeqCst) + 1))
    }

    async fn delete(&self, message_id: &MessageId) -> Result<(), ChannelError> {
        self.calls
            .lock()
            .unwrap()
            .push(ChannelCall::Delete(message_id.clone()));
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(ChannelError::Api {
                status: 400,
                description: "message to delete not found".to_string(),
            });
        }
        Ok(())
    }
}

/// Records invocations instead of spawning processes.
#[derive(Default)]
pub struct FakeRunner {
    invocations: Mutex<Vec<(String, Vec<String>)>>,
}

impl FakeRunner {
    pub fn invocations(&self) -> Vec<(String, Vec<String>)> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for FakeRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<String, RelayError> {
        self.invocations
            .lock()
            .unwrap()
            .push((program.to_string(), args.to_vec()));
        Ok(format!("{program} output"))
    }
}
