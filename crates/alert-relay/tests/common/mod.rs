//! Shared helpers for relay integration tests.

#![allow(dead_code)]

use alert_relay::diagnostics::CommandRunner;
use alert_relay::server::{build_router, AppState};
use alert_relay::{DeletionScheduler, Dispatcher, MemoryStore, RelayError};
use async_trait::async_trait;
use notify::{ChannelError, MessageChannel, MessageId};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// Calls observed by [`RecordingChannel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Send(String),
    Delete(String),
}

/// Chat channel double that records calls and numbers messages from 1.
#[derive(Default)]
pub struct RecordingChannel {
    next_id: AtomicI64,
    calls: Mutex<Vec<Call>>,
}

impl RecordingChannel {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageChannel for RecordingChannel {
    fn name(&self) -> &'static str {
        "recording"
    }

    async fn send(&self, text: &str) -> Result<MessageId, ChannelError> {
        self.calls.lock().unwrap().push(Call::Send(text.to_string()));
        Ok(MessageId::from(self.next_id.fetch_add(1, Ordering::SeqCst) + 1))
    }

    async fn delete(&self, message_id: &MessageId) -> Result<(), ChannelError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Delete(message_id.to_string()));
        Ok(())
    }
}

/// Command runner double that never spawns a process.
#[derive(Default)]
pub struct RecordingRunner {
    pub invocations: Mutex<Vec<Vec<String>>>,
}

#[async_trait]
impl CommandRunner for RecordingRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<String, RelayError> {
        let mut argv = vec![program.to_string()];
        argv.extend_from_slice(args);
        self.invocations.lock().unwrap().push(argv);
        Ok("4 packets transmitted, 4 received".to_string())
    }
}

/// A relay running on a random local port with in-memory collaborators.
pub struct TestRelay {
    pub addr: SocketAddr,
    pub channel: Arc<RecordingChannel>,
    pub store: Arc<MemoryStore>,
    pub runner: Arc<RecordingRunner>,
    pub client: reqwest::Client,
}

impl TestRelay {
    pub async fn start() -> Self {
        let channel = Arc::new(RecordingChannel::default());
        let store = Arc::new(MemoryStore::new());
        let runner = Arc::new(RecordingRunner::default());

        let (scheduler, _task) = DeletionScheduler::spawn(channel.clone(), store.clone());
        let dispatcher = Dispatcher::new(
            channel.clone(),
            store.clone(),
            scheduler,
            runner.clone(),
            Duration::from_secs(300),
        );
        let app = build_router(AppState {
            dispatcher: Arc::new(dispatcher),
        });

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Start server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            channel,
            store,
            runner,
            client: reqwest::Client::new(),
        }
    }

    pub async fn post_raw(&self, body: String) -> (u16, serde_json::Value) {
        let response = self
            .client
            .post(format!("http://{}/notify", self.addr))
            .header("content-type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Failed to send request");
        let status = response.status().as_u16();
        let json = response.json().await.expect("Response is not JSON");
        (status, json)
    }

    pub async fn post_text(&self, text: &str) -> (u16, serde_json::Value) {
        self.post_raw(serde_json::json!({ "monitorJSON": { "text": text } }).to_string())
            .await
    }
}

pub fn problem(event_id: &str) -> String {
    format!(
        "Problem: Disk full\nTrigger: Disk full\r\nHost: db-1\r\nIP: 10.0.0.5\r\n\
         Severity: Disaster\r\nTime: 2024.05.01 12:00\r\nValue: 99 %\r\nEvent ID: {event_id}"
    )
}

pub fn update(event_id: &str) -> String {
    format!(
        "Update: Disk full\nUser: bob\r\nAction: commented\r\nMessage: cleaning /var\r\n\
         IP: 10.0.0.5\r\nSeverity: Disaster\r\nTime: 12:10\r\nValue: 97 %\r\nAge: 10m\r\n\
         Event ID: {event_id}"
    )
}

pub fn recovery(event_id: &str) -> String {
    format!(
        "Recovery: Disk full\nTrigger: Disk full\r\nHost: db-1\r\nIP: 10.0.0.5\r\n\
         Recovery time: 12:30\r\nAge: 30m\r\nEvent ID: {event_id}"
    )
}
