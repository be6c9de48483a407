//! In-memory fakes of the delivery ports for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use sensorlink_domain::{CachedEntry, Result, SensorLinkError};

use super::ports::{CredentialProvider, OfflineQueue, Transport, TransportOutcome};

/// One recorded `Transport::post` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostCall {
    pub endpoint: String,
    pub body: String,
    pub token: String,
}

/// Transport that replays scripted outcomes in order, then falls back to a
/// default outcome.
pub struct ScriptedTransport {
    script: Mutex<VecDeque<TransportOutcome>>,
    fallback: TransportOutcome,
    calls: Mutex<Vec<PostCall>>,
}

impl ScriptedTransport {
    pub fn always(outcome: TransportOutcome) -> Self {
        Self { script: Mutex::new(VecDeque::new()), fallback: outcome, calls: Mutex::default() }
    }

    pub fn offline() -> Self {
        Self::always(TransportOutcome::connectivity_failure("network unreachable"))
    }

    pub fn then(self, outcome: TransportOutcome) -> Self {
        self.script.lock().unwrap().push_back(outcome);
        self
    }

    pub fn calls(&self) -> Vec<PostCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post(&self, endpoint: &str, body: &str, token: &str) -> TransportOutcome {
        self.calls.lock().unwrap().push(PostCall {
            endpoint: endpoint.to_string(),
            body: body.to_string(),
            token: token.to_string(),
        });
        self.script.lock().unwrap().pop_front().unwrap_or_else(|| self.fallback.clone())
    }
}

/// Token source whose value can be rotated between calls.
pub struct FixedToken(Mutex<String>);

impl FixedToken {
    pub fn new(token: &str) -> Self {
        Self(Mutex::new(token.to_string()))
    }

    pub fn rotate(&self, token: &str) {
        *self.0.lock().unwrap() = token.to_string();
    }
}

#[async_trait]
impl CredentialProvider for FixedToken {
    async fn current_token(&self) -> Result<String> {
        Ok(self.0.lock().unwrap().clone())
    }
}

/// Vec-backed queue; `broken` simulates an unavailable store.
#[derive(Default)]
pub struct MemoryQueue {
    entries: Mutex<Vec<CachedEntry>>,
    next_id: Mutex<i64>,
    broken: bool,
}

impl MemoryQueue {
    pub fn broken() -> Self {
        Self { broken: true, ..Self::default() }
    }

    pub fn snapshot(&self) -> Vec<CachedEntry> {
        self.entries.lock().unwrap().clone()
    }

    fn check(&self) -> Result<()> {
        if self.broken {
            return Err(SensorLinkError::Storage("disk I/O error".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl OfflineQueue for MemoryQueue {
    async fn enqueue(&self, endpoint: &str, body: &str, token: &str) -> Result<CachedEntry> {
        self.check()?;
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let entry = CachedEntry {
            id: *next_id,
            endpoint: endpoint.to_string(),
            body: body.to_string(),
            token: token.to_string(),
            enqueued_at: *next_id * 1_000,
        };
        self.entries.lock().unwrap().push(entry.clone());
        Ok(entry)
    }

    async fn list_after(&self, after_id: i64, limit: usize) -> Result<Vec<CachedEntry>> {
        self.check()?;
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|entry| entry.id > after_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn acknowledge(&self, id: i64) -> Result<bool> {
        self.check()?;
        let mut entries = self.entries.lock().unwrap();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        Ok(entries.len() != before)
    }

    async fn len(&self) -> Result<usize> {
        self.check()?;
        Ok(self.entries.lock().unwrap().len())
    }
}
