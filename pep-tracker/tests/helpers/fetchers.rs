//! Fake spreadsheet sources

use async_trait::async_trait;
use pep_tracker::services::fetch::SpreadsheetFetcher;
use pep_tracker::FetchError;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::Notify;

/// Always returns the same bytes
pub struct StaticFetcher(pub Vec<u8>);

#[async_trait]
impl SpreadsheetFetcher for StaticFetcher {
    async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        Ok(self.0.clone())
    }

    fn describe(&self) -> String {
        "static".to_string()
    }
}

/// Returns queued results in order, then fails
pub struct ScriptedFetcher {
    script: Mutex<VecDeque<Result<Vec<u8>, FetchError>>>,
}

impl ScriptedFetcher {
    pub fn new(script: Vec<Result<Vec<u8>, FetchError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
        }
    }
}

#[async_trait]
impl SpreadsheetFetcher for ScriptedFetcher {
    async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(FetchError::Network("script exhausted".to_string())))
    }

    fn describe(&self) -> String {
        "scripted".to_string()
    }
}

/// Holds every fetch until `release` is called
///
/// Payloads are served in order; the last one repeats.
pub struct GatedFetcher {
    payloads: Mutex<VecDeque<Vec<u8>>>,
    gate: Notify,
}

impl GatedFetcher {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self::sequence(vec![bytes])
    }

    pub fn sequence(payloads: Vec<Vec<u8>>) -> Self {
        Self {
            payloads: Mutex::new(payloads.into()),
            gate: Notify::new(),
        }
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl SpreadsheetFetcher for GatedFetcher {
    async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        self.gate.notified().await;
        let mut payloads = self.payloads.lock().unwrap();
        let bytes = if payloads.len() > 1 {
            payloads.pop_front()
        } else {
            payloads.front().cloned()
        };
        bytes.ok_or_else(|| FetchError::Network("no payload".to_string()))
    }

    fn describe(&self) -> String {
        "gated".to_string()
    }
}

/// Never completes
pub struct NeverFetcher;

#[async_trait]
impl SpreadsheetFetcher for NeverFetcher {
    async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        std::future::pending().await
    }

    fn describe(&self) -> String {
        "never".to_string()
    }
}
