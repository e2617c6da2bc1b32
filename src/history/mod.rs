//! Report-history bridge.
//!
//! Every successfully rendered job leaves a [`ReportSnapshot`] behind so the document can be
//! downloaded again later. Snapshots are queued through [`HistorySender`] and written by a
//! background worker; nothing on this path can fail a render.

pub mod worker;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;
use utoipa::ToSchema;

pub use worker::start_history_worker;

const HISTORY_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReportSnapshot {
    #[serde(rename = "type")]
    pub document_type: String,
    pub title: String,
    /// Exact fields the document was rendered from, validity dates included.
    pub data: Value,
}

#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("report history request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("report history rejected snapshot with status {0}")]
    Status(u16),
}

#[async_trait]
pub trait ReportHistory: Send + Sync {
    async fn save(&self, snapshot: &ReportSnapshot) -> Result<(), HistoryError>;
}

/// Report-history API reached over HTTP.
pub struct HttpReportHistory {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpReportHistory {
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/reports", base_url.trim_end_matches('/')),
        }
    }
}

#[async_trait]
impl ReportHistory for HttpReportHistory {
    async fn save(&self, snapshot: &ReportSnapshot) -> Result<(), HistoryError> {
        let response = self.client.post(&self.endpoint).json(snapshot).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(HistoryError::Status(status.as_u16()));
        }
        Ok(())
    }
}

/// Process-local store used when no history API is configured.
#[derive(Default)]
pub struct InMemoryReportHistory {
    records: RwLock<Vec<ReportSnapshot>>,
}

impl InMemoryReportHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<ReportSnapshot> {
        self.records.read().clone()
    }
}

#[async_trait]
impl ReportHistory for InMemoryReportHistory {
    async fn save(&self, snapshot: &ReportSnapshot) -> Result<(), HistoryError> {
        self.records.write().push(snapshot.clone());
        Ok(())
    }
}

/// Fire-and-forget handle onto the history worker's queue.
#[derive(Clone)]
pub struct HistorySender {
    sender: mpsc::Sender<ReportSnapshot>,
}

impl HistorySender {
    pub fn channel() -> (Self, mpsc::Receiver<ReportSnapshot>) {
        let (sender, receiver) = mpsc::channel(HISTORY_QUEUE_CAPACITY);
        (Self { sender }, receiver)
    }

    /// Queue a snapshot. A full or closed queue drops it with an error log.
    pub fn record(&self, snapshot: ReportSnapshot) {
        let title = snapshot.title.clone();
        match self.sender.try_send(snapshot) {
            Ok(()) => log::debug!("Report snapshot queued: {}", title),
            Err(e) => log::error!("Failed to queue report snapshot '{}': {}", title, e),
        }
    }
}
