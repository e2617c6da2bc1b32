//! Background worker that drains the snapshot queue into the history store.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::{ReportHistory, ReportSnapshot};

/// Persist snapshots one by one until every sender is dropped.
///
/// Failures are logged and the snapshot is discarded; there are no retries.
pub async fn start_history_worker(mut receiver: mpsc::Receiver<ReportSnapshot>, store: Arc<dyn ReportHistory>) {
    log::info!("Report history worker started");

    while let Some(snapshot) = receiver.recv().await {
        match store.save(&snapshot).await {
            Ok(()) => log::info!("Report snapshot saved: {}", snapshot.title),
            Err(e) => log::error!("Failed to save report snapshot '{}': {}", snapshot.title, e),
        }
    }

    log::info!("Report history worker stopped");
}
