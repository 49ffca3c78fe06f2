use std::sync::Arc;

use tokio::{sync::mpsc, task::JoinHandle};
use uuid::Uuid;

use crate::{
    db::HistoryStore,
    models::{HistoryRecord, Recommendation},
};

/// Fire-and-forget recorder for served recommendations.
///
/// Records are queued onto a channel and persisted by a background task, so
/// a slow or failing history store never delays or fails a response.
#[derive(Clone)]
pub struct HistorySink {
    write_tx: mpsc::UnboundedSender<Vec<HistoryRecord>>,
}

/// Handle for gracefully shutting down the history writer
pub struct HistoryWriterHandle {
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl HistoryWriterHandle {
    /// Signals the writer to stop and waits for queued records to be flushed
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
        tracing::info!("History writer shutdown signal sent");

        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "History writer task panicked");
        }
    }
}

impl HistorySink {
    /// Spawns the background writer over the given store
    pub fn spawn(store: Arc<dyn HistoryStore>) -> (Self, HistoryWriterHandle) {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let task = tokio::spawn(async move {
            Self::history_writer_task(store, write_rx, shutdown_rx).await;
        });

        (Self { write_tx }, HistoryWriterHandle { shutdown_tx, task })
    }

    /// Queues one record per recommendation for the given user
    pub fn record(&self, user_id: Uuid, recommendations: &[Recommendation]) {
        if recommendations.is_empty() {
            return;
        }

        let batch: Vec<HistoryRecord> = recommendations
            .iter()
            .map(|rec| HistoryRecord::from_recommendation(user_id, rec))
            .collect();

        if let Err(e) = self.write_tx.send(batch) {
            tracing::warn!(
                %user_id,
                dropped = e.0.len(),
                "History writer is gone, recommendations not recorded"
            );
        }
    }

    async fn history_writer_task(
        store: Arc<dyn HistoryStore>,
        mut write_rx: mpsc::UnboundedReceiver<Vec<HistoryRecord>>,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        tracing::info!("History writer task started");

        loop {
            tokio::select! {
                batch = write_rx.recv() => match batch {
                    Some(batch) => Self::persist(store.as_ref(), batch).await,
                    None => break,
                },
                // A dropped handle disables this branch rather than stopping the writer
                Some(()) = shutdown_rx.recv() => {
                    tracing::info!("History writer shutting down, flushing queued records");
                    write_rx.close();
                    while let Some(batch) = write_rx.recv().await {
                        Self::persist(store.as_ref(), batch).await;
                    }
                    break;
                }
            }
        }

        tracing::info!("History writer task stopped");
    }

    async fn persist(store: &dyn HistoryStore, batch: Vec<HistoryRecord>) {
        if let Err(e) = store.append(&batch).await {
            tracing::warn!(error = %e, records = batch.len(), "Failed to record recommendation history");
        }
    }
}
