//! Background writer mirroring provider state to the durable store.
//!
//! Records are saved one at a time, in the order they were queued, on the
//! blocking pool so SQLite never stalls the UI thread.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};

use crate::data::{ToolStateRecord, ToolStateStore};

enum WriteCommand {
    Save(ToolStateRecord),
    Flush(oneshot::Sender<()>),
}

/// Handle to the writer task. Dropping every handle ends the task after it
/// drains what was already queued.
#[derive(Clone)]
pub struct StateWriter {
    tx: mpsc::UnboundedSender<WriteCommand>,
    failed_writes: Arc<AtomicU64>,
}

impl StateWriter {
    /// Spawn the writer on the current tokio runtime
    pub fn spawn(store: Arc<dyn ToolStateStore>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<WriteCommand>();
        let failed_writes = Arc::new(AtomicU64::new(0));
        let failures = failed_writes.clone();

        tokio::spawn(async move {
            while let Some(command) = rx.recv().await {
                match command {
                    WriteCommand::Save(record) => {
                        let store = store.clone();
                        match tokio::task::spawn_blocking(move || store.save(&record)).await {
                            Ok(Ok(saved)) => {
                                tracing::trace!(updated_at = %saved.updated_at, "Tool state persisted");
                            }
                            Ok(Err(e)) => {
                                failures.fetch_add(1, Ordering::Relaxed);
                                tracing::warn!(
                                    error = %e,
                                    "Failed to persist tool state; changes will not survive a reload"
                                );
                            }
                            Err(e) => {
                                failures.fetch_add(1, Ordering::Relaxed);
                                tracing::error!(error = %e, "Tool state save task failed");
                            }
                        }
                    }
                    WriteCommand::Flush(ack) => {
                        let _ = ack.send(());
                    }
                }
            }
            tracing::debug!("Tool state writer stopped");
        });

        Self { tx, failed_writes }
    }

    /// Queue a record for saving
    pub fn save(&self, record: ToolStateRecord) {
        if self.tx.send(WriteCommand::Save(record)).is_err() {
            self.failed_writes.fetch_add(1, Ordering::Relaxed);
            tracing::warn!("Tool state writer is gone; dropping write");
        }
    }

    /// Wait until everything queued before this call has been written
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(WriteCommand::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }

    /// Number of writes that did not reach the store
    pub fn failed_writes(&self) -> u64 {
        self.failed_writes.load(Ordering::Relaxed)
    }
}
