//! Metadata drain
//!
//! Standing process that moves metadata records from the durable queue into
//! the relational store. Each cycle reads a batch without removing it, backs
//! the batch up to a local file, commits it transactionally, and only then
//! trims the queue. Any failure leaves the batch queued for the next cycle,
//! so the drain never loses records and never exits on its own.

mod backup;

pub use backup::BackupWriter;

use crate::db::MetadataStore;
use crate::queue::{DurableQueue, RecordQueue};
use crate::records::MetadataRecord;
use crate::ForagerError;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// What one drain cycle accomplished
#[derive(Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Queue was empty
    Idle,
    /// A batch was backed up, committed, and trimmed
    Drained { records: u64 },
}

/// Moves queued metadata into the relational store
pub struct MetadataDrain {
    queue: RecordQueue<MetadataRecord>,
    store: Arc<dyn MetadataStore>,
    backup: BackupWriter,
    batch_size: usize,
    check_interval: Duration,
}

impl MetadataDrain {
    pub fn new(
        queue: Arc<dyn DurableQueue>,
        metadata_key: &str,
        store: Arc<dyn MetadataStore>,
        backup_dir: &str,
        batch_size: usize,
        check_interval: Duration,
    ) -> Self {
        Self {
            queue: RecordQueue::new(queue, metadata_key),
            store,
            backup: BackupWriter::new(backup_dir),
            batch_size,
            check_interval,
        }
    }

    /// Standing drain loop; errors are logged and retried next cycle
    pub async fn run(&self) -> std::convert::Infallible {
        tracing::info!("Metadata drain started");
        loop {
            match self.run_cycle().await {
                Ok(CycleOutcome::Idle) => {}
                Ok(CycleOutcome::Drained { records }) => {
                    tracing::info!("Drained {} records", records);
                }
                Err(e) => {
                    tracing::error!("Drain cycle failed, batch stays queued: {}", e);
                }
            }
            sleep(self.check_interval).await;
        }
    }

    /// Executes one backup-commit-trim cycle
    ///
    /// The queue is only trimmed after both the backup file and the database
    /// transaction have succeeded.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, ForagerError> {
        let queued = self.queue.len().await?;
        if queued == 0 {
            return Ok(CycleOutcome::Idle);
        }

        let batch = self.queue.read_batch(self.batch_size).await?;
        if batch.is_empty() {
            return Ok(CycleOutcome::Idle);
        }

        self.backup.write_batch(&batch)?;
        self.store.insert_batch(&batch).await?;
        self.queue.trim(batch.len()).await?;

        Ok(CycleOutcome::Drained {
            records: batch.len() as u64,
        })
    }
}
