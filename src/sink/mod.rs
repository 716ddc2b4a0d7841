//! Result sink
//!
//! Consumes crawl results from the durable results queue, cleans and persists
//! the markup as a content artifact, and queues a metadata record for the
//! drain. Incomplete or failed results are dropped with a logged reason; the
//! sink itself runs as a standing process and only stops on queue failure.

use crate::content::{clean_html, ContentStore};
use crate::queue::{DurableQueue, QueueError, RecordQueue};
use crate::records::{CrawlResult, FetchOutcome, MetadataRecord};
use crate::ForagerError;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

/// What the sink did with one result
#[derive(Debug, PartialEq, Eq)]
pub enum SinkOutcome {
    /// Artifact persisted and metadata queued
    Stored(PathBuf),
    /// Result discarded; the reason is logged
    Dropped(&'static str),
}

/// Persists crawl results and emits metadata records
pub struct ResultSink {
    results: RecordQueue<CrawlResult>,
    metadata: RecordQueue<MetadataRecord>,
    store: ContentStore,
    check_interval: Duration,
}

impl ResultSink {
    pub fn new(
        queue: Arc<dyn DurableQueue>,
        results_key: &str,
        metadata_key: &str,
        storage_root: &str,
        check_interval: Duration,
    ) -> Self {
        Self {
            results: RecordQueue::new(Arc::clone(&queue), results_key),
            metadata: RecordQueue::new(queue, metadata_key),
            store: ContentStore::new(storage_root),
            check_interval,
        }
    }

    /// Standing consume loop; sleeps through empty polls
    ///
    /// A payload that fails to decode is dropped with a logged reason so one
    /// poisoned entry cannot stop the service; only store unavailability
    /// terminates the loop.
    pub async fn run(&self) -> Result<(), ForagerError> {
        tracing::info!("Result sink started");
        loop {
            match self.results.pop().await {
                Ok(Some(result)) => {
                    self.process(result).await?;
                }
                Ok(None) => sleep(self.check_interval).await,
                Err(QueueError::Malformed(e)) => {
                    tracing::warn!("Dropping undecodable result payload: {}", e);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Validates, persists, and records one crawl result
    ///
    /// Only queue failures propagate.
    pub async fn process(&self, result: CrawlResult) -> Result<SinkOutcome, ForagerError> {
        if result.url.is_empty() || result.domain.is_empty() {
            tracing::warn!("Dropping result without url/domain");
            return Ok(SinkOutcome::Dropped("missing url or domain"));
        }
        if result.outcome != FetchOutcome::Success {
            tracing::warn!(
                "Dropping failed result for {} ({})",
                result.url,
                result.outcome.as_status()
            );
            return Ok(SinkOutcome::Dropped("fetch failed"));
        }
        if result.markup.trim().is_empty() {
            tracing::warn!("Dropping empty-content result for {}", result.url);
            return Ok(SinkOutcome::Dropped("empty markup"));
        }

        let cleaned = clean_html(&result.markup);
        let path = match self.store.save(&result.domain, &result.url, &cleaned) {
            Some(path) => path,
            None => {
                tracing::error!("Failed to persist artifact for {}", result.url);
                return Ok(SinkOutcome::Dropped("persistence failed"));
            }
        };

        let mut record = MetadataRecord::new(
            &result.url,
            &result.domain,
            &path.to_string_lossy(),
            result.http_status,
            result.outcome.as_status(),
        );
        record.user_agent = result.user_agent;
        record.strategy = Some(result.strategy);
        self.metadata.push(&record).await?;

        tracing::info!("Stored {} at {}", result.url, path.display());
        Ok(SinkOutcome::Stored(path))
    }
}
