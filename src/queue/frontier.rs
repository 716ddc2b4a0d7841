//! Shared URL frontier
//!
//! The frontier is a durable, deduplicated, FIFO-ish list of URLs awaiting a
//! fetch attempt. Producers insert through [`FrontierStore::enqueue_if_absent`];
//! workers claim URLs one at a time with [`FrontierStore::dequeue_one`], which
//! is atomic at the store level so no two workers can claim the same URL.

use crate::queue::{DurableQueue, QueueResult};
use std::collections::HashSet;
use std::sync::Arc;

/// Insertions are chunked to bound the cost of any single queue mutation
const INSERT_CHUNK_SIZE: usize = 1000;

/// Handle to the shared URL frontier
#[derive(Clone)]
pub struct FrontierStore {
    queue: Arc<dyn DurableQueue>,
    key: String,
}

impl FrontierStore {
    pub fn new(queue: Arc<dyn DurableQueue>, key: impl Into<String>) -> Self {
        Self {
            queue,
            key: key.into(),
        }
    }

    /// Inserts URLs that are not already queued, returning the count inserted
    ///
    /// Duplicates within the incoming batch are collapsed first (order
    /// preserved), then each chunk is checked against the full current
    /// membership of the frontier before insertion.
    pub async fn enqueue_if_absent(&self, urls: &[String]) -> QueueResult<usize> {
        let mut seen = HashSet::new();
        let unique: Vec<String> = urls
            .iter()
            .filter(|url| seen.insert(url.as_str()))
            .cloned()
            .collect();

        let mut inserted = 0usize;
        for chunk in unique.chunks(INSERT_CHUNK_SIZE) {
            inserted += self.queue.push_absent(&self.key, chunk).await? as usize;
        }
        Ok(inserted)
    }

    /// Claims one URL from the head of the frontier
    ///
    /// Returns `None` when the frontier is empty; the caller decides whether
    /// to idle-wait or terminate.
    pub async fn dequeue_one(&self) -> QueueResult<Option<String>> {
        self.queue.pop_one(&self.key).await
    }

    /// Claims up to `max` URLs from the head of the frontier
    ///
    /// Each URL is popped individually, so claims stay single-consumer even
    /// with concurrent workers; a short batch means the frontier ran dry.
    pub async fn dequeue_batch(&self, max: usize) -> QueueResult<Vec<String>> {
        let mut claimed = Vec::with_capacity(max);
        while claimed.len() < max {
            match self.queue.pop_one(&self.key).await? {
                Some(url) => claimed.push(url),
                None => break,
            }
        }
        Ok(claimed)
    }

    /// Number of URLs awaiting a fetch attempt
    pub async fn len(&self) -> QueueResult<usize> {
        self.queue.len(&self.key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::MemoryQueue;

    fn frontier() -> FrontierStore {
        FrontierStore::new(Arc::new(MemoryQueue::new()), "test:frontier")
    }

    #[tokio::test]
    async fn dedup_within_batch_and_against_queue() {
        let frontier = frontier();

        let first = vec![
            "https://a.example/1".to_string(),
            "https://a.example/1".to_string(),
            "https://a.example/2".to_string(),
        ];
        assert_eq!(frontier.enqueue_if_absent(&first).await.unwrap(), 2);

        let second = vec![
            "https://a.example/2".to_string(),
            "https://a.example/3".to_string(),
        ];
        assert_eq!(frontier.enqueue_if_absent(&second).await.unwrap(), 1);
        assert_eq!(frontier.len().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn large_imports_are_chunked_without_loss() {
        let frontier = frontier();
        let urls: Vec<String> = (0..2500)
            .map(|i| format!("https://bulk.example/item/{i}"))
            .collect();

        assert_eq!(frontier.enqueue_if_absent(&urls).await.unwrap(), 2500);
        assert_eq!(frontier.len().await.unwrap(), 2500);

        // Re-import inserts nothing
        assert_eq!(frontier.enqueue_if_absent(&urls).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn dequeue_is_fifo_and_empties() {
        let frontier = frontier();
        let urls = vec![
            "https://a.example/1".to_string(),
            "https://a.example/2".to_string(),
        ];
        frontier.enqueue_if_absent(&urls).await.unwrap();

        assert_eq!(
            frontier.dequeue_one().await.unwrap().unwrap(),
            "https://a.example/1"
        );
        assert_eq!(
            frontier.dequeue_one().await.unwrap().unwrap(),
            "https://a.example/2"
        );
        assert!(frontier.dequeue_one().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn dequeue_batch_claims_up_to_max() {
        let frontier = frontier();
        let urls: Vec<String> = (0..5).map(|i| format!("https://a.example/{i}")).collect();
        frontier.enqueue_if_absent(&urls).await.unwrap();

        let first = frontier.dequeue_batch(2).await.unwrap();
        assert_eq!(first, vec!["https://a.example/0", "https://a.example/1"]);
        assert_eq!(frontier.len().await.unwrap(), 3);

        // A short batch drains the remainder
        let rest = frontier.dequeue_batch(10).await.unwrap();
        assert_eq!(rest.len(), 3);
        assert!(frontier.dequeue_batch(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn concurrent_overlapping_batches_stay_unique() {
        let frontier = frontier();
        let batch: Vec<String> = (0..50)
            .map(|i| format!("https://race.example/{i}"))
            .collect();

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let frontier = frontier.clone();
                let batch = batch.clone();
                tokio::spawn(async move { frontier.enqueue_if_absent(&batch).await.unwrap() })
            })
            .collect();

        let mut total = 0;
        for task in tasks {
            total += task.await.unwrap();
        }
        assert_eq!(total, 50);
        assert_eq!(frontier.len().await.unwrap(), 50);
    }
}
