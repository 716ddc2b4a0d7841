//! Typed JSON record queue
//!
//! Wraps a [`DurableQueue`] list with serde encoding so the results and
//! metadata queues carry structured records instead of raw strings.

use crate::queue::{DurableQueue, QueueResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;

/// Durable queue of JSON-serialized records
pub struct RecordQueue<T> {
    queue: Arc<dyn DurableQueue>,
    key: String,
    _record: PhantomData<fn() -> T>,
}

impl<T> Clone for RecordQueue<T> {
    fn clone(&self) -> Self {
        Self {
            queue: Arc::clone(&self.queue),
            key: self.key.clone(),
            _record: PhantomData,
        }
    }
}

impl<T: Serialize + DeserializeOwned> RecordQueue<T> {
    pub fn new(queue: Arc<dyn DurableQueue>, key: impl Into<String>) -> Self {
        Self {
            queue,
            key: key.into(),
            _record: PhantomData,
        }
    }

    /// Appends one record to the tail of the queue
    pub async fn push(&self, record: &T) -> QueueResult<()> {
        let payload = serde_json::to_string(record)?;
        self.queue.push_many(&self.key, &[payload]).await?;
        Ok(())
    }

    /// Removes and returns the head record, if any
    pub async fn pop(&self) -> QueueResult<Option<T>> {
        match self.queue.pop_one(&self.key).await? {
            Some(payload) => Ok(Some(serde_json::from_str(&payload)?)),
            None => Ok(None),
        }
    }

    /// Reads up to `max` records from the head without removing them
    pub async fn read_batch(&self, max: usize) -> QueueResult<Vec<T>> {
        let payloads = self.queue.read_range(&self.key, max).await?;
        payloads
            .iter()
            .map(|payload| Ok(serde_json::from_str(payload)?))
            .collect()
    }

    /// Drops `count` records from the head
    pub async fn trim(&self, count: usize) -> QueueResult<()> {
        self.queue.trim_front(&self.key, count).await
    }

    /// Number of queued records
    pub async fn len(&self) -> QueueResult<usize> {
        self.queue.len(&self.key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::MemoryQueue;
    use crate::records::MetadataRecord;

    fn record(url: &str) -> MetadataRecord {
        MetadataRecord::new(url, "shop.example.com", "/tmp/a.html", Some(200), "success")
    }

    #[tokio::test]
    async fn push_pop_roundtrip() {
        let queue: RecordQueue<MetadataRecord> =
            RecordQueue::new(Arc::new(MemoryQueue::new()), "test:metadata");

        let original = record("https://shop.example.com/p/1");
        queue.push(&original).await.unwrap();

        let popped = queue.pop().await.unwrap().unwrap();
        assert_eq!(popped, original);
        assert!(queue.pop().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn read_batch_preserves_order_and_leaves_queue_intact() {
        let queue: RecordQueue<MetadataRecord> =
            RecordQueue::new(Arc::new(MemoryQueue::new()), "test:metadata");

        for i in 0..5 {
            queue
                .push(&record(&format!("https://shop.example.com/p/{i}")))
                .await
                .unwrap();
        }

        let batch = queue.read_batch(10).await.unwrap();
        assert_eq!(batch.len(), 5);
        assert_eq!(batch[0].url, "https://shop.example.com/p/0");
        assert_eq!(batch[4].url, "https://shop.example.com/p/4");
        // Read, not removed
        assert_eq!(queue.len().await.unwrap(), 5);

        queue.trim(5).await.unwrap();
        assert_eq!(queue.len().await.unwrap(), 0);
    }
}
