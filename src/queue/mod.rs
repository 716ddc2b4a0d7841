//! Durable queue layer
//!
//! Every pipeline role coordinates exclusively through named durable list
//! structures: the URL frontier, the results queue, and the metadata queue.
//! The [`DurableQueue`] trait is the seam between the pipeline logic and the
//! backing store; [`RedisQueue`] is the production implementation and
//! [`MemoryQueue`] backs tests and local runs.

mod frontier;
mod memory;
mod record_queue;
mod redis_queue;

pub use frontier::FrontierStore;
pub use memory::MemoryQueue;
pub use record_queue::RecordQueue;
pub use redis_queue::RedisQueue;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during queue operations
#[derive(Debug, Error)]
pub enum QueueError {
    /// The backing store could not be reached or rejected the operation
    #[error("Queue store unavailable: {0}")]
    Unavailable(#[from] redis::RedisError),

    /// A queued payload could not be decoded
    #[error("Malformed queue record: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

/// Operations required of a durable list structure
///
/// All three pipeline queues are plain string lists; entry ordering is
/// FIFO (push appends to the tail, pop and trim act on the head).
#[async_trait]
pub trait DurableQueue: Send + Sync {
    /// Appends all values to the tail of the list
    async fn push_many(&self, key: &str, values: &[String]) -> QueueResult<u64>;

    /// Appends only values not already present anywhere in the list
    ///
    /// The membership read and the insert happen as one atomic operation so
    /// the uniqueness invariant holds across overlapping concurrent batches.
    /// Returns the number of values actually inserted.
    async fn push_absent(&self, key: &str, values: &[String]) -> QueueResult<u64>;

    /// Removes and returns the head entry; `None` when the list is empty.
    /// Non-blocking; the caller decides the idle policy.
    async fn pop_one(&self, key: &str) -> QueueResult<Option<String>>;

    /// Reads up to `max` entries from the head without removing them
    async fn read_range(&self, key: &str, max: usize) -> QueueResult<Vec<String>>;

    /// Drops `count` entries from the head
    async fn trim_front(&self, key: &str, count: usize) -> QueueResult<()>;

    /// Current list length
    async fn len(&self, key: &str) -> QueueResult<usize>;
}
