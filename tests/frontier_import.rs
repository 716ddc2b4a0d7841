//! Frontier import behavior when the queue store is unavailable

use async_trait::async_trait;
use forager::loader::import_urls;
use forager::queue::{DurableQueue, FrontierStore, QueueError, QueueResult};
use forager::ForagerError;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

/// Queue whose store is down
struct UnavailableQueue;

fn store_down() -> QueueError {
    QueueError::Unavailable(
        std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "store down").into(),
    )
}

#[async_trait]
impl DurableQueue for UnavailableQueue {
    async fn push_many(&self, _key: &str, _values: &[String]) -> QueueResult<u64> {
        Err(store_down())
    }
    async fn push_absent(&self, _key: &str, _values: &[String]) -> QueueResult<u64> {
        Err(store_down())
    }
    async fn pop_one(&self, _key: &str) -> QueueResult<Option<String>> {
        Err(store_down())
    }
    async fn read_range(&self, _key: &str, _max: usize) -> QueueResult<Vec<String>> {
        Err(store_down())
    }
    async fn trim_front(&self, _key: &str, _count: usize) -> QueueResult<()> {
        Err(store_down())
    }
    async fn len(&self, _key: &str) -> QueueResult<usize> {
        Err(store_down())
    }
}

#[tokio::test]
async fn unavailable_store_aborts_the_import() {
    let mut input = NamedTempFile::new().unwrap();
    writeln!(input, "https://shop.example.com/p/1").unwrap();
    writeln!(input, "https://shop.example.com/p/2").unwrap();
    input.flush().unwrap();

    let frontier = FrontierStore::new(Arc::new(UnavailableQueue), "test:frontier");
    let result = import_urls(input.path(), &frontier).await;

    assert!(matches!(
        result,
        Err(ForagerError::Queue(QueueError::Unavailable(_)))
    ));
}
