//! In-process durable queue stand-in
//!
//! Implements [`DurableQueue`] over plain in-memory lists. Used by the test
//! suite and for single-process local runs where no Redis is available.

use crate::queue::{DurableQueue, QueueResult};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// In-memory queue keyed by list name
#[derive(Default)]
pub struct MemoryQueue {
    lists: Mutex<HashMap<String, VecDeque<String>>>,
}

impl MemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DurableQueue for MemoryQueue {
    async fn push_many(&self, key: &str, values: &[String]) -> QueueResult<u64> {
        let mut lists = self.lists.lock().unwrap();
        let list = lists.entry(key.to_string()).or_default();
        for value in values {
            list.push_back(value.clone());
        }
        Ok(values.len() as u64)
    }

    async fn push_absent(&self, key: &str, values: &[String]) -> QueueResult<u64> {
        let mut lists = self.lists.lock().unwrap();
        let list = lists.entry(key.to_string()).or_default();
        let mut added = 0;
        for value in values {
            if !list.contains(value) {
                list.push_back(value.clone());
                added += 1;
            }
        }
        Ok(added)
    }

    async fn pop_one(&self, key: &str) -> QueueResult<Option<String>> {
        let mut lists = self.lists.lock().unwrap();
        Ok(lists.get_mut(key).and_then(|list| list.pop_front()))
    }

    async fn read_range(&self, key: &str, max: usize) -> QueueResult<Vec<String>> {
        let lists = self.lists.lock().unwrap();
        Ok(lists
            .get(key)
            .map(|list| list.iter().take(max).cloned().collect())
            .unwrap_or_default())
    }

    async fn trim_front(&self, key: &str, count: usize) -> QueueResult<()> {
        let mut lists = self.lists.lock().unwrap();
        if let Some(list) = lists.get_mut(key) {
            for _ in 0..count.min(list.len()) {
                list.pop_front();
            }
        }
        Ok(())
    }

    async fn len(&self, key: &str) -> QueueResult<usize> {
        let lists = self.lists.lock().unwrap();
        Ok(lists.get(key).map(|list| list.len()).unwrap_or(0))
    }
}
