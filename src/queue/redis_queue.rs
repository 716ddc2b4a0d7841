//! Redis-backed durable queue

use crate::queue::{DurableQueue, QueueResult};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

/// Membership-checked insert, atomic at the store level
///
/// Scans the current list once, then appends only entries that are not
/// already queued. Running as a script keeps the read-then-insert sequence
/// atomic across concurrent producers.
const SCRIPT_PUSH_ABSENT: &str = r"
    local existing = {}
    for _, v in ipairs(redis.call('LRANGE', KEYS[1], 0, -1)) do
        existing[v] = true
    end
    local added = 0
    for _, entry in ipairs(ARGV) do
        if not existing[entry] then
            existing[entry] = true
            redis.call('RPUSH', KEYS[1], entry)
            added = added + 1
        end
    end
    return added
";

/// Durable queue backed by Redis lists
///
/// Holds a multiplexed connection; cheap to clone and share across tasks.
#[derive(Clone)]
pub struct RedisQueue {
    conn: MultiplexedConnection,
}

impl RedisQueue {
    /// Connects to the queue store at the given URL
    ///
    /// A connection failure here is a startup-fatal configuration problem
    /// for every pipeline role.
    pub async fn connect(url: &str) -> QueueResult<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        tracing::info!("Connected to queue store");
        Ok(Self { conn })
    }
}

#[async_trait]
impl DurableQueue for RedisQueue {
    async fn push_many(&self, key: &str, values: &[String]) -> QueueResult<u64> {
        if values.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        let _: i64 = conn.rpush(key, values).await?;
        Ok(values.len() as u64)
    }

    async fn push_absent(&self, key: &str, values: &[String]) -> QueueResult<u64> {
        if values.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn.clone();
        let script = redis::Script::new(SCRIPT_PUSH_ABSENT);
        let added: u64 = script
            .key(key)
            .arg(values)
            .invoke_async(&mut conn)
            .await?;
        Ok(added)
    }

    async fn pop_one(&self, key: &str) -> QueueResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.lpop(key, None).await?;
        Ok(value)
    }

    async fn read_range(&self, key: &str, max: usize) -> QueueResult<Vec<String>> {
        if max == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let values: Vec<String> = conn.lrange(key, 0, max as isize - 1).await?;
        Ok(values)
    }

    async fn trim_front(&self, key: &str, count: usize) -> QueueResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn.ltrim(key, count as isize, -1).await?;
        Ok(())
    }

    async fn len(&self, key: &str) -> QueueResult<usize> {
        let mut conn = self.conn.clone();
        let len: usize = conn.llen(key).await?;
        Ok(len)
    }
}
