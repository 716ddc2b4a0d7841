//! Relational metadata store
//!
//! The drain commits metadata batches into a single PostgreSQL table,
//! `metadata_crawl_website`. Inserts are transactional: a batch lands
//! entirely or not at all, so a failed commit leaves the durable queue as
//! the source of truth for the next cycle. Re-drained rows upsert on the
//! URL so repeated cycles stay idempotent.

use crate::records::MetadataRecord;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashMap;
use thiserror::Error;

const METADATA_TABLE_DDL: &str = r#"
CREATE TABLE IF NOT EXISTS metadata_crawl_website (
    id BIGSERIAL PRIMARY KEY,
    url TEXT NOT NULL UNIQUE,
    domain TEXT NOT NULL,
    artifact_path TEXT NOT NULL DEFAULT '',
    http_status INTEGER,
    saved_at TEXT NOT NULL,
    crawl_status TEXT NOT NULL DEFAULT ''
)
"#;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Collapses a batch to one record per URL, keeping the newest
///
/// Postgres rejects a multi-row `ON CONFLICT DO UPDATE` that touches the
/// same row twice, and one drain window can legitimately carry several
/// records for a URL (a failed attempt followed by a success). Queue order
/// is oldest-first, so the last occurrence wins. First-occurrence order is
/// preserved.
pub fn dedup_newest_by_url(records: &[MetadataRecord]) -> Vec<&MetadataRecord> {
    let mut position: HashMap<&str, usize> = HashMap::with_capacity(records.len());
    let mut deduped: Vec<&MetadataRecord> = Vec::with_capacity(records.len());
    for record in records {
        match position.get(record.url.as_str()) {
            Some(&i) => deduped[i] = record,
            None => {
                position.insert(&record.url, deduped.len());
                deduped.push(record);
            }
        }
    }
    deduped
}

/// Destination for drained metadata batches
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Commits a batch transactionally; returns the number of rows written
    async fn insert_batch(&self, records: &[MetadataRecord]) -> Result<u64, DbError>;
}

/// PostgreSQL-backed metadata store
pub struct PgMetadataStore {
    pool: PgPool,
}

impl PgMetadataStore {
    /// Connects and ensures the metadata table exists
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, DbError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<(), DbError> {
        sqlx::query(METADATA_TABLE_DDL).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl MetadataStore for PgMetadataStore {
    async fn insert_batch(&self, records: &[MetadataRecord]) -> Result<u64, DbError> {
        if records.is_empty() {
            return Ok(0);
        }
        let records = dedup_newest_by_url(records);

        let mut tx = self.pool.begin().await?;

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
            "INSERT INTO metadata_crawl_website \
             (url, domain, artifact_path, http_status, saved_at, crawl_status) ",
        );
        builder.push_values(records, |mut row, record| {
            row.push_bind(&record.url)
                .push_bind(&record.domain)
                .push_bind(&record.artifact_path)
                .push_bind(record.http_status.map(|s| s as i32))
                .push_bind(&record.saved_at)
                .push_bind(&record.crawl_status);
        });
        builder.push(
            " ON CONFLICT (url) DO UPDATE SET \
             artifact_path = EXCLUDED.artifact_path, \
             http_status = EXCLUDED.http_status, \
             saved_at = EXCLUDED.saved_at, \
             crawl_status = EXCLUDED.crawl_status",
        );

        let affected = builder.build().execute(&mut *tx).await?.rows_affected();
        tx.commit().await?;

        tracing::info!("Committed {} metadata rows", affected);
        Ok(affected)
    }
}
