//! Frontier loader
//!
//! Batch-imports candidate URLs from a line-delimited file into the shared
//! frontier, inserting only URLs that are not already queued. A queue failure
//! aborts the import rather than silently skipping the remaining input.

use crate::queue::FrontierStore;
use crate::ForagerError;
use std::io::{BufRead, BufReader};
use std::path::Path;
use url::Url;

/// URLs accumulated before each frontier insertion
const READ_BATCH_SIZE: usize = 10000;

/// Outcome of one import run
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Non-empty lines read from the input
    pub read: usize,
    /// New frontier entries inserted
    pub inserted: usize,
    /// URLs already queued
    pub skipped: usize,
    /// Lines that were not well-formed absolute http(s) URLs
    pub invalid: usize,
}

/// Imports URLs from a file into the frontier
///
/// # Errors
///
/// Propagates `QueueError::Unavailable` from the frontier store; the current
/// batch is aborted and no further input is consumed.
pub async fn import_urls(path: &Path, frontier: &FrontierStore) -> Result<LoadReport, ForagerError> {
    let file = std::fs::File::open(path)?;
    let reader = BufReader::new(file);

    let mut report = LoadReport::default();
    let mut batch: Vec<String> = Vec::with_capacity(READ_BATCH_SIZE);

    for line in reader.lines() {
        let line = line?;
        let candidate = line.trim();
        if candidate.is_empty() {
            continue;
        }
        report.read += 1;

        if !is_valid_frontier_url(candidate) {
            tracing::warn!("Skipping invalid URL on import: {}", candidate);
            report.invalid += 1;
            continue;
        }

        batch.push(candidate.to_string());
        if batch.len() >= READ_BATCH_SIZE {
            flush_batch(frontier, &mut batch, &mut report).await?;
        }
    }

    if !batch.is_empty() {
        flush_batch(frontier, &mut batch, &mut report).await?;
    }

    tracing::info!(
        "Import complete: {} read, {} inserted, {} skipped, {} invalid",
        report.read,
        report.inserted,
        report.skipped,
        report.invalid
    );
    Ok(report)
}

async fn flush_batch(
    frontier: &FrontierStore,
    batch: &mut Vec<String>,
    report: &mut LoadReport,
) -> Result<(), ForagerError> {
    let attempted = batch.len();
    let inserted = frontier.enqueue_if_absent(batch).await.map_err(|e| {
        tracing::error!("Frontier unavailable, aborting import: {}", e);
        e
    })?;
    report.inserted += inserted;
    report.skipped += attempted - inserted;
    batch.clear();
    Ok(())
}

/// A frontier entry must be a well-formed absolute http(s) URL
fn is_valid_frontier_url(candidate: &str) -> bool {
    match Url::parse(candidate) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host_str().is_some(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue::MemoryQueue;
    use std::io::Write;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    fn write_input(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{line}").unwrap();
        }
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn fresh_load_skips_already_queued() {
        let frontier = FrontierStore::new(Arc::new(MemoryQueue::new()), "test:frontier");
        frontier
            .enqueue_if_absent(&["https://shop.example.com/p/1".to_string()])
            .await
            .unwrap();

        let input = write_input(&[
            "https://shop.example.com/p/1",
            "https://shop.example.com/p/2",
            "https://shop.example.com/p/3",
        ]);

        let report = import_urls(input.path(), &frontier).await.unwrap();
        assert_eq!(report.read, 3);
        assert_eq!(report.inserted, 2);
        assert_eq!(report.skipped, 1);
        assert_eq!(frontier.len().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn invalid_lines_counted_not_queued() {
        let frontier = FrontierStore::new(Arc::new(MemoryQueue::new()), "test:frontier");
        let input = write_input(&[
            "https://shop.example.com/p/1",
            "not a url",
            "ftp://files.example.com/listing",
            "",
            "   ",
        ]);

        let report = import_urls(input.path(), &frontier).await.unwrap();
        assert_eq!(report.read, 3);
        assert_eq!(report.inserted, 1);
        assert_eq!(report.invalid, 2);
        assert_eq!(frontier.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn missing_input_file_is_an_error() {
        let frontier = FrontierStore::new(Arc::new(MemoryQueue::new()), "test:frontier");
        let result = import_urls(Path::new("/nonexistent/urls.csv"), &frontier).await;
        assert!(result.is_err());
    }
}
