//! Data records flowing through the pipeline
//!
//! A fetch worker produces one [`CrawlResult`] per attempted URL. The result
//! sink (or the browser worker directly) converts stored results into
//! [`MetadataRecord`]s, which the drain moves into the relational store.

use chrono::Local;
use serde::{Deserialize, Serialize};
use url::Url;

/// Outcome of a single fetch attempt sequence for one URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchOutcome {
    /// Page fetched and content extracted
    Success,
    /// Server answered with a non-success status (after any retries)
    HttpError,
    /// Request or navigation exceeded its deadline
    Timeout,
    /// Transport-level failure (DNS, connect, TLS)
    NetworkError,
}

impl FetchOutcome {
    /// Short status string persisted with the metadata row
    pub fn as_status(&self) -> &'static str {
        match self {
            FetchOutcome::Success => "success",
            FetchOutcome::HttpError => "http-error",
            FetchOutcome::Timeout => "timeout",
            FetchOutcome::NetworkError => "network-error",
        }
    }
}

/// Which fetch path produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchStrategy {
    /// Plain HTTP fetch via the light worker
    Http,
    /// Full browser navigation via the heavy worker
    Browser,
}

/// Structured result of one crawl attempt, produced by either worker type
///
/// Immutable once produced; ownership transfers to the result sink through
/// the durable results queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlResult {
    /// The URL as claimed from the frontier
    pub url: String,
    /// Authority component of the URL (host, plus port when present)
    pub domain: String,
    /// HTTP status code, absent on transport failures
    pub http_status: Option<u16>,
    /// Raw page markup; empty on failure
    pub markup: String,
    /// How the fetch ended
    pub outcome: FetchOutcome,
    /// User agent presented for the (final) attempt
    pub user_agent: String,
    /// Fetch path that produced this result
    pub strategy: FetchStrategy,
}

/// Metadata describing one persisted content artifact
///
/// Queued durably; removed from the queue only after it has been both backed
/// up to the append-only log and committed into the relational store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataRecord {
    pub url: String,
    pub domain: String,
    /// Content artifact path; empty when persistence failed
    pub artifact_path: String,
    pub http_status: Option<u16>,
    /// Local-time timestamp, `%Y-%m-%d %H:%M:%S`
    pub saved_at: String,
    /// Crawl status string, see [`FetchOutcome::as_status`]
    pub crawl_status: String,
    /// User agent the fetch presented (browser worker records this)
    #[serde(default)]
    pub user_agent: String,
    /// Fetch strategy, `http` or `browser`
    #[serde(default)]
    pub strategy: Option<FetchStrategy>,
}

impl MetadataRecord {
    /// Builds a record stamped with the current time
    pub fn new(
        url: &str,
        domain: &str,
        artifact_path: &str,
        http_status: Option<u16>,
        crawl_status: &str,
    ) -> Self {
        Self {
            url: url.to_string(),
            domain: domain.to_string(),
            artifact_path: artifact_path.to_string(),
            http_status,
            saved_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            crawl_status: crawl_status.to_string(),
            user_agent: String::new(),
            strategy: None,
        }
    }
}

/// Extracts the authority component (host plus explicit port) from a URL
///
/// Returns `None` for URLs without a host (e.g. `mailto:`).
pub fn domain_of(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}
