//! Forager: a distributed vendor-page crawl pipeline
//!
//! This crate implements a crawl pipeline coordinated through shared durable
//! queues: a deduplicated URL frontier, lightweight HTTP and browser-driven
//! fetch workers, a result sink writing content-addressed HTML artifacts, and
//! a metadata drain that moves crawl metadata into a relational store with
//! backup-before-delete semantics.

pub mod config;
pub mod content;
pub mod db;
pub mod drain;
pub mod loader;
pub mod queue;
pub mod records;
pub mod sink;
pub mod sites;
pub mod worker;

use thiserror::Error;

/// Main error type for Forager operations
#[derive(Debug, Error)]
pub enum ForagerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Queue error: {0}")]
    Queue(#[from] queue::QueueError),

    #[error("Database error: {0}")]
    Database(#[from] db::DbError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Browser error: {0}")]
    Browser(#[from] chromiumoxide::error::CdpError),

    #[error("Browser session failed: {0}")]
    BrowserSession(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to parse site rules: {0}")]
    SiteRules(String),

    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type alias for Forager operations
pub type Result<T> = std::result::Result<T, ForagerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use records::{CrawlResult, FetchOutcome, FetchStrategy, MetadataRecord};
