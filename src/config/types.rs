use serde::Deserialize;

/// Main configuration structure for Forager
///
/// One flat document shared by every pipeline role; each process reads the
/// sections it needs and ignores the rest.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub queue: QueueConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub sites: SitesConfig,
    #[serde(default)]
    pub light: LightConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub browser: BrowserConfig,
    #[serde(default)]
    pub pacing: PacingConfig,
    #[serde(default)]
    pub drain: DrainConfig,
    #[serde(default)]
    pub proxy: Option<ProxyConfig>,
}

/// Durable queue endpoint and key names
#[derive(Debug, Clone, Deserialize)]
pub struct QueueConfig {
    /// Redis connection URL
    pub url: String,

    /// List key holding pending frontier URLs
    #[serde(rename = "frontier-key", default = "default_frontier_key")]
    pub frontier_key: String,

    /// List key holding serialized crawl results
    #[serde(rename = "results-key", default = "default_results_key")]
    pub results_key: String,

    /// List key holding serialized metadata records
    #[serde(rename = "metadata-key", default = "default_metadata_key")]
    pub metadata_key: String,
}

fn default_frontier_key() -> String {
    "forager:frontier".to_string()
}
fn default_results_key() -> String {
    "forager:results".to_string()
}
fn default_metadata_key() -> String {
    "forager:metadata".to_string()
}

/// Relational store connection
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL (required by the drain)
    #[serde(default)]
    pub url: String,

    /// Maximum pooled connections
    #[serde(rename = "max-connections", default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

/// Content artifact and backup storage locations
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root directory for content artifacts
    #[serde(default = "default_storage_root")]
    pub root: String,

    /// Directory for drain backup files
    #[serde(rename = "backup-dir", default = "default_backup_dir")]
    pub backup_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            backup_dir: default_backup_dir(),
        }
    }
}

fn default_storage_root() -> String {
    "./html_storage".to_string()
}
fn default_backup_dir() -> String {
    "./metadata_backups".to_string()
}

/// Per-site extraction rule file
#[derive(Debug, Clone, Deserialize)]
pub struct SitesConfig {
    /// Path to the JSON rules file mapping domains to selectors
    #[serde(rename = "rules-path", default = "default_rules_path")]
    pub rules_path: String,
}

impl Default for SitesConfig {
    fn default() -> Self {
        Self {
            rules_path: default_rules_path(),
        }
    }
}

fn default_rules_path() -> String {
    "./sites.json".to_string()
}

/// Light worker behavior
#[derive(Debug, Clone, Deserialize)]
pub struct LightConfig {
    /// URLs claimed per pop; kept small so work spreads across the pool
    #[serde(rename = "batch-size", default = "default_light_batch")]
    pub batch_size: usize,

    /// Seconds of consecutive empty pops before the worker exits
    #[serde(rename = "idle-timeout-secs", default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,

    /// Delay between URLs, in milliseconds
    #[serde(rename = "download-delay-ms", default = "default_download_delay")]
    pub download_delay_ms: u64,
}

impl Default for LightConfig {
    fn default() -> Self {
        Self {
            batch_size: default_light_batch(),
            idle_timeout_secs: default_idle_timeout(),
            download_delay_ms: default_download_delay(),
        }
    }
}

fn default_light_batch() -> usize {
    1
}
fn default_idle_timeout() -> u64 {
    7
}
fn default_download_delay() -> u64 {
    2000
}

/// Retry/backoff behavior shared by both workers
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Maximum navigation/fetch attempts per URL
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Base backoff duration, in seconds; doubled per attempt
    #[serde(rename = "base-wait-secs", default = "default_base_wait")]
    pub base_wait_secs: u64,

    /// Status codes that abort retries immediately
    #[serde(rename = "no-retry-statuses", default = "default_no_retry")]
    pub no_retry_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_wait_secs: default_base_wait(),
            no_retry_statuses: default_no_retry(),
        }
    }
}

fn default_max_retries() -> u32 {
    2
}
fn default_base_wait() -> u64 {
    5
}
fn default_no_retry() -> Vec<u16> {
    vec![404, 500]
}

/// Browser worker session settings
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserConfig {
    /// Path to a Chromium executable; discovered automatically when unset
    #[serde(default)]
    pub executable: Option<String>,

    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Navigation deadline per attempt, in seconds
    #[serde(rename = "navigation-timeout-secs", default = "default_nav_timeout")]
    pub navigation_timeout_secs: u64,

    #[serde(rename = "window-width", default = "default_window_width")]
    pub window_width: u32,

    #[serde(rename = "window-height", default = "default_window_height")]
    pub window_height: u32,

    /// Extra command-line arguments passed to the browser
    #[serde(default)]
    pub args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            executable: None,
            headless: default_headless(),
            navigation_timeout_secs: default_nav_timeout(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            args: Vec::new(),
        }
    }
}

fn default_headless() -> bool {
    true
}
fn default_nav_timeout() -> u64 {
    70
}
fn default_window_width() -> u32 {
    1920
}
fn default_window_height() -> u32 {
    1080
}

/// Browser worker pacing and session recycling
#[derive(Debug, Clone, Deserialize)]
pub struct PacingConfig {
    /// Sleep for `pause-duration-secs` after this many URLs
    #[serde(rename = "pause-every", default = "default_pause_every")]
    pub pause_every: u64,

    #[serde(rename = "pause-duration-secs", default = "default_pause_duration")]
    pub pause_duration_secs: u64,

    /// Tear down and relaunch the browser session after this many URLs
    #[serde(rename = "max-urls-before-restart", default = "default_restart_after")]
    pub max_urls_before_restart: u64,

    /// Random inter-URL delay bounds, in milliseconds
    #[serde(rename = "min-delay-ms", default = "default_min_delay")]
    pub min_delay_ms: u64,

    #[serde(rename = "max-delay-ms", default = "default_max_delay")]
    pub max_delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            pause_every: default_pause_every(),
            pause_duration_secs: default_pause_duration(),
            max_urls_before_restart: default_restart_after(),
            min_delay_ms: default_min_delay(),
            max_delay_ms: default_max_delay(),
        }
    }
}

fn default_pause_every() -> u64 {
    20000
}
fn default_pause_duration() -> u64 {
    180
}
fn default_restart_after() -> u64 {
    1000
}
fn default_min_delay() -> u64 {
    1000
}
fn default_max_delay() -> u64 {
    3000
}

/// Metadata drain cycle settings
#[derive(Debug, Clone, Deserialize)]
pub struct DrainConfig {
    /// Maximum records moved per cycle
    #[serde(rename = "batch-size", default = "default_drain_batch")]
    pub batch_size: usize,

    /// Sleep between cycles and after errors, in seconds
    #[serde(rename = "check-interval-secs", default = "default_check_interval")]
    pub check_interval_secs: u64,
}

impl Default for DrainConfig {
    fn default() -> Self {
        Self {
            batch_size: default_drain_batch(),
            check_interval_secs: default_check_interval(),
        }
    }
}

fn default_drain_batch() -> usize {
    10000
}
fn default_check_interval() -> u64 {
    10
}

/// Optional authenticated HTTP proxy for the light worker
#[derive(Debug, Clone, Deserialize)]
pub struct ProxyConfig {
    pub endpoint: String,
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl ProxyConfig {
    /// Proxy URL in `http://host:port` form
    pub fn http_endpoint(&self) -> String {
        format!("http://{}:{}", self.endpoint, self.port)
    }
}
