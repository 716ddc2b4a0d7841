//! Light fetch worker
//!
//! Claims a small batch of URLs (default one) from the frontier, fetches
//! each over plain HTTP
//! with a rotated User-Agent, extracts the configured page fragment, and
//! emits a structured result onto the durable results queue. The worker
//! terminates once the frontier stays empty past the idle timeout; that is
//! the signal that this worker's share of the run is drained.
//!
//! State machine per URL: Claimed -> Fetching -> {Parsed | Dropped}.

use crate::config::Config;
use crate::queue::{DurableQueue, FrontierStore, RecordQueue};
use crate::records::{domain_of, CrawlResult, FetchOutcome, FetchStrategy};
use crate::sites::{ExtractionRule, SiteRules};
use crate::worker::identity::{build_http_client, IdentityPool};
use crate::worker::RetryPolicy;
use crate::ForagerError;
use reqwest::header::USER_AGENT;
use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};
use url::Url;

/// Poll interval while the frontier is empty
const IDLE_POLL: Duration = Duration::from_secs(1);

/// Result of the fetch phase, before extraction
struct FetchAttempt {
    http_status: Option<u16>,
    body: String,
    outcome: FetchOutcome,
    user_agent: String,
}

/// HTTP-based fetch worker
pub struct LightWorker {
    frontier: FrontierStore,
    results: RecordQueue<CrawlResult>,
    rules: SiteRules,
    client: Client,
    identity: IdentityPool,
    policy: RetryPolicy,
    batch_size: usize,
    idle_timeout: Duration,
    download_delay: Duration,
}

impl LightWorker {
    /// Builds a worker wired to the shared queues
    pub fn new(
        queue: Arc<dyn DurableQueue>,
        rules: SiteRules,
        config: &Config,
    ) -> Result<Self, ForagerError> {
        let client = build_http_client(config.proxy.as_ref())?;
        Ok(Self {
            frontier: FrontierStore::new(Arc::clone(&queue), &config.queue.frontier_key),
            results: RecordQueue::new(queue, &config.queue.results_key),
            rules,
            client,
            identity: IdentityPool::new(),
            policy: RetryPolicy::from_config(&config.retry),
            batch_size: config.light.batch_size.max(1),
            idle_timeout: Duration::from_secs(config.light.idle_timeout_secs),
            download_delay: Duration::from_millis(config.light.download_delay_ms),
        })
    }

    /// Drains the frontier until it stays empty past the idle timeout
    pub async fn run(&self) -> Result<u64, ForagerError> {
        tracing::info!(
            "Light worker started ({} site rules loaded)",
            self.rules.len()
        );
        let mut processed = 0u64;
        let mut idle_since: Option<Instant> = None;

        loop {
            let batch = self.frontier.dequeue_batch(self.batch_size).await?;
            if batch.is_empty() {
                let since = *idle_since.get_or_insert_with(Instant::now);
                if since.elapsed() >= self.idle_timeout {
                    tracing::info!(
                        "Frontier idle for {:?}, worker stopping after {} URLs",
                        self.idle_timeout,
                        processed
                    );
                    break;
                }
                sleep(IDLE_POLL).await;
                continue;
            }

            idle_since = None;
            for url in &batch {
                self.process_url(url).await?;
                processed += 1;
                if !self.download_delay.is_zero() {
                    sleep(self.download_delay).await;
                }
            }
        }
        Ok(processed)
    }

    /// Fetches one claimed URL and emits its result
    ///
    /// Only queue failures propagate; per-URL fetch and extraction problems
    /// are recorded or dropped so one bad URL never stops the worker.
    async fn process_url(&self, url: &str) -> Result<(), ForagerError> {
        let parsed = match Url::parse(url) {
            Ok(u) => u,
            Err(e) => {
                tracing::warn!("Dropping malformed frontier entry {}: {}", url, e);
                return Ok(());
            }
        };
        let domain = match domain_of(&parsed) {
            Some(d) => d,
            None => {
                tracing::warn!("Dropping URL without host: {}", url);
                return Ok(());
            }
        };

        tracing::info!("Fetching {}", url);
        let attempt = self.fetch_with_retry(url).await;

        if attempt.outcome != FetchOutcome::Success {
            tracing::warn!(
                "Fetch failed for {} ({}, status {:?})",
                url,
                attempt.outcome.as_status(),
                attempt.http_status
            );
            self.results
                .push(&CrawlResult {
                    url: url.to_string(),
                    domain,
                    http_status: attempt.http_status,
                    markup: String::new(),
                    outcome: attempt.outcome,
                    user_agent: attempt.user_agent,
                    strategy: FetchStrategy::Http,
                })
                .await?;
            return Ok(());
        }

        let markup = match self.extract(&domain, url, &attempt.body) {
            Some(markup) => markup,
            // Dropped: unknown domain or required content missing
            None => return Ok(()),
        };

        self.results
            .push(&CrawlResult {
                url: url.to_string(),
                domain,
                http_status: attempt.http_status,
                markup,
                outcome: FetchOutcome::Success,
                user_agent: attempt.user_agent,
                strategy: FetchStrategy::Http,
            })
            .await?;
        Ok(())
    }

    /// Fetches with per-attempt identity rotation and bounded backoff
    async fn fetch_with_retry(&self, url: &str) -> FetchAttempt {
        let max_attempts = self.policy.max_retries().max(1);
        let mut last_outcome = FetchOutcome::NetworkError;
        let mut last_status = None;
        let mut last_agent = String::new();

        for attempt in 0..max_attempts {
            let user_agent = self.identity.random_agent().to_string();
            last_agent = user_agent.clone();

            match self
                .client
                .get(url)
                .header(USER_AGENT, &user_agent)
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status().as_u16();
                    last_status = Some(status);

                    if response.status().is_success() {
                        match response.text().await {
                            Ok(body) => {
                                return FetchAttempt {
                                    http_status: Some(status),
                                    body,
                                    outcome: FetchOutcome::Success,
                                    user_agent,
                                }
                            }
                            Err(e) => {
                                tracing::warn!("Failed to read body for {}: {}", url, e);
                                last_outcome = FetchOutcome::NetworkError;
                            }
                        }
                    } else if self.policy.is_permanent(status) {
                        tracing::error!("HTTP {} for {}, skipping retries", status, url);
                        return FetchAttempt {
                            http_status: Some(status),
                            body: String::new(),
                            outcome: FetchOutcome::HttpError,
                            user_agent,
                        };
                    } else {
                        last_outcome = FetchOutcome::HttpError;
                    }
                }
                Err(e) if e.is_timeout() => {
                    tracing::warn!("Timeout fetching {}: {}", url, e);
                    last_outcome = FetchOutcome::Timeout;
                }
                Err(e) => {
                    tracing::warn!("Request error for {}: {}", url, e);
                    last_outcome = FetchOutcome::NetworkError;
                }
            }

            if attempt + 1 < max_attempts {
                let delay = self.policy.backoff_delay(attempt);
                tracing::info!(
                    "Retrying {} after {:?} ({}/{})",
                    url,
                    delay,
                    attempt + 2,
                    max_attempts
                );
                sleep(delay).await;
            }
        }

        FetchAttempt {
            http_status: last_status,
            body: String::new(),
            outcome: last_outcome,
            user_agent: last_agent,
        }
    }

    /// Resolves the extraction rule and selects the configured fragment
    fn extract(&self, domain: &str, url: &str, body: &str) -> Option<String> {
        let rule = match self.rules.rule_for(domain) {
            Some(rule) => rule,
            None => {
                // Unknown domains are expected; skip cleanly
                tracing::warn!("No extraction rule for domain {}, dropping {}", domain, url);
                return None;
            }
        };

        let selector_str = match rule {
            ExtractionRule::Selector(s) => s,
            ExtractionRule::Unconfigured => {
                tracing::warn!("No source-page selector for {}, dropping {}", domain, url);
                return None;
            }
        };

        let selector = match Selector::parse(selector_str) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("Invalid selector '{}' for {}: {}", selector_str, domain, e);
                return None;
            }
        };

        let document = Html::parse_document(body);
        match document.select(&selector).next() {
            Some(node) => Some(node.html()),
            None => {
                tracing::warn!(
                    "Selector '{}' matched nothing on {}, dropping",
                    selector_str,
                    url
                );
                None
            }
        }
    }
}
