//! Heavy browser worker
//!
//! Drives a real Chromium session over CDP for pages that defeat plain HTTP
//! fetching. Each claimed URL gets rotated request headers, a cookie replay
//! from the continuing session, bounded navigation retries, and one simulated
//! visitor interaction before the rendered document is cleaned and persisted.
//! The session is torn down and relaunched on a fixed URL cadence so no
//! single browser process accumulates hours of history.

use crate::config::Config;
use crate::content::{clean_html, ContentStore};
use crate::queue::{DurableQueue, FrontierStore, RecordQueue};
use crate::records::{domain_of, FetchOutcome, FetchStrategy, MetadataRecord};
use crate::worker::behavior::simulate_visitor;
use crate::worker::identity::IdentityPool;
use crate::worker::RetryPolicy;
use crate::ForagerError;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    CookieParam, EnableParams, EventResponseReceived, Headers, SetExtraHttpHeadersParams,
};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::Page;
use futures::StreamExt;
use rand::Rng;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use url::Url;

/// How long the status capture task waits for the document response
const STATUS_CAPTURE_WINDOW: Duration = Duration::from_secs(10);

/// Masks the obvious automation fingerprints before any page script runs
const STEALTH_JS: &str = r#"
Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3] });
Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
window.chrome = window.chrome || { runtime: {} };
"#;

/// How a navigation attempt sequence ended
enum LoadOutcome {
    /// Document loaded; status absent when capture missed the response
    Loaded { status: Option<u16> },
    /// All attempts exhausted or a do-not-retry status was answered
    Failed {
        status: Option<u16>,
        outcome: FetchOutcome,
    },
}

/// One launched browser with its CDP event pump and a single working page
struct BrowserSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    page: Page,
}

impl BrowserSession {
    /// Launches Chromium and prepares the working page
    async fn launch(config: &crate::config::BrowserConfig) -> Result<Self, ForagerError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .window_size(config.window_width, config.window_height)
            .args(config.args.clone());
        if let Some(executable) = &config.executable {
            builder = builder.chrome_executable(executable);
        }
        if !config.headless {
            builder = builder.with_head();
        }
        let browser_config = builder.build().map_err(ForagerError::BrowserSession)?;

        let (browser, mut handler) = Browser::launch(browser_config).await?;
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser.new_page("about:blank").await?;
        page.execute(EnableParams::default()).await?;
        page.evaluate_on_new_document(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_JS))
            .await?;

        tracing::info!("Browser session launched");
        Ok(Self {
            browser,
            handler_task,
            page,
        })
    }

    async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            tracing::warn!("Browser close failed: {}", e);
        }
        self.handler_task.abort();
    }
}

/// Browser-based fetch worker
pub struct BrowserWorker {
    frontier: FrontierStore,
    metadata: RecordQueue<MetadataRecord>,
    store: ContentStore,
    identity: IdentityPool,
    policy: RetryPolicy,
    browser_config: crate::config::BrowserConfig,
    pacing: crate::config::PacingConfig,
    navigation_timeout: Duration,
}

impl BrowserWorker {
    pub fn new(queue: Arc<dyn DurableQueue>, config: &Config) -> Self {
        Self {
            frontier: FrontierStore::new(Arc::clone(&queue), &config.queue.frontier_key),
            metadata: RecordQueue::new(queue, &config.queue.metadata_key),
            store: ContentStore::new(&config.storage.root),
            identity: IdentityPool::new(),
            policy: RetryPolicy::from_config(&config.retry),
            browser_config: config.browser.clone(),
            pacing: config.pacing.clone(),
            navigation_timeout: Duration::from_secs(config.browser.navigation_timeout_secs),
        }
    }

    /// Drains the frontier through a recycled browser session
    ///
    /// Returns once the frontier is empty. Session launch failures are fatal;
    /// per-URL failures are recorded and skipped.
    pub async fn run(&self) -> Result<u64, ForagerError> {
        let mut session = BrowserSession::launch(&self.browser_config).await?;
        let mut processed = 0u64;
        let mut session_urls = 0u64;

        loop {
            let url = match self.frontier.dequeue_one().await? {
                Some(url) => url,
                None => {
                    tracing::info!("Frontier empty, browser worker stopping after {} URLs", processed);
                    break;
                }
            };

            self.process_url(&session.page, &url).await?;
            processed += 1;
            session_urls += 1;

            if session_urls >= self.pacing.max_urls_before_restart {
                tracing::info!(
                    "Recycling browser session after {} URLs",
                    session_urls
                );
                session.close().await;
                session = BrowserSession::launch(&self.browser_config).await?;
                session_urls = 0;
            }

            if self.pacing.pause_every > 0 && processed % self.pacing.pause_every == 0 {
                let pause = Duration::from_secs(self.pacing.pause_duration_secs);
                tracing::info!("Long pause for {:?} after {} URLs", pause, processed);
                sleep(pause).await;
            }

            let delay = rand::thread_rng()
                .gen_range(self.pacing.min_delay_ms..=self.pacing.max_delay_ms.max(self.pacing.min_delay_ms));
            sleep(Duration::from_millis(delay)).await;
        }

        session.close().await;
        Ok(processed)
    }

    /// Navigates, simulates a visitor, and persists the rendered document
    ///
    /// Queue failures propagate; everything else becomes a metadata record.
    async fn process_url(&self, page: &Page, url: &str) -> Result<(), ForagerError> {
        let domain = match Url::parse(url).ok().as_ref().and_then(domain_of) {
            Some(d) => d,
            None => {
                tracing::warn!("Dropping malformed frontier entry: {}", url);
                return Ok(());
            }
        };

        tracing::info!("Navigating to {}", url);
        let (load, user_agent) = self.load_with_retry(page, url).await;

        match load {
            LoadOutcome::Loaded { status } => {
                simulate_visitor(page).await;

                let markup = match page.content().await {
                    Ok(markup) => markup,
                    Err(e) => {
                        tracing::error!("Failed to read document for {}: {}", url, e);
                        let mut record = MetadataRecord::new(
                            url,
                            &domain,
                            "",
                            status,
                            FetchOutcome::NetworkError.as_status(),
                        );
                        record.user_agent = user_agent;
                        record.strategy = Some(FetchStrategy::Browser);
                        return self.metadata.push(&record).await.map_err(Into::into);
                    }
                };

                let cleaned = clean_html(&markup);
                let (artifact_path, crawl_status) = match self.store.save(&domain, url, &cleaned) {
                    Some(path) => (path, FetchOutcome::Success.as_status()),
                    None => (PathBuf::new(), "storage-error"),
                };

                let mut record = MetadataRecord::new(
                    url,
                    &domain,
                    &artifact_path.to_string_lossy(),
                    status,
                    crawl_status,
                );
                record.user_agent = user_agent;
                record.strategy = Some(FetchStrategy::Browser);
                self.metadata.push(&record).await?;
            }
            LoadOutcome::Failed { status, outcome } => {
                tracing::warn!(
                    "Giving up on {} ({}, status {:?})",
                    url,
                    outcome.as_status(),
                    status
                );
                let mut record =
                    MetadataRecord::new(url, &domain, "", status, outcome.as_status());
                record.user_agent = user_agent;
                record.strategy = Some(FetchStrategy::Browser);
                self.metadata.push(&record).await?;
            }
        }
        Ok(())
    }

    /// Attempts navigation with rotated identity and bounded backoff
    ///
    /// Returns the outcome plus the User-Agent presented on the final attempt.
    async fn load_with_retry(&self, page: &Page, url: &str) -> (LoadOutcome, String) {
        let max_attempts = self.policy.max_retries().max(1);
        let mut last_outcome = FetchOutcome::NetworkError;
        let mut last_status = None;
        let mut last_agent = String::new();

        for attempt in 0..max_attempts {
            let user_agent = self.identity.random_agent().to_string();
            last_agent = user_agent.clone();
            self.rotate_identity(page, &user_agent).await;
            self.replay_cookies(page).await;

            match self.navigate(page, url).await {
                Ok(status) => {
                    last_status = status;
                    match status {
                        Some(code) if self.policy.is_permanent(code) => {
                            tracing::error!("HTTP {} for {}, skipping retries", code, url);
                            return (
                                LoadOutcome::Failed {
                                    status: Some(code),
                                    outcome: FetchOutcome::HttpError,
                                },
                                user_agent,
                            );
                        }
                        Some(code) if code >= 400 => {
                            last_outcome = FetchOutcome::HttpError;
                        }
                        // Status unseen counts as loaded; the document arrived
                        _ => return (LoadOutcome::Loaded { status }, user_agent),
                    }
                }
                Err(ForagerError::BrowserSession(msg)) => {
                    tracing::warn!("Navigation deadline for {}: {}", url, msg);
                    last_outcome = FetchOutcome::Timeout;
                }
                Err(e) => {
                    tracing::warn!("Navigation error for {}: {}", url, e);
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

        (
            LoadOutcome::Failed {
                status: last_status,
                outcome: last_outcome,
            },
            last_agent,
        )
    }

    /// Presents a fresh header set for the next navigation; best effort
    async fn rotate_identity(&self, page: &Page, user_agent: &str) {
        let mut headers = serde_json::Map::new();
        for (name, value) in self.identity.header_set(user_agent) {
            headers.insert(name.to_string(), serde_json::Value::String(value));
        }
        let params =
            SetExtraHttpHeadersParams::new(Headers::new(serde_json::Value::Object(headers)));
        if let Err(e) = page.execute(params).await {
            tracing::warn!("Failed to rotate request headers: {}", e);
        }
    }

    /// Re-applies the session's current cookies; best effort
    async fn replay_cookies(&self, page: &Page) {
        let cookies = match page.get_cookies().await {
            Ok(cookies) => cookies,
            Err(e) => {
                tracing::warn!("Cookie read failed: {}", e);
                return;
            }
        };
        if cookies.is_empty() {
            return;
        }

        let params: Vec<CookieParam> = cookies
            .into_iter()
            .map(|c| {
                let mut param = CookieParam::new(c.name, c.value);
                param.domain = Some(c.domain);
                param.path = Some(c.path);
                param.secure = Some(c.secure);
                param.http_only = Some(c.http_only);
                param
            })
            .collect();
        if let Err(e) = page.set_cookies(params).await {
            tracing::warn!("Cookie replay failed: {}", e);
        }
    }

    /// Navigates with a deadline, capturing the document response status
    async fn navigate(&self, page: &Page, url: &str) -> Result<Option<u16>, ForagerError> {
        let mut responses = page.event_listener::<EventResponseReceived>().await?;
        let (status_tx, status_rx) = oneshot::channel::<u16>();

        let capture = tokio::spawn(async move {
            let deadline = sleep(STATUS_CAPTURE_WINDOW);
            tokio::pin!(deadline);
            loop {
                tokio::select! {
                    maybe = responses.next() => {
                        match maybe {
                            Some(event) => {
                                let mime = event.response.mime_type.to_lowercase();
                                if mime.starts_with("text/html")
                                    || mime.starts_with("application/xhtml+xml")
                                {
                                    let _ = status_tx.send(event.response.status as u16);
                                    break;
                                }
                            }
                            None => break,
                        }
                    }
                    _ = &mut deadline => break,
                }
            }
        });

        match timeout(self.navigation_timeout, page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                capture.abort();
                return Err(e.into());
            }
            Err(_) => {
                capture.abort();
                return Err(ForagerError::BrowserSession(format!(
                    "navigation exceeded {:?} for {}",
                    self.navigation_timeout, url
                )));
            }
        }

        match timeout(Duration::from_secs(5), status_rx).await {
            Ok(Ok(status)) => Ok(Some(status)),
            _ => {
                capture.abort();
                Ok(None)
            }
        }
    }
}
