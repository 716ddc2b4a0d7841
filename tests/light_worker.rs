//! Light worker end-to-end tests against a mock HTTP server

use forager::config::{Config, LightConfig, QueueConfig, RetryConfig};
use forager::queue::{FrontierStore, MemoryQueue, RecordQueue};
use forager::sites::SiteRules;
use forager::worker::LightWorker;
use forager::{CrawlResult, FetchOutcome, FetchStrategy};
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FRONTIER_KEY: &str = "test:frontier";
const RESULTS_KEY: &str = "test:results";

fn test_config() -> Config {
    test_config_with_batch(1)
}

fn test_config_with_batch(batch_size: usize) -> Config {
    Config {
        queue: QueueConfig {
            url: "redis://unused".to_string(),
            frontier_key: FRONTIER_KEY.to_string(),
            results_key: RESULTS_KEY.to_string(),
            metadata_key: "test:metadata".to_string(),
        },
        database: Default::default(),
        storage: Default::default(),
        sites: Default::default(),
        light: LightConfig {
            batch_size,
            idle_timeout_secs: 1,
            download_delay_ms: 0,
        },
        retry: RetryConfig {
            max_retries: 2,
            base_wait_secs: 1,
            no_retry_statuses: vec![404, 500],
        },
        browser: Default::default(),
        pacing: Default::default(),
        drain: Default::default(),
        proxy: None,
    }
}

/// Rules file granting the mock server's authority a product selector
fn rules_for(server: &MockServer) -> SiteRules {
    let authority = server.uri().trim_start_matches("http://").to_string();
    let json = format!(
        r##"{{ "website": [ {{ "domain": "{authority}", "selectors": {{ "SOURCE_PAGE": "#product" }} }} ] }}"##
    );
    SiteRules::from_json(&json).unwrap()
}

async fn run_worker_with_config(
    config: &Config,
    server_rules: SiteRules,
    urls: &[String],
) -> (u64, RecordQueue<CrawlResult>) {
    let queue = Arc::new(MemoryQueue::new());
    let frontier = FrontierStore::new(queue.clone(), FRONTIER_KEY);
    frontier.enqueue_if_absent(urls).await.unwrap();

    let worker = LightWorker::new(queue.clone(), server_rules, config).unwrap();
    let processed = worker.run().await.unwrap();

    (processed, RecordQueue::new(queue, RESULTS_KEY))
}

async fn run_worker(
    server_rules: SiteRules,
    urls: &[String],
) -> (u64, RecordQueue<CrawlResult>) {
    run_worker_with_config(&test_config(), server_rules, urls).await
}

#[tokio::test]
async fn successful_fetch_emits_extracted_fragment() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><body><div id='product'><h1>Widget</h1></div><footer>x</footer></body></html>",
        ))
        .mount(&server)
        .await;

    let url = format!("{}/p/1", server.uri());
    let (processed, results) = run_worker(rules_for(&server), &[url.clone()]).await;

    assert_eq!(processed, 1);
    let result = results.pop().await.unwrap().unwrap();
    assert_eq!(result.url, url);
    assert_eq!(result.outcome, FetchOutcome::Success);
    assert_eq!(result.http_status, Some(200));
    assert_eq!(result.strategy, FetchStrategy::Http);
    assert!(result.markup.contains("Widget"));
    assert!(!result.markup.contains("footer"));
    assert!(!result.user_agent.is_empty());
}

#[tokio::test]
async fn configured_batch_size_drains_multiple_claims_per_cycle() {
    let server = MockServer::start().await;
    for i in 0..3 {
        Mock::given(method("GET"))
            .and(path(format!("/p/{i}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(format!(
                "<div id='product'>item {i}</div>"
            )))
            .expect(1)
            .mount(&server)
            .await;
    }

    let urls: Vec<String> = (0..3).map(|i| format!("{}/p/{i}", server.uri())).collect();
    let config = test_config_with_batch(2);
    let (processed, results) =
        run_worker_with_config(&config, rules_for(&server), &urls).await;

    assert_eq!(processed, 3);
    for i in 0..3 {
        let result = results.pop().await.unwrap().unwrap();
        assert_eq!(result.outcome, FetchOutcome::Success);
        assert!(result.markup.contains(&format!("item {i}")));
    }
    assert!(results.pop().await.unwrap().is_none());
}

#[tokio::test]
async fn permanent_status_is_recorded_without_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/gone", server.uri());
    let (processed, results) = run_worker(rules_for(&server), &[url.clone()]).await;

    assert_eq!(processed, 1);
    let result = results.pop().await.unwrap().unwrap();
    assert_eq!(result.outcome, FetchOutcome::HttpError);
    assert_eq!(result.http_status, Some(404));
    assert!(result.markup.is_empty());
    // Mock expectation of exactly one request verifies on drop
}

#[tokio::test]
async fn unknown_domain_is_dropped_silently() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<div id='product'>x</div>"))
        .mount(&server)
        .await;

    let url = format!("{}/p/1", server.uri());
    let no_rules = SiteRules::from_json(r#"{ "website": [] }"#).unwrap();
    let (processed, results) = run_worker(no_rules, &[url]).await;

    assert_eq!(processed, 1);
    assert!(results.pop().await.unwrap().is_none());
}

#[tokio::test]
async fn selector_miss_drops_the_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/p/2"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html><body><p>no product</p></body></html>"),
        )
        .mount(&server)
        .await;

    let url = format!("{}/p/2", server.uri());
    let (processed, results) = run_worker(rules_for(&server), &[url]).await;

    assert_eq!(processed, 1);
    assert!(results.pop().await.unwrap().is_none());
}
