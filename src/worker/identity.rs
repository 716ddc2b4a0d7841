//! Presented-identity rotation
//!
//! Workers rotate the User-Agent and browser-like header set they present so
//! repeated requests do not carry a single stable fingerprint. The pool is a
//! fixed set of current desktop browser identities.

use crate::config::ProxyConfig;
use rand::seq::SliceRandom;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::redirect::Policy;
use reqwest::{Client, Proxy};
use std::time::Duration;

/// Desktop browser User-Agent strings rotated per request/attempt
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36 Edg/125.0.0.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Safari/605.1.15",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:127.0) Gecko/20100101 Firefox/127.0",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64; rv:126.0) Gecko/20100101 Firefox/126.0",
];

const ACCEPT_VALUE: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.9";

/// Pool of presentable identities
#[derive(Debug, Clone, Default)]
pub struct IdentityPool;

impl IdentityPool {
    pub fn new() -> Self {
        Self
    }

    /// Picks a random User-Agent from the pool
    pub fn random_agent(&self) -> &'static str {
        USER_AGENTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(USER_AGENTS[0])
    }

    /// Browser-like header set presented alongside a User-Agent
    pub fn header_set(&self, user_agent: &str) -> Vec<(&'static str, String)> {
        vec![
            ("User-Agent", user_agent.to_string()),
            ("Accept", ACCEPT_VALUE.to_string()),
            ("Accept-Language", ACCEPT_LANGUAGE_VALUE.to_string()),
        ]
    }
}

/// Builds the light worker's HTTP client
///
/// Cookie store enabled so the client carries a continuing session; the
/// User-Agent is rotated per request, not fixed on the client.
pub fn build_http_client(proxy: Option<&ProxyConfig>) -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
    default_headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE),
    );

    let mut builder = Client::builder()
        .default_headers(default_headers)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .cookie_store(true)
        .gzip(true)
        .brotli(true);

    if let Some(proxy_cfg) = proxy {
        let mut proxy = Proxy::all(proxy_cfg.http_endpoint())?;
        if let (Some(user), Some(pass)) = (&proxy_cfg.username, &proxy_cfg.password) {
            proxy = proxy.basic_auth(user, pass);
        }
        tracing::info!("Routing light worker requests via {}", proxy_cfg.http_endpoint());
        builder = builder.proxy(proxy);
    }

    builder.build()
}
