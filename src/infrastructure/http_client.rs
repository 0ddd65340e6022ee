//! HTTP client for catalog crawling with rate limiting
//!
//! A thin reqwest wrapper that attaches the fixed request identity (user
//! agent, session cookies) to every call and throttles requests as a
//! courtesy to the remote server. Retrying is the caller's responsibility.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::{Context, Result};
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, direct::NotKeyed},
};
use reqwest::{
    Client, Response,
    header::{COOKIE, HeaderMap, HeaderValue, USER_AGENT},
};
use tracing::debug;

/// Request identity and throttling configuration.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct HttpClientConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_requests_per_second: u32,
    /// Session cookies sent with every request, name -> value.
    pub cookies: HashMap<String, String>,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("boardgame-keep/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_seconds: 30,
            max_requests_per_second: 2,
            cookies: HashMap::new(),
        }
    }
}

/// Rate-limited HTTP client carrying a fixed identity.
pub struct HttpClient {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    config: HttpClientConfig,
}

impl HttpClient {
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent).context("Invalid user agent")?,
        );
        if !config.cookies.is_empty() {
            let cookie_header = config
                .cookies
                .iter()
                .map(|(name, value)| format!("{name}={value}"))
                .collect::<Vec<_>>()
                .join("; ");
            headers.insert(
                COOKIE,
                HeaderValue::from_str(&cookie_header).context("Invalid session cookie")?,
            );
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("Failed to create HTTP client")?;

        let quota = Quota::per_second(
            NonZeroU32::new(config.max_requests_per_second)
                .context("Rate limit must be greater than 0")?,
        );

        Ok(Self {
            client,
            rate_limiter: RateLimiter::direct(quota),
            config,
        })
    }

    /// Issue one GET. The response is returned regardless of status so the
    /// caller can map status codes to its own error taxonomy.
    pub async fn get(&self, url: &str) -> Result<Response> {
        self.rate_limiter.until_ready().await;

        debug!("Fetching URL: {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch URL: {url}"))?;

        debug!("Fetched {} ({})", url, response.status());
        Ok(response)
    }

    /// Fetch a URL and return the body, failing on non-success statuses.
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let response = self.get(url).await?;
        if !response.status().is_success() {
            anyhow::bail!(
                "HTTP request failed with status {}: {}",
                response.status(),
                url
            );
        }
        response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from: {url}"))
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }
}
