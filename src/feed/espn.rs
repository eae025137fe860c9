//! Game feed backed by ESPN's public site API. No API key required.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::Rng;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::cache::TtlCache;
use super::provider::GameFeed;

const DEFAULT_BASE_URL: &str = "https://site.api.espn.com/apis/site/v2/sports/football/nfl";
const INITIAL_BACKOFF_MS: u64 = 250;

pub struct EspnFeed {
    http: Client,
    /// Base URL for overriding in tests
    base_url: String,
    cache: TtlCache,
    max_retries: u32,
}

impl EspnFeed {
    pub fn new(base_url: Option<&str>, cache_ttl: Duration, max_retries: u32) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(EspnFeed {
            http,
            base_url: base_url.unwrap_or(DEFAULT_BASE_URL).to_string(),
            cache: TtlCache::new(cache_ttl),
            max_retries,
        })
    }

    /// GET a JSON document, serving repeats from the TTL cache and retrying
    /// transient failures with exponential backoff plus jitter.
    async fn get_json(&self, url: &str) -> Result<Value> {
        if let Some(cached) = self.cache.get(url) {
            debug!("Cache hit: {}", url);
            return Ok(cached);
        }

        let mut attempt = 0u32;
        loop {
            match self.try_get(url).await {
                Ok(value) => {
                    self.cache.insert(url, value.clone());
                    return Ok(value);
                }
                Err(e) if attempt < self.max_retries => {
                    let backoff = INITIAL_BACKOFF_MS << attempt;
                    let jitter = rand::thread_rng().gen_range(0..100);
                    warn!(
                        "Fetch failed (attempt {}/{}), retrying in {}ms: {}",
                        attempt + 1,
                        self.max_retries,
                        backoff + jitter,
                        e
                    );
                    tokio::time::sleep(Duration::from_millis(backoff + jitter)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn try_get(&self, url: &str) -> Result<Value> {
        debug!("Fetching {}", url);
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request failed: {url}"))?;

        if !resp.status().is_success() {
            anyhow::bail!("Upstream error {} for {}", resp.status(), url);
        }

        resp.json()
            .await
            .with_context(|| format!("Failed to parse response from {url}"))
    }
}

#[async_trait]
impl GameFeed for EspnFeed {
    fn name(&self) -> &str {
        "ESPN"
    }

    async fn fetch_scoreboard(&self) -> Result<Value> {
        self.get_json(&format!("{}/scoreboard", self.base_url)).await
    }

    async fn fetch_summary(&self, game_id: &str) -> Result<Value> {
        self.get_json(&format!("{}/summary?event={}", self.base_url, game_id))
            .await
    }

    async fn fetch_plays(&self, game_id: &str) -> Result<Value> {
        self.get_json(&format!("{}/playbyplay?event={}", self.base_url, game_id))
            .await
    }
}
