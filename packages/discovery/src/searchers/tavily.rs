//! Tavily search provider.
//!
//! Tavily is an AI-optimized search API that can return full page
//! content alongside snippets, which makes it double as a scraper.
//! Reference: <https://docs.tavily.com/docs/tavily-api/rest_api>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use crate::error::{DiscoveryError, Result};
use crate::traits::searcher::{ContentSearcher, SearchDepth, SearchResponse};

/// Tavily allows between 1 and 20 results per request.
const MAX_RESULTS_CEILING: usize = 20;

/// Tavily API client.
pub struct TavilySearcher {
    client: Client,
    api_key: SecretString,
    base_url: String,
    timeout: Duration,
}

impl TavilySearcher {
    /// Create a client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: SecretString::from(api_key.into()),
            base_url: "https://api.tavily.com".to_string(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Set a custom base URL (for proxies and tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the per-request timeout (default: 30s).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl ContentSearcher for TavilySearcher {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        depth: SearchDepth,
    ) -> Result<SearchResponse> {
        // Tavily authenticates via the request body, not a header
        #[derive(Serialize)]
        struct SearchRequest<'a> {
            api_key: &'a str,
            query: &'a str,
            search_depth: &'static str,
            include_answer: bool,
            include_raw_content: bool,
            max_results: usize,
        }

        let request = SearchRequest {
            api_key: self.api_key.expose_secret(),
            query,
            search_depth: depth.as_str(),
            include_answer: true,
            include_raw_content: true,
            max_results: max_results.clamp(1, MAX_RESULTS_CEILING),
        };

        let response = self
            .client
            .post(format!("{}/search", self.base_url))
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| DiscoveryError::Search(Box::new(e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(DiscoveryError::Auth {
                provider: "tavily".to_string(),
            });
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DiscoveryError::RateLimited {
                provider: "tavily".to_string(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DiscoveryError::Search(
                format!("Tavily API error {status}: {body}").into(),
            ));
        }

        response
            .json::<SearchResponse>()
            .await
            .map_err(|e| DiscoveryError::Search(Box::new(e)))
    }
}
