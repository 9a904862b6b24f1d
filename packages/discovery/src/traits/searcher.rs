//! Content searcher trait for scrape and research.
//!
//! Both the scrape stage (pull a page's text) and the research stage
//! (gather evidence about one entity) go through the same search
//! capability. This trait abstracts over providers (Tavily, SerpAPI,
//! Brave, etc.) so the pipeline never knows which one is live.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// How thorough a search should be.
///
/// Advanced costs more but returns fuller page content; scrape and
/// research both want it, cheap lookups don't.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchDepth {
    Basic,
    Advanced,
}

impl SearchDepth {
    /// Wire name used in provider requests.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Advanced => "advanced",
        }
    }
}

/// One search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Result page title
    #[serde(default)]
    pub title: String,

    /// Result URL
    pub url: String,

    /// Extracted/snippet content for the result
    #[serde(default)]
    pub content: String,

    /// Full page text when the provider returns it
    #[serde(default)]
    pub raw_content: Option<String>,

    /// Provider relevance score, if any
    #[serde(default)]
    pub score: Option<f32>,
}

impl SearchHit {
    /// Create a hit for a URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            title: String::new(),
            url: url.into(),
            content: String::new(),
            raw_content: None,
            score: None,
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the snippet content.
    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    /// Set the full page text.
    pub fn with_raw_content(mut self, raw: impl Into<String>) -> Self {
        self.raw_content = Some(raw.into());
        self
    }

    /// Set the relevance score.
    pub fn with_score(mut self, score: f32) -> Self {
        self.score = Some(score);
        self
    }

    /// The best available text for this hit, preferring full page text.
    pub fn best_text(&self) -> &str {
        match &self.raw_content {
            Some(raw) if !raw.is_empty() => raw,
            _ => &self.content,
        }
    }
}

/// A full search response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Provider-synthesized answer, when requested and available
    #[serde(default)]
    pub answer: Option<String>,

    /// Ranked results
    #[serde(default)]
    pub results: Vec<SearchHit>,
}

impl SearchResponse {
    /// Concatenate all result text, separated by blank lines.
    pub fn combined_text(&self) -> String {
        self.results
            .iter()
            .map(|hit| hit.best_text())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// URLs of every result, in rank order.
    pub fn urls(&self) -> Vec<String> {
        self.results.iter().map(|hit| hit.url.clone()).collect()
    }
}

/// Content search trait.
///
/// # Implementations
///
/// - `TavilySearcher` - Tavily API
/// - `MockSearcher` - For testing
#[async_trait]
pub trait ContentSearcher: Send + Sync {
    /// Run a search and return the parsed response.
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        depth: SearchDepth,
    ) -> Result<SearchResponse>;
}

/// Mock content searcher for testing.
///
/// Matches canned responses by substring so tests don't have to
/// reproduce full query strings.
#[derive(Default)]
pub struct MockSearcher {
    responses: std::sync::RwLock<Vec<(String, SearchResponse)>>,
    fail_all: std::sync::atomic::AtomicBool,
}

impl MockSearcher {
    /// Create a new mock searcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a canned response for queries containing `needle`.
    pub fn with_response(self, needle: &str, response: SearchResponse) -> Self {
        self.responses
            .write()
            .unwrap()
            .push((needle.to_string(), response));
        self
    }

    /// Add a single-hit response whose content is `text`.
    pub fn with_page(self, needle: &str, url: &str, text: &str) -> Self {
        let response = SearchResponse {
            answer: None,
            results: vec![SearchHit::new(url).with_raw_content(text)],
        };
        self.with_response(needle, response)
    }

    /// Make every search fail (simulates provider outage).
    pub fn failing(self) -> Self {
        self.fail_all
            .store(true, std::sync::atomic::Ordering::SeqCst);
        self
    }
}

#[async_trait]
impl ContentSearcher for MockSearcher {
    async fn search(
        &self,
        query: &str,
        _max_results: usize,
        _depth: SearchDepth,
    ) -> Result<SearchResponse> {
        if self.fail_all.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(crate::error::DiscoveryError::Search(
                std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "mock outage").into(),
            ));
        }

        Ok(self
            .responses
            .read()
            .unwrap()
            .iter()
            .find(|(needle, _)| query.contains(needle.as_str()))
            .map(|(_, response)| response.clone())
            .unwrap_or_default())
    }
}
