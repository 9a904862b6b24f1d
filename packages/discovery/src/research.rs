//! Per-entity research: search the web, structure what comes back.
//!
//! Research never fails. Provider outages, empty results, and parse
//! errors all degrade to a stub profile carrying just the entity name,
//! so one flaky entity can't sink a whole pipeline run.

use std::sync::Arc;

use async_trait::async_trait;

use crate::extract::truncate_chars;
use crate::traits::researcher::{ProfileParser, Researcher};
use crate::traits::searcher::{ContentSearcher, SearchDepth};
use crate::types::entity::{DiscoveredTool, Entity, EntityResearch};

/// Results requested per research query.
const RESEARCH_RESULT_LIMIT: usize = 8;

/// Raw research text kept on the report, in chars.
const RESEARCH_CHAR_BUDGET: usize = 4_000;

/// Researches entities through a content searcher and profile parser.
pub struct SearchResearcher {
    searcher: Arc<dyn ContentSearcher>,
    parser: Arc<dyn ProfileParser>,
}

impl SearchResearcher {
    /// Create a researcher over the given providers.
    pub fn new(searcher: Arc<dyn ContentSearcher>, parser: Arc<dyn ProfileParser>) -> Self {
        Self { searcher, parser }
    }
}

#[async_trait]
impl Researcher for SearchResearcher {
    async fn research(&self, entity: &Entity) -> EntityResearch {
        tracing::debug!(entity = %entity.name, "researching entity");

        let query = format!(
            "{} API documentation pricing free tier authentication \
             capabilities integrations developer",
            entity.name
        );

        let mut raw_text = String::new();
        let mut sources: Vec<String> = Vec::new();
        let mut tool = DiscoveredTool::stub(&entity.name);

        match self
            .searcher
            .search(&query, RESEARCH_RESULT_LIMIT, SearchDepth::Advanced)
            .await
        {
            Ok(response) => {
                if let Some(answer) = response.answer.as_deref() {
                    if !answer.is_empty() {
                        raw_text.push_str(answer);
                    }
                }
                for hit in &response.results {
                    sources.push(hit.url.clone());
                    raw_text.push('\n');
                    raw_text.push_str(&hit.content);
                }

                match self.parser.parse_profile(entity, &raw_text).await {
                    Ok(parsed) => tool = parsed,
                    Err(e) => {
                        tracing::warn!(
                            entity = %entity.name,
                            error = %e,
                            "could not parse research, using stub"
                        );
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    entity = %entity.name,
                    error = %e,
                    "research search failed, using stub"
                );
            }
        }

        let raw_research = truncate_chars(&raw_text, RESEARCH_CHAR_BUDGET).to_string();

        EntityResearch {
            entity: entity.clone(),
            tool,
            raw_research,
            sources,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_entity, sample_tool, MockParser};
    use crate::traits::searcher::{MockSearcher, SearchHit, SearchResponse};

    fn canned_search() -> SearchResponse {
        SearchResponse {
            answer: Some("Tavily is a search API built for AI agents.".to_string()),
            results: vec![
                SearchHit::new("https://docs.tavily.com")
                    .with_title("Tavily Docs")
                    .with_content("Authentication uses API keys."),
                SearchHit::new("https://tavily.com/pricing")
                    .with_content("Free tier: 1000 requests per month."),
            ],
        }
    }

    #[tokio::test]
    async fn test_research_builds_profile_from_search() {
        let searcher = Arc::new(MockSearcher::new().with_response("Tavily", canned_search()));
        let parser = Arc::new(MockParser::new().with_profile("Tavily", sample_tool("Tavily")));
        let researcher = SearchResearcher::new(searcher, parser);

        let research = researcher.research(&sample_entity("Tavily")).await;

        assert_eq!(research.tool.name, "Tavily");
        assert!(research.tool.has_free_tier);
        assert_eq!(
            research.sources,
            vec!["https://docs.tavily.com", "https://tavily.com/pricing"]
        );
        assert!(research.raw_research.starts_with("Tavily is a search API"));
        assert!(research.raw_research.contains("Free tier"));
    }

    #[tokio::test]
    async fn test_search_failure_degrades_to_stub() {
        let searcher = Arc::new(MockSearcher::new().failing());
        let parser = Arc::new(MockParser::new());
        let researcher = SearchResearcher::new(searcher, parser);

        let research = researcher.research(&sample_entity("Mystery")).await;

        assert!(research.tool.is_stub());
        assert_eq!(research.tool.name, "Mystery");
        assert!(research.sources.is_empty());
        assert!(research.raw_research.is_empty());
    }

    #[tokio::test]
    async fn test_parse_failure_keeps_search_evidence() {
        let searcher = Arc::new(MockSearcher::new().with_response("Tavily", canned_search()));
        let parser = Arc::new(MockParser::failing());
        let researcher = SearchResearcher::new(searcher, parser);

        let research = researcher.research(&sample_entity("Tavily")).await;

        // Stub profile, but the gathered text and sources survive
        assert!(research.tool.is_stub());
        assert_eq!(research.sources.len(), 2);
        assert!(research.raw_research.contains("API keys"));
    }

    #[tokio::test]
    async fn test_raw_research_is_bounded() {
        let big = "x".repeat(10_000);
        let response = SearchResponse {
            answer: None,
            results: vec![SearchHit::new("https://a.com").with_content(&big)],
        };
        let searcher = Arc::new(MockSearcher::new().with_response("Big", response));
        let researcher = SearchResearcher::new(searcher, Arc::new(MockParser::new()));

        let research = researcher.research(&sample_entity("Big")).await;
        assert_eq!(research.raw_research.chars().count(), RESEARCH_CHAR_BUDGET);
    }
}
