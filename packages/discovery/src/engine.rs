//! Pipeline orchestrator: one URL in, one report out.
//!
//! Stages run strictly in order: scrape, extract, research (bounded
//! fan-out), persist (best-effort), compare, recommend, assemble.
//! Only a total scrape failure short-circuits; every later stage
//! degrades per-entity and the report always comes back with one
//! recommended action per discovered tool.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use futures::FutureExt;

use crate::bus::{PipelineBus, PipelineEvent};
use crate::compare::{compare, recommend};
use crate::error::{DiscoveryError, Result, SinkResult};
use crate::extract::ExtractorChain;
use crate::traits::registry::ToolRegistry;
use crate::traits::researcher::Researcher;
use crate::traits::searcher::{ContentSearcher, SearchDepth};
use crate::traits::sink::GraphSink;
use crate::types::entity::{Entity, EntityResearch};
use crate::types::report::{DiscoveryRecord, ExistingTool, PipelineReport, ToolComparison};

/// Engine identifier carried on every event and discovery record.
pub const ENGINE: &str = "link_scout";

/// Results requested when scraping a page through the search provider.
const SCRAPE_RESULT_LIMIT: usize = 5;

/// Timeout for the raw HTTP fallback fetch.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// User agent for the raw HTTP fallback fetch.
const USER_AGENT: &str = "toolscout/0.1";

/// Entities researched concurrently per run.
pub const DEFAULT_RESEARCH_CONCURRENCY: usize = 4;

/// Synthetic URL that drives a pipeline run for a bare tool name.
///
/// Sibling pipelines (video transcripts, social reels) discover tool
/// names without a page to point at; a search-results URL gives the
/// scrape stage something real to fetch.
pub fn research_url_for(tool_name: &str) -> String {
    format!(
        "https://www.google.com/search?q={}+API",
        tool_name.replace(' ', "+")
    )
}

/// The URL analysis engine.
///
/// Providers are injected so tests and deployments can swap any of
/// them; the bus, registry, and sink are optional and the pipeline
/// silently skips what isn't wired.
pub struct ScoutEngine {
    searcher: Arc<dyn ContentSearcher>,
    extractors: ExtractorChain,
    researcher: Arc<dyn Researcher>,
    registry: Option<Arc<dyn ToolRegistry>>,
    sink: Option<Arc<dyn GraphSink>>,
    bus: Option<PipelineBus>,
    http: reqwest::Client,
    research_concurrency: usize,
}

impl ScoutEngine {
    /// Create an engine over the core providers.
    pub fn new(
        searcher: Arc<dyn ContentSearcher>,
        extractors: ExtractorChain,
        researcher: Arc<dyn Researcher>,
    ) -> Self {
        Self {
            searcher,
            extractors,
            researcher,
            registry: None,
            sink: None,
            bus: None,
            http: reqwest::Client::new(),
            research_concurrency: DEFAULT_RESEARCH_CONCURRENCY,
        }
    }

    /// Compare discoveries against an existing-tool registry.
    pub fn with_registry(mut self, registry: Arc<dyn ToolRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Persist discoveries to a graph sink (best-effort).
    pub fn with_sink(mut self, sink: Arc<dyn GraphSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Publish progress events to a bus.
    pub fn with_bus(mut self, bus: PipelineBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Bound the research fan-out (default: 4, minimum 1).
    pub fn with_research_concurrency(mut self, concurrency: usize) -> Self {
        self.research_concurrency = concurrency.max(1);
        self
    }

    /// Handle to the engine's event bus, when one is wired.
    pub fn bus(&self) -> Option<PipelineBus> {
        self.bus.clone()
    }

    fn emit(&self, event: PipelineEvent) {
        if let Some(bus) = &self.bus {
            bus.publish(event);
        }
    }

    /// Analyze a URL end to end.
    ///
    /// Never fails: a page that cannot be fetched at all produces a
    /// report whose only populated field is `error`; every other
    /// provider failure degrades within its stage.
    pub async fn analyze(&self, url: &str) -> PipelineReport {
        let mut report = PipelineReport::new(url);

        // Step 1: scrape
        self.emit(PipelineEvent::step(ENGINE, "scrape", format!("Scraping {url}...")));
        let (page_text, page_title) = self.scrape_page(url).await;
        report.page_title = page_title;
        if page_text.is_empty() {
            tracing::warn!(url, "no content retrieved");
            report.error = Some("Could not retrieve page content.".to_string());
            self.emit(PipelineEvent::error(
                ENGINE,
                "scrape",
                format!("No content from {url}"),
            ));
            return report;
        }
        let scraped = if report.page_title.is_empty() {
            format!("Scraped {} chars", page_text.chars().count())
        } else {
            format!(
                "Scraped {} chars from \"{}\"",
                page_text.chars().count(),
                report.page_title
            )
        };
        self.emit(PipelineEvent::step(ENGINE, "scrape", scraped));

        self.run_stages(report, &page_text).await
    }

    /// Analyze text that arrived without a page to fetch.
    ///
    /// Sibling channels (video transcripts, reel captions) funnel in
    /// here: the same pipeline as [`ScoutEngine::analyze`] minus the
    /// scrape stage. `origin` labels the run in the report and the
    /// discovery record. Empty text yields an empty report, not an
    /// error.
    pub async fn analyze_text(&self, origin: &str, text: &str) -> PipelineReport {
        let report = PipelineReport::new(origin);
        self.run_stages(report, text).await
    }

    /// Extract through complete; everything after scrape.
    async fn run_stages(&self, mut report: PipelineReport, page_text: &str) -> PipelineReport {
        let url = report.url.clone();

        // Step 2: extract entities
        let cascade = self.describe_extractors();
        self.emit(PipelineEvent::step(
            ENGINE,
            "extract",
            format!("Extracting entities ({cascade})..."),
        ));
        let entities = self.extractors.extract(page_text).await;
        report.raw_entity_count = entities.len();
        tracing::info!(count = entities.len(), %url, "extracted entities");
        let names: Vec<String> = entities.iter().map(|e| e.name.clone()).collect();
        let preview = names
            .iter()
            .take(10)
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(", ");
        self.emit(
            PipelineEvent::step(
                ENGINE,
                "extract",
                format!("Extracted {} entities: {preview}", entities.len()),
            )
            .with_data(serde_json::json!({ "entities": names })),
        );

        // Step 3: research each entity, bounded fan-out, order preserved
        let total = entities.len();
        // Boxed and collected up front: holding the closure-typed stream
        // across an await trips rustc's higher-ranked Send check once this
        // future lands inside `tokio::spawn`. Constructing the futures is
        // side-effect-free; each body still runs only when polled, bounded
        // by `buffered`.
        let research_futures: Vec<futures::future::BoxFuture<'_, EntityResearch>> = entities
            .iter()
            .enumerate()
            .map(|(index, entity)| {
                async move {
                    self.emit(PipelineEvent::step(
                        ENGINE,
                        "research",
                        format!("Researching {} ({}/{total})...", entity.name, index + 1),
                    ));
                    self.researcher.research(entity).await
                }
                .boxed()
            })
            .collect();
        let researched: Vec<EntityResearch> = stream::iter(research_futures)
            .buffered(self.research_concurrency)
            .collect()
            .await;

        // Step 4: persist (best-effort)
        self.emit(PipelineEvent::step(
            ENGINE,
            "persist",
            format!("Storing {} tools in the graph...", researched.len()),
        ));
        match self.persist(&researched, &url, report.raw_entity_count).await {
            Ok(()) => self.emit(PipelineEvent::step(
                ENGINE,
                "persist",
                format!("Stored {} tools in the graph", researched.len()),
            )),
            Err(e) => {
                tracing::warn!(error = %e, "graph storage failed (non-fatal)");
                self.emit(PipelineEvent::error(
                    ENGINE,
                    "persist",
                    format!("Graph storage failed: {e}"),
                ));
            }
        }

        // Step 5: check against the existing-tool registry
        self.emit(PipelineEvent::step(
            ENGINE,
            "compare",
            "Comparing against existing registry tools...",
        ));
        let mut comparisons: Vec<ToolComparison> = Vec::new();
        for research in &researched {
            if let Some(existing) = self.check_existing(&research.entity).await {
                comparisons.push(compare(&research.tool, &existing));
            }
        }

        // Step 6: assemble
        report.discovered_tools = researched.iter().map(|r| r.tool.clone()).collect();
        report.recommended_actions = recommend(&researched, &comparisons);
        report.existing_alternatives = comparisons;

        self.emit(
            PipelineEvent::result(
                ENGINE,
                "complete",
                format!(
                    "Found {} tools, {} actions",
                    report.discovered_tools.len(),
                    report.recommended_actions.len()
                ),
            )
            .with_data(serde_json::json!({ "tool_count": report.discovered_tools.len() })),
        );

        report
    }

    /// Human-readable cascade description for the extract step event.
    fn describe_extractors(&self) -> String {
        let mut names = self.extractors.provider_names();
        names.push("keyword");
        names.join(" → ")
    }

    /// Fetch page text via the search provider, falling back to raw HTTP.
    ///
    /// The search provider's deep-extraction content is much cleaner
    /// than raw HTML for downstream extraction, so it goes first. The
    /// page title comes from the first result when available.
    async fn scrape_page(&self, url: &str) -> (String, String) {
        tracing::debug!(url, "scraping via search provider");

        match self
            .searcher
            .search(
                &format!("site:{url} OR tools APIs vendors"),
                SCRAPE_RESULT_LIMIT,
                SearchDepth::Advanced,
            )
            .await
        {
            Ok(response) => {
                let mut parts: Vec<String> = Vec::new();
                let mut page_title = String::new();
                if let Some(answer) = response.answer.as_deref() {
                    if !answer.is_empty() {
                        parts.push(answer.to_string());
                    }
                }
                for (index, hit) in response.results.iter().enumerate() {
                    if index == 0 && !hit.title.is_empty() {
                        page_title = hit.title.clone();
                    }
                    let text = hit.best_text();
                    if !text.is_empty() {
                        parts.push(text.to_string());
                    }
                }
                if !parts.is_empty() {
                    return (parts.join("\n\n"), page_title);
                }
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "search scrape failed, falling back to HTTP");
            }
        }

        match self.fetch_direct(url).await {
            Ok(body) => (body, String::new()),
            Err(e) => {
                tracing::error!(url, error = %e, "direct HTTP fetch failed");
                (String::new(), String::new())
            }
        }
    }

    async fn fetch_direct(&self, url: &str) -> Result<String> {
        let response = self
            .http
            .get(url)
            .header("User-Agent", USER_AGENT)
            .timeout(FETCH_TIMEOUT)
            .send()
            .await
            .map_err(|e| DiscoveryError::Http(Box::new(e)))?
            .error_for_status()
            .map_err(|e| DiscoveryError::Http(Box::new(e)))?;

        response
            .text()
            .await
            .map_err(|e| DiscoveryError::Http(Box::new(e)))
    }

    /// Write researched tools and the discovery record to the sink.
    async fn persist(
        &self,
        researched: &[EntityResearch],
        url: &str,
        entity_count: usize,
    ) -> SinkResult<()> {
        let Some(sink) = &self.sink else {
            tracing::debug!("no graph sink configured, skipping persist");
            return Ok(());
        };

        for research in researched {
            sink.upsert_tool(&research.tool).await?;
            tracing::debug!(tool = %research.tool.name, "stored tool");
        }

        let tool_names: Vec<String> = researched.iter().map(|r| r.tool.name.clone()).collect();
        if !tool_names.is_empty() && !url.is_empty() {
            let record = DiscoveryRecord::new(url, tool_names)
                .with_engine(ENGINE)
                .with_entity_count(entity_count);
            sink.log_discovery(&record).await?;
        }
        Ok(())
    }

    /// Look up an entity in the registry; lookup failures count as no match.
    async fn check_existing(&self, entity: &Entity) -> Option<ExistingTool> {
        let registry = self.registry.as_ref()?;
        match registry.lookup(&entity.name).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(entity = %entity.name, error = %e, "registry lookup failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::EventKind;
    use crate::sinks::MemorySink;
    use crate::testing::{sample_tool, FailingSink, MockRegistry, MockResearcher};
    use crate::traits::searcher::MockSearcher;
    use crate::types::report::{Action, ExistingTool};
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE_URL: &str = "https://lu.ma/hack-night";

    fn scrape_searcher() -> MockSearcher {
        // The scrape query embeds the URL itself
        MockSearcher::new().with_response(
            PAGE_URL,
            crate::traits::searcher::SearchResponse {
                answer: Some("A hack night built with Tavily.".to_string()),
                results: vec![crate::traits::searcher::SearchHit::new(PAGE_URL)
                    .with_title("Hack Night")
                    .with_raw_content("This project is built with Tavily and deployed on Vercel.")],
            },
        )
    }

    fn engine_with(searcher: MockSearcher) -> ScoutEngine {
        ScoutEngine::new(
            Arc::new(searcher),
            ExtractorChain::new(),
            Arc::new(MockResearcher::new().with_tool("Tavily", sample_tool("Tavily"))),
        )
    }

    #[tokio::test]
    async fn test_analyze_assembles_full_report() {
        let engine = engine_with(scrape_searcher());
        let report = engine.analyze(PAGE_URL).await;

        assert!(report.error.is_none());
        assert_eq!(report.url, PAGE_URL);
        assert_eq!(report.page_title, "Hack Night");
        assert!(report.raw_entity_count >= 2);
        let names: Vec<&str> = report
            .discovered_tools
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert!(names.contains(&"Tavily"));
        assert!(names.contains(&"Vercel"));
        // Assembly invariant: one action per tool
        assert_eq!(
            report.recommended_actions.len(),
            report.discovered_tools.len()
        );
    }

    #[tokio::test]
    async fn test_no_registry_means_integrate_priority_one() {
        let engine = engine_with(scrape_searcher());
        let report = engine.analyze(PAGE_URL).await;

        for action in &report.recommended_actions {
            assert_eq!(action.action, Action::Integrate);
            assert_eq!(action.priority, 1);
        }
    }

    #[tokio::test]
    async fn test_registry_match_produces_comparison() {
        let registry = MockRegistry::new().with_tool(
            ExistingTool::new("Tavily")
                .with_description("tavily-search: web search")
                .with_capabilities(vec!["search".to_string()]),
        );
        let engine = engine_with(scrape_searcher()).with_registry(Arc::new(registry));

        let report = engine.analyze(PAGE_URL).await;

        assert_eq!(report.existing_alternatives.len(), 1);
        let comp = &report.existing_alternatives[0];
        assert_eq!(comp.new_tool.name, "Tavily");
        // sample_tool has {search, extract} vs existing {search}
        assert_eq!(comp.overlap_score, 0.5);
        let tavily_action = report
            .recommended_actions
            .iter()
            .find(|a| a.tool_name == "Tavily")
            .unwrap();
        assert_eq!(tavily_action.action, Action::Integrate);
        assert_eq!(tavily_action.priority, 2);
    }

    #[tokio::test]
    async fn test_registry_failure_counts_as_no_match() {
        let engine = engine_with(scrape_searcher()).with_registry(Arc::new(MockRegistry::failing()));
        let report = engine.analyze(PAGE_URL).await;

        assert!(report.error.is_none());
        assert!(report.existing_alternatives.is_empty());
        assert!(report
            .recommended_actions
            .iter()
            .all(|a| a.action == Action::Integrate && a.priority == 1));
    }

    #[tokio::test]
    async fn test_scrape_total_failure_short_circuits() {
        // Search provider down, and the URL itself refuses connections
        let engine = engine_with(MockSearcher::new().failing());
        let report = engine.analyze("http://127.0.0.1:9/down").await;

        assert_eq!(
            report.error.as_deref(),
            Some("Could not retrieve page content.")
        );
        assert!(report.discovered_tools.is_empty());
        assert!(report.recommended_actions.is_empty());
        assert_eq!(report.raw_entity_count, 0);
    }

    #[tokio::test]
    async fn test_http_fallback_when_search_fails() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("User-Agent", "toolscout/0.1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("This site is powered by Supabase."),
            )
            .mount(&server)
            .await;

        let engine = engine_with(MockSearcher::new().failing());
        let report = engine.analyze(&server.uri()).await;

        assert!(report.error.is_none());
        assert!(report.page_title.is_empty());
        assert!(report
            .discovered_tools
            .iter()
            .any(|t| t.name == "Supabase"));
    }

    #[tokio::test]
    async fn test_empty_search_results_fall_back_to_http() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Built with Stripe."))
            .mount(&server)
            .await;

        // Searcher answers, but with nothing in it
        let engine = engine_with(MockSearcher::new());
        let report = engine.analyze(&server.uri()).await;

        assert!(report.discovered_tools.iter().any(|t| t.name == "Stripe"));
    }

    #[tokio::test]
    async fn test_sink_failure_is_non_fatal() {
        let bus = PipelineBus::new();
        let mut sub = bus.subscribe();
        let engine = engine_with(scrape_searcher())
            .with_sink(Arc::new(FailingSink::new()))
            .with_bus(bus);

        let report = engine.analyze(PAGE_URL).await;

        assert!(report.error.is_none());
        assert!(!report.discovered_tools.is_empty());

        let mut saw_persist_error = false;
        while let Some(event) = sub.try_recv() {
            if event.kind == EventKind::Error && event.step == "persist" {
                saw_persist_error = true;
            }
        }
        assert!(saw_persist_error);
    }

    #[tokio::test]
    async fn test_successful_run_persists_tools_and_record() {
        let sink = Arc::new(MemorySink::new());
        let engine = engine_with(scrape_searcher()).with_sink(sink.clone());

        engine.analyze(PAGE_URL).await;

        assert!(sink.tool("Tavily").is_some());
        let records = sink.discoveries();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source_url, PAGE_URL);
        assert_eq!(records[0].engine, ENGINE);
        assert!(records[0].tool_names.contains(&"Tavily".to_string()));
    }

    #[tokio::test]
    async fn test_rerun_does_not_accumulate_duplicates() {
        let sink = Arc::new(MemorySink::new());
        let engine = engine_with(scrape_searcher()).with_sink(sink.clone());

        let first = engine.analyze(PAGE_URL).await;
        let second = engine.analyze(PAGE_URL).await;

        let mut first_names: Vec<String> =
            first.discovered_tools.iter().map(|t| t.name.clone()).collect();
        let mut second_names: Vec<String> =
            second.discovered_tools.iter().map(|t| t.name.clone()).collect();
        first_names.sort();
        second_names.sort();
        assert_eq!(first_names, second_names);

        // Upserts keyed by name: same tool count after two runs
        assert_eq!(sink.tool_count(), first.discovered_tools.len());
    }

    #[tokio::test]
    async fn test_events_cover_every_stage() {
        let bus = PipelineBus::new();
        let mut sub = bus.subscribe();
        let engine = engine_with(scrape_searcher()).with_bus(bus);

        engine.analyze(PAGE_URL).await;

        let mut events = Vec::new();
        while let Some(event) = sub.try_recv() {
            events.push(event);
        }

        assert_eq!(events[0].step, "scrape");
        assert_eq!(events[0].message, format!("Scraping {PAGE_URL}..."));
        for stage in ["scrape", "extract", "research", "persist", "compare", "complete"] {
            assert!(
                events.iter().any(|e| e.step == stage),
                "missing stage event: {stage}"
            );
        }
        let last = events.last().unwrap();
        assert_eq!(last.kind, EventKind::Result);
        assert_eq!(last.step, "complete");
        assert!(last.data["tool_count"].is_u64());
        assert_eq!(last.engine, ENGINE);
    }

    #[tokio::test]
    async fn test_scrape_failure_emits_error_event() {
        let bus = PipelineBus::new();
        let mut sub = bus.subscribe();
        let engine = engine_with(MockSearcher::new().failing()).with_bus(bus);

        engine.analyze("http://127.0.0.1:9/down").await;

        let mut kinds = Vec::new();
        while let Some(event) = sub.try_recv() {
            kinds.push((event.kind, event.step));
        }
        assert!(kinds.contains(&(EventKind::Error, "scrape".to_string())));
        assert!(!kinds.iter().any(|(_, step)| step == "extract"));
    }

    #[tokio::test]
    async fn test_analyze_text_skips_scrape() {
        let bus = PipelineBus::new();
        let mut sub = bus.subscribe();
        let sink = Arc::new(MemorySink::new());
        let engine = engine_with(MockSearcher::new())
            .with_bus(bus)
            .with_sink(sink.clone());

        let report = engine
            .analyze_text("video:demo-42", "We built this with Supabase and Stripe.")
            .await;

        assert!(report.error.is_none());
        assert_eq!(report.url, "video:demo-42");
        let names: Vec<&str> = report
            .discovered_tools
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert!(names.contains(&"Supabase"));
        assert!(names.contains(&"Stripe"));
        assert_eq!(
            report.recommended_actions.len(),
            report.discovered_tools.len()
        );

        let mut steps = Vec::new();
        while let Some(event) = sub.try_recv() {
            steps.push(event.step);
        }
        assert_eq!(steps[0], "extract");
        assert!(!steps.iter().any(|s| s == "scrape"));

        // The discovery record carries the origin label, not a URL
        let records = sink.discoveries();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source_url, "video:demo-42");
    }

    #[tokio::test]
    async fn test_analyze_text_empty_input_yields_empty_report() {
        let engine = engine_with(MockSearcher::new());
        let report = engine.analyze_text("reel:1", "").await;

        assert!(report.error.is_none());
        assert!(report.discovered_tools.is_empty());
        assert!(report.recommended_actions.is_empty());
        assert_eq!(report.raw_entity_count, 0);
    }

    #[test]
    fn test_research_url_embeds_tool_name() {
        assert_eq!(
            research_url_for("Weights & Biases"),
            "https://www.google.com/search?q=Weights+&+Biases+API"
        );
        assert_eq!(
            research_url_for("Groq"),
            "https://www.google.com/search?q=Groq+API"
        );
    }
}
