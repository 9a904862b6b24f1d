//! Integration tests for the discovery pipeline.
//!
//! These tests run the full engine through its public API:
//! 1. Scrape a page (mock search provider)
//! 2. Extract entities (provider chain with keyword fallback)
//! 3. Research each entity
//! 4. Persist to a sink and compare against a registry
//! 5. Assemble the report

use std::io::Write as _;
use std::sync::Arc;

use discovery::testing::{sample_tool, MockExtractor, MockResearcher};
use discovery::{
    Action, EventKind, ExtractorChain, FileRegistry, MemorySink, MockSearcher, PipelineBus,
    ScoutEngine, SearchHit, SearchResponse,
};

const PAGE_URL: &str = "https://devpost.com/software/toolscout";

/// A searcher that serves one canned page for the scrape query.
fn page_searcher(text: &str) -> MockSearcher {
    MockSearcher::new().with_response(
        PAGE_URL,
        SearchResponse {
            answer: None,
            results: vec![SearchHit::new(PAGE_URL)
                .with_title("ToolScout on Devpost")
                .with_raw_content(text)],
        },
    )
}

fn engine(searcher: MockSearcher) -> ScoutEngine {
    ScoutEngine::new(
        Arc::new(searcher),
        ExtractorChain::new(),
        Arc::new(MockResearcher::new().with_tool("Tavily", sample_tool("Tavily"))),
    )
}

#[tokio::test]
async fn test_full_pipeline_produces_report() {
    let sink = Arc::new(MemorySink::new());
    let searcher = page_searcher("Built with Tavily for search and Neo4j for storage.");
    let engine = engine(searcher).with_sink(sink.clone());

    let report = engine.analyze(PAGE_URL).await;

    assert!(report.error.is_none());
    assert_eq!(report.url, PAGE_URL);
    assert_eq!(report.page_title, "ToolScout on Devpost");

    let names: Vec<&str> = report
        .discovered_tools
        .iter()
        .map(|t| t.name.as_str())
        .collect();
    assert!(names.contains(&"Tavily"));
    assert!(names.contains(&"Neo4j"));

    // One recommendation per tool, stubs included
    assert_eq!(
        report.recommended_actions.len(),
        report.discovered_tools.len()
    );

    // Everything researched was persisted, plus one discovery record
    assert_eq!(sink.tool_count(), report.discovered_tools.len());
    let records = sink.discoveries();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].source_url, PAGE_URL);
    assert_eq!(records[0].entity_count, report.raw_entity_count);
}

#[tokio::test]
async fn test_unreachable_page_is_the_only_fatal_failure() {
    let engine = engine(MockSearcher::new().failing());
    let report = engine.analyze("http://127.0.0.1:9/nowhere").await;

    assert!(report.is_error());
    assert_eq!(
        report.error.as_deref(),
        Some("Could not retrieve page content.")
    );
    assert!(report.discovered_tools.is_empty());
    assert!(report.recommended_actions.is_empty());
}

#[tokio::test]
async fn test_failing_providers_degrade_to_keyword_scan() {
    let searcher = page_searcher("The demo is deployed on Vercel and bills through Stripe.");
    let chain = ExtractorChain::new()
        .with_provider(Arc::new(MockExtractor::failing("fastino")))
        .with_provider(Arc::new(MockExtractor::failing("reka")));
    let engine = ScoutEngine::new(
        Arc::new(searcher),
        chain,
        Arc::new(MockResearcher::new()),
    );

    let report = engine.analyze(PAGE_URL).await;

    assert!(report.error.is_none());
    let names: Vec<&str> = report
        .discovered_tools
        .iter()
        .map(|t| t.name.as_str())
        .collect();
    assert!(names.contains(&"Vercel"));
    assert!(names.contains(&"Stripe"));
    // Research never ran a real search, so these are stub profiles
    assert!(report.discovered_tools.iter().all(|t| t.is_stub()));
    assert!(report
        .recommended_actions
        .iter()
        .all(|a| a.action == Action::Integrate && a.priority == 1));
}

#[tokio::test]
async fn test_catalog_file_drives_skip_recommendation() {
    let mut catalog = tempfile::NamedTempFile::new().unwrap();
    writeln!(catalog, "# Integrated Tools").unwrap();
    writeln!(
        catalog,
        "- tavily: Web search API for agents (capabilities: search, extract)"
    )
    .unwrap();

    let searcher = page_searcher("Search powered by Tavily.");
    let registry = FileRegistry::new(catalog.path());
    let engine = engine(searcher).with_registry(Arc::new(registry));

    let report = engine.analyze(PAGE_URL).await;

    assert_eq!(report.existing_alternatives.len(), 1);
    let comparison = &report.existing_alternatives[0];
    assert_eq!(comparison.overlap_score, 1.0);
    assert!(comparison.new_capabilities.is_empty());

    let action = report
        .recommended_actions
        .iter()
        .find(|a| a.tool_name == "Tavily")
        .unwrap();
    assert_eq!(action.action, Action::Skip);
    assert_eq!(action.priority, 3);
    assert!(action.reason.contains("High overlap (100%)"));
}

#[tokio::test]
async fn test_bus_subscribers_see_stage_progression() {
    let bus = PipelineBus::new();
    let mut sub = bus.subscribe();

    let searcher = page_searcher("Built with Tavily.");
    let engine = engine(searcher).with_bus(bus.clone());

    engine.analyze(PAGE_URL).await;

    let mut steps = Vec::new();
    let mut saw_complete_payload = false;
    while let Some(event) = sub.try_recv() {
        if event.kind == EventKind::Result && event.step == "complete" {
            saw_complete_payload = event.data["tool_count"].is_u64();
        }
        steps.push(event.step);
    }

    // Stages arrive in pipeline order
    let order = ["scrape", "extract", "research", "persist", "compare", "complete"];
    let mut last_position = 0;
    for step in &steps {
        let position = order.iter().position(|s| s == step).unwrap();
        assert!(
            position >= last_position,
            "stage {step} arrived out of order in {steps:?}"
        );
        last_position = position;
    }
    assert!(saw_complete_payload);

    // History replay serves the same run to late subscribers
    let replay = bus.recent_history(50);
    assert_eq!(replay.len(), steps.len());
}

#[tokio::test]
async fn test_text_funnel_reaches_the_same_sink() {
    let sink = Arc::new(MemorySink::new());
    let engine = ScoutEngine::new(
        Arc::new(MockSearcher::new()),
        ExtractorChain::new(),
        Arc::new(MockResearcher::new()),
    )
    .with_sink(sink.clone());

    let report = engine
        .analyze_text("video:yt-9f2k", "In this demo we wire up Supabase auth.")
        .await;

    assert!(report.error.is_none());
    assert!(report.discovered_tools.iter().any(|t| t.name == "Supabase"));
    assert!(sink.tool("Supabase").is_some());
    assert_eq!(sink.discoveries()[0].source_url, "video:yt-9f2k");
}
