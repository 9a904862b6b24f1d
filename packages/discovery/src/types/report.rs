//! Report types - comparisons, recommendations, and the aggregate report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::DiscoveredTool;

/// A tool already present in the local registry.
///
/// Read-only comparison target sourced from the registry lookup;
/// `config_path` records where the match came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExistingTool {
    /// Registered tool name
    pub name: String,

    /// Description from the registry listing
    #[serde(default)]
    pub description: String,

    /// Capability tags the registry knows about
    #[serde(default)]
    pub capabilities: Vec<String>,

    /// File or directory the match was found in
    #[serde(default)]
    pub config_path: String,
}

impl ExistingTool {
    /// Create a registry entry with just a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            capabilities: Vec::new(),
            config_path: String::new(),
        }
    }

    /// Set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the capability tags.
    pub fn with_capabilities(mut self, capabilities: Vec<String>) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Set the provenance path.
    pub fn with_config_path(mut self, path: impl Into<String>) -> Self {
        self.config_path = path.into();
        self
    }
}

/// Derived relationship between one discovered tool and one existing tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolComparison {
    /// The newly discovered tool
    pub new_tool: DiscoveredTool,

    /// The registry tool it was matched against
    pub existing_tool: ExistingTool,

    /// Capability overlap, 0.0 to 1.0, rounded to 2 decimals
    pub overlap_score: f64,

    /// Capabilities the new tool has that the existing one lacks
    pub new_capabilities: Vec<String>,

    /// Free-form comparison notes
    #[serde(default)]
    pub notes: String,
}

/// What to do about a discovered tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Integrate,
    Replace,
    Skip,
    Evaluate,
}

impl Action {
    /// Wire name used in serialized payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Integrate => "integrate",
            Self::Replace => "replace",
            Self::Skip => "skip",
            Self::Evaluate => "evaluate",
        }
    }
}

/// One recommendation per discovered tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendedAction {
    /// Name of the discovered tool this applies to
    pub tool_name: String,

    /// The recommended action
    pub action: Action,

    /// Human-readable justification
    pub reason: String,

    /// 1 = high, 2 = medium, 3 = low
    pub priority: u8,
}

/// The aggregate result of one `analyze` call.
///
/// Invariant: in a completed report every discovered tool has exactly
/// one recommended action, so
/// `recommended_actions.len() == discovered_tools.len()`. The `error`
/// field is reserved for total pipeline failure (the page could not be
/// fetched at all), never for partial degradation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    /// The analyzed URL
    pub url: String,

    /// When the analysis ran
    pub scraped_at: DateTime<Utc>,

    /// Page title, best-effort
    #[serde(default)]
    pub page_title: String,

    /// Every tool discovered on the page, researched or stubbed
    #[serde(default)]
    pub discovered_tools: Vec<DiscoveredTool>,

    /// Comparisons against registry matches (only tools that matched)
    #[serde(default)]
    pub existing_alternatives: Vec<ToolComparison>,

    /// One recommendation per discovered tool
    #[serde(default)]
    pub recommended_actions: Vec<RecommendedAction>,

    /// How many raw entities extraction found before research
    #[serde(default)]
    pub raw_entity_count: usize,

    /// Set only when the whole pipeline failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PipelineReport {
    /// Create an empty report for a URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            scraped_at: Utc::now(),
            page_title: String::new(),
            discovered_tools: Vec::new(),
            existing_alternatives: Vec::new(),
            recommended_actions: Vec::new(),
            raw_entity_count: 0,
            error: None,
        }
    }

    /// Create the short-circuit report for a page that could not be fetched.
    pub fn failed(url: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::new(url)
        }
    }

    /// True when the pipeline short-circuited before extraction.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Where a discovery run originated, inferred from the input URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Luma,
    Youtube,
    Instagram,
    Manual,
}

impl SourceKind {
    /// Infer the source from a URL's shape.
    pub fn infer(url: &str) -> Self {
        let lowered = url.to_lowercase();
        if lowered.contains("lu.ma") || lowered.contains("luma") {
            Self::Luma
        } else if lowered.contains("youtube.com") || lowered.contains("youtu.be") {
            Self::Youtube
        } else if lowered.contains("instagram.com") {
            Self::Instagram
        } else {
            Self::Manual
        }
    }

    /// Wire name used in sink payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Luma => "luma",
            Self::Youtube => "youtube",
            Self::Instagram => "instagram",
            Self::Manual => "manual",
        }
    }
}

/// What one pipeline run discovered, as handed to the graph sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryRecord {
    /// URL the run analyzed
    pub source_url: String,

    /// Inferred source channel
    pub source_kind: SourceKind,

    /// Which engine ran the discovery
    pub engine: String,

    /// Raw entity count before research/dedup filtering
    pub entity_count: usize,

    /// Names of the tools upserted by this run
    pub tool_names: Vec<String>,

    /// When the run happened
    pub occurred_at: DateTime<Utc>,
}

impl DiscoveryRecord {
    /// Build a record for a run that discovered the given tools.
    pub fn new(source_url: impl Into<String>, tool_names: Vec<String>) -> Self {
        let source_url = source_url.into();
        let source_kind = SourceKind::infer(&source_url);
        Self {
            source_url,
            source_kind,
            engine: String::new(),
            entity_count: tool_names.len(),
            tool_names,
            occurred_at: Utc::now(),
        }
    }

    /// Set the engine identifier.
    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = engine.into();
        self
    }

    /// Set the raw entity count.
    pub fn with_entity_count(mut self, count: usize) -> Self {
        self.entity_count = count;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_wire_name() {
        assert_eq!(serde_json::to_string(&Action::Integrate).unwrap(), "\"integrate\"");
        assert_eq!(Action::Evaluate.as_str(), "evaluate");
    }

    #[test]
    fn test_failed_report_shape() {
        let report = PipelineReport::failed("https://example.com", "fetch failed");
        assert!(report.is_error());
        assert!(report.discovered_tools.is_empty());
        assert!(report.recommended_actions.is_empty());
        assert_eq!(report.raw_entity_count, 0);
    }

    #[test]
    fn test_error_field_omitted_when_none() {
        let report = PipelineReport::new("https://example.com");
        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_source_kind_infer() {
        assert_eq!(SourceKind::infer("https://lu.ma/ai-meetup"), SourceKind::Luma);
        assert_eq!(SourceKind::infer("https://youtu.be/abc"), SourceKind::Youtube);
        assert_eq!(
            SourceKind::infer("https://www.instagram.com/reel/xyz"),
            SourceKind::Instagram
        );
        assert_eq!(SourceKind::infer("https://example.com"), SourceKind::Manual);
    }
}
