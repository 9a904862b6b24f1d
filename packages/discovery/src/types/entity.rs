//! Entity types - raw mentions and researched tool profiles.

use serde::{Deserialize, Serialize};

/// Classification of a raw entity mention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Tool,
    Vendor,
    Api,
    Library,
}

impl EntityKind {
    /// Parse a provider-supplied type string, defaulting to `Tool`.
    ///
    /// Providers disagree on labels ("API", "sdk", "service"), so this
    /// is deliberately forgiving.
    pub fn parse_loose(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "vendor" | "company" | "service" => Self::Vendor,
            "api" => Self::Api,
            "library" | "sdk" | "framework" | "package" => Self::Library,
            _ => Self::Tool,
        }
    }

    /// Wire name used in serialized payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tool => "tool",
            Self::Vendor => "vendor",
            Self::Api => "api",
            Self::Library => "library",
        }
    }
}

/// A raw candidate name pulled from page text.
///
/// Entities are unverified: the name is free text, not yet canonical.
/// Created by the extraction stage and consumed by research; never
/// mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Candidate tool/vendor name as it appeared
    pub name: String,

    /// What kind of thing the extractor believes this is
    #[serde(rename = "entity_type")]
    pub kind: EntityKind,

    /// Snippet of the text the name was pulled from
    #[serde(default)]
    pub raw_mention: String,

    /// Extractor confidence, 0.0 to 1.0
    #[serde(default = "default_confidence")]
    pub confidence: f32,
}

fn default_confidence() -> f32 {
    1.0
}

impl Entity {
    /// Create a new entity with the given name and kind.
    ///
    /// Confidence starts at 1.0; extractors that are guessing lower it.
    pub fn new(name: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            name: name.into(),
            kind,
            raw_mention: String::new(),
            confidence: 1.0,
        }
    }

    /// Set the provenance snippet.
    pub fn with_mention(mut self, mention: impl Into<String>) -> Self {
        self.raw_mention = mention.into();
        self
    }

    /// Set the extractor confidence.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence.clamp(0.0, 1.0);
        self
    }
}

/// How a tool's API authenticates callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthType {
    #[serde(rename = "api_key")]
    ApiKey,
    #[serde(rename = "oauth")]
    OAuth,
    #[serde(rename = "none")]
    None,
    #[serde(rename = "unknown")]
    Unknown,
}

impl AuthType {
    /// Parse a provider-supplied auth label, defaulting to `Unknown`.
    pub fn parse_loose(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase();
        if normalized.contains("oauth") {
            Self::OAuth
        } else if normalized.contains("key") || normalized.contains("token") {
            Self::ApiKey
        } else if normalized == "none" || normalized == "open" || normalized == "no auth" {
            Self::None
        } else {
            Self::Unknown
        }
    }
}

impl Default for AuthType {
    fn default() -> Self {
        Self::Unknown
    }
}

/// The enriched, canonical profile of an entity after research.
///
/// Never mutated after creation — a re-run produces a new value.
/// Fields the research could not fill stay empty rather than `None`
/// so downstream stages never null-check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveredTool {
    /// Canonical tool name
    pub name: String,

    /// Vendor/company behind the tool
    #[serde(default)]
    pub vendor: String,

    /// One-line description
    #[serde(default)]
    pub description: String,

    /// Base API endpoint if known
    #[serde(default)]
    pub api_url: String,

    /// Capability tags (search, ocr, rerank, ...)
    #[serde(default)]
    pub capabilities: Vec<String>,

    /// How the API authenticates
    #[serde(default)]
    pub auth_type: AuthType,

    /// Whether a free tier exists
    #[serde(default)]
    pub has_free_tier: bool,

    /// Pricing page URL
    #[serde(default)]
    pub pricing_url: String,

    /// Documentation URL
    #[serde(default)]
    pub docs_url: String,
}

impl DiscoveredTool {
    /// Create a minimal profile carrying only the name.
    ///
    /// This is the research-failure fallback: the tool still flows
    /// through comparison and recommendation with empty fields.
    pub fn stub(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vendor: String::new(),
            description: String::new(),
            api_url: String::new(),
            capabilities: Vec::new(),
            auth_type: AuthType::Unknown,
            has_free_tier: false,
            pricing_url: String::new(),
            docs_url: String::new(),
        }
    }

    /// Set the vendor.
    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = vendor.into();
        self
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

    /// Set the auth type.
    pub fn with_auth_type(mut self, auth_type: AuthType) -> Self {
        self.auth_type = auth_type;
        self
    }

    /// Mark whether a free tier exists.
    pub fn with_free_tier(mut self, has_free_tier: bool) -> Self {
        self.has_free_tier = has_free_tier;
        self
    }

    /// True when research filled nothing beyond the name.
    pub fn is_stub(&self) -> bool {
        self.vendor.is_empty()
            && self.description.is_empty()
            && self.api_url.is_empty()
            && self.capabilities.is_empty()
    }
}

/// The full output of researching one entity.
///
/// Pairs the raw entity with its researched profile plus the evidence
/// the profile was parsed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityResearch {
    /// The entity that was researched
    pub entity: Entity,

    /// The structured profile the research produced
    pub tool: DiscoveredTool,

    /// Concatenated search-result text the profile was parsed from,
    /// truncated for storage
    #[serde(default)]
    pub raw_research: String,

    /// URLs of the search results that contributed
    #[serde(default)]
    pub sources: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_kind_wire_name() {
        let entity = Entity::new("Tavily", EntityKind::Api);
        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["entity_type"], "api");
    }

    #[test]
    fn test_entity_kind_parse_loose() {
        assert_eq!(EntityKind::parse_loose("API"), EntityKind::Api);
        assert_eq!(EntityKind::parse_loose("sdk"), EntityKind::Library);
        assert_eq!(EntityKind::parse_loose("company"), EntityKind::Vendor);
        assert_eq!(EntityKind::parse_loose("whatever"), EntityKind::Tool);
    }

    #[test]
    fn test_auth_type_parse_loose() {
        assert_eq!(AuthType::parse_loose("api_key"), AuthType::ApiKey);
        assert_eq!(AuthType::parse_loose("Bearer token"), AuthType::ApiKey);
        assert_eq!(AuthType::parse_loose("OAuth 2.0"), AuthType::OAuth);
        assert_eq!(AuthType::parse_loose("none"), AuthType::None);
        assert_eq!(AuthType::parse_loose("???"), AuthType::Unknown);
    }

    #[test]
    fn test_auth_type_wire_name() {
        let json = serde_json::to_string(&AuthType::ApiKey).unwrap();
        assert_eq!(json, "\"api_key\"");
    }

    #[test]
    fn test_stub_is_stub() {
        let tool = DiscoveredTool::stub("Reka AI");
        assert_eq!(tool.name, "Reka AI");
        assert!(tool.is_stub());
        assert_eq!(tool.auth_type, AuthType::Unknown);
        assert!(!tool.has_free_tier);
    }

    #[test]
    fn test_builder_clears_stub() {
        let tool = DiscoveredTool::stub("Tavily")
            .with_vendor("Tavily Inc")
            .with_capabilities(vec!["search".into(), "extract".into()]);
        assert!(!tool.is_stub());
        assert_eq!(tool.capabilities.len(), 2);
    }

    #[test]
    fn test_confidence_clamped() {
        let entity = Entity::new("X", EntityKind::Tool).with_confidence(1.7);
        assert_eq!(entity.confidence, 1.0);
    }
}
