//! Fastino provider adapter.
//!
//! Fastino serves a GLiNER2-style extraction model behind an
//! OpenAI-compatible chat endpoint (`choices` response shape). It is
//! the preferred entity extractor and also the parser that structures
//! research text into tool profiles.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{DiscoveryError, Result};
use crate::extract::prompts::{format_entity_extraction_prompt, format_tool_profile_prompt};
use crate::extract::{normalize_entities, parse_json_block, truncate_chars, RawEntity};
use crate::traits::extractor::EntityExtractor;
use crate::traits::researcher::ProfileParser;
use crate::types::entity::{AuthType, DiscoveredTool, Entity};

/// Research text beyond this many chars is not worth sending to the parser.
const PROFILE_CHAR_BUDGET: usize = 6_000;

/// Fastino API client.
pub struct FastinoExtractor {
    client: Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl FastinoExtractor {
    /// Create a client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: SecretString::from(api_key.into()),
            base_url: "https://api.fastino.ai/v1".to_string(),
            model: "fastino-extract".to_string(),
            timeout: Duration::from_secs(15),
        }
    }

    /// Set a custom base URL (for proxies and tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model (default: fastino-extract).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the per-request timeout (default: 15s).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Make a chat completion request and return the message content.
    async fn chat(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        #[derive(Serialize)]
        struct Request {
            model: String,
            messages: Vec<Message>,
            temperature: f32,
            max_tokens: u32,
        }

        #[derive(Serialize)]
        struct Message {
            role: String,
            content: String,
        }

        #[derive(Deserialize)]
        struct Response {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: MessageContent,
        }

        #[derive(Deserialize)]
        struct MessageContent {
            content: String,
        }

        let request = Request {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: 0.1,
            max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header(
                "Authorization",
                format!("Bearer {}", self.api_key.expose_secret()),
            )
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| DiscoveryError::Provider(Box::new(e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(DiscoveryError::Auth {
                provider: "fastino".to_string(),
            });
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DiscoveryError::RateLimited {
                provider: "fastino".to_string(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DiscoveryError::Provider(
                format!("Fastino API error ({status}): {body}").into(),
            ));
        }

        let parsed: Response = response
            .json()
            .await
            .map_err(|e| DiscoveryError::Provider(Box::new(e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| DiscoveryError::MalformedResponse {
                reason: "Fastino returned no choices".to_string(),
            })
    }
}

#[async_trait]
impl EntityExtractor for FastinoExtractor {
    fn name(&self) -> &'static str {
        "fastino"
    }

    async fn extract(&self, text: &str) -> Result<Vec<Entity>> {
        let prompt = format_entity_extraction_prompt(text);
        let content = self.chat(&prompt, 2048).await?;
        let raw: Vec<RawEntity> = parse_json_block(&content)?;
        Ok(normalize_entities(raw))
    }
}

#[async_trait]
impl ProfileParser for FastinoExtractor {
    async fn parse_profile(&self, entity: &Entity, research_text: &str) -> Result<DiscoveredTool> {
        #[derive(Deserialize)]
        struct RawProfile {
            #[serde(default)]
            name: String,
            #[serde(default)]
            vendor: String,
            #[serde(default)]
            description: String,
            #[serde(default)]
            api_url: String,
            #[serde(default)]
            capabilities: Vec<String>,
            #[serde(default)]
            auth_type: String,
            #[serde(default)]
            has_free_tier: bool,
            #[serde(default)]
            pricing_url: String,
            #[serde(default)]
            docs_url: String,
        }

        let chunk = truncate_chars(research_text, PROFILE_CHAR_BUDGET);
        let prompt = format_tool_profile_prompt(&entity.name, chunk);
        let content = self.chat(&prompt, 1024).await?;
        let raw: RawProfile = parse_json_block(&content)?;

        let name = if raw.name.trim().is_empty() {
            entity.name.clone()
        } else {
            raw.name
        };

        Ok(DiscoveredTool {
            name,
            vendor: raw.vendor,
            description: raw.description,
            api_url: raw.api_url,
            capabilities: raw.capabilities,
            auth_type: AuthType::parse_loose(&raw.auth_type),
            has_free_tier: raw.has_free_tier,
            pricing_url: raw.pricing_url,
            docs_url: raw.docs_url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::entity::EntityKind;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn choices_body(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        })
    }

    #[tokio::test]
    async fn test_extract_parses_choices_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(choices_body(
                r#"[{"name": "Tavily", "entity_type": "api", "raw_mention": "Tavily API", "confidence": 0.9},
                    {"name": "tavily", "entity_type": "api"},
                    {"name": "Neo4j", "entity_type": "tool"}]"#,
            )))
            .mount(&server)
            .await;

        let extractor = FastinoExtractor::new("test-key").with_base_url(server.uri());
        let entities = extractor.extract("page text").await.unwrap();

        // Duplicate "tavily" collapsed case-insensitively
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].name, "Tavily");
        assert_eq!(entities[0].kind, EntityKind::Api);
        assert_eq!(entities[0].confidence, 0.9);
        assert_eq!(entities[1].name, "Neo4j");
        assert_eq!(entities[1].confidence, 1.0);
    }

    #[tokio::test]
    async fn test_extract_strips_markdown_fences() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(choices_body(
                "```json\n[{\"name\": \"Groq\"}]\n```",
            )))
            .mount(&server)
            .await;

        let extractor = FastinoExtractor::new("k").with_base_url(server.uri());
        let entities = extractor.extract("text").await.unwrap();
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].name, "Groq");
        assert_eq!(entities[0].kind, EntityKind::Tool);
    }

    #[tokio::test]
    async fn test_unauthorized_maps_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let extractor = FastinoExtractor::new("bad-key").with_base_url(server.uri());
        let err = extractor.extract("text").await.unwrap_err();
        assert!(matches!(err, DiscoveryError::Auth { .. }));
    }

    #[tokio::test]
    async fn test_rate_limit_maps_to_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let extractor = FastinoExtractor::new("k").with_base_url(server.uri());
        let err = extractor.extract("text").await.unwrap_err();
        assert!(matches!(err, DiscoveryError::RateLimited { .. }));
    }

    #[tokio::test]
    async fn test_malformed_json_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(choices_body("not json at all")),
            )
            .mount(&server)
            .await;

        let extractor = FastinoExtractor::new("k").with_base_url(server.uri());
        assert!(extractor.extract("text").await.is_err());
    }

    #[tokio::test]
    async fn test_parse_profile_fills_schema() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(choices_body(
                r#"{"vendor": "Tavily Inc", "description": "Search API for agents",
                    "capabilities": ["search", "extract"], "auth_type": "api_key",
                    "has_free_tier": true}"#,
            )))
            .mount(&server)
            .await;

        let parser = FastinoExtractor::new("k").with_base_url(server.uri());
        let entity = Entity::new("Tavily", EntityKind::Api);
        let tool = parser.parse_profile(&entity, "research text").await.unwrap();

        // Missing name falls back to the entity's
        assert_eq!(tool.name, "Tavily");
        assert_eq!(tool.vendor, "Tavily Inc");
        assert_eq!(tool.auth_type, AuthType::ApiKey);
        assert!(tool.has_free_tier);
        assert_eq!(tool.capabilities, vec!["search", "extract"]);
    }
}
