//! Reka provider adapter.
//!
//! Reka's chat endpoint returns a `responses` array rather than the
//! OpenAI `choices` shape. It is the second extractor in the chain,
//! tried when Fastino fails or returns nothing.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{DiscoveryError, Result};
use crate::extract::prompts::format_entity_extraction_prompt;
use crate::extract::{normalize_entities, parse_json_block, RawEntity};
use crate::traits::extractor::EntityExtractor;
use crate::types::entity::Entity;

/// Reka API client.
pub struct RekaExtractor {
    client: Client,
    api_key: SecretString,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl RekaExtractor {
    /// Create a client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: SecretString::from(api_key.into()),
            base_url: "https://api.reka.ai/v1".to_string(),
            model: "reka-flash".to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Set a custom base URL (for proxies and tests).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model (default: reka-flash).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the per-request timeout (default: 60s).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

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
            responses: Vec<Turn>,
        }

        #[derive(Deserialize)]
        struct Turn {
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
                provider: "reka".to_string(),
            });
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DiscoveryError::RateLimited {
                provider: "reka".to_string(),
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DiscoveryError::Provider(
                format!("Reka API error ({status}): {body}").into(),
            ));
        }

        let parsed: Response = response
            .json()
            .await
            .map_err(|e| DiscoveryError::Provider(Box::new(e)))?;

        parsed
            .responses
            .into_iter()
            .next()
            .map(|t| t.message.content)
            .ok_or_else(|| DiscoveryError::MalformedResponse {
                reason: "Reka returned no responses".to_string(),
            })
    }
}

#[async_trait]
impl EntityExtractor for RekaExtractor {
    fn name(&self) -> &'static str {
        "reka"
    }

    async fn extract(&self, text: &str) -> Result<Vec<Entity>> {
        let prompt = format_entity_extraction_prompt(text);
        let content = self.chat(&prompt, 2048).await?;
        let raw: Vec<RawEntity> = parse_json_block(&content)?;
        Ok(normalize_entities(raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::entity::EntityKind;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_extract_parses_responses_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "responses": [{"message": {"role": "assistant", "content":
                    r#"[{"name": "LangChain", "entity_type": "library", "confidence": 0.8}]"#}}]
            })))
            .mount(&server)
            .await;

        let extractor = RekaExtractor::new("k").with_base_url(server.uri());
        let entities = extractor.extract("page text").await.unwrap();

        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].name, "LangChain");
        assert_eq!(entities[0].kind, EntityKind::Library);
    }

    #[tokio::test]
    async fn test_choices_shape_is_rejected() {
        // An OpenAI-shaped body must not silently pass through
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "[]"}}]
            })))
            .mount(&server)
            .await;

        let extractor = RekaExtractor::new("k").with_base_url(server.uri());
        assert!(extractor.extract("text").await.is_err());
    }

    #[tokio::test]
    async fn test_server_error_carries_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let extractor = RekaExtractor::new("k").with_base_url(server.uri());
        let err = extractor.extract("text").await.unwrap_err();
        assert!(err.to_string().contains("provider"));
    }
}
