//! Neo4j graph sink over the HTTP transactional API.
//!
//! Talks to `POST {uri}/db/{database}/tx/commit` with basic auth, one
//! auto-committed statement per write. Cypher-level failures come back
//! with HTTP 200 in an `errors` array, so both layers are checked.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::error::{SinkError, SinkResult};
use crate::traits::sink::GraphSink;
use crate::types::entity::DiscoveredTool;
use crate::types::report::DiscoveryRecord;

/// Create-or-update a Tool node keyed by name.
const UPSERT_TOOL: &str = "
MERGE (tool:Tool {name: $name})
SET tool.vendor = $vendor,
    tool.description = $description,
    tool.api_url = $api_url,
    tool.auth_type = $auth_type,
    tool.has_free_tier = $has_free_tier,
    tool.updated_at = datetime()
";

/// Create a DiscoveryEvent node and link it to all tools found in the run.
const LOG_DISCOVERY: &str = "
CREATE (d:DiscoveryEvent {
    url:          $url,
    timestamp:    datetime(),
    source_type:  $source_type,
    engine_used:  $engine_used,
    entity_count: $entity_count
})
WITH d
UNWIND $tool_names AS tool_name
MATCH (t:Tool {name: tool_name})
MERGE (t)-[:DISCOVERED_FROM]->(d)
RETURN d, collect(t.name) AS linked_tools
";

/// Graph sink writing to a Neo4j server.
pub struct Neo4jSink {
    client: Client,
    uri: String,
    database: String,
    user: String,
    password: SecretString,
    timeout: Duration,
}

impl Neo4jSink {
    /// Create a sink for the server at `uri` (e.g. `http://localhost:7474`).
    pub fn new(
        uri: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            uri: uri.into(),
            database: "neo4j".to_string(),
            user: user.into(),
            password: SecretString::from(password.into()),
            timeout: Duration::from_secs(10),
        }
    }

    /// Target a database other than the default `neo4j`.
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = database.into();
        self
    }

    /// Set the per-request timeout (default: 10s).
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run one statement through the transactional endpoint.
    async fn commit(&self, statement: &str, parameters: serde_json::Value) -> SinkResult<()> {
        #[derive(Serialize)]
        struct TxRequest<'a> {
            statements: Vec<Statement<'a>>,
        }

        #[derive(Serialize)]
        struct Statement<'a> {
            statement: &'a str,
            parameters: serde_json::Value,
        }

        #[derive(Deserialize)]
        struct TxResponse {
            #[serde(default)]
            errors: Vec<TxError>,
        }

        #[derive(Deserialize)]
        struct TxError {
            #[serde(default)]
            code: String,
            #[serde(default)]
            message: String,
        }

        let request = TxRequest {
            statements: vec![Statement {
                statement,
                parameters,
            }],
        };

        let response = self
            .client
            .post(format!("{}/db/{}/tx/commit", self.uri, self.database))
            .basic_auth(&self.user, Some(self.password.expose_secret()))
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await
            .map_err(|e| SinkError::Transport(Box::new(e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(SinkError::Auth);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Query {
                message: format!("HTTP {status}: {body}"),
            });
        }

        let parsed: TxResponse = response
            .json()
            .await
            .map_err(|e| SinkError::Transport(Box::new(e)))?;

        if let Some(err) = parsed.errors.first() {
            return Err(SinkError::Query {
                message: format!("{}: {}", err.code, err.message),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl GraphSink for Neo4jSink {
    async fn upsert_tool(&self, tool: &DiscoveredTool) -> SinkResult<()> {
        let parameters = serde_json::json!({
            "name": tool.name,
            "vendor": tool.vendor,
            "description": tool.description,
            "api_url": tool.api_url,
            "auth_type": tool.auth_type,
            "has_free_tier": tool.has_free_tier,
        });
        self.commit(UPSERT_TOOL, parameters).await?;
        tracing::debug!(tool = %tool.name, "upserted tool node");
        Ok(())
    }

    async fn log_discovery(&self, record: &DiscoveryRecord) -> SinkResult<()> {
        let parameters = serde_json::json!({
            "url": record.source_url,
            "source_type": record.source_kind,
            "engine_used": record.engine,
            "entity_count": record.entity_count,
            "tool_names": record.tool_names,
        });
        self.commit(LOG_DISCOVERY, parameters).await?;
        tracing::info!(
            url = %record.source_url,
            tools = record.tool_names.len(),
            "created discovery event"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::sample_tool;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ok_body() -> serde_json::Value {
        serde_json::json!({"results": [], "errors": []})
    }

    #[tokio::test]
    async fn test_upsert_posts_merge_statement() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/db/neo4j/tx/commit"))
            .and(body_partial_json(serde_json::json!({
                "statements": [{
                    "parameters": {
                        "name": "Tavily",
                        "vendor": "Tavily Inc",
                        "auth_type": "api_key",
                        "has_free_tier": true,
                    }
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .expect(1)
            .mount(&server)
            .await;

        let sink = Neo4jSink::new(server.uri(), "neo4j", "secret");
        sink.upsert_tool(&sample_tool("Tavily")).await.unwrap();
    }

    #[tokio::test]
    async fn test_log_discovery_links_tools() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/db/neo4j/tx/commit"))
            .and(body_partial_json(serde_json::json!({
                "statements": [{
                    "parameters": {
                        "url": "https://lu.ma/hack-night",
                        "source_type": "luma",
                        "tool_names": ["Tavily", "Groq"],
                    }
                }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .expect(1)
            .mount(&server)
            .await;

        let sink = Neo4jSink::new(server.uri(), "neo4j", "secret");
        let record = DiscoveryRecord::new(
            "https://lu.ma/hack-night",
            vec!["Tavily".to_string(), "Groq".to_string()],
        );
        sink.log_discovery(&record).await.unwrap();
    }

    #[tokio::test]
    async fn test_custom_database_changes_path() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/db/tools/tx/commit"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body()))
            .expect(1)
            .mount(&server)
            .await;

        let sink = Neo4jSink::new(server.uri(), "neo4j", "secret").with_database("tools");
        sink.upsert_tool(&sample_tool("Tavily")).await.unwrap();
    }

    #[tokio::test]
    async fn test_cypher_error_in_200_body_is_query_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [],
                "errors": [{
                    "code": "Neo.ClientError.Statement.SyntaxError",
                    "message": "Invalid input"
                }]
            })))
            .mount(&server)
            .await;

        let sink = Neo4jSink::new(server.uri(), "neo4j", "secret");
        let err = sink.upsert_tool(&sample_tool("Tavily")).await.unwrap_err();
        match err {
            SinkError::Query { message } => {
                assert!(message.contains("SyntaxError"));
            }
            other => panic!("expected query error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_unauthorized_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let sink = Neo4jSink::new(server.uri(), "neo4j", "wrong");
        let err = sink.upsert_tool(&sample_tool("Tavily")).await.unwrap_err();
        assert!(matches!(err, SinkError::Auth));
    }
}
