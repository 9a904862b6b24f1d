//! Keyword heuristic extractor - the network-free last resort.
//!
//! When every LLM-backed provider is down, this scanner still produces
//! a usable entity list from three complementary strategies:
//!
//! 1. Known names - a curated list of AI/developer tools matched on
//!    word boundaries anywhere in the text.
//! 2. Contextual patterns - "X API", "X SDK", "powered by X",
//!    "sponsored by X" and friends.
//! 3. URL slugs - links whose domain matches a known tool slug
//!    (tavily.com, reka.ai, ...).
//!
//! It never fails, never touches the network, and caps its output so a
//! noisy page cannot explode downstream research fan-out.

use async_trait::async_trait;
use indexmap::IndexMap;
use regex::Regex;

use crate::error::Result;
use crate::traits::extractor::EntityExtractor;
use crate::types::entity::{Entity, EntityKind};

/// Hard cap on heuristic output, bounding research fan-out.
pub const MAX_FALLBACK_ENTITIES: usize = 30;

/// Curated AI/developer tool and vendor names for literal matching.
const KNOWN_TOOL_NAMES: &[&str] = &[
    "Tavily", "Reka", "Fastino", "Neo4j", "Yutori", "Senso", "Modulate",
    "Airbyte", "Render", "AWS", "OpenAI", "Numeric", "LangChain",
    "Anthropic", "Hugging Face", "HuggingFace", "Pinecone", "Weaviate",
    "Cohere", "Replicate", "Mistral", "Groq", "Together AI", "Perplexity",
    "Vercel", "Supabase", "Firebase", "MongoDB", "Redis", "Postgres",
    "Stripe", "Twilio", "SendGrid", "Algolia", "Elastic", "Datadog",
    "Sentry", "LaunchDarkly", "Segment", "Amplitude", "Mixpanel",
    "Cloudflare", "Fly.io", "Railway", "Neon", "PlanetScale", "Turso",
    "Upstash", "Convex", "Clerk", "Auth0", "Okta", "WorkOS",
    "LlamaIndex", "ChromaDB", "Chroma", "Qdrant", "Milvus", "Zilliz",
    "Unstructured", "DocArray", "Haystack", "Marqo", "Vespa",
    "Stability AI", "Midjourney", "ElevenLabs", "Deepgram", "AssemblyAI",
    "Whisper", "DALL-E", "GPT-4", "Claude", "Gemini", "Llama",
    "Streamlit", "Gradio", "Chainlit", "Modal", "Banana", "Baseten",
    "Cerebrium", "RunPod", "Lambda", "Anyscale", "Weights & Biases",
    "MLflow", "DVC", "ClearML", "Neptune", "Comet",
];

/// Domain slugs mapped to canonical names for URL-based detection.
const URL_TOOL_SLUGS: &[(&str, &str)] = &[
    ("tavily", "Tavily"), ("reka", "Reka"), ("fastino", "Fastino"),
    ("neo4j", "Neo4j"), ("yutori", "Yutori"), ("senso", "Senso"),
    ("modulate", "Modulate"), ("airbyte", "Airbyte"), ("render", "Render"),
    ("openai", "OpenAI"), ("langchain", "LangChain"), ("anthropic", "Anthropic"),
    ("huggingface", "Hugging Face"), ("pinecone", "Pinecone"),
    ("weaviate", "Weaviate"), ("cohere", "Cohere"), ("replicate", "Replicate"),
    ("mistral", "Mistral"), ("groq", "Groq"), ("together", "Together AI"),
    ("perplexity", "Perplexity"), ("vercel", "Vercel"), ("supabase", "Supabase"),
    ("firebase", "Firebase"), ("mongodb", "MongoDB"), ("redis", "Redis"),
    ("stripe", "Stripe"), ("twilio", "Twilio"), ("sendgrid", "SendGrid"),
    ("algolia", "Algolia"), ("elastic", "Elastic"), ("datadog", "Datadog"),
    ("sentry", "Sentry"), ("segment", "Segment"), ("cloudflare", "Cloudflare"),
    ("fly", "Fly.io"), ("railway", "Railway"), ("neon", "Neon"),
    ("planetscale", "PlanetScale"), ("upstash", "Upstash"), ("convex", "Convex"),
    ("clerk", "Clerk"), ("auth0", "Auth0"), ("workos", "WorkOS"),
    ("llamaindex", "LlamaIndex"), ("chromadb", "ChromaDB"), ("qdrant", "Qdrant"),
    ("milvus", "Milvus"), ("zilliz", "Zilliz"), ("stability", "Stability AI"),
    ("elevenlabs", "ElevenLabs"), ("deepgram", "Deepgram"),
    ("assemblyai", "AssemblyAI"), ("streamlit", "Streamlit"),
    ("gradio", "Gradio"), ("chainlit", "Chainlit"), ("modal", "Modal"),
    ("baseten", "Baseten"), ("runpod", "RunPod"), ("anyscale", "Anyscale"),
    ("wandb", "Weights & Biases"), ("mlflow", "MLflow"),
    ("numeric", "Numeric"),
];

/// Suffix words that mark the preceding capitalized phrase as a tool.
const SUFFIX_TERMS: &[&str] = &["API", "SDK", "platform", "library", "framework", "integration"];

/// Local heuristic entity extractor.
///
/// Compiles its patterns once up front; scanning is pure string work
/// after that.
pub struct KeywordExtractor {
    known_names: Vec<(&'static str, Regex)>,
    suffix_patterns: Vec<Regex>,
    prefix_pattern: Regex,
    url_pattern: Regex,
}

impl KeywordExtractor {
    /// Build the extractor, compiling all patterns.
    pub fn new() -> Self {
        let known_names = KNOWN_TOOL_NAMES
            .iter()
            .map(|name| {
                let pattern = format!(r"(?i)\b{}\b", regex::escape(name));
                (*name, Regex::new(&pattern).unwrap())
            })
            .collect();

        let suffix_patterns = SUFFIX_TERMS
            .iter()
            .map(|term| {
                let pattern = format!(
                    r"\b([A-Z][a-zA-Z0-9]{{2,}}(?:\s[A-Z][a-zA-Z0-9]+)?)\s+{term}\b"
                );
                Regex::new(&pattern).unwrap()
            })
            .collect();

        let prefix_pattern = Regex::new(
            r"(?i)(?:powered\s+by|built\s+with|built\s+on|sponsored\s+by|presented\s+by|backed\s+by|maintained\s+by|developed\s+by|created\s+with|hosted\s+on|deployed\s+on|runs\s+on|using)\s+([A-Z][a-zA-Z0-9]+(?:\s[A-Z][a-zA-Z0-9]+)?(?:\.\w+)?)",
        )
        .unwrap();

        let url_pattern = Regex::new(r"https?://(?:www\.)?([a-zA-Z0-9-]+)\.[a-zA-Z]{2,}").unwrap();

        Self {
            known_names,
            suffix_patterns,
            prefix_pattern,
            url_pattern,
        }
    }

    /// Scan text with all three strategies.
    ///
    /// First strategy to claim a name (case-insensitive) wins, so known
    /// names outrank pattern hits and order is deterministic.
    pub fn scan(&self, text: &str) -> Vec<Entity> {
        let mut found: IndexMap<String, Entity> = IndexMap::new();

        // Strategy 1: known tool/vendor names
        for (name, pattern) in &self.known_names {
            if let Some(m) = pattern.find(text) {
                let key = name.to_lowercase();
                found.entry(key).or_insert_with(|| {
                    Entity::new(*name, EntityKind::Tool)
                        .with_mention(m.as_str())
                        .with_confidence(0.7)
                });
            }
        }

        // Strategy 2a: "X API", "X SDK", "X platform", ...
        for pattern in &self.suffix_patterns {
            for caps in pattern.captures_iter(text) {
                let name = caps[1].trim().to_string();
                let key = name.to_lowercase();
                let mention = caps[0].to_string();
                found.entry(key).or_insert_with(|| {
                    Entity::new(name, EntityKind::Tool)
                        .with_mention(mention)
                        .with_confidence(0.5)
                });
            }
        }

        // Strategy 2b: "powered by X", "built with X", ...
        for caps in self.prefix_pattern.captures_iter(text) {
            let name = caps[1].trim().to_string();
            let key = name.to_lowercase();
            let mention = caps[0].to_string();
            found.entry(key).or_insert_with(|| {
                Entity::new(name, EntityKind::Vendor)
                    .with_mention(mention)
                    .with_confidence(0.6)
            });
        }

        // Strategy 3: URLs whose domain slug is a known tool
        for caps in self.url_pattern.captures_iter(text) {
            let slug = caps[1].to_lowercase();
            if let Some((_, canonical)) = URL_TOOL_SLUGS.iter().find(|(s, _)| *s == slug) {
                let key = canonical.to_lowercase();
                let mention = caps[0].to_string();
                found.entry(key).or_insert_with(|| {
                    Entity::new(*canonical, EntityKind::Tool)
                        .with_mention(mention)
                        .with_confidence(0.6)
                });
            }
        }

        found
            .into_values()
            .take(MAX_FALLBACK_ENTITIES)
            .collect()
    }
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityExtractor for KeywordExtractor {
    fn name(&self) -> &'static str {
        "keyword"
    }

    async fn extract(&self, text: &str) -> Result<Vec<Entity>> {
        Ok(self.scan(text))
    }
}
