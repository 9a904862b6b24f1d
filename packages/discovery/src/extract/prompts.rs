//! LLM prompts for entity extraction and profile parsing.
//!
//! Both extraction providers share the same entity prompt so the chain
//! can fall from one to the other without changing expectations about
//! the response shape.

/// Prompt for extracting tool/vendor/API entities from page text.
pub const ENTITY_EXTRACTION_PROMPT: &str = r#"You are an expert at identifying AI tools, APIs, SDKs, SaaS vendors, and developer libraries mentioned in text.

Extract ALL tools/vendors/APIs from the following text. Return ONLY a JSON array of objects, each with:
  "name": string (canonical product name),
  "entity_type": one of "tool"|"vendor"|"api"|"library",
  "raw_mention": exact phrase from text,
  "confidence": float 0-1

TEXT:
{text}

JSON:"#;

/// Prompt for structuring free research text into a tool profile.
pub const TOOL_PROFILE_PROMPT: &str = r#"Based on the following research text about '{tool_name}', extract a structured profile. Return ONLY valid JSON with these exact fields:
  "name": string,
  "vendor": string (company name),
  "description": string (1-2 sentences),
  "api_url": string (URL to API/developer docs),
  "capabilities": array of strings (key features),
  "auth_type": one of "api_key"|"oauth"|"none"|"unknown",
  "has_free_tier": boolean,
  "pricing_url": string,
  "docs_url": string

RESEARCH TEXT:
{research}

JSON:"#;

/// Format the entity extraction prompt.
pub fn format_entity_extraction_prompt(text: &str) -> String {
    ENTITY_EXTRACTION_PROMPT.replace("{text}", text)
}

/// Format the tool profile prompt.
pub fn format_tool_profile_prompt(tool_name: &str, research: &str) -> String {
    TOOL_PROFILE_PROMPT
        .replace("{tool_name}", tool_name)
        .replace("{research}", research)
}
