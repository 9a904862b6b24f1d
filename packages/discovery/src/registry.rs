//! File-backed registry of already-integrated tools.
//!
//! The registry is a flat markdown/text catalog (headings and bullet
//! lines naming tools) plus an optional integrations directory whose
//! child names identify installed integrations. Lookups are
//! case-insensitive substring matches; the catalog is checked first.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Result;
use crate::traits::registry::ToolRegistry;
use crate::types::report::ExistingTool;

/// Registry backed by a catalog file and an integrations directory.
///
/// Both sources are optional at runtime: a missing file or directory
/// is treated as an empty registry, never an error.
pub struct FileRegistry {
    catalog_path: PathBuf,
    integrations_dir: Option<PathBuf>,
}

impl FileRegistry {
    /// Create a registry over a catalog file.
    pub fn new(catalog_path: impl Into<PathBuf>) -> Self {
        Self {
            catalog_path: catalog_path.into(),
            integrations_dir: None,
        }
    }

    /// Also scan a directory of installed integrations.
    pub fn with_integrations_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.integrations_dir = Some(dir.into());
        self
    }

    /// Find the first catalog line mentioning the name.
    ///
    /// A line matches when, after any leading whitespace and a single
    /// bullet or heading marker, the remainder contains the lowercased
    /// name. The remainder becomes the tool description, minus an
    /// optional trailing `capabilities: a, b, c` annotation.
    fn match_catalog_line(&self, content: &str, name: &str, needle: &str) -> Option<ExistingTool> {
        for line in content.lines() {
            let stripped = line.trim_start();
            let stripped = stripped
                .strip_prefix(['#', '*', '-'])
                .unwrap_or(stripped)
                .trim_start();

            if !stripped.to_lowercase().contains(needle) {
                continue;
            }

            let (description, capabilities) = split_capability_annotation(stripped.trim_end());
            return Some(
                ExistingTool::new(name)
                    .with_description(description)
                    .with_capabilities(capabilities)
                    .with_config_path(self.catalog_path.display().to_string()),
            );
        }
        None
    }

    /// Find an integrations-directory child whose name mentions the name.
    async fn match_integration_dir(&self, name: &str, needle: &str) -> Option<ExistingTool> {
        let dir = self.integrations_dir.as_ref()?;

        let mut entries = match tokio::fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "could not scan integrations dir");
                return None;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let child = entry.file_name().to_string_lossy().to_string();
            if child.to_lowercase().contains(needle) {
                return Some(
                    ExistingTool::new(name)
                        .with_description(format!("Existing integration: {child}"))
                        .with_config_path(entry.path().display().to_string()),
                );
            }
        }
        None
    }
}

#[async_trait]
impl ToolRegistry for FileRegistry {
    async fn lookup(&self, name: &str) -> Result<Option<ExistingTool>> {
        let needle = name.to_lowercase();

        match tokio::fs::read_to_string(&self.catalog_path).await {
            Ok(content) => {
                if let Some(tool) = self.match_catalog_line(&content, name, &needle) {
                    return Ok(Some(tool));
                }
            }
            Err(e) => {
                tracing::debug!(
                    path = %self.catalog_path.display(),
                    error = %e,
                    "could not read tool catalog"
                );
            }
        }

        Ok(self.match_integration_dir(name, &needle).await)
    }
}

/// Split an optional `capabilities: a, b, c` annotation off a catalog line.
fn split_capability_annotation(line: &str) -> (String, Vec<String>) {
    let lower = line.to_lowercase();
    let Some(idx) = lower.find("capabilities:") else {
        return (line.to_string(), Vec::new());
    };

    let description = line[..idx]
        .trim_end()
        .trim_end_matches(['(', '['])
        .trim_end()
        .to_string();
    let capabilities = line[idx + "capabilities:".len()..]
        .trim_end_matches([')', ']'])
        .split(',')
        .map(|cap| cap.trim().to_string())
        .filter(|cap| !cap.is_empty())
        .collect();

    (description, capabilities)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_catalog(dir: &tempfile::TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("tool-catalog.md");
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_heading_line_matches() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_catalog(&dir, "# Tavily Search\n\nNotes about search.\n");
        let registry = FileRegistry::new(&path);

        let hit = registry.lookup("tavily").await.unwrap().unwrap();
        assert_eq!(hit.name, "tavily");
        assert_eq!(hit.description, "Tavily Search");
        assert_eq!(hit.config_path, path.display().to_string());
    }

    #[tokio::test]
    async fn test_bullet_line_matches_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_catalog(&dir, "- tavily-search: Web search for agents\n- neo4j: graph\n");
        let registry = FileRegistry::new(&path);

        let hit = registry.lookup("TAVILY").await.unwrap().unwrap();
        assert_eq!(hit.description, "tavily-search: Web search for agents");
        assert!(hit.capabilities.is_empty());
    }

    #[tokio::test]
    async fn test_capability_annotation_is_parsed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_catalog(
            &dir,
            "- tavily-search: Web search. capabilities: search, extract, crawl\n",
        );
        let registry = FileRegistry::new(&path);

        let hit = registry.lookup("tavily").await.unwrap().unwrap();
        assert_eq!(hit.description, "tavily-search: Web search.");
        assert_eq!(hit.capabilities, vec!["search", "extract", "crawl"]);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_catalog(&dir, "- tavily-search: Web search\n");
        let registry = FileRegistry::new(&path);

        assert!(registry.lookup("serper").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_catalog_is_empty_not_error() {
        let registry = FileRegistry::new("/nonexistent/tool-catalog.md");
        assert!(registry.lookup("tavily").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_integrations_dir_is_secondary() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_catalog(&dir, "- some-other-tool: unrelated\n");
        let integrations = dir.path().join("integrations");
        std::fs::create_dir(&integrations).unwrap();
        std::fs::create_dir(integrations.join("tavily-mcp")).unwrap();

        let registry = FileRegistry::new(&path).with_integrations_dir(&integrations);

        let hit = registry.lookup("tavily").await.unwrap().unwrap();
        assert_eq!(hit.description, "Existing integration: tavily-mcp");
        assert!(hit.config_path.ends_with("tavily-mcp"));
    }

    #[tokio::test]
    async fn test_catalog_wins_over_integrations_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_catalog(&dir, "- tavily-search: from the catalog\n");
        let integrations = dir.path().join("integrations");
        std::fs::create_dir(&integrations).unwrap();
        std::fs::create_dir(integrations.join("tavily-mcp")).unwrap();

        let registry = FileRegistry::new(&path).with_integrations_dir(&integrations);

        let hit = registry.lookup("tavily").await.unwrap().unwrap();
        assert_eq!(hit.description, "tavily-search: from the catalog");
    }

    #[test]
    fn test_annotation_split_handles_parentheses() {
        let (desc, caps) = split_capability_annotation("serper: search (capabilities: search)");
        assert_eq!(desc, "serper: search");
        assert_eq!(caps, vec!["search"]);

        let (desc, caps) = split_capability_annotation("plain line with no annotation");
        assert_eq!(desc, "plain line with no annotation");
        assert!(caps.is_empty());
    }
}
