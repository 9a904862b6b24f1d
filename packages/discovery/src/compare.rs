//! Capability comparison and action recommendation.
//!
//! Pure functions over the report types: no IO, no providers. The
//! orchestrator calls [`compare`] once per discovered tool that has a
//! registry match, then [`recommend`] once over the whole batch.

use std::collections::{HashMap, HashSet};

use crate::types::entity::{DiscoveredTool, EntityResearch};
use crate::types::report::{Action, ExistingTool, RecommendedAction, ToolComparison};

/// Overlap above this with nothing new means the tool is redundant.
const SKIP_OVERLAP_THRESHOLD: f64 = 0.8;

/// Overlap above this warrants a closer look before integrating.
const EVALUATE_OVERLAP_THRESHOLD: f64 = 0.5;

/// Most new capabilities quoted in an evaluate reason.
const REASON_CAPABILITY_LIMIT: usize = 3;

/// Build a side-by-side comparison between a discovered tool and its
/// registry match.
///
/// Overlap is the shared-capability count over the larger of the two
/// capability sets, compared case-insensitively; it is zero when
/// either side has no capabilities listed. Scores are rounded to two
/// decimals.
pub fn compare(new_tool: &DiscoveredTool, existing: &ExistingTool) -> ToolComparison {
    let existing_caps_lower: HashSet<String> = existing
        .capabilities
        .iter()
        .map(|cap| cap.to_lowercase())
        .collect();

    let new_only: Vec<String> = new_tool
        .capabilities
        .iter()
        .filter(|cap| !existing_caps_lower.contains(&cap.to_lowercase()))
        .cloned()
        .collect();

    let mut overlap = 0.0;
    if !new_tool.capabilities.is_empty() && !existing.capabilities.is_empty() {
        let shared = new_tool.capabilities.len() - new_only.len();
        let denominator = new_tool.capabilities.len().max(existing.capabilities.len());
        overlap = shared as f64 / denominator as f64;
    }

    let added = new_only.len();
    ToolComparison {
        new_tool: new_tool.clone(),
        existing_tool: existing.clone(),
        overlap_score: (overlap * 100.0).round() / 100.0,
        new_capabilities: new_only,
        notes: format!("New tool adds {added} capability(ies) not present in existing tool."),
    }
}

/// Generate one recommended action per researched tool.
///
/// - no registry match: integrate, priority 1
/// - overlap > 0.8 with nothing new: skip, priority 3
/// - overlap > 0.5 but the tool adds capabilities: evaluate, priority 2
/// - otherwise: integrate, priority 2
pub fn recommend(
    researched: &[EntityResearch],
    comparisons: &[ToolComparison],
) -> Vec<RecommendedAction> {
    let comparison_map: HashMap<&str, &ToolComparison> = comparisons
        .iter()
        .map(|comp| (comp.new_tool.name.as_str(), comp))
        .collect();

    let mut actions = Vec::with_capacity(researched.len());
    for research in researched {
        let name = &research.tool.name;

        let Some(comp) = comparison_map.get(name.as_str()) else {
            actions.push(RecommendedAction {
                tool_name: name.clone(),
                action: Action::Integrate,
                reason: "No existing alternative found in the registry — integrate as new tool."
                    .to_string(),
                priority: 1,
            });
            continue;
        };

        let pct = format!("{:.0}%", comp.overlap_score * 100.0);
        if comp.overlap_score > SKIP_OVERLAP_THRESHOLD && comp.new_capabilities.is_empty() {
            actions.push(RecommendedAction {
                tool_name: name.clone(),
                action: Action::Skip,
                reason: format!(
                    "High overlap ({pct}) with existing tool '{}' and no new capabilities.",
                    comp.existing_tool.name
                ),
                priority: 3,
            });
        } else if comp.overlap_score > EVALUATE_OVERLAP_THRESHOLD {
            let added = comp
                .new_capabilities
                .iter()
                .take(REASON_CAPABILITY_LIMIT)
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ");
            actions.push(RecommendedAction {
                tool_name: name.clone(),
                action: Action::Evaluate,
                reason: format!(
                    "Partial overlap ({pct}) with '{}' but adds: {added}",
                    comp.existing_tool.name
                ),
                priority: 2,
            });
        } else {
            actions.push(RecommendedAction {
                tool_name: name.clone(),
                action: Action::Integrate,
                reason: format!(
                    "Low overlap ({pct}) with existing tool — sufficiently different to justify integration."
                ),
                priority: 2,
            });
        }
    }

    actions
}
