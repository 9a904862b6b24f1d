//! Registry lookup trait.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::report::ExistingTool;

/// Lookup into the registry of already-integrated tools.
///
/// The registry is small and names are near-unique, so the contract is
/// first-match, case-insensitive, no ranking.
///
/// # Implementations
///
/// - `FileRegistry` - catalog file plus integrations directory
/// - `MockRegistry` - fixed in-memory listing for tests
#[async_trait]
pub trait ToolRegistry: Send + Sync {
    /// Find an existing tool matching the candidate name, if any.
    async fn lookup(&self, name: &str) -> Result<Option<ExistingTool>>;
}
