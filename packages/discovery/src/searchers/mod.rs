//! Content search providers.
//!
//! Implementations of [`ContentSearcher`](crate::traits::searcher::ContentSearcher)
//! for production use. Tests use the `MockSearcher` that lives next to
//! the trait.

pub mod tavily;

pub use tavily::TavilySearcher;
