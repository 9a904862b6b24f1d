//! Core trait abstractions for the discovery library.
//!
//! These traits define the seams where interchangeable providers plug
//! in: content search, entity extraction, research parsing, the
//! existing-tools registry, and the graph persistence sink.

pub mod extractor;
pub mod registry;
pub mod researcher;
pub mod searcher;
pub mod sink;
