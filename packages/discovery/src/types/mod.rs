//! Data types for the discovery pipeline.

pub mod entity;
pub mod report;
