//! Core domain types, configuration, persistence, and the pipeline
//! orchestrator.

pub mod checkpoint;
pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod store;
