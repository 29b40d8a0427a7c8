//! Core services for the ARXML knowledge graph import

pub mod client;
pub mod import;
pub mod ingestion;
pub mod messages;

// Re-exports
pub use client::ImportClient;
pub use import::{GraphWriter, ImportPipeline, ImportService};
pub use messages::{ImportMessage, ImportSummary};
