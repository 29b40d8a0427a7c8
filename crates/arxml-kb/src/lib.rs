//! ARXML knowledge graph import
//!
//! Parses ARXML system descriptions, turns the element tree into a property
//! graph (nodes, containment, resolved references, virtual placeholders for
//! unresolved references) and writes it to a graph store in one transaction.

// Core modules
pub mod config;
pub mod data;
pub mod parser;
pub mod services;
pub mod storage;
pub mod traits;

// Implementation adapters (optional, can be provided externally)
#[cfg(feature = "adapters")]
pub mod adapters;

// Testing utilities
pub mod test_utils;

// Re-export key types for convenient usage
pub use config::{ImportConfig, Neo4jConfig};
pub use data::entities::{
    FileRecord, GraphNode, GraphRelationship, ImportFile, ImportOutcome, ImportSession,
    ImportStatus, UnresolvedReference, VirtualNode,
};
pub use data::errors::{DocumentParseError, ImportError, StateStoreError};
pub use data::types::{DocValue, ReferenceTarget};

// Re-export core traits
pub use traits::{DocumentParser, GraphStore, WritePlan, WriteStats};

// Re-export core services
pub use services::ingestion::{build_import_graph, ImportGraph};
pub use services::{GraphWriter, ImportClient, ImportPipeline, ImportService};

// Re-export message types
pub use services::messages::{ImportMessage, ImportSummary};

pub use parser::XmlDocumentParser;
pub use storage::InMemoryGraphStore;

#[cfg(feature = "adapters")]
pub use adapters::Neo4jGraphStore;

/// Default log filter when `RUST_LOG` is not set.
pub const DEFAULT_LOG_FILTER: &str = "info,arxml_kb=debug";

/// Initialize tracing for the import pipeline
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    // Ignore the error when a subscriber is already installed (tests, embedding apps)
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .try_init();
}
