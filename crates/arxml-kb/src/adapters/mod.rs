//! Adapters implementation for external services

pub mod neo4j_store;

// Re-export adapters for easier import
pub use neo4j_store::Neo4jGraphStore;
