//! Core traits (interfaces) for the ARXML knowledge graph import

pub mod graph_store;
mod document_parser;

pub use graph_store::{
    GraphStore, IndexSpec, NodeBatch, NodeRow, RelationshipBatch, RelationshipRow, WritePlan,
    WriteStats,
};
pub use document_parser::DocumentParser;
