//! Storage implementations that need no external service

mod memory;

pub use memory::{InMemoryGraphStore, StoredNode, StoredRelationship};
