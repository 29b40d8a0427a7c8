//! Core data model for the ARXML knowledge graph import

pub mod entities;
pub mod errors;
pub mod types;

pub use entities::*;
pub use errors::{DocumentParseError, ImportError, StateStoreError};
pub use types::{DocValue, ReferenceTarget};
