//! DocumentParser trait definition for raw document text

use crate::data::{errors::DocumentParseError, types::DocValue};

/// Turns the raw text of one input file into a [`DocValue`] tree.
///
/// The returned value is an object keyed by the root element's tag. Parsing is
/// CPU-bound and runs on the blocking pool, so implementations are synchronous.
pub trait DocumentParser: Send + Sync {
    fn parse(&self, content: &str) -> Result<DocValue, DocumentParseError>;
}
