//! Error types for the ARXML import pipeline

use thiserror::Error;

/// Pipeline-level error. Every variant is folded into an
/// [`ImportOutcome`](crate::data::ImportOutcome) before leaving the pipeline.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("No ARXML files provided")]
    NoInput,

    #[error("Failed to parse '{file_name}': {message}")]
    Parse {
        file_name: String,
        message: String,
    },

    #[error("Failed to merge parsed documents: {0}")]
    Merge(String),

    #[error("Graph write failed: {0}")]
    Write(#[from] StateStoreError),

    #[error("Internal system error: {0}")]
    Internal(String),
}

impl ImportError {
    /// Short category name used in logs and failure messages.
    pub fn category(&self) -> &'static str {
        match self {
            ImportError::NoInput => "InputError",
            ImportError::Parse { .. } => "ParseError",
            ImportError::Merge(_) => "MergeError",
            ImportError::Write(_) => "WriteError",
            ImportError::Internal(_) => "InternalError",
        }
    }

    pub fn parse(file_name: impl Into<String>, source: DocumentParseError) -> Self {
        ImportError::Parse {
            file_name: file_name.into(),
            message: source.to_string(),
        }
    }
}

/// Specific error type for the graph store.
#[derive(Error, Debug)]
pub enum StateStoreError {
    #[error("Graph database connection error: {0}")]
    ConnectionError(String),
    #[error("Graph query execution error: {0}")]
    QueryError(String),
    #[error("Data mapping error from graph result: {0}")]
    MappingError(String),
    #[error("Transaction error: {0}")]
    TransactionError(String),
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

/// Error raised by a [`DocumentParser`](crate::traits::DocumentParser).
#[derive(Error, Debug)]
pub enum DocumentParseError {
    #[error("Malformed XML at position {position}: {message}")]
    Malformed {
        position: usize,
        message: String,
    },

    #[error("Unexpected closing tag '{0}'")]
    UnbalancedClose(String),

    #[error("Unclosed element '{0}' at end of document")]
    Unclosed(String),

    #[error("Document has no root element")]
    Empty,
}
