//! Import orchestration around the pure extraction stage.

pub mod pipeline;
pub mod service;
pub mod writer;

pub use pipeline::{parse_documents, ImportPipeline};
pub use service::ImportService;
pub use writer::{index_specs, plan_write, GraphWriter, SessionMeta, WriteReport};
