//! Graph entities produced and persisted by one import run

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// String-valued property map. Ordered so repeated runs serialize identically.
pub type Properties = BTreeMap<String, String>;

/// Relationship type used for parent/child containment.
pub const CONTAINS: &str = "CONTAINS";

/// Label shared by every synthesized placeholder node.
pub const VIRTUAL_LABEL: &str = "VirtualSegment";

/// Metadata label for one pipeline run.
pub const IMPORT_SESSION_LABEL: &str = "ImportSession";

/// Metadata label for one input file of a run.
pub const FILE_RECORD_LABEL: &str = "FileRecord";

/// Relationship linking an import session to its files.
pub const INCLUDES_FILE: &str = "INCLUDES_FILE";

/// Placeholder used when a reference carried no destination type hint.
pub const NO_DESTINATION: &str = "N/A";

/// A concrete node extracted from the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphNode {
    pub uuid: String,
    pub label: String,
    pub properties: Properties,
}

/// A directed, typed relationship between two node identities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphRelationship {
    #[serde(rename = "type")]
    pub rel_type: String,
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: Properties,
}

impl GraphRelationship {
    pub fn new(
        rel_type: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self {
            rel_type: rel_type.into(),
            from: from.into(),
            to: to.into(),
            properties: Properties::new(),
        }
    }

    pub fn contains(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::new(CONTAINS, from, to)
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties = properties;
        self
    }

    /// The `(type, from, to)` triple that must be unique in the output.
    pub fn key(&self) -> (String, String, String) {
        (self.rel_type.clone(), self.from.clone(), self.to.clone())
    }
}

/// A reference found during extraction whose target is only known by path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PendingReference {
    pub from: String,
    pub target_path: String,
    pub rel_type: String,
    pub destination_type: Option<String>,
    pub properties: Properties,
}

/// A pending reference whose path was absent from the path index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnresolvedReference {
    pub source_uuid: String,
    pub target_path: String,
    pub relationship_type: String,
    pub destination_attribute: String,
    pub reason: String,
}

/// Placeholder for one path segment that the document references but never
/// defines. Its identity is the cumulative path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualNode {
    pub uuid: String,
    pub name: String,
    pub arxml_path: String,
    pub is_virtual: bool,
}

impl VirtualNode {
    pub fn new(path: impl Into<String>, segment: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            uuid: path.clone(),
            name: segment.into(),
            arxml_path: path,
            is_virtual: true,
        }
    }

    pub fn label(&self) -> &'static str {
        VIRTUAL_LABEL
    }
}

/// One input file handed to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportFile {
    pub file_name: String,
    pub file_path: String,
    pub content: String,
}

impl ImportFile {
    pub fn new(
        file_name: impl Into<String>,
        file_path: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            file_path: file_path.into(),
            content: content.into(),
        }
    }

    pub fn size_bytes(&self) -> u64 {
        self.content.len() as u64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    Completed,
    CompletedWithUnresolved,
}

impl ImportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStatus::Completed => "completed",
            ImportStatus::CompletedWithUnresolved => "completed_with_unresolved",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "completed" => Some(ImportStatus::Completed),
            "completed_with_unresolved" => Some(ImportStatus::CompletedWithUnresolved),
            _ => None,
        }
    }
}

impl fmt::Display for ImportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata describing one pipeline run. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSession {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    /// Stamped right before the write transaction opens. The session is
    /// written inside that transaction, so its own commit time is not
    /// included.
    pub finished_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub file_count: i64,
    pub node_count: i64,
    pub relationship_count: i64,
    pub unresolved_count: i64,
    pub virtual_node_count: i64,
    pub status: ImportStatus,
}

impl ImportSession {
    /// Sets `finished_at` and recomputes `duration_ms` from `started_at`.
    pub fn finish(&mut self, finished_at: DateTime<Utc>) {
        self.finished_at = finished_at;
        self.duration_ms = (finished_at - self.started_at).num_milliseconds();
    }
}

/// Metadata for one input file of a run.
///
/// `node_count` and `relationship_count` are an even split of the session
/// aggregate, not per-file provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: Uuid,
    pub session_id: Uuid,
    pub file_name: String,
    pub file_path: String,
    pub size_bytes: i64,
    pub node_count: i64,
    pub relationship_count: i64,
}

/// Structured result of a pipeline invocation. Errors never escape the
/// pipeline; they are folded into this value instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub success: bool,
    pub message: String,
    pub node_count: usize,
    pub relationship_count: usize,
    pub unresolved_references: Vec<UnresolvedReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ImportOutcome {
    pub fn failure(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            node_count: 0,
            relationship_count: 0,
            unresolved_references: Vec::new(),
            error: Some(error.into()),
        }
    }
}
