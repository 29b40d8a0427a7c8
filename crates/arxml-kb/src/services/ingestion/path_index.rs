//! Semantic path → node identity index.

use std::collections::HashMap;

use tracing::warn;

use crate::data::entities::GraphNode;

/// Lookup table from a node's semantic path to its uuid.
#[derive(Debug, Clone, Default)]
pub struct PathIndex {
    paths: HashMap<String, String>,
}

impl PathIndex {
    pub fn get(&self, path: &str) -> Option<&str> {
        self.paths.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Indexes every node by its `arxmlPath` property in one pass. When two nodes
/// share a path the first one keeps it.
pub fn build_path_index(nodes: &[GraphNode]) -> PathIndex {
    let mut paths = HashMap::with_capacity(nodes.len());
    for node in nodes {
        let Some(path) = node.properties.get("arxmlPath") else {
            continue;
        };
        if let Some(existing) = paths.get(path) {
            warn!(path = %path, kept = %existing, ignored = %node.uuid, "Duplicate semantic path");
            continue;
        }
        paths.insert(path.clone(), node.uuid.clone());
    }
    PathIndex { paths }
}
