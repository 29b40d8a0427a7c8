//! Document-to-graph extraction: walk, index, resolve, synthesize.
//!
//! Everything in this module is synchronous and free of I/O. It works on an
//! explicit per-run [`ExtractionContext`].

pub mod extractor;
pub mod merge;
pub mod path_index;
pub mod resolver;
pub mod virtual_nodes;

use std::collections::HashMap;

use tracing::{debug, info};

use crate::data::{
    entities::{GraphNode, GraphRelationship, UnresolvedReference},
    types::DocValue,
};

pub use extractor::{classify_key, normalize_label, ExtractionContext, KeyKind};
pub use merge::merge_documents;
pub use path_index::{build_path_index, PathIndex};
pub use resolver::{resolve, Resolution};
pub use virtual_nodes::{synthesize, VirtualGraph};

/// The complete in-memory graph for one import run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportGraph {
    pub nodes: Vec<GraphNode>,
    pub containment: Vec<GraphRelationship>,
    pub relationships: Vec<GraphRelationship>,
    pub unresolved: Vec<UnresolvedReference>,
    pub virtual_graph: VirtualGraph,
    /// References found with no node above them.
    pub dropped_references: usize,
}

impl ImportGraph {
    /// Label of a concrete node by uuid.
    pub fn label_index(&self) -> HashMap<&str, &str> {
        self.nodes
            .iter()
            .map(|node| (node.uuid.as_str(), node.label.as_str()))
            .collect()
    }

    /// Concrete plus virtual nodes.
    pub fn node_count(&self) -> usize {
        self.nodes.len() + self.virtual_graph.nodes.len()
    }

    /// Containment, resolved and virtual relationships.
    pub fn relationship_count(&self) -> usize {
        self.containment.len() + self.relationships.len() + self.virtual_graph.relationship_count()
    }
}

/// Runs extraction, indexing, resolution and virtual synthesis over a merged
/// document root.
pub fn build_import_graph(root: &DocValue) -> ImportGraph {
    let mut context = ExtractionContext::new();
    context.extract_root(root);
    debug!(
        nodes = context.nodes.len(),
        containment = context.containment.len(),
        pending = context.pending.len(),
        dropped = context.dropped_references,
        "Extraction finished"
    );

    let index = build_path_index(&context.nodes);
    let resolution = resolve(&context.pending, &index, &context.containment);

    let virtual_graph = {
        let labels: HashMap<&str, &str> = context
            .nodes
            .iter()
            .map(|node| (node.uuid.as_str(), node.label.as_str()))
            .collect();
        synthesize(&resolution.unresolved, |uuid| {
            labels.get(uuid).map(|label| label.to_string())
        })
    };

    info!(
        nodes = context.nodes.len(),
        resolved = resolution.relationships.len(),
        unresolved = resolution.unresolved.len(),
        virtual_nodes = virtual_graph.nodes.len(),
        "Built import graph"
    );

    ImportGraph {
        nodes: context.nodes,
        containment: context.containment,
        relationships: resolution.relationships,
        unresolved: resolution.unresolved,
        virtual_graph,
        dropped_references: context.dropped_references,
    }
}
