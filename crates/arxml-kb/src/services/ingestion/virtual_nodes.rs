//! Placeholder chains for references whose target path is not in the
//! document.

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use crate::data::entities::{GraphRelationship, UnresolvedReference, VirtualNode};

/// Virtual nodes and edges synthesized for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VirtualGraph {
    /// One node per distinct cumulative path, in first-seen order.
    pub nodes: Vec<VirtualNode>,
    /// `CONTAINS` edges between consecutive segments.
    pub contains: Vec<GraphRelationship>,
    /// Typed edges from real sources to the deepest segment, grouped by
    /// `(type, source label)`.
    pub relationships: BTreeMap<(String, String), Vec<GraphRelationship>>,
    /// Unresolved references whose source label was unknown.
    pub dropped: usize,
}

impl VirtualGraph {
    pub fn relationship_count(&self) -> usize {
        self.contains.len() + self.relationships.values().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.relationship_count() == 0
    }
}

/// Builds the placeholder chain for every unresolved reference.
///
/// `/A/B/C` yields the segments `/A`, `/A/B` and `/A/B/C`, linked by
/// `CONTAINS`, plus one edge of the original type from the source to
/// `/A/B/C`. Segment ids are their cumulative paths, so the output only
/// depends on the input.
pub fn synthesize<F>(unresolved: &[UnresolvedReference], label_of: F) -> VirtualGraph
where
    F: Fn(&str) -> Option<String>,
{
    let mut graph = VirtualGraph::default();
    let mut seen_nodes: HashSet<String> = HashSet::new();
    let mut seen_edges: HashSet<(String, String, String)> = HashSet::new();

    for reference in unresolved {
        let Some(source_label) = label_of(&reference.source_uuid) else {
            debug!(
                source = %reference.source_uuid,
                "Dropping unresolved reference with unknown source"
            );
            graph.dropped += 1;
            continue;
        };

        let mut parent: Option<String> = None;
        let mut cumulative = String::new();
        for segment in reference.target_path.split('/').filter(|s| !s.is_empty()) {
            cumulative.push('/');
            cumulative.push_str(segment);

            if seen_nodes.insert(cumulative.clone()) {
                graph.nodes.push(VirtualNode::new(cumulative.clone(), segment));
            }
            if let Some(parent_path) = parent.as_deref() {
                let edge = GraphRelationship::contains(parent_path, cumulative.as_str());
                if seen_edges.insert(edge.key()) {
                    graph.contains.push(edge);
                }
            }
            parent = Some(cumulative.clone());
        }

        let Some(deepest) = parent else {
            graph.dropped += 1;
            continue;
        };

        let edge = GraphRelationship::new(
            &reference.relationship_type,
            &reference.source_uuid,
            deepest,
        );
        if seen_edges.insert(edge.key()) {
            graph
                .relationships
                .entry((reference.relationship_type.clone(), source_label))
                .or_default()
                .push(edge);
        }
    }

    graph
}
