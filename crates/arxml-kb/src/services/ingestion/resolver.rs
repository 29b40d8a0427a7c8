//! Resolution of pending references against the path index.

use std::collections::HashSet;

use crate::data::entities::{
    GraphRelationship, PendingReference, UnresolvedReference, NO_DESTINATION,
};

use super::path_index::PathIndex;

/// Output of [`resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub relationships: Vec<GraphRelationship>,
    pub unresolved: Vec<UnresolvedReference>,
}

/// Turns each pending reference into a relationship when its path is known,
/// or into an [`UnresolvedReference`] otherwise.
///
/// A resolved triple that already exists in `existing` (the containment
/// edges) or was resolved earlier is not emitted again.
pub fn resolve(
    pending: &[PendingReference],
    index: &PathIndex,
    existing: &[GraphRelationship],
) -> Resolution {
    let mut seen: HashSet<(String, String, String)> =
        existing.iter().map(GraphRelationship::key).collect();
    let mut resolution = Resolution::default();

    for reference in pending {
        match index.get(&reference.target_path) {
            Some(target) => {
                let relationship =
                    GraphRelationship::new(&reference.rel_type, &reference.from, target)
                        .with_properties(reference.properties.clone());
                if seen.insert(relationship.key()) {
                    resolution.relationships.push(relationship);
                }
            }
            None => resolution.unresolved.push(UnresolvedReference {
                source_uuid: reference.from.clone(),
                target_path: reference.target_path.clone(),
                relationship_type: reference.rel_type.clone(),
                destination_attribute: reference
                    .destination_type
                    .clone()
                    .unwrap_or_else(|| NO_DESTINATION.to_string()),
                reason: format!("Target path '{}' not found in document", reference.target_path),
            }),
        }
    }

    resolution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::entities::{GraphNode, Properties};
    use crate::services::ingestion::path_index::build_path_index;

    fn pending(from: &str, path: &str, rel_type: &str) -> PendingReference {
        PendingReference {
            from: from.to_string(),
            target_path: path.to_string(),
            rel_type: rel_type.to_string(),
            destination_type: None,
            properties: Properties::new(),
        }
    }

    fn index() -> PathIndex {
        let mut properties = Properties::new();
        properties.insert("arxmlPath".to_string(), "/Pkg/If".to_string());
        build_path_index(&[GraphNode {
            uuid: "u-if".to_string(),
            label: "IF".to_string(),
            properties,
        }])
    }

    #[test]
    fn test_found_path_becomes_relationship() {
        let result = resolve(&[pending("u-port", "/Pkg/If", "INTERFACE-TREF")], &index(), &[]);
        assert_eq!(
            result.relationships,
            vec![GraphRelationship::new("INTERFACE-TREF", "u-port", "u-if")]
        );
        assert!(result.unresolved.is_empty());
    }

    #[test]
    fn test_missing_path_is_reported_with_placeholder_destination() {
        let result = resolve(&[pending("u-port", "/Pkg/Gone", "INTERFACE-TREF")], &index(), &[]);
        assert!(result.relationships.is_empty());
        let unresolved = &result.unresolved[0];
        assert_eq!(unresolved.source_uuid, "u-port");
        assert_eq!(unresolved.target_path, "/Pkg/Gone");
        assert_eq!(unresolved.relationship_type, "INTERFACE-TREF");
        assert_eq!(unresolved.destination_attribute, "N/A");
        assert_eq!(unresolved.reason, "Target path '/Pkg/Gone' not found in document");
    }

    #[test]
    fn test_triples_already_present_are_skipped() {
        let existing = vec![GraphRelationship::new("INTERFACE-TREF", "u-port", "u-if")];
        let refs = vec![
            pending("u-port", "/Pkg/If", "INTERFACE-TREF"),
            pending("u-other", "/Pkg/If", "INTERFACE-TREF"),
            pending("u-other", "/Pkg/If", "INTERFACE-TREF"),
        ];
        let result = resolve(&refs, &index(), &existing);
        assert_eq!(result.relationships.len(), 1);
        assert_eq!(result.relationships[0].from, "u-other");
    }
}
