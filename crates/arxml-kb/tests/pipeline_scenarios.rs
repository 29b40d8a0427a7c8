//! End-to-end pipeline scenarios against the in-memory store.

use std::collections::BTreeSet;
use std::sync::Arc;

use pretty_assertions::assert_eq;

use arxml_kb::{
    build_import_graph,
    data::entities::VIRTUAL_LABEL,
    services::ingestion::merge_documents,
    test_utils::{
        import_file, indirect_one_level_arxml, indirect_two_level_arxml, FailingGraphStore,
        ORPHAN_REFERENCE_ARXML, PORT_TO_PORT_ARXML, RESOLVED_REFERENCE_ARXML,
        SHARED_UNRESOLVED_ARXML,
    },
    DocumentParser, GraphStore, ImportConfig, ImportPipeline, ImportStatus, InMemoryGraphStore,
    XmlDocumentParser,
};

fn pipeline(store: Arc<dyn GraphStore>) -> ImportPipeline {
    ImportPipeline::new(Arc::new(XmlDocumentParser::new()), store, ImportConfig::default())
}

fn relationship_set(store: &InMemoryGraphStore) -> BTreeSet<(String, String, String)> {
    store
        .relationships()
        .into_iter()
        .map(|r| (r.rel_type, r.from.1, r.to.1))
        .collect()
}

#[test_log::test(tokio::test)]
async fn test_resolved_reference_scenario() {
    let store = Arc::new(InMemoryGraphStore::new());
    let outcome = pipeline(store.clone())
        .run(vec![import_file("system.arxml", RESOLVED_REFERENCE_ARXML)])
        .await;

    assert!(outcome.success, "{:?}", outcome.error);
    assert_eq!(outcome.node_count, 3);
    assert_eq!(outcome.relationship_count, 3);
    assert!(outcome.unresolved_references.is_empty());

    assert!(store.has_relationship("CONTAINS", "pkg-1", "if-speed"));
    assert!(store.has_relationship("CONTAINS", "pkg-1", "comp-1"));
    assert!(store.has_relationship("REQUIRED-INTERFACE-TREF", "comp-1", "if-speed"));

    let interface = store.node("if-speed").expect("interface node");
    assert_eq!(interface.label, "SENDER_RECEIVER_INTERFACE");
    assert_eq!(interface.properties["arxmlPath"], "/Pkg/Speed");
    assert_eq!(interface.properties["IS-SERVICE"], "false");

    let session = store.latest_import().await.unwrap().expect("session");
    assert_eq!(session.status, ImportStatus::Completed);
    assert_eq!(session.node_count, 3);
    let files = store.files_for_import(&session.id).await.unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].file_name, "system.arxml");
}

#[test_log::test(tokio::test)]
async fn test_port_references_sibling_port() {
    let parser = XmlDocumentParser::new();
    let root = merge_documents(vec![parser.parse(PORT_TO_PORT_ARXML).unwrap()]).unwrap();
    let graph = build_import_graph(&root);
    assert_eq!(graph.nodes.len(), 3);
    assert_eq!(graph.containment.len(), 2);
    assert_eq!(graph.relationships.len(), 1);
    assert!(graph.unresolved.is_empty());

    let store = Arc::new(InMemoryGraphStore::new());
    let outcome = pipeline(store.clone())
        .run(vec![import_file("ports.arxml", PORT_TO_PORT_ARXML)])
        .await;

    assert!(outcome.success, "{:?}", outcome.error);
    assert_eq!(outcome.node_count, 3);
    assert_eq!(outcome.relationship_count, 3);
    assert!(outcome.unresolved_references.is_empty());
    assert!(store.has_relationship("CONTAINS", "comp-1", "port-a"));
    assert!(store.has_relationship("CONTAINS", "comp-1", "port-b"));
    assert!(store.has_relationship("LINKED-PORT-REF", "port-a", "port-b"));
    assert!(store.nodes_with_label(VIRTUAL_LABEL).is_empty());
}

#[test_log::test(tokio::test)]
async fn test_shared_unresolved_target_builds_one_chain() {
    let store = Arc::new(InMemoryGraphStore::new());
    let outcome = pipeline(store.clone())
        .run(vec![import_file("shared.arxml", SHARED_UNRESOLVED_ARXML)])
        .await;

    assert!(outcome.success);
    assert_eq!(outcome.unresolved_references.len(), 2);
    assert!(outcome
        .unresolved_references
        .iter()
        .all(|u| u.destination_attribute == "SENDER-RECEIVER-INTERFACE"));

    let mut virtual_ids: Vec<String> = store
        .nodes_with_label(VIRTUAL_LABEL)
        .into_iter()
        .map(|n| {
            assert!(n.is_virtual);
            n.uuid
        })
        .collect();
    virtual_ids.sort();
    assert_eq!(virtual_ids, vec!["/Lib", "/Lib/Ifs", "/Lib/Ifs/Missing"]);

    let to_deepest: Vec<_> = store
        .relationships()
        .into_iter()
        .filter(|r| r.to.1 == "/Lib/Ifs/Missing" && r.rel_type == "REQUIRED-INTERFACE-TREF")
        .collect();
    assert_eq!(to_deepest.len(), 2);
    assert!(store.has_relationship("CONTAINS", "/Lib", "/Lib/Ifs"));
    assert!(store.has_relationship("CONTAINS", "/Lib/Ifs", "/Lib/Ifs/Missing"));

    // 5 concrete + 3 virtual; 4 containment + 2 virtual containment + 2 references
    assert_eq!(outcome.node_count, 8);
    assert_eq!(outcome.relationship_count, 8);

    let session = store.latest_import().await.unwrap().expect("session");
    assert_eq!(session.status, ImportStatus::CompletedWithUnresolved);
    assert_eq!(session.virtual_node_count, 3);
    assert_eq!(session.unresolved_count, 2);
}

#[test_log::test(tokio::test)]
async fn test_orphan_reference_is_dropped_everywhere() {
    let parser = XmlDocumentParser::new();
    let root = merge_documents(vec![parser.parse(ORPHAN_REFERENCE_ARXML).unwrap()]).unwrap();
    let graph = build_import_graph(&root);
    assert_eq!(graph.dropped_references, 1);
    assert!(graph.relationships.is_empty());
    assert!(graph.unresolved.is_empty());
    assert!(graph.virtual_graph.nodes.is_empty());

    let store = Arc::new(InMemoryGraphStore::new());
    let outcome = pipeline(store.clone())
        .run(vec![import_file("orphan.arxml", ORPHAN_REFERENCE_ARXML)])
        .await;
    assert!(outcome.success);
    assert_eq!(outcome.node_count, 1);
    assert_eq!(outcome.relationship_count, 0);
    assert!(outcome.unresolved_references.is_empty());
    assert!(store.relationships().is_empty());
}

#[test_log::test(tokio::test)]
async fn test_empty_input_fails_without_touching_store() {
    let store = Arc::new(InMemoryGraphStore::new());
    let pipeline = pipeline(store.clone());
    let first = pipeline
        .run(vec![import_file("system.arxml", RESOLVED_REFERENCE_ARXML)])
        .await;
    assert!(first.success);
    let before = store.latest_import().await.unwrap().map(|s| s.id);

    let outcome = pipeline.run(Vec::new()).await;
    assert!(!outcome.success);
    assert_eq!(outcome.node_count, 0);
    assert_eq!(outcome.relationship_count, 0);
    assert!(outcome.error.is_some());

    assert_eq!(store.node_count(), 3);
    assert_eq!(store.latest_import().await.unwrap().map(|s| s.id), before);
}

#[test_log::test(tokio::test)]
async fn test_indirect_reference_shapes_are_equivalent() {
    let one = Arc::new(InMemoryGraphStore::new());
    let two = Arc::new(InMemoryGraphStore::new());

    let a = pipeline(one.clone())
        .run(vec![import_file("one.arxml", &indirect_one_level_arxml())])
        .await;
    let b = pipeline(two.clone())
        .run(vec![import_file("two.arxml", &indirect_two_level_arxml())])
        .await;

    assert!(a.success && b.success);
    assert_eq!(relationship_set(&one), relationship_set(&two));
    assert!(one.has_relationship("TARGET-P-PORT-REF", "conn-1", "pport-1"));
    assert!(one.has_relationship("CONTEXT-COMPONENT-REF", "conn-1", "proto-1"));
    assert!(one.has_relationship("TYPE-TREF", "proto-1", "comp-1"));

    let iref = one
        .relationships()
        .into_iter()
        .find(|r| r.rel_type == "TARGET-P-PORT-REF")
        .expect("provider port reference");
    assert_eq!(iref.properties["instanceRef"], "PROVIDER-IREF");
    assert_eq!(iref.properties["destinationType"], "P-PORT-PROTOTYPE");
}

#[test_log::test(tokio::test)]
async fn test_reimport_is_idempotent() {
    let store = Arc::new(InMemoryGraphStore::new());
    let pipeline = pipeline(store.clone());
    let files = vec![import_file("shared.arxml", SHARED_UNRESOLVED_ARXML)];

    let first = pipeline.run(files.clone()).await;
    let first_virtual: Vec<String> = store
        .nodes_with_label(VIRTUAL_LABEL)
        .into_iter()
        .map(|n| n.uuid)
        .collect();
    let first_relationships = relationship_set(&store);

    let second = pipeline.run(files).await;
    let second_virtual: Vec<String> = store
        .nodes_with_label(VIRTUAL_LABEL)
        .into_iter()
        .map(|n| n.uuid)
        .collect();

    assert_eq!(first.node_count, second.node_count);
    assert_eq!(first.relationship_count, second.relationship_count);
    assert_eq!(first.unresolved_references, second.unresolved_references);
    assert_eq!(first_virtual, second_virtual);
    assert_eq!(first_relationships, relationship_set(&store));
}

#[test_log::test(tokio::test)]
async fn test_write_failure_after_clear_leaves_store_empty() {
    let inner = Arc::new(InMemoryGraphStore::new());
    let seeded = pipeline(inner.clone())
        .run(vec![import_file("system.arxml", RESOLVED_REFERENCE_ARXML)])
        .await;
    assert!(seeded.success);
    assert_eq!(inner.node_count(), 3);

    let failing = Arc::new(FailingGraphStore::new(inner.clone()));
    let outcome = pipeline(failing.clone())
        .run(vec![import_file("system.arxml", RESOLVED_REFERENCE_ARXML)])
        .await;

    assert!(!outcome.success);
    assert!(outcome.error.unwrap_or_default().contains("simulated transaction failure"));
    assert_eq!(failing.clear_calls(), 1);
    assert_eq!(inner.node_count(), 0);
    assert!(inner.latest_import().await.unwrap().is_none());
}

#[test_log::test(tokio::test)]
async fn test_parse_failure_aborts_before_clear() {
    let inner = Arc::new(InMemoryGraphStore::new());
    let failing = Arc::new(FailingGraphStore::new(inner.clone()));

    let outcome = pipeline(failing.clone())
        .run(vec![
            import_file("good.arxml", RESOLVED_REFERENCE_ARXML),
            import_file("broken.arxml", "<AUTOSAR><AR-PACKAGES></AUTOSAR>"),
        ])
        .await;

    assert!(!outcome.success);
    assert!(outcome.error.unwrap_or_default().contains("broken.arxml"));
    assert_eq!(failing.clear_calls(), 0);
}
