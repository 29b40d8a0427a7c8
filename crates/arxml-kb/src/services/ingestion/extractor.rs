//! Single-pass walk of the document tree into nodes, containment edges and
//! pending references.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::data::{
    entities::{GraphNode, GraphRelationship, PendingReference, Properties},
    types::{DocValue, ReferenceTarget, IDENTITY_KEY, SHORT_NAME_KEY, TEXT_KEY},
};

/// How a key of an element map is handled by the walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// Object or list valued child, descended into.
    Containment,
    /// `-REF` / `-TREF` key whose values are paths.
    SimpleReference,
    /// `-IREF` wrapper holding simple references directly or inside one
    /// instance level (`-IREF` or `-INSTANCE-REF`).
    IndirectReference,
    /// Anything else; stored as a node property.
    Scalar,
}

/// Classifies a key by its suffix first, then by the shape of its value.
pub fn classify_key(key: &str, value: &DocValue) -> KeyKind {
    if key.ends_with("-IREF") {
        KeyKind::IndirectReference
    } else if key.ends_with("-REF") || key.ends_with("-TREF") {
        KeyKind::SimpleReference
    } else if value.is_container() {
        KeyKind::Containment
    } else {
        KeyKind::Scalar
    }
}

/// Derives a graph label from a tag name: every character that is not ASCII
/// alphanumeric becomes `_`.
pub fn normalize_label(tag: &str) -> String {
    tag.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Accumulators for one extraction run. A fresh context is created per
/// import; nothing here outlives the run.
#[derive(Debug, Default)]
pub struct ExtractionContext {
    pub nodes: Vec<GraphNode>,
    pub containment: Vec<GraphRelationship>,
    pub pending: Vec<PendingReference>,
    /// References that could not be registered: no node above them, or a
    /// payload with no usable path.
    pub dropped_references: usize,
    seen_nodes: HashSet<String>,
    seen_containment: HashSet<(String, String)>,
    seen_pending: HashSet<(String, String, String)>,
}

impl ExtractionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Walks every top-level entry of a merged document root.
    pub fn extract_root(&mut self, root: &DocValue) {
        match root {
            DocValue::Object(map) => {
                for (tag, value) in map {
                    self.extract(value, tag, None, "");
                }
            }
            DocValue::List(items) => {
                for item in items {
                    self.extract_root(item);
                }
            }
            DocValue::Leaf(_) => {}
        }
    }

    /// Extracts one element (or every occurrence of a repeated element) found
    /// under `tag`.
    ///
    /// `parent_id` is the nearest node above this element, `path_prefix` the
    /// semantic path accumulated so far.
    pub fn extract(
        &mut self,
        element: &DocValue,
        tag: &str,
        parent_id: Option<&str>,
        path_prefix: &str,
    ) {
        let map = match element {
            DocValue::Object(map) => map,
            DocValue::List(items) => {
                for item in items {
                    self.extract(item, tag, parent_id, path_prefix);
                }
                return;
            }
            DocValue::Leaf(_) => return,
        };

        let short_name = map
            .get(SHORT_NAME_KEY)
            .and_then(DocValue::text)
            .map(str::trim)
            .filter(|name| !name.is_empty());
        let identity = map
            .get(IDENTITY_KEY)
            .and_then(DocValue::text)
            .map(str::trim)
            .filter(|uuid| !uuid.is_empty());

        let path = match short_name {
            Some(name) => format!("{path_prefix}/{name}"),
            None => path_prefix.to_string(),
        };

        let own_id = match (identity, short_name) {
            (Some(uuid), Some(name)) => {
                self.register_node(uuid, name, tag, &path, element);
                if let Some(parent) = parent_id {
                    self.register_containment(parent, uuid);
                }
                Some(uuid)
            }
            _ => None,
        };
        let source = own_id.or(parent_id);

        for (key, value) in map {
            match classify_key(key, value) {
                KeyKind::SimpleReference => self.register_references(key, value, source, None),
                KeyKind::IndirectReference => self.register_indirect(key, value, source),
                KeyKind::Containment => self.extract(value, key, source, &path),
                KeyKind::Scalar => {}
            }
        }
    }

    fn register_node(&mut self, uuid: &str, name: &str, tag: &str, path: &str, element: &DocValue) {
        if !self.seen_nodes.insert(uuid.to_string()) {
            debug!(uuid, path, "Skipping already extracted node");
            return;
        }

        let mut properties = Properties::new();
        properties.insert("uuid".to_string(), uuid.to_string());
        properties.insert("name".to_string(), name.to_string());
        properties.insert("arxmlPath".to_string(), path.to_string());
        properties.insert("originalXmlTag".to_string(), tag.to_string());

        if let DocValue::Object(map) = element {
            for (key, value) in map {
                if key == IDENTITY_KEY || key == SHORT_NAME_KEY || key == TEXT_KEY {
                    continue;
                }
                if classify_key(key, value) != KeyKind::Scalar {
                    continue;
                }
                if let Some(text) = value.as_leaf() {
                    properties
                        .entry(key.clone())
                        .or_insert_with(|| text.to_string());
                }
            }
        }

        self.nodes.push(GraphNode {
            uuid: uuid.to_string(),
            label: normalize_label(tag),
            properties,
        });
    }

    fn register_containment(&mut self, parent: &str, child: &str) {
        if parent == child {
            return;
        }
        if self
            .seen_containment
            .insert((parent.to_string(), child.to_string()))
        {
            self.containment.push(GraphRelationship::contains(parent, child));
        }
    }

    /// Registers every value of a `-REF` / `-TREF` key. `instance_ref` names
    /// the `-IREF` wrapper the reference was found in, if any.
    fn register_references(
        &mut self,
        rel_type: &str,
        value: &DocValue,
        source: Option<&str>,
        instance_ref: Option<&str>,
    ) {
        for item in value.items() {
            let Some(target) = ReferenceTarget::from_value(item) else {
                warn!(rel_type, source = ?source, "Dropping reference without a target path");
                self.dropped_references += 1;
                continue;
            };
            let Some(from) = source else {
                debug!(rel_type, path = %target.path, "Dropping reference without source node");
                self.dropped_references += 1;
                continue;
            };

            let key = (from.to_string(), target.path.clone(), rel_type.to_string());
            if !self.seen_pending.insert(key) {
                continue;
            }

            let mut properties = Properties::new();
            if let Some(wrapper) = instance_ref {
                properties.insert("instanceRef".to_string(), wrapper.to_string());
                if let Some(dest) = &target.destination_type {
                    properties.insert("destinationType".to_string(), dest.clone());
                }
            }

            self.pending.push(PendingReference {
                from: from.to_string(),
                target_path: target.path,
                rel_type: rel_type.to_string(),
                destination_type: target.destination_type,
                properties,
            });
        }
    }

    /// Handles an `-IREF` wrapper. A nested instance level is unwrapped one
    /// more level; otherwise the wrapper's own simple references are taken.
    /// Both shapes register the same references.
    fn register_indirect(&mut self, wrapper: &str, value: &DocValue, source: Option<&str>) {
        for item in value.items() {
            let Some(map) = item.as_object() else {
                continue;
            };

            let nested: Vec<&DocValue> = map
                .iter()
                .filter(|(key, nested)| is_instance_level(key, nested))
                .map(|(_, nested)| nested)
                .collect();

            if nested.is_empty() {
                self.register_simple_children(wrapper, map.iter(), source);
            } else {
                for inner in nested.into_iter().flat_map(DocValue::items) {
                    if let Some(inner_map) = inner.as_object() {
                        self.register_simple_children(wrapper, inner_map.iter(), source);
                    }
                }
            }
        }
    }

    fn register_simple_children<'a>(
        &mut self,
        wrapper: &str,
        entries: impl Iterator<Item = (&'a String, &'a DocValue)>,
        source: Option<&str>,
    ) {
        for (key, value) in entries {
            if classify_key(key, value) == KeyKind::SimpleReference {
                self.register_references(key, value, source, Some(wrapper));
            }
        }
    }
}

/// True for the level an `-IREF` wrapper nests its references in: an `-IREF`
/// or `-INSTANCE-REF` key, or any reference-suffixed key whose value is an
/// element holding further references instead of a path.
fn is_instance_level(key: &str, value: &DocValue) -> bool {
    if key.ends_with("-IREF") || key.ends_with("-INSTANCE-REF") {
        return true;
    }
    key.ends_with("-REF")
        && value.items().any(|item| match item {
            DocValue::Object(map) => {
                !map.contains_key(TEXT_KEY)
                    && map.iter().any(|(k, v)| classify_key(k, v) == KeyKind::SimpleReference)
            }
            _ => false,
        })
}
