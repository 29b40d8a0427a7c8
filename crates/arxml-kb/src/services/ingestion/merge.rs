//! Combines the per-file trees into one logical document.

use std::collections::BTreeMap;

use crate::data::{errors::ImportError, types::DocValue};

/// Merges parsed documents key by key. A top-level key present in more than
/// one document becomes a list of every occurrence, in input order.
pub fn merge_documents(documents: Vec<DocValue>) -> Result<DocValue, ImportError> {
    let mut merged: BTreeMap<String, DocValue> = BTreeMap::new();
    for document in documents {
        merge_into(&mut merged, document);
    }

    if merged.is_empty() {
        return Err(ImportError::Merge(
            "parsed documents contain no element content".to_string(),
        ));
    }
    Ok(DocValue::Object(merged))
}

fn merge_into(merged: &mut BTreeMap<String, DocValue>, document: DocValue) {
    match document {
        DocValue::Object(map) => {
            for (key, value) in map {
                DocValue::push_child(merged, key, value);
            }
        }
        DocValue::List(items) => {
            for item in items {
                merge_into(merged, item);
            }
        }
        DocValue::Leaf(_) => {}
    }
}
