//! Explicit document tree consumed by the extractor.
//!
//! The parser produces a `DocValue` per file. Attributes are merged onto the
//! element map next to child elements, repeated children collapse into a
//! `List`, and character data of an element that also carries attributes or
//! children lives under [`TEXT_KEY`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key under which an element's character data is stored when the element is
/// not a plain text leaf.
pub const TEXT_KEY: &str = "#text";

/// Attribute carrying the document's own identity for an element.
pub const IDENTITY_KEY: &str = "UUID";

/// Child element carrying the human-readable short name.
pub const SHORT_NAME_KEY: &str = "SHORT-NAME";

/// Attribute on reference elements hinting at the destination element type.
pub const DESTINATION_KEY: &str = "DEST";

/// Recursive value of a parsed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocValue {
    Leaf(String),
    List(Vec<DocValue>),
    Object(BTreeMap<String, DocValue>),
}

impl DocValue {
    /// Convenience constructor for a text leaf.
    pub fn leaf(value: impl Into<String>) -> Self {
        DocValue::Leaf(value.into())
    }

    /// Builds an object from `(key, value)` pairs.
    pub fn object<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, DocValue)>,
    {
        DocValue::Object(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn as_leaf(&self) -> Option<&str> {
        match self {
            DocValue::Leaf(value) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, DocValue>> {
        match self {
            DocValue::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Looks up a key on an object value.
    pub fn get(&self, key: &str) -> Option<&DocValue> {
        self.as_object().and_then(|map| map.get(key))
    }

    /// Character data of this value: the leaf itself, or the `#text` entry of
    /// an element that also has attributes. A repeated element yields the text
    /// of its first occurrence.
    pub fn text(&self) -> Option<&str> {
        match self {
            DocValue::Leaf(value) => Some(value.as_str()),
            DocValue::Object(map) => map.get(TEXT_KEY).and_then(DocValue::as_leaf),
            DocValue::List(items) => items.first().and_then(DocValue::text),
        }
    }

    /// True for object and list values, the shapes the extractor descends into.
    pub fn is_container(&self) -> bool {
        matches!(self, DocValue::Object(_) | DocValue::List(_))
    }

    /// Iterates the occurrences of a value: every item of a list, or the value
    /// itself otherwise.
    pub fn items(&self) -> std::slice::Iter<'_, DocValue> {
        match self {
            DocValue::List(items) => items.iter(),
            other => std::slice::from_ref(other).iter(),
        }
    }

    /// Appends `value` under `key`, turning an existing entry into a list.
    /// Used by the parser for repeated child elements and by the merger.
    pub fn push_child(map: &mut BTreeMap<String, DocValue>, key: String, value: DocValue) {
        match map.remove(&key) {
            None => {
                map.insert(key, value);
            }
            Some(DocValue::List(mut items)) => {
                items.push(value);
                map.insert(key, DocValue::List(items));
            }
            Some(existing) => {
                map.insert(key, DocValue::List(vec![existing, value]));
            }
        }
    }
}

/// Normalized payload of a reference element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceTarget {
    pub path: String,
    pub destination_type: Option<String>,
}

impl ReferenceTarget {
    /// Accepts either a bare path string or an object carrying the path as
    /// text plus an optional `DEST` hint. Paths are always returned with a
    /// leading `/`; empty payloads yield `None`.
    pub fn from_value(value: &DocValue) -> Option<Self> {
        let (raw_path, destination_type) = match value {
            DocValue::Leaf(path) => (path.as_str(), None),
            DocValue::Object(map) => (
                map.get(TEXT_KEY).and_then(DocValue::as_leaf)?,
                map.get(DESTINATION_KEY)
                    .and_then(DocValue::as_leaf)
                    .map(str::to_string),
            ),
            DocValue::List(_) => return None,
        };

        let trimmed = raw_path.trim();
        if trimmed.is_empty() {
            return None;
        }
        let path = if trimmed.starts_with('/') {
            trimmed.to_string()
        } else {
            format!("/{trimmed}")
        };

        Some(Self {
            path,
            destination_type,
        })
    }
}
