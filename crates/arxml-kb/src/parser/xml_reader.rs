use std::collections::BTreeMap;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::data::{
    errors::DocumentParseError,
    types::{DocValue, TEXT_KEY},
};
use crate::traits::DocumentParser;

/// Streaming XML reader producing a [`DocValue`] tree.
///
/// Attributes are stored next to child elements on the element map.
/// Namespace declarations and `xsi:` attributes are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlDocumentParser;

impl XmlDocumentParser {
    pub fn new() -> Self {
        Self
    }
}

/// An element that has been opened but not closed yet.
struct Frame {
    name: String,
    map: BTreeMap<String, DocValue>,
    text: String,
}

impl Frame {
    fn open(start: &BytesStart<'_>, position: usize) -> Result<Self, DocumentParseError> {
        let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
        let mut map = BTreeMap::new();

        for attribute in start.attributes() {
            let attribute = attribute.map_err(|e| DocumentParseError::Malformed {
                position,
                message: e.to_string(),
            })?;
            let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
            if key.starts_with("xmlns") || key.starts_with("xsi:") {
                continue;
            }
            let value = attribute
                .unescape_value()
                .map_err(|e| DocumentParseError::Malformed {
                    position,
                    message: e.to_string(),
                })?;
            map.insert(key, DocValue::Leaf(value.into_owned()));
        }

        Ok(Self {
            name,
            map,
            text: String::new(),
        })
    }

    /// Text-only elements collapse to a leaf; anything else keeps its text
    /// under `#text`.
    fn close(self) -> (String, DocValue) {
        let Frame { name, mut map, text } = self;
        if map.is_empty() {
            return (name, DocValue::Leaf(text));
        }
        if !text.trim().is_empty() {
            map.insert(TEXT_KEY.to_string(), DocValue::Leaf(text));
        }
        (name, DocValue::Object(map))
    }
}

fn attach(
    stack: &mut [Frame],
    root: &mut BTreeMap<String, DocValue>,
    name: String,
    value: DocValue,
) {
    match stack.last_mut() {
        Some(parent) => DocValue::push_child(&mut parent.map, name, value),
        None => DocValue::push_child(root, name, value),
    }
}

impl DocumentParser for XmlDocumentParser {
    fn parse(&self, content: &str) -> Result<DocValue, DocumentParseError> {
        let mut reader = Reader::from_str(content);
        reader.trim_text(true);

        let mut stack: Vec<Frame> = Vec::new();
        let mut root: BTreeMap<String, DocValue> = BTreeMap::new();

        loop {
            let position = reader.buffer_position();
            let event = reader.read_event().map_err(|e| DocumentParseError::Malformed {
                position,
                message: e.to_string(),
            })?;

            match event {
                Event::Start(start) => stack.push(Frame::open(&start, position)?),
                Event::Empty(start) => {
                    let (name, value) = Frame::open(&start, position)?.close();
                    attach(&mut stack, &mut root, name, value);
                }
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| DocumentParseError::Malformed {
                        position,
                        message: e.to_string(),
                    })?;
                    if let Some(frame) = stack.last_mut() {
                        frame.text.push_str(&text);
                    }
                }
                Event::CData(data) => {
                    if let Some(frame) = stack.last_mut() {
                        frame.text.push_str(&String::from_utf8_lossy(&data));
                    }
                }
                Event::End(end) => {
                    let Some(frame) = stack.pop() else {
                        return Err(DocumentParseError::UnbalancedClose(
                            String::from_utf8_lossy(end.name().as_ref()).into_owned(),
                        ));
                    };
                    let (name, value) = frame.close();
                    attach(&mut stack, &mut root, name, value);
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(frame) = stack.pop() {
            return Err(DocumentParseError::Unclosed(frame.name));
        }
        if root.is_empty() {
            return Err(DocumentParseError::Empty);
        }
        Ok(DocValue::Object(root))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::types::{DESTINATION_KEY, IDENTITY_KEY, SHORT_NAME_KEY};
    use pretty_assertions::assert_eq;

    fn parse(xml: &str) -> DocValue {
        XmlDocumentParser::new().parse(xml).unwrap()
    }

    #[test]
    fn test_attributes_merge_with_children() {
        let doc = parse(
            r#"<AUTOSAR xmlns="http://autosar.org/schema/r4.0" xmlns:xsi="x" xsi:schemaLocation="y">
                 <AR-PACKAGE UUID="p-1"><SHORT-NAME>Pkg</SHORT-NAME></AR-PACKAGE>
               </AUTOSAR>"#,
        );
        let root = doc.get("AUTOSAR").unwrap();
        assert_eq!(root.as_object().unwrap().len(), 1);
        let package = root.get("AR-PACKAGE").unwrap();
        assert_eq!(package.get(IDENTITY_KEY), Some(&DocValue::leaf("p-1")));
        assert_eq!(package.get(SHORT_NAME_KEY), Some(&DocValue::leaf("Pkg")));
    }

    #[test]
    fn test_repeated_children_become_list() {
        let doc = parse("<R><A>1</A><A>2</A><B/></R>");
        let root = doc.get("R").unwrap();
        assert_eq!(
            root.get("A"),
            Some(&DocValue::List(vec![DocValue::leaf("1"), DocValue::leaf("2")]))
        );
        assert_eq!(root.get("B"), Some(&DocValue::leaf("")));
    }

    #[test]
    fn test_reference_with_dest_keeps_text() {
        let doc = parse(
            r#"<R><TYPE-TREF DEST="APPLICATION-SW-COMPONENT-TYPE">/Pkg/Comp</TYPE-TREF></R>"#,
        );
        let reference = doc.get("R").and_then(|r| r.get("TYPE-TREF")).unwrap();
        assert_eq!(reference.get(TEXT_KEY), Some(&DocValue::leaf("/Pkg/Comp")));
        assert_eq!(
            reference.get(DESTINATION_KEY),
            Some(&DocValue::leaf("APPLICATION-SW-COMPONENT-TYPE"))
        );
    }

    #[test]
    fn test_entities_are_unescaped() {
        let doc = parse("<R><DESC>a &amp; b</DESC></R>");
        assert_eq!(doc.get("R").and_then(|r| r.get("DESC")), Some(&DocValue::leaf("a & b")));
    }

    #[test]
    fn test_malformed_input_is_rejected() {
        let parser = XmlDocumentParser::new();
        assert!(parser.parse("<R><A></B></R>").is_err());
        assert!(parser.parse("<R><A>").is_err());
        assert!(matches!(parser.parse("   "), Err(DocumentParseError::Empty)));
    }
}
