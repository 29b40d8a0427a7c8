//! Document parser implementations

mod xml_reader;

pub use xml_reader::XmlDocumentParser;
