//! Minimal XML document model over quick-xml.
//!
//! The adapters only need a small tree: named elements with string
//! attributes, child elements, and text content. Documents are parsed
//! whole (roster files and stores are small) and written back with an XML
//! declaration and indentation.

use crate::error::{CodecError, CodecResult};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// One element of an XML document tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    name: String,
    attributes: Vec<(String, String)>,
    children: Vec<XmlElement>,
    text: Option<String>,
}

impl XmlElement {
    /// Creates an empty element with the given tag name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
            text: None,
        }
    }

    /// Returns the tag name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets an attribute, replacing any existing value.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(existing) = self.attributes.iter_mut().find(|(n, _)| *n == name) {
            existing.1 = value;
        } else {
            self.attributes.push((name, value));
        }
    }

    /// Builder-style attribute setter.
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Returns an attribute value.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns the attributes in document order.
    #[must_use]
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Sets the text content.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = Some(text.into());
    }

    /// Builder-style text setter.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.set_text(text);
        self
    }

    /// Returns the text content, if any.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Appends a child element.
    pub fn push_child(&mut self, child: XmlElement) {
        self.children.push(child);
    }

    /// Builder-style child appender.
    #[must_use]
    pub fn with_child(mut self, child: XmlElement) -> Self {
        self.push_child(child);
        self
    }

    /// Returns the children in document order.
    #[must_use]
    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    /// Returns mutable access to the children, for in-place node updates.
    pub fn children_mut(&mut self) -> &mut Vec<XmlElement> {
        &mut self.children
    }

    /// Returns the first child with the given tag name.
    #[must_use]
    pub fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Returns the text content of the first child with the given tag name.
    #[must_use]
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).and_then(XmlElement::text)
    }

    /// Parses a complete document and returns its root element.
    ///
    /// # Errors
    ///
    /// Returns a malformed-data error for any syntax error, mismatched
    /// tags, or a document without a root element.
    pub fn parse(input: &str) -> CodecResult<XmlElement> {
        let mut reader = Reader::from_str(input);
        reader.config_mut().trim_text(true);

        let mut stack: Vec<XmlElement> = Vec::new();
        let mut root: Option<XmlElement> = None;
        loop {
            match reader.read_event() {
                Err(e) => return Err(CodecError::malformed(format!("xml parse error: {e}"))),
                Ok(Event::Eof) => break,
                Ok(Event::Start(start)) => {
                    stack.push(element_from_start(&start)?);
                }
                Ok(Event::Empty(start)) => {
                    let element = element_from_start(&start)?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::End(_)) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| CodecError::malformed("unmatched closing tag"))?;
                    attach(&mut stack, &mut root, element)?;
                }
                Ok(Event::Text(text)) => {
                    let value = text
                        .unescape()
                        .map_err(|e| CodecError::malformed(format!("xml text: {e}")))?;
                    if !value.is_empty() {
                        if let Some(top) = stack.last_mut() {
                            top.set_text(value.into_owned());
                        }
                    }
                }
                Ok(Event::CData(data)) => {
                    let value = String::from_utf8_lossy(&data).into_owned();
                    if let Some(top) = stack.last_mut() {
                        top.set_text(value);
                    }
                }
                Ok(Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_)) => {}
            }
        }
        if !stack.is_empty() {
            return Err(CodecError::malformed("unclosed element at end of document"));
        }
        root.ok_or_else(|| CodecError::malformed("document has no root element"))
    }

    /// Serializes this element as a standalone document.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be written.
    pub fn to_document_string(&self) -> CodecResult<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|e| CodecError::encode(format!("xml write: {e}")))?;
        write_element(&mut writer, self)?;
        String::from_utf8(writer.into_inner())
            .map_err(|e| CodecError::encode(format!("xml output not utf-8: {e}")))
    }
}

fn element_from_start(start: &BytesStart<'_>) -> CodecResult<XmlElement> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = XmlElement::new(name);
    for attribute in start.attributes() {
        let attribute =
            attribute.map_err(|e| CodecError::malformed(format!("xml attribute: {e}")))?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|e| CodecError::malformed(format!("xml attribute value: {e}")))?;
        element.set_attr(key, value.into_owned());
    }
    Ok(element)
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> CodecResult<()> {
    if let Some(parent) = stack.last_mut() {
        parent.push_child(element);
    } else if root.is_none() {
        *root = Some(element);
    } else {
        return Err(CodecError::malformed("multiple root elements"));
    }
    Ok(())
}

fn write_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    element: &XmlElement,
) -> CodecResult<()> {
    let mut start = BytesStart::new(element.name());
    for (name, value) in element.attributes() {
        start.push_attribute((name.as_str(), value.as_str()));
    }
    if element.children().is_empty() && element.text().is_none() {
        writer
            .write_event(Event::Empty(start))
            .map_err(|e| CodecError::encode(format!("xml write: {e}")))?;
        return Ok(());
    }
    writer
        .write_event(Event::Start(start))
        .map_err(|e| CodecError::encode(format!("xml write: {e}")))?;
    if let Some(text) = element.text() {
        writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(|e| CodecError::encode(format!("xml write: {e}")))?;
    }
    for child in element.children() {
        write_element(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new(element.name())))
        .map_err(|e| CodecError::encode(format!("xml write: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roster_doc() -> XmlElement {
        XmlElement::new("roster")
            .with_child(
                XmlElement::new("player")
                    .with_attr("id", "1")
                    .with_child(XmlElement::new("region").with_text("EU"))
                    .with_child(XmlElement::new("server").with_text("S1"))
                    .with_child(XmlElement::new("name").with_text("Alice")),
            )
            .with_child(
                XmlElement::new("player")
                    .with_attr("id", "2")
                    .with_child(XmlElement::new("region").with_text("NA"))
                    .with_child(XmlElement::new("server").with_text("S3"))
                    .with_child(XmlElement::new("name").with_text("Bob")),
            )
    }

    #[test]
    fn document_roundtrip() {
        let document = roster_doc();
        let serialized = document.to_document_string().unwrap();
        let parsed = XmlElement::parse(&serialized).unwrap();
        assert_eq!(parsed, document);
    }

    #[test]
    fn attribute_and_child_access() {
        let document = roster_doc();
        let first = &document.children()[0];
        assert_eq!(first.attr("id"), Some("1"));
        assert_eq!(first.child_text("region"), Some("EU"));
        assert_eq!(first.child_text("name"), Some("Alice"));
        assert!(first.child("missing").is_none());
    }

    #[test]
    fn set_attr_replaces() {
        let mut element = XmlElement::new("player").with_attr("id", "1");
        element.set_attr("id", "9");
        assert_eq!(element.attr("id"), Some("9"));
        assert_eq!(element.attributes().len(), 1);
    }

    #[test]
    fn escaped_text_roundtrip() {
        let document = XmlElement::new("roster").with_child(
            XmlElement::new("player")
                .with_attr("id", "1")
                .with_child(XmlElement::new("name").with_text("A & B <C>")),
        );
        let serialized = document.to_document_string().unwrap();
        let parsed = XmlElement::parse(&serialized).unwrap();
        assert_eq!(
            parsed.children()[0].child_text("name"),
            Some("A & B <C>")
        );
    }

    #[test]
    fn empty_root_roundtrip() {
        let document = XmlElement::new("roster");
        let serialized = document.to_document_string().unwrap();
        let parsed = XmlElement::parse(&serialized).unwrap();
        assert_eq!(parsed.name(), "roster");
        assert!(parsed.children().is_empty());
    }

    #[test]
    fn malformed_document_rejected() {
        assert!(XmlElement::parse("<roster><player></roster>").is_err());
        assert!(XmlElement::parse("").is_err());
        assert!(XmlElement::parse("no markup at all").is_err());
    }
}
