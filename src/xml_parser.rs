//! XML Parser Module
//!
//! This module turns a DMARC XML report into a generic nested tree. Every child
//! key of an [`Element`] maps to a sequence of nodes, so a field that appears
//! once and a field that repeats are read through the same accessors.
//!
//! It enforces a recursion depth limit to protect against attacks such as the
//! Billion Laughs attack, and it never expands DOCTYPE entities: a DOCTYPE block
//! with two or more entity definitions is rejected, any other DOCTYPE block is
//! removed before parsing.

use crate::error::{DmarcError, Result};
use quick_xml::events::Event;
use quick_xml::reader::Reader;
use std::borrow::Cow;

/// Maximum element nesting accepted in a report.
pub const MAX_DEPTH: usize = 20;

/// A node of the parsed tree: either a leaf with its text or a nested element.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Element(Element),
}

impl Node {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(text) => Some(text),
            Node::Element(_) => None,
        }
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }
}

/// An element's children, grouped by tag name in document order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    children: Vec<(String, Vec<Node>)>,
}

impl Element {
    fn push(&mut self, name: String, node: Node) {
        match self.children.iter_mut().find(|(key, _)| *key == name) {
            Some((_, nodes)) => nodes.push(node),
            None => self.children.push((name, vec![node])),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// All nodes stored under `key`; empty when the key is absent.
    pub fn all(&self, key: &str) -> &[Node] {
        self.children
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, nodes)| nodes.as_slice())
            .unwrap_or(&[])
    }

    pub fn first(&self, key: &str) -> Option<&Node> {
        self.all(key).first()
    }

    /// First node under `key` when it is a nested element.
    pub fn element(&self, key: &str) -> Option<&Element> {
        self.first(key).and_then(Node::as_element)
    }

    /// First node under `key` when it is a leaf.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.first(key).and_then(Node::as_text)
    }

    /// Every child node with its tag name, in document order of first appearance.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.children
            .iter()
            .flat_map(|(name, nodes)| nodes.iter().map(move |node| (name.as_str(), node)))
    }
}

struct OpenElement {
    name: String,
    children: Element,
    text: String,
}

impl OpenElement {
    fn finish(self) -> (String, Node) {
        let node = if self.children.is_empty() {
            Node::Text(self.text.trim().to_string())
        } else {
            Node::Element(self.children)
        };
        (self.name, node)
    }
}

/// Parses the DMARC XML content into a document element whose children are the
/// top-level elements (normally a single `feedback`).
///
/// # Errors
///
/// Returns an error if the XML is malformed, if the recursion depth limit is
/// exceeded, if the DOCTYPE block defines two or more entities, or if the
/// document has no root element.
pub fn parse_document(xml_content: &str) -> Result<Element> {
    let cleaned_xml = strip_doctype(xml_content)?;
    let mut reader = Reader::from_str(&cleaned_xml);
    reader.config_mut().trim_text(true);

    let mut document = Element::default();
    let mut stack: Vec<OpenElement> = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if stack.len() >= MAX_DEPTH {
                    return Err(DmarcError::Format(
                        "XML recursion depth limit exceeded".into(),
                    ));
                }
                stack.push(OpenElement {
                    name: tag_name(e.local_name().as_ref()),
                    children: Element::default(),
                    text: String::new(),
                });
            }
            Event::Empty(e) => {
                let name = tag_name(e.local_name().as_ref());
                attach(&mut stack, &mut document, name, Node::Text(String::new()));
            }
            Event::Text(e) => {
                if let Some(open) = stack.last_mut() {
                    let text = e
                        .unescape()
                        .map_err(|err| DmarcError::Format(format!("Bad text content: {}", err)))?;
                    open.text.push_str(&text);
                }
            }
            Event::CData(e) => {
                if let Some(open) = stack.last_mut() {
                    open.text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(_) => {
                let open = stack
                    .pop()
                    .ok_or_else(|| DmarcError::Format("Unexpected closing tag".into()))?;
                let (name, node) = open.finish();
                attach(&mut stack, &mut document, name, node);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(DmarcError::Format(format!("Unclosed element <{}>", open.name)));
    }
    if document.is_empty() {
        return Err(DmarcError::Format("Document has no root element".into()));
    }
    Ok(document)
}

fn attach(stack: &mut [OpenElement], document: &mut Element, name: String, node: Node) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(name, node),
        None => document.push(name, node),
    }
}

fn tag_name(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).into_owned()
}

/// Removes the DOCTYPE block, refusing documents that declare two or more entities.
fn strip_doctype(xml_content: &str) -> Result<Cow<'_, str>> {
    let Some(start) = xml_content.find("<!DOCTYPE") else {
        return Ok(Cow::Borrowed(xml_content));
    };
    let Some(end) = xml_content[start..].find("]>") else {
        // No internal subset; quick-xml skips the declaration itself.
        return Ok(Cow::Borrowed(xml_content));
    };
    let doctype = &xml_content[start..start + end + 2];
    if doctype.matches("<!ENTITY").count() >= 2 {
        return Err(DmarcError::Format("Recursive entities detected".into()));
    }
    log::warn!("Stripping DOCTYPE block from report");
    let before = &xml_content[..start];
    let after = &xml_content[start + end + 2..];
    Ok(Cow::Owned(format!("{}{}", before, after)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_and_single_children_share_shape() {
        let xml = r#"
        <feedback>
            <record><row><count>1</count></row></record>
            <record><row><count>2</count></row></record>
            <report_metadata><org_name>google.com</org_name></report_metadata>
        </feedback>
        "#;
        let doc = parse_document(xml).unwrap();
        let feedback = doc.element("feedback").unwrap();
        assert_eq!(feedback.all("record").len(), 2);
        assert_eq!(feedback.all("report_metadata").len(), 1);
        assert!(feedback.all("policy_published").is_empty());
        let counts: Vec<&str> = feedback
            .all("record")
            .iter()
            .filter_map(|r| r.as_element()?.element("row")?.text("count"))
            .collect();
        assert_eq!(counts, vec!["1", "2"]);
    }

    #[test]
    fn test_leaf_text_is_trimmed_and_unescaped() {
        let xml = "<feedback><org_name>  Mail &amp; Co  </org_name><note><![CDATA[a<b]]></note></feedback>";
        let doc = parse_document(xml).unwrap();
        let feedback = doc.element("feedback").unwrap();
        assert_eq!(feedback.text("org_name"), Some("Mail & Co"));
        assert_eq!(feedback.text("note"), Some("a<b"));
    }

    #[test]
    fn test_empty_elements_and_attributes() {
        let xml = r#"<feedback xmlns:x="urn:x"><sp/><x:domain kind="a">example.com</x:domain></feedback>"#;
        let doc = parse_document(xml).unwrap();
        let feedback = doc.element("feedback").unwrap();
        assert_eq!(feedback.text("sp"), Some(""));
        assert_eq!(feedback.text("domain"), Some("example.com"));
    }

    #[test]
    fn test_entries_keep_document_order() {
        let xml = "<reason><type>forwarded</type><comment>list</comment></reason>";
        let doc = parse_document(xml).unwrap();
        let reason = doc.element("reason").unwrap();
        let keys: Vec<&str> = reason.entries().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["type", "comment"]);
    }

    #[test]
    fn test_single_entity_doctype_is_stripped() {
        let xml = r#"<?xml version="1.0"?>
        <!DOCTYPE foo [
            <!ENTITY xxe SYSTEM "file:///etc/passwd">
        ]>
        <feedback><source_ip>1.2.3.4</source_ip></feedback>"#;
        let doc = parse_document(xml).unwrap();
        assert_eq!(doc.element("feedback").unwrap().text("source_ip"), Some("1.2.3.4"));
    }

    #[test]
    fn test_recursive_entities_rejected() {
        let xml = r#"<!DOCTYPE lolz [
            <!ENTITY lol "lol">
            <!ENTITY lol2 "&lol;&lol;">
        ]>
        <feedback>&lol2;</feedback>"#;
        assert!(matches!(parse_document(xml), Err(DmarcError::Format(_))));
    }

    #[test]
    fn test_depth_limit() {
        let xml = format!("{}{}", "<a>".repeat(MAX_DEPTH + 1), "</a>".repeat(MAX_DEPTH + 1));
        let err = parse_document(&xml).unwrap_err();
        assert!(err.to_string().contains("depth limit"));
    }

    #[test]
    fn test_malformed_documents() {
        assert!(parse_document("<feedback><row></feedback>").is_err());
        assert!(parse_document("<feedback>").is_err());
        assert!(parse_document("   ").is_err());
    }
}
