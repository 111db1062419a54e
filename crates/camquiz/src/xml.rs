//! Namespace-resolved XML element tree.
//!
//! Descriptor payloads are small (a few hundred KB at most), so the whole
//! document is read into an owned tree with `quick_xml::NsReader` and then
//! navigated by namespace URI and local name, the way DOM
//! `getElementsByTagNameNS` / `getAttributeNS` do.

use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::NsReader;

use crate::types::{QuizError, QuizResult};

/// Deepest element nesting accepted by [`parse_document`].
pub const MAX_DEPTH: usize = 256;

/// An attribute with its resolved namespace URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub namespace: Option<String>,
    pub local_name: String,
    pub value: String,
}

/// A child of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    Text(String),
}

/// An element with its resolved namespace URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    pub namespace: Option<String>,
    pub local_name: String,
    pub attributes: Vec<XmlAttribute>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    /// True if this element has the given namespace URI and local name.
    pub fn is(&self, namespace: &str, local_name: &str) -> bool {
        self.local_name == local_name && self.namespace.as_deref() == Some(namespace)
    }

    /// Value of the attribute `{namespace}local_name`, if present.
    pub fn attribute_ns(&self, namespace: &str, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.local_name == local_name && a.namespace.as_deref() == Some(namespace))
            .map(|a| a.value.as_str())
    }

    pub fn has_attribute_ns(&self, namespace: &str, local_name: &str) -> bool {
        self.attribute_ns(namespace, local_name).is_some()
    }

    /// Direct child elements.
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(|c| match c {
            XmlNode::Element(e) => Some(e),
            XmlNode::Text(_) => None,
        })
    }

    /// All descendant elements (excluding `self`) matching the name, in
    /// document order.
    pub fn descendants_ns<'a>(&'a self, namespace: &str, local_name: &str) -> Vec<&'a XmlElement> {
        let mut found = Vec::new();
        collect_descendants(self, namespace, local_name, &mut found);
        found
    }

    /// First descendant element (excluding `self`) matching the name.
    pub fn first_descendant_ns(&self, namespace: &str, local_name: &str) -> Option<&XmlElement> {
        for child in self.child_elements() {
            if child.is(namespace, local_name) {
                return Some(child);
            }
            if let Some(found) = child.first_descendant_ns(namespace, local_name) {
                return Some(found);
            }
        }
        None
    }

    /// Concatenated text of all descendant text nodes, trimmed.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        append_text(self, &mut out);
        out.trim().to_string()
    }
}

fn collect_descendants<'a>(
    element: &'a XmlElement,
    namespace: &str,
    local_name: &str,
    found: &mut Vec<&'a XmlElement>,
) {
    for child in element.child_elements() {
        if child.is(namespace, local_name) {
            found.push(child);
        }
        collect_descendants(child, namespace, local_name, found);
    }
}

fn append_text(element: &XmlElement, out: &mut String) {
    for child in &element.children {
        match child {
            XmlNode::Text(t) => out.push_str(t),
            XmlNode::Element(e) => append_text(e, out),
        }
    }
}

/// Parse an XML string into its root element.
///
/// Fails on anything that is not a single well-formed document: reader
/// errors, mismatched or unclosed tags, missing root, or a second root.
/// Elements nested deeper than [`MAX_DEPTH`] are rejected, which keeps
/// every walk over the tree within a bounded stack.
pub fn parse_document(xml: &str) -> QuizResult<XmlElement> {
    let mut reader = NsReader::from_str(xml);
    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root: Option<XmlElement> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| QuizError::Parse(e.to_string()))?;

        match event {
            Event::Start(e) => {
                check_depth(stack.len())?;
                let element = element_from_start(&reader, &e)?;
                stack.push(element);
            }
            Event::Empty(e) => {
                check_depth(stack.len())?;
                let element = element_from_start(&reader, &e)?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::End(_) => {
                let element = stack
                    .pop()
                    .ok_or_else(|| QuizError::Parse("unexpected closing tag".to_string()))?;
                attach(&mut stack, &mut root, element)?;
            }
            Event::Text(e) => {
                let text = e
                    .unescape()
                    .map_err(|err| QuizError::Parse(err.to_string()))?;
                push_text(&mut stack, &text)?;
            }
            Event::CData(e) => {
                let bytes = e.into_inner();
                push_text(&mut stack, &String::from_utf8_lossy(&bytes))?;
            }
            Event::Eof => break,
            // Declarations, comments, processing instructions, doctype
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(QuizError::Parse(format!(
            "unclosed element <{}>",
            open.local_name
        )));
    }

    root.ok_or_else(|| QuizError::Parse("no root element".to_string()))
}

/// `open` is the number of enclosing elements of the one being started.
fn check_depth(open: usize) -> QuizResult<()> {
    if open >= MAX_DEPTH {
        return Err(QuizError::Parse(format!("elements nested deeper than {MAX_DEPTH}")));
    }
    Ok(())
}

fn element_from_start(reader: &NsReader<&[u8]>, start: &BytesStart<'_>) -> QuizResult<XmlElement> {
    let (ns, local) = reader.resolve_element(start.name());
    let namespace = namespace_uri(ns);
    let local_name = String::from_utf8_lossy(local.as_ref()).into_owned();

    let mut attributes = Vec::new();
    for attr in start.attributes() {
        let attr = attr.map_err(|e| QuizError::Parse(format!("bad attribute: {e}")))?;
        // xmlns / xmlns:prefix declarations are consumed by the reader
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let (ns, local) = reader.resolve_attribute(attr.key);
        let value = attr
            .unescape_value()
            .map_err(|e| QuizError::Parse(format!("bad attribute value: {e}")))?
            .into_owned();
        attributes.push(XmlAttribute {
            namespace: namespace_uri(ns),
            local_name: String::from_utf8_lossy(local.as_ref()).into_owned(),
            value,
        });
    }

    Ok(XmlElement {
        namespace,
        local_name,
        attributes,
        children: Vec::new(),
    })
}

/// Undeclared prefixes resolve to no namespace, so they never match a
/// namespaced lookup.
fn namespace_uri(result: ResolveResult<'_>) -> Option<String> {
    match result {
        ResolveResult::Bound(ns) => Some(String::from_utf8_lossy(ns.as_ref()).into_owned()),
        ResolveResult::Unbound | ResolveResult::Unknown(_) => None,
    }
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> QuizResult<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(XmlNode::Element(element));
        Ok(())
    } else if root.is_none() {
        *root = Some(element);
        Ok(())
    } else {
        Err(QuizError::Parse("multiple root elements".to_string()))
    }
}

fn push_text(stack: &mut [XmlElement], text: &str) -> QuizResult<()> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(XmlNode::Text(text.to_string()));
            Ok(())
        }
        None if text.trim().is_empty() => Ok(()),
        None => Err(QuizError::Parse("text outside root element".to_string())),
    }
}
