//! Generic attributed tree built from roster XML.
//!
//! XML cannot tell "zero or one" apart from "exactly one", so element names
//! that the roster schema allows to repeat are listed in [`REPEATED_ELEMENTS`]
//! and always stored as sequences, however many times they occur.

use std::collections::BTreeMap;
use std::slice;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::core_api::{CoreError, CoreErrorCode};

pub const ROOT_ELEMENT: &str = "roster";

pub const REPEATED_ELEMENTS: [&str; 9] = [
    "cost",
    "costLimit",
    "force",
    "selection",
    "category",
    "profile",
    "characteristic",
    "attribute",
    "rule",
];

pub fn is_repeated_element(name: &str) -> bool {
    REPEATED_ELEMENTS.contains(&name)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlChild {
    Single(XmlNode),
    Many(Vec<XmlNode>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    pub name: String,
    attributes: BTreeMap<String, String>,
    children: BTreeMap<String, XmlChild>,
    text: Option<String>,
}

impl XmlNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn attributes(&self) -> &BTreeMap<String, String> {
        &self.attributes
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn child_entry(&self, name: &str) -> Option<&XmlChild> {
        self.children.get(name)
    }

    /// First child element with this name.
    pub fn child(&self, name: &str) -> Option<&XmlNode> {
        match self.children.get(name)? {
            XmlChild::Single(node) => Some(node),
            XmlChild::Many(nodes) => nodes.first(),
        }
    }

    /// All child elements with this name, in document order.
    pub fn children(&self, name: &str) -> &[XmlNode] {
        match self.children.get(name) {
            Some(XmlChild::Single(node)) => slice::from_ref(node),
            Some(XmlChild::Many(nodes)) => nodes,
            None => &[],
        }
    }

    /// Items of a wrapped collection, e.g. `collection("forces", "force")`.
    pub fn collection(&self, wrapper: &str, item: &str) -> &[XmlNode] {
        self.child(wrapper).map_or(&[], |node| node.children(item))
    }

    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(name.into(), value.into());
    }

    pub fn push_child(&mut self, node: XmlNode) {
        if is_repeated_element(&node.name) {
            if let Some(XmlChild::Many(nodes)) = self.children.get_mut(&node.name) {
                nodes.push(node);
            } else {
                self.children
                    .insert(node.name.clone(), XmlChild::Many(vec![node]));
            }
            return;
        }

        match self.children.remove(&node.name) {
            None => {
                self.children
                    .insert(node.name.clone(), XmlChild::Single(node));
            }
            Some(XmlChild::Single(first)) => {
                self.children
                    .insert(node.name.clone(), XmlChild::Many(vec![first, node]));
            }
            Some(XmlChild::Many(mut nodes)) => {
                let key = node.name.clone();
                nodes.push(node);
                self.children.insert(key, XmlChild::Many(nodes));
            }
        }
    }

    fn append_text(&mut self, value: &str) {
        if value.is_empty() {
            return;
        }
        match &mut self.text {
            Some(existing) => existing.push_str(value),
            None => self.text = Some(value.to_string()),
        }
    }
}

/// Parses roster XML into a tree rooted at `<roster>`.
pub fn parse_roster_xml(text: &str) -> Result<XmlNode, CoreError> {
    let root = parse_document(text)?;
    if root.name != ROOT_ELEMENT {
        return Err(CoreError::new(
            CoreErrorCode::InvalidRoster,
            format!(
                "expected root element <{ROOT_ELEMENT}>, found <{}>",
                root.name
            ),
        ));
    }
    Ok(root)
}

fn parse_document(text: &str) -> Result<XmlNode, CoreError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        let event = match reader.read_event() {
            Ok(event) => event,
            Err(e) => {
                return Err(syntax_error(format!(
                    "malformed XML near byte {}: {e}",
                    reader.error_position()
                )));
            }
        };

        match event {
            Event::Start(start) => stack.push(node_from_start(&start)?),
            Event::Empty(start) => {
                let node = node_from_start(&start)?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| syntax_error("closing tag without matching open tag"))?;
                attach(&mut stack, &mut root, node)?;
            }
            Event::Text(raw) => {
                let value = raw
                    .unescape()
                    .map_err(|e| syntax_error(format!("invalid text content: {e}")))?;
                append_to_open_element(&mut stack, &value)?;
            }
            Event::CData(raw) => {
                let value = String::from_utf8_lossy(&raw.into_inner()).into_owned();
                append_to_open_element(&mut stack, &value)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(syntax_error(format!(
            "document ended inside <{}>",
            open.name
        )));
    }

    root.ok_or_else(|| {
        CoreError::new(
            CoreErrorCode::InvalidRoster,
            format!("document has no <{ROOT_ELEMENT}> root element"),
        )
    })
}

fn attach(
    stack: &mut [XmlNode],
    root: &mut Option<XmlNode>,
    node: XmlNode,
) -> Result<(), CoreError> {
    if let Some(parent) = stack.last_mut() {
        parent.push_child(node);
        return Ok(());
    }
    if root.is_some() {
        return Err(syntax_error(format!(
            "unexpected second root element <{}>",
            node.name
        )));
    }
    *root = Some(node);
    Ok(())
}

fn append_to_open_element(stack: &mut [XmlNode], value: &str) -> Result<(), CoreError> {
    match stack.last_mut() {
        Some(node) => {
            node.append_text(value);
            Ok(())
        }
        None if value.trim().is_empty() => Ok(()),
        None => Err(syntax_error("text content outside the root element")),
    }
}

fn node_from_start(start: &BytesStart<'_>) -> Result<XmlNode, CoreError> {
    let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
    let mut node = XmlNode::new(name);

    for attr in start.attributes() {
        let attr = attr.map_err(|e| {
            syntax_error(format!("invalid attribute on <{}>: {e}", node.name))
        })?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value().map_err(|e| {
            syntax_error(format!(
                "invalid value for attribute {key} on <{}>: {e}",
                node.name
            ))
        })?;
        node.set_attr(key, value.into_owned());
    }

    Ok(node)
}

fn syntax_error(message: impl Into<String>) -> CoreError {
    CoreError::new(CoreErrorCode::XmlSyntax, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_force_and_selection_are_still_lists() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<roster id="r1" name="Solo">
  <forces>
    <force id="f1" name="Army">
      <selections>
        <selection id="s1" name="Lone Hero" number="1" type="unit"/>
      </selections>
    </force>
  </forces>
</roster>"#;

        let root = parse_roster_xml(xml).expect("xml should parse");
        let forces = root.child("forces").expect("forces wrapper");
        assert!(matches!(forces.child_entry("force"), Some(XmlChild::Many(v)) if v.len() == 1));

        let force = &root.collection("forces", "force")[0];
        let selections = force.collection("selections", "selection");
        assert_eq!(selections.len(), 1);
        assert_eq!(selections[0].attr("name"), Some("Lone Hero"));
    }

    #[test]
    fn absent_collections_read_as_empty() {
        let root = parse_roster_xml("<roster name=\"Empty\"/>").expect("xml should parse");
        assert!(root.collection("forces", "force").is_empty());
        assert!(root.children("cost").is_empty());
        assert_eq!(root.attr("name"), Some("Empty"));
    }

    #[test]
    fn repeated_unlisted_elements_are_promoted() {
        let root = parse_roster_xml("<roster><note>a</note><note>b</note><meta/></roster>")
            .expect("xml should parse");
        let notes: Vec<_> = root.children("note").iter().map(|n| n.text()).collect();
        assert_eq!(notes, vec![Some("a"), Some("b")]);
        assert!(matches!(root.child_entry("meta"), Some(XmlChild::Single(_))));
    }

    #[test]
    fn keeps_text_and_unescapes_entities() {
        let xml = r#"<roster><rule name="A &amp; B"><description>Roll &lt;3&gt;</description></rule></roster>"#;
        let root = parse_roster_xml(xml).expect("xml should parse");
        let rule = &root.children("rule")[0];
        assert_eq!(rule.attr("name"), Some("A & B"));
        assert_eq!(
            rule.child("description").and_then(XmlNode::text),
            Some("Roll <3>")
        );
    }

    #[test]
    fn ignores_byte_order_mark() {
        let root = parse_roster_xml("\u{feff}<roster name=\"bom\"/>").expect("xml should parse");
        assert_eq!(root.attr("name"), Some("bom"));
    }

    #[test]
    fn wrong_root_is_invalid_roster() {
        let err = parse_roster_xml("<catalogue name=\"x\"/>").expect_err("root is not roster");
        assert_eq!(err.code, CoreErrorCode::InvalidRoster);
    }

    #[test]
    fn empty_document_is_invalid_roster() {
        let err = parse_roster_xml("   ").expect_err("no root element");
        assert_eq!(err.code, CoreErrorCode::InvalidRoster);
    }

    #[test]
    fn text_outside_root_is_a_syntax_error() {
        let err = parse_roster_xml("garbage text <roster name=\"P\"/>")
            .expect_err("leading text is not markup");
        assert_eq!(err.code, CoreErrorCode::XmlSyntax);

        let err = parse_roster_xml("<roster name=\"P\"/> trailing")
            .expect_err("trailing text is not markup");
        assert_eq!(err.code, CoreErrorCode::XmlSyntax);
    }

    #[test]
    fn mismatched_tags_are_syntax_errors() {
        let err = parse_roster_xml("<roster><forces></force></roster>")
            .expect_err("mismatched end tag");
        assert_eq!(err.code, CoreErrorCode::XmlSyntax);
    }

    #[test]
    fn unterminated_document_is_syntax_error() {
        let err = parse_roster_xml("<roster><forces>").expect_err("document is truncated");
        assert_eq!(err.code, CoreErrorCode::XmlSyntax);
    }
}
