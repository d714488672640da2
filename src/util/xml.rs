//! Small helpers over the `xmltree` document model.

use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use xmltree::EmitterConfig;

pub use xmltree::{Element, XMLNode};

/// Parse an XML document from a file.
pub fn parse_file(path: &Path) -> Result<Element> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    Element::parse(BufReader::new(file))
        .with_context(|| format!("failed to parse XML document {}", path.display()))
}

/// Parse an XML document from a reader.
pub fn parse_reader<R: Read>(reader: R, origin: &str) -> Result<Element> {
    Element::parse(reader).with_context(|| format!("failed to parse XML document {}", origin))
}

/// Parse an XML document held in memory.
pub fn parse_str(text: &str) -> Result<Element> {
    Element::parse(text.as_bytes()).context("failed to parse XML text")
}

/// Serialize an element with indentation.
pub fn write_element<W: Write>(element: &Element, writer: W) -> Result<()> {
    let config = EmitterConfig::new().perform_indent(true);
    element
        .write_with_config(writer, config)
        .with_context(|| format!("failed to write <{}>", element.name))
}

/// Serialize an element to a string.
pub fn to_string(element: &Element) -> Result<String> {
    let mut buf = Vec::new();
    write_element(element, &mut buf)?;
    String::from_utf8(buf).context("serialized XML is not valid UTF-8")
}

/// Iterate over the direct child elements named `name`, in document order.
pub fn children_named<'a>(
    element: &'a Element,
    name: &'a str,
) -> impl Iterator<Item = &'a Element> + 'a {
    element
        .children
        .iter()
        .filter_map(XMLNode::as_element)
        .filter(move |child| child.name == name)
}

/// Iterate over all direct child elements.
pub fn child_elements(element: &Element) -> impl Iterator<Item = &Element> {
    element.children.iter().filter_map(XMLNode::as_element)
}

/// The first child element named `name`.
pub fn first_child<'a>(element: &'a Element, name: &str) -> Option<&'a Element> {
    element.get_child(name)
}

/// Attribute value, if present.
pub fn attr<'a>(element: &'a Element, name: &str) -> Option<&'a str> {
    element.attributes.get(name).map(String::as_str)
}

/// Trimmed text content, `None` when the element has no text.
pub fn content(element: &Element) -> Option<String> {
    element.get_text().map(|text| text.trim().to_string())
}

/// Index of the first direct child element named `name`.
pub fn child_index(element: &Element, name: &str) -> Option<usize> {
    element
        .children
        .iter()
        .position(|node| matches!(node, XMLNode::Element(child) if child.name == name))
}

/// Render an element header such as `<pack name="core">` for error messages.
pub fn describe(element: &Element) -> String {
    let mut attrs: Vec<_> = element.attributes.iter().collect();
    attrs.sort();
    let mut out = format!("<{}", element.name);
    for (key, value) in attrs.into_iter().take(3) {
        out.push_str(&format!(" {}=\"{}\"", key, value));
    }
    out.push('>');
    out
}
