use super::*;
use roxmltree::{Document, Node as XmlNode, ParsingOptions};

const BOM: &str = "\u{feff}";
const XML_PREFIX: &str = "xml";
const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Reads a document with `roxmltree` and copies its elements and text into a
/// fresh arena. Comments, processing instructions and the DOCTYPE are not
/// kept; the serializer writes its own declaration.
pub(super) fn parse_xml(xml: &str) -> Result<Dom> {
    let xml = xml.strip_prefix(BOM).unwrap_or(xml);
    let mut options = ParsingOptions::default();
    options.allow_dtd = true;
    let doc = Document::parse_with_options(xml, options)
        .map_err(|err| Error::XmlParse(err.to_string()))?;

    let mut dom = Dom::new();
    let source_root = doc.root_element();
    let root = dom.create_element(dom.root, qualified_tag(source_root), attributes(source_root));

    // Each pass creates every child of one element in document order, so the
    // stack order does not affect sibling order.
    let mut pending = vec![(source_root, root)];
    while let Some((source, parent)) = pending.pop() {
        for child in source.children() {
            if child.is_element() {
                let node = dom.create_element(parent, qualified_tag(child), attributes(child));
                pending.push((child, node));
            } else if child.is_text() {
                if let Some(text) = child.text().filter(|text| !text.is_empty()) {
                    dom.create_text(parent, text.to_string());
                }
            }
        }
    }
    Ok(dom)
}

fn qualified(node: XmlNode<'_, '_>, namespace: Option<&str>, local: &str) -> String {
    let prefix = namespace.and_then(|uri| {
        if uri == XML_NAMESPACE {
            Some(XML_PREFIX)
        } else {
            node.lookup_prefix(uri)
        }
    });
    match prefix {
        Some(prefix) if !prefix.is_empty() => format!("{prefix}:{local}"),
        _ => local.to_string(),
    }
}

fn qualified_tag(node: XmlNode<'_, '_>) -> String {
    let tag = node.tag_name();
    qualified(node, tag.namespace(), tag.name())
}

// Namespace declarations come first, then the attributes as written.
fn attributes(node: XmlNode<'_, '_>) -> Vec<(String, String)> {
    let inherited = node.parent_element();
    let mut attrs: Vec<(String, String)> = node
        .namespaces()
        .filter(|ns| ns.name() != Some(XML_PREFIX))
        .filter(|ns| {
            inherited.is_none_or(|parent| {
                !parent
                    .namespaces()
                    .any(|outer| outer.name() == ns.name() && outer.uri() == ns.uri())
            })
        })
        .map(|ns| match ns.name() {
            Some(prefix) => (format!("xmlns:{prefix}"), ns.uri().to_string()),
            None => ("xmlns".to_string(), ns.uri().to_string()),
        })
        .collect();
    attrs.extend(node.attributes().map(|attr| {
        (
            qualified(node, attr.namespace(), attr.name()),
            attr.value().to_string(),
        )
    }));
    attrs
}
