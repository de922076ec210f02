use super::*;

pub(crate) const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>";

impl Dom {
    /// Declaration, a newline, then the document.
    pub(crate) fn to_xml_string(&self) -> String {
        format!("{XML_DECLARATION}\n{}", self.dump_node(self.root))
    }

    /// One element and everything below it, without a declaration.
    pub(crate) fn dump_node(&self, node_id: NodeId) -> String {
        let mut out = String::with_capacity(self.nodes.len() * 32);
        self.write_node(node_id, &mut out);
        out
    }

    fn write_node(&self, node_id: NodeId, out: &mut String) {
        stacker::maybe_grow(STACK_RED_ZONE, STACK_GROWTH, || {
            match &self.nodes[node_id.0].node_type {
                NodeType::Document => {
                    for child in &self.nodes[node_id.0].children {
                        self.write_node(*child, out);
                    }
                }
                NodeType::Text(text) => out.push_str(&escape_xml_text(text)),
                NodeType::Element(element) => {
                    out.push('<');
                    out.push_str(&element.tag_name);
                    for (key, value) in &element.attrs {
                        out.push(' ');
                        out.push_str(key);
                        out.push_str("=\"");
                        out.push_str(&escape_xml_attr(value));
                        out.push('"');
                    }
                    let children = &self.nodes[node_id.0].children;
                    if children.is_empty() {
                        out.push_str("/>");
                        return;
                    }
                    out.push('>');
                    for child in children {
                        self.write_node(*child, out);
                    }
                    out.push_str("</");
                    out.push_str(&element.tag_name);
                    out.push('>');
                }
            }
        })
    }
}

fn escape_xml_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

fn escape_xml_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            _ => out.push(ch),
        }
    }
    out
}
