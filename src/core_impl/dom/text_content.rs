use super::*;

impl Dom {
    pub(crate) fn text_content(&self, node_id: NodeId) -> String {
        let mut out = String::new();
        let mut stack = vec![node_id];
        while let Some(current) = stack.pop() {
            match &self.nodes[current.0].node_type {
                NodeType::Text(text) => out.push_str(text),
                NodeType::Document | NodeType::Element(_) => {
                    stack.extend(self.nodes[current.0].children.iter().rev().copied());
                }
            }
        }
        out
    }

    /// Replaces every child of `node_id` with a single text node. An empty
    /// value leaves the element empty.
    pub(crate) fn set_text_content(&mut self, node_id: NodeId, value: &str) -> Result<()> {
        if self.element(node_id).is_none() {
            return Err(Error::Structure("textContent target is not an element".into()));
        }
        let old_children = std::mem::take(&mut self.nodes[node_id.0].children);
        for child in old_children {
            self.nodes[child.0].parent = None;
        }
        if !value.is_empty() {
            self.create_text(node_id, value.to_string());
        }
        Ok(())
    }
}
