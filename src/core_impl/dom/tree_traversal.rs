use super::*;

impl Dom {
    pub(crate) fn is_connected(&self, node_id: NodeId) -> bool {
        let mut cursor = Some(node_id);
        while let Some(node) = cursor {
            if node == self.root {
                return true;
            }
            cursor = self.parent(node);
        }
        false
    }

    pub(crate) fn is_descendant_of(&self, node_id: NodeId, ancestor: NodeId) -> bool {
        let mut cursor = self.parent(node_id);
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            cursor = self.parent(current);
        }
        false
    }

    pub(crate) fn child_elements(&self, node_id: NodeId) -> Vec<NodeId> {
        self.children(node_id)
            .iter()
            .copied()
            .filter(|child| self.element(*child).is_some())
            .collect()
    }

    pub(crate) fn child_elements_by_tag(&self, node_id: NodeId, tag: &str) -> Vec<NodeId> {
        self.children(node_id)
            .iter()
            .copied()
            .filter(|child| self.has_tag(*child, tag))
            .collect()
    }

    pub(crate) fn next_element_sibling(&self, node_id: NodeId) -> Option<NodeId> {
        let parent = self.parent(node_id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|id| *id == node_id)?;
        siblings[pos + 1..]
            .iter()
            .copied()
            .find(|id| self.element(*id).is_some())
    }

    pub(crate) fn previous_element_sibling(&self, node_id: NodeId) -> Option<NodeId> {
        let parent = self.parent(node_id)?;
        let siblings = self.children(parent);
        let pos = siblings.iter().position(|id| *id == node_id)?;
        siblings[..pos]
            .iter()
            .rev()
            .copied()
            .find(|id| self.element(*id).is_some())
    }

    /// The structural element whose companion is `container`.
    pub(crate) fn companion_owner(&self, container: NodeId) -> Option<NodeId> {
        if !self.has_tag(container, COMPANION_TAG) {
            return None;
        }
        self.previous_element_sibling(container)
            .filter(|owner| !self.has_tag(*owner, COMPANION_TAG))
    }

    /// Child positions from the document node down to `node_id`. Comparing
    /// two paths compares document order.
    pub(crate) fn tree_path(&self, node_id: NodeId) -> Vec<usize> {
        let mut path = Vec::new();
        let mut current = node_id;
        while let Some(parent) = self.parent(current) {
            let position = self
                .children(parent)
                .iter()
                .position(|child| *child == current)
                .unwrap_or_default();
            path.push(position);
            current = parent;
        }
        path.reverse();
        path
    }

    /// Elements strictly below `node_id`, in document order.
    pub(crate) fn descendant_elements(&self, node_id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.children(node_id).iter().rev().copied().collect();
        while let Some(current) = stack.pop() {
            if self.element(current).is_none() {
                continue;
            }
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    pub(crate) fn elements_by_tag(&self, node_id: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendant_elements(node_id)
            .into_iter()
            .filter(|id| self.has_tag(*id, tag))
            .collect()
    }

    pub(crate) fn first_element_by_tag(&self, node_id: NodeId, tag: &str) -> Option<NodeId> {
        self.descendant_elements(node_id)
            .into_iter()
            .find(|id| self.has_tag(*id, tag))
    }
}
