use super::*;

impl Dom {
    pub(crate) fn attr(&self, node_id: NodeId, name: &str) -> Option<String> {
        self.element(node_id)
            .and_then(|e| e.attr(name))
            .map(str::to_string)
    }

    /// Overwrites the attribute in place, or appends it after the existing
    /// ones.
    pub(crate) fn set_attr(&mut self, node_id: NodeId, name: &str, value: &str) -> Result<()> {
        let element = self
            .element_mut(node_id)
            .ok_or_else(|| Error::Structure("setAttribute target is not an element".into()))?;
        if let Some(slot) = element.attrs.iter_mut().find(|(key, _)| key == name) {
            slot.1 = value.to_string();
        } else {
            element.attrs.push((name.to_string(), value.to_string()));
        }
        Ok(())
    }

    fn check_insertable(&self, parent: NodeId, child: NodeId, op: &str) -> Result<()> {
        if !self.can_have_children(parent) {
            return Err(Error::Structure(format!("{op} target cannot have children")));
        }
        if child == self.root || child == parent || !self.is_valid_node(child) {
            return Err(Error::Structure(format!("invalid {op} node")));
        }
        let mut cursor = Some(parent);
        while let Some(node) = cursor {
            if node == child {
                return Err(Error::Structure(format!("{op} would create a cycle")));
            }
            cursor = self.parent(node);
        }
        Ok(())
    }

    fn detach(&mut self, child: NodeId) {
        if let Some(old_parent) = self.parent(child) {
            self.nodes[old_parent.0].children.retain(|id| *id != child);
        }
        self.nodes[child.0].parent = None;
    }

    pub(crate) fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.check_insertable(parent, child, "appendChild")?;
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        Ok(())
    }

    pub(crate) fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: NodeId,
    ) -> Result<()> {
        self.check_insertable(parent, child, "insertBefore")?;
        if !self.is_valid_node(reference) || self.parent(reference) != Some(parent) {
            return Err(Error::Structure(
                "insertBefore reference is not a direct child".into(),
            ));
        }
        if child == reference {
            return Ok(());
        }
        self.detach(child);
        let Some(index) = self.nodes[parent.0]
            .children
            .iter()
            .position(|id| *id == reference)
        else {
            return Err(Error::Structure("insertBefore reference is missing".into()));
        };
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.insert(index, child);
        Ok(())
    }

    pub(crate) fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        if self.parent(child) != Some(parent) {
            return Err(Error::Structure(
                "removeChild target is not a direct child".into(),
            ));
        }
        self.detach(child);
        Ok(())
    }

    pub(crate) fn remove_node(&mut self, node: NodeId) -> Result<()> {
        if node == self.root {
            return Err(Error::Structure("cannot remove document root".into()));
        }
        let Some(parent) = self.parent(node) else {
            return Ok(());
        };
        self.remove_child(parent, node)
    }

    /// The container paired with `node`: its next element sibling, when that
    /// sibling is a `hashTree`.
    pub(crate) fn companion(&self, node: NodeId) -> Option<NodeId> {
        self.next_element_sibling(node)
            .filter(|sibling| self.has_tag(*sibling, COMPANION_TAG))
    }

    pub(crate) fn create_companion(&mut self) -> NodeId {
        self.create_detached_element(COMPANION_TAG, &[])
    }

    /// Appends `element` to `container` followed by a fresh, empty companion.
    /// Returns the companion.
    pub(crate) fn append_pair(&mut self, container: NodeId, element: NodeId) -> Result<NodeId> {
        let companion = self.create_companion();
        self.append_child(container, element)?;
        if let Err(err) = self.append_child(container, companion) {
            self.detach(element);
            return Err(err);
        }
        Ok(companion)
    }

    /// Inserts `element` and a fresh companion directly before `reference`.
    pub(crate) fn insert_pair_before(
        &mut self,
        container: NodeId,
        element: NodeId,
        reference: NodeId,
    ) -> Result<NodeId> {
        let companion = self.create_companion();
        self.insert_before(container, element, reference)?;
        if let Err(err) = self.insert_before(container, companion, reference) {
            self.detach(element);
            return Err(err);
        }
        Ok(companion)
    }

    /// Detaches `node` together with its companion, when it has one.
    pub(crate) fn remove_with_companion(&mut self, node: NodeId) -> Result<()> {
        let companion = self.companion(node);
        self.remove_node(node)?;
        if let Some(companion) = companion {
            self.remove_node(companion)?;
        }
        Ok(())
    }
}
