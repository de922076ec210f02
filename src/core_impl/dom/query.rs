use super::*;
use crate::selector::parse_selector_groups;

impl Dom {
    pub(crate) fn query_selector_all_from(
        &self,
        root: NodeId,
        selector: &str,
    ) -> Result<Vec<NodeId>> {
        let groups = parse_selector_groups(selector)?;
        Ok(self
            .descendant_elements(root)
            .into_iter()
            .filter(|candidate| {
                groups
                    .iter()
                    .any(|steps| self.matches_selector_chain(*candidate, steps))
            })
            .collect())
    }

    pub(crate) fn query_selector_from(
        &self,
        root: NodeId,
        selector: &str,
    ) -> Result<Option<NodeId>> {
        let groups = parse_selector_groups(selector)?;
        Ok(self.descendant_elements(root).into_iter().find(|candidate| {
            groups
                .iter()
                .any(|steps| self.matches_selector_chain(*candidate, steps))
        }))
    }

    pub(crate) fn matches_selector_chain(&self, node_id: NodeId, steps: &[SelectorPart]) -> bool {
        let Some(last) = steps.last() else {
            return false;
        };
        self.matches_step(node_id, &last.step) && self.matches_left_of(node_id, steps, steps.len() - 1)
    }

    // `node_id` matched `steps[idx]`. A descendant step tries every matching
    // ancestor, not only the nearest one.
    fn matches_left_of(&self, node_id: NodeId, steps: &[SelectorPart], idx: usize) -> bool {
        if idx == 0 {
            return true;
        }
        let prev_step = &steps[idx - 1].step;
        let combinator = steps[idx]
            .combinator
            .unwrap_or(SelectorCombinator::Descendant);

        match combinator {
            SelectorCombinator::Child => self.parent(node_id).is_some_and(|parent| {
                self.matches_step(parent, prev_step) && self.matches_left_of(parent, steps, idx - 1)
            }),
            SelectorCombinator::Descendant => {
                let mut cursor = self.parent(node_id);
                while let Some(ancestor) = cursor {
                    if self.matches_step(ancestor, prev_step)
                        && self.matches_left_of(ancestor, steps, idx - 1)
                    {
                        return true;
                    }
                    cursor = self.parent(ancestor);
                }
                false
            }
        }
    }

    fn matches_step(&self, node_id: NodeId, step: &SelectorStep) -> bool {
        let Some(element) = self.element(node_id) else {
            return false;
        };
        if let Some(tag) = &step.tag {
            if &element.tag_name != tag {
                return false;
            }
        }
        step.attrs.iter().all(|cond| match cond {
            SelectorAttrCondition::Exists { key } => element.attr(key).is_some(),
            SelectorAttrCondition::Eq { key, value } => element.attr(key) == Some(value.as_str()),
        })
    }
}
