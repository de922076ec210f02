use super::*;
use crate::selector::{SelectorAttrCondition, SelectorCombinator, SelectorPart, SelectorStep};

mod attr_tree_mutation;
mod core_nodes_identity;
mod query;
mod serialize;
mod text_content;
mod tree_traversal;

/// Tag of the container that holds a structural element's children. It always
/// follows its element as the next element sibling.
pub(crate) const COMPANION_TAG: &str = "hashTree";

// Recursive walks grow the stack on demand so deeply nested plans do not
// overflow it.
const STACK_RED_ZONE: usize = 64 * 1024;
const STACK_GROWTH: usize = 2 * 1024 * 1024;
