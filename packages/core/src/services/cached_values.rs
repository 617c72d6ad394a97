//! Cached Aggregate Values
//!
//! Containers carry an opaque `cached_values` object (item counts, totals, ...)
//! computed by a host-supplied [`CachedValuesCalculator`]. The tree service decides
//! *when* to recompute: after any mutation that can change an aggregate, the affected
//! node and each of its ancestors are recomputed bottom-up.

use super::cycle_guard::descendant_ids;
use crate::db::TreeStore;
use crate::models::TreeNode;
use anyhow::Result;
use serde_json::{json, Map, Value};

/// Computes the aggregate statistics stored on a node
pub trait CachedValuesCalculator {
    /// Compute fresh values for `node`
    ///
    /// Descendants of `node` are already up to date when this is called.
    fn compute(&self, node: &TreeNode, store: &dyn TreeStore) -> Result<Map<String, Value>>;
}

/// Counts direct children and all descendants
#[derive(Debug, Default, Clone, Copy)]
pub struct DescendantCountCalculator;

impl CachedValuesCalculator for DescendantCountCalculator {
    fn compute(&self, node: &TreeNode, store: &dyn TreeStore) -> Result<Map<String, Value>> {
        let descendants = descendant_ids(store, node.id())
            .map_err(|e| anyhow::anyhow!("Failed to count descendants: {}", e))?;

        let mut values = Map::new();
        values.insert("children".to_string(), json!(node.children().len()));
        values.insert("descendants".to_string(), json!(descendants.len()));
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryTreeStore;
    use crate::models::NodeKind;

    #[test]
    fn test_descendant_counts() {
        let mut root = TreeNode::new_with_id("r", NodeKind::Collection, "Root").unwrap();
        root.force_children(vec!["a".to_string()]);
        let mut a = TreeNode::new_with_id("a", NodeKind::Collection, "A").unwrap();
        a.force_parent(Some("r".to_string()));
        a.force_children(vec!["b".to_string()]);
        let mut b = TreeNode::new_with_id("b", NodeKind::Collection, "B").unwrap();
        b.force_parent(Some("a".to_string()));

        let store = InMemoryTreeStore::from_nodes(vec![root.clone(), a, b]).unwrap();
        let values = DescendantCountCalculator.compute(&root, &store).unwrap();

        assert_eq!(values["children"], json!(1));
        assert_eq!(values["descendants"], json!(2));
    }
}
