//! Cycle Guard
//!
//! Validates a proposed parent assignment against the node's own subtree. A node may
//! not become its own parent, and it may not be placed under any of its descendants.
//!
//! Traversals use an explicit work-list and a visited set instead of recursion, so
//! deep or wide trees cannot overflow the call stack and a corrupt store containing a
//! cycle still terminates. Cost is O(size of the subtree) per check, which is fine
//! for a low-frequency operation like reparenting.

use super::error::{db_error, TreeServiceError};
use crate::db::TreeStore;
use crate::models::StructuralViolation;
use std::collections::{HashSet, VecDeque};

/// Collect the ids of every node in the subtree rooted at `node_id`, the root first,
/// then breadth-first in sibling order
///
/// Returns an empty list if `node_id` is unknown.
pub fn subtree_ids<S>(store: &S, node_id: &str) -> Result<Vec<String>, TreeServiceError>
where
    S: TreeStore + ?Sized,
{
    let Some(root) = store
        .get_node(node_id)
        .map_err(|e| db_error(e, "Failed to load subtree root"))?
    else {
        return Ok(Vec::new());
    };

    let mut ordered = vec![root.id().to_string()];
    let mut visited: HashSet<String> = HashSet::from([root.id().to_string()]);
    let mut queue: VecDeque<String> = VecDeque::from([root.id().to_string()]);

    while let Some(current) = queue.pop_front() {
        let children = store
            .load_children(&current)
            .map_err(|e| db_error(e, "Failed to load children"))?;

        for child in children {
            if !visited.insert(child.id().to_string()) {
                tracing::warn!(
                    "Node {} reached twice while walking subtree of {}; store contains a cycle",
                    child.id(),
                    node_id
                );
                continue;
            }
            ordered.push(child.id().to_string());
            queue.push_back(child.id().to_string());
        }
    }

    Ok(ordered)
}

/// Ids of every descendant of `node_id` (the node itself excluded)
pub fn descendant_ids<S>(store: &S, node_id: &str) -> Result<Vec<String>, TreeServiceError>
where
    S: TreeStore + ?Sized,
{
    let mut ids = subtree_ids(store, node_id)?;
    if !ids.is_empty() {
        ids.remove(0);
    }
    Ok(ids)
}

/// Decide whether `candidate_parent_id` may become the parent of `node_id`
///
/// Returns the violated rule, or `None` if the assignment keeps the forest acyclic.
pub fn check_parent<S>(
    store: &S,
    node_id: &str,
    candidate_parent_id: &str,
) -> Result<Option<StructuralViolation>, TreeServiceError>
where
    S: TreeStore + ?Sized,
{
    if node_id == candidate_parent_id {
        return Ok(Some(StructuralViolation::ParentIsSelf));
    }

    let descendants = descendant_ids(store, node_id)?;
    if descendants.iter().any(|id| id == candidate_parent_id) {
        tracing::debug!(
            "Rejecting parent {} for {}: candidate is among {} descendants",
            candidate_parent_id,
            node_id,
            descendants.len()
        );
        return Ok(Some(StructuralViolation::ParentIsDescendant));
    }

    Ok(None)
}

/// True if making `candidate_parent_id` the parent of `node_id` would create a cycle
pub fn would_create_cycle<S>(
    store: &S,
    node_id: &str,
    candidate_parent_id: &str,
) -> Result<bool, TreeServiceError>
where
    S: TreeStore + ?Sized,
{
    Ok(check_parent(store, node_id, candidate_parent_id)?.is_some())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryTreeStore;
    use crate::models::{NodeKind, TreeNode};
    use std::collections::HashMap;

    /// Build a store from (id, parent) pairs, children in insertion order
    fn store_from(edges: &[(&str, Option<&str>)]) -> InMemoryTreeStore {
        let mut nodes: HashMap<&str, TreeNode> = edges
            .iter()
            .map(|(id, _)| {
                (*id, TreeNode::new_with_id(*id, NodeKind::Collection, *id).unwrap())
            })
            .collect();

        for (id, parent) in edges {
            if let Some(parent) = parent {
                if let Some(node) = nodes.get_mut(id) {
                    node.force_parent(Some(parent.to_string()));
                }
                if let Some(parent_node) = nodes.get_mut(parent) {
                    let mut children = parent_node.children().to_vec();
                    children.push(id.to_string());
                    parent_node.force_children(children);
                }
            }
        }
        InMemoryTreeStore::from_nodes(nodes.into_values().collect()).unwrap()
    }

    #[test]
    fn test_self_parent_is_rejected() {
        let store = store_from(&[("a", None)]);
        assert_eq!(
            check_parent(&store, "a", "a").unwrap(),
            Some(StructuralViolation::ParentIsSelf)
        );
        assert!(would_create_cycle(&store, "a", "a").unwrap());
    }

    #[test]
    fn test_descendant_parent_is_rejected() {
        let store = store_from(&[("c", None), ("d", Some("c")), ("e", Some("d"))]);
        assert_eq!(
            check_parent(&store, "c", "e").unwrap(),
            Some(StructuralViolation::ParentIsDescendant)
        );
        assert_eq!(check_parent(&store, "e", "c").unwrap(), None);
    }

    #[test]
    fn test_sibling_and_unrelated_parents_are_allowed() {
        let store = store_from(&[("r", None), ("a", Some("r")), ("b", Some("r")), ("x", None)]);
        assert!(!would_create_cycle(&store, "a", "b").unwrap());
        assert!(!would_create_cycle(&store, "a", "x").unwrap());
        assert!(!would_create_cycle(&store, "a", "r").unwrap());
    }

    #[test]
    fn test_subtree_ids_are_breadth_first() {
        let store = store_from(&[
            ("r", None),
            ("a", Some("r")),
            ("b", Some("r")),
            ("a1", Some("a")),
            ("b1", Some("b")),
        ]);
        assert_eq!(
            subtree_ids(&store, "r").unwrap(),
            vec!["r", "a", "b", "a1", "b1"]
        );
        assert_eq!(descendant_ids(&store, "a").unwrap(), vec!["a1"]);
        assert!(subtree_ids(&store, "missing").unwrap().is_empty());
    }

    #[test]
    fn test_deep_chain_does_not_overflow() {
        let ids: Vec<String> = (0..20_000).map(|i| format!("n{}", i)).collect();
        let edges: Vec<(&str, Option<&str>)> = ids
            .iter()
            .enumerate()
            .map(|(i, id)| {
                let parent = if i == 0 { None } else { Some(ids[i - 1].as_str()) };
                (id.as_str(), parent)
            })
            .collect();
        let store = store_from(&edges);

        assert!(would_create_cycle(&store, "n0", "n19999").unwrap());
        assert_eq!(descendant_ids(&store, "n0").unwrap().len(), 19_999);
    }

    #[test]
    fn test_corrupt_cycle_terminates() {
        let mut store = store_from(&[("a", None), ("b", Some("a"))]);
        let mut b = store.get_node("b").unwrap().unwrap();
        b.force_children(vec!["a".to_string()]);
        store.save(b).unwrap();

        let ids = subtree_ids(&store, "a").unwrap();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
