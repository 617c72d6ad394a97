//! Visibility Propagator
//!
//! Computes each node's effective visibility with a **most-restrictive-wins** policy:
//! the final visibility of a node is the most restrictive level among its own declared
//! visibility and the declared visibility of every ancestor up to the root.
//!
//! # Cached Fields
//!
//! - `parent_visibility`: the most restrictive ancestor level, or `None` when nothing
//!   above the node is stricter than public. The UI uses it to explain why a node is
//!   locked.
//! - `final_visibility`: `declared.restricted_by(parent_visibility)`.
//!
//! # Propagation
//!
//! Final visibility is a function of the whole ancestor chain, so a change to a node's
//! declared level, a reparent, or a detach must reach every descendant. [`propagate`]
//! does this in a single top-down breadth-first pass: the starting node inherits from
//! its parent's stored final level, and each child inherits from the freshly computed
//! level of its parent. That is O(n) in the subtree size, with no walk back to the root
//! per descendant.

use super::error::{db_error, TreeServiceError};
use crate::db::TreeStore;
use crate::models::{TreeNode, Visibility};
use std::collections::{HashSet, VecDeque};

/// Level a parent with final visibility `parent_final` hands down to its children
pub fn inherited_from_parent(parent_final: Visibility) -> Option<Visibility> {
    if parent_final.is_stricter_than(Visibility::Public) {
        Some(parent_final)
    } else {
        None
    }
}

fn load_node<S>(store: &S, node_id: &str) -> Result<TreeNode, TreeServiceError>
where
    S: TreeStore + ?Sized,
{
    store
        .get_node(node_id)
        .map_err(|e| db_error(e, "Failed to load node"))?
        .ok_or_else(|| TreeServiceError::node_not_found(node_id))
}

/// Most restrictive declared visibility among the ancestors of `node_id`
///
/// Walks parent links to the root. Returns `None` when no ancestor is stricter than
/// public. A revisited node (corrupt store) ends the walk.
pub fn resolve_inherited_visibility<S>(
    store: &S,
    node_id: &str,
) -> Result<Option<Visibility>, TreeServiceError>
where
    S: TreeStore + ?Sized,
{
    let node = load_node(store, node_id)?;
    let mut visited: HashSet<String> = HashSet::from([node.id().to_string()]);
    let mut most_restrictive = Visibility::Public;
    let mut next = node.parent_id().map(str::to_string);

    while let Some(parent_id) = next {
        if !visited.insert(parent_id.clone()) {
            tracing::warn!(
                "Ancestor walk from {} revisited {}; store contains a cycle",
                node_id,
                parent_id
            );
            break;
        }

        let Some(parent) = store
            .get_node(&parent_id)
            .map_err(|e| db_error(e, "Failed to load ancestor"))?
        else {
            tracing::warn!("Ancestor {} of {} is missing", parent_id, node_id);
            break;
        };

        most_restrictive = most_restrictive.most_restrictive(parent.visibility());
        next = parent.parent_id().map(str::to_string);
    }

    Ok(inherited_from_parent(most_restrictive))
}

/// Effective visibility of `node_id`, computed from scratch by walking to the root
pub fn resolve_final_visibility<S>(store: &S, node_id: &str) -> Result<Visibility, TreeServiceError>
where
    S: TreeStore + ?Sized,
{
    let declared = load_node(store, node_id)?.visibility();
    Ok(declared.restricted_by(resolve_inherited_visibility(store, node_id)?))
}

/// Recompute `parent_visibility` and `final_visibility` for `node_id` and its whole
/// subtree
///
/// Every descendant is visited; only nodes whose derived values changed are saved.
/// Returns the ids of the saved nodes, in visit order.
pub fn propagate<S>(store: &mut S, node_id: &str) -> Result<Vec<String>, TreeServiceError>
where
    S: TreeStore + ?Sized,
{
    let start = load_node(store, node_id)?;
    let inherited = match start.parent_id() {
        Some(parent_id) => store
            .get_node(parent_id)
            .map_err(|e| db_error(e, "Failed to load parent"))?
            .and_then(|parent| inherited_from_parent(parent.final_visibility())),
        None => None,
    };

    let mut changed = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<(TreeNode, Option<Visibility>)> = VecDeque::from([(start, inherited)]);

    while let Some((mut node, inherited)) = queue.pop_front() {
        if !visited.insert(node.id().to_string()) {
            tracing::warn!(
                "Propagation from {} reached {} twice; store contains a cycle",
                node_id,
                node.id()
            );
            continue;
        }

        if node.apply_inherited_visibility(inherited) {
            changed.push(node.id().to_string());
            store
                .save(node.clone())
                .map_err(|e| db_error(e, "Failed to save propagated visibility"))?;
        }

        let handed_down = inherited_from_parent(node.final_visibility());
        let children = store
            .load_children(node.id())
            .map_err(|e| db_error(e, "Failed to load children"))?;
        for child in children {
            queue.push_back((child, handed_down));
        }
    }

    tracing::debug!(
        "Propagated visibility from {}: {} of {} nodes changed",
        node_id,
        changed.len(),
        visited.len()
    );

    Ok(changed)
}
