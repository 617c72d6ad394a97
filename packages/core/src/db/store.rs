//! Persistence Provider Trait
//!
//! The engine never talks to a database directly. Every traversal goes through a
//! `TreeStore`, an id-indexed table of [`TreeNode`]s. Implementations may be backed by
//! a relational database, a document store, or the in-memory
//! [`InMemoryTreeStore`](crate::db::InMemoryTreeStore) used in tests and by the
//! `tree-audit` binary.
//!
//! # Contract
//!
//! - `get_node` returns `Ok(None)` for unknown ids; `Err` is reserved for store failures.
//! - `save` upserts the whole node.
//! - `load_children` returns children in the order of the parent's `children` list.
//! - Callers serialize structural mutations per tree; the store needs no locking of
//!   its own for the engine's sake.

use crate::models::{NodeKind, TreeNode};
use anyhow::Result;

pub trait TreeStore {
    /// Fetch a node by id
    fn get_node(&self, id: &str) -> Result<Option<TreeNode>>;

    /// Insert or replace a node
    fn save(&mut self, node: TreeNode) -> Result<()>;

    /// Remove a node, returning it if it existed
    fn remove(&mut self, id: &str) -> Result<Option<TreeNode>>;

    /// Every node of one kind, ordered by name then creation time
    fn nodes_of_kind(&self, kind: NodeKind) -> Result<Vec<TreeNode>>;

    /// Every node in the store, ordered by name then creation time
    fn all_nodes(&self) -> Result<Vec<TreeNode>>;

    /// Children of `id` in sibling order
    ///
    /// Ids listed by the parent but missing from the store are skipped.
    fn load_children(&self, id: &str) -> Result<Vec<TreeNode>> {
        let Some(node) = self.get_node(id)? else {
            return Ok(Vec::new());
        };

        let mut children = Vec::with_capacity(node.children().len());
        for child_id in node.children() {
            match self.get_node(child_id)? {
                Some(child) => children.push(child),
                None => {
                    tracing::warn!("Node {} lists missing child {}", id, child_id);
                }
            }
        }
        Ok(children)
    }

    /// Parent of `id`, if any
    fn load_parent(&self, id: &str) -> Result<Option<TreeNode>> {
        let Some(node) = self.get_node(id)? else {
            return Ok(None);
        };
        match node.parent_id() {
            Some(parent_id) => self.get_node(parent_id),
            None => Ok(None),
        }
    }
}
