//! In-Memory Tree Store
//!
//! A `HashMap`-backed [`TreeStore`]. It is the reference implementation of the
//! persistence contract, the backing store for tests and benchmarks, and the loader
//! for JSON snapshots consumed by the `tree-audit` binary.
//!
//! # Snapshot Format
//!
//! A snapshot is a JSON array of serialized [`TreeNode`]s (camelCase fields):
//!
//! ```json
//! [
//!   {"id": "a", "kind": "collection", "name": "Books", "children": ["b"],
//!    "createdAt": "2024-01-01T00:00:00Z", "updatedAt": "2024-01-01T00:00:00Z"},
//!   {"id": "b", "kind": "collection", "name": "Novels", "parentId": "a",
//!    "createdAt": "2024-01-01T00:00:00Z", "updatedAt": "2024-01-01T00:00:00Z"}
//! ]
//! ```

use crate::db::{DatabaseError, TreeStore};
use crate::models::{NodeKind, TreeNode};
use anyhow::Result;
use std::collections::HashMap;
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct InMemoryTreeStore {
    nodes: HashMap<String, TreeNode>,
}

impl InMemoryTreeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from already-deserialized nodes
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::DuplicateNode` if two nodes share an id.
    pub fn from_nodes(nodes: Vec<TreeNode>) -> Result<Self, DatabaseError> {
        let mut map = HashMap::with_capacity(nodes.len());
        for node in nodes {
            let id = node.id().to_string();
            if map.insert(id.clone(), node).is_some() {
                return Err(DatabaseError::duplicate_node(id));
            }
        }
        Ok(Self { nodes: map })
    }

    /// Parse a JSON snapshot string
    pub fn from_snapshot_str(json: &str) -> Result<Self, DatabaseError> {
        let nodes: Vec<TreeNode> = serde_json::from_str(json)?;
        Self::from_nodes(nodes)
    }

    /// Load a JSON snapshot file
    pub fn from_snapshot_file(path: &Path) -> Result<Self, DatabaseError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DatabaseError::snapshot_read(path.to_path_buf(), e))?;
        let store = Self::from_snapshot_str(&content)?;
        tracing::debug!(
            "Loaded {} nodes from snapshot {}",
            store.len(),
            path.display()
        );
        Ok(store)
    }

    /// Serialize every node to a JSON snapshot, ordered by name
    pub fn to_snapshot_string(&self) -> Result<String, DatabaseError> {
        Ok(serde_json::to_string_pretty(&self.sorted(|_| true))?)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    fn sorted(&self, filter: impl Fn(&TreeNode) -> bool) -> Vec<TreeNode> {
        let mut nodes: Vec<TreeNode> = self
            .nodes
            .values()
            .filter(|node| filter(node))
            .cloned()
            .collect();
        nodes.sort_by(|a, b| a.sibling_order(b).then_with(|| a.id().cmp(b.id())));
        nodes
    }
}

impl TreeStore for InMemoryTreeStore {
    fn get_node(&self, id: &str) -> Result<Option<TreeNode>> {
        Ok(self.nodes.get(id).cloned())
    }

    fn save(&mut self, node: TreeNode) -> Result<()> {
        self.nodes.insert(node.id().to_string(), node);
        Ok(())
    }

    fn remove(&mut self, id: &str) -> Result<Option<TreeNode>> {
        Ok(self.nodes.remove(id))
    }

    fn nodes_of_kind(&self, kind: NodeKind) -> Result<Vec<TreeNode>> {
        Ok(self.sorted(|node| node.kind() == kind))
    }

    fn all_nodes(&self) -> Result<Vec<TreeNode>> {
        Ok(self.sorted(|_| true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SNAPSHOT: &str = r#"[
        {"id": "a", "kind": "collection", "name": "Books", "children": ["b"],
         "createdAt": "2024-01-01T00:00:00Z", "updatedAt": "2024-01-01T00:00:00Z"},
        {"id": "b", "kind": "collection", "name": "Novels", "parentId": "a",
         "visibility": "private", "finalVisibility": "private",
         "createdAt": "2024-01-02T00:00:00Z", "updatedAt": "2024-01-02T00:00:00Z"},
        {"id": "w", "kind": "wishlist", "name": "Birthday",
         "createdAt": "2024-01-03T00:00:00Z", "updatedAt": "2024-01-03T00:00:00Z"}
    ]"#;

    #[test]
    fn test_snapshot_parsing_applies_defaults() {
        let store = InMemoryTreeStore::from_snapshot_str(SNAPSHOT).unwrap();
        assert_eq!(store.len(), 3);

        let books = store.get_node("a").unwrap().unwrap();
        assert_eq!(books.children(), ["b".to_string()]);
        assert_eq!(books.seen_counter(), 0);

        let novels = store.load_children("a").unwrap();
        assert_eq!(novels.len(), 1);
        assert_eq!(novels[0].name(), "Novels");

        let parent = store.load_parent("b").unwrap().unwrap();
        assert_eq!(parent.id(), "a");
        assert!(store.load_parent("a").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let json = r#"[
            {"id": "a", "kind": "collection", "name": "One",
             "createdAt": "2024-01-01T00:00:00Z", "updatedAt": "2024-01-01T00:00:00Z"},
            {"id": "a", "kind": "collection", "name": "Two",
             "createdAt": "2024-01-01T00:00:00Z", "updatedAt": "2024-01-01T00:00:00Z"}
        ]"#;
        let err = InMemoryTreeStore::from_snapshot_str(json).unwrap_err();
        assert!(err.to_string().contains("Duplicate node id"));
    }

    #[test]
    fn test_nodes_of_kind_filters_and_sorts() {
        let store = InMemoryTreeStore::from_snapshot_str(SNAPSHOT).unwrap();
        let collections = store.nodes_of_kind(NodeKind::Collection).unwrap();
        let names: Vec<&str> = collections.iter().map(|n| n.name()).collect();
        assert_eq!(names, vec!["Books", "Novels"]);
        assert_eq!(store.nodes_of_kind(NodeKind::Wishlist).unwrap().len(), 1);
    }

    #[test]
    fn test_missing_children_are_skipped() {
        let mut store = InMemoryTreeStore::from_snapshot_str(SNAPSHOT).unwrap();
        store.remove("b").unwrap();
        assert!(store.load_children("a").unwrap().is_empty());
        assert!(store.load_children("unknown").unwrap().is_empty());
    }

    #[test]
    fn test_snapshot_file_round_trip() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SNAPSHOT.as_bytes()).unwrap();

        let store = InMemoryTreeStore::from_snapshot_file(file.path()).unwrap();
        let reloaded =
            InMemoryTreeStore::from_snapshot_str(&store.to_snapshot_string().unwrap()).unwrap();
        assert_eq!(reloaded.all_nodes().unwrap(), store.all_nodes().unwrap());
    }

    #[test]
    fn test_missing_snapshot_file_reports_path() {
        let err = InMemoryTreeStore::from_snapshot_file(Path::new("/nonexistent/tree.json"))
            .unwrap_err();
        assert!(err.to_string().contains("/nonexistent/tree.json"));
    }
}
