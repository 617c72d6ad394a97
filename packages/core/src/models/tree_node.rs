//! Tree Node Data Structures
//!
//! This module defines `TreeNode`, the shared shape of every hierarchical container
//! (collections and wishlists), together with the validation types used when the
//! hierarchy is mutated.
//!
//! # Architecture
//!
//! - **Arena + index**: nodes never hold references to each other. A node carries its
//!   `parent_id` and the ids of its `children`; traversals go through a
//!   [`TreeStore`](crate::db::TreeStore).
//! - **Derived visibility**: `parent_visibility` and `final_visibility` are computed by
//!   the visibility propagator and are never set by clients.
//! - **Guarded mutation**: fields that participate in tree invariants (parent, children,
//!   name ordering, declared visibility) are only mutable inside the crate, through
//!   [`TreeService`](crate::services::TreeService).
//!
//! # Examples
//!
//! ```rust
//! use catalog_core::models::{NodeKind, TreeNode, Visibility};
//!
//! let node = TreeNode::new(NodeKind::Collection, "Comics").unwrap();
//! assert_eq!(node.name(), "Comics");
//! assert_eq!(node.visibility(), Visibility::Public);
//! assert_eq!(node.final_visibility(), Visibility::Public);
//! assert!(node.is_root());
//! ```

use crate::models::Visibility;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Validation errors for node operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Invalid visibility: {0}")]
    InvalidVisibility(String),

    #[error("Invalid parent reference: {0}")]
    InvalidParent(String),

    #[error("Final visibility of node {id} is inconsistent with its declared and inherited visibility")]
    InconsistentVisibility { id: String },
}

/// The two container variants. They are structurally identical but never mix:
/// a collection only parents collections and a wishlist only parents wishlists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Collection,
    Wishlist,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Collection => "collection",
            NodeKind::Wishlist => "wishlist",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a proposed parent assignment was refused
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralViolation {
    /// The candidate parent is the node itself
    #[error("a node cannot be its own parent")]
    ParentIsSelf,

    /// The candidate parent is one of the node's descendants
    #[error("a node cannot be moved under one of its own descendants")]
    ParentIsDescendant,
}

impl StructuralViolation {
    /// Stable translation key for the user-facing message
    pub fn message_key(&self) -> &'static str {
        match self {
            StructuralViolation::ParentIsSelf => "error.parent.same_as_current_object",
            StructuralViolation::ParentIsDescendant => "error.parent.is_child_of_current_object",
        }
    }
}

/// Result of a structural mutation that may be refused without being an error
///
/// A rejected reparent leaves the tree untouched; the caller surfaces the reason
/// to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationOutcome {
    Valid,
    Rejected(StructuralViolation),
}

impl ValidationOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, ValidationOutcome::Valid)
    }

    pub fn reason(&self) -> Option<StructuralViolation> {
        match self {
            ValidationOutcome::Valid => None,
            ValidationOutcome::Rejected(reason) => Some(*reason),
        }
    }
}

/// Hierarchical container node (collection or wishlist).
///
/// # Fields
///
/// - `id`: UUID v4, assigned at creation, immutable
/// - `kind`: collection or wishlist
/// - `name`: non-empty display name; orders siblings
/// - `owner`: optional owner handle, used by owner-profile breadcrumbs
/// - `parent_id`: optional parent reference (NULL means this node is a root)
/// - `children`: child ids ordered by name, then creation time
/// - `visibility`: declared visibility
/// - `parent_visibility`: most restrictive ancestor visibility, NULL when nothing above
///   is stricter than public
/// - `final_visibility`: effective visibility, always set
/// - `image`: optional attachment path
/// - `cached_values`: opaque aggregate statistics
/// - `seen_counter`: number of recorded views
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    id: String,

    kind: NodeKind,

    name: String,

    #[serde(default)]
    owner: Option<String>,

    #[serde(default)]
    parent_id: Option<String>,

    #[serde(default)]
    children: Vec<String>,

    #[serde(default)]
    visibility: Visibility,

    #[serde(default)]
    parent_visibility: Option<Visibility>,

    #[serde(default)]
    final_visibility: Visibility,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<String>,

    #[serde(default)]
    cached_values: Map<String, Value>,

    #[serde(default)]
    seen_counter: u64,

    created_at: DateTime<Utc>,

    updated_at: DateTime<Utc>,
}

/// Trim a candidate name and reject it when nothing is left
pub fn validate_node_name(name: &str) -> Result<String, ValidationError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(trimmed.to_string())
}

impl TreeNode {
    /// Create a new root node with an auto-generated id and public visibility
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::EmptyName` if `name` is blank.
    pub fn new(kind: NodeKind, name: impl AsRef<str>) -> Result<Self, ValidationError> {
        Self::new_with_id(Uuid::new_v4().to_string(), kind, name)
    }

    /// Create a new root node with an explicit id (imports, fixtures)
    pub fn new_with_id(
        id: impl Into<String>,
        kind: NodeKind,
        name: impl AsRef<str>,
    ) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ValidationError::MissingField("id".to_string()));
        }
        let name = validate_node_name(name.as_ref())?;
        let now = Utc::now();

        Ok(Self {
            id,
            kind,
            name,
            owner: None,
            parent_id: None,
            children: Vec::new(),
            visibility: Visibility::Public,
            parent_visibility: None,
            final_visibility: Visibility::Public,
            image: None,
            cached_values: Map::new(),
            seen_counter: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Set the owner handle (builder style)
    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Set the declared visibility of a detached node (builder style)
    ///
    /// Any inherited level is dropped and the final visibility is recomputed as if
    /// the node were a root. Attaching it to a parent goes through the service,
    /// which propagates. Hosts set the initial level with
    /// [`CreateNodeParams::with_visibility`](crate::services::CreateNodeParams::with_visibility).
    pub(crate) fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self.parent_visibility = None;
        self.final_visibility = visibility;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// Parent id, treating a self-reference as no parent
    pub fn parent_id(&self) -> Option<&str> {
        match self.parent_id.as_deref() {
            Some(parent) if parent == self.id => None,
            other => other,
        }
    }

    /// Parent id exactly as stored, including a corrupt self-reference
    pub fn raw_parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    pub fn is_root(&self) -> bool {
        self.parent_id().is_none()
    }

    pub fn children(&self) -> &[String] {
        &self.children
    }

    pub fn has_child(&self, id: &str) -> bool {
        self.children.iter().any(|child| child == id)
    }

    /// Declared visibility
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Most restrictive ancestor visibility, if any is stricter than public
    pub fn parent_visibility(&self) -> Option<Visibility> {
        self.parent_visibility
    }

    /// Effective visibility
    pub fn final_visibility(&self) -> Visibility {
        self.final_visibility
    }

    pub fn image(&self) -> Option<&str> {
        self.image.as_deref()
    }

    pub fn cached_values(&self) -> &Map<String, Value> {
        &self.cached_values
    }

    pub fn seen_counter(&self) -> u64 {
        self.seen_counter
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Sibling ordering: name first, creation time second
    pub fn sibling_order(&self, other: &TreeNode) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.created_at.cmp(&other.created_at))
    }

    /// Increment the view counter and return the new count
    ///
    /// Views are not content mutations, so `updated_at` is left alone.
    pub fn record_view(&mut self) -> u64 {
        self.seen_counter = self.seen_counter.saturating_add(1);
        self.seen_counter
    }

    /// Validate node structure
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if:
    /// - `id` or `name` is empty
    /// - the node references itself as parent or child
    /// - `final_visibility` does not equal the declared visibility restricted by
    ///   `parent_visibility`
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.id.is_empty() {
            return Err(ValidationError::MissingField("id".to_string()));
        }

        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }

        if self.parent_id.as_deref() == Some(self.id.as_str()) {
            return Err(ValidationError::InvalidParent(format!(
                "node {} references itself as parent",
                self.id
            )));
        }

        if self.has_child(&self.id) {
            return Err(ValidationError::InvalidParent(format!(
                "node {} lists itself as a child",
                self.id
            )));
        }

        if self.final_visibility != self.visibility.restricted_by(self.parent_visibility) {
            return Err(ValidationError::InconsistentVisibility {
                id: self.id.clone(),
            });
        }

        Ok(())
    }

    // ------------------------------------------------------------------------
    // Crate-internal mutators. Callers outside the crate go through TreeService,
    // which keeps ordering, visibility and the parent/children inverse in sync.
    // ------------------------------------------------------------------------

    pub(crate) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Returns true when the name actually changed
    pub(crate) fn rename(&mut self, name: &str) -> Result<bool, ValidationError> {
        let validated = validate_node_name(name)?;
        if validated == self.name {
            return Ok(false);
        }
        self.name = validated;
        self.touch();
        Ok(true)
    }

    /// Returns true when the declared visibility actually changed
    pub(crate) fn declare_visibility(&mut self, visibility: Visibility) -> bool {
        if self.visibility == visibility {
            return false;
        }
        self.visibility = visibility;
        self.touch();
        true
    }

    /// Store the inherited level and recompute the final level.
    /// Returns true when either derived value changed.
    pub(crate) fn apply_inherited_visibility(&mut self, inherited: Option<Visibility>) -> bool {
        let final_visibility = self.visibility.restricted_by(inherited);
        let changed =
            self.parent_visibility != inherited || self.final_visibility != final_visibility;
        self.parent_visibility = inherited;
        self.final_visibility = final_visibility;
        changed
    }

    pub(crate) fn assign_parent(&mut self, parent_id: Option<String>) {
        self.parent_id = parent_id;
        self.touch();
    }

    pub(crate) fn insert_child_at(&mut self, index: usize, child_id: String) {
        let index = index.min(self.children.len());
        self.children.insert(index, child_id);
        self.touch();
    }

    /// Returns true when the child was present
    pub(crate) fn remove_child(&mut self, child_id: &str) -> bool {
        let before = self.children.len();
        self.children.retain(|id| id != child_id);
        let removed = self.children.len() != before;
        if removed {
            self.touch();
        }
        removed
    }

    /// Returns the previous attachment
    pub(crate) fn replace_image(&mut self, image: Option<String>) -> Option<String> {
        let previous = std::mem::replace(&mut self.image, image);
        self.touch();
        previous
    }

    pub(crate) fn set_cached_values(&mut self, values: Map<String, Value>) {
        self.cached_values = values;
    }

    #[cfg(test)]
    pub(crate) fn force_parent(&mut self, parent_id: Option<String>) {
        self.parent_id = parent_id;
    }

    #[cfg(test)]
    pub(crate) fn force_children(&mut self, children: Vec<String>) {
        self.children = children;
    }
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
