//! Domain Events
//!
//! This module defines the domain events emitted by
//! [`TreeService`](crate::services::TreeService) after a mutation succeeds. Other parts
//! of the application (log persistence, live views, search indexers) subscribe without
//! coupling to the engine.
//!
//! # Architecture
//!
//! Events are sent on a tokio broadcast channel, so any number of subscribers receive
//! them. Sending never blocks and a mutation never fails because nobody listens.
//!
//! # Event Flow
//!
//! 1. TreeService validates and applies a mutation
//! 2. Visibility is propagated and cached values refreshed
//! 3. A `ChangeRecorded` event carries the audit-trail entry (the change-log sink)
//! 4. Node/hierarchy events describe the new state

use crate::models::{ChangeRecord, TreeNode};
use serde::{Deserialize, Serialize};

/// A parent/child link change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyChange {
    pub child_id: String,
    pub old_parent_id: Option<String>,
    pub new_parent_id: Option<String>,
}

/// Domain events emitted by the tree service
#[derive(Debug, Clone)]
pub enum DomainEvent {
    /// A new node was created
    NodeCreated(TreeNode),

    /// An existing node was updated
    NodeUpdated(TreeNode),

    /// A node was deleted (one event per node of a removed subtree)
    NodeDeleted { id: String },

    /// A node was moved to a new parent or detached
    HierarchyChanged(HierarchyChange),

    /// Final visibility changed on these nodes after a propagation pass
    VisibilityPropagated { root_id: String, changed: Vec<String> },

    /// An audit-trail entry was produced
    ChangeRecorded(ChangeRecord),
}

impl DomainEvent {
    /// Get a string representation of the event type
    pub fn event_type(&self) -> &str {
        match self {
            DomainEvent::NodeCreated(_) => "node:created",
            DomainEvent::NodeUpdated(_) => "node:updated",
            DomainEvent::NodeDeleted { .. } => "node:deleted",
            DomainEvent::HierarchyChanged(_) => "hierarchy:changed",
            DomainEvent::VisibilityPropagated { .. } => "visibility:propagated",
            DomainEvent::ChangeRecorded(_) => "change:recorded",
        }
    }
}
