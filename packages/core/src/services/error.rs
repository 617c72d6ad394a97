//! Service Layer Error Types
//!
//! This module defines error types for tree-service operations. A refused
//! reparent is not an error: it comes back as
//! [`ValidationOutcome::Rejected`](crate::models::ValidationOutcome).

use crate::db::DatabaseError;
use crate::models::{NodeKind, ValidationError};
use thiserror::Error;

/// Service operation errors
///
/// All of them are local to one operation; none should take down the host process.
#[derive(Error, Debug)]
pub enum TreeServiceError {
    /// Referenced node does not resolve through the store
    #[error("Node not found: {id}")]
    NodeNotFound { id: String },

    /// Validation failed for node input
    #[error("Node validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    /// Store operation failed
    #[error("Database operation failed: {0}")]
    DatabaseError(#[from] DatabaseError),

    /// Parent and child are different container kinds
    #[error("Cannot place {child_kind} {child_id} under {parent_kind} {parent_id}")]
    KindMismatch {
        child_id: String,
        child_kind: NodeKind,
        parent_id: String,
        parent_kind: NodeKind,
    },

    /// Service initialization failed
    #[error("Initialization error: {0}")]
    InitializationError(String),
}

impl TreeServiceError {
    /// Create a node not found error
    pub fn node_not_found(id: impl Into<String>) -> Self {
        Self::NodeNotFound { id: id.into() }
    }

    /// Create a kind mismatch error
    pub fn kind_mismatch(
        child_id: impl Into<String>,
        child_kind: NodeKind,
        parent_id: impl Into<String>,
        parent_kind: NodeKind,
    ) -> Self {
        Self::KindMismatch {
            child_id: child_id.into(),
            child_kind,
            parent_id: parent_id.into(),
            parent_kind,
        }
    }

    /// Create an initialization error
    pub fn initialization_error(msg: impl Into<String>) -> Self {
        Self::InitializationError(msg.into())
    }
}

/// Helper to convert store errors to TreeServiceError with context
pub(crate) fn db_error(e: anyhow::Error, context: &str) -> TreeServiceError {
    TreeServiceError::DatabaseError(DatabaseError::store_operation(format!(
        "{}: {}",
        context, e
    )))
}
