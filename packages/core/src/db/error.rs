//! Store Error Types
//!
//! This module defines error types for persistence-provider operations and
//! snapshot loading. Service-level failures are handled by
//! [`TreeServiceError`](crate::services::TreeServiceError).

use std::path::PathBuf;
use thiserror::Error;

/// Store operation errors
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to read a snapshot file
    #[error("Failed to read snapshot at {path}: {source}")]
    SnapshotRead {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Snapshot content is not a valid node list
    #[error("Failed to parse snapshot: {0}")]
    SnapshotParse(#[from] serde_json::Error),

    /// A node with this id already exists
    #[error("Duplicate node id: {id}")]
    DuplicateNode { id: String },

    /// Store call failed, with context
    #[error("Store operation failed: {context}")]
    StoreOperation { context: String },
}

impl DatabaseError {
    /// Create a snapshot read error
    pub fn snapshot_read(path: PathBuf, source: std::io::Error) -> Self {
        Self::SnapshotRead { path, source }
    }

    /// Create a duplicate node error
    pub fn duplicate_node(id: impl Into<String>) -> Self {
        Self::DuplicateNode { id: id.into() }
    }

    /// Create a store operation error with context
    pub fn store_operation(context: impl Into<String>) -> Self {
        Self::StoreOperation {
            context: context.into(),
        }
    }
}
