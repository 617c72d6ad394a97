//! Business Services
//!
//! This module contains the tree engine's algorithms and the service that
//! orchestrates them:
//!
//! - `TreeService` - structural mutations, propagation, events
//! - `cycle_guard` - parent assignment validation
//! - `visibility_propagator` - most-restrictive-wins visibility cascade
//! - `breadcrumb_builder` - root-to-node navigation paths
//! - `change_log` - structured audit-trail records
//! - `cached_values` - aggregate statistics collaborator
//! - `tree_audit` - whole-store consistency check
//!
//! The algorithm modules are free functions over any [`TreeStore`](crate::db::TreeStore),
//! so hosts that do not want the service pipeline can call them directly.

pub mod breadcrumb_builder;
pub mod cached_values;
pub mod change_log;
pub mod cycle_guard;
pub mod error;
pub mod tree_audit;
pub mod tree_service;
pub mod visibility_propagator;


pub use cached_values::{CachedValuesCalculator, DescendantCountCalculator};
pub use change_log::ChangeRenderer;
pub use error::TreeServiceError;
pub use tree_audit::{AuditIssue, TreeAuditReport};
pub use tree_service::{AttachmentRemover, CreateNodeParams, TreeService};
