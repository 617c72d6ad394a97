//! Data Models
//!
//! This module contains the core data structures of the container engine:
//!
//! - `TreeNode` - Hierarchical container (collection or wishlist)
//! - `Visibility` - Ordered visibility levels
//! - `CatalogItem` - Leaf entity owned by a collection
//! - `BreadcrumbSegment` - Navigation path element
//! - `ChangeRecord` - Structured audit-trail entry

pub mod breadcrumb;
pub mod catalog_item;
pub mod change_record;
mod tree_node;
mod visibility;

#[cfg(test)]
mod tree_node_test;

pub use breadcrumb::{BreadcrumbContext, BreadcrumbSegment, RouteKind, SegmentClass};
pub use catalog_item::{CatalogItem, Tag};
pub use change_record::{
    ChangeDescriptor, ChangeRecord, EntityKind, EntityRef, EntitySnapshot, EventKind, Relation,
    RelationDeltas, TrackedField, TrackedValue,
};
pub use tree_node::{
    validate_node_name, NodeKind, StructuralViolation, TreeNode, ValidationError,
    ValidationOutcome,
};
pub use visibility::Visibility;
