//! Persistence Layer
//!
//! This module defines how the engine reaches stored nodes:
//!
//! - `TreeStore` - persistence-provider trait consumed by every traversal
//! - `InMemoryTreeStore` - `HashMap` arena implementation and snapshot loader
//! - `DomainEvent` - events broadcast after successful mutations
//!
//! # Architecture
//!
//! Storage and query execution belong to the host application. The engine only
//! needs id lookups, upserts and removals, so any backend that can provide those
//! implements `TreeStore` and gets cycle protection, visibility propagation and
//! breadcrumbs for free.

mod error;
pub mod events;
mod memory_store;
mod store;

pub use error::DatabaseError;
pub use events::{DomainEvent, HierarchyChange};
pub use memory_store::InMemoryTreeStore;
pub use store::TreeStore;
