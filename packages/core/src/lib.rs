//! Catalog Core Hierarchical Container Engine
//!
//! This crate keeps the container forest of a personal cataloguing application
//! (collections and wishlists nested inside each other) structurally sound, and
//! derives the values that depend on a node's position in it.
//!
//! # Architecture
//!
//! - **Arena + index**: nodes live in a host-supplied [`TreeStore`] keyed by id and
//!   reference each other by id, never by pointer
//! - **Iterative traversals**: every walk uses an explicit queue and a visited set,
//!   so deep trees and corrupt stores cannot overflow the stack or loop forever
//! - **Most-restrictive-wins visibility**: a node is never more visible than any
//!   ancestor
//! - **Events, not callbacks**: mutations broadcast [`DomainEvent`]s, including the
//!   structured change-log records
//!
//! # Modules
//!
//! - [`models`] - Data structures (TreeNode, Visibility, ChangeRecord, etc.)
//! - [`services`] - Engine algorithms and the `TreeService` facade
//! - [`db`] - Persistence-provider trait, in-memory store, domain events
//! - [`config`] - Engine configuration

pub mod config;
pub mod db;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use config::TreeEngineConfig;
pub use db::{DomainEvent, InMemoryTreeStore, TreeStore};
pub use models::*;
pub use services::*;
