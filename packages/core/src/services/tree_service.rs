//! Tree Service
//!
//! `TreeService` is the entry point for every structural mutation of the container
//! forest. Each operation runs the same pipeline:
//!
//! 1. validate (cycle guard, kind check, name rules)
//! 2. write the node and the parent/children inverse through the [`TreeStore`]
//! 3. propagate final visibility down the affected subtree
//! 4. recompute cached values along the affected ancestor chains
//! 5. capture a [`ChangeRecord`] and broadcast [`DomainEvent`]s
//!
//! Mutating methods take `&mut self`, so one service instance is a single writer.
//! Hosts that share a store between threads wrap the service in their own lock.

use super::breadcrumb_builder::{build_item_path, build_path};
use super::cached_values::CachedValuesCalculator;
use super::change_log::{diff, node_snapshot};
use super::cycle_guard::{check_parent, subtree_ids};
use super::error::{db_error, TreeServiceError};
use super::tree_audit::{audit_store, TreeAuditReport};
use super::visibility_propagator::{inherited_from_parent, propagate};
use crate::config::TreeEngineConfig;
use crate::db::{DatabaseError, DomainEvent, HierarchyChange, TreeStore};
use crate::models::{
    BreadcrumbContext, BreadcrumbSegment, CatalogItem, ChangeRecord, EntityKind,
    EntitySnapshot, NodeKind, RelationDeltas, TreeNode, ValidationOutcome, Visibility,
};
use std::collections::HashSet;
use tokio::sync::broadcast;

/// Deletes stored files once the engine no longer references them
///
/// Called for every node removed by [`TreeService::delete_subtree`] and for the
/// previous attachment replaced by [`TreeService::set_attachment`]. Failures are
/// logged and never undo the mutation.
pub trait AttachmentRemover {
    fn remove_attachments(&self, node_id: &str, attachment: Option<&str>) -> anyhow::Result<()>;
}

/// Parameters for creating a node
#[derive(Debug, Clone)]
pub struct CreateNodeParams {
    /// Optional id; a UUID v4 is generated when `None`
    pub id: Option<String>,
    pub kind: NodeKind,
    pub name: String,
    pub visibility: Visibility,
    /// Parent to attach to; must be of the same kind
    pub parent_id: Option<String>,
    pub owner: Option<String>,
}

impl CreateNodeParams {
    /// Public root node with a generated id
    pub fn new(kind: NodeKind, name: impl Into<String>) -> Self {
        Self {
            id: None,
            kind,
            name: name.into(),
            visibility: Visibility::Public,
            parent_id: None,
            owner: None,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

pub struct TreeService<S: TreeStore> {
    store: S,

    config: TreeEngineConfig,

    /// Broadcast channel for domain events
    event_tx: broadcast::Sender<DomainEvent>,

    cache_calculator: Option<Box<dyn CachedValuesCalculator>>,

    attachment_remover: Option<Box<dyn AttachmentRemover>>,
}

impl<S: TreeStore> TreeService<S> {
    /// Create a service over `store`
    ///
    /// # Errors
    ///
    /// Returns `InitializationError` if `config` does not validate.
    pub fn new(store: S, config: TreeEngineConfig) -> Result<Self, TreeServiceError> {
        config
            .validate()
            .map_err(TreeServiceError::initialization_error)?;

        let (event_tx, _) = broadcast::channel(config.event_channel_capacity);

        Ok(Self {
            store,
            config,
            event_tx,
            cache_calculator: None,
            attachment_remover: None,
        })
    }

    /// Recompute cached values with `calculator` after every relevant mutation
    pub fn with_cache_calculator(mut self, calculator: impl CachedValuesCalculator + 'static) -> Self {
        self.cache_calculator = Some(Box::new(calculator));
        self
    }

    /// Hand removed attachments to `remover`
    pub fn with_attachment_remover(mut self, remover: impl AttachmentRemover + 'static) -> Self {
        self.attachment_remover = Some(Box::new(remover));
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn config(&self) -> &TreeEngineConfig {
        &self.config
    }

    /// Subscribe to domain events
    ///
    /// Events are only delivered to receivers that exist when they are sent.
    pub fn subscribe_to_events(&self) -> broadcast::Receiver<DomainEvent> {
        self.event_tx.subscribe()
    }

    fn emit_event(&self, event: DomainEvent) {
        let _ = self.event_tx.send(event);
    }

    fn load(&self, node_id: &str) -> Result<TreeNode, TreeServiceError> {
        self.store
            .get_node(node_id)
            .map_err(|e| db_error(e, "Failed to load node"))?
            .ok_or_else(|| TreeServiceError::node_not_found(node_id))
    }

    fn save(&mut self, node: TreeNode) -> Result<(), TreeServiceError> {
        self.store
            .save(node)
            .map_err(|e| db_error(e, "Failed to save node"))
    }

    fn parent_of(&self, node: &TreeNode) -> Result<Option<TreeNode>, TreeServiceError> {
        match node.parent_id() {
            Some(parent_id) => self
                .store
                .get_node(parent_id)
                .map_err(|e| db_error(e, "Failed to load parent")),
            None => Ok(None),
        }
    }

    fn snapshot(&self, node: &TreeNode) -> Result<EntitySnapshot, TreeServiceError> {
        let parent = self.parent_of(node)?;
        Ok(node_snapshot(node, parent.as_ref()))
    }

    /// Position at which `child` keeps `parent.children` ordered
    ///
    /// Equal keys go after existing siblings, so ties keep insertion order.
    fn insertion_index(&self, parent: &TreeNode, child: &TreeNode) -> Result<usize, TreeServiceError> {
        for (index, sibling_id) in parent.children().iter().enumerate() {
            let sibling = self
                .store
                .get_node(sibling_id)
                .map_err(|e| db_error(e, "Failed to load sibling"))?;
            if let Some(sibling) = sibling {
                if sibling.sibling_order(child).is_gt() {
                    return Ok(index);
                }
            }
        }
        Ok(parent.children().len())
    }

    fn attach_child(&mut self, parent_id: &str, child: &TreeNode) -> Result<(), TreeServiceError> {
        let mut parent = self.load(parent_id)?;
        let index = self.insertion_index(&parent, child)?;
        parent.insert_child_at(index, child.id().to_string());
        self.save(parent)
    }

    fn detach_child(&mut self, parent_id: &str, child_id: &str) -> Result<(), TreeServiceError> {
        let Some(mut parent) = self
            .store
            .get_node(parent_id)
            .map_err(|e| db_error(e, "Failed to load parent"))?
        else {
            tracing::warn!("Parent {} of {} is missing; nothing to detach", parent_id, child_id);
            return Ok(());
        };

        if parent.remove_child(child_id) {
            self.save(parent)?;
        }
        Ok(())
    }

    fn ensure_same_kind(&self, child: &TreeNode, parent: &TreeNode) -> Result<(), TreeServiceError> {
        if child.kind() != parent.kind() {
            return Err(TreeServiceError::kind_mismatch(
                child.id(),
                child.kind(),
                parent.id(),
                parent.kind(),
            ));
        }
        Ok(())
    }

    fn publish_change(
        &self,
        kind: NodeKind,
        before: Option<&EntitySnapshot>,
        after: Option<&EntitySnapshot>,
    ) -> Option<ChangeRecord> {
        self.record_change(EntityKind::from(kind), before, after, &RelationDeltas::default())
    }

    fn publish_propagation(&self, root_id: &str, changed: Vec<String>) {
        if !changed.is_empty() {
            self.emit_event(DomainEvent::VisibilityPropagated {
                root_id: root_id.to_string(),
                changed,
            });
        }
    }

    /// Recompute cached values for `start` and every ancestor, lowest first
    fn refresh_chain(&mut self, start: Option<&str>) -> Result<(), TreeServiceError> {
        if self.cache_calculator.is_none() {
            return Ok(());
        }

        let mut visited: HashSet<String> = HashSet::new();
        let mut next = start.map(str::to_string);

        while let Some(node_id) = next {
            if !visited.insert(node_id.clone()) {
                tracing::warn!("Cached value refresh revisited {}; stopping", node_id);
                break;
            }

            let Some(mut node) = self
                .store
                .get_node(&node_id)
                .map_err(|e| db_error(e, "Failed to load node for cached values"))?
            else {
                break;
            };
            next = node.parent_id().map(str::to_string);

            let Some(calculator) = self.cache_calculator.as_ref() else {
                break;
            };
            match calculator.compute(&node, &self.store) {
                Ok(values) => {
                    if node.cached_values() != &values {
                        node.set_cached_values(values);
                        self.save(node)?;
                    }
                }
                Err(e) => {
                    tracing::warn!("Failed to compute cached values for {}: {}", node_id, e);
                }
            }
        }

        Ok(())
    }

    /// Fetch a node by id
    pub fn get_node(&self, node_id: &str) -> Result<Option<TreeNode>, TreeServiceError> {
        self.store
            .get_node(node_id)
            .map_err(|e| db_error(e, "Failed to get node"))
    }

    /// Children of `node_id` in sibling order
    pub fn children_of(&self, node_id: &str) -> Result<Vec<TreeNode>, TreeServiceError> {
        let node = self.load(node_id)?;
        self.store
            .load_children(node.id())
            .map_err(|e| db_error(e, "Failed to load children"))
    }

    /// Create a node, attached to `params.parent_id` when given
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` for a blank name or id
    /// - `NodeNotFound` if the parent does not exist
    /// - `KindMismatch` if the parent is a different kind
    /// - `DatabaseError::DuplicateNode` if the explicit id is taken
    pub fn create_node(&mut self, params: CreateNodeParams) -> Result<TreeNode, TreeServiceError> {
        let mut node = match params.id {
            Some(id) => {
                if self.get_node(&id)?.is_some() {
                    return Err(DatabaseError::duplicate_node(id).into());
                }
                TreeNode::new_with_id(id, params.kind, &params.name)?
            }
            None => TreeNode::new(params.kind, &params.name)?,
        }
        .with_visibility(params.visibility);

        if let Some(owner) = params.owner {
            node = node.with_owner(owner);
        }

        if let Some(parent_id) = params.parent_id.as_deref() {
            let parent = self.load(parent_id)?;
            self.ensure_same_kind(&node, &parent)?;

            node.assign_parent(Some(parent.id().to_string()));
            node.apply_inherited_visibility(inherited_from_parent(parent.final_visibility()));
            self.attach_child(parent.id(), &node)?;
        }

        let node_id = node.id().to_string();
        let parent_id = node.parent_id().map(str::to_string);
        self.save(node)?;
        self.refresh_chain(Some(&node_id))?;

        let created = self.load(&node_id)?;
        let after = self.snapshot(&created)?;
        self.publish_change(created.kind(), None, Some(&after));

        tracing::info!(
            "Created {} {} ('{}') under {:?}",
            created.kind(),
            node_id,
            created.name(),
            parent_id
        );

        self.emit_event(DomainEvent::NodeCreated(created.clone()));
        if parent_id.is_some() {
            self.emit_event(DomainEvent::HierarchyChanged(HierarchyChange {
                child_id: node_id,
                old_parent_id: None,
                new_parent_id: parent_id,
            }));
        }

        Ok(created)
    }

    /// Move `node_id` under `new_parent_id`, or detach it to a root with `None`
    ///
    /// A structurally invalid move is not an error: it returns
    /// `ValidationOutcome::Rejected` and leaves the tree untouched.
    ///
    /// # Errors
    ///
    /// - `NodeNotFound` if the node or the new parent does not exist
    /// - `KindMismatch` if the new parent is a different kind
    pub fn reparent(
        &mut self,
        node_id: &str,
        new_parent_id: Option<&str>,
    ) -> Result<ValidationOutcome, TreeServiceError> {
        let mut node = self.load(node_id)?;

        if let Some(parent_id) = new_parent_id {
            if let Some(violation) = check_parent(&self.store, node_id, parent_id)? {
                tracing::debug!(
                    "Rejected reparent of {} under {}: {}",
                    node_id,
                    parent_id,
                    violation.message_key()
                );
                return Ok(ValidationOutcome::Rejected(violation));
            }
            let parent = self.load(parent_id)?;
            self.ensure_same_kind(&node, &parent)?;
        }

        let old_parent_id = node.parent_id().map(str::to_string);
        if old_parent_id.as_deref() == new_parent_id && node.raw_parent_id() == new_parent_id {
            return Ok(ValidationOutcome::Valid);
        }

        let before = self.snapshot(&node)?;

        if let Some(old_parent_id) = old_parent_id.as_deref() {
            self.detach_child(old_parent_id, node_id)?;
        }
        node.assign_parent(new_parent_id.map(str::to_string));
        if let Some(parent_id) = new_parent_id {
            self.attach_child(parent_id, &node)?;
        }
        self.save(node)?;

        let changed = propagate(&mut self.store, node_id)?;
        self.publish_propagation(node_id, changed);

        self.refresh_chain(old_parent_id.as_deref())?;
        self.refresh_chain(Some(node_id))?;

        let moved = self.load(node_id)?;
        let after = self.snapshot(&moved)?;
        self.publish_change(moved.kind(), Some(&before), Some(&after));

        tracing::info!(
            "Moved {} from {:?} to {:?}",
            node_id,
            old_parent_id,
            new_parent_id
        );

        self.emit_event(DomainEvent::HierarchyChanged(HierarchyChange {
            child_id: node_id.to_string(),
            old_parent_id,
            new_parent_id: new_parent_id.map(str::to_string),
        }));
        self.emit_event(DomainEvent::NodeUpdated(moved));

        Ok(ValidationOutcome::Valid)
    }

    /// Change the declared visibility of `node_id` and propagate it to the subtree
    pub fn set_declared_visibility(
        &mut self,
        node_id: &str,
        visibility: Visibility,
    ) -> Result<(), TreeServiceError> {
        let mut node = self.load(node_id)?;
        let before = self.snapshot(&node)?;

        if !node.declare_visibility(visibility) {
            return Ok(());
        }
        self.save(node)?;

        let changed = propagate(&mut self.store, node_id)?;
        tracing::debug!(
            "Visibility of {} set to {}; {} node(s) updated",
            node_id,
            visibility,
            changed.len()
        );
        self.publish_propagation(node_id, changed);
        self.refresh_chain(Some(node_id))?;

        let updated = self.load(node_id)?;
        let after = self.snapshot(&updated)?;
        self.publish_change(updated.kind(), Some(&before), Some(&after));
        self.emit_event(DomainEvent::NodeUpdated(updated));

        Ok(())
    }

    /// Rename `node_id`, moving it to its new position among its siblings
    pub fn rename(&mut self, node_id: &str, name: &str) -> Result<TreeNode, TreeServiceError> {
        let mut node = self.load(node_id)?;
        let before = self.snapshot(&node)?;

        if !node.rename(name)? {
            return Ok(node);
        }
        let parent_id = node.parent_id().map(str::to_string);
        self.save(node.clone())?;

        if let Some(parent_id) = parent_id.as_deref() {
            self.detach_child(parent_id, node_id)?;
            self.attach_child(parent_id, &node)?;
        }

        let after = self.snapshot(&node)?;
        self.publish_change(node.kind(), Some(&before), Some(&after));
        self.emit_event(DomainEvent::NodeUpdated(node.clone()));

        Ok(node)
    }

    /// Replace the attachment of `node_id`; the previous file goes to the remover
    pub fn set_attachment(
        &mut self,
        node_id: &str,
        image: Option<String>,
    ) -> Result<TreeNode, TreeServiceError> {
        let mut node = self.load(node_id)?;
        if node.image() == image.as_deref() {
            return Ok(node);
        }
        let before = self.snapshot(&node)?;

        let previous = node.replace_image(image);
        self.save(node.clone())?;

        if let Some(previous) = previous.as_deref() {
            self.remove_attachments(node_id, Some(previous));
        }

        let after = self.snapshot(&node)?;
        self.publish_change(node.kind(), Some(&before), Some(&after));
        self.emit_event(DomainEvent::NodeUpdated(node.clone()));

        Ok(node)
    }

    /// Count a view of `node_id` and return the new total
    pub fn record_view(&mut self, node_id: &str) -> Result<u64, TreeServiceError> {
        let mut node = self.load(node_id)?;
        let seen = node.record_view();
        self.save(node)?;
        Ok(seen)
    }

    fn remove_attachments(&self, node_id: &str, attachment: Option<&str>) {
        if let Some(remover) = self.attachment_remover.as_ref() {
            if let Err(e) = remover.remove_attachments(node_id, attachment) {
                tracing::warn!("Failed to remove attachments of {}: {}", node_id, e);
            }
        }
    }

    /// Delete `node_id` and all of its descendants
    ///
    /// Returns the removed ids: the node first, then descendants breadth-first in
    /// child order.
    pub fn delete_subtree(&mut self, node_id: &str) -> Result<Vec<String>, TreeServiceError> {
        let node = self.load(node_id)?;
        let ids = subtree_ids(&self.store, node_id)?;
        let parent_id = node.parent_id().map(str::to_string);

        if let Some(parent_id) = parent_id.as_deref() {
            self.detach_child(parent_id, node_id)?;
        }

        for id in &ids {
            let removed = self
                .store
                .remove(id)
                .map_err(|e| db_error(e, "Failed to remove node"))?;

            if let Some(removed) = removed {
                self.remove_attachments(id, removed.image());
                let before = node_snapshot(&removed, None);
                self.publish_change(removed.kind(), Some(&before), None);
                self.emit_event(DomainEvent::NodeDeleted { id: id.clone() });
            }
        }

        self.refresh_chain(parent_id.as_deref())?;

        tracing::info!("Deleted subtree of {} ({} nodes)", node_id, ids.len());
        if parent_id.is_some() {
            self.emit_event(DomainEvent::HierarchyChanged(HierarchyChange {
                child_id: node_id.to_string(),
                old_parent_id: parent_id,
                new_parent_id: None,
            }));
        }

        Ok(ids)
    }

    /// Breadcrumb for a container, root first
    pub fn build_breadcrumb(
        &self,
        node_id: &str,
        context: BreadcrumbContext,
    ) -> Result<Vec<BreadcrumbSegment>, TreeServiceError> {
        build_path(&self.store, node_id, context, &self.config)
    }

    /// Breadcrumb for an item: its collection's path, then the item
    pub fn build_item_breadcrumb(
        &self,
        item: &CatalogItem,
        context: BreadcrumbContext,
    ) -> Result<Vec<BreadcrumbSegment>, TreeServiceError> {
        build_item_path(&self.store, item, context, &self.config)
    }

    /// Diff two snapshots and publish the resulting record, if any
    ///
    /// Node mutations made through this service are recorded automatically; hosts
    /// call this for entities the engine does not store, such as items.
    pub fn record_change(
        &self,
        entity_kind: EntityKind,
        before: Option<&EntitySnapshot>,
        after: Option<&EntitySnapshot>,
        relations: &RelationDeltas,
    ) -> Option<ChangeRecord> {
        let record = diff(entity_kind, before, after, relations)?;
        self.emit_event(DomainEvent::ChangeRecorded(record.clone()));
        Some(record)
    }

    /// Nodes `node_id` could be moved under: same kind, not itself, not a descendant
    pub fn candidate_parents(&self, node_id: &str) -> Result<Vec<TreeNode>, TreeServiceError> {
        let node = self.load(node_id)?;
        let excluded: HashSet<String> = subtree_ids(&self.store, node_id)?.into_iter().collect();

        let candidates = self
            .store
            .nodes_of_kind(node.kind())
            .map_err(|e| db_error(e, "Failed to list nodes"))?;

        Ok(candidates
            .into_iter()
            .filter(|candidate| !excluded.contains(candidate.id()))
            .collect())
    }

    /// Recompute cached values for `node_id` and its ancestors
    pub fn refresh_cached_values(&mut self, node_id: &str) -> Result<(), TreeServiceError> {
        self.load(node_id)?;
        self.refresh_chain(Some(node_id))
    }

    /// Check the whole store for structural and visibility inconsistencies
    pub fn audit(&self) -> Result<TreeAuditReport, TreeServiceError> {
        audit_store(&self.store)
    }
}
