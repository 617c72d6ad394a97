//! Change-Log Recorder
//!
//! Turns a before/after pair of [`EntitySnapshot`]s into zero or one
//! [`ChangeRecord`]. Each entity kind has an allow-list of tracked fields; only
//! those are compared, in allow-list order, and tag relations are appended after the
//! field changes.
//!
//! The recorder never renders text. Records go to the host through a
//! [`DomainEvent::ChangeRecorded`](crate::db::DomainEvent) and a
//! [`ChangeRenderer`] supplied by the host turns them into display lines.

use crate::models::{
    ChangeDescriptor, ChangeRecord, EntityKind, EntityRef, EntitySnapshot, EventKind, Relation,
    RelationDeltas, TrackedField, TrackedValue, TreeNode,
};
use chrono::Utc;

const ITEM_FIELDS: &[TrackedField] = &[
    TrackedField::Name,
    TrackedField::Image,
    TrackedField::Collection,
    TrackedField::Quantity,
    TrackedField::Visibility,
];

const CONTAINER_FIELDS: &[TrackedField] = &[
    TrackedField::Name,
    TrackedField::Image,
    TrackedField::Parent,
    TrackedField::Visibility,
];

/// Renders a record as localized display lines
///
/// Implemented by the host's translation layer.
pub trait ChangeRenderer {
    fn render(&self, record: &ChangeRecord, locale: &str) -> Vec<String>;
}

/// Fields compared for an entity kind, in payload order
pub fn tracked_fields(kind: EntityKind) -> &'static [TrackedField] {
    match kind {
        EntityKind::Item => ITEM_FIELDS,
        EntityKind::Collection | EntityKind::Wishlist => CONTAINER_FIELDS,
    }
}

/// Snapshot of a container's tracked fields
///
/// `parent` must be the node's current parent, if it has one; its name becomes the
/// reference label.
pub fn node_snapshot(node: &TreeNode, parent: Option<&TreeNode>) -> EntitySnapshot {
    EntitySnapshot::new(node.id(), node.name())
        .with(TrackedValue::Name(node.name().to_string()))
        .with(TrackedValue::Image(node.image().map(str::to_string)))
        .with(TrackedValue::Parent(
            parent.map(|p| EntityRef::new(p.id(), p.name())),
        ))
        .with(TrackedValue::Visibility(node.visibility()))
}

fn describe(old: &TrackedValue, new: &TrackedValue) -> Option<ChangeDescriptor> {
    if old == new {
        return None;
    }

    match (old, new) {
        (TrackedValue::Name(old), TrackedValue::Name(new)) => Some(ChangeDescriptor::Name {
            old: old.clone(),
            new: new.clone(),
        }),
        (TrackedValue::Image(old), TrackedValue::Image(new)) => Some(ChangeDescriptor::Image {
            old: old.clone(),
            new: new.clone(),
        }),
        (TrackedValue::Parent(old), TrackedValue::Parent(new)) => {
            // Relation fields compare by identity; a renamed parent is not a move
            if old.as_ref().map(|r| &r.id) == new.as_ref().map(|r| &r.id) {
                return None;
            }
            Some(ChangeDescriptor::Parent {
                old: old.clone(),
                new: new.clone(),
            })
        }
        (TrackedValue::Collection(old), TrackedValue::Collection(new)) => {
            if old.as_ref().map(|r| &r.id) == new.as_ref().map(|r| &r.id) {
                return None;
            }
            Some(ChangeDescriptor::Collection {
                old: old.clone(),
                new: new.clone(),
            })
        }
        (TrackedValue::Quantity(old), TrackedValue::Quantity(new)) => {
            Some(ChangeDescriptor::Quantity {
                old: *old,
                new: *new,
            })
        }
        (TrackedValue::Visibility(old), TrackedValue::Visibility(new)) => {
            Some(ChangeDescriptor::Visibility {
                old: *old,
                new: *new,
            })
        }
        _ => None,
    }
}

/// Descriptors for the tag relations in `relations`, added before removed
fn tag_descriptors(relations: &RelationDeltas) -> impl Iterator<Item = ChangeDescriptor> + '_ {
    let added = relations.added.iter().filter_map(|relation| match relation {
        Relation::Tag(tag) => Some(ChangeDescriptor::TagAdded {
            tag_id: tag.id.clone(),
            tag_label: tag.label.clone(),
        }),
        Relation::Other { .. } => None,
    });
    let removed = relations.removed.iter().filter_map(|relation| match relation {
        Relation::Tag(tag) => Some(ChangeDescriptor::TagRemoved {
            tag_id: tag.id.clone(),
            tag_label: tag.label.clone(),
        }),
        Relation::Other { .. } => None,
    });
    added.chain(removed)
}

fn record(
    entity_kind: EntityKind,
    snapshot: &EntitySnapshot,
    event_kind: EventKind,
    payload: Vec<ChangeDescriptor>,
) -> ChangeRecord {
    ChangeRecord {
        entity_kind,
        entity_id: snapshot.id.clone(),
        entity_label: snapshot.label.clone(),
        event_kind,
        payload,
        recorded_at: Utc::now(),
    }
}

/// Compare two snapshots of one entity
///
/// - `(None, Some)` is a creation and `(Some, None)` a deletion, both with an
///   empty payload.
/// - `(Some, Some)` is an update; returns `None` when no tracked field or tag
///   relation changed. A field missing from either snapshot counts as unchanged.
/// - `(None, None)` records nothing.
pub fn diff(
    entity_kind: EntityKind,
    before: Option<&EntitySnapshot>,
    after: Option<&EntitySnapshot>,
    relations: &RelationDeltas,
) -> Option<ChangeRecord> {
    match (before, after) {
        (None, None) => None,
        (None, Some(after)) => Some(record(entity_kind, after, EventKind::Created, Vec::new())),
        (Some(before), None) => Some(record(entity_kind, before, EventKind::Deleted, Vec::new())),
        (Some(before), Some(after)) => {
            let mut payload: Vec<ChangeDescriptor> = tracked_fields(entity_kind)
                .iter()
                .filter_map(|field| match (before.get(*field), after.get(*field)) {
                    (Some(old), Some(new)) => describe(old, new),
                    _ => None,
                })
                .collect();
            payload.extend(tag_descriptors(relations));

            if payload.is_empty() {
                return None;
            }

            tracing::debug!(
                "Recorded {} change(s) on {} {}",
                payload.len(),
                entity_kind.as_str(),
                after.id
            );
            Some(record(entity_kind, after, EventKind::Updated, payload))
        }
    }
}
