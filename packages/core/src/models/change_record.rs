//! Change Records
//!
//! Structured, renderer-agnostic descriptions of entity mutations. The recorder in
//! [`services::change_log`](crate::services::change_log) compares two
//! [`EntitySnapshot`]s and emits a [`ChangeRecord`] whose payload is a list of typed
//! [`ChangeDescriptor`]s.
//!
//! # Payload Format
//!
//! Descriptors serialize internally tagged by `property`, so a renderer receives a
//! flat object per change:
//!
//! ```json
//! {"property":"name","old":"X","new":"Y"}
//! {"property":"parent","old":{"id":"...","label":"..."},"new":null}
//! {"property":"tag_added","tagId":"...","tagLabel":"..."}
//! ```

use crate::models::{NodeKind, Tag, Visibility};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of entity a record describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Collection,
    Wishlist,
    Item,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Collection => "collection",
            EntityKind::Wishlist => "wishlist",
            EntityKind::Item => "item",
        }
    }
}

impl From<NodeKind> for EntityKind {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Collection => EntityKind::Collection,
            NodeKind::Wishlist => EntityKind::Wishlist,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Created,
    Updated,
    Deleted,
}

/// Id plus display label of a related entity, so renderers need no second lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: String,
    pub label: String,
}

impl EntityRef {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Fields the change log knows how to compare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackedField {
    Name,
    Image,
    Parent,
    Collection,
    Quantity,
    Visibility,
}

/// Typed value of one tracked field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum TrackedValue {
    Name(String),
    Image(Option<String>),
    Parent(Option<EntityRef>),
    Collection(Option<EntityRef>),
    Quantity(u32),
    Visibility(Visibility),
}

impl TrackedValue {
    pub fn field(&self) -> TrackedField {
        match self {
            TrackedValue::Name(_) => TrackedField::Name,
            TrackedValue::Image(_) => TrackedField::Image,
            TrackedValue::Parent(_) => TrackedField::Parent,
            TrackedValue::Collection(_) => TrackedField::Collection,
            TrackedValue::Quantity(_) => TrackedField::Quantity,
            TrackedValue::Visibility(_) => TrackedField::Visibility,
        }
    }
}

/// State of an entity's tracked fields at one point in time
///
/// A field that is absent from a snapshot is treated as unchanged by the recorder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntitySnapshot {
    pub id: String,
    pub label: String,
    values: Vec<TrackedValue>,
}

impl EntitySnapshot {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            values: Vec::new(),
        }
    }

    /// Add or replace a tracked value (builder style)
    pub fn with(mut self, value: TrackedValue) -> Self {
        self.set(value);
        self
    }

    /// Add or replace a tracked value
    pub fn set(&mut self, value: TrackedValue) {
        let field = value.field();
        match self.values.iter_mut().find(|v| v.field() == field) {
            Some(existing) => *existing = value,
            None => self.values.push(value),
        }
    }

    pub fn get(&self, field: TrackedField) -> Option<&TrackedValue> {
        self.values.iter().find(|v| v.field() == field)
    }

    pub fn values(&self) -> &[TrackedValue] {
        &self.values
    }
}

/// A relation added to or removed from an entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Relation {
    Tag(Tag),
    /// Any other relation; not tracked by the change log
    Other { kind: String, id: String },
}

/// Relations changed alongside a field update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationDeltas {
    pub added: Vec<Relation>,
    pub removed: Vec<Relation>,
}

impl RelationDeltas {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// One change inside a record's payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "property", rename_all = "snake_case")]
pub enum ChangeDescriptor {
    Name {
        old: String,
        new: String,
    },
    Image {
        old: Option<String>,
        new: Option<String>,
    },
    Parent {
        old: Option<EntityRef>,
        new: Option<EntityRef>,
    },
    Collection {
        old: Option<EntityRef>,
        new: Option<EntityRef>,
    },
    Quantity {
        old: u32,
        new: u32,
    },
    Visibility {
        old: Visibility,
        new: Visibility,
    },
    TagAdded {
        #[serde(rename = "tagId")]
        tag_id: String,
        #[serde(rename = "tagLabel")]
        tag_label: String,
    },
    TagRemoved {
        #[serde(rename = "tagId")]
        tag_id: String,
        #[serde(rename = "tagLabel")]
        tag_label: String,
    },
}

impl ChangeDescriptor {
    /// Property name as seen by renderers
    pub fn property(&self) -> &'static str {
        match self {
            ChangeDescriptor::Name { .. } => "name",
            ChangeDescriptor::Image { .. } => "image",
            ChangeDescriptor::Parent { .. } => "parent",
            ChangeDescriptor::Collection { .. } => "collection",
            ChangeDescriptor::Quantity { .. } => "quantity",
            ChangeDescriptor::Visibility { .. } => "visibility",
            ChangeDescriptor::TagAdded { .. } => "tag_added",
            ChangeDescriptor::TagRemoved { .. } => "tag_removed",
        }
    }
}

/// Structured log entry handed to the external sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeRecord {
    pub entity_kind: EntityKind,
    pub entity_id: String,
    pub entity_label: String,
    pub event_kind: EventKind,
    pub payload: Vec<ChangeDescriptor>,
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Contract test: renderers read descriptors as flat objects tagged by `property`
    #[test]
    fn test_descriptor_serialization_contract() {
        let name = ChangeDescriptor::Name {
            old: "X".to_string(),
            new: "Y".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&name).unwrap(),
            json!({"property": "name", "old": "X", "new": "Y"})
        );

        let parent = ChangeDescriptor::Parent {
            old: Some(EntityRef::new("p-1", "Books")),
            new: None,
        };
        assert_eq!(
            serde_json::to_value(&parent).unwrap(),
            json!({"property": "parent", "old": {"id": "p-1", "label": "Books"}, "new": null})
        );

        let tag = ChangeDescriptor::TagAdded {
            tag_id: "t-1".to_string(),
            tag_label: "Marvel".to_string(),
        };
        let value = serde_json::to_value(&tag).unwrap();
        assert_eq!(value["property"], "tag_added");
        assert_eq!(value["tagId"], "t-1");
        assert_eq!(value["tagLabel"], "Marvel");
        assert!(value.get("tag_added").is_none(), "must not be nested");
    }

    #[test]
    fn test_descriptor_property_matches_serde_tag() {
        let descriptors = vec![
            ChangeDescriptor::Quantity { old: 1, new: 2 },
            ChangeDescriptor::Visibility {
                old: Visibility::Public,
                new: Visibility::Private,
            },
            ChangeDescriptor::TagRemoved {
                tag_id: "t".to_string(),
                tag_label: "l".to_string(),
            },
        ];
        for descriptor in descriptors {
            let value = serde_json::to_value(&descriptor).unwrap();
            assert_eq!(value["property"], descriptor.property());
        }
    }

    #[test]
    fn test_snapshot_set_replaces_same_field() {
        let mut snapshot = EntitySnapshot::new("i-1", "Item")
            .with(TrackedValue::Quantity(1))
            .with(TrackedValue::Name("Item".to_string()));
        snapshot.set(TrackedValue::Quantity(3));

        assert_eq!(snapshot.values().len(), 2);
        assert_eq!(
            snapshot.get(TrackedField::Quantity),
            Some(&TrackedValue::Quantity(3))
        );
    }

    #[test]
    fn test_entity_kind_from_node_kind() {
        assert_eq!(EntityKind::from(NodeKind::Wishlist), EntityKind::Wishlist);
        assert_eq!(EntityKind::from(NodeKind::Collection).as_str(), "collection");
    }
}
