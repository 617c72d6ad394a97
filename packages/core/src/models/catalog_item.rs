//! Catalog Items
//!
//! Items are the leaf entities of the catalog. They live inside a collection but are
//! not containers themselves, so they never appear in the tree store. The engine only
//! needs them for breadcrumbs (an item's path is its collection's path plus itself)
//! and for change records.

use crate::models::{
    validate_node_name, EntityRef, EntitySnapshot, TrackedValue, ValidationError, Visibility,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tag attached to an item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: String,
    pub label: String,
}

impl Tag {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

/// Leaf entity owned by a collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
    /// Owning collection
    pub collection_id: String,
    pub quantity: u32,
    pub visibility: Visibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
}

impl CatalogItem {
    /// Create an item with quantity 1 and public visibility
    pub fn new(
        name: impl AsRef<str>,
        collection_id: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            name: validate_node_name(name.as_ref())?,
            collection_id: collection_id.into(),
            quantity: 1,
            visibility: Visibility::Public,
            image: None,
            owner: None,
        })
    }

    /// Snapshot of the item's tracked fields for the change log
    ///
    /// The owning collection's label is not known to the item, so the caller
    /// supplies it.
    pub fn snapshot(&self, collection_label: impl Into<String>) -> EntitySnapshot {
        EntitySnapshot::new(self.id.clone(), self.name.clone())
            .with(TrackedValue::Name(self.name.clone()))
            .with(TrackedValue::Image(self.image.clone()))
            .with(TrackedValue::Collection(Some(EntityRef::new(
                self.collection_id.clone(),
                collection_label,
            ))))
            .with(TrackedValue::Quantity(self.quantity))
            .with(TrackedValue::Visibility(self.visibility))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TrackedField;

    #[test]
    fn test_new_item_defaults() {
        let item = CatalogItem::new("Spider-Man #1", "col-1").unwrap();
        assert_eq!(item.quantity, 1);
        assert_eq!(item.visibility, Visibility::Public);
        assert_eq!(item.collection_id, "col-1");
        assert!(CatalogItem::new(" ", "col-1").is_err());
    }

    #[test]
    fn test_snapshot_tracks_item_fields() {
        let item = CatalogItem::new("Spider-Man #1", "col-1").unwrap();
        let snapshot = item.snapshot("Comics");
        assert_eq!(
            snapshot.get(TrackedField::Collection),
            Some(&TrackedValue::Collection(Some(EntityRef::new("col-1", "Comics"))))
        );
        assert_eq!(
            snapshot.get(TrackedField::Quantity),
            Some(&TrackedValue::Quantity(1))
        );
        assert!(snapshot.get(TrackedField::Parent).is_none());
    }
}
