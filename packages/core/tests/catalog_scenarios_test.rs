//! End-to-End Catalog Scenarios
//!
//! Drives the public API the way a host application does: load a snapshot,
//! mutate through `TreeService`, read breadcrumbs and consume published events.

use catalog_core::config::TreeEngineConfig;
use catalog_core::db::{DomainEvent, InMemoryTreeStore};
use catalog_core::models::{
    BreadcrumbContext, CatalogItem, ChangeDescriptor, EntityKind, EntityRef, NodeKind,
    Relation, RelationDeltas, RouteKind, SegmentClass, Tag, TrackedValue, Visibility,
};
use catalog_core::services::{AuditIssue, CreateNodeParams, TreeService};
use std::io::Write;
use tempfile::NamedTempFile;

const SNAPSHOT: &str = r#"[
  {"id": "books", "kind": "collection", "name": "Books", "owner": "ana",
   "children": ["novels"], "visibility": "internal", "finalVisibility": "internal",
   "createdAt": "2024-01-01T00:00:00Z", "updatedAt": "2024-01-01T00:00:00Z"},
  {"id": "novels", "kind": "collection", "name": "Novels", "owner": "ana",
   "parentId": "books", "parentVisibility": "internal", "finalVisibility": "internal",
   "createdAt": "2024-01-02T00:00:00Z", "updatedAt": "2024-01-02T00:00:00Z"}
]"#;

fn service_from_snapshot(json: &str) -> TreeService<InMemoryTreeStore> {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    let store = InMemoryTreeStore::from_snapshot_file(file.path()).unwrap();
    TreeService::new(store, TreeEngineConfig::default()).unwrap()
}

#[test]
fn test_snapshot_loads_clean() {
    let service = service_from_snapshot(SNAPSHOT);
    let report = service.audit().unwrap();
    assert_eq!(report.nodes_checked, 2);
    assert!(report.is_clean(), "{:?}", report.issues);
}

#[test]
fn test_stale_snapshot_is_reported() {
    let stale = SNAPSHOT.replace(r#""parentVisibility": "internal", "#, "");
    let service = service_from_snapshot(&stale);
    let issues = service.audit().unwrap().issues;
    assert!(issues.contains(&AuditIssue::StaleVisibility {
        id: "novels".to_string()
    }));
}

#[test]
fn test_item_breadcrumb_on_owner_profile() {
    let service = service_from_snapshot(SNAPSHOT);
    let mut item = CatalogItem::new("Dune", "novels").unwrap();
    item.owner = Some("ana".to_string());

    let path = service
        .build_item_breadcrumb(&item, BreadcrumbContext::OwnerProfile)
        .unwrap();

    let routes: Vec<&str> = path.iter().map(|s| s.route.as_str()).collect();
    assert_eq!(
        routes,
        vec!["app_user_collection", "app_user_collection", "app_user_item"]
    );
    assert!(path.iter().all(|s| s.route_kind == RouteKind::OwnerProfile));
    assert!(path
        .iter()
        .all(|s| s.params.get("username").map(String::as_str) == Some("ana")));
    assert_eq!(path[2].class, SegmentClass::Item);
}

#[test]
fn test_item_change_record_with_tags() {
    let service = service_from_snapshot(SNAPSHOT);
    let mut rx = service.subscribe_to_events();

    let item = CatalogItem::new("Dune", "novels").unwrap();
    let before = item.snapshot("Novels");
    let mut after = before.clone();
    after.set(TrackedValue::Quantity(2));

    let relations = RelationDeltas {
        added: vec![Relation::Tag(Tag::new("t-1", "Sci-fi"))],
        removed: Vec::new(),
    };
    let record = service
        .record_change(EntityKind::Item, Some(&before), Some(&after), &relations)
        .unwrap();

    assert_eq!(
        record.payload,
        vec![
            ChangeDescriptor::Quantity { old: 1, new: 2 },
            ChangeDescriptor::TagAdded {
                tag_id: "t-1".to_string(),
                tag_label: "Sci-fi".to_string(),
            },
        ]
    );
    assert!(matches!(rx.try_recv(), Ok(DomainEvent::ChangeRecorded(_))));

    assert!(service
        .record_change(EntityKind::Item, Some(&before), Some(&before), &RelationDeltas::default())
        .is_none());
}

#[test]
fn test_new_child_inherits_snapshot_restriction() {
    let mut service = service_from_snapshot(SNAPSHOT);
    let sci_fi = service
        .create_node(CreateNodeParams::new(NodeKind::Collection, "Sci-fi").with_parent("novels"))
        .unwrap();
    assert_eq!(sci_fi.final_visibility(), Visibility::Internal);

    let mut rx = service.subscribe_to_events();
    service.reparent(sci_fi.id(), None).unwrap();

    let record = std::iter::from_fn(|| rx.try_recv().ok())
        .find_map(|event| match event {
            DomainEvent::ChangeRecorded(record) => Some(record),
            _ => None,
        })
        .unwrap();
    assert_eq!(
        record.payload,
        vec![ChangeDescriptor::Parent {
            old: Some(EntityRef::new("novels", "Novels")),
            new: None,
        }]
    );
    assert_eq!(
        service.get_node(sci_fi.id()).unwrap().unwrap().final_visibility(),
        Visibility::Public
    );
}
