//! Breadcrumb Builder
//!
//! Builds the root-to-node path shown above a container or item page. The walk up
//! the ancestor chain is iterative and keeps a visited set, so a corrupt store (a
//! self-referencing parent or a longer cycle) still yields a finite path.
//!
//! # Routes
//!
//! | context        | route                         | extra params |
//! |----------------|-------------------------------|--------------|
//! | `Default`      | `{prefix}_{class}_show`       |              |
//! | `OwnerProfile` | `{prefix}_user_{class}`       | `username`   |
//! | `Preview`      | `{prefix}_preview_{class}`    |              |
//!
//! Wishlists have no profile or preview pages, so a path that reaches a wishlist
//! switches to the default context from there on.

use super::error::{db_error, TreeServiceError};
use crate::config::TreeEngineConfig;
use crate::db::TreeStore;
use crate::models::{
    BreadcrumbContext, BreadcrumbSegment, CatalogItem, NodeKind, RouteKind, SegmentClass,
    TreeNode,
};
use std::collections::{BTreeMap, HashSet};

fn route_name(prefix: &str, class: SegmentClass, route_kind: RouteKind) -> String {
    match route_kind {
        RouteKind::Show => format!("{}_{}_show", prefix, class.as_str()),
        RouteKind::OwnerProfile => format!("{}_user_{}", prefix, class.as_str()),
        RouteKind::Preview => format!("{}_preview_{}", prefix, class.as_str()),
    }
}

fn segment(
    label: &str,
    entity_id: &str,
    owner: Option<&str>,
    class: SegmentClass,
    context: BreadcrumbContext,
    config: &TreeEngineConfig,
) -> BreadcrumbSegment {
    let route_kind = RouteKind::from(context);
    let mut params = BTreeMap::from([("id".to_string(), entity_id.to_string())]);

    if route_kind == RouteKind::OwnerProfile {
        match owner {
            Some(username) => {
                params.insert("username".to_string(), username.to_string());
            }
            None => {
                tracing::warn!(
                    "Breadcrumb segment {} has no owner; omitting username param",
                    entity_id
                );
            }
        }
    }

    BreadcrumbSegment {
        label: label.to_string(),
        entity_id: entity_id.to_string(),
        class,
        route_kind,
        route: route_name(&config.route_prefix, class, route_kind),
        params,
    }
}

fn node_segment(
    node: &TreeNode,
    context: BreadcrumbContext,
    config: &TreeEngineConfig,
) -> BreadcrumbSegment {
    let (class, context) = match node.kind() {
        NodeKind::Collection => (SegmentClass::Collection, context),
        NodeKind::Wishlist => (SegmentClass::Wishlist, BreadcrumbContext::Default),
    };
    segment(node.name(), node.id(), node.owner(), class, context, config)
}

/// Build the breadcrumb for `node_id`, ordered from the root down to the node itself
///
/// # Errors
///
/// Returns `NodeNotFound` if `node_id` is unknown. A missing ancestor ends the path
/// at the last resolvable node.
pub fn build_path<S>(
    store: &S,
    node_id: &str,
    context: BreadcrumbContext,
    config: &TreeEngineConfig,
) -> Result<Vec<BreadcrumbSegment>, TreeServiceError>
where
    S: TreeStore + ?Sized,
{
    let node = store
        .get_node(node_id)
        .map_err(|e| db_error(e, "Failed to load breadcrumb node"))?
        .ok_or_else(|| TreeServiceError::node_not_found(node_id))?;

    // Once a wishlist is reached, every segment above it is a wishlist too
    let mut context = context;
    if node.kind() == NodeKind::Wishlist {
        context = BreadcrumbContext::Default;
    }

    let mut visited: HashSet<String> = HashSet::from([node.id().to_string()]);
    let mut path = vec![node_segment(&node, context, config)];
    let mut next = node.parent_id().map(str::to_string);

    while let Some(parent_id) = next {
        if !visited.insert(parent_id.clone()) {
            tracing::warn!(
                "Breadcrumb for {} revisited {}; truncating path",
                node_id,
                parent_id
            );
            break;
        }

        let Some(parent) = store
            .get_node(&parent_id)
            .map_err(|e| db_error(e, "Failed to load breadcrumb ancestor"))?
        else {
            tracing::warn!("Breadcrumb ancestor {} of {} is missing", parent_id, node_id);
            break;
        };

        path.push(node_segment(&parent, context, config));
        next = parent.parent_id().map(str::to_string);
    }

    path.reverse();
    Ok(path)
}

/// Build the breadcrumb for a leaf item: its collection's path, then the item
pub fn build_item_path<S>(
    store: &S,
    item: &CatalogItem,
    context: BreadcrumbContext,
    config: &TreeEngineConfig,
) -> Result<Vec<BreadcrumbSegment>, TreeServiceError>
where
    S: TreeStore + ?Sized,
{
    let mut path = build_path(store, &item.collection_id, context, config)?;
    path.push(segment(
        &item.name,
        &item.id,
        item.owner.as_deref(),
        SegmentClass::Item,
        context,
        config,
    ));
    Ok(path)
}
