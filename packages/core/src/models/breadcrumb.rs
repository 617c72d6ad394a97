//! Breadcrumb Types
//!
//! A breadcrumb is a root-to-node list of segments. Each segment names the route
//! that displays the entity and the parameters that route needs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which page family the breadcrumb is rendered for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreadcrumbContext {
    /// The owner's own pages
    #[default]
    Default,
    /// Another user browsing the owner's public profile
    OwnerProfile,
    /// Shareable preview pages
    Preview,
}

/// Route variant of a single segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteKind {
    Show,
    OwnerProfile,
    Preview,
}

impl From<BreadcrumbContext> for RouteKind {
    fn from(context: BreadcrumbContext) -> Self {
        match context {
            BreadcrumbContext::Default => RouteKind::Show,
            BreadcrumbContext::OwnerProfile => RouteKind::OwnerProfile,
            BreadcrumbContext::Preview => RouteKind::Preview,
        }
    }
}

/// Entity class a segment points at; also the route name fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentClass {
    Collection,
    Wishlist,
    Item,
}

impl SegmentClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentClass::Collection => "collection",
            SegmentClass::Wishlist => "wishlist",
            SegmentClass::Item => "item",
        }
    }
}

/// One element of a breadcrumb path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BreadcrumbSegment {
    pub label: String,
    pub entity_id: String,
    pub class: SegmentClass,
    pub route_kind: RouteKind,
    /// Fully qualified route name, e.g. `app_collection_show`
    pub route: String,
    /// Route parameters; always contains `id`
    pub params: BTreeMap<String, String>,
}
