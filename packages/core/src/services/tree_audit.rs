//! Tree Audit
//!
//! Read-only consistency check over every node in a store. The service keeps these
//! properties true for every mutation it performs; the audit exists for data that
//! arrived some other way (imports, hand-edited snapshots, a buggy external writer).

use super::error::{db_error, TreeServiceError};
use super::visibility_propagator::inherited_from_parent;
use crate::db::TreeStore;
use crate::models::TreeNode;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// A single inconsistency found by [`audit_store`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum AuditIssue {
    /// Blank id or name, or a node listed among its own children
    InvalidNode { id: String, reason: String },
    SelfParent { id: String },
    MissingParent { id: String, parent_id: String },
    MissingChild { id: String, child_id: String },
    KindMismatch { id: String, parent_id: String },
    /// `id` lists `child_id` but the child points elsewhere
    ChildNotLinked { id: String, child_id: String },
    /// `id` points at `parent_id` but is not among its children
    ParentNotLinked { id: String, parent_id: String },
    UnorderedChildren { id: String },
    Cycle { ids: Vec<String> },
    StaleVisibility { id: String },
}

impl fmt::Display for AuditIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditIssue::InvalidNode { id, reason } => write!(f, "{:?} is invalid: {}", id, reason),
            AuditIssue::SelfParent { id } => write!(f, "{} is its own parent", id),
            AuditIssue::MissingParent { id, parent_id } => {
                write!(f, "{} points at missing parent {}", id, parent_id)
            }
            AuditIssue::MissingChild { id, child_id } => {
                write!(f, "{} lists missing child {}", id, child_id)
            }
            AuditIssue::KindMismatch { id, parent_id } => {
                write!(f, "{} and its parent {} differ in kind", id, parent_id)
            }
            AuditIssue::ChildNotLinked { id, child_id } => {
                write!(f, "{} lists {} whose parent is elsewhere", id, child_id)
            }
            AuditIssue::ParentNotLinked { id, parent_id } => {
                write!(f, "{} is missing from the children of {}", id, parent_id)
            }
            AuditIssue::UnorderedChildren { id } => {
                write!(f, "children of {} are not in name order", id)
            }
            AuditIssue::Cycle { ids } => write!(f, "cycle through {}", ids.join(" -> ")),
            AuditIssue::StaleVisibility { id } => {
                write!(f, "{} has stale inherited or final visibility", id)
            }
        }
    }
}

/// Result of auditing a store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeAuditReport {
    pub nodes_checked: usize,
    pub issues: Vec<AuditIssue>,
}

impl TreeAuditReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Ancestor cycles reachable by following parent links, each reported once
fn find_cycles(nodes: &HashMap<&str, &TreeNode>) -> Vec<Vec<String>> {
    let mut cycles = Vec::new();
    let mut settled: HashSet<&str> = HashSet::new();

    let mut starts: Vec<&str> = nodes.keys().copied().collect();
    starts.sort_unstable();

    for start in starts {
        let mut path: Vec<&str> = Vec::new();
        let mut on_path: HashSet<&str> = HashSet::new();
        let mut current = Some(start);

        while let Some(id) = current {
            if settled.contains(id) {
                break;
            }
            if !on_path.insert(id) {
                if let Some(pos) = path.iter().position(|p| *p == id) {
                    cycles.push(path[pos..].iter().map(|s| s.to_string()).collect());
                }
                break;
            }
            path.push(id);
            current = nodes
                .get(id)
                .and_then(|node| node.parent_id())
                .filter(|parent| nodes.contains_key(parent));
        }

        settled.extend(path);
    }

    cycles
}

/// Field-level problems of a single node that `TreeNode::new` would have refused
fn field_issues(node: &TreeNode) -> Vec<AuditIssue> {
    let mut reasons = Vec::new();
    if node.id().trim().is_empty() {
        reasons.push("id is empty");
    }
    if node.name().trim().is_empty() {
        reasons.push("name is empty");
    }
    if node.has_child(node.id()) {
        reasons.push("lists itself as a child");
    }

    reasons
        .into_iter()
        .map(|reason| AuditIssue::InvalidNode {
            id: node.id().to_string(),
            reason: reason.to_string(),
        })
        .collect()
}

/// Check every node of `store` and list what is wrong
pub fn audit_store<S>(store: &S) -> Result<TreeAuditReport, TreeServiceError>
where
    S: TreeStore + ?Sized,
{
    let all = store
        .all_nodes()
        .map_err(|e| db_error(e, "Failed to load nodes for audit"))?;
    let nodes: HashMap<&str, &TreeNode> = all.iter().map(|n| (n.id(), n)).collect();
    let mut issues = Vec::new();

    for node in &all {
        issues.extend(field_issues(node));

        if node.raw_parent_id() == Some(node.id()) {
            issues.push(AuditIssue::SelfParent {
                id: node.id().to_string(),
            });
        }

        if let Some(parent_id) = node.parent_id() {
            match nodes.get(parent_id) {
                None => issues.push(AuditIssue::MissingParent {
                    id: node.id().to_string(),
                    parent_id: parent_id.to_string(),
                }),
                Some(parent) => {
                    if parent.kind() != node.kind() {
                        issues.push(AuditIssue::KindMismatch {
                            id: node.id().to_string(),
                            parent_id: parent_id.to_string(),
                        });
                    }
                    if !parent.has_child(node.id()) {
                        issues.push(AuditIssue::ParentNotLinked {
                            id: node.id().to_string(),
                            parent_id: parent_id.to_string(),
                        });
                    }
                }
            }
        }

        let mut resolved: Vec<&TreeNode> = Vec::with_capacity(node.children().len());
        for child_id in node.children() {
            match nodes.get(child_id.as_str()) {
                None => issues.push(AuditIssue::MissingChild {
                    id: node.id().to_string(),
                    child_id: child_id.clone(),
                }),
                Some(&child) => {
                    if child.parent_id() != Some(node.id()) {
                        issues.push(AuditIssue::ChildNotLinked {
                            id: node.id().to_string(),
                            child_id: child_id.clone(),
                        });
                    }
                    resolved.push(child);
                }
            }
        }
        if resolved
            .windows(2)
            .any(|pair| pair[0].sibling_order(pair[1]).is_gt())
        {
            issues.push(AuditIssue::UnorderedChildren {
                id: node.id().to_string(),
            });
        }

        let expected_inherited = node
            .parent_id()
            .and_then(|parent_id| nodes.get(parent_id))
            .and_then(|parent| inherited_from_parent(parent.final_visibility()));
        let expected_final = node.visibility().restricted_by(node.parent_visibility());
        if node.parent_visibility() != expected_inherited
            || node.final_visibility() != expected_final
        {
            issues.push(AuditIssue::StaleVisibility {
                id: node.id().to_string(),
            });
        }
    }

    issues.extend(find_cycles(&nodes).into_iter().map(|ids| AuditIssue::Cycle { ids }));

    tracing::debug!(
        "Audited {} nodes, {} issue(s) found",
        all.len(),
        issues.len()
    );

    Ok(TreeAuditReport {
        nodes_checked: all.len(),
        issues,
    })
}
