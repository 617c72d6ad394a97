//! Tests for TreeNode

#[cfg(test)]
mod tests {
    use crate::models::{
        NodeKind, StructuralViolation, TreeNode, ValidationError, ValidationOutcome, Visibility,
    };
    use serde_json::json;

    #[test]
    fn test_new_node_defaults() {
        let node = TreeNode::new(NodeKind::Wishlist, "Birthday").unwrap();
        assert!(!node.id().is_empty());
        assert_eq!(node.kind(), NodeKind::Wishlist);
        assert_eq!(node.visibility(), Visibility::Public);
        assert_eq!(node.parent_visibility(), None);
        assert_eq!(node.final_visibility(), Visibility::Public);
        assert!(node.children().is_empty());
        assert!(node.is_root());
        assert_eq!(node.seen_counter(), 0);
        assert!(node.cached_values().is_empty());
        assert_eq!(node.created_at(), node.updated_at());
    }

    #[test]
    fn test_new_node_trims_and_rejects_blank_names() {
        let node = TreeNode::new(NodeKind::Collection, "  Stamps  ").unwrap();
        assert_eq!(node.name(), "Stamps");

        let err = TreeNode::new(NodeKind::Collection, "   ").unwrap_err();
        assert_eq!(err, ValidationError::EmptyName);
    }

    #[test]
    fn test_new_with_id_rejects_empty_id() {
        let err = TreeNode::new_with_id("", NodeKind::Collection, "Books").unwrap_err();
        assert!(err.to_string().contains("id"));
    }

    #[test]
    fn test_with_visibility_sets_final_for_root() {
        let node = TreeNode::new(NodeKind::Collection, "Vinyl")
            .unwrap()
            .with_visibility(Visibility::Private);
        assert_eq!(node.visibility(), Visibility::Private);
        assert_eq!(node.final_visibility(), Visibility::Private);
        assert!(node.validate().is_ok());
    }

    #[test]
    fn test_with_visibility_drops_inherited_level() {
        let mut node = TreeNode::new(NodeKind::Collection, "Vinyl").unwrap();
        node.apply_inherited_visibility(Some(Visibility::Private));
        assert_eq!(node.final_visibility(), Visibility::Private);

        let node = node.with_visibility(Visibility::Internal);
        assert_eq!(node.parent_visibility(), None);
        assert_eq!(node.final_visibility(), Visibility::Internal);
        assert!(node.validate().is_ok());
    }

    #[test]
    fn test_self_reference_reads_as_root() {
        let mut node = TreeNode::new_with_id("a", NodeKind::Collection, "A").unwrap();
        node.force_parent(Some("a".to_string()));
        assert_eq!(node.parent_id(), None);
        assert_eq!(node.raw_parent_id(), Some("a"));
        assert!(node.is_root());
        assert!(node.validate().is_err());
    }

    #[test]
    fn test_apply_inherited_visibility_reports_changes() {
        let mut node = TreeNode::new(NodeKind::Collection, "Coins").unwrap();
        assert!(node.apply_inherited_visibility(Some(Visibility::Internal)));
        assert_eq!(node.final_visibility(), Visibility::Internal);
        assert!(!node.apply_inherited_visibility(Some(Visibility::Internal)));
        assert!(node.apply_inherited_visibility(None));
        assert_eq!(node.final_visibility(), Visibility::Public);
    }

    #[test]
    fn test_rename_reports_unchanged_names() {
        let mut node = TreeNode::new(NodeKind::Collection, "Coins").unwrap();
        assert!(!node.rename(" Coins ").unwrap());
        assert!(node.rename("Banknotes").unwrap());
        assert_eq!(node.name(), "Banknotes");
        assert!(node.rename("").is_err());
        assert_eq!(node.name(), "Banknotes");
    }

    #[test]
    fn test_record_view_is_monotonic_and_keeps_updated_at() {
        let mut node = TreeNode::new(NodeKind::Collection, "Coins").unwrap();
        let updated_at = node.updated_at();
        assert_eq!(node.record_view(), 1);
        assert_eq!(node.record_view(), 2);
        assert_eq!(node.seen_counter(), 2);
        assert_eq!(node.updated_at(), updated_at);
    }

    #[test]
    fn test_replace_image_refreshes_updated_at() {
        let mut node = TreeNode::new(NodeKind::Collection, "Coins").unwrap();
        let before = node.updated_at();
        let previous = node.replace_image(Some("uploads/coins.png".to_string()));
        assert_eq!(previous, None);
        assert_eq!(node.image(), Some("uploads/coins.png"));
        assert!(node.updated_at() >= before);
    }

    #[test]
    fn test_sibling_order_uses_name_then_creation_time() {
        let first = TreeNode::new(NodeKind::Collection, "Same").unwrap();
        let second = TreeNode::new(NodeKind::Collection, "Same").unwrap();
        let other = TreeNode::new(NodeKind::Collection, "Another").unwrap();
        assert!(other.sibling_order(&first).is_lt());
        assert!(first.sibling_order(&second).is_le());
    }

    #[test]
    fn test_validation_outcome_accessors() {
        assert!(ValidationOutcome::Valid.is_ok());
        assert_eq!(ValidationOutcome::Valid.reason(), None);

        let rejected = ValidationOutcome::Rejected(StructuralViolation::ParentIsDescendant);
        assert!(!rejected.is_ok());
        assert_eq!(
            rejected.reason().map(|r| r.message_key()),
            Some("error.parent.is_child_of_current_object")
        );
        assert_eq!(
            StructuralViolation::ParentIsSelf.message_key(),
            "error.parent.same_as_current_object"
        );
    }

    #[test]
    fn test_serialization_uses_camel_case() {
        let node = TreeNode::new_with_id("n-1", NodeKind::Collection, "Comics")
            .unwrap()
            .with_owner("alice");
        let value = serde_json::to_value(&node).unwrap();

        assert_eq!(value["id"], json!("n-1"));
        assert_eq!(value["kind"], json!("collection"));
        assert_eq!(value["finalVisibility"], json!("public"));
        assert_eq!(value["parentVisibility"], json!(null));
        assert_eq!(value["seenCounter"], json!(0));
        assert!(value.get("image").is_none());

        let parsed: TreeNode = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, node);
    }
}
