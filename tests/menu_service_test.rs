//! Tests for MenuService against the in-memory store

use std::sync::Arc;

use rstest::{fixture, rstest};

use menutree::application::services::{MenuService, MenuUpdate};
use menutree::application::ApplicationError;
use menutree::domain::{is_contiguous, DomainError, ErrorKind, Node, NodeId};
use menutree::infrastructure::{MemoryNodeStore, NodeReader};
use menutree::util::testing;

#[fixture]
fn service() -> MenuService {
    testing::init_test_setup();
    MenuService::new(Arc::new(MemoryNodeStore::new()))
}

fn orders_of(service: &MenuService, parent: Option<&NodeId>) -> Vec<(String, u32)> {
    service
        .store()
        .fetch_children_of(parent)
        .unwrap()
        .into_iter()
        .map(|node| (node.name, node.order))
        .collect()
}

fn names_of(service: &MenuService, parent: Option<&NodeId>) -> Vec<String> {
    orders_of(service, parent)
        .into_iter()
        .map(|(name, _)| name)
        .collect()
}

fn kind(err: ApplicationError) -> ErrorKind {
    err.kind()
}

// ============================================================
// create
// ============================================================

#[rstest]
fn given_empty_store_when_creating_roots_then_appended_in_order(service: MenuService) {
    let a = service.create("A", None).unwrap();
    let b = service.create("B", None).unwrap();
    let c = service.create("C", None).unwrap();

    assert_eq!((a.order, b.order, c.order), (0, 1, 2));
    assert!(a.is_root());
    assert_eq!(names_of(&service, None), vec!["A", "B", "C"]);
}

#[rstest]
fn given_parent_when_creating_child_then_order_counts_only_that_group(service: MenuService) {
    let parent = service.create("Parent", None).unwrap();
    service.create("Sibling root", None).unwrap();

    let first = service.create("First", Some(parent.id)).unwrap();
    let second = service.create("Second", Some(parent.id)).unwrap();

    assert_eq!(first.parent_id, Some(parent.id));
    assert_eq!((first.order, second.order), (0, 1));
}

#[rstest]
fn given_unknown_parent_when_creating_then_not_found(service: MenuService) {
    let missing = NodeId::new();

    let err = service.create("Child", Some(missing)).unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::ParentNotFound(id)) if id == missing
    ));
    assert!(service.forest().unwrap().is_empty());
}

#[rstest]
#[case("")]
#[case("   ")]
#[case("\t\n")]
fn given_blank_name_when_creating_then_validation_error(service: MenuService, #[case] name: &str) {
    let err = service.create(name, None).unwrap_err();
    assert_eq!(kind(err), ErrorKind::Validation);
}

// ============================================================
// get / rename
// ============================================================

#[rstest]
fn given_node_when_getting_then_includes_parent_and_ordered_children(service: MenuService) {
    let system = service.create("System Management", None).unwrap();
    let users = service.create("Users", Some(system.id)).unwrap();
    let roles = service.create("Roles & Permissions", Some(system.id)).unwrap();
    service.reorder(&roles.id, 0).unwrap();

    let detail = service.get(&system.id).unwrap();
    assert_eq!(detail.parent, None);
    let children: Vec<_> = detail.children.iter().map(|c| c.id).collect();
    assert_eq!(children, vec![roles.id, users.id]);

    let child = service.get(&users.id).unwrap();
    assert_eq!(child.parent.map(|p| p.id), Some(system.id));
    assert!(child.children.is_empty());
}

#[rstest]
fn given_unknown_id_when_getting_then_not_found(service: MenuService) {
    let err = service.get(&NodeId::new()).unwrap_err();
    assert_eq!(kind(err), ErrorKind::NotFound);
}

#[rstest]
fn given_node_when_renaming_then_parent_and_order_unchanged(service: MenuService) {
    let parent = service.create("Parent", None).unwrap();
    service.create("First", Some(parent.id)).unwrap();
    let second = service.create("Second", Some(parent.id)).unwrap();

    let renamed = service.rename(&second.id, "Renamed").unwrap();

    assert_eq!(renamed.name, "Renamed");
    assert_eq!(renamed.parent_id, Some(parent.id));
    assert_eq!(renamed.order, 1);
}

#[rstest]
fn given_blank_name_when_renaming_then_name_kept(service: MenuService) {
    let node = service.create("Keep", None).unwrap();

    let err = service.rename(&node.id, " ").unwrap_err();

    assert_eq!(kind(err), ErrorKind::Validation);
    assert_eq!(service.get(&node.id).unwrap().node.name, "Keep");
}

// ============================================================
// move
// ============================================================

#[rstest]
fn given_example_scenario_when_moving_then_cycle_rejected(service: MenuService) {
    let a = service.create("A", None).unwrap();
    let b = service.create("B", None).unwrap();
    let c = service.create("C", Some(a.id)).unwrap();
    assert_eq!((a.order, b.order, c.order), (0, 1, 0));

    let moved = service.move_node(&b.id, Some(c.id)).unwrap();
    assert_eq!(moved.parent_id, Some(c.id));
    assert_eq!(moved.order, 0);
    assert_eq!(orders_of(&service, Some(&a.id)), vec![("C".to_string(), 0)]);
    assert_eq!(orders_of(&service, None), vec![("A".to_string(), 0)]);

    let err = service.move_node(&c.id, Some(b.id)).unwrap_err();
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::CycleDetected { .. })
    ));
    assert_eq!(
        service.get(&c.id).unwrap().node.parent_id,
        Some(a.id),
        "failed move must not change anything"
    );
}

#[rstest]
fn given_node_when_moving_under_itself_then_invalid_operation(service: MenuService) {
    let node = service.create("Loop", None).unwrap();

    let err = service.move_node(&node.id, Some(node.id)).unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::SelfParent(_))
    ));
}

#[rstest]
fn given_missing_target_parent_when_moving_then_not_found(service: MenuService) {
    let node = service.create("Node", None).unwrap();

    let err = service.move_node(&node.id, Some(NodeId::new())).unwrap_err();

    assert_eq!(kind(err), ErrorKind::NotFound);
}

#[rstest]
fn given_middle_sibling_when_moving_away_then_both_groups_contiguous(service: MenuService) {
    let left = service.create("Left", None).unwrap();
    let right = service.create("Right", None).unwrap();
    service.create("L0", Some(left.id)).unwrap();
    let l1 = service.create("L1", Some(left.id)).unwrap();
    service.create("L2", Some(left.id)).unwrap();
    service.create("R0", Some(right.id)).unwrap();

    let moved = service.move_node(&l1.id, Some(right.id)).unwrap();

    assert_eq!(moved.order, 1);
    assert_eq!(
        orders_of(&service, Some(&left.id)),
        vec![("L0".to_string(), 0), ("L2".to_string(), 1)]
    );
    assert_eq!(
        orders_of(&service, Some(&right.id)),
        vec![("R0".to_string(), 0), ("L1".to_string(), 1)]
    );
}

#[rstest]
fn given_child_when_moving_to_root_then_appended_to_roots(service: MenuService) {
    let parent = service.create("Parent", None).unwrap();
    service.create("Other", None).unwrap();
    let child = service.create("Child", Some(parent.id)).unwrap();

    let moved = service.move_node(&child.id, None).unwrap();

    assert!(moved.is_root());
    assert_eq!(moved.order, 2);
    assert!(names_of(&service, Some(&parent.id)).is_empty());
}

#[rstest]
fn given_subtree_when_moving_then_descendants_follow(service: MenuService) {
    let a = service.create("A", None).unwrap();
    let b = service.create("B", None).unwrap();
    let a1 = service.create("A1", Some(a.id)).unwrap();
    let a11 = service.create("A11", Some(a1.id)).unwrap();

    service.move_node(&a1.id, Some(b.id)).unwrap();

    let path: Vec<_> = service
        .path(&a11.id)
        .unwrap()
        .into_iter()
        .map(|n| n.name)
        .collect();
    assert_eq!(path, vec!["B", "A1", "A11"]);
}

// ============================================================
// update
// ============================================================

#[rstest]
fn given_name_and_parent_when_updating_then_both_applied(service: MenuService) {
    let target = service.create("Target", None).unwrap();
    let node = service.create("Node", None).unwrap();

    let updated = service
        .update(
            &node.id,
            &MenuUpdate {
                name: Some("Moved".into()),
                parent_id: Some(Some(target.id)),
            },
        )
        .unwrap();

    assert_eq!(updated.name, "Moved");
    assert_eq!(updated.parent_id, Some(target.id));
    assert_eq!(updated.order, 0);
}

#[rstest]
fn given_absent_parent_field_when_updating_then_parent_kept(service: MenuService) {
    let parent = service.create("Parent", None).unwrap();
    let child = service.create("Child", Some(parent.id)).unwrap();

    let updated = service
        .update(
            &child.id,
            &MenuUpdate {
                name: Some("Renamed".into()),
                parent_id: None,
            },
        )
        .unwrap();

    assert_eq!(updated.parent_id, Some(parent.id));
}

#[rstest]
fn given_explicit_null_parent_when_updating_then_becomes_root(service: MenuService) {
    let parent = service.create("Parent", None).unwrap();
    let child = service.create("Child", Some(parent.id)).unwrap();

    let updated = service
        .update(
            &child.id,
            &MenuUpdate {
                name: None,
                parent_id: Some(None),
            },
        )
        .unwrap();

    assert!(updated.is_root());
    assert_eq!(updated.order, 1);
}

#[rstest]
fn given_missing_parent_when_updating_then_rename_rolled_back(service: MenuService) {
    let node = service.create("Original", None).unwrap();

    let err = service
        .update(
            &node.id,
            &MenuUpdate {
                name: Some("Changed".into()),
                parent_id: Some(Some(NodeId::new())),
            },
        )
        .unwrap_err();

    assert_eq!(kind(err), ErrorKind::NotFound);
    assert_eq!(service.get(&node.id).unwrap().node.name, "Original");
}

// ============================================================
// delete
// ============================================================

#[rstest]
fn given_subtree_when_deleting_then_cascades_and_renumbers(service: MenuService) {
    let first = service.create("First", None).unwrap();
    let doomed = service.create("Doomed", None).unwrap();
    service.create("Last", None).unwrap();
    let child = service.create("Child", Some(doomed.id)).unwrap();
    let grandchild = service.create("Grandchild", Some(child.id)).unwrap();

    let outcome = service.delete(&doomed.id).unwrap();

    assert_eq!(outcome.removed.len(), 3);
    assert_eq!(outcome.removed[0], doomed.id);
    assert!(outcome.removed.contains(&grandchild.id));
    for id in &outcome.removed {
        assert!(service.store().fetch_by_id(id).unwrap().is_none());
    }
    assert_eq!(
        orders_of(&service, None),
        vec![("First".to_string(), 0), ("Last".to_string(), 1)]
    );
    assert_eq!(service.get(&first.id).unwrap().node.order, 0);
}

#[rstest]
fn given_unknown_id_when_deleting_then_not_found(service: MenuService) {
    service.create("Untouched", None).unwrap();

    let err = service.delete(&NodeId::new()).unwrap_err();

    assert_eq!(kind(err), ErrorKind::NotFound);
    assert_eq!(service.forest().unwrap().len(), 1);
}

// ============================================================
// reorder
// ============================================================

#[rstest]
#[case(0, vec!["C", "A", "B"], 0)]
#[case(1, vec!["A", "C", "B"], 1)]
#[case(2, vec!["A", "B", "C"], 2)]
#[case(99, vec!["A", "B", "C"], 2)]
#[case(-5, vec!["C", "A", "B"], 0)]
fn given_group_when_reordering_then_clamped_and_renumbered(
    service: MenuService,
    #[case] target: i64,
    #[case] expected: Vec<&str>,
    #[case] position: u32,
) {
    service.create("A", None).unwrap();
    service.create("B", None).unwrap();
    let c = service.create("C", None).unwrap();

    let outcome = service.reorder(&c.id, target).unwrap();

    assert_eq!(outcome.order, position);
    assert_eq!(names_of(&service, None), expected);
    let orders: Vec<u32> = orders_of(&service, None).into_iter().map(|(_, o)| o).collect();
    assert!(is_contiguous(orders));
}

#[rstest]
fn given_node_at_target_when_reordering_again_then_nothing_changes(service: MenuService) {
    let a = service.create("A", None).unwrap();
    service.create("B", None).unwrap();
    service.reorder(&a.id, 1).unwrap();
    let before = orders_of(&service, None);

    service.reorder(&a.id, 1).unwrap();

    assert_eq!(orders_of(&service, None), before);
}

#[rstest]
fn given_child_when_reordering_then_parent_unchanged(service: MenuService) {
    let parent = service.create("Parent", None).unwrap();
    let a = service.create("A", Some(parent.id)).unwrap();
    service.create("B", Some(parent.id)).unwrap();

    service.reorder(&a.id, 1).unwrap();

    assert_eq!(service.get(&a.id).unwrap().node.parent_id, Some(parent.id));
    assert_eq!(names_of(&service, Some(&parent.id)), vec!["B", "A"]);
}

// ============================================================
// gapped input
// ============================================================

#[test]
fn given_gapped_orders_when_creating_then_group_normalized_first() {
    let a = Node::new("A", None, 3);
    let b = Node::new("B", None, 7);
    let store = Arc::new(MemoryNodeStore::with_nodes([a, b]));
    let service = MenuService::new(store);

    let c = service.create("C", None).unwrap();

    assert_eq!(c.order, 2);
    assert_eq!(
        orders_of(&service, None),
        vec![("A".to_string(), 0), ("B".to_string(), 1), ("C".to_string(), 2)]
    );
}

// ============================================================
// reads
// ============================================================

#[rstest]
fn given_nested_node_when_asking_path_then_root_first(service: MenuService) {
    let system = service.create("System Management", None).unwrap();
    let users = service.create("Users", Some(system.id)).unwrap();

    let path = service.path(&users.id).unwrap();

    assert_eq!(path.iter().map(|n| n.id).collect::<Vec<_>>(), vec![system.id, users.id]);
    assert_eq!(kind(service.path(&NodeId::new()).unwrap_err()), ErrorKind::NotFound);
}

#[rstest]
fn given_menu_when_searching_then_matches_keep_their_ancestors(service: MenuService) {
    service.create("Dashboard", None).unwrap();
    let system = service.create("System Management", None).unwrap();
    service.create("Users", Some(system.id)).unwrap();
    service.create("Roles & Permissions", Some(system.id)).unwrap();

    let found = service.search("user").unwrap();

    assert_eq!(found.roots().len(), 1);
    assert_eq!(found.roots()[0].name, "System Management");
    let children: Vec<_> = found.roots()[0].children.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(children, vec!["Users"]);
}

#[rstest]
fn given_menu_when_assembling_forest_then_preorder_matches_structure(service: MenuService) {
    let a = service.create("A", None).unwrap();
    let b = service.create("B", None).unwrap();
    let a0 = service.create("A0", Some(a.id)).unwrap();
    let a1 = service.create("A1", Some(a.id)).unwrap();

    let forest = service.forest().unwrap();

    assert_eq!(forest.ids(), vec![a.id, a0.id, a1.id, b.id]);
    assert_eq!(forest.depth(), 2);
}

#[rstest]
fn given_deeply_nested_menu_when_reading_and_moving_then_handles_every_level() {
    testing::init_test_setup();
    let depth = 20_000;
    let mut nodes: Vec<Node> = Vec::with_capacity(depth);
    for level in 0..depth {
        let parent = nodes.last().map(|node| node.id);
        nodes.push(Node::new(format!("Level {}", level), parent, 0));
    }
    let (top, bottom) = (nodes[0].id, nodes[depth - 1].id);
    let service = MenuService::new(Arc::new(MemoryNodeStore::with_nodes(nodes)));

    assert_eq!(service.forest().unwrap().depth(), depth);
    assert_eq!(service.path(&bottom).unwrap().len(), depth);
    assert_eq!(service.search(&format!("level {}", depth - 1)).unwrap().len(), depth);
    assert_eq!(
        kind(service.move_node(&top, Some(bottom)).unwrap_err()),
        ErrorKind::InvalidOperation
    );

    let moved = service.move_node(&bottom, None).unwrap();
    assert_eq!(moved.order, 1);
    assert_eq!(service.forest().unwrap().depth(), depth - 1);
}
