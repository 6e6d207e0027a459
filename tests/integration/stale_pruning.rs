//! Integration tests for end-of-run stale node pruning

use super::test_utils::{apply_all, container_delta, leaf_delta};
use deltatree::element::Element;
use deltatree::tree::node::{AppNode, ContainerLayout, ContainerNode, LeafNode};
use deltatree::tree::root::{AppRoot, Logo};
use std::collections::HashSet;
use std::sync::Arc;

fn fragments(ids: &[&str]) -> HashSet<String> {
    ids.iter().map(|id| id.to_string()).collect()
}

fn full_run() -> HashSet<String> {
    HashSet::new()
}

#[test]
fn test_full_run_drops_untouched_nodes() {
    let tree = apply_all(
        AppRoot::empty("page"),
        &[
            leaf_delta(&[0, 0], "r1", None, "a"),
            leaf_delta(&[0, 1], "r1", None, "b"),
            leaf_delta(&[1, 0], "r1", None, "side"),
        ],
    );
    // The second run only rewrites the first element.
    let tree = apply_all(tree, &[leaf_delta(&[0, 0], "r2", None, "a2")]);

    let pruned = tree.clear_stale_nodes("r2", &full_run());
    assert_eq!(pruned.generation_id(), "r2");
    assert_eq!(pruned.main().children.len(), 1);
    assert!(pruned.sidebar().is_empty());
    assert_eq!(pruned.sidebar().generation_id, "r2");
}

#[test]
fn test_stale_container_dropped_with_its_fresh_children() {
    let fresh_leaf = AppNode::Leaf(Arc::new(LeafNode::new(
        Arc::new(Element::text("fresh")),
        "page",
        "r2",
        None,
    )));
    let stale_block = AppNode::Container(Arc::new(ContainerNode::new(
        "page",
        vec![fresh_leaf],
        ContainerLayout::default(),
        "r1",
        None,
    )));
    let tree = apply_all(AppRoot::empty("page"), &[leaf_delta(&[0, 0], "r2", None, "kept")])
        .set_at(&[0, 1], stale_block, "r2")
        .unwrap();

    // No recursion into a stale container: its fresh child goes with it.
    let pruned = tree.clear_stale_nodes("r2", &full_run());
    assert_eq!(pruned.main().children.len(), 1);
    assert!(pruned.get_at(&[0, 1]).is_none());
    assert!(pruned.get_at(&[0, 0]).unwrap().as_leaf().is_some());
}

#[test]
fn test_fragment_run_isolates_other_fragments() {
    // Fragment A owns block [0, 0]; fragment B owns block [0, 1].
    let tree = apply_all(
        AppRoot::empty("page"),
        &[
            container_delta(&[0, 0], "r1", Some("A")),
            leaf_delta(&[0, 0, 0], "r1", Some("A"), "a-stale"),
            leaf_delta(&[0, 0, 1], "r1", Some("A"), "a-kept"),
            container_delta(&[0, 1], "r1", Some("B")),
            leaf_delta(&[0, 1, 0], "r1", Some("B"), "b"),
            leaf_delta(&[0, 2], "r1", None, "outside"),
        ],
    );
    let block_b = tree.get_at(&[0, 1]).unwrap();
    let outside = tree.get_at(&[0, 2]).unwrap();

    // Fragment A reruns and only rewrites its second element.
    let tree = apply_all(
        tree,
        &[
            container_delta(&[0, 0], "r2", Some("A")),
            leaf_delta(&[0, 0, 1], "r2", Some("A"), "a-fresh"),
        ],
    );
    let pruned = tree.clear_stale_nodes("r2", &fragments(&["A"]));

    let block_a = pruned.get_at(&[0, 0]).unwrap();
    let block_a = block_a.as_container().unwrap();
    assert_eq!(block_a.children.len(), 1);
    assert_eq!(block_a.children[0].generation_id(), "r2");

    assert!(pruned.get_at(&[0, 1]).unwrap().ptr_eq(&block_b));
    assert!(pruned.get_at(&[0, 2]).unwrap().ptr_eq(&outside));
}

#[test]
fn test_fragment_leaf_in_foreign_block_survives() {
    // Fragment A wrote an element into B's block during an earlier run.
    let tree = apply_all(
        AppRoot::empty("page"),
        &[
            container_delta(&[0, 0], "r1", Some("B")),
            leaf_delta(&[0, 0, 0], "r1", Some("A"), "injected"),
            container_delta(&[0, 1], "r1", Some("A")),
            leaf_delta(&[0, 1, 0], "r1", Some("A"), "own-stale"),
        ],
    );
    let tree = apply_all(tree, &[container_delta(&[0, 1], "r2", Some("A"))]);

    let pruned = tree.clear_stale_nodes("r2", &fragments(&["A", "B"]));
    assert!(pruned.get_at(&[0, 0, 0]).is_some());
    assert!(pruned.get_at(&[0, 1, 0]).is_none());
}

#[test]
fn test_prune_twice_is_prune_once() {
    let tree = apply_all(
        AppRoot::empty("page"),
        &[
            container_delta(&[0, 0], "r1", None),
            leaf_delta(&[0, 0, 0], "r1", None, "a"),
            leaf_delta(&[0, 1], "r1", None, "b"),
        ],
    );
    let tree = apply_all(tree, &[leaf_delta(&[0, 0, 0], "r2", None, "a2")]);

    let once = tree.clear_stale_nodes("r2", &full_run());
    let twice = once.clear_stale_nodes("r2", &full_run());
    assert_eq!(once, twice);
    assert!(Arc::ptr_eq(once.main(), twice.main()));
}

#[test]
fn test_logo_survives_fragment_run_only() {
    let logo = Logo {
        image: "logo.png".to_string(),
        link: Some("https://example.com".to_string()),
        icon_image: None,
    };
    let tree = AppRoot::empty("page").with_logo(logo, "page", "r1");

    assert!(tree.clear_stale_nodes("r2", &fragments(&["A"])).logo().is_some());
    assert!(tree.clear_stale_nodes("r2", &full_run()).logo().is_none());
    assert!(tree.clear_stale_nodes("r1", &full_run()).logo().is_some());
}

#[test]
fn test_fragment_rerun_drops_untouched_inner_block() {
    let tree = apply_all(
        AppRoot::empty("page"),
        &[
            container_delta(&[0, 0], "r1", Some("A")),
            container_delta(&[0, 0, 0], "r1", None),
            leaf_delta(&[0, 0, 0, 0], "r1", Some("A"), "inner"),
        ],
    );
    // The rerun rewrites A's block but never reaches the inner block.
    let tree = apply_all(tree, &[container_delta(&[0, 0], "r2", Some("A"))]);

    let pruned = tree.clear_stale_nodes("r2", &fragments(&["A"]));
    assert!(pruned.get_at(&[0, 0, 0]).is_none());
    let block_a = pruned.get_at(&[0, 0]).unwrap();
    assert!(block_a.as_container().unwrap().is_empty());
    assert_eq!(block_a.generation_id(), "r2");
}
