//! Property tests for path updates and stale pruning

use deltatree::delta::{DeltaKind, DeltaMsg};
use deltatree::element::Element;
use deltatree::tree::node::{AppNode, LeafNode};
use deltatree::tree::root::AppRoot;
use proptest::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;

const FRAGMENTS: [&str; 3] = ["A", "B", "C"];

fn leaf(path: Vec<usize>, generation: &str, fragment: Option<&str>) -> DeltaMsg {
    DeltaMsg {
        target_path: path,
        generation_id: generation.to_string(),
        owner_hash: "page".to_string(),
        fragment_id: fragment.map(str::to_string),
        kind: DeltaKind::NewLeaf(Element::text(format!("{}-{:?}", generation, fragment))),
    }
}

/// Build main-section leaves: an older run writes every slot, then the newer
/// run rewrites the slots flagged fresh. `slots[i]` is (fresh, fragment slot).
fn tree_from(slots: &[(bool, Option<usize>)]) -> AppRoot {
    let written = |root: AppRoot, generation: &str, only_fresh: bool| {
        slots.iter()
            .enumerate()
            .filter(|(_, (fresh, _))| !only_fresh || *fresh)
            .fold(root, |root, (index, (_, fragment))| {
                let fragment = fragment.map(|f| FRAGMENTS[f]);
                root.apply_delta(&leaf(vec![0, index], generation, fragment))
                    .unwrap()
            })
    };
    let old = written(AppRoot::empty("page"), "old", false);
    written(old, "new", true)
}

fn leaf_slots() -> impl Strategy<Value = Vec<(bool, Option<usize>)>> {
    prop::collection::vec((any::<bool>(), prop::option::of(0usize..3)), 0..12)
}

/// Setting a node at a path makes it retrievable there and leaves siblings shared.
#[test]
fn test_set_then_get_keeps_siblings() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(&(1usize..10, any::<prop::sample::Index>()), |(len, pick)| {
            let slots = vec![(false, None); len];
            let tree = tree_from(&slots);
            let target = pick.index(len + 1);

            let node = AppNode::Leaf(Arc::new(LeafNode::new(
                Arc::new(Element::text("placed")),
                "page",
                "new",
                None,
            )));
            let updated = tree.set_at(&[0, target], node.clone(), "new").unwrap();

            assert!(updated.get_at(&[0, target]).unwrap().ptr_eq(&node));
            for index in (0..len).filter(|i| *i != target) {
                let before = tree.get_at(&[0, index]).unwrap();
                let after = updated.get_at(&[0, index]).unwrap();
                assert!(before.ptr_eq(&after));
            }
            // Untouched sections are the same objects.
            assert!(Arc::ptr_eq(tree.sidebar(), updated.sidebar()));
            assert_eq!(updated.main().generation_id, "new");

            Ok(())
        })
        .unwrap();
}

/// Pruning a second time with the same run changes nothing.
#[test]
fn test_prune_idempotent() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(leaf_slots(), prop::collection::hash_set(0usize..3, 0..3)),
            |(slots, active)| {
                let active: HashSet<String> =
                    active.iter().map(|f| FRAGMENTS[*f].to_string()).collect();
                let tree = tree_from(&slots);

                let once = tree.clear_stale_nodes("new", &active);
                let twice = once.clear_stale_nodes("new", &active);
                assert_eq!(once, twice);

                Ok(())
            },
        )
        .unwrap();
}

/// A leaf survives exactly when it is current or outside the rerun fragments.
#[test]
fn test_prune_keeps_current_or_unrelated_leaves() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(leaf_slots(), prop::collection::hash_set(0usize..3, 0..3)),
            |(slots, active)| {
                let active_ids: HashSet<String> =
                    active.iter().map(|f| FRAGMENTS[*f].to_string()).collect();
                let tree = tree_from(&slots);
                let pruned = tree.clear_stale_nodes("new", &active_ids);

                let expected = slots
                    .iter()
                    .filter(|(fresh, fragment)| {
                        *fresh
                            || (!active.is_empty()
                                && !fragment.map_or(false, |f| active.contains(&f)))
                    })
                    .count();
                assert_eq!(pruned.main().children.len(), expected);

                Ok(())
            },
        )
        .unwrap();
}
