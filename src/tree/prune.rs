//! Stale node pruning
//!
//! After a run finishes, every node that the run did not create or touch is
//! stale. A full run drops all of them. A fragment run only cleans up inside
//! the blocks owned by the fragments that ran, and leaves everything else
//! exactly as it was.

use crate::tree::node::{AppNode, ContainerNode};
use crate::tree::root::AppRoot;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// One prune pass over a tree.
pub struct StaleNodePruner<'a> {
    current_generation: &'a str,
    active_fragments: &'a HashSet<String>,
    dropped: usize,
}

impl<'a> StaleNodePruner<'a> {
    pub fn new(current_generation: &'a str, active_fragments: &'a HashSet<String>) -> Self {
        Self {
            current_generation,
            active_fragments,
            dropped: 0,
        }
    }

    /// Number of nodes removed so far by this pass.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    fn is_fragment_run(&self) -> bool {
        !self.active_fragments.is_empty()
    }

    fn is_active(&self, fragment_id: Option<&str>) -> bool {
        fragment_id.is_some_and(|id| self.active_fragments.contains(id))
    }

    /// Prune `node`, returning `None` when it is removed.
    ///
    /// `owning_fragment` is the active fragment whose block encloses `node`,
    /// if any.
    pub fn prune(&mut self, node: &AppNode, owning_fragment: Option<&str>) -> Option<AppNode> {
        match node {
            AppNode::Container(c) => self
                .prune_container(c, owning_fragment)
                .map(AppNode::Container),
            AppNode::Leaf(l) => {
                if self.keep_leaf(l.fragment_id.as_deref(), &l.generation_id, owning_fragment) {
                    Some(node.clone())
                } else {
                    self.dropped += 1;
                    None
                }
            }
        }
    }

    fn keep_leaf(
        &self,
        fragment_id: Option<&str>,
        generation_id: &str,
        owning_fragment: Option<&str>,
    ) -> bool {
        if self.is_fragment_run() {
            match fragment_id {
                None => return true,
                Some(id) if !self.active_fragments.contains(id) => return true,
                // Written by a fragment into a block that belongs to another one.
                Some(id) if owning_fragment.is_some_and(|owner| owner != id) => return true,
                Some(_) => {}
            }
        }
        generation_id == self.current_generation
    }

    /// Prune a container and its subtree.
    ///
    /// An unchanged subtree comes back as the same allocation.
    pub fn prune_container(
        &mut self,
        container: &Arc<ContainerNode>,
        owning_fragment: Option<&str>,
    ) -> Option<Arc<ContainerNode>> {
        let stale = container.generation_id != self.current_generation;
        let mut owning_fragment = owning_fragment;

        if !self.is_fragment_run() {
            if stale {
                self.dropped += 1;
                return None;
            }
        } else {
            let fragment_id = container.fragment_id.as_deref();
            // Inside a block the fragment rewrote, a nested block it did not
            // touch is no longer emitted.
            if stale && owning_fragment.is_some() {
                self.dropped += 1;
                return None;
            }
            if self.is_active(fragment_id) {
                owning_fragment = fragment_id;
            }
        }

        let mut changed = false;
        let mut children = Vec::with_capacity(container.children.len());
        for child in container.children.iter() {
            match self.prune(child, owning_fragment) {
                Some(kept) => {
                    changed |= !kept.ptr_eq(child);
                    children.push(kept);
                }
                None => changed = true,
            }
        }

        if !changed {
            return Some(container.clone());
        }
        Some(Arc::new(
            container.with_children(children, self.current_generation),
        ))
    }
}

impl AppRoot {
    /// Remove every node left stale by the run `current_generation`.
    ///
    /// An empty `fragment_ids` means a full run. Each section is pruned on its
    /// own; a section that disappears is replaced by an empty container.
    #[instrument(skip(self, fragment_ids), fields(fragments = fragment_ids.len()))]
    pub fn clear_stale_nodes(
        &self,
        current_generation: &str,
        fragment_ids: &HashSet<String>,
    ) -> AppRoot {
        let mut pruner = StaleNodePruner::new(current_generation, fragment_ids);

        let sections = self.sections.clone().map(|section| {
            pruner.prune_container(&section, None).unwrap_or_else(|| {
                Arc::new(ContainerNode::empty(
                    self.owner_hash.clone(),
                    current_generation,
                ))
            })
        });

        let logo = self.logo.clone().filter(|logo| {
            !fragment_ids.is_empty() || logo.generation_id == current_generation
        });
        if self.logo.is_some() && logo.is_none() {
            debug!("Dropped stale logo");
        }

        info!(
            generation = current_generation,
            dropped = pruner.dropped(),
            "Cleared stale nodes"
        );

        AppRoot {
            owner_hash: self.owner_hash.clone(),
            generation_id: current_generation.to_string(),
            layout: self.layout.clone(),
            sections,
            logo,
        }
    }
}
