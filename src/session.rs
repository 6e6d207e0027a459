//! App Session
//!
//! Owns the published "current tree" and turns the ordered message stream into
//! tree updates: run starts, deltas, logos and end-of-run pruning.

use crate::dispatch::MessageDispatcher;
use crate::element::Element;
use crate::protocol::{ForwardMsg, MsgBody, NewSession, ScriptFinishedStatus};
use crate::tree::node::{AppNode, LeafNode};
use crate::tree::root::{AppRoot, Logo, NO_GENERATION};
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

/// The run currently producing messages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunInfo {
    pub generation_id: String,
    pub owner_hash: String,
    /// Non-empty while a fragment rerun is in progress.
    pub fragment_ids: HashSet<String>,
}

impl RunInfo {
    pub fn is_fragment_run(&self) -> bool {
        !self.fragment_ids.is_empty()
    }
}

#[derive(Debug)]
struct SessionState {
    root: AppRoot,
    run: RunInfo,
    placeholders: usize,
}

#[derive(Debug)]
pub struct AppSession {
    state: RwLock<SessionState>,
}

impl Default for AppSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AppSession {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(SessionState {
                root: AppRoot::empty(""),
                run: RunInfo {
                    generation_id: NO_GENERATION.to_string(),
                    ..RunInfo::default()
                },
                placeholders: 0,
            }),
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Snapshot of the current tree. Unchanged subtrees stay shared.
    pub fn current_tree(&self) -> AppRoot {
        self.state.read().root.clone()
    }

    pub fn run(&self) -> RunInfo {
        self.state.read().run.clone()
    }

    /// Deltas that failed and were replaced by an error leaf.
    pub fn placeholder_count(&self) -> usize {
        self.state.read().placeholders
    }

    /// Receive every message the dispatcher emits.
    pub fn attach(self: &Arc<Self>, dispatcher: &mut MessageDispatcher) {
        let session = Arc::clone(self);
        dispatcher.on_any(move |msg| session.handle_message(msg));
    }

    pub fn handle_message(&self, msg: &ForwardMsg) {
        let mut state = self.state.write();
        match &msg.body {
            MsgBody::NewSession(new_session) => state.start_run(new_session),
            MsgBody::Delta(_) => state.apply(msg),
            MsgBody::Logo(logo) => state.install_logo(logo, &msg.metadata.active_script_hash),
            MsgBody::ScriptFinished(status) => state.finish_run(*status),
            MsgBody::RefHash(hash) => trace!(hash = %hash, "Ignoring unresolved reference"),
        }
    }
}

impl SessionState {
    fn start_run(&mut self, new_session: &NewSession) {
        if new_session.owner_hash != self.root.owner_hash() {
            info!(
                from = self.root.owner_hash(),
                to = %new_session.owner_hash,
                "Page changed, keeping only elements of the new page"
            );
            self.root = self.root.filter_by_owner(&new_session.owner_hash);
        }

        self.run = RunInfo {
            generation_id: new_session.generation_id.clone(),
            owner_hash: new_session.owner_hash.clone(),
            fragment_ids: new_session.fragment_ids_this_run.iter().cloned().collect(),
        };
        debug!(
            generation = %self.run.generation_id,
            fragment_run = self.run.is_fragment_run(),
            "Run started"
        );
    }

    fn apply(&mut self, msg: &ForwardMsg) {
        let Some(delta) = msg.to_delta(&self.run.generation_id) else {
            return;
        };

        let err = match self.root.apply_delta(&delta) {
            Ok(root) => {
                self.root = root;
                return;
            }
            Err(err) => err,
        };

        warn!(path = ?delta.target_path, "Delta failed, showing error in its place: {}", err);
        let placeholder = AppNode::Leaf(Arc::new(LeafNode::new(
            Arc::new(Element::exception(err.to_string())),
            delta.owner_hash.clone(),
            delta.generation_id.as_str(),
            delta.fragment_id.clone(),
        )));
        match self
            .root
            .set_at(&delta.target_path, placeholder, &delta.generation_id)
        {
            Ok(root) => {
                self.root = root;
                self.placeholders += 1;
            }
            Err(e) => warn!(path = ?delta.target_path, "Could not place error element: {}", e),
        }
    }

    fn install_logo(&mut self, logo: &Logo, sender: &str) {
        let owner_hash = if sender.is_empty() {
            self.run.owner_hash.as_str()
        } else {
            sender
        };
        self.root = self
            .root
            .with_logo(logo.clone(), owner_hash, &self.run.generation_id);
    }

    fn finish_run(&mut self, status: ScriptFinishedStatus) {
        if !status.is_success() {
            debug!(?status, "Run did not complete, keeping stale nodes");
            return;
        }
        self.root = self
            .root
            .clear_stale_nodes(&self.run.generation_id, &self.run.fragment_ids);
    }
}
