//! Wire Protocol
//!
//! Typed server-to-client messages. The payload of a message lives in `body`;
//! per-delivery information (where a delta goes, which script sent it) lives in
//! `metadata`, so one cached body can be replayed at many paths.

use crate::delta::{DeltaKind, DeltaMsg};
use crate::error::CodecError;
use crate::tree::root::Logo;
use serde::{Deserialize, Serialize};

pub mod codec;

pub use codec::{BincodeCodec, MessageCodec};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardMsgMetadata {
    /// The sender allows this message to be deduplicated by hash.
    pub cacheable: bool,
    pub delta_path: Vec<usize>,
    /// Owner hash of the script that produced the message.
    pub active_script_hash: String,
}

/// Start of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSession {
    pub generation_id: String,
    pub owner_hash: String,
    pub max_cache_age: u64,
    /// Non-empty for a fragment rerun.
    pub fragment_ids_this_run: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delta {
    pub fragment_id: Option<String>,
    pub kind: DeltaKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptFinishedStatus {
    FinishedOk,
    FinishedFragmentRunOk,
    FinishedWithError,
    FinishedEarlyForRerun,
}

impl ScriptFinishedStatus {
    /// Whether the run completed and its stale nodes and cache entries may be
    /// cleaned up.
    pub fn is_success(self) -> bool {
        matches!(
            self,
            ScriptFinishedStatus::FinishedOk | ScriptFinishedStatus::FinishedFragmentRunOk
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MsgBody {
    NewSession(NewSession),
    Delta(Delta),
    Logo(Logo),
    ScriptFinished(ScriptFinishedStatus),
    /// Points at a previously sent cacheable message.
    RefHash(String),
}

/// Message type, used to route messages to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MsgKind {
    NewSession,
    Delta,
    Logo,
    ScriptFinished,
    RefHash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardMsg {
    #[serde(default)]
    pub hash: String,
    #[serde(default)]
    pub metadata: ForwardMsgMetadata,
    pub body: MsgBody,
}

impl ForwardMsg {
    pub fn new(body: MsgBody) -> Self {
        Self {
            hash: String::new(),
            metadata: ForwardMsgMetadata::default(),
            body,
        }
    }

    /// A reference to the cached message with `hash`.
    pub fn reference(hash: impl Into<String>, metadata: ForwardMsgMetadata) -> Self {
        Self {
            hash: String::new(),
            metadata,
            body: MsgBody::RefHash(hash.into()),
        }
    }

    /// A cacheable delta, hashed over its body.
    pub fn cacheable_delta(
        path: Vec<usize>,
        owner_hash: impl Into<String>,
        delta: Delta,
    ) -> Result<Self, CodecError> {
        let mut msg = Self {
            hash: String::new(),
            metadata: ForwardMsgMetadata {
                cacheable: true,
                delta_path: path,
                active_script_hash: owner_hash.into(),
            },
            body: MsgBody::Delta(delta),
        };
        msg.hash = compute_hash(&msg.body)?;
        Ok(msg)
    }

    pub fn kind(&self) -> MsgKind {
        match self.body {
            MsgBody::NewSession(_) => MsgKind::NewSession,
            MsgBody::Delta(_) => MsgKind::Delta,
            MsgBody::Logo(_) => MsgKind::Logo,
            MsgBody::ScriptFinished(_) => MsgKind::ScriptFinished,
            MsgBody::RefHash(_) => MsgKind::RefHash,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.body, MsgBody::RefHash(_))
    }

    /// Assemble the applicable delta for run `generation_id`, if this is one.
    pub fn to_delta(&self, generation_id: &str) -> Option<DeltaMsg> {
        match &self.body {
            MsgBody::Delta(delta) => Some(DeltaMsg {
                target_path: self.metadata.delta_path.clone(),
                generation_id: generation_id.to_string(),
                owner_hash: self.metadata.active_script_hash.clone(),
                fragment_id: delta.fragment_id.clone(),
                kind: delta.kind.clone(),
            }),
            _ => None,
        }
    }
}

/// Content hash of a message body (BLAKE3, hex).
pub fn compute_hash(body: &MsgBody) -> Result<String, CodecError> {
    let bytes = bincode::serialize(body).map_err(|e| CodecError::Encode(e.to_string()))?;
    Ok(hex::encode(blake3::hash(&bytes).as_bytes()))
}
