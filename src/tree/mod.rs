//! UI Tree
//!
//! The client-side tree of containers and leaves that server deltas edit. Each
//! node is stamped with the run that last created or touched it, which is what
//! stale-node pruning keys on.

pub mod node;
pub mod prune;
pub mod root;

pub use node::{AppNode, ContainerLayout, ContainerNode, LeafNode};
pub use prune::StaleNodePruner;
pub use root::{AppRoot, Logo, LogoInfo, Section, NO_GENERATION};
