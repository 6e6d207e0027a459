//! deltatree: Incremental Tree Synchronization
//!
//! Applies a server-pushed stream of path-addressed edits to an immutable
//! element tree, prunes nodes a completed run did not touch, and deduplicates
//! repeated payloads through a generation-aged cache.

pub mod cache;
pub mod cli;
pub mod config;
pub mod delta;
pub mod dispatch;
pub mod element;
pub mod error;
pub mod logging;
pub mod protocol;
pub mod session;
pub mod tree;
