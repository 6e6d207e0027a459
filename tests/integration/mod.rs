//! Integration tests for the deltatree synchronization runtime

mod config_integration;
mod replay_cli;
mod session_flow;
mod stale_pruning;
