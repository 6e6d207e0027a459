//! Property-based tests for tree and cache invariants

mod tree_invariants;
