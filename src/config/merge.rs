//! Precedence and default values for layered configuration.

pub mod merge_policy;
