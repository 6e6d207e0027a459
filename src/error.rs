//! Error types for the deltatree synchronization runtime.

use thiserror::Error;

/// Structural errors raised by path operations on the node tree.
///
/// These indicate a sender or caller bug (a path that cannot exist), never
/// ordinary absence: lookups report absence with `None`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("Empty path: set_at requires at least one index")]
    EmptyPath,

    #[error("Bad set_at index {index} (should be between [0, {len}])")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid path: {0:?}")]
    InvalidPath(Vec<usize>),

    #[error("Invalid root: {0}")]
    InvalidRoot(String),
}

/// Errors produced while decoding or appending leaf payload data.
///
/// Clone so a failed decode can be memoized alongside successful ones.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("Incompatible schema: {0}")]
    IncompatibleSchema(String),

    #[error("Add rows cannot be used with a named dataset")]
    NamedAppendNotSupported,

    #[error("Cannot append rows to a {0} element")]
    UnsupportedAppend(&'static str),

    #[error("Element does not carry tabular data")]
    NotTabular,

    #[error("Element is not a chart")]
    NotChart,

    #[error("Failed to decode table: {0}")]
    Decode(String),

    #[error("Failed to encode table: {0}")]
    Encode(String),
}

/// Errors from interpreting a delta against the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeltaError {
    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("Data error: {0}")]
    Data(#[from] DataError),
}

/// Wire codec errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Failed to decode message: {0}")]
    Decode(String),

    #[error("Failed to encode message: {0}")]
    Encode(String),
}

/// Payload cache errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CacheError {
    #[error("Cached message missing for hash {0} and no fetcher is configured")]
    Miss(String),

    #[error("Failed to fetch message {hash}: {reason}")]
    Fetch { hash: String, reason: String },
}

/// Errors surfaced by the message dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}

/// Errors from setting up the runtime (configuration, logging).
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
}

impl From<config::ConfigError> for ApiError {
    fn from(err: config::ConfigError) -> Self {
        ApiError::ConfigError(err.to_string())
    }
}
