//! CLI route: single route table and run context. Dispatches to domain services and presentation.

use crate::cli::parse::{Commands, OutputFormat};
use crate::cli::presentation::{format_config_json, format_replay_json, format_replay_table};
use crate::config::{ConfigLoader, DeltaTreeConfig};
use crate::dispatch::MessageDispatcher;
use crate::error::ApiError;
use crate::protocol::{compute_hash, BincodeCodec, ForwardMsg, MessageCodec};
use crate::session::AppSession;
use crate::tree::root::AppRoot;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

/// Outcome of replaying a recording.
#[derive(Debug, Clone)]
pub struct ReplayReport {
    pub messages: usize,
    /// Messages the dispatcher could not deliver.
    pub failures: Vec<String>,
    /// Deltas replaced by an error element.
    pub placeholders: usize,
    pub cached_payloads: usize,
    pub tree: AppRoot,
}

/// Runtime context for CLI execution: workspace and its loaded configuration.
pub struct RunContext {
    workspace_root: PathBuf,
    config: DeltaTreeConfig,
}

impl RunContext {
    /// Create run context from the workspace root. Uses ConfigLoader only.
    pub fn new(workspace_root: PathBuf) -> Result<Self, ApiError> {
        let config = ConfigLoader::load(&workspace_root)?;
        Ok(Self::with_config(workspace_root, config))
    }

    pub fn with_config(workspace_root: PathBuf, config: DeltaTreeConfig) -> Self {
        Self {
            workspace_root,
            config,
        }
    }

    pub fn config(&self) -> &DeltaTreeConfig {
        &self.config
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    /// Execute a command and return its printable output.
    pub async fn execute(&self, command: &Commands) -> Result<String, ApiError> {
        match command {
            Commands::Replay { file, format } => {
                let report = self.replay(&self.resolve(file)).await?;
                match format {
                    OutputFormat::Table => Ok(format_replay_table(&report)),
                    OutputFormat::Json => format_replay_json(&report),
                }
            }
            Commands::Config => format_config_json(&self.config),
        }
    }

    /// Feed every recorded message through a fresh dispatcher and session.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn replay(&self, path: &Path) -> Result<ReplayReport, ApiError> {
        let messages = read_recording(path)?;

        let mut dispatcher = MessageDispatcher::from_config(&self.config)?;
        let session = AppSession::shared();
        session.attach(&mut dispatcher);
        dispatcher.arm()?;

        let mut failures = Vec::new();
        for (line, msg) in messages.iter().enumerate() {
            let bytes = BincodeCodec.encode(msg)?;
            if let Err(e) = dispatcher.receive(bytes) {
                warn!(message = line + 1, "Message not delivered: {}", e);
                failures.push(format!("message {}: {}", line + 1, e));
            }
        }
        if let Err(e) = dispatcher.settle().await {
            warn!("Fetch failed during replay: {}", e);
            failures.push(e.to_string());
        }

        info!(
            messages = messages.len(),
            failures = failures.len(),
            "Replay finished"
        );
        Ok(ReplayReport {
            messages: messages.len(),
            failures,
            placeholders: session.placeholder_count(),
            cached_payloads: dispatcher.cache().len(),
            tree: session.current_tree(),
        })
    }

    fn resolve(&self, file: &Path) -> PathBuf {
        if file.is_absolute() || file.exists() {
            file.to_path_buf()
        } else {
            self.workspace_root.join(file)
        }
    }
}

/// Read a JSON-lines recording. Cacheable messages without a hash get one.
pub fn read_recording(path: &Path) -> Result<Vec<ForwardMsg>, ApiError> {
    let contents = std::fs::read_to_string(path)?;

    let mut messages = Vec::new();
    for (index, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut msg: ForwardMsg = serde_json::from_str(line)
            .map_err(|e| ApiError::InvalidInput(format!("line {}: {}", index + 1, e)))?;
        if msg.metadata.cacheable && msg.hash.is_empty() && !msg.is_reference() {
            msg.hash = compute_hash(&msg.body)?;
        }
        messages.push(msg);
    }
    Ok(messages)
}
