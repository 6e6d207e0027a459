//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; single route table dispatches to domain services.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, OutputFormat};
pub use presentation::{
    format_config_json, format_replay_json, format_replay_table, leaf_rows, LeafRow,
};
pub use route::{read_recording, ReplayReport, RunContext};
