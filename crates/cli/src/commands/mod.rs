//! Subcommand implementations and the snapshot loading they share.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use talespin_config::AppConfig;
use talespin_core::{ChatMessage, Character};

pub mod config_cmd;
pub mod prompt;
pub mod scan;

/// Where the character card, history and pending message come from.
#[derive(Args)]
pub struct SnapshotArgs {
    /// Character card (JSON)
    #[arg(long)]
    pub character: PathBuf,

    /// Chat history (JSON array of messages)
    #[arg(long)]
    pub history: Option<PathBuf>,

    /// The pending user message
    #[arg(short, long, default_value = "")]
    pub message: String,
}

/// Load the config from `path`, or from the default location.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    config.context("Failed to load config")
}

pub fn config_path(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}

/// Read and validate the character card and history named by `args`.
pub fn load_snapshot(args: &SnapshotArgs) -> anyhow::Result<(Character, Vec<ChatMessage>)> {
    let raw = std::fs::read_to_string(&args.character)
        .with_context(|| format!("Failed to read character {}", args.character.display()))?;
    let character = Character::from_json(&raw)
        .with_context(|| format!("Invalid character {}", args.character.display()))?;

    let history = match &args.history {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read history {}", path.display()))?;
            ChatMessage::history_from_json(&raw)
                .with_context(|| format!("Invalid history {}", path.display()))?
        }
        None => Vec::new(),
    };

    tracing::debug!(
        character = %character.name,
        messages = history.len(),
        "Snapshot loaded"
    );
    Ok((character, history))
}
