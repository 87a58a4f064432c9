//! Talespin CLI — the main entry point.
//!
//! Commands:
//! - `prompt`  — Assemble the prompt for a character and chat snapshot
//! - `scan`    — List the world-info entries a message would trigger
//! - `config`  — Show, locate, validate or create the configuration file

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "talespin",
    about = "Talespin — roleplay prompt assembly",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of ~/.talespin/config.toml
    #[arg(short, long, global = true, env = "TALESPIN_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble the prompt and print it to stdout
    Prompt {
        #[command(flatten)]
        snapshot: commands::SnapshotArgs,

        /// Override the configured user name
        #[arg(short, long)]
        user_name: Option<String>,
    },

    /// List the world-info entries triggered by a message
    Scan {
        #[command(flatten)]
        snapshot: commands::SnapshotArgs,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Print the configuration file path
    Path,
    /// Load and validate the configuration file
    Validate,
    /// Write a starter configuration file
    Init {
        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so stdout carries only the prompt
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Prompt {
            snapshot,
            user_name,
        } => commands::prompt::run(config_path, &snapshot, user_name.as_deref())?,
        Commands::Scan { snapshot } => commands::scan::run(config_path, &snapshot)?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config_cmd::show(config_path)?,
            ConfigAction::Path => commands::config_cmd::path(config_path)?,
            ConfigAction::Validate => commands::config_cmd::validate(config_path)?,
            ConfigAction::Init { force } => commands::config_cmd::init(config_path, force)?,
        },
    }

    Ok(())
}
