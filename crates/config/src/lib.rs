//! Configuration loading, validation, and management for Talespin.
//!
//! Loads presets from `~/.talespin/config.toml` with environment variable
//! overrides, and turns them into the [`ChatContext`] snapshot the prompt
//! engine consumes.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use talespin_core::instruct::PRESET_NAMES;
use talespin_core::{
    AuthorsNote, ChatContext, InstructTemplate, UserPersona, WorldInfoEntry, WorldInfoSettings,
};

/// The root configuration structure.
///
/// Maps directly to `~/.talespin/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Display name substituted for `{{user}}`
    #[serde(default = "default_user_name")]
    pub user_name: String,

    /// Global system-prompt preset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,

    /// Built-in instruct template name (chatml, alpaca, llama3, mistral)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruct_preset: Option<String>,

    /// Advisory token budget (never enforced)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_budget: Option<u32>,

    /// Inline instruct template; wins over `instruct_preset`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instruct: Option<InstructTemplate>,

    /// User persona
    #[serde(default)]
    pub persona: UserPersona,

    /// Chat-level Author's Note
    #[serde(default)]
    pub authors_note: AuthorsNote,

    /// Lorebook entries and scan settings
    #[serde(default)]
    pub world_info: WorldInfoConfig,
}

fn default_user_name() -> String {
    "User".into()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldInfoConfig {
    /// Number of recent messages scanned for keys
    #[serde(default = "default_scan_depth")]
    pub depth: u32,

    #[serde(default)]
    pub entries: Vec<WorldInfoEntry>,
}

fn default_scan_depth() -> u32 {
    WorldInfoSettings::default().depth
}

impl Default for WorldInfoConfig {
    fn default() -> Self {
        Self {
            depth: default_scan_depth(),
            entries: vec![],
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.talespin/config.toml).
    ///
    /// Environment overrides:
    /// - `TALESPIN_USER_NAME`
    /// - `TALESPIN_INSTRUCT` (preset name)
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_from(&config_path)
    }

    /// Load configuration from a specific file path, then apply env overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::read_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(name) = std::env::var("TALESPIN_USER_NAME") {
            if !name.trim().is_empty() {
                self.user_name = name;
            }
        }
        if let Ok(preset) = std::env::var("TALESPIN_INSTRUCT") {
            self.instruct_preset = Some(preset);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".talespin")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token_budget == Some(0) {
            return Err(ConfigError::ValidationError(
                "token_budget must be greater than 0 when set".into(),
            ));
        }

        if let Some(template) = &self.instruct {
            if template.name.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "inline [instruct] template needs a name".into(),
                ));
            }
        }

        let mut seen = HashSet::new();
        for entry in &self.world_info.entries {
            if !seen.insert(entry.uid) {
                return Err(ConfigError::ValidationError(format!(
                    "duplicate world_info entry uid {}",
                    entry.uid
                )));
            }
        }

        Ok(())
    }

    /// Non-fatal problems worth surfacing to the user.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.instruct.is_none() {
            if let Some(preset) = &self.instruct_preset {
                if InstructTemplate::preset(preset).is_none() {
                    warnings.push(format!(
                        "Unknown instruct_preset '{preset}' (expected one of: {}); simple formatting will be used",
                        PRESET_NAMES.join(", ")
                    ));
                }
            }
        }
        for entry in &self.world_info.entries {
            if entry.enabled && !entry.constant && entry.keys.iter().all(|k| k.trim().is_empty()) {
                warnings.push(format!(
                    "World info entry {} has no keys and is not constant; it can never trigger",
                    entry.uid
                ));
            }
        }
        warnings
    }

    /// The instruct template in effect, if any.
    pub fn resolve_instruct(&self) -> Option<InstructTemplate> {
        if let Some(template) = &self.instruct {
            return Some(template.clone());
        }
        let preset = self.instruct_preset.as_deref()?;
        let template = InstructTemplate::preset(preset);
        if template.is_none() {
            tracing::warn!(preset, "Unknown instruct preset, using simple formatting");
        }
        template
    }

    /// Build the chat settings snapshot for the prompt engine.
    pub fn to_chat_context(&self) -> ChatContext {
        ChatContext {
            persona: self.persona.clone(),
            authors_note: self.authors_note.clone(),
            world_info: self.world_info.entries.clone(),
            world_info_settings: WorldInfoSettings {
                depth: self.world_info.depth,
            },
            instruct: self.resolve_instruct(),
            system_prompt: self.system_prompt.clone(),
            token_budget: self.token_budget,
        }
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            user_name: default_user_name(),
            system_prompt: None,
            instruct_preset: None,
            token_budget: None,
            instruct: None,
            persona: UserPersona::default(),
            authors_note: AuthorsNote::default(),
            world_info: WorldInfoConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
