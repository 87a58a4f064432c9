//! World info (lorebook) entries and scan settings.

use serde::{Deserialize, Serialize};

/// Where a non-depth-injected entry is placed relative to the character block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorldInfoPosition {
    #[default]
    BeforeCharacter,
    AfterCharacter,
}

/// A single keyword-triggered lorebook entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldInfoEntry {
    pub uid: u64,

    /// Primary keys; any one matching triggers the entry
    #[serde(default)]
    pub keys: Vec<String>,

    /// Secondary keys; consulted only for selective entries
    #[serde(default)]
    pub secondary_keys: Vec<String>,

    pub content: String,

    /// Human-readable label
    #[serde(default)]
    pub comment: String,

    /// Always triggered, keys ignored
    #[serde(default)]
    pub constant: bool,

    /// Require a primary AND a secondary key match
    #[serde(default)]
    pub selective: bool,

    #[serde(default)]
    pub case_sensitive: bool,

    #[serde(default)]
    pub match_whole_words: bool,

    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Sort key, ascending
    #[serde(default)]
    pub order: i32,

    #[serde(default)]
    pub position: WorldInfoPosition,

    /// 0 = placed by `position`; >0 = injected at that history depth
    #[serde(default)]
    pub depth: u32,
}

fn default_enabled() -> bool {
    true
}

impl WorldInfoEntry {
    /// Create an enabled, non-selective entry with the given keys.
    pub fn new(uid: u64, keys: &[&str], content: impl Into<String>) -> Self {
        Self {
            uid,
            keys: keys.iter().map(|k| k.to_string()).collect(),
            secondary_keys: Vec::new(),
            content: content.into(),
            comment: String::new(),
            constant: false,
            selective: false,
            case_sensitive: false,
            match_whole_words: false,
            enabled: true,
            order: 0,
            position: WorldInfoPosition::default(),
            depth: 0,
        }
    }

    /// Whether the entry is injected into the history rather than placed by position.
    pub fn is_depth_injected(&self) -> bool {
        self.depth > 0
    }
}

/// Global world-info scan settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldInfoSettings {
    /// Number of most recent messages included in the scan window
    #[serde(default = "default_scan_depth")]
    pub depth: u32,
}

fn default_scan_depth() -> u32 {
    2
}

impl Default for WorldInfoSettings {
    fn default() -> Self {
        Self {
            depth: default_scan_depth(),
        }
    }
}
