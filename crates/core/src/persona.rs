//! User persona and Author's Note settings.

use serde::{Deserialize, Serialize};

use crate::message::Role;

/// Where the user's persona description is placed in the prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonaPosition {
    /// Inside the story string, after the scenario
    #[default]
    InPrompt,
    /// Injected into the history at `UserPersona::depth`
    InChat,
    /// Emitted right before the Author's Note, at the note's depth
    TopOfAn,
    /// Emitted right after the Author's Note, at the note's depth
    BottomOfAn,
}

/// The user's persona for a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPersona {
    #[serde(default = "default_persona_name")]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub position: PersonaPosition,

    /// Only consulted when `position` is `InChat`
    #[serde(default = "default_persona_depth")]
    pub depth: u32,

    #[serde(default)]
    pub role: Role,
}

fn default_persona_name() -> String {
    "User".into()
}

fn default_persona_depth() -> u32 {
    2
}

impl Default for UserPersona {
    fn default() -> Self {
        Self {
            name: default_persona_name(),
            description: String::new(),
            position: PersonaPosition::default(),
            depth: default_persona_depth(),
            role: Role::default(),
        }
    }
}

impl UserPersona {
    pub fn has_description(&self) -> bool {
        !self.description.trim().is_empty()
    }
}

/// The chat-level Author's Note.
///
/// `interval`, `position` and `role` are preserved for round-tripping with the
/// settings store; placement is governed by `depth` alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorsNote {
    #[serde(default)]
    pub content: String,

    #[serde(default = "default_note_interval")]
    pub interval: u32,

    /// Messages from the bottom of the history (0 = after the last message)
    #[serde(default = "default_note_depth")]
    pub depth: u32,

    #[serde(default = "default_note_position")]
    pub position: u32,

    #[serde(default)]
    pub role: Role,
}

fn default_note_interval() -> u32 {
    1
}

fn default_note_depth() -> u32 {
    4
}

fn default_note_position() -> u32 {
    1
}

impl Default for AuthorsNote {
    fn default() -> Self {
        Self {
            content: String::new(),
            interval: default_note_interval(),
            depth: default_note_depth(),
            position: default_note_position(),
            role: Role::default(),
        }
    }
}
