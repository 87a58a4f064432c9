//! The per-chat settings snapshot handed to the prompt engine.

use serde::{Deserialize, Serialize};

use crate::instruct::InstructTemplate;
use crate::persona::{AuthorsNote, UserPersona};
use crate::world_info::{WorldInfoEntry, WorldInfoSettings};

/// Everything about a chat except the character and the history.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatContext {
    pub persona: UserPersona,
    pub authors_note: AuthorsNote,
    pub world_info: Vec<WorldInfoEntry>,
    pub world_info_settings: WorldInfoSettings,
    /// `None` (or an inactive template) selects plain formatting
    pub instruct: Option<InstructTemplate>,
    /// Global system-prompt preset
    pub system_prompt: Option<String>,
    /// Advisory only; prompts are never truncated to fit it
    pub token_budget: Option<u32>,
}

impl ChatContext {
    /// The instruct template, if one is present and usable.
    pub fn active_instruct(&self) -> Option<&InstructTemplate> {
        self.instruct.as_ref().filter(|t| t.is_active())
    }
}
