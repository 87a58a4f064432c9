//! Chat message domain types.
//!
//! A chat history is an ordered list of [`ChatMessage`]s, oldest first. The
//! prompt engine only ever reads it; injected content is woven in by the
//! planner without touching the original list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The role attached to injected content (depth prompts, persona notes).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions
    #[default]
    System,
    /// The end user
    User,
    /// The character / assistant
    Assistant,
}

/// A single message in a chat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique message ID
    #[serde(default = "new_message_id")]
    pub id: String,

    /// The text content
    pub content: String,

    /// Whether the user (as opposed to the character) sent this message
    pub is_user: bool,

    /// Timestamp
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

fn new_message_id() -> String {
    Uuid::new_v4().to_string()
}

impl ChatMessage {
    /// Create a new message sent by the user.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            content: content.into(),
            is_user: true,
            timestamp: Utc::now(),
        }
    }

    /// Create a new message sent by the character.
    pub fn character(content: impl Into<String>) -> Self {
        Self {
            id: new_message_id(),
            content: content.into(),
            is_user: false,
            timestamp: Utc::now(),
        }
    }

    /// Parse a chat history snapshot (a JSON array, oldest message first).
    pub fn history_from_json(json: &str) -> crate::Result<Vec<Self>> {
        Ok(serde_json::from_str(json)?)
    }
}
