//! Character cards, the persona data that anchors every prompt.
//!
//! A [`Character`] is an immutable snapshot owned by the caller. All text
//! fields may contain `{{macro}}` placeholders; they are expanded by the
//! prompt engine, never here.

use serde::{Deserialize, Serialize};

use crate::message::Role;

/// A character's own depth prompt.
///
/// When its content is non-blank it replaces the chat-level Author's Note
/// wholesale (content and depth together).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DepthPrompt {
    /// Text to inject into the history
    #[serde(default)]
    pub content: String,

    /// Messages from the bottom of the history (0 = after the last message)
    #[serde(default = "default_depth_prompt_depth")]
    pub depth: u32,

    /// Role the prompt is attributed to
    #[serde(default)]
    pub role: Role,
}

fn default_depth_prompt_depth() -> u32 {
    4
}

impl Default for DepthPrompt {
    fn default() -> Self {
        Self {
            content: String::new(),
            depth: default_depth_prompt_depth(),
            role: Role::default(),
        }
    }
}

impl DepthPrompt {
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// A character card snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Character {
    /// Display name, substituted for `{{char}}`
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub personality: String,

    #[serde(default)]
    pub scenario: String,

    /// Greeting shown when a chat starts (lives in the history, not the prompt)
    #[serde(default)]
    pub first_message: String,

    /// Raw example-dialogue block (`<START>` separated)
    #[serde(default)]
    pub message_examples: String,

    /// Character-level system prompt, appended to the global preset
    #[serde(default)]
    pub system_prompt: String,

    /// Instructions emitted after the history, right before generation
    #[serde(default)]
    pub post_history_instructions: String,

    #[serde(default)]
    pub depth_prompt: DepthPrompt,

    /// Group-chat speaking weight (0.0–1.0). Carried, not interpreted.
    #[serde(default = "default_talkativeness")]
    pub talkativeness: f32,
}

fn default_talkativeness() -> f32 {
    0.5
}

impl Character {
    /// Create a character with only a name set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            talkativeness: default_talkativeness(),
            ..Self::default()
        }
    }

    /// Parse and validate a character snapshot from JSON.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let character: Self = serde_json::from_str(json)?;
        character.validate()?;
        Ok(character)
    }

    /// A character needs a name; everything else may be blank.
    pub fn validate(&self) -> crate::Result<()> {
        if self.name.trim().is_empty() {
            return Err(crate::Error::invalid("character", "name must not be blank"));
        }
        if !(0.0..=1.0).contains(&self.talkativeness) {
            return Err(crate::Error::invalid(
                "character",
                format!("talkativeness {} is outside 0.0–1.0", self.talkativeness),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_character_has_defaults() {
        let c = Character::named("Aria");
        assert_eq!(c.name, "Aria");
        assert!(c.depth_prompt.is_blank());
        assert_eq!(c.talkativeness, 0.5);
    }

    #[test]
    fn from_json_applies_field_defaults() {
        let c = Character::from_json(r#"{"name": "Aria", "description": "A bard."}"#).unwrap();
        assert_eq!(c.description, "A bard.");
        assert_eq!(c.depth_prompt.depth, 4);
        assert_eq!(c.depth_prompt.role, Role::System);
    }

    #[test]
    fn blank_name_rejected() {
        let err = Character::from_json(r#"{"name": "  "}"#).unwrap_err();
        assert!(err.to_string().contains("name must not be blank"));
    }

    #[test]
    fn talkativeness_out_of_range_rejected() {
        let c = Character {
            talkativeness: 3.0,
            ..Character::named("Aria")
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn whitespace_depth_prompt_is_blank() {
        let dp = DepthPrompt {
            content: " \n\t".into(),
            ..DepthPrompt::default()
        };
        assert!(dp.is_blank());
    }
}
