//! The story string: the character/persona block anchoring the prompt.

use talespin_core::{Character, PersonaPosition, UserPersona};

use crate::macros::MacroSubstitutor;

/// Join the non-blank character fields (and the persona, when it lives in the
/// prompt) with blank lines. Every field is macro-substituted first.
pub fn build(character: &Character, persona: &UserPersona, macros: &MacroSubstitutor) -> String {
    let mut sections: Vec<String> = Vec::with_capacity(4);

    let description = macros.substitute(&character.description);
    if !description.trim().is_empty() {
        sections.push(description);
    }

    let personality = macros.substitute(&character.personality);
    if !personality.trim().is_empty() {
        sections.push(format!("{}'s personality: {}", macros.char_name(), personality));
    }

    let scenario = macros.substitute(&character.scenario);
    if !scenario.trim().is_empty() {
        sections.push(format!("Scenario: {scenario}"));
    }

    if persona.position == PersonaPosition::InPrompt {
        let description = macros.substitute(&persona.description);
        if !description.trim().is_empty() {
            let name = macros.substitute(&persona.name);
            sections.push(format!("[{name}'s persona: {description}]"));
        }
    }

    sections.join("\n\n")
}
