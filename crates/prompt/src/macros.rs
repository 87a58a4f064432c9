//! `{{macro}}` substitution.
//!
//! Replaces a fixed set of placeholder tokens, case-insensitively, with live
//! values. Unknown tokens pass through unchanged.
//!
//! | Token | Value |
//! |-------|-------|
//! | `{{char}}`, `{{charname}}` | character name |
//! | `{{user}}`, `{{username}}` | user display name |
//! | `{{description}}`, `{{personality}}`, `{{scenario}}` | character fields |
//! | `{{persona}}` | user persona description |
//! | `{{mesexample}}`, `{{mes_example}}` | raw example dialogue |
//! | `{{time}}` | `HH:MM` |
//! | `{{date}}` | `YYYY-MM-DD` |
//! | `{{weekday}}` | full weekday name |
//! | `{{trim}}`, `{{original}}` | removed |
//!
//! Field values are expanded once at construction with their own name and
//! time macros resolved; field tokens nested inside a field are dropped. No
//! substituted value can therefore contain a token from this set, which makes
//! [`MacroSubstitutor::substitute`] idempotent.

use std::sync::LazyLock;

use chrono::NaiveDateTime;
use regex_lite::{Captures, Regex};
use talespin_core::Clock;

static MACRO_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\{\{(charname|char|username|user|description|personality|scenario|persona|mes_example|mesexample|time|date|weekday|trim|original)\}\}",
    )
    .expect("macro pattern is a valid regex")
});

/// Raw values a substitutor is built from.
#[derive(Debug, Clone, Default)]
pub struct MacroValues {
    pub char_name: String,
    pub user_name: String,
    pub description: String,
    pub personality: String,
    pub scenario: String,
    pub persona: String,
    pub mes_example: String,
}

/// Expands `{{macro}}` tokens. Immutable once built.
#[derive(Debug, Clone)]
pub struct MacroSubstitutor {
    values: MacroValues,
    now: NaiveDateTime,
}

impl MacroSubstitutor {
    /// Build a substitutor, reading the clock once.
    pub fn new(values: MacroValues, clock: &dyn Clock) -> Self {
        let now = clock.now();
        // Names and field values are resolved against a substitutor whose
        // field values are empty, so nested field tokens disappear.
        let leaf = Self {
            values: MacroValues {
                char_name: strip_macros(&values.char_name),
                user_name: strip_macros(&values.user_name),
                ..MacroValues::default()
            },
            now,
        };

        let resolved = MacroValues {
            description: leaf.substitute(&values.description),
            personality: leaf.substitute(&values.personality),
            scenario: leaf.substitute(&values.scenario),
            persona: leaf.substitute(&values.persona),
            mes_example: leaf.substitute(&values.mes_example),
            char_name: leaf.values.char_name.clone(),
            user_name: leaf.values.user_name.clone(),
        };

        Self {
            values: resolved,
            now,
        }
    }

    /// Replace every known token in `text`.
    pub fn substitute(&self, text: &str) -> String {
        if !text.contains("{{") {
            return text.to_string();
        }
        MACRO_PATTERN
            .replace_all(text, |caps: &Captures<'_>| self.resolve(&caps[1]))
            .into_owned()
    }

    pub fn char_name(&self) -> &str {
        &self.values.char_name
    }

    pub fn user_name(&self) -> &str {
        &self.values.user_name
    }

    fn resolve(&self, token: &str) -> String {
        match token.to_ascii_lowercase().as_str() {
            "char" | "charname" => self.values.char_name.clone(),
            "user" | "username" => self.values.user_name.clone(),
            "description" => self.values.description.clone(),
            "personality" => self.values.personality.clone(),
            "scenario" => self.values.scenario.clone(),
            "persona" => self.values.persona.clone(),
            "mesexample" | "mes_example" => self.values.mes_example.clone(),
            "time" => self.now.format("%H:%M").to_string(),
            "date" => self.now.format("%Y-%m-%d").to_string(),
            "weekday" => self.now.format("%A").to_string(),
            // trim, original
            _ => String::new(),
        }
    }
}

/// Remove every known token from `text`.
fn strip_macros(text: &str) -> String {
    MACRO_PATTERN.replace_all(text, "").into_owned()
}
