//! Prompt assembly orchestrator.
//!
//! Composes the story string, example dialogue, world info and the planned
//! history into the single text prompt sent to a completion backend.
//!
//! # Formatting modes
//!
//! **Instruct** (an instruct template with a non-blank input sequence):
//!
//! 1. System block: system prompt + story string
//! 2. Example dialogue, each turn wrapped in input/output sequences
//! 3. World info placed *before* the character, as a system block
//! 4. Planned history; injections as system blocks, the last reply uses the
//!    last-output sequence
//! 5. World info placed *after* the character, as a system block
//! 6. The new user message
//! 7. Post-history instructions, as a system block
//! 8. The assistant opener (no trailing content)
//!
//! **Simple** (no usable template): the same order rendered as plain
//! `Name: text` lines, injections as `[text]`, ending with `Char:`.
//!
//! # Determinism
//!
//! Assembly is a pure function of its inputs. The clock is read once, when
//! the assembler is built. Nothing is cached between builds.

use talespin_core::{
    Character, ChatContext, ChatMessage, Clock, InstructTemplate, WorldInfoEntry,
    WorldInfoPosition,
};
use tracing::debug;

use crate::examples;
use crate::injection::{self, HistoryItem};
use crate::macros::{MacroSubstitutor, MacroValues};
use crate::story;
use crate::world_info;

// ── Assembler ─────────────────────────────────────────────────────────────

/// Builds prompts for one character + chat snapshot.
///
/// Construct one per request; it holds only values derived from the snapshot.
pub struct PromptAssembler<'a> {
    character: &'a Character,
    context: &'a ChatContext,
    macros: MacroSubstitutor,
    system_prompt: String,
    story_string: String,
}

/// Per-build pieces shared by both formatting modes.
struct PromptParts<'h> {
    history: Vec<HistoryItem<'h>>,
    world_info_before: String,
    world_info_after: String,
}

impl<'a> PromptAssembler<'a> {
    /// Create an assembler. `user_name` is the display name used for
    /// `{{user}}` and for user turns in simple formatting.
    pub fn new(
        character: &'a Character,
        context: &'a ChatContext,
        user_name: &str,
        clock: &dyn Clock,
    ) -> Self {
        let macros = MacroSubstitutor::new(
            MacroValues {
                char_name: character.name.clone(),
                user_name: user_name.to_string(),
                description: character.description.clone(),
                personality: character.personality.clone(),
                scenario: character.scenario.clone(),
                persona: context.persona.description.clone(),
                mes_example: character.message_examples.clone(),
            },
            clock,
        );

        let system_prompt = combine_system_prompt(
            context.system_prompt.as_deref().unwrap_or_default(),
            &character.system_prompt,
            &macros,
        );
        let story_string = story::build(character, &context.persona, &macros);

        Self {
            character,
            context,
            macros,
            system_prompt,
            story_string,
        }
    }

    /// The global and character system prompts, combined and substituted.
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn story_string(&self) -> &str {
        &self.story_string
    }

    /// World-info entries triggered for this history and pending message.
    pub fn triggered_world_info(
        &self,
        history: &[ChatMessage],
        new_message: &str,
    ) -> Vec<&'a WorldInfoEntry> {
        world_info::scan(
            &self.context.world_info,
            &self.context.world_info_settings,
            history,
            new_message,
            &self.character.description,
            &self.character.scenario,
        )
    }

    /// Assemble the full prompt. Never fails; blank inputs shorten the output.
    pub fn build_prompt(&self, history: &[ChatMessage], new_message: &str) -> String {
        let triggered = self.triggered_world_info(history, new_message);
        let parts = PromptParts {
            history: injection::plan(
                history,
                &triggered,
                &self.context.authors_note,
                &self.context.persona,
                &self.character.depth_prompt,
            ),
            world_info_before: self.positioned_world_info(&triggered, WorldInfoPosition::BeforeCharacter),
            world_info_after: self.positioned_world_info(&triggered, WorldInfoPosition::AfterCharacter),
        };

        let prompt = match self.context.active_instruct() {
            Some(template) => {
                debug!(template = %template.name, "Using instruct formatting");
                self.format_instruct(template, &parts, new_message)
            }
            None => {
                debug!("Using simple formatting");
                self.format_simple(&parts, new_message)
            }
        };

        debug!(
            history_items = parts.history.len(),
            prompt_chars = prompt.len(),
            token_budget = ?self.context.token_budget,
            "Prompt assembled"
        );
        prompt
    }

    // ── Instruct formatting ───────────────────────────────────────────────

    fn format_instruct(
        &self,
        t: &InstructTemplate,
        parts: &PromptParts<'_>,
        new_message: &str,
    ) -> String {
        let mut out = String::with_capacity(4096);

        // 1. System block
        let system = join_non_blank(&[self.system_prompt.as_str(), self.story_string.as_str()], "\n");
        if !system.is_empty() {
            out.push_str(&system_block(t, &system));
        }

        // 2. Example dialogue
        let mut first_reply = true;
        for turn in self.example_turns() {
            if turn.is_user {
                out.push_str(&wrap(t, &t.input_sequence, &turn.content, t.input_suffix_or_stop()));
            } else {
                let sequence = if first_reply {
                    t.first_output_or_default()
                } else {
                    t.output_sequence.as_str()
                };
                first_reply = false;
                out.push_str(&wrap(t, sequence, &turn.content, t.output_suffix_or_stop()));
            }
        }

        // 3. World info before the character
        if !parts.world_info_before.is_empty() {
            out.push_str(&system_block(t, &parts.world_info_before));
        }

        // 4. History with injections
        let last_reply = parts
            .history
            .iter()
            .rposition(|item| matches!(item, HistoryItem::Message(m) if !m.is_user));
        for (idx, item) in parts.history.iter().enumerate() {
            match item {
                HistoryItem::Message(m) if m.is_user => {
                    out.push_str(&wrap(t, &t.input_sequence, &m.content, t.input_suffix_or_stop()));
                }
                HistoryItem::Message(m) => {
                    let sequence = if Some(idx) == last_reply {
                        t.last_output_or_default()
                    } else {
                        t.output_sequence.as_str()
                    };
                    out.push_str(&wrap(t, sequence, &m.content, t.output_suffix_or_stop()));
                }
                HistoryItem::Injection(text) => {
                    out.push_str(&system_block(t, &self.macros.substitute(text)));
                }
            }
        }

        // 5. World info after the character
        if !parts.world_info_after.is_empty() {
            out.push_str(&system_block(t, &parts.world_info_after));
        }

        // 6. New user turn
        if !new_message.trim().is_empty() {
            out.push_str(&wrap(t, &t.input_sequence, new_message, t.input_suffix_or_stop()));
        }

        // 7. Post-history instructions
        let post_history = self.post_history_instructions();
        if !post_history.is_empty() {
            out.push_str(&system_block(t, &post_history));
        }

        // 8. Generation opener
        out.push_str(t.last_output_or_default());
        out
    }

    // ── Simple formatting ─────────────────────────────────────────────────

    fn format_simple(&self, parts: &PromptParts<'_>, new_message: &str) -> String {
        let mut out = String::with_capacity(4096);
        let user_name = self.macros.user_name();
        let char_name = self.macros.char_name();

        for block in [&self.system_prompt, &self.story_string] {
            if !block.trim().is_empty() {
                out.push_str(block);
                out.push_str("\n\n");
            }
        }

        let examples = self.macros.substitute(&self.character.message_examples);
        if !examples.trim().is_empty() {
            out.push_str(examples.trim_end());
            out.push_str("\n\n");
        }

        if !parts.world_info_before.is_empty() {
            out.push_str(&parts.world_info_before);
            out.push('\n');
        }

        for item in &parts.history {
            match item {
                HistoryItem::Message(m) => {
                    let speaker = if m.is_user { user_name } else { char_name };
                    out.push_str(&format!("{speaker}: {}\n", m.content));
                }
                HistoryItem::Injection(text) => {
                    out.push_str(&format!("[{}]\n", self.macros.substitute(text)));
                }
            }
        }

        if !parts.world_info_after.is_empty() {
            out.push_str(&parts.world_info_after);
            out.push('\n');
        }

        if !new_message.trim().is_empty() {
            out.push_str(&format!("{user_name}: {new_message}\n"));
        }

        let post_history = self.post_history_instructions();
        if !post_history.is_empty() {
            out.push_str(&format!("[{post_history}]\n"));
        }

        out.push_str(char_name);
        out.push(':');
        out
    }

    // ── Helpers ────────────────────────────────────────────────────────────

    fn example_turns(&self) -> Vec<examples::ExampleTurn> {
        examples::parse(
            &self.character.message_examples,
            self.macros.user_name(),
            self.macros.char_name(),
        )
        .into_iter()
        .map(|turn| examples::ExampleTurn {
            content: self.macros.substitute(&turn.content),
            ..turn
        })
        .collect()
    }

    /// Position-placed (depth 0) entries for `position`, ascending `order`,
    /// substituted and newline-joined.
    fn positioned_world_info(
        &self,
        triggered: &[&WorldInfoEntry],
        position: WorldInfoPosition,
    ) -> String {
        let mut entries: Vec<&WorldInfoEntry> = triggered
            .iter()
            .copied()
            .filter(|e| !e.is_depth_injected() && e.position == position)
            .collect();
        entries.sort_by_key(|e| e.order);

        let contents: Vec<String> = entries
            .iter()
            .map(|e| self.macros.substitute(&e.content))
            .filter(|c| !c.trim().is_empty())
            .collect();
        contents.join("\n")
    }

    fn post_history_instructions(&self) -> String {
        let text = self
            .macros
            .substitute(&self.character.post_history_instructions);
        text.trim().to_string()
    }
}

/// Global preset and character prompt, newline-joined when both are present.
/// `{{original}}` in the character prompt expands to nothing.
fn combine_system_prompt(global: &str, character: &str, macros: &MacroSubstitutor) -> String {
    let global = macros.substitute(global);
    let character = macros.substitute(character);
    join_non_blank(&[global.as_str(), character.as_str()], "\n")
}

fn join_non_blank(parts: &[&str], separator: &str) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

/// `sequence` + `content` + `suffix`, newline-terminated. With `wrap` set the
/// three pieces sit on separate lines.
fn wrap(t: &InstructTemplate, sequence: &str, content: &str, suffix: &str) -> String {
    let sep = if t.wrap { "\n" } else { "" };
    let mut block = String::with_capacity(sequence.len() + content.len() + suffix.len() + 3);
    block.push_str(sequence);
    block.push_str(sep);
    block.push_str(content);
    if !suffix.is_empty() {
        block.push_str(sep);
        block.push_str(suffix);
    }
    block.push('\n');
    block
}

fn system_block(t: &InstructTemplate, content: &str) -> String {
    wrap(t, &t.system_sequence, content, t.system_suffix_or_stop())
}

// ── Tests ─────────────────────────────────────────────────────────────────
