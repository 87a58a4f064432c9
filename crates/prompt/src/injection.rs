//! Depth injection: weaving extra content into the chat history.
//!
//! Author's-note text, the user persona and depth-targeted world info are
//! placed *between* history messages by message-count depth, counted from the
//! newest message:
//!
//! ```text
//!   [overflow: content deeper than the history]   <- top
//!   msg (depth 3)
//!   <injections for depth 2>
//!   msg (depth 2)
//!   <injections for depth 1>
//!   msg (depth 1)
//!   <injections for depth 0>                      <- bottom, next to the new turn
//! ```
//!
//! Within one depth the order is: world info, depth-prompt block, in-chat
//! persona. The original message list is never modified and messages never
//! change their relative order.

use std::collections::{BTreeMap, BTreeSet};

use talespin_core::{
    AuthorsNote, ChatMessage, DepthPrompt, PersonaPosition, UserPersona, WorldInfoEntry,
};
use tracing::debug;

/// One element of the planned history.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryItem<'a> {
    /// An original chat message.
    Message(&'a ChatMessage),
    /// Content placed between messages.
    Injection(String),
}

impl HistoryItem<'_> {
    pub fn is_injection(&self) -> bool {
        matches!(self, Self::Injection(_))
    }
}

/// Where the effective depth prompt came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthPromptSource {
    Character,
    AuthorsNote,
}

/// The depth prompt actually used for a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveDepthPrompt<'a> {
    pub content: &'a str,
    pub depth: u32,
    pub source: DepthPromptSource,
}

/// A non-blank character depth prompt replaces the Author's Note entirely,
/// content and depth together.
pub fn resolve_depth_prompt<'a>(
    character: &'a DepthPrompt,
    authors_note: &'a AuthorsNote,
) -> EffectiveDepthPrompt<'a> {
    if !character.is_blank() {
        EffectiveDepthPrompt {
            content: &character.content,
            depth: character.depth,
            source: DepthPromptSource::Character,
        }
    } else {
        EffectiveDepthPrompt {
            content: &authors_note.content,
            depth: authors_note.depth,
            source: DepthPromptSource::AuthorsNote,
        }
    }
}

/// Injections grouped by depth, ready to be interleaved.
struct Slots<'e> {
    world_info: BTreeMap<usize, Vec<&'e WorldInfoEntry>>,
    prompt_depth: usize,
    prompt_block: Vec<String>,
    in_chat_persona: Option<(usize, String)>,
}

impl<'e> Slots<'e> {
    fn new(
        triggered: &[&'e WorldInfoEntry],
        prompt: &EffectiveDepthPrompt<'_>,
        persona: &UserPersona,
    ) -> Self {
        let mut world_info: BTreeMap<usize, Vec<&'e WorldInfoEntry>> = BTreeMap::new();
        for entry in triggered.iter().filter(|e| e.is_depth_injected()) {
            world_info.entry(entry.depth as usize).or_default().push(*entry);
        }
        for group in world_info.values_mut() {
            group.sort_by_key(|e| e.order);
        }

        let in_chat_persona = (persona.position == PersonaPosition::InChat
            && persona.has_description())
        .then(|| (persona.depth as usize, persona.description.clone()));

        Self {
            world_info,
            prompt_depth: prompt.depth as usize,
            prompt_block: depth_prompt_block(prompt, persona),
            in_chat_persona,
        }
    }

    /// Injections for `depth`, in chronological order.
    fn at(&self, depth: usize) -> Vec<String> {
        let mut items = Vec::new();

        if let Some(group) = self.world_info.get(&depth) {
            let joined: Vec<&str> = group.iter().map(|e| e.content.as_str()).collect();
            items.push(joined.join("\n"));
        }

        if depth == self.prompt_depth {
            items.extend(self.prompt_block.iter().cloned());
        }

        if let Some((persona_depth, text)) = &self.in_chat_persona {
            if *persona_depth == depth {
                items.push(text.clone());
            }
        }

        items
    }

    /// Depths that cannot be placed inside a history of `len` messages.
    fn overflow_depths(&self, len: usize) -> BTreeSet<usize> {
        let mut depths: BTreeSet<usize> =
            self.world_info.keys().copied().filter(|d| *d > len).collect();
        if !self.prompt_block.is_empty() && self.prompt_depth > len {
            depths.insert(self.prompt_depth);
        }
        if let Some((depth, _)) = &self.in_chat_persona {
            if *depth > len {
                depths.insert(*depth);
            }
        }
        depths
    }
}

/// The depth-prompt text plus, for the Author's-Note persona positions, the
/// persona description before or after it. Blank parts are skipped.
fn depth_prompt_block(prompt: &EffectiveDepthPrompt<'_>, persona: &UserPersona) -> Vec<String> {
    let note = Some(prompt.content)
        .filter(|c| !c.trim().is_empty())
        .map(str::to_string);
    let persona_text = persona
        .has_description()
        .then(|| persona.description.clone());

    let ordered = match persona.position {
        PersonaPosition::TopOfAn => [persona_text, note],
        PersonaPosition::BottomOfAn => [note, persona_text],
        PersonaPosition::InPrompt | PersonaPosition::InChat => [note, None],
    };
    ordered.into_iter().flatten().collect()
}

/// Interleave injections into `history`, returning items oldest first.
pub fn plan<'a>(
    history: &'a [ChatMessage],
    triggered: &[&WorldInfoEntry],
    authors_note: &AuthorsNote,
    persona: &UserPersona,
    character_depth_prompt: &DepthPrompt,
) -> Vec<HistoryItem<'a>> {
    let prompt = resolve_depth_prompt(character_depth_prompt, authors_note);
    let slots = Slots::new(triggered, &prompt, persona);
    let len = history.len();

    // Built newest-first, reversed once at the end. Each slot is pushed
    // reversed so it reads chronologically after the final reverse.
    let mut reversed: Vec<HistoryItem<'a>> = Vec::with_capacity(len + 4);

    // Depth 0: after the newest message.
    push_reversed(&mut reversed, slots.at(0));

    for (offset, message) in history.iter().rev().enumerate() {
        reversed.push(HistoryItem::Message(message));
        push_reversed(&mut reversed, slots.at(offset + 1));
    }

    let overflow = slots.overflow_depths(len);
    for depth in &overflow {
        push_reversed(&mut reversed, slots.at(*depth));
    }

    reversed.reverse();

    debug!(
        messages = len,
        injections = reversed.iter().filter(|i| i.is_injection()).count(),
        prompt_source = ?prompt.source,
        prompt_depth = prompt.depth,
        overflow_depths = ?overflow,
        "Depth injections planned"
    );
    reversed
}

fn push_reversed<'a>(out: &mut Vec<HistoryItem<'a>>, items: Vec<String>) {
    out.extend(items.into_iter().rev().map(HistoryItem::Injection));
}
