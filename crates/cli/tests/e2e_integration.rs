//! End-to-end integration tests for the Talespin prompt pipeline.
//!
//! These tests drive the public `PromptAssembler` API from snapshot to final
//! prompt string, covering both formatting modes, depth injection, overflow,
//! world-info triggering and configuration-built contexts.

use chrono::NaiveDate;
use talespin_config::AppConfig;
use talespin_core::{
    AuthorsNote, Character, ChatContext, ChatMessage, DepthPrompt, FixedClock, InstructTemplate,
    PersonaPosition, UserPersona, WorldInfoEntry, WorldInfoPosition, WorldInfoSettings,
};
use talespin_prompt::PromptAssembler;

// ── Fixtures ─────────────────────────────────────────────────────────────

fn clock() -> FixedClock {
    FixedClock(
        NaiveDate::from_ymd_opt(2024, 3, 15)
            .and_then(|d| d.and_hms_opt(18, 45, 0))
            .unwrap(),
    )
}

fn aria() -> Character {
    Character {
        description: "{{char}} is a travelling bard.".into(),
        personality: "warm".into(),
        ..Character::named("Aria")
    }
}

fn bracket_template() -> InstructTemplate {
    InstructTemplate {
        name: "brackets".into(),
        input_sequence: "<user>".into(),
        output_sequence: "<bot>".into(),
        stop_sequence: "</s>".into(),
        ..InstructTemplate::default()
    }
}

fn instruct_context() -> ChatContext {
    ChatContext {
        instruct: Some(bracket_template()),
        ..ChatContext::default()
    }
}

fn greeting_history() -> Vec<ChatMessage> {
    vec![ChatMessage::user("hi"), ChatMessage::character("hello")]
}

/// `n` messages alternating user/character, labelled `m1`..`mn`.
fn numbered_history(n: usize) -> Vec<ChatMessage> {
    (1..=n)
        .map(|i| {
            let content = format!("m{i}");
            if i % 2 == 1 {
                ChatMessage::user(content)
            } else {
                ChatMessage::character(content)
            }
        })
        .collect()
}

fn note(content: &str, depth: u32) -> AuthorsNote {
    AuthorsNote {
        content: content.into(),
        depth,
        ..AuthorsNote::default()
    }
}

fn build(
    character: &Character,
    context: &ChatContext,
    history: &[ChatMessage],
    message: &str,
) -> String {
    PromptAssembler::new(character, context, "User", &clock()).build_prompt(history, message)
}

fn pos(haystack: &str, needle: &str) -> usize {
    haystack
        .find(needle)
        .unwrap_or_else(|| panic!("{needle:?} not found in:\n{haystack}"))
}

// ── Formatting modes ─────────────────────────────────────────────────────

#[test]
fn e2e_instruct_prompt_is_exact() {
    let prompt = build(&aria(), &instruct_context(), &greeting_history(), "how are you");
    assert_eq!(
        prompt,
        "Aria is a travelling bard.\n\nAria's personality: warm</s>\n\
         <user>hi</s>\n\
         <bot>hello</s>\n\
         <user>how are you</s>\n\
         <bot>"
    );
}

#[test]
fn e2e_simple_prompt_is_exact() {
    let prompt = build(&aria(), &ChatContext::default(), &greeting_history(), "how are you");
    assert_eq!(
        prompt,
        "Aria is a travelling bard.\n\nAria's personality: warm\n\n\
         User: hi\n\
         Aria: hello\n\
         User: how are you\n\
         Aria:"
    );
    assert!(prompt.ends_with("Aria:"));
    for marker in ["<user>", "<bot>", "</s>"] {
        assert!(!prompt.contains(marker));
    }
}

#[test]
fn e2e_template_without_input_sequence_falls_back_to_simple() {
    let context = ChatContext {
        instruct: Some(InstructTemplate {
            input_sequence: "   ".into(),
            ..bracket_template()
        }),
        ..ChatContext::default()
    };
    let prompt = build(&aria(), &context, &greeting_history(), "how are you");
    assert!(prompt.ends_with("User: how are you\nAria:"));
    assert!(!prompt.contains("<bot>"));
}

#[test]
fn e2e_empty_inputs_still_produce_a_cue() {
    let character = Character::named("Aria");
    assert_eq!(build(&character, &ChatContext::default(), &[], ""), "Aria:");
    assert_eq!(build(&character, &instruct_context(), &[], ""), "<bot>");
}

#[test]
fn e2e_last_output_sequence_marks_final_reply_and_opener() {
    let context = ChatContext {
        instruct: Some(InstructTemplate {
            last_output_sequence: "<last>".into(),
            ..bracket_template()
        }),
        ..ChatContext::default()
    };
    let history = numbered_history(4);
    let prompt = build(&Character::named("Aria"), &context, &history, "next");
    assert!(prompt.contains("<bot>m2</s>\n"));
    assert!(prompt.contains("<last>m4</s>\n"));
    assert!(prompt.ends_with("<user>next</s>\n<last>"));
}

#[test]
fn e2e_examples_use_first_output_sequence_once() {
    let character = Character {
        message_examples: "<START>\n{{user}}: who are you?\n{{char}}: A bard.\n\
                           {{user}}: play something\n{{char}}: *strums*"
            .into(),
        ..Character::named("Aria")
    };
    let context = ChatContext {
        instruct: Some(InstructTemplate {
            first_output_sequence: "<first>".into(),
            ..bracket_template()
        }),
        ..ChatContext::default()
    };
    let prompt = build(&character, &context, &[], "");
    assert_eq!(
        prompt,
        "<user>who are you?</s>\n\
         <first>A bard.</s>\n\
         <user>play something</s>\n\
         <bot>*strums*</s>\n\
         <bot>"
    );
}

#[test]
fn e2e_system_prompts_combined_and_substituted() {
    let character = Character {
        system_prompt: "Stay in character as {{char}}. {{original}}".into(),
        ..aria()
    };
    let context = ChatContext {
        system_prompt: Some("You are a storyteller for {{user}}.".into()),
        ..instruct_context()
    };
    let prompt = build(&character, &context, &[], "hi");
    assert!(prompt.starts_with(
        "You are a storyteller for User.\nStay in character as Aria.\n\
         Aria is a travelling bard."
    ));
}

#[test]
fn e2e_post_history_instructions_precede_opener() {
    let character = Character {
        post_history_instructions: "Reply as {{char}} only.".into(),
        ..aria()
    };
    let simple = build(&character, &ChatContext::default(), &[], "hi");
    assert!(simple.ends_with("User: hi\n[Reply as Aria only.]\nAria:"));

    let instruct = build(&character, &instruct_context(), &[], "hi");
    assert!(instruct.ends_with("<user>hi</s>\nReply as Aria only.</s>\n<bot>"));
}

#[test]
fn e2e_macros_fill_time_and_user() {
    let character = Character {
        scenario: "{{user}} meets {{char}} on a {{weekday}} at {{time}}.".into(),
        ..Character::named("Aria")
    };
    let prompt = build(&character, &ChatContext::default(), &[], "");
    assert!(prompt.contains("Scenario: User meets Aria on a Friday at 18:45."));
}

// ── Depth injection ──────────────────────────────────────────────────────

#[test]
fn e2e_depth_two_lands_before_second_to_last_message() {
    let context = ChatContext {
        authors_note: note("Remember the storm.", 2),
        ..ChatContext::default()
    };
    let prompt = build(&Character::named("Aria"), &context, &numbered_history(5), "go on");

    let note_at = pos(&prompt, "[Remember the storm.]");
    assert!(pos(&prompt, "m3") < note_at);
    assert!(note_at < pos(&prompt, "m4"));
    assert!(prompt.contains("[Remember the storm.]\nAria: m4\n"));
}

#[test]
fn e2e_depth_two_in_instruct_mode() {
    let context = ChatContext {
        authors_note: note("Remember the storm.", 2),
        ..instruct_context()
    };
    let prompt = build(&Character::named("Aria"), &context, &numbered_history(5), "go on");
    assert!(prompt.contains("<user>m3</s>\nRemember the storm.</s>\n<bot>m4</s>\n"));
}

#[test]
fn e2e_overflowing_note_opens_history_section() {
    let context = ChatContext {
        authors_note: note("Long ago...", 10),
        ..ChatContext::default()
    };
    let prompt = build(&aria(), &context, &greeting_history(), "how are you");
    assert_eq!(
        prompt,
        "Aria is a travelling bard.\n\nAria's personality: warm\n\n\
         [Long ago...]\n\
         User: hi\n\
         Aria: hello\n\
         User: how are you\n\
         Aria:"
    );
}

#[test]
fn e2e_depth_zero_note_sits_after_history() {
    let context = ChatContext {
        authors_note: note("Now.", 0),
        ..instruct_context()
    };
    let prompt = build(&aria(), &context, &greeting_history(), "how are you");
    assert!(prompt.contains("<bot>hello</s>\nNow.</s>\n<user>how are you</s>\n"));
}

#[test]
fn e2e_character_depth_prompt_replaces_note() {
    let character = Character {
        depth_prompt: DepthPrompt {
            content: "{{char}} hides a secret.".into(),
            depth: 1,
            ..DepthPrompt::default()
        },
        ..Character::named("Aria")
    };
    let context = ChatContext {
        authors_note: note("Chat note.", 3),
        ..ChatContext::default()
    };
    let prompt = build(&character, &context, &numbered_history(4), "");
    assert!(!prompt.contains("Chat note."));
    assert!(prompt.contains("User: m3\n[Aria hides a secret.]\nAria: m4\n"));
}

#[test]
fn e2e_persona_positions() {
    let persona = |position| UserPersona {
        name: "Sam".into(),
        description: "Sam is a knight.".into(),
        position,
        depth: 1,
        ..UserPersona::default()
    };
    let character = Character::named("Aria");
    let history = numbered_history(3);

    let in_prompt = ChatContext {
        persona: persona(PersonaPosition::InPrompt),
        ..ChatContext::default()
    };
    let prompt = build(&character, &in_prompt, &history, "");
    assert!(prompt.starts_with("[Sam's persona: Sam is a knight.]\n\n"));

    let in_chat = ChatContext {
        persona: persona(PersonaPosition::InChat),
        ..ChatContext::default()
    };
    let prompt = build(&character, &in_chat, &history, "");
    assert!(prompt.contains("Aria: m2\n[Sam is a knight.]\nUser: m3\n"));

    let top = ChatContext {
        persona: persona(PersonaPosition::TopOfAn),
        authors_note: note("Note.", 2),
        ..ChatContext::default()
    };
    let prompt = build(&character, &top, &history, "");
    assert!(prompt.contains("User: m1\n[Sam is a knight.]\n[Note.]\nAria: m2\n"));

    let bottom = ChatContext {
        persona: persona(PersonaPosition::BottomOfAn),
        authors_note: note("Note.", 2),
        ..ChatContext::default()
    };
    let prompt = build(&character, &bottom, &history, "");
    assert!(prompt.contains("User: m1\n[Note.]\n[Sam is a knight.]\nAria: m2\n"));
}

// ── World info ───────────────────────────────────────────────────────────

fn lore(uid: u64, keys: &[&str], content: &str) -> WorldInfoEntry {
    WorldInfoEntry::new(uid, keys, content)
}

#[test]
fn e2e_selective_entry_needs_both_keys() {
    let context = ChatContext {
        world_info: vec![WorldInfoEntry {
            selective: true,
            secondary_keys: vec!["magic".into()],
            ..lore(1, &["sword"], "The sword is enchanted.")
        }],
        ..ChatContext::default()
    };
    let character = Character::named("Aria");

    let plain = build(&character, &context, &[], "I draw my sword");
    assert!(!plain.contains("enchanted"));

    let both = build(&character, &context, &[], "I draw my sword and feel its magic");
    assert!(both.contains("The sword is enchanted."));
}

#[test]
fn e2e_whole_word_entry() {
    let context = ChatContext {
        world_info: vec![WorldInfoEntry {
            match_whole_words: true,
            ..lore(1, &["cat"], "The cat is a spirit.")
        }],
        ..ChatContext::default()
    };
    let character = Character::named("Aria");
    assert!(!build(&character, &context, &[], "a category error").contains("spirit"));
    assert!(build(&character, &context, &[], "the cat sat").contains("spirit"));
}

#[test]
fn e2e_world_info_positions_and_order() {
    let context = ChatContext {
        world_info: vec![
            WorldInfoEntry {
                order: 2,
                ..lore(1, &["castle"], "Castle walls are tall.")
            },
            WorldInfoEntry {
                order: 1,
                ..lore(2, &["castle"], "{{char}} grew up in the castle.")
            },
            WorldInfoEntry {
                position: WorldInfoPosition::AfterCharacter,
                ..lore(3, &["castle"], "The castle is haunted.")
            },
        ],
        ..instruct_context()
    };
    let prompt = build(&aria(), &context, &greeting_history(), "the castle");
    assert!(prompt.contains(
        "Aria's personality: warm</s>\n\
         Aria grew up in the castle.\nCastle walls are tall.</s>\n\
         <user>hi</s>\n"
    ));
    assert!(prompt.contains("<bot>hello</s>\nThe castle is haunted.</s>\n<user>the castle</s>\n"));
}

#[test]
fn e2e_world_info_depth_injection_and_overflow() {
    let context = ChatContext {
        world_info: vec![
            WorldInfoEntry {
                depth: 1,
                ..lore(1, &["dragon"], "Dragons sleep by day.")
            },
            WorldInfoEntry {
                depth: 9,
                ..lore(2, &["dragon"], "Dragons once ruled.")
            },
        ],
        world_info_settings: WorldInfoSettings { depth: 4 },
        ..ChatContext::default()
    };
    let history = vec![ChatMessage::user("a dragon!"), ChatMessage::character("Where?")];
    let prompt = build(&Character::named("Aria"), &context, &history, "");
    assert_eq!(
        prompt,
        "[Dragons once ruled.]\n\
         User: a dragon!\n\
         [Dragons sleep by day.]\n\
         Aria: Where?\n\
         Aria:"
    );
}

#[test]
fn e2e_history_is_not_macro_expanded() {
    let history = vec![ChatMessage::user("I typed {{char}} literally")];
    let prompt = build(&Character::named("Aria"), &ChatContext::default(), &history, "");
    assert!(prompt.contains("User: I typed {{char}} literally\n"));
}

#[test]
fn e2e_messages_keep_order_with_many_injections() {
    let history = numbered_history(12);
    let context = ChatContext {
        authors_note: note("N", 3),
        persona: UserPersona {
            description: "P".into(),
            position: PersonaPosition::InChat,
            depth: 5,
            ..UserPersona::default()
        },
        world_info: vec![WorldInfoEntry {
            constant: true,
            depth: 7,
            ..lore(1, &[], "W")
        }],
        ..ChatContext::default()
    };
    let prompt = build(&Character::named("Aria"), &context, &history, "");
    let positions: Vec<usize> = (1..=12).map(|i| pos(&prompt, &format!("m{i}\n"))).collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]));
}

// ── Configuration ────────────────────────────────────────────────────────

#[test]
fn e2e_config_drives_assembly() {
    let config: AppConfig = toml::from_str(
        r#"
user_name = "Sam"
instruct_preset = "chatml"

[authors_note]
content = "Keep it short."
depth = 1

[[world_info.entries]]
uid = 1
keys = ["bard"]
content = "Bards are welcome here."
"#,
    )
    .unwrap();
    config.validate().unwrap();
    let context = config.to_chat_context();

    let prompt = PromptAssembler::new(&aria(), &context, &config.user_name, &clock())
        .build_prompt(&greeting_history(), "sing");

    assert!(prompt.starts_with("<|im_start|>system\n"));
    assert!(prompt.contains("Bards are welcome here."));
    assert!(prompt.contains("Keep it short."));
    assert!(prompt.ends_with("<|im_start|>assistant\n"));
}

#[test]
fn e2e_snapshots_from_json() {
    let character = Character::from_json(
        r#"{"name": "Aria", "description": "{{char}} is a travelling bard.", "personality": "warm"}"#,
    )
    .unwrap();
    let history =
        ChatMessage::history_from_json(r#"[{"content": "hi", "is_user": true}, {"content": "hello", "is_user": false}]"#)
            .unwrap();
    let prompt = build(&character, &ChatContext::default(), &history, "how are you");
    assert_eq!(prompt, build(&aria(), &ChatContext::default(), &greeting_history(), "how are you"));

    assert!(Character::from_json(r#"{"name": "  "}"#).is_err());
    assert!(ChatMessage::history_from_json("not json").is_err());
}
