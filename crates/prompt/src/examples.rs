//! Example-dialogue parsing.
//!
//! A character's example block is a line-oriented mini format:
//!
//! ```text
//! <START>
//! {{user}}: Hello!
//! {{char}}: Oh, hi there.
//! It's been a while.
//! <START>
//! Sam: Another example
//! ```
//!
//! `<START>` lines are skipped; all examples form one continuous turn list.
//! A line opening with `{{user}}:`, `<user name>:`, `{{char}}:` or
//! `<char name>:` (case-insensitive) starts a turn; any other line is appended
//! to the open turn, or dropped when no turn is open yet.
//!
//! The boundary check is purely textual, so a continuation line that happens
//! to start with a speaker prefix opens a new turn.

const START_MARKER: &str = "<start>";

/// One parsed example turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExampleTurn {
    pub is_user: bool,
    pub content: String,
}

/// Split a raw example block into ordered turns.
pub fn parse(raw: &str, user_name: &str, char_name: &str) -> Vec<ExampleTurn> {
    let user_prefixes = speaker_prefixes("{{user}}:", user_name);
    let char_prefixes = speaker_prefixes("{{char}}:", char_name);

    let mut turns: Vec<ExampleTurn> = Vec::new();
    let mut open: Option<ExampleTurn> = None;

    for line in raw.lines() {
        if line.trim().eq_ignore_ascii_case(START_MARKER) {
            continue;
        }

        let boundary = match_prefix(line, &user_prefixes)
            .map(|rest| (true, rest))
            .or_else(|| match_prefix(line, &char_prefixes).map(|rest| (false, rest)));

        if let Some((is_user, rest)) = boundary {
            if let Some(done) = open.take() {
                turns.push(finish(done));
            }
            open = Some(ExampleTurn {
                is_user,
                content: rest.trim_start().to_string(),
            });
        } else if let Some(turn) = open.as_mut() {
            turn.content.push('\n');
            turn.content.push_str(line);
        } else {
            tracing::trace!(line, "Dropping example line outside any turn");
        }
    }

    if let Some(done) = open {
        turns.push(finish(done));
    }
    turns
}

fn speaker_prefixes(macro_prefix: &str, name: &str) -> Vec<String> {
    let mut prefixes = vec![macro_prefix.to_string()];
    if !name.trim().is_empty() {
        prefixes.push(format!("{name}:"));
    }
    prefixes
}

fn match_prefix<'a>(line: &'a str, prefixes: &[String]) -> Option<&'a str> {
    prefixes
        .iter()
        .find_map(|prefix| strip_prefix_ignore_case(line, prefix))
}

/// Case-insensitive `str::strip_prefix` that stays on char boundaries.
fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let mut chars = text.char_indices();
    for p in prefix.chars() {
        let (_, c) = chars.next()?;
        if !c.to_lowercase().eq(p.to_lowercase()) {
            return None;
        }
    }
    let consumed = chars.next().map_or(text.len(), |(idx, _)| idx);
    Some(&text[consumed..])
}

fn finish(mut turn: ExampleTurn) -> ExampleTurn {
    turn.content.truncate(turn.content.trim_end().len());
    turn
}
