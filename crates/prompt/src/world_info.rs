//! World-info trigger scanning.
//!
//! Decides which lorebook entries are active for the next prompt. The scan
//! window is the pending user message, the last `settings.depth` messages of
//! the history, and the character's description and scenario (always
//! included). Case sensitivity and whole-word matching are per-entry flags,
//! so every entry is evaluated against the window on its own terms.

use regex::{Regex, RegexBuilder};
use talespin_core::{ChatMessage, WorldInfoEntry, WorldInfoSettings};
use tracing::{debug, warn};

/// Text an entry's keys are matched against.
pub struct ScanWindow {
    text: String,
    lowercase: String,
}

impl ScanWindow {
    /// Build the window: `new_message`, the last `settings.depth` messages
    /// (chronological), then description and scenario.
    pub fn new(
        settings: &WorldInfoSettings,
        history: &[ChatMessage],
        new_message: &str,
        description: &str,
        scenario: &str,
    ) -> Self {
        let take = (settings.depth as usize).min(history.len());
        let recent: Vec<&str> = history[history.len() - take..]
            .iter()
            .map(|m| m.content.as_str())
            .collect();

        let text = format!(
            "{} {} {} {}",
            new_message,
            recent.join(" "),
            description,
            scenario
        );
        let lowercase = text.to_lowercase();
        Self { text, lowercase }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether `entry` fires for this window.
    pub fn triggers(&self, entry: &WorldInfoEntry) -> bool {
        if entry.constant {
            return true;
        }

        let primary_hit = primary_matcher(entry).is_some_and(|re| re.is_match(&self.text));
        if !primary_hit {
            return false;
        }

        let mut secondary = non_blank(&entry.secondary_keys).peekable();
        if !entry.selective || secondary.peek().is_none() {
            return true;
        }
        secondary.any(|key| self.contains_secondary(entry, key))
    }

    fn contains_secondary(&self, entry: &WorldInfoEntry, key: &str) -> bool {
        if entry.case_sensitive {
            self.text.contains(key)
        } else {
            self.lowercase.contains(&key.to_lowercase())
        }
    }
}

/// Return the enabled entries triggered by the scan window, in input order.
pub fn scan<'a>(
    entries: &'a [WorldInfoEntry],
    settings: &WorldInfoSettings,
    history: &[ChatMessage],
    new_message: &str,
    description: &str,
    scenario: &str,
) -> Vec<&'a WorldInfoEntry> {
    let window = ScanWindow::new(settings, history, new_message, description, scenario);
    let triggered: Vec<&WorldInfoEntry> = entries
        .iter()
        .filter(|e| e.enabled)
        .filter(|e| window.triggers(e))
        .collect();

    debug!(
        scanned = entries.len(),
        triggered = triggered.len(),
        scan_depth = settings.depth,
        "World info scanned"
    );
    triggered
}

/// One pattern per entry: its non-blank primary keys as escaped
/// alternatives. Case folding and word boundaries are Unicode-aware.
fn primary_matcher(entry: &WorldInfoEntry) -> Option<Regex> {
    let alternatives: Vec<String> = non_blank(&entry.keys).map(regex::escape).collect();
    if alternatives.is_empty() {
        return None;
    }

    let body = alternatives.join("|");
    let pattern = if entry.match_whole_words {
        format!(r"\b(?:{body})\b")
    } else {
        format!("(?:{body})")
    };

    match RegexBuilder::new(&pattern)
        .case_insensitive(!entry.case_sensitive)
        .build()
    {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(uid = entry.uid, error = %e, "Skipping unmatchable world-info keys");
            None
        }
    }
}

fn non_blank(keys: &[String]) -> impl Iterator<Item = &str> {
    keys.iter().map(|k| k.trim()).filter(|k| !k.is_empty())
}
