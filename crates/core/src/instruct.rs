//! Instruct templates: literal fragments that wrap every turn for models
//! expecting chat-formatted markup.
//!
//! A template whose `input_sequence` is blank is treated as absent, which
//! puts the prompt engine into plain (non-instruct) formatting.

use serde::{Deserialize, Serialize};

/// A named bundle of formatting fragments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstructTemplate {
    pub name: String,
    pub system_sequence: String,
    pub system_suffix: String,
    pub input_sequence: String,
    pub input_suffix: String,
    pub output_sequence: String,
    pub output_suffix: String,
    /// Replaces `output_sequence` for the first example reply
    pub first_output_sequence: String,
    /// Replaces `output_sequence` for the last reply and the generation opener
    pub last_output_sequence: String,
    /// Fallback for any blank suffix
    pub stop_sequence: String,
    /// Put sequence, content and suffix on separate lines
    pub wrap: bool,
}

/// Names accepted by [`InstructTemplate::preset`].
pub const PRESET_NAMES: &[&str] = &["chatml", "alpaca", "llama3", "mistral"];

impl InstructTemplate {
    /// Whether the template can drive instruct formatting.
    pub fn is_active(&self) -> bool {
        !self.input_sequence.trim().is_empty()
    }

    pub fn system_suffix_or_stop(&self) -> &str {
        non_blank_or(&self.system_suffix, &self.stop_sequence)
    }

    pub fn input_suffix_or_stop(&self) -> &str {
        non_blank_or(&self.input_suffix, &self.stop_sequence)
    }

    pub fn output_suffix_or_stop(&self) -> &str {
        non_blank_or(&self.output_suffix, &self.stop_sequence)
    }

    pub fn first_output_or_default(&self) -> &str {
        non_blank_or(&self.first_output_sequence, &self.output_sequence)
    }

    pub fn last_output_or_default(&self) -> &str {
        non_blank_or(&self.last_output_sequence, &self.output_sequence)
    }

    /// Look up a built-in template by name (case-insensitive).
    pub fn preset(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "chatml" => Some(Self::chatml()),
            "alpaca" => Some(Self::alpaca()),
            "llama3" | "llama-3" => Some(Self::llama3()),
            "mistral" => Some(Self::mistral()),
            _ => None,
        }
    }

    pub fn chatml() -> Self {
        Self {
            name: "ChatML".into(),
            system_sequence: "<|im_start|>system\n".into(),
            system_suffix: "<|im_end|>".into(),
            input_sequence: "<|im_start|>user\n".into(),
            input_suffix: "<|im_end|>".into(),
            output_sequence: "<|im_start|>assistant\n".into(),
            output_suffix: "<|im_end|>".into(),
            stop_sequence: "<|im_end|>".into(),
            ..Self::default()
        }
    }

    pub fn alpaca() -> Self {
        Self {
            name: "Alpaca".into(),
            input_sequence: "### Instruction:\n".into(),
            input_suffix: "\n".into(),
            output_sequence: "### Response:\n".into(),
            output_suffix: "\n".into(),
            system_suffix: "\n".into(),
            ..Self::default()
        }
    }

    pub fn llama3() -> Self {
        Self {
            name: "Llama 3".into(),
            system_sequence: "<|start_header_id|>system<|end_header_id|>\n\n".into(),
            system_suffix: "<|eot_id|>".into(),
            input_sequence: "<|start_header_id|>user<|end_header_id|>\n\n".into(),
            input_suffix: "<|eot_id|>".into(),
            output_sequence: "<|start_header_id|>assistant<|end_header_id|>\n\n".into(),
            output_suffix: "<|eot_id|>".into(),
            stop_sequence: "<|eot_id|>".into(),
            ..Self::default()
        }
    }

    pub fn mistral() -> Self {
        Self {
            name: "Mistral".into(),
            system_sequence: "[INST] ".into(),
            system_suffix: " [/INST]".into(),
            input_sequence: "[INST] ".into(),
            input_suffix: " [/INST]".into(),
            output_suffix: "</s>".into(),
            stop_sequence: "</s>".into(),
            ..Self::default()
        }
    }
}

fn non_blank_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() { fallback } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_input_sequence_is_inactive() {
        let t = InstructTemplate {
            input_sequence: "   ".into(),
            ..InstructTemplate::chatml()
        };
        assert!(!t.is_active());
        assert!(InstructTemplate::chatml().is_active());
    }

    #[test]
    fn blank_suffixes_fall_back_to_stop_sequence() {
        let t = InstructTemplate {
            input_sequence: "<user>".into(),
            output_sequence: "<bot>".into(),
            stop_sequence: "</s>".into(),
            ..InstructTemplate::default()
        };
        assert_eq!(t.input_suffix_or_stop(), "</s>");
        assert_eq!(t.output_suffix_or_stop(), "</s>");
        assert_eq!(t.system_suffix_or_stop(), "</s>");
        assert_eq!(t.first_output_or_default(), "<bot>");
        assert_eq!(t.last_output_or_default(), "<bot>");
    }

    #[test]
    fn presets_resolve_case_insensitively() {
        for name in PRESET_NAMES {
            let t = InstructTemplate::preset(&name.to_uppercase()).unwrap();
            assert!(t.is_active(), "{name} should be active");
        }
        assert!(InstructTemplate::preset("nope").is_none());
    }

    #[test]
    fn template_deserializes_partially() {
        let t: InstructTemplate = serde_json::from_str(r#"{"input_sequence": "<user>"}"#).unwrap();
        assert_eq!(t.input_sequence, "<user>");
        assert!(!t.wrap);
    }
}
