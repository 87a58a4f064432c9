//! `talespin scan` — Show which world-info entries a message triggers.

use std::path::Path;

use talespin_core::{SystemClock, WorldInfoPosition};
use talespin_prompt::PromptAssembler;

use super::SnapshotArgs;

pub fn run(config_path: Option<&Path>, snapshot: &SnapshotArgs) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let (character, history) = super::load_snapshot(snapshot)?;
    let context = config.to_chat_context();

    let assembler = PromptAssembler::new(&character, &context, &config.user_name, &SystemClock);
    let triggered = assembler.triggered_world_info(&history, &snapshot.message);

    println!(
        "📚 {} of {} world info entries triggered",
        triggered.len(),
        context.world_info.len()
    );
    for entry in triggered {
        let placement = if entry.is_depth_injected() {
            format!("depth {}", entry.depth)
        } else {
            match entry.position {
                WorldInfoPosition::BeforeCharacter => "before character".to_string(),
                WorldInfoPosition::AfterCharacter => "after character".to_string(),
            }
        };
        let label = if entry.comment.trim().is_empty() {
            entry.keys.join(", ")
        } else {
            entry.comment.clone()
        };
        println!("   #{:<4} {:<18} {label}", entry.uid, placement);
    }
    Ok(())
}
