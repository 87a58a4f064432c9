//! `talespin prompt` — Assemble and print a prompt.

use std::io::Write;
use std::path::Path;

use talespin_core::SystemClock;
use talespin_prompt::PromptAssembler;

use super::SnapshotArgs;

pub fn run(
    config_path: Option<&Path>,
    snapshot: &SnapshotArgs,
    user_name: Option<&str>,
) -> anyhow::Result<()> {
    let config = super::load_config(config_path)?;
    let (character, history) = super::load_snapshot(snapshot)?;
    let context = config.to_chat_context();
    let user_name = user_name.unwrap_or(config.user_name.as_str());

    let assembler = PromptAssembler::new(&character, &context, user_name, &SystemClock);
    let prompt = assembler.build_prompt(&history, &snapshot.message);

    emit(&mut std::io::stdout().lock(), &prompt)?;
    Ok(())
}

/// Write the prompt verbatim; the generation cue stays the last thing out.
fn emit(out: &mut impl Write, prompt: &str) -> std::io::Result<()> {
    out.write_all(prompt.as_bytes())?;
    out.flush()
}
