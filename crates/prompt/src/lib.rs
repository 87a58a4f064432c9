//! Prompt assembly for Talespin.
//!
//! Compiles a character card, the user's persona, triggered world info, the
//! Author's Note and the chat history into one text prompt:
//!
//! 1. **Macros** expand `{{char}}`, `{{user}}`, time/date and field tokens
//! 2. **Examples** split the character's example dialogue into turns
//! 3. **World info** decides which lorebook entries fire for the scan window
//! 4. **Injection** interleaves depth-targeted content into the history
//! 5. **Story** builds the description/personality/scenario/persona block
//! 6. **Assembler** picks instruct or simple formatting and emits the prompt
//!
//! Every step is a pure, synchronous function of immutable inputs.

pub mod assembler;
pub mod examples;
pub mod injection;
pub mod macros;
pub mod story;
pub mod world_info;

pub use assembler::PromptAssembler;
pub use examples::ExampleTurn;
pub use injection::{DepthPromptSource, EffectiveDepthPrompt, HistoryItem};
pub use macros::{MacroSubstitutor, MacroValues};
pub use world_info::ScanWindow;
