//! # Talespin Core
//!
//! Domain types for the Talespin prompt-assembly engine: character cards,
//! user personas, the Author's Note, world-info entries, chat messages and
//! instruct templates. This crate carries no formatting logic; it defines
//! the immutable snapshots the prompt pipeline is computed from.

pub mod error;
pub mod message;
pub mod character;
pub mod persona;
pub mod world_info;
pub mod instruct;
pub mod context;
pub mod clock;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use message::{ChatMessage, Role};
pub use character::{Character, DepthPrompt};
pub use persona::{AuthorsNote, PersonaPosition, UserPersona};
pub use world_info::{WorldInfoEntry, WorldInfoPosition, WorldInfoSettings};
pub use instruct::InstructTemplate;
pub use context::ChatContext;
pub use clock::{Clock, FixedClock, SystemClock};
