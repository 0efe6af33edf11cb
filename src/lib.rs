//! Weaves a chat's recent history into an illustrated "dream" card.
//!
//! The extension is host-agnostic: conversation storage, model providers,
//! HTML rendering and message transport are reached through the traits in
//! [`host`]. [`local`] supplies file and stdout backed versions for the CLI.

pub mod commands;
pub mod config;
pub mod dream;
pub mod events;
pub mod history;
pub mod host;
pub mod llm;
pub mod local;
pub mod prompts;
pub mod render;
pub mod scheduler;
pub mod theme;

pub use commands::{DreamCommand, parse_dream_command};
pub use config::DreamConfig;
pub use dream::{DreamError, DreamWeaver, HostServices};
pub use events::{ActiveSession, Conversation, Reply};
pub use scheduler::DailyTrigger;
pub use theme::DreamTheme;
