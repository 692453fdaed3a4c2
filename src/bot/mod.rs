//! Chat-facing layer: command parsing, reply rendering and the server loop.

pub mod commands;
pub mod render;
pub mod reply;
pub mod server;

pub use commands::{parse_command, parse_component, Command};
pub use reply::{Embed, EmbedField, Reply};
pub use server::{BotServer, Invocation};
