//! # Squirrel Catcher - a Discord game bot
//!
//! Players set traps on a cooldown, catch squirrels of varying rarity (or
//! junk), hoard a four-tier acorn currency, spend it on boosts and permanent
//! upgrades, and compare their stash on a leaderboard.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use squirrel_catcher::bot::BotServer;
//! use squirrel_catcher::config::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let server = BotServer::new(config)?;
//!     server.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`game`] - Catch rolls, buffs, currency, shop and the [`game::GameEngine`]
//! - [`storage`] - Sled-backed player and buff persistence, leaderboard seeding
//! - [`bot`] - Command parsing, reply rendering, Discord and console loops
//! - [`discord`] - Gateway WebSocket, REST client and wire models
//! - [`config`] - TOML configuration
//!
//! ```text
//! ┌─────────────────┐
//! │  Discord / CLI  │ ← gateway events, console input
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   Bot Server    │ ← commands, rendering, auto-catch ticker
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   Game Engine   │ ← rolls, buffs, economy
//! └─────────────────┘
//!          │
//! ┌─────────────────┐
//! │   Sled Store    │ ← players, buffs
//! └─────────────────┘
//! ```

pub mod bot;
pub mod config;
pub mod discord;
pub mod game;
pub mod logutil;
pub mod storage;
