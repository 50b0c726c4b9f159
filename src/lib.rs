//! # Lorecrawl - AI-Narrated Text Adventure Engine
//!
//! Lorecrawl is a session-based text adventure engine. All prose the
//! player reads is produced on demand by a pluggable narrative service;
//! the engine owns the rules: character onboarding, a bounded world grid
//! with lazily generated rooms, items, quests, and NPC dialogue.
//!
//! ## Features
//!
//! - **Stateless Turns**: Every request rehydrates the full game state
//!   from the document store and persists after any mutation, so turns
//!   survive process restarts.
//! - **Staged Onboarding**: Name, pronouns, appearance, and a
//!   point-budgeted stat allocation, driven by a persisted stage tag.
//! - **Lazy World**: Grid cells generate their description, NPC, and
//!   loot exactly once, on first visit, with deterministic per-cell
//!   seeds.
//! - **NPC Dialogue**: Conversation history, at-most-once quest offers,
//!   and narrative-judged pass checks gated on character stats.
//! - **Offline Mode**: A scripted narrator stands in for the HTTP
//!   service when no endpoint is configured.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use lorecrawl::config::Config;
//! use lorecrawl::game::mapgen::SchematicRenderer;
//! use lorecrawl::game::{Engine, GameStore};
//! use lorecrawl::narrative::HttpNarrator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let store = GameStore::open(&config.game.data_dir)?;
//!     let narrator = Arc::new(HttpNarrator::new(config.narrative.clone()));
//!     let renderer = Arc::new(SchematicRenderer::default());
//!     let engine = Engine::new(store, narrator, renderer);
//!
//!     let reply = engine.handle("player-1", "").await?;
//!     println!("{}", reply.text);
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`game`] - the engine: sessions, world grid, items, quests, NPCs,
//!   persistence
//! - [`narrative`] - the narrative service client and scripted stand-in
//! - [`config`] - configuration management
//! - [`logutil`] - log sanitization helpers

pub mod config;
pub mod game;
pub mod logutil;
pub mod narrative;
