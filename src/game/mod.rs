//! The lorecrawl game engine.
//!
//! Submodules, roughly bottom-up:
//!
//! - [`types`] - core records: characters, ability scores, stage tags
//! - [`errors`] - the engine error taxonomy
//! - [`item`] - loot records and rarity-weighted generation
//! - [`quest`] - quest records and random quest creation
//! - [`npc`] - NPC generation, dialogue, and pass checks
//! - [`room`] - per-cell content and first-visit generation
//! - [`grid`] - the world grid, movement, and the minimap
//! - [`mapgen`] - the room-map renderer seam
//! - [`storage`] - sled-backed persistence
//! - [`session`] - the per-request engine and stage dispatch

pub mod errors;
pub mod grid;
pub mod item;
pub mod mapgen;
pub mod npc;
pub mod quest;
pub mod room;
pub mod session;
pub mod storage;
pub mod types;

pub use errors::GameError;
pub use session::{Engine, TurnOutput};
pub use storage::{GameStore, GameStoreBuilder};
