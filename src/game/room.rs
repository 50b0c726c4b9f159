//! A single world-grid cell's content.
//!
//! Rooms follow a two-phase contract: `materialize` (done by the grid)
//! creates the structural slot only, and [`Room::ensure_described`]
//! generates content exactly once. The split exists so tests can assert
//! generation happened exactly once instead of relying on getter side
//! effects.

use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::game::errors::GameError;
use crate::game::item::{generate_item, ItemRecord};
use crate::game::npc::Npc;
use crate::game::types::PlayerProfile;
use crate::narrative::Narrator;

/// Chance a freshly described room contains loot at all. The draw comes
/// from the room's seeded RNG, so the outcome is fixed per cell.
const LOOT_CHANCE: f64 = 0.5;

/// Deterministic seed for a grid cell, derived only from its coordinates.
/// splitmix64 finalizer over the packed coordinates; stable across runs
/// and rehydration, which is what makes seeded loot reproducible.
pub fn cell_seed(x: usize, y: usize) -> u64 {
    let mut z = (((x as u64) << 32) | (y as u64)) ^ 0x9E37_79B9_7F4A_7C15;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Room {
    pub description: Option<String>,
    pub visited: bool,
    pub items: Vec<ItemRecord>,
    pub npc: Option<Npc>,
    /// Deterministic per-cell seed; see [`cell_seed`].
    pub seed: u64,
    /// Cached renderer markup. Never persisted; invalidated whenever the
    /// room's item list changes.
    #[serde(skip)]
    pub map_markup: Option<String>,
}

impl Room {
    pub fn new(seed: u64) -> Self {
        Self {
            description: None,
            visited: false,
            items: Vec::new(),
            npc: None,
            seed,
            map_markup: None,
        }
    }

    pub fn has_items(&self) -> bool {
        !self.items.is_empty()
    }

    pub fn add_item(&mut self, item: ItemRecord) {
        self.items.push(item);
        self.map_markup = None;
    }

    /// Remove and return the first item matching the name
    /// case-insensitively, invalidating the cached map markup. No
    /// mutation when nothing matches.
    pub fn remove_item(&mut self, item_name: &str) -> Option<ItemRecord> {
        let pos = self
            .items
            .iter()
            .position(|i| i.name.eq_ignore_ascii_case(item_name))?;
        self.map_markup = None;
        Some(self.items.remove(pos))
    }

    /// Generate this room's content exactly once: an NPC, a location
    /// description mentioning the NPC, and seeded loot. Idempotent - a
    /// visited room returns immediately. Returns whether generation ran.
    pub async fn ensure_described(
        &mut self,
        narrator: &dyn Narrator,
        profile: &PlayerProfile,
    ) -> Result<bool, GameError> {
        if self.visited {
            debug!("room already described, skipping generation");
            return Ok(false);
        }

        let npc = Npc::generate(narrator, &profile.theme).await?;

        let mut prompt = format!(
            "Make up a location or MUD room description fitting the theme {} for a character \
             named {}. Don't list any exits or items or anything other than a description of \
             a location.",
            profile.theme, profile.name
        );
        prompt.push_str(&format!(
            " Include a mention of an NPC named {} and subtly include the description {}",
            npc.name, npc.description
        ));
        let description = narrator.generate(&prompt).await?;

        // Loot is drawn from the room's own seed so regeneration after a
        // crash or rehydration would produce the same items.
        let mut rng = StdRng::seed_from_u64(self.seed);
        if rng.gen_bool(LOOT_CHANCE) {
            let count = rng.gen_range(1..=2);
            for _ in 0..count {
                self.items.push(generate_item(&mut rng, &profile.theme));
            }
        }

        info!(
            "described room (npc: {}, items: {})",
            npc.name,
            self.items.len()
        );
        self.npc = Some(npc);
        self.description = Some(description);
        self.visited = true;
        self.map_markup = None;
        Ok(true)
    }
}
