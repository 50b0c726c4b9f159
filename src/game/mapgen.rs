//! Procedural room-map rendering.
//!
//! The engine treats pixel-level drawing as an external concern; what
//! lives here is the renderer seam plus a schematic implementation that
//! turns a room's geometry into embeddable markup. Rendering is a pure
//! function of the snapshot: the same seed and exits always produce the
//! same markup, which is what lets rooms cache it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::game::errors::GameError;

/// Geometry handed to the renderer: cursor position, grid dimensions,
/// per-direction exit booleans, and the room's deterministic seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub x: usize,
    pub y: usize,
    pub rows: usize,
    pub cols: usize,
    pub north: bool,
    pub south: bool,
    pub east: bool,
    pub west: bool,
    pub seed: u64,
}

/// Map renderer collaborator. Returns opaque embeddable markup.
pub trait RoomRenderer: Send + Sync {
    fn render_room(&self, snapshot: &RoomSnapshot, theme: &str) -> Result<String, GameError>;
}

/// Theme palette classes, matched loosely against the free-text era
/// string the narrative service picked.
fn palette_class(theme: &str) -> &'static str {
    let theme = theme.to_ascii_lowercase();
    if theme.contains("cyber") || theme.contains("sci") {
        "map-neon"
    } else if theme.contains("steam") {
        "map-brass"
    } else {
        "map-stone"
    }
}

/// Character-tile schematic renderer: walls with door gaps per exit, a
/// scattering of seeded props, and a player marker, wrapped in a `<pre>`
/// block. Deterministic for a given snapshot.
pub struct SchematicRenderer {
    width: usize,
    height: usize,
}

impl Default for SchematicRenderer {
    fn default() -> Self {
        Self {
            width: 25,
            height: 11,
        }
    }
}

impl SchematicRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }
}

impl RoomRenderer for SchematicRenderer {
    fn render_room(&self, snapshot: &RoomSnapshot, theme: &str) -> Result<String, GameError> {
        if self.width < 7 || self.height < 5 {
            return Err(GameError::Renderer(format!(
                "map canvas {}x{} too small",
                self.width, self.height
            )));
        }

        let mut tiles = vec![vec!['.'; self.width]; self.height];
        for x in 0..self.width {
            tiles[0][x] = '#';
            tiles[self.height - 1][x] = '#';
        }
        for row in tiles.iter_mut() {
            row[0] = '#';
            row[self.width - 1] = '#';
        }

        // Door gaps in the middle of each wall with an exit. Row 0 is the
        // north wall since the snippet reads top-down.
        let mid_x = self.width / 2;
        let mid_y = self.height / 2;
        if snapshot.north {
            tiles[0][mid_x - 1] = ' ';
            tiles[0][mid_x] = ' ';
            tiles[0][mid_x + 1] = ' ';
        }
        if snapshot.south {
            tiles[self.height - 1][mid_x - 1] = ' ';
            tiles[self.height - 1][mid_x] = ' ';
            tiles[self.height - 1][mid_x + 1] = ' ';
        }
        if snapshot.east {
            tiles[mid_y - 1][self.width - 1] = ' ';
            tiles[mid_y][self.width - 1] = ' ';
        }
        if snapshot.west {
            tiles[mid_y - 1][0] = ' ';
            tiles[mid_y][0] = ' ';
        }

        // Seeded props so the same room always draws the same clutter.
        let mut rng = StdRng::seed_from_u64(snapshot.seed);
        let props = rng.gen_range(2..=5);
        for _ in 0..props {
            let px = rng.gen_range(2..self.width - 2);
            let py = rng.gen_range(2..self.height - 2);
            if (px, py) != (mid_x, mid_y) {
                tiles[py][px] = 'o';
            }
        }

        tiles[mid_y][mid_x] = '@';

        let body: Vec<String> = tiles.into_iter().map(|row| row.into_iter().collect()).collect();
        Ok(format!(
            "<div class=\"room-map {}\" data-cell=\"{},{}\"><pre>{}</pre></div>",
            palette_class(theme),
            snapshot.x,
            snapshot.y,
            body.join("\n")
        ))
    }
}
