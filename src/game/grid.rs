//! The world grid: a fixed-size 2D array of optional rooms plus the
//! player's cursor.
//!
//! Rooms are added explicitly and form a connected subgraph of the grid;
//! an exit exists in a direction exactly when the neighboring cell is in
//! bounds and materialized. The cursor always addresses a materialized
//! slot once the game has started. Movement never generates content;
//! description is a separate, idempotent step.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::game::errors::GameError;
use crate::game::item::ItemRecord;
use crate::game::mapgen::{RoomRenderer, RoomSnapshot};
use crate::game::room::{cell_seed, Room};
use crate::game::types::{Direction, PlayerProfile, GRID_SCHEMA_VERSION};
use crate::narrative::Narrator;

pub const DEFAULT_ROWS: usize = 3;
pub const DEFAULT_COLS: usize = 4;

/// Result of a movement attempt. Blocked moves never mutate the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    Blocked,
}

/// Composite payload for showing the current room: prose, exits, items,
/// and the two rendered layers.
#[derive(Debug, Clone)]
pub struct RoomView {
    pub description: String,
    pub exits: Vec<Direction>,
    pub items: Vec<ItemRecord>,
    pub map: String,
    pub minimap: String,
}

impl RoomView {
    /// Plain-text body: description, exits line, item list.
    pub fn text(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.description);
        out.push('\n');
        out.push_str("Exits:");
        for exit in &self.exits {
            out.push(' ');
            out.push_str(exit.name());
        }
        out.push('\n');
        if !self.items.is_empty() {
            out.push_str("\nYou see the following items here:\n");
            for item in &self.items {
                out.push_str(&format!("  - {} ({})\n", item.name, item.rarity.label()));
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WorldGrid {
    rows: usize,
    cols: usize,
    /// Row-major: index = y * cols + x.
    cells: Vec<Option<Room>>,
    cursor_x: usize,
    cursor_y: usize,
}

impl Default for WorldGrid {
    fn default() -> Self {
        Self::new(DEFAULT_ROWS, DEFAULT_COLS)
    }
}

impl WorldGrid {
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            cells: vec![None; rows * cols],
            cursor_x: 0,
            cursor_y: 0,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.cursor_x, self.cursor_y)
    }

    fn index(&self, x: usize, y: usize) -> usize {
        y * self.cols + x
    }

    fn in_bounds(&self, x: usize, y: usize) -> bool {
        x < self.cols && y < self.rows
    }

    /// Create the structural slot at (x, y) with its deterministic seed.
    /// Content is not generated here. Materializing an existing slot is a
    /// no-op, so the call is idempotent.
    pub fn materialize(&mut self, x: usize, y: usize) -> Result<(), GameError> {
        if !self.in_bounds(x, y) {
            return Err(GameError::OutOfBounds { x, y });
        }
        let index = self.index(x, y);
        if self.cells[index].is_none() {
            debug!("materialized room at ({},{})", x, y);
            self.cells[index] = Some(Room::new(cell_seed(x, y)));
        }
        Ok(())
    }

    pub fn room_at(&self, x: usize, y: usize) -> Option<&Room> {
        if !self.in_bounds(x, y) {
            return None;
        }
        self.cells[self.index(x, y)].as_ref()
    }

    pub fn room_at_mut(&mut self, x: usize, y: usize) -> Option<&mut Room> {
        if !self.in_bounds(x, y) {
            return None;
        }
        let index = self.index(x, y);
        self.cells[index].as_mut()
    }

    pub fn current_room(&self) -> Option<&Room> {
        self.room_at(self.cursor_x, self.cursor_y)
    }

    pub fn current_room_mut(&mut self) -> Option<&mut Room> {
        self.room_at_mut(self.cursor_x, self.cursor_y)
    }

    /// Neighbor coordinates in a direction, or None when out of bounds.
    fn target(&self, direction: Direction) -> Option<(usize, usize)> {
        let (dx, dy) = direction.delta();
        let x = self.cursor_x as i64 + dx;
        let y = self.cursor_y as i64 + dy;
        if x < 0 || y < 0 || x as usize >= self.cols || y as usize >= self.rows {
            return None;
        }
        Some((x as usize, y as usize))
    }

    pub fn has_exit(&self, direction: Direction) -> bool {
        match self.target(direction) {
            Some((x, y)) => self.room_at(x, y).is_some(),
            None => false,
        }
    }

    /// Exits from the current cell, in fixed N/S/E/W order.
    pub fn exits(&self) -> Vec<Direction> {
        [
            Direction::North,
            Direction::South,
            Direction::East,
            Direction::West,
        ]
        .into_iter()
        .filter(|d| self.has_exit(*d))
        .collect()
    }

    /// Attempt to move the cursor. Blocked when the target is out of
    /// bounds or not materialized; the cursor is untouched in that case.
    pub fn step(&mut self, direction: Direction) -> MoveOutcome {
        match self.target(direction) {
            Some((x, y)) if self.room_at(x, y).is_some() => {
                self.cursor_x = x;
                self.cursor_y = y;
                debug!("cursor moved {} to ({},{})", direction.name(), x, y);
                MoveOutcome::Moved
            }
            _ => MoveOutcome::Blocked,
        }
    }

    /// Schematic overview of the whole grid. Pure function of grid state:
    /// no generation, no mutation. North is the top row. Slots render as
    /// `[@]` current position, `[#]` visited, `[?]` materialized but
    /// unexplored; empty slots as dots, with connector marks between
    /// adjacent materialized cells.
    pub fn render_minimap(&self) -> String {
        let mut lines = Vec::new();
        for y in (0..self.rows).rev() {
            let mut row = String::new();
            for x in 0..self.cols {
                let token = match self.room_at(x, y) {
                    None => "···",
                    Some(_) if (x, y) == (self.cursor_x, self.cursor_y) => "[@]",
                    Some(room) if room.visited => "[#]",
                    Some(_) => "[?]",
                };
                row.push_str(token);
                if x + 1 < self.cols {
                    let connected =
                        self.room_at(x, y).is_some() && self.room_at(x + 1, y).is_some();
                    row.push_str(if connected { "──" } else { "  " });
                }
            }
            lines.push(row);
            if y > 0 {
                let mut connectors = String::new();
                for x in 0..self.cols {
                    let connected =
                        self.room_at(x, y).is_some() && self.room_at(x, y - 1).is_some();
                    connectors.push_str(if connected { " │ " } else { "   " });
                    if x + 1 < self.cols {
                        connectors.push_str("  ");
                    }
                }
                lines.push(connectors);
            }
        }
        lines.push(String::new());
        lines.push("[@] You  [#] Visited  [?] Unexplored".to_string());
        lines.join("\n")
    }

    /// Snapshot of the current cell's geometry for the map renderer.
    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            x: self.cursor_x,
            y: self.cursor_y,
            rows: self.rows,
            cols: self.cols,
            north: self.has_exit(Direction::North),
            south: self.has_exit(Direction::South),
            east: self.has_exit(Direction::East),
            west: self.has_exit(Direction::West),
            seed: self.current_room().map(|r| r.seed).unwrap_or_default(),
        }
    }

    /// Describe the current room, generating its content on first visit
    /// (idempotent afterwards), and return the composite payload: map,
    /// minimap, description, exits, items. The map markup is cached on
    /// the room and re-requested only after item changes invalidate it.
    pub async fn describe_current(
        &mut self,
        narrator: &dyn Narrator,
        renderer: &dyn RoomRenderer,
        profile: &PlayerProfile,
    ) -> Result<RoomView, GameError> {
        let (x, y) = self.cursor();
        {
            let room = self
                .current_room_mut()
                .ok_or(GameError::OutOfBounds { x, y })?;
            room.ensure_described(narrator, profile).await?;
        }

        let snapshot = self.snapshot();
        let exits = self.exits();
        let minimap = self.render_minimap();
        let theme = profile.theme.clone();

        let room = self
            .current_room_mut()
            .ok_or(GameError::OutOfBounds { x, y })?;
        if room.map_markup.is_none() {
            room.map_markup = Some(renderer.render_room(&snapshot, &theme)?);
        }

        Ok(RoomView {
            description: room
                .description
                .clone()
                .unwrap_or_else(|| "Nothing here has taken shape yet.".to_string()),
            exits,
            items: room.items.clone(),
            map: room.map_markup.clone().unwrap_or_default(),
            minimap,
        })
    }

    /// Move one matching item from the current room into the inventory.
    /// Case-insensitive exact-name match; a descriptive failure (and no
    /// mutation) when nothing matches.
    pub fn pickup(&mut self, item_name: &str, inventory: &mut Vec<ItemRecord>) -> String {
        let Some(room) = self.current_room_mut() else {
            return "There is nothing here at all.".to_string();
        };
        match room.remove_item(item_name) {
            Some(item) => {
                let message = format!("You picked up: {}\n{}", item.name, item.description);
                inventory.push(item);
                message
            }
            None => format!("There is no '{}' here to pick up.", item_name),
        }
    }

    /// Move one matching item from the inventory into the current room.
    pub fn drop_item(&mut self, item_name: &str, inventory: &mut Vec<ItemRecord>) -> String {
        let pos = inventory
            .iter()
            .position(|i| i.name.eq_ignore_ascii_case(item_name));
        let Some(pos) = pos else {
            return format!("You don't have '{}' in your inventory.", item_name);
        };
        let item = inventory.remove(pos);
        let name = item.name.clone();
        match self.current_room_mut() {
            Some(room) => {
                room.add_item(item);
                format!("You dropped: {}", name)
            }
            None => {
                // Cursor invariant says this cannot happen once play has
                // started; put the item back rather than lose it.
                inventory.insert(pos, item);
                "There is nowhere to drop that.".to_string()
            }
        }
    }

    /// Serialize to the persistence document shape.
    pub fn to_doc(&self) -> GridDoc {
        let mut cells = Vec::new();
        for y in 0..self.rows {
            for x in 0..self.cols {
                if let Some(room) = self.room_at(x, y) {
                    cells.push(CellEntry {
                        x,
                        y,
                        visited: room.visited,
                        description: room.description.clone(),
                        items: room.items.clone(),
                        seed: room.seed,
                        npc: room.npc.clone(),
                    });
                }
            }
        }
        GridDoc {
            rows: self.rows,
            cols: self.cols,
            cursor_x: self.cursor_x,
            cursor_y: self.cursor_y,
            cells,
            schema_version: GRID_SCHEMA_VERSION,
        }
    }

    /// Rebuild a grid from its persistence document. Entries outside the
    /// recorded bounds are rejected rather than silently dropped.
    pub fn from_doc(doc: &GridDoc) -> Result<Self, GameError> {
        let mut grid = WorldGrid::new(doc.rows, doc.cols);
        for entry in &doc.cells {
            if !grid.in_bounds(entry.x, entry.y) {
                return Err(GameError::OutOfBounds {
                    x: entry.x,
                    y: entry.y,
                });
            }
            let index = grid.index(entry.x, entry.y);
            grid.cells[index] = Some(Room {
                description: entry.description.clone(),
                visited: entry.visited,
                items: entry.items.clone(),
                npc: entry.npc.clone(),
                seed: entry.seed,
                map_markup: None,
            });
        }
        if !grid.in_bounds(doc.cursor_x, doc.cursor_y) {
            return Err(GameError::OutOfBounds {
                x: doc.cursor_x,
                y: doc.cursor_y,
            });
        }
        grid.cursor_x = doc.cursor_x;
        grid.cursor_y = doc.cursor_y;
        Ok(grid)
    }
}

/// One materialized cell in the world-grid document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CellEntry {
    pub x: usize,
    pub y: usize,
    pub visited: bool,
    pub description: Option<String>,
    pub items: Vec<ItemRecord>,
    pub seed: u64,
    /// The room's NPC travels with the cell so conversations survive
    /// stateless requests.
    #[serde(default)]
    pub npc: Option<crate::game::npc::Npc>,
}

/// Wire shape of the persisted world grid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GridDoc {
    pub rows: usize,
    pub cols: usize,
    pub cursor_x: usize,
    pub cursor_y: usize,
    pub cells: Vec<CellEntry>,
    pub schema_version: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::item::Rarity;

    fn item(name: &str) -> ItemRecord {
        ItemRecord {
            name: name.to_string(),
            rarity: Rarity::Common,
            value: 2,
            description: "test".to_string(),
        }
    }

    #[test]
    fn materialize_rejects_out_of_range() {
        let mut grid = WorldGrid::default();
        assert!(grid.materialize(0, 0).is_ok());
        assert!(matches!(
            grid.materialize(99, 0),
            Err(GameError::OutOfBounds { .. })
        ));
        assert!(matches!(
            grid.materialize(0, 3),
            Err(GameError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn materialize_is_idempotent() {
        let mut grid = WorldGrid::default();
        grid.materialize(1, 1).unwrap();
        grid.room_at_mut(1, 1).unwrap().visited = true;
        grid.materialize(1, 1).unwrap();
        assert!(grid.room_at(1, 1).unwrap().visited, "slot not recreated");
    }

    #[test]
    fn step_moves_only_into_materialized_cells() {
        let mut grid = WorldGrid::default();
        grid.materialize(0, 0).unwrap();
        grid.materialize(0, 1).unwrap();

        assert_eq!(grid.step(Direction::East), MoveOutcome::Blocked);
        assert_eq!(grid.cursor(), (0, 0));
        assert_eq!(grid.step(Direction::West), MoveOutcome::Blocked);
        assert_eq!(grid.cursor(), (0, 0));
        assert_eq!(grid.step(Direction::North), MoveOutcome::Moved);
        assert_eq!(grid.cursor(), (0, 1));
        assert_eq!(grid.step(Direction::South), MoveOutcome::Moved);
        assert_eq!(grid.cursor(), (0, 0));
    }

    #[test]
    fn exits_reflect_materialized_neighbors_only() {
        let mut grid = WorldGrid::default();
        grid.materialize(1, 1).unwrap();
        grid.materialize(1, 2).unwrap();
        grid.materialize(2, 1).unwrap();
        grid.cursor_x = 1;
        grid.cursor_y = 1;

        assert_eq!(grid.exits(), vec![Direction::North, Direction::East]);
        assert!(!grid.has_exit(Direction::South));
        assert!(!grid.has_exit(Direction::West));
    }

    #[test]
    fn minimap_marks_cursor_visited_and_connections() {
        let mut grid = WorldGrid::default();
        grid.materialize(0, 0).unwrap();
        grid.materialize(1, 0).unwrap();
        grid.room_at_mut(1, 0).unwrap().visited = true;

        let map = grid.render_minimap();
        assert!(map.contains("[@]──[#]"), "got:\n{}", map);
        assert!(map.contains("···"));

        // Pure function: rendering twice changes nothing.
        assert_eq!(map, grid.render_minimap());
    }

    #[test]
    fn pickup_and_drop_are_inverse() {
        let mut grid = WorldGrid::default();
        grid.materialize(0, 0).unwrap();
        grid.current_room_mut().unwrap().add_item(item("torch"));
        grid.current_room_mut().unwrap().add_item(item("rope"));
        let original: Vec<String> = grid
            .current_room()
            .unwrap()
            .items
            .iter()
            .map(|i| i.name.clone())
            .collect();

        let mut inventory = Vec::new();
        let up = grid.pickup("Torch", &mut inventory);
        assert!(up.starts_with("You picked up: torch"));
        assert_eq!(inventory.len(), 1);

        let down = grid.drop_item("torch", &mut inventory);
        assert_eq!(down, "You dropped: torch");
        assert!(inventory.is_empty());

        let mut restored: Vec<String> = grid
            .current_room()
            .unwrap()
            .items
            .iter()
            .map(|i| i.name.clone())
            .collect();
        let mut expected = original;
        restored.sort();
        expected.sort();
        assert_eq!(restored, expected);
    }

    #[test]
    fn pickup_failure_mentions_no_and_mutates_nothing() {
        let mut grid = WorldGrid::default();
        grid.materialize(0, 0).unwrap();
        let mut inventory = Vec::new();
        let message = grid.pickup("torch", &mut inventory);
        assert!(message.contains("no"));
        assert!(inventory.is_empty());
        assert!(grid.current_room().unwrap().items.is_empty());
    }

    #[test]
    fn doc_round_trip_preserves_everything() {
        let mut grid = WorldGrid::default();
        for (x, y) in [(0, 0), (0, 1), (1, 1)] {
            grid.materialize(x, y).unwrap();
        }
        {
            let room = grid.room_at_mut(0, 1).unwrap();
            room.visited = true;
            room.description = Some("A dim hall.".to_string());
            room.items.push(item("gemstone"));
        }
        grid.step(Direction::North);

        let doc = grid.to_doc();
        let restored = WorldGrid::from_doc(&doc).unwrap();
        assert_eq!(restored, grid);
        assert_eq!(restored.cursor(), (0, 1));
        assert_eq!(
            restored.room_at(0, 1).unwrap().description.as_deref(),
            Some("A dim hall.")
        );
        assert_eq!(
            restored.room_at(0, 0).unwrap().seed,
            grid.room_at(0, 0).unwrap().seed
        );
    }

    #[test]
    fn doc_with_out_of_bounds_cell_is_rejected() {
        let mut doc = WorldGrid::default().to_doc();
        doc.cells.push(CellEntry {
            x: 9,
            y: 9,
            visited: false,
            description: None,
            items: Vec::new(),
            seed: 0,
            npc: None,
        });
        assert!(matches!(
            WorldGrid::from_doc(&doc),
            Err(GameError::OutOfBounds { .. })
        ));
    }
}
