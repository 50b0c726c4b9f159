//! Sled-backed persistence for characters and their world grids.
//!
//! Every request rehydrates the full character + grid from here and
//! writes back after any mutation; no in-memory state is assumed to
//! survive between requests. Characters are keyed by user id, grids by
//! character id, in separate trees.

use std::path::{Path, PathBuf};

use log::info;
use sled::IVec;

use crate::game::errors::GameError;
use crate::game::grid::{GridDoc, WorldGrid};
use crate::game::types::{Character, CHARACTER_SCHEMA_VERSION, GRID_SCHEMA_VERSION};

const TREE_CHARACTERS: &str = "characters";
const TREE_GRIDS: &str = "grids";

/// Helper builder so tests can easily create throwaway stores with custom
/// paths.
pub struct GameStoreBuilder {
    path: PathBuf,
}

impl GameStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn open(self) -> Result<GameStore, GameError> {
        GameStore::open(self.path)
    }
}

/// Document store for per-player game state.
pub struct GameStore {
    _db: sled::Db,
    characters: sled::Tree,
    grids: sled::Tree,
}

impl GameStore {
    /// Open (or create) the store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GameError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let characters = db.open_tree(TREE_CHARACTERS)?;
        let grids = db.open_tree(TREE_GRIDS)?;
        Ok(Self {
            _db: db,
            characters,
            grids,
        })
    }

    fn character_key(user_id: &str) -> Vec<u8> {
        format!("characters:{}", user_id).into_bytes()
    }

    fn grid_key(character_id: &str) -> Vec<u8> {
        format!("grids:{}", character_id).into_bytes()
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, GameError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: IVec) -> Result<T, GameError> {
        Ok(bincode::deserialize::<T>(&bytes)?)
    }

    /// Persist a character and its world grid. Called after every
    /// state-changing action.
    pub fn put_character(&self, user_id: &str, character: &Character) -> Result<(), GameError> {
        let mut record = character.clone();
        record.schema_version = CHARACTER_SCHEMA_VERSION;
        // The grid field is serde-skipped on the character; it gets its
        // own document below.
        let bytes = Self::serialize(&record)?;
        self.characters
            .insert(Self::character_key(user_id), bytes)?;

        let grid_doc = character.grid.to_doc();
        let grid_bytes = Self::serialize(&grid_doc)?;
        self.grids
            .insert(Self::grid_key(&character.id), grid_bytes)?;

        self.characters.flush()?;
        self.grids.flush()?;
        Ok(())
    }

    /// Rehydrate a character (world grid attached) by user id.
    pub fn get_character(&self, user_id: &str) -> Result<Character, GameError> {
        let Some(bytes) = self.characters.get(Self::character_key(user_id))? else {
            return Err(GameError::NotFound(format!("character for user {}", user_id)));
        };
        let mut character: Character = Self::deserialize(bytes)?;
        if character.schema_version != CHARACTER_SCHEMA_VERSION {
            return Err(GameError::SchemaMismatch {
                entity: "character",
                expected: CHARACTER_SCHEMA_VERSION,
                found: character.schema_version,
            });
        }

        character.grid = match self.grids.get(Self::grid_key(&character.id))? {
            Some(grid_bytes) => {
                let doc: GridDoc = Self::deserialize(grid_bytes)?;
                if doc.schema_version != GRID_SCHEMA_VERSION {
                    return Err(GameError::SchemaMismatch {
                        entity: "grid",
                        expected: GRID_SCHEMA_VERSION,
                        found: doc.schema_version,
                    });
                }
                WorldGrid::from_doc(&doc)?
            }
            None => WorldGrid::default(),
        };
        Ok(character)
    }

    pub fn character_exists(&self, user_id: &str) -> Result<bool, GameError> {
        Ok(self
            .characters
            .contains_key(Self::character_key(user_id))?)
    }

    /// Remove a user's character and its grid document. Used by restart:
    /// the old record is deleted and a fresh one created.
    pub fn delete_character(&self, user_id: &str) -> Result<(), GameError> {
        if let Some(bytes) = self.characters.get(Self::character_key(user_id))? {
            let character: Character = Self::deserialize(bytes)?;
            self.grids.remove(Self::grid_key(&character.id))?;
            self.characters.remove(Self::character_key(user_id))?;
            self.characters.flush()?;
            self.grids.flush()?;
            info!("deleted character for user {}", user_id);
        }
        Ok(())
    }

    /// List all user ids with a stored character.
    pub fn list_user_ids(&self) -> Result<Vec<String>, GameError> {
        let mut ids = Vec::new();
        for entry in self.characters.scan_prefix(b"characters:") {
            let (key, _) = entry?;
            let text = String::from_utf8_lossy(&key);
            if let Some(user_id) = text.strip_prefix("characters:") {
                ids.push(user_id.to_string());
            }
        }
        Ok(ids)
    }
}
