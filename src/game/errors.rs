use thiserror::Error;

/// Errors that can arise inside the game engine and its storage layer.
#[derive(Debug, Error)]
pub enum GameError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Store(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Codec(#[from] bincode::Error),

    /// Wrapper around IO errors (directory creation, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when fetching a document that is not present.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Returned when deserializing a document with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },

    /// Grid coordinate outside the configured rows/cols.
    #[error("cell ({x},{y}) is outside the world grid")]
    OutOfBounds { x: usize, y: usize },

    /// The narrative service failed after exhausting its retry budget.
    #[error("narrative service error: {0}")]
    Narrative(String),

    /// The map renderer could not produce markup for a room.
    #[error("renderer error: {0}")]
    Renderer(String),
}
