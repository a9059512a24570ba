//! Error types for deck loading, event parsing, and persistence.
//!
//! Navigation and revelation never fail; these errors only surface at the
//! boundaries where external data enters the engine.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while loading a deck or talking to collaborators.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read an input file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Deck or store contents were not valid JSON for the expected shape.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A deck must contain at least one slide.
    #[error("Deck contains no slides")]
    EmptyDeck,

    /// Two slides share the same id.
    #[error("Duplicate slide id: {0}")]
    DuplicateSlideId(String),

    /// Two fragments within one slide share the same id.
    #[error("Duplicate fragment id '{fragment}' in slide '{slide}'")]
    DuplicateFragmentId { slide: String, fragment: String },

    /// An input event line could not be understood.
    #[error("Invalid input event: {0}")]
    InvalidEvent(String),

    /// The durable key-value store rejected a read or write.
    #[error("Storage error: {0}")]
    StorageError(String),
}
