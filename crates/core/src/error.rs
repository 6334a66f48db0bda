//! Error types for Stowage.

use thiserror::Error;

/// Result type alias for Stowage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during placement, retrieval and planning operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A dimension is zero, negative or not finite.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// The item is unknown or not currently placed.
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    /// The container is unknown.
    #[error("Container not found: {0}")]
    ContainerNotFound(String),

    /// The request structurally cannot succeed (e.g. an item larger than
    /// every container in every orientation).
    #[error("Over capacity: {0}")]
    Overcapacity(String),

    /// Malformed input that fails the whole call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error.
    #[cfg(feature = "serde")]
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Short machine-readable kind, used in residual entries and responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidGeometry(_) => "InvalidGeometry",
            Error::ItemNotFound(_) => "ItemNotFound",
            Error::ContainerNotFound(_) => "ContainerNotFound",
            Error::Overcapacity(_) => "Overcapacity",
            Error::InvalidInput(_) => "InvalidInput",
            #[cfg(feature = "serde")]
            Error::SerializationError(_) => "SerializationError",
            Error::Internal(_) => "Internal",
        }
    }
}
