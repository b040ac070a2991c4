use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed {format} document: {message}")]
    Decode { format: String, message: String },

    #[error("Record has no ISBN")]
    MissingIsbn,

    #[error("Book with ISBN {0} already exists")]
    DuplicateIsbn(String),

    #[error("Book with ISBN {0} not found")]
    NotFound(String),

    #[error("Persistence conflict: {0}")]
    Conflict(String),
}

impl CatalogError {
    pub fn decode(format: &str, message: impl std::fmt::Display) -> Self {
        CatalogError::Decode {
            format: format.to_string(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CatalogError>;
