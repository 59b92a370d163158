//! Error types for HBNB storage and domain logic

use hbnb_types::{EntityKind, ModelError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, HbnbError>;

#[derive(Error, Debug)]
pub enum HbnbError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("{0}")]
    Validation(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Model error: {0}")]
    Model(#[from] ModelError),
}

impl HbnbError {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        HbnbError::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn persistence(message: impl std::fmt::Display) -> Self {
        HbnbError::Persistence(message.to_string())
    }

    /// Whether the durable backend rejected or failed the operation.
    pub fn is_persistence_failure(&self) -> bool {
        matches!(
            self,
            HbnbError::Persistence(_)
                | HbnbError::Io(_)
                | HbnbError::Serialization(_)
                | HbnbError::Model(_)
        )
    }
}

impl From<serde_json::Error> for HbnbError {
    fn from(e: serde_json::Error) -> Self {
        HbnbError::Serialization(e.to_string())
    }
}
