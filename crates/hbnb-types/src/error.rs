//! Error types for entity (de)serialization

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Unknown class: {0}")]
    UnknownClass(String),

    #[error("Malformed key: {0}")]
    MalformedKey(String),

    #[error("Invalid {kind} record: {source}")]
    Invalid {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Expected a JSON object for {0}")]
    NotAnObject(String),
}
