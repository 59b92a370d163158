//! HBNB Core Library
//!
//! The storage port every backend implements, the error taxonomy, and the
//! backend-agnostic logic built on top of the port (relations, delete
//! cascades, places search).

// Re-export pure types from hbnb-types
pub use hbnb_types::*;

pub mod cascade;
pub mod error;
pub mod ports;
pub mod relations;
pub mod search;

pub use error::{HbnbError, Result};
pub use ports::Storage;
pub use search::{places_search, SearchFilter, SearchResult};
