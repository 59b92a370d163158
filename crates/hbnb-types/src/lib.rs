//! HBNB Types - Pure entity definitions
//!
//! This crate contains only plain data types (no async runtime, no storage),
//! shared by the storage layer and the HTTP surface.

pub mod amenity;
pub mod base;
pub mod city;
pub mod entity;
pub mod error;
pub mod place;
pub mod review;
pub mod state;
pub mod user;

pub use amenity::*;
pub use base::*;
pub use city::*;
pub use entity::*;
pub use error::{ModelError, Result};
pub use place::*;
pub use review::*;
pub use state::*;
pub use user::*;
