//! Amenity records

use crate::BaseModel;
use serde::{Deserialize, Serialize};

/// An amenity; linked to places many-to-many
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Amenity {
    #[serde(flatten)]
    pub base: BaseModel,
    pub name: String,
}

impl Amenity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: BaseModel::new(),
            name: name.into(),
        }
    }

    pub fn apply(&mut self, patch: AmenityPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
    }
}

/// Updatable Amenity fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AmenityPatch {
    pub name: Option<String>,
}
