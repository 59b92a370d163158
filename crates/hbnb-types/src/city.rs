//! City records

use crate::BaseModel;
use serde::{Deserialize, Serialize};

/// A city; belongs to one state, owns many places
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    #[serde(flatten)]
    pub base: BaseModel,
    pub state_id: String,
    pub name: String,
}

impl City {
    pub fn new(state_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            base: BaseModel::new(),
            state_id: state_id.into(),
            name: name.into(),
        }
    }

    pub fn apply(&mut self, patch: CityPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
    }
}

/// Updatable City fields (`state_id` is fixed at creation)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CityPatch {
    pub name: Option<String>,
}
