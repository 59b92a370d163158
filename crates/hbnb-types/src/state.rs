//! State records

use crate::BaseModel;
use serde::{Deserialize, Serialize};

/// A state; owns many cities
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct State {
    #[serde(flatten)]
    pub base: BaseModel,
    pub name: String,
}

impl State {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            base: BaseModel::new(),
            name: name.into(),
        }
    }

    pub fn apply(&mut self, patch: StatePatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
    }
}

/// Updatable State fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatePatch {
    pub name: Option<String>,
}
