//! Review records

use crate::BaseModel;
use serde::{Deserialize, Serialize};

/// A review left by a user on a place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(flatten)]
    pub base: BaseModel,
    pub place_id: String,
    pub user_id: String,
    pub text: String,
}

impl Review {
    pub fn new(
        place_id: impl Into<String>,
        user_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            base: BaseModel::new(),
            place_id: place_id.into(),
            user_id: user_id.into(),
            text: text.into(),
        }
    }

    pub fn apply(&mut self, patch: ReviewPatch) {
        if let Some(text) = patch.text {
            self.text = text;
        }
    }
}

/// Updatable Review fields
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewPatch {
    pub text: Option<String>,
}
