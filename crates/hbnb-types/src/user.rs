//! User records

use crate::BaseModel;
use serde::{Deserialize, Serialize};

/// User account
///
/// `password` holds whatever the storage layer was handed; the HTTP layer
/// stores an Argon2 hash here and never renders it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(flatten)]
    pub base: BaseModel,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

impl User {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            base: BaseModel::new(),
            email: email.into(),
            password: password.into(),
            first_name: String::new(),
            last_name: String::new(),
        }
    }

    pub fn apply(&mut self, patch: UserPatch) {
        if let Some(password) = patch.password {
            self.password = password;
        }
        if let Some(first_name) = patch.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = patch.last_name {
            self.last_name = last_name;
        }
    }
}

/// Updatable User fields (`email` is fixed at creation)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UserPatch {
    pub password: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}
