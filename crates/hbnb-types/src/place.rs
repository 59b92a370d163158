//! Place records

use crate::BaseModel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A rentable place; belongs to a city and a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    #[serde(flatten)]
    pub base: BaseModel,
    pub city_id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub number_rooms: i64,
    #[serde(default)]
    pub number_bathrooms: i64,
    #[serde(default)]
    pub max_guest: i64,
    #[serde(default)]
    pub price_by_night: i64,
    #[serde(default)]
    pub latitude: f64,
    #[serde(default)]
    pub longitude: f64,
    /// Linked amenities; a set, so a pair can never be linked twice
    #[serde(default)]
    pub amenity_ids: BTreeSet<String>,
}

impl Place {
    pub fn new(
        city_id: impl Into<String>,
        user_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            base: BaseModel::new(),
            city_id: city_id.into(),
            user_id: user_id.into(),
            name: name.into(),
            description: String::new(),
            number_rooms: 0,
            number_bathrooms: 0,
            max_guest: 0,
            price_by_night: 0,
            latitude: 0.0,
            longitude: 0.0,
            amenity_ids: BTreeSet::new(),
        }
    }

    pub fn has_amenity(&self, amenity_id: &str) -> bool {
        self.amenity_ids.contains(amenity_id)
    }

    /// Returns false when the amenity was already linked.
    pub fn link_amenity(&mut self, amenity_id: impl Into<String>) -> bool {
        self.amenity_ids.insert(amenity_id.into())
    }

    /// Returns false when the amenity was not linked.
    pub fn unlink_amenity(&mut self, amenity_id: &str) -> bool {
        self.amenity_ids.remove(amenity_id)
    }

    pub fn apply(&mut self, patch: PlacePatch) {
        let PlacePatch {
            name,
            description,
            number_rooms,
            number_bathrooms,
            max_guest,
            price_by_night,
            latitude,
            longitude,
        } = patch;

        if let Some(v) = name {
            self.name = v;
        }
        if let Some(v) = description {
            self.description = v;
        }
        if let Some(v) = number_rooms {
            self.number_rooms = v;
        }
        if let Some(v) = number_bathrooms {
            self.number_bathrooms = v;
        }
        if let Some(v) = max_guest {
            self.max_guest = v;
        }
        if let Some(v) = price_by_night {
            self.price_by_night = v;
        }
        if let Some(v) = latitude {
            self.latitude = v;
        }
        if let Some(v) = longitude {
            self.longitude = v;
        }
    }
}

/// Updatable Place fields (`city_id`, `user_id` and amenity links are not)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlacePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub number_rooms: Option<i64>,
    pub number_bathrooms: Option<i64>,
    pub max_guest: Option<i64>,
    pub price_by_night: Option<i64>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}
