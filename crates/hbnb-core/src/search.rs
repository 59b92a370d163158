//! Places search
//!
//! Candidates come from the `states` pass then the `cities` pass; an
//! `amenities` filter then keeps only places linking every known amenity.

use crate::relations::all_of;
use crate::{Result, Storage};
use hbnb_types::{City, Entity, EntityKind, Place};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Search request; every dimension is optional
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchFilter {
    #[serde(default)]
    pub states: Option<Vec<String>>,
    #[serde(default)]
    pub cities: Option<Vec<String>>,
    #[serde(default)]
    pub amenities: Option<Vec<String>>,
}

impl SearchFilter {
    pub fn states(&self) -> &[String] {
        self.states.as_deref().unwrap_or_default()
    }

    pub fn cities(&self) -> &[String] {
        self.cities.as_deref().unwrap_or_default()
    }

    pub fn amenities(&self) -> &[String] {
        self.amenities.as_deref().unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.states().is_empty() && self.cities().is_empty() && self.amenities().is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub places: Vec<Place>,
    /// Set when an amenity filter ran; rendering then drops `amenity_ids`
    pub amenity_filtered: bool,
}

impl SearchResult {
    pub fn ids(&self) -> Vec<&str> {
        self.places.iter().map(|p| p.base.id.as_str()).collect()
    }

    /// Client-facing dictionaries for the matched places.
    pub fn to_dicts(&self) -> Result<Vec<Map<String, Value>>> {
        self.places
            .iter()
            .map(|place| {
                let mut dict = Entity::Place(place.clone()).to_public_dict()?;
                if self.amenity_filtered {
                    dict.remove("amenity_ids");
                }
                Ok(dict)
            })
            .collect()
    }
}

pub async fn places_search<S: Storage + ?Sized>(
    storage: &S,
    filter: &SearchFilter,
) -> Result<SearchResult> {
    let places = all_of::<Place, _>(storage).await?;

    if filter.is_empty() {
        return Ok(SearchResult {
            places,
            amenity_filtered: false,
        });
    }

    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    if !filter.states().is_empty() {
        let cities = all_of::<City, _>(storage).await?;
        for state_id in filter.states() {
            for city in cities.iter().filter(|c| &c.state_id == state_id) {
                for place in places.iter().filter(|p| p.city_id == city.base.id) {
                    if seen.insert(place.base.id.clone()) {
                        candidates.push(place.clone());
                    }
                }
            }
        }
    }

    for city_id in filter.cities() {
        for place in places.iter().filter(|p| &p.city_id == city_id) {
            if seen.insert(place.base.id.clone()) {
                candidates.push(place.clone());
            }
        }
    }

    if filter.amenities().is_empty() {
        return Ok(SearchResult {
            places: candidates,
            amenity_filtered: false,
        });
    }

    if filter.states().is_empty() && filter.cities().is_empty() {
        candidates = places;
    }

    let mut required = Vec::new();
    for amenity_id in filter.amenities() {
        if storage.get(EntityKind::Amenity, amenity_id).await?.is_some() {
            required.push(amenity_id.as_str());
        } else {
            tracing::debug!("Skipping unknown amenity in search: {}", amenity_id);
        }
    }
    candidates.retain(|place| required.iter().all(|id| place.has_amenity(id)));

    Ok(SearchResult {
        places: candidates,
        amenity_filtered: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_accepts_missing_and_null_keys() {
        let filter: SearchFilter =
            serde_json::from_value(json!({ "states": null, "cities": ["c1"] })).unwrap();
        assert!(filter.states().is_empty());
        assert_eq!(filter.cities(), ["c1".to_string()]);
        assert!(filter.amenities().is_empty());
        assert!(!filter.is_empty());

        let empty: SearchFilter =
            serde_json::from_value(json!({ "states": [], "cities": [], "amenities": [] })).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_rendering_drops_links_only_after_amenity_filter() {
        let mut place = Place::new("c1", "u1", "Loft");
        place.link_amenity("a1");

        let plain = SearchResult {
            places: vec![place.clone()],
            amenity_filtered: false,
        };
        assert!(plain.to_dicts().unwrap()[0].contains_key("amenity_ids"));

        let filtered = SearchResult {
            places: vec![place],
            amenity_filtered: true,
        };
        let dict = &filtered.to_dicts().unwrap()[0];
        assert!(!dict.contains_key("amenity_ids"));
        assert_eq!(dict["name"], "Loft");
    }
}
