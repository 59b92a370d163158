//! Typed lookups and relationship traversal over any backend

use crate::{Result, Storage};
use hbnb_types::{Amenity, City, Model, Place, Review};

/// Every entity of type `M`, in key (creation) order.
pub async fn all_of<M, S>(storage: &S) -> Result<Vec<M>>
where
    M: Model,
    S: Storage + ?Sized,
{
    Ok(storage
        .all(Some(M::KIND))
        .await?
        .into_values()
        .filter_map(M::from_entity)
        .collect())
}

pub async fn get_of<M, S>(storage: &S, id: &str) -> Result<Option<M>>
where
    M: Model,
    S: Storage + ?Sized,
{
    Ok(storage.get(M::KIND, id).await?.and_then(M::from_entity))
}

pub async fn cities_of_state<S: Storage + ?Sized>(
    storage: &S,
    state_id: &str,
) -> Result<Vec<City>> {
    let mut cities = all_of::<City, _>(storage).await?;
    cities.retain(|c| c.state_id == state_id);
    Ok(cities)
}

pub async fn places_of_city<S: Storage + ?Sized>(storage: &S, city_id: &str) -> Result<Vec<Place>> {
    let mut places = all_of::<Place, _>(storage).await?;
    places.retain(|p| p.city_id == city_id);
    Ok(places)
}

pub async fn places_of_user<S: Storage + ?Sized>(storage: &S, user_id: &str) -> Result<Vec<Place>> {
    let mut places = all_of::<Place, _>(storage).await?;
    places.retain(|p| p.user_id == user_id);
    Ok(places)
}

pub async fn reviews_of_place<S: Storage + ?Sized>(
    storage: &S,
    place_id: &str,
) -> Result<Vec<Review>> {
    let mut reviews = all_of::<Review, _>(storage).await?;
    reviews.retain(|r| r.place_id == place_id);
    Ok(reviews)
}

pub async fn reviews_of_user<S: Storage + ?Sized>(
    storage: &S,
    user_id: &str,
) -> Result<Vec<Review>> {
    let mut reviews = all_of::<Review, _>(storage).await?;
    reviews.retain(|r| r.user_id == user_id);
    Ok(reviews)
}

/// Amenities linked to `place`; links to amenities that no longer exist are skipped.
pub async fn amenities_of_place<S: Storage + ?Sized>(
    storage: &S,
    place: &Place,
) -> Result<Vec<Amenity>> {
    let mut amenities = all_of::<Amenity, _>(storage).await?;
    amenities.retain(|a| place.has_amenity(a.id()));
    Ok(amenities)
}
