//! Place ↔ Amenity links

use super::{fetch, persist, render, render_all, Dict};
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use hbnb_core::relations::amenities_of_place;
use hbnb_core::{Amenity, Place};

pub async fn list(
    State(state): State<AppState>,
    Path(place_id): Path<String>,
) -> ApiResult<Json<Vec<Dict>>> {
    let place = fetch::<Place>(&state, &place_id).await?;
    render_all(amenities_of_place(state.storage.as_ref(), &place).await?)
}

/// 201 when the link is new, 200 when it already existed.
pub async fn link(
    State(state): State<AppState>,
    Path((place_id, amenity_id)): Path<(String, String)>,
) -> ApiResult<(StatusCode, Json<Dict>)> {
    let _gate = state.write_gate().await;
    let mut place = fetch::<Place>(&state, &place_id).await?;
    let amenity = fetch::<Amenity>(&state, &amenity_id).await?;

    if !place.link_amenity(amenity.base.id.clone()) {
        return Ok((StatusCode::OK, Json(render(amenity)?)));
    }

    persist(&state, place).await?;
    Ok((StatusCode::CREATED, Json(render(amenity)?)))
}

/// 404 when the amenity exists but is not linked to the place.
pub async fn unlink(
    State(state): State<AppState>,
    Path((place_id, amenity_id)): Path<(String, String)>,
) -> ApiResult<Json<Dict>> {
    let _gate = state.write_gate().await;
    let mut place = fetch::<Place>(&state, &place_id).await?;
    let amenity = fetch::<Amenity>(&state, &amenity_id).await?;

    if !place.unlink_amenity(&amenity.base.id) {
        return Err(ApiError::NotFound);
    }

    persist(&state, place).await?;
    Ok(Json(Dict::new()))
}
