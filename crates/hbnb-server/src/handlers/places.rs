//! Place handlers and places search

use super::{build, fetch, patch, persist, reference, remove, render, render_all, require, Dict};
use crate::error::{ApiError, ApiResult};
use crate::extractors::JsonBody;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use hbnb_core::relations::places_of_city;
use hbnb_core::{places_search, City, Place, PlacePatch, SearchFilter, User};
use serde_json::Value;

pub async fn list_of_city(
    State(state): State<AppState>,
    Path(city_id): Path<String>,
) -> ApiResult<Json<Vec<Dict>>> {
    let city = fetch::<City>(&state, &city_id).await?;
    render_all(places_of_city(state.storage.as_ref(), &city.base.id).await?)
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Dict>> {
    Ok(Json(render(fetch::<Place>(&state, &id).await?)?))
}

pub async fn create(
    State(state): State<AppState>,
    Path(city_id): Path<String>,
    body: Result<JsonBody, ApiError>,
) -> ApiResult<(StatusCode, Json<Dict>)> {
    let _gate = state.write_gate().await;
    let city = fetch::<City>(&state, &city_id).await?;
    let JsonBody(mut fields) = body?;

    let user_id = reference(&fields, "user_id")?;
    let owner = fetch::<User>(&state, user_id).await?;
    require(&fields, &["name"])?;

    // Amenity links are only managed through /places/{id}/amenities
    fields.remove("amenity_ids");
    fields.insert("city_id".to_string(), Value::from(city.base.id));
    fields.insert("user_id".to_string(), Value::from(owner.base.id));

    let created = persist(&state, build::<Place>(fields)?).await?;
    Ok((StatusCode::CREATED, Json(render(created)?)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<JsonBody, ApiError>,
) -> ApiResult<Json<Dict>> {
    let _gate = state.write_gate().await;
    let mut place = fetch::<Place>(&state, &id).await?;
    let JsonBody(fields) = body?;

    place.apply(patch::<PlacePatch>(fields)?);
    Ok(Json(render(persist(&state, place).await?)?))
}

/// Also removes the place's reviews.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Dict>> {
    let _gate = state.write_gate().await;
    let place = fetch::<Place>(&state, &id).await?;
    remove(&state, place).await
}

/// `POST /places_search`; an empty object lists every place.
pub async fn search(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ApiResult<Json<Vec<Dict>>> {
    let filter: SearchFilter = match body {
        Ok(Json(value @ Value::Object(_))) => serde_json::from_value(value)
            .map_err(|e| ApiError::bad_request(format!("Invalid search filter: {}", e)))?,
        _ => return Err(ApiError::not_a_json()),
    };

    let result = places_search(state.storage.as_ref(), &filter).await?;
    tracing::debug!("places_search matched {} places", result.places.len());
    Ok(Json(result.to_dicts()?))
}
