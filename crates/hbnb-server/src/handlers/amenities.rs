//! Amenity handlers

use super::{build, fetch, patch, persist, remove, render, render_all, require, Dict};
use crate::error::{ApiError, ApiResult};
use crate::extractors::JsonBody;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use hbnb_core::relations::all_of;
use hbnb_core::{Amenity, AmenityPatch};

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Dict>>> {
    render_all(all_of::<Amenity, _>(state.storage.as_ref()).await?)
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Dict>> {
    Ok(Json(render(fetch::<Amenity>(&state, &id).await?)?))
}

pub async fn create(
    State(state): State<AppState>,
    body: Result<JsonBody, ApiError>,
) -> ApiResult<(StatusCode, Json<Dict>)> {
    let _gate = state.write_gate().await;
    let JsonBody(fields) = body?;
    require(&fields, &["name"])?;

    let created = persist(&state, build::<Amenity>(fields)?).await?;
    Ok((StatusCode::CREATED, Json(render(created)?)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<JsonBody, ApiError>,
) -> ApiResult<Json<Dict>> {
    let _gate = state.write_gate().await;
    let mut amenity = fetch::<Amenity>(&state, &id).await?;
    let JsonBody(fields) = body?;

    amenity.apply(patch::<AmenityPatch>(fields)?);
    Ok(Json(render(persist(&state, amenity).await?)?))
}

/// Also detaches the amenity from every place linking it.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Dict>> {
    let _gate = state.write_gate().await;
    let amenity = fetch::<Amenity>(&state, &id).await?;
    remove(&state, amenity).await
}
