//! City handlers

use super::{build, fetch, patch, persist, remove, render, render_all, require, Dict};
use crate::error::{ApiError, ApiResult};
use crate::extractors::JsonBody;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use hbnb_core::relations::cities_of_state;
use hbnb_core::{City, CityPatch, State as StateModel};
use serde_json::Value;

/// Cities of one state; 404 when the state is unknown.
pub async fn list_of_state(
    State(state): State<AppState>,
    Path(state_id): Path<String>,
) -> ApiResult<Json<Vec<Dict>>> {
    let parent = fetch::<StateModel>(&state, &state_id).await?;
    render_all(cities_of_state(state.storage.as_ref(), &parent.base.id).await?)
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Dict>> {
    Ok(Json(render(fetch::<City>(&state, &id).await?)?))
}

pub async fn create(
    State(state): State<AppState>,
    Path(state_id): Path<String>,
    body: Result<JsonBody, ApiError>,
) -> ApiResult<(StatusCode, Json<Dict>)> {
    let _gate = state.write_gate().await;
    let parent = fetch::<StateModel>(&state, &state_id).await?;
    let JsonBody(mut fields) = body?;
    require(&fields, &["name"])?;

    fields.insert("state_id".to_string(), Value::from(parent.base.id));
    let created = persist(&state, build::<City>(fields)?).await?;
    Ok((StatusCode::CREATED, Json(render(created)?)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<JsonBody, ApiError>,
) -> ApiResult<Json<Dict>> {
    let _gate = state.write_gate().await;
    let mut city = fetch::<City>(&state, &id).await?;
    let JsonBody(fields) = body?;

    city.apply(patch::<CityPatch>(fields)?);
    Ok(Json(render(persist(&state, city).await?)?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Dict>> {
    let _gate = state.write_gate().await;
    let city = fetch::<City>(&state, &id).await?;
    remove(&state, city).await
}
