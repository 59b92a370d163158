//! Review handlers

use super::{build, fetch, patch, persist, reference, remove, render, render_all, require, Dict};
use crate::error::{ApiError, ApiResult};
use crate::extractors::JsonBody;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use hbnb_core::relations::reviews_of_place;
use hbnb_core::{Place, Review, ReviewPatch, User};
use serde_json::Value;

pub async fn list_of_place(
    State(state): State<AppState>,
    Path(place_id): Path<String>,
) -> ApiResult<Json<Vec<Dict>>> {
    let place = fetch::<Place>(&state, &place_id).await?;
    render_all(reviews_of_place(state.storage.as_ref(), &place.base.id).await?)
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Dict>> {
    Ok(Json(render(fetch::<Review>(&state, &id).await?)?))
}

pub async fn create(
    State(state): State<AppState>,
    Path(place_id): Path<String>,
    body: Result<JsonBody, ApiError>,
) -> ApiResult<(StatusCode, Json<Dict>)> {
    let _gate = state.write_gate().await;
    let place = fetch::<Place>(&state, &place_id).await?;
    let JsonBody(mut fields) = body?;

    let user_id = reference(&fields, "user_id")?;
    let author = fetch::<User>(&state, user_id).await?;
    require(&fields, &["text"])?;

    fields.insert("place_id".to_string(), Value::from(place.base.id));
    fields.insert("user_id".to_string(), Value::from(author.base.id));

    let created = persist(&state, build::<Review>(fields)?).await?;
    Ok((StatusCode::CREATED, Json(render(created)?)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<JsonBody, ApiError>,
) -> ApiResult<Json<Dict>> {
    let _gate = state.write_gate().await;
    let mut review = fetch::<Review>(&state, &id).await?;
    let JsonBody(fields) = body?;

    review.apply(patch::<ReviewPatch>(fields)?);
    Ok(Json(render(persist(&state, review).await?)?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Dict>> {
    let _gate = state.write_gate().await;
    let review = fetch::<Review>(&state, &id).await?;
    remove(&state, review).await
}
