//! User handlers
//!
//! Passwords are stored as Argon2 hashes and never rendered.

use super::{build, fetch, patch, persist, remove, render, render_all, require, Dict};
use crate::error::{ApiError, ApiResult};
use crate::extractors::JsonBody;
use crate::services::{hash_password, verify_password};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use hbnb_core::relations::all_of;
use hbnb_core::{User, UserPatch};
use serde_json::Value;

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Dict>>> {
    render_all(all_of::<User, _>(state.storage.as_ref()).await?)
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<Dict>> {
    Ok(Json(render(fetch::<User>(&state, &id).await?)?))
}

pub async fn create(
    State(state): State<AppState>,
    body: Result<JsonBody, ApiError>,
) -> ApiResult<(StatusCode, Json<Dict>)> {
    let _gate = state.write_gate().await;
    let JsonBody(mut fields) = body?;
    require(&fields, &["email", "password"])?;

    let password = fields
        .get("password")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::bad_request("password must be a string"))?;
    let password_hash = hash_password(password)?;
    fields.insert("password".to_string(), Value::from(password_hash));

    let created = persist(&state, build::<User>(fields)?).await?;
    tracing::info!("Registered user {}", created.base.id);
    Ok((StatusCode::CREATED, Json(render(created)?)))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<JsonBody, ApiError>,
) -> ApiResult<Json<Dict>> {
    let _gate = state.write_gate().await;
    let mut user = fetch::<User>(&state, &id).await?;
    let JsonBody(fields) = body?;

    let mut changes = patch::<UserPatch>(fields)?;
    if let Some(password) = changes.password.take() {
        // Re-submitting the current password keeps the stored hash
        if !verify_password(&password, &user.password).unwrap_or(false) {
            changes.password = Some(hash_password(&password)?);
        }
    }

    user.apply(changes);
    Ok(Json(render(persist(&state, user).await?)?))
}

/// Also removes the user's places and reviews.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Dict>> {
    let _gate = state.write_gate().await;
    let user = fetch::<User>(&state, &id).await?;
    remove(&state, user).await
}
