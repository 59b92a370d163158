//! Service status and object counts

use crate::error::{ApiError, ApiResult};
use crate::AppState;
use axum::{extract::State, Json};
use hbnb_core::EntityKind;
use serde_json::{json, Value};
use std::collections::BTreeMap;

pub async fn status() -> Json<Value> {
    Json(json!({ "status": "OK" }))
}

/// Number of stored objects per collection.
pub async fn stats(
    State(state): State<AppState>,
) -> ApiResult<Json<BTreeMap<&'static str, usize>>> {
    let mut stats = BTreeMap::new();
    for kind in EntityKind::ALL {
        stats.insert(kind.collection(), state.storage.count(Some(kind)).await?);
    }
    Ok(Json(stats))
}

pub async fn not_found() -> ApiError {
    ApiError::NotFound
}
