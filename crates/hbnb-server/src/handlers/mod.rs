//! HTTP handlers

pub mod amenities;
pub mod cities;
pub mod index;
pub mod place_amenities;
pub mod places;
pub mod reviews;
pub mod states;
pub mod users;

pub use index::{not_found, stats, status};

use crate::error::{ApiError, ApiResult};
use crate::AppState;
use axum::Json;
use hbnb_core::relations::get_of;
use hbnb_core::{Entity, HbnbError, Model};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// One rendered entity
pub type Dict = Map<String, Value>;

/// Look up `id` as an `M`, or 404.
pub(crate) async fn fetch<M: Model>(state: &AppState, id: &str) -> ApiResult<M> {
    get_of::<M, _>(state.storage.as_ref(), id)
        .await?
        .ok_or(ApiError::NotFound)
}

pub(crate) fn render<M: Model>(model: M) -> ApiResult<Dict> {
    let entity: Entity = model.into();
    Ok(entity.to_public_dict().map_err(HbnbError::from)?)
}

pub(crate) fn render_all<M: Model>(models: Vec<M>) -> ApiResult<Json<Vec<Dict>>> {
    models
        .into_iter()
        .map(render)
        .collect::<ApiResult<Vec<_>>>()
        .map(Json)
}

/// 400 `Missing <key>` for the first absent key.
pub(crate) fn require(fields: &Dict, keys: &[&str]) -> ApiResult<()> {
    match keys.iter().find(|key| !fields.contains_key(**key)) {
        Some(key) => Err(ApiError::bad_request(format!("Missing {}", key))),
        None => Ok(()),
    }
}

/// String value of a required reference field.
pub(crate) fn reference<'a>(fields: &'a Dict, key: &str) -> ApiResult<&'a str> {
    require(fields, &[key])?;
    fields
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::bad_request(format!("{} must be a string", key)))
}

/// Parse the updatable subset of `fields`; keys outside it are ignored.
pub(crate) fn patch<P: DeserializeOwned>(fields: Dict) -> ApiResult<P> {
    serde_json::from_value(Value::Object(fields))
        .map_err(|e| ApiError::bad_request(format!("Invalid field: {}", e)))
}

/// Fresh `M` from client fields; identity and timestamps are generated.
pub(crate) fn build<M: Model>(fields: Dict) -> ApiResult<M> {
    let entity = Entity::create(M::KIND, fields).map_err(|e| ApiError::bad_request(e.to_string()))?;
    M::from_entity(entity).ok_or_else(|| ApiError::Internal(format!("Expected a {}", M::KIND)))
}

/// Stage `model`, save, and return it as stored.
pub(crate) async fn persist<M: Model>(state: &AppState, model: M) -> ApiResult<M> {
    let id = model.id().to_string();
    state.storage.new(model.into()).await?;
    state.storage.save().await?;

    get_of::<M, _>(state.storage.as_ref(), &id)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("{}.{} vanished after save", M::KIND, id)))
}

/// Delete `model` with its dependents and save; renders as `{}`.
pub(crate) async fn remove<M: Model>(state: &AppState, model: M) -> ApiResult<Json<Dict>> {
    let entity: Entity = model.into();
    state.storage.delete(&entity).await?;
    state.storage.save().await?;
    Ok(Json(Dict::new()))
}
