//! JSON object body extractor

use crate::error::ApiError;
use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde_json::{Map, Value};

/// A request body that is a non-empty JSON object.
///
/// Anything else (wrong content type, malformed JSON, arrays, `{}`) is
/// rejected with `400 Not a JSON`.
#[derive(Debug, Clone)]
pub struct JsonBody(pub Map<String, Value>);

#[async_trait]
impl<S> FromRequest<S> for JsonBody
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<Value>::from_request(req, state).await {
            Ok(Json(Value::Object(fields))) if !fields.is_empty() => Ok(JsonBody(fields)),
            Ok(_) => Err(ApiError::not_a_json()),
            Err(rejection) => {
                tracing::debug!("Rejected request body: {}", rejection);
                Err(ApiError::not_a_json())
            }
        }
    }
}
