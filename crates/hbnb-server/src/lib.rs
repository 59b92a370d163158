//! HBNB API server
//!
//! REST surface over the entity store, backed by either a JSON file or an
//! embedded SQLite database.

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod services;
pub mod storage;

use axum::{
    routing::{get, post},
    Router,
};
use hbnb_core::Storage;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    write_gate: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            write_gate: Arc::new(Mutex::new(())),
        }
    }

    /// Serializes read-modify-save sequences.
    ///
    /// The storage keeps one unit of work per instance, so a writer holds
    /// this from its first lookup until its `save` returns.
    pub async fn write_gate(&self) -> MutexGuard<'_, ()> {
        self.write_gate.lock().await
    }
}

/// Full router: `/api/v1` routes, JSON 404 fallback, CORS and request tracing.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes())
        .fallback(handlers::not_found)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn api_routes() -> Router<AppState> {
    use handlers::{amenities, cities, place_amenities, places, reviews, states, users};

    Router::new()
        .route("/status", get(handlers::status))
        .route("/stats", get(handlers::stats))
        .route("/states", get(states::list).post(states::create))
        .route(
            "/states/:id",
            get(states::get).put(states::update).delete(states::delete),
        )
        .route(
            "/states/:id/cities",
            get(cities::list_of_state).post(cities::create),
        )
        .route(
            "/cities/:id",
            get(cities::get).put(cities::update).delete(cities::delete),
        )
        .route(
            "/cities/:id/places",
            get(places::list_of_city).post(places::create),
        )
        .route("/amenities", get(amenities::list).post(amenities::create))
        .route(
            "/amenities/:id",
            get(amenities::get)
                .put(amenities::update)
                .delete(amenities::delete),
        )
        .route("/users", get(users::list).post(users::create))
        .route(
            "/users/:id",
            get(users::get).put(users::update).delete(users::delete),
        )
        .route(
            "/places/:id",
            get(places::get).put(places::update).delete(places::delete),
        )
        .route("/places_search", post(places::search))
        .route(
            "/places/:id/reviews",
            get(reviews::list_of_place).post(reviews::create),
        )
        .route(
            "/reviews/:id",
            get(reviews::get).put(reviews::update).delete(reviews::delete),
        )
        .route("/places/:id/amenities", get(place_amenities::list))
        .route(
            "/places/:id/amenities/:amenity_id",
            post(place_amenities::link).delete(place_amenities::unlink),
        )
}
