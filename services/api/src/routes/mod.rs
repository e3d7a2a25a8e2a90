//! HTTP routes
//!
//! Public routes (health and the credential exchanges) skip the auth
//! middleware. Everything else runs behind it, and each handler declares
//! the roles it accepts through its [`Authorized`](crate::middleware::Authorized)
//! extractor.

use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Path, Query, State},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::WithRejection;
use common::{
    database::{health_check as ping, parse_object_id},
    query::ListQuery,
};
use mongodb::bson::oid::ObjectId;
use serde_json::json;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::warn;

use crate::{
    error::{ApiError, ApiResult},
    middleware::auth_middleware,
    state::AppState,
    upload::ASSETS_PREFIX,
};

pub mod auth;
pub mod books;
pub mod cart;
pub mod courses;
pub mod feeds;
pub mod media;
pub mod stocks;
pub mod users;

/// JSON body whose rejection still renders the error envelope
pub type JsonBody<T> = WithRejection<Json<T>, ApiError>;
pub type ListParams = WithRejection<Query<ListQuery>, ApiError>;
pub type IdPath = WithRejection<Path<String>, ApiError>;

/// Parse the `:id` path segment
pub fn object_id(raw: &str) -> ApiResult<ObjectId> {
    Ok(parse_object_id("id", raw)?)
}

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    // Multipart framing on top of the largest accepted file.
    let body_limit = state.storage.max_size() + 64 * 1024;
    let assets = ServeDir::new(state.storage.dir());

    let public = Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", get(auth::refresh));

    let protected = Router::new()
        .route("/auth/logout", get(auth::logout))
        .merge(users::router())
        .merge(books::router())
        .merge(courses::router())
        .merge(stocks::router())
        .merge(cart::router())
        .merge(media::router())
        .merge(feeds::router())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .nest_service(ASSETS_PREFIX, assets)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let status = match ping(&state.db).await {
        Ok(true) => "ok",
        Ok(false) => "degraded",
        Err(e) => {
            warn!("Health check failed: {}", e);
            "degraded"
        }
    };

    Json(json!({
        "status": status,
        "service": "booksland",
    }))
}
