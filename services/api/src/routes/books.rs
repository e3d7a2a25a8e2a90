//! Book routes

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use axum_extra::extract::WithRejection;
use common::{json::to_json, query::Page};
use serde_json::Value;

use super::{IdPath, JsonBody, ListParams, object_id};
use crate::{
    error::ApiResult,
    middleware::{Admin, Anyone, Authorized},
    models::{NewBook, UpdateBook},
    response::ApiResponse,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/books", get(list).post(create))
        .route("/books/:id", get(fetch).patch(update).delete(remove))
}

/// Paginated books with image, course and available editions
async fn list(
    State(state): State<AppState>,
    _auth: Authorized<Anyone>,
    WithRejection(Query(query), _): ListParams,
) -> ApiResult<ApiResponse<Page<Value>>> {
    let page = state.books.list(&query).await?;
    Ok(ApiResponse::ok(page.into_json()))
}

async fn fetch(
    State(state): State<AppState>,
    _auth: Authorized<Anyone>,
    WithRejection(Path(id), _): IdPath,
) -> ApiResult<ApiResponse<Value>> {
    let book = state.books.find_by_id(object_id(&id)?).await?;
    Ok(ApiResponse::ok(to_json(&book)?))
}

async fn create(
    State(state): State<AppState>,
    auth: Authorized<Admin>,
    WithRejection(Json(payload), _): JsonBody<NewBook>,
) -> ApiResult<ApiResponse<Value>> {
    let book = state
        .books
        .create(payload.into_book(auth.user_id())?)
        .await?;
    Ok(ApiResponse::ok(to_json(&book)?))
}

async fn update(
    State(state): State<AppState>,
    _auth: Authorized<Admin>,
    WithRejection(Path(id), _): IdPath,
    WithRejection(Json(payload), _): JsonBody<UpdateBook>,
) -> ApiResult<ApiResponse<Value>> {
    let book = state
        .books
        .update(object_id(&id)?, payload.into_set()?)
        .await?;
    Ok(ApiResponse::ok(to_json(&book)?))
}

async fn remove(
    State(state): State<AppState>,
    _auth: Authorized<Admin>,
    WithRejection(Path(id), _): IdPath,
) -> ApiResult<ApiResponse<&'static str>> {
    state.books.delete(object_id(&id)?).await?;
    Ok(ApiResponse::ok("Book deleted"))
}
