//! Feed routes

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
    models::{NewFeed, UpdateFeed},
    response::ApiResponse,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/feeds", get(list).post(create))
        .route("/feeds/:id", get(fetch).patch(update).delete(remove))
}

/// Paginated feeds with every section resolved
async fn list(
    State(state): State<AppState>,
    _auth: Authorized<Anyone>,
    WithRejection(Query(query), _): ListParams,
) -> ApiResult<ApiResponse<Page<Value>>> {
    let page = state.feeds.list(&query).await?;
    Ok(ApiResponse::ok(page.into_json()))
}

async fn fetch(
    State(state): State<AppState>,
    _auth: Authorized<Anyone>,
    WithRejection(Path(id), _): IdPath,
) -> ApiResult<ApiResponse<Value>> {
    let feed = state.feeds.find_by_id(object_id(&id)?).await?;
    Ok(ApiResponse::ok(to_json(&feed)?))
}

async fn create(
    State(state): State<AppState>,
    auth: Authorized<Admin>,
    WithRejection(Json(payload), _): JsonBody<NewFeed>,
) -> ApiResult<ApiResponse<Value>> {
    let feed = state
        .feeds
        .create(payload.into_feed(auth.user_id())?)
        .await?;
    Ok(ApiResponse::ok(to_json(&feed)?))
}

async fn update(
    State(state): State<AppState>,
    _auth: Authorized<Admin>,
    WithRejection(Path(id), _): IdPath,
    WithRejection(Json(payload), _): JsonBody<UpdateFeed>,
) -> ApiResult<ApiResponse<Value>> {
    let feed = state
        .feeds
        .update(object_id(&id)?, payload.into_set()?)
        .await?;
    Ok(ApiResponse::ok(to_json(&feed)?))
}

async fn remove(
    State(state): State<AppState>,
    _auth: Authorized<Admin>,
    WithRejection(Path(id), _): IdPath,
) -> ApiResult<ApiResponse<&'static str>> {
    state.feeds.delete(object_id(&id)?).await?;
    Ok(ApiResponse::ok("Feed deleted"))
}
