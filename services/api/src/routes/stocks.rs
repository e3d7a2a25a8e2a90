//! Stock routes

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
    middleware::{Admin, Authorized},
    models::{NewStock, UpdateStock},
    response::ApiResponse,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/stocks", get(list).post(create))
        .route("/stocks/:id", get(fetch).patch(update).delete(remove))
}

/// Paginated stock records with their book and course
async fn list(
    State(state): State<AppState>,
    _auth: Authorized<Admin>,
    WithRejection(Query(query), _): ListParams,
) -> ApiResult<ApiResponse<Page<Value>>> {
    let page = state.stocks.list(&query).await?;
    Ok(ApiResponse::ok(page.into_json()))
}

async fn fetch(
    State(state): State<AppState>,
    _auth: Authorized<Admin>,
    WithRejection(Path(id), _): IdPath,
) -> ApiResult<ApiResponse<Value>> {
    let stock = state.stocks.find_by_id(object_id(&id)?).await?;
    Ok(ApiResponse::ok(to_json(&stock)?))
}

async fn create(
    State(state): State<AppState>,
    auth: Authorized<Admin>,
    WithRejection(Json(payload), _): JsonBody<NewStock>,
) -> ApiResult<ApiResponse<Value>> {
    let stock = state
        .stocks
        .create(payload.into_stock(auth.user_id())?)
        .await?;
    Ok(ApiResponse::ok(to_json(&stock)?))
}

async fn update(
    State(state): State<AppState>,
    _auth: Authorized<Admin>,
    WithRejection(Path(id), _): IdPath,
    WithRejection(Json(payload), _): JsonBody<UpdateStock>,
) -> ApiResult<ApiResponse<Value>> {
    let stock = state
        .stocks
        .update(object_id(&id)?, payload.into_set()?)
        .await?;
    Ok(ApiResponse::ok(to_json(&stock)?))
}

async fn remove(
    State(state): State<AppState>,
    _auth: Authorized<Admin>,
    WithRejection(Path(id), _): IdPath,
) -> ApiResult<ApiResponse<&'static str>> {
    state.stocks.delete(object_id(&id)?).await?;
    Ok(ApiResponse::ok("Stock deleted"))
}
