//! Course routes

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
    models::{NewCourse, UpdateCourse},
    response::ApiResponse,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/courses", get(list).post(create))
        .route("/courses/:id", get(fetch).patch(update).delete(remove))
}

/// Paginated courses with their image
async fn list(
    State(state): State<AppState>,
    _auth: Authorized<Anyone>,
    WithRejection(Query(query), _): ListParams,
) -> ApiResult<ApiResponse<Page<Value>>> {
    let page = state.courses.list(&query).await?;
    Ok(ApiResponse::ok(page.into_json()))
}

async fn fetch(
    State(state): State<AppState>,
    _auth: Authorized<Anyone>,
    WithRejection(Path(id), _): IdPath,
) -> ApiResult<ApiResponse<Value>> {
    let course = state.courses.find_by_id(object_id(&id)?).await?;
    Ok(ApiResponse::ok(to_json(&course)?))
}

async fn create(
    State(state): State<AppState>,
    auth: Authorized<Admin>,
    WithRejection(Json(payload), _): JsonBody<NewCourse>,
) -> ApiResult<ApiResponse<Value>> {
    let course = state
        .courses
        .create(payload.into_course(auth.user_id())?)
        .await?;
    Ok(ApiResponse::ok(to_json(&course)?))
}

async fn update(
    State(state): State<AppState>,
    _auth: Authorized<Admin>,
    WithRejection(Path(id), _): IdPath,
    WithRejection(Json(payload), _): JsonBody<UpdateCourse>,
) -> ApiResult<ApiResponse<Value>> {
    let course = state
        .courses
        .update(object_id(&id)?, payload.into_set()?)
        .await?;
    Ok(ApiResponse::ok(to_json(&course)?))
}

async fn remove(
    State(state): State<AppState>,
    _auth: Authorized<Admin>,
    WithRejection(Path(id), _): IdPath,
) -> ApiResult<ApiResponse<&'static str>> {
    state.courses.delete(object_id(&id)?).await?;
    Ok(ApiResponse::ok("Course deleted"))
}
