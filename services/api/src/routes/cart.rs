//! Cart routes
//!
//! Readers work on their own cart only. Admins see every cart and may add
//! items on behalf of a user by naming `user_id`.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use axum_extra::extract::WithRejection;
use common::{json::to_json, query::Page};
use mongodb::bson::oid::ObjectId;
use serde_json::Value;

use super::{IdPath, JsonBody, ListParams, object_id};
use crate::{
    error::{ApiError, ApiResult},
    middleware::{Authorized, Member},
    models::{NewCartItem, UpdateCartItem, parse_ref},
    response::ApiResponse,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cart", get(list).post(create))
        .route("/cart/:id", get(fetch).patch(update).delete(remove))
}

/// Owner filter for the acting user, `None` for admins
fn owner(auth: &Authorized<Member>) -> ApiResult<Option<ObjectId>> {
    if auth.is_admin() {
        return Ok(None);
    }
    auth.user_id()
        .map(Some)
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization Header".to_string()))
}

async fn list(
    State(state): State<AppState>,
    auth: Authorized<Member>,
    WithRejection(Query(query), _): ListParams,
) -> ApiResult<ApiResponse<Page<Value>>> {
    let page = state.cart_items.list(&query, owner(&auth)?).await?;
    Ok(ApiResponse::ok(page.into_json()))
}

async fn fetch(
    State(state): State<AppState>,
    auth: Authorized<Member>,
    WithRejection(Path(id), _): IdPath,
) -> ApiResult<ApiResponse<Value>> {
    let item = state
        .cart_items
        .find_by_id(object_id(&id)?, owner(&auth)?)
        .await?;
    Ok(ApiResponse::ok(to_json(&item)?))
}

async fn create(
    State(state): State<AppState>,
    auth: Authorized<Member>,
    WithRejection(Json(payload), _): JsonBody<NewCartItem>,
) -> ApiResult<ApiResponse<Value>> {
    let acting = auth
        .user_id()
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization Header".to_string()))?;
    let for_user = match owner(&auth)? {
        Some(own) => own,
        None => parse_ref("user_id", payload.user_id.as_deref())?.unwrap_or(acting),
    };

    let item = state
        .cart_items
        .create(payload.into_cart_item(for_user, acting)?)
        .await?;
    Ok(ApiResponse::ok(to_json(&item)?))
}

async fn update(
    State(state): State<AppState>,
    auth: Authorized<Member>,
    WithRejection(Path(id), _): IdPath,
    WithRejection(Json(payload), _): JsonBody<UpdateCartItem>,
) -> ApiResult<ApiResponse<Value>> {
    let item = state
        .cart_items
        .update(object_id(&id)?, owner(&auth)?, payload.into_set()?)
        .await?;
    Ok(ApiResponse::ok(to_json(&item)?))
}

async fn remove(
    State(state): State<AppState>,
    auth: Authorized<Member>,
    WithRejection(Path(id), _): IdPath,
) -> ApiResult<ApiResponse<&'static str>> {
    state
        .cart_items
        .delete(object_id(&id)?, owner(&auth)?)
        .await?;
    Ok(ApiResponse::ok("Cart item deleted"))
}
