//! User administration and the acting user's own profile

use auth::models::{ChangePassword, NewUser, Role, UpdateUser, UserResponse};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, patch},
};
use axum_extra::extract::WithRejection;
use common::query::{Page, Total};

use super::{IdPath, JsonBody, ListParams, object_id};
use crate::{
    error::ApiResult,
    middleware::{Admin, Authorized, Member},
    response::ApiResponse,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list).post(create))
        .route("/users/details", get(details))
        .route("/users/details/password", patch(change_password))
        .route("/users/:id", get(fetch).patch(update).delete(remove))
}

/// Admins may create users of any role
async fn create(
    State(state): State<AppState>,
    _auth: Authorized<Admin>,
    WithRejection(Json(payload), _): JsonBody<NewUser>,
) -> ApiResult<ApiResponse<UserResponse>> {
    let role = payload.role.unwrap_or(Role::User);
    let user = state.users().create(&payload, role).await?;
    Ok(ApiResponse::ok(user.into()))
}

async fn list(
    State(state): State<AppState>,
    _auth: Authorized<Admin>,
    WithRejection(Query(query), _): ListParams,
) -> ApiResult<ApiResponse<Page<UserResponse>>> {
    let (users, count) = state.users().list(query.skip(), query.limit()).await?;

    Ok(ApiResponse::ok(Page {
        docs: users.into_iter().map(UserResponse::from).collect(),
        total: Total {
            count: i64::try_from(count).unwrap_or(i64::MAX),
        },
    }))
}

async fn details(auth: Authorized<Member>) -> ApiResult<ApiResponse<UserResponse>> {
    Ok(ApiResponse::ok(auth.user()?.clone().into()))
}

async fn change_password(
    State(state): State<AppState>,
    auth: Authorized<Member>,
    WithRejection(Json(payload), _): JsonBody<ChangePassword>,
) -> ApiResult<ApiResponse<&'static str>> {
    state
        .users()
        .change_password(auth.user()?, &payload.password, &payload.new_password)
        .await?;
    Ok(ApiResponse::ok("Password updated"))
}

async fn fetch(
    State(state): State<AppState>,
    _auth: Authorized<Admin>,
    WithRejection(Path(id), _): IdPath,
) -> ApiResult<ApiResponse<UserResponse>> {
    let user = state
        .users()
        .find_by_id(object_id(&id)?)
        .await?
        .ok_or(auth::AuthError::UserNotFound)?;
    Ok(ApiResponse::ok(user.into()))
}

async fn update(
    State(state): State<AppState>,
    _auth: Authorized<Admin>,
    WithRejection(Path(id), _): IdPath,
    WithRejection(Json(payload), _): JsonBody<UpdateUser>,
) -> ApiResult<ApiResponse<UserResponse>> {
    let user = state.users().update(object_id(&id)?, payload).await?;
    Ok(ApiResponse::ok(user.into()))
}

async fn remove(
    State(state): State<AppState>,
    _auth: Authorized<Admin>,
    WithRejection(Path(id), _): IdPath,
) -> ApiResult<ApiResponse<&'static str>> {
    state.users().delete(object_id(&id)?).await?;
    Ok(ApiResponse::ok("User deleted"))
}
