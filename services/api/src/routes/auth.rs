//! Registration, login, token refresh and logout

use auth::models::{LoginCredentials, NewUser, Role, UserResponse};
use axum::{
    Json,
    extract::{Query, State},
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::JsonBody;
use crate::{
    error::{ApiError, ApiResult},
    middleware::{Authorized, Member},
    response::ApiResponse,
    state::AppState,
};

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub access_token: String,
    pub access_token_expiry: i64,
    pub refresh_token: String,
    pub refresh_token_expiry: i64,
    pub token_type: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct RefreshParams {
    #[serde(default)]
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_expiry: i64,
}

/// Self-service registration, always with the `user` role
pub async fn register(
    State(state): State<AppState>,
    WithRejection(Json(payload), _): JsonBody<NewUser>,
) -> ApiResult<ApiResponse<UserResponse>> {
    let user = state.users().create(&payload, Role::User).await?;
    info!("Registered user {:?}", user.id);
    Ok(ApiResponse::ok(user.into()))
}

pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(credentials), _): JsonBody<LoginCredentials>,
) -> ApiResult<ApiResponse<LoginResponse>> {
    let session = state.sessions.login(&credentials).await?;

    Ok(ApiResponse::ok(LoginResponse {
        user: session.user.into(),
        access_token: session.access.token,
        access_token_expiry: session.access.expires_at,
        refresh_token: session.refresh.token,
        refresh_token_expiry: session.refresh.expires_at,
        token_type: "Bearer",
    }))
}

/// Exchange the stored refresh token for a new access token
pub async fn refresh(
    State(state): State<AppState>,
    WithRejection(Query(params), _): WithRejection<Query<RefreshParams>, ApiError>,
) -> ApiResult<ApiResponse<RefreshResponse>> {
    let token = params.refresh_token.trim();
    if token.is_empty() {
        return Err(ApiError::BadRequest("refresh_token is required".to_string()));
    }

    let access = state.sessions.refresh(token).await?;
    Ok(ApiResponse::ok(RefreshResponse {
        access_token: access.token,
        token_expiry: access.expires_at,
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    auth: Authorized<Member>,
) -> ApiResult<ApiResponse<&'static str>> {
    let user_id = auth
        .user_id()
        .ok_or_else(|| ApiError::Unauthorized("Missing Authorization Header".to_string()))?;
    state.sessions.logout(user_id).await?;
    Ok(ApiResponse::ok("Logged out"))
}
