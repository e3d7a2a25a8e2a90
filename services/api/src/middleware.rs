//! Authentication middleware and role checks
//!
//! [`auth_middleware`] resolves the bearer token, if any, to a stored user
//! and leaves it in the request extensions as [`CurrentUser`]. Handlers then
//! declare the roles they accept through the [`Authorized`] extractor.

use auth::models::{Role, User};
use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{Authorization, HeaderMapExt, authorization::Bearer};
use std::marker::PhantomData;
use tracing::debug;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

/// The user behind the request's access token, `None` when no token was sent
#[derive(Debug, Clone, Default)]
pub struct CurrentUser(pub Option<User>);

/// Bearer token of the request
///
/// A missing header is fine; a header that is not a bearer credential is not.
fn bearer_token(headers: &HeaderMap) -> ApiResult<Option<String>> {
    if !headers.contains_key(AUTHORIZATION) {
        return Ok(None);
    }

    headers
        .typed_get::<Authorization<Bearer>>()
        .map(|Authorization(bearer)| Some(bearer.token().to_string()))
        .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization Header".to_string()))
}

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = match bearer_token(req.headers())? {
        Some(token) => {
            let user = state.sessions.authenticate(&token).await?;
            debug!("Authenticated user {:?} as {}", user.id, user.role);
            Some(user)
        }
        None => None,
    };

    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

/// Roles a route accepts; an empty set also admits anonymous callers
pub trait RoleSet: Send + Sync + 'static {
    const ROLES: &'static [Role];
}

pub struct Admin;
pub struct Member;
pub struct Anyone;

impl RoleSet for Admin {
    const ROLES: &'static [Role] = &[Role::Admin];
}

impl RoleSet for Member {
    const ROLES: &'static [Role] = &[Role::Admin, Role::User];
}

impl RoleSet for Anyone {
    const ROLES: &'static [Role] = &[];
}

/// Check `user` against `roles` before a handler runs
pub fn authorize(roles: &[Role], user: Option<User>) -> ApiResult<Option<User>> {
    if roles.is_empty() {
        return Ok(user);
    }

    let user =
        user.ok_or_else(|| ApiError::Unauthorized("Missing Authorization Header".to_string()))?;
    if roles.contains(&user.role) {
        Ok(Some(user))
    } else {
        Err(ApiError::Forbidden("Forbidden Access".to_string()))
    }
}

/// Extractor that admits only users holding one of `R::ROLES`
pub struct Authorized<R: RoleSet> {
    user: Option<User>,
    _roles: PhantomData<R>,
}

impl<R: RoleSet> Authorized<R> {
    /// The acting user; always present when `R` is not empty
    pub fn user(&self) -> ApiResult<&User> {
        self.user
            .as_ref()
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization Header".to_string()))
    }

    pub fn user_opt(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn user_id(&self) -> Option<mongodb::bson::oid::ObjectId> {
        self.user.as_ref().and_then(|user| user.id)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.user.as_ref().map(|u| u.role), Some(Role::Admin))
    }
}

#[async_trait]
impl<S, R> FromRequestParts<S> for Authorized<R>
where
    S: Send + Sync,
    R: RoleSet,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let current = parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .unwrap_or_default();

        Ok(Self {
            user: authorize(R::ROLES, current.0)?,
            _roles: PhantomData,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth::models::Verified;
    use axum::http::HeaderValue;
    use mongodb::bson::oid::ObjectId;

    fn user(role: Role) -> User {
        User {
            id: Some(ObjectId::new()),
            role,
            name: "Reader".to_string(),
            phone: "9876543210".to_string(),
            email: "reader@example.com".to_string(),
            password: String::new(),
            location: Vec::new(),
            address: String::new(),
            city: String::new(),
            state: String::new(),
            pincode: String::new(),
            refresh_token: None,
            refresh_token_expiry: None,
            verified: Verified::default(),
            created_on: 0,
            updated_on: 0,
        }
    }

    #[test]
    fn empty_role_set_admits_anonymous_callers() {
        assert!(authorize(Anyone::ROLES, None).unwrap().is_none());
        assert!(authorize(Anyone::ROLES, Some(user(Role::User))).unwrap().is_some());
    }

    #[test]
    fn protected_routes_need_a_user() {
        let err = authorize(Member::ROLES, None).unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[test]
    fn wrong_role_is_forbidden() {
        let err = authorize(Admin::ROLES, Some(user(Role::User))).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
        assert!(authorize(Admin::ROLES, Some(user(Role::Admin))).is_ok());
        assert!(authorize(Member::ROLES, Some(user(Role::User))).is_ok());
    }

    #[test]
    fn bearer_header_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(bearer_token(&headers).unwrap(), None);

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(bearer_token(&headers).unwrap().as_deref(), Some("abc.def.ghi"));

        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));
        assert!(matches!(
            bearer_token(&headers),
            Err(ApiError::Unauthorized(_))
        ));
    }
}
