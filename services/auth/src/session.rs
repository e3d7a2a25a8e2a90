//! Session management on the user record
//!
//! Each user holds exactly one live refresh token. Login overwrites it, which
//! invalidates whatever was issued before; logout replaces it with a
//! sentinel that no signed token can equal.

use common::database::now_millis;
use mongodb::bson::oid::ObjectId;
use tracing::{info, warn};

use crate::{
    error::{AuthError, AuthResult},
    jwt::{IssuedToken, JwtService},
    models::{LoginCredentials, User},
    repositories::{UserRepository, verify_password},
};

/// Stored in place of a refresh token after logout
pub const REVOKED_REFRESH_TOKEN: &str = "revoked";

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct Session {
    pub user: User,
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

/// Session manager for issuing and checking tokens against stored users
#[derive(Clone)]
pub struct SessionManager {
    users: UserRepository,
    jwt_service: JwtService,
}

impl SessionManager {
    /// Create a new session manager
    pub fn new(users: UserRepository, jwt_service: JwtService) -> Self {
        Self { users, jwt_service }
    }

    pub fn users(&self) -> &UserRepository {
        &self.users
    }

    /// Check credentials and start a new session, superseding any previous one
    pub async fn login(&self, credentials: &LoginCredentials) -> AuthResult<Session> {
        let mut user = self
            .users
            .find_by_username(&credentials.username)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !verify_password(&user, &credentials.password)? {
            warn!("Failed login for user {:?}", user.id);
            return Err(AuthError::InvalidCredentials);
        }

        let user_id = user.id.ok_or(AuthError::UserNotFound)?;
        let access = self.jwt_service.generate_access_token(&user_id, user.role)?;
        let refresh = self.jwt_service.generate_refresh_token(&user_id)?;

        self.users
            .set_refresh_token(user_id, &refresh.token, refresh.expires_at)
            .await?;
        info!("Session created for user: {}", user_id);

        user.refresh_token = Some(refresh.token.clone());
        user.refresh_token_expiry = Some(refresh.expires_at);

        Ok(Session {
            user,
            access,
            refresh,
        })
    }

    /// Exchange the stored refresh token for a new access token
    ///
    /// The refresh token itself is not rotated.
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<IssuedToken> {
        let claims = self.jwt_service.validate_refresh_token(refresh_token)?;
        let user_id = claims.user_id()?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !is_session_valid(&user, refresh_token) {
            warn!("Superseded refresh token presented for user: {}", user_id);
            return Err(AuthError::SessionSuperseded);
        }

        self.jwt_service.generate_access_token(&user_id, user.role)
    }

    /// End the session of a user
    pub async fn logout(&self, user_id: ObjectId) -> AuthResult<()> {
        info!("Revoking session for user: {}", user_id);
        self.users
            .set_refresh_token(user_id, REVOKED_REFRESH_TOKEN, now_millis())
            .await
    }

    /// Resolve the user behind an access token
    ///
    /// The user must still exist and still hold the role the token was issued for.
    pub async fn authenticate(&self, access_token: &str) -> AuthResult<User> {
        let claims = self.jwt_service.validate_access_token(access_token)?;
        let user_id = claims.user_id()?;
        let role = claims
            .role
            .ok_or_else(|| AuthError::InvalidToken("missing role".to_string()))?;

        self.users
            .find_by_id_and_role(user_id, role)
            .await?
            .ok_or_else(|| AuthError::InvalidToken("no user for token".to_string()))
    }
}

/// True when `refresh_token` is the one currently stored for `user`
pub fn is_session_valid(user: &User, refresh_token: &str) -> bool {
    refresh_token != REVOKED_REFRESH_TOKEN && user.refresh_token.as_deref() == Some(refresh_token)
}
