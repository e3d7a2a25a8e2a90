//! Error type for credential and token operations

use common::DatabaseError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    /// Password did not match the stored hash
    #[error("Incorrect password")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    /// Signature, expiry, issuer, subject or key type check failed
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// A syntactically valid refresh token that is no longer the stored one
    #[error("Refresh token has been superseded")]
    SessionSuperseded,

    #[error("A user with this phone or email already exists")]
    AlreadyRegistered,

    #[error("{0}")]
    Validation(String),

    #[error("Failed to hash password: {0}")]
    Hashing(String),

    #[error("Failed to sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

pub type AuthResult<T> = Result<T, AuthError>;
