//! JWT service for token generation and validation
//!
//! Access and refresh tokens are RS256 signed with separate key pairs. Both
//! carry a `key_type` discriminant so that one kind can never be accepted in
//! place of the other, even if the key pairs were configured identically.

use anyhow::Context;
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

use crate::{
    error::{AuthError, AuthResult},
    models::Role,
};

/// `iss` claim of every token this service signs
pub const ISSUER: &str = "booksland.auth.service";

/// PEM encoded RSA key pair
#[derive(Debug, Clone)]
pub struct KeyPair {
    pub private_key: String,
    pub public_key: String,
}

impl KeyPair {
    /// Load a pair where each value is either inline PEM or a path to a PEM file
    pub fn load(private_key: &str, public_key: &str) -> anyhow::Result<Self> {
        Ok(Self {
            private_key: read_pem(private_key).context("Failed to read private key")?,
            public_key: read_pem(public_key).context("Failed to read public key")?,
        })
    }
}

fn read_pem(value: &str) -> anyhow::Result<String> {
    if value.trim_start().starts_with("-----BEGIN") {
        return Ok(value.to_string());
    }

    let path = PathBuf::from(value);
    let pem = std::fs::read_to_string(&path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    Ok(pem.trim().to_string())
}

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub access: KeyPair,
    pub refresh: KeyPair,
    /// Access token lifetime in minutes
    pub access_token_expiry: i64,
    /// Refresh token lifetime in minutes
    pub refresh_token_expiry: i64,
}

/// Distinguishes access tokens from refresh tokens
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum KeyType {
    Access,
    Refresh,
}

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User id, hex encoded
    pub sub: String,
    pub key_type: KeyType,
    /// Present on access tokens only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    /// Unique per token, so two tokens issued within one second still differ
    pub jti: String,
}

impl Claims {
    pub fn user_id(&self) -> AuthResult<ObjectId> {
        ObjectId::parse_str(&self.sub)
            .map_err(|_| AuthError::InvalidToken("subject is not a user id".to_string()))
    }
}

/// A signed token and its expiry in unix milliseconds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: i64,
}

#[derive(Clone)]
struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    fn from_pair(pair: &KeyPair) -> anyhow::Result<Self> {
        Ok(Self {
            encoding: EncodingKey::from_rsa_pem(pair.private_key.as_bytes())
                .context("Invalid RSA private key")?,
            decoding: DecodingKey::from_rsa_pem(pair.public_key.as_bytes())
                .context("Invalid RSA public key")?,
        })
    }
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    access: Keys,
    refresh: Keys,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl JwtService {
    /// Initialize a new JWT service
    pub fn new(config: JwtConfig) -> anyhow::Result<Self> {
        let access = Keys::from_pair(&config.access).context("access token keys")?;
        let refresh = Keys::from_pair(&config.refresh).context("refresh token keys")?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Ok(Self {
            access,
            refresh,
            validation,
            access_ttl: Duration::minutes(config.access_token_expiry),
            refresh_ttl: Duration::minutes(config.refresh_token_expiry),
        })
    }

    /// Generate an access token for a user
    pub fn generate_access_token(&self, user_id: &ObjectId, role: Role) -> AuthResult<IssuedToken> {
        self.sign(&self.access, user_id, KeyType::Access, Some(role), self.access_ttl)
    }

    /// Generate a refresh token for a user
    pub fn generate_refresh_token(&self, user_id: &ObjectId) -> AuthResult<IssuedToken> {
        self.sign(&self.refresh, user_id, KeyType::Refresh, None, self.refresh_ttl)
    }

    pub fn validate_access_token(&self, token: &str) -> AuthResult<Claims> {
        self.verify(&self.access, token, KeyType::Access)
    }

    pub fn validate_refresh_token(&self, token: &str) -> AuthResult<Claims> {
        self.verify(&self.refresh, token, KeyType::Refresh)
    }

    fn sign(
        &self,
        keys: &Keys,
        user_id: &ObjectId,
        key_type: KeyType,
        role: Option<Role>,
        ttl: Duration,
    ) -> AuthResult<IssuedToken> {
        let now = Utc::now();
        let expires = now + ttl;

        let claims = Claims {
            sub: user_id.to_hex(),
            key_type,
            role,
            iat: now.timestamp(),
            exp: expires.timestamp(),
            iss: ISSUER.to_string(),
            jti: ObjectId::new().to_hex(),
        };

        let token = encode(&Header::new(Algorithm::RS256), &claims, &keys.encoding)
            .map_err(AuthError::Signing)?;

        Ok(IssuedToken {
            token,
            expires_at: expires.timestamp_millis(),
        })
    }

    fn verify(&self, keys: &Keys, token: &str, expected: KeyType) -> AuthResult<Claims> {
        let claims = decode::<Claims>(token, &keys.decoding, &self.validation)
            .map_err(|e| {
                debug!("Token rejected: {}", e);
                AuthError::InvalidToken(e.to_string())
            })?
            .claims;

        if claims.key_type != expected {
            return Err(AuthError::InvalidToken("wrong key type".to_string()));
        }

        if claims.sub.trim().is_empty() {
            return Err(AuthError::InvalidToken("missing subject".to_string()));
        }

        if expected == KeyType::Access && claims.role.is_none() {
            return Err(AuthError::InvalidToken("missing role".to_string()));
        }

        Ok(claims)
    }
}
