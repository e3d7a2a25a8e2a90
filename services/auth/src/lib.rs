//! Credential and token domain for Booksland
//!
//! Users, password hashing, RS256 access/refresh tokens, and the single
//! refresh-token session kept on each user record.

pub mod error;
pub mod jwt;
pub mod models;
pub mod repositories;
pub mod session;
pub mod validation;

pub use error::{AuthError, AuthResult};
pub use jwt::{JwtConfig, JwtService, KeyPair};
pub use session::SessionManager;
