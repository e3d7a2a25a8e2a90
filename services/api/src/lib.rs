//! Booksland catalog API
//!
//! JSON REST service over the book catalog: books, courses, stocks, carts,
//! media and landing feeds, with token based authentication provided by the
//! `auth` crate.

pub mod error;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod response;
pub mod routes;
pub mod settings;
pub mod state;
pub mod upload;

pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
