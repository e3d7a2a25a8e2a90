//! Common library for the Booksland services
//!
//! This crate provides the document store plumbing shared by the auth and
//! api crates: connection setup, the error taxonomy, typed aggregation
//! stages, paginated queries, and response rendering helpers.
//!
//! ```rust,no_run
//! use common::database::{DatabaseConfig, health_check, init_database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_env()?;
//!     let db = init_database(&config).await?;
//!     println!("Database health check: {}", health_check(&db).await?);
//!     Ok(())
//! }
//! ```

pub mod assets;
pub mod database;
pub mod error;
pub mod json;
pub mod pipeline;
pub mod query;
pub mod store;

pub use error::{DatabaseError, DatabaseResult};
