//! Database module for handling MongoDB connections and operations
//!
//! This module provides client configuration, health checks, and the
//! per-operation time budget every store call runs under.

use crate::error::{DatabaseError, DatabaseResult};
use mongodb::{
    Client, Database,
    bson::{doc, oid::ObjectId},
    options::ClientOptions,
};
use std::{env, future::Future, time::Duration};
use tracing::{error, info};

/// Database configuration struct
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// MongoDB connection URI
    pub uri: String,
    /// Name of the database holding every collection
    pub name: String,
}

impl DatabaseConfig {
    /// Create a new DatabaseConfig from environment variables
    pub fn from_env() -> DatabaseResult<Self> {
        let uri = env::var("MONGO_URI").unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let name = env::var("DB_NAME").unwrap_or_else(|_| "booksland".to_string());

        if name.trim().is_empty() {
            return Err(DatabaseError::Configuration(
                "DB_NAME must not be empty".to_string(),
            ));
        }

        Ok(Self { uri, name })
    }
}

/// Build a client and select the configured database
///
/// The driver connects lazily, so this only fails on a malformed URI.
pub async fn init_database(config: &DatabaseConfig) -> DatabaseResult<Database> {
    let mut options = ClientOptions::parse(&config.uri)
        .await
        .map_err(|e| DatabaseError::Configuration(format!("Invalid MongoDB URI: {}", e)))?;
    options.app_name = Some("booksland".to_string());

    let client = Client::with_options(options).map_err(DatabaseError::Connection)?;
    info!("MongoDB client configured for database {}", config.name);

    Ok(client.database(&config.name))
}

/// Check database connectivity with a `ping` command
pub async fn health_check(db: &Database) -> DatabaseResult<bool> {
    let ping = bounded(Operation::Read, "ping", db.run_command(doc! { "ping": 1 }, None)).await;

    match ping {
        Ok(_) => Ok(true),
        Err(e) => {
            error!("Database health check failed: {}", e);
            Ok(false)
        }
    }
}

/// Kind of store operation, used to pick its time budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Read,
    Update,
    Delete,
}

impl Operation {
    pub fn budget(self) -> Duration {
        match self {
            Operation::Create | Operation::Update => Duration::from_secs(20),
            Operation::Read | Operation::Delete => Duration::from_secs(10),
        }
    }
}

/// Run a driver future under the time budget of `op`
pub async fn bounded<T, F>(op: Operation, label: &'static str, fut: F) -> DatabaseResult<T>
where
    F: Future<Output = mongodb::error::Result<T>>,
{
    match tokio::time::timeout(op.budget(), fut).await {
        Ok(result) => result.map_err(DatabaseError::Query),
        Err(_) => {
            error!("{} exceeded {:?}", label, op.budget());
            Err(DatabaseError::Timeout(label))
        }
    }
}

/// Parse a hex object id, naming the offending field on failure
pub fn parse_object_id(field: &str, value: &str) -> DatabaseResult<ObjectId> {
    ObjectId::parse_str(value.trim()).map_err(|_| DatabaseError::invalid_id(field, value))
}

/// Current time as unix milliseconds, the unit every audit field uses
pub fn now_millis() -> i64 {
    mongodb::bson::DateTime::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_database_config_from_env() {
        unsafe {
            std::env::remove_var("MONGO_URI");
            std::env::remove_var("DB_NAME");
        }

        let config = DatabaseConfig::from_env().expect("Failed to create database config");
        assert_eq!(config.uri, "mongodb://localhost:27017");
        assert_eq!(config.name, "booksland");
    }

    #[test]
    #[serial]
    fn test_database_config_from_env_with_custom_values() {
        unsafe {
            std::env::set_var("MONGO_URI", "mongodb://db.internal:27018");
            std::env::set_var("DB_NAME", "catalog_test");
        }

        let config = DatabaseConfig::from_env().unwrap();
        assert_eq!(config.uri, "mongodb://db.internal:27018");
        assert_eq!(config.name, "catalog_test");

        unsafe {
            std::env::remove_var("MONGO_URI");
            std::env::remove_var("DB_NAME");
        }
    }

    #[test]
    fn write_operations_get_the_longer_budget() {
        assert_eq!(Operation::Create.budget(), Duration::from_secs(20));
        assert_eq!(Operation::Update.budget(), Duration::from_secs(20));
        assert_eq!(Operation::Read.budget(), Duration::from_secs(10));
        assert_eq!(Operation::Delete.budget(), Duration::from_secs(10));
    }

    #[test]
    fn parse_object_id_rejects_garbage() {
        let err = parse_object_id("id", "not-an-id").unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidId { ref field, .. } if field == "id"));

        let oid = ObjectId::new();
        assert_eq!(parse_object_id("id", &oid.to_hex()).unwrap(), oid);
    }

    #[tokio::test(start_paused = true)]
    async fn bounded_reports_timeouts() {
        let slow = async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok::<_, mongodb::error::Error>(())
        };

        let err = bounded(Operation::Read, "slow read", slow).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Timeout("slow read")));
    }
}
