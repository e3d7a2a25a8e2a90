//! Server settings
//!
//! Values come from the environment (and an optional `.env` file loaded
//! before this runs). Every key has a default so a bare checkout starts
//! against a local MongoDB.

use anyhow::Context;
use auth::{JwtConfig, KeyPair};
use clap::Parser;
use common::database::DatabaseConfig;
use config::{Config, Environment};
use serde::Deserialize;
use std::{path::PathBuf, time::Duration};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server_address: String,
    pub port: Option<u16>,
    pub mongo_uri: String,
    pub db_name: String,
    pub access_token_private_key_path: String,
    pub access_token_public_key_path: String,
    pub refresh_token_private_key_path: String,
    pub refresh_token_public_key_path: String,
    /// Minutes
    pub jwt_expiration: i64,
    /// Minutes
    pub refresh_jwt_expiration: i64,
    pub assets_url: String,
    pub upload_dir: PathBuf,
    pub max_upload_size: usize,
    /// Seconds
    pub graceful_timeout: u64,
    // Mail verification is not wired up; the keys are read so deployments
    // carrying them keep validating.
    #[serde(default)]
    pub sendgrid_api_key: String,
    #[serde(default)]
    pub mail_verification_template_id: String,
    #[serde(default)]
    pub password_reset_template_id: String,
    pub mail_verification_code_expiration: i64,
    pub password_reset_code_expiration: i64,
}

/// Command line overrides
#[derive(Debug, Default, Parser)]
#[command(name = "booksland", about = "Booksland catalog API server")]
pub struct Cli {
    /// Seconds to wait for in-flight requests on shutdown
    #[arg(long)]
    pub graceful_timeout: Option<u64>,

    /// Directory uploads are stored in and served from
    #[arg(long)]
    pub dir: Option<PathBuf>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        let settings = Config::builder()
            .set_default("server_address", "localhost:8000")?
            .set_default("mongo_uri", "mongodb://localhost:27017")?
            .set_default("db_name", "booksland")?
            .set_default("access_token_private_key_path", "./access-private.pem")?
            .set_default("access_token_public_key_path", "./access-public.pem")?
            .set_default("refresh_token_private_key_path", "./refresh-private.pem")?
            .set_default("refresh_token_public_key_path", "./refresh-public.pem")?
            .set_default("jwt_expiration", 30)?
            .set_default("refresh_jwt_expiration", 43200)?
            .set_default("assets_url", "http://localhost:8000")?
            .set_default("upload_dir", "./assets")?
            .set_default("max_upload_size", 2 * 1024 * 1024)?
            .set_default("graceful_timeout", 15)?
            .set_default("mail_verification_code_expiration", 30)?
            .set_default("password_reset_code_expiration", 15)?
            .add_source(Environment::default().try_parsing(true))
            .build()
            .context("Failed to read settings")?;

        settings
            .try_deserialize()
            .context("Invalid settings")
    }

    pub fn apply(&mut self, cli: &Cli) {
        if let Some(timeout) = cli.graceful_timeout {
            self.graceful_timeout = timeout;
        }
        if let Some(dir) = &cli.dir {
            self.upload_dir = dir.clone();
        }
    }

    /// `0.0.0.0:$PORT` when `PORT` is set, otherwise `SERVER_ADDRESS`
    pub fn bind_address(&self) -> String {
        match self.port {
            Some(port) => format!("0.0.0.0:{}", port),
            None => self.server_address.clone(),
        }
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.graceful_timeout)
    }

    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig {
            uri: self.mongo_uri.clone(),
            name: self.db_name.clone(),
        }
    }

    /// Load both key pairs; unreadable files or bad PEM fail startup
    pub fn jwt(&self) -> anyhow::Result<JwtConfig> {
        Ok(JwtConfig {
            access: KeyPair::load(
                &self.access_token_private_key_path,
                &self.access_token_public_key_path,
            )
            .context("Failed to load access token keys")?,
            refresh: KeyPair::load(
                &self.refresh_token_private_key_path,
                &self.refresh_token_public_key_path,
            )
            .context("Failed to load refresh token keys")?,
            access_token_expiry: self.jwt_expiration,
            refresh_token_expiry: self.refresh_jwt_expiration,
        })
    }
}
