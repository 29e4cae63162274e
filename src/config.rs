//! Application configuration management.
//!
//! This module handles loading configuration from environment variables.
//! It uses the `envy` crate to automatically deserialize environment variables into a type-safe struct.

use serde::Deserialize;
use url::Url;

/// Application configuration loaded from environment variables.
///
/// # Environment Variables
///
/// - `DATABASE_URL` (required): PostgreSQL connection string
/// - `SERVER_PORT` (optional): HTTP server port, defaults to 5000
/// - `PAYMENT_SERVER_KEY` (required): server key for the payment gateway
/// - `SMTP_USERNAME` / `SMTP_PASSWORD` (required): SMTP relay credentials
/// - `STATIC_BASE_URL` (optional): public prefix for uploaded files
///
/// Everything else has a default, see the `default_*` functions below.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,

    #[serde(default = "default_port")]
    pub server_port: u16,

    #[serde(default = "default_max_connections")]
    pub database_max_connections: u32,

    pub payment_server_key: String,

    #[serde(default = "default_payment_base_url")]
    pub payment_base_url: String,

    #[serde(default = "default_payment_timeout_secs")]
    pub payment_timeout_secs: u64,

    #[serde(default = "default_true")]
    pub payment_verify_signature: bool,

    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    pub smtp_username: String,

    pub smtp_password: String,

    #[serde(default = "default_mail_sender")]
    pub mail_sender: String,

    #[serde(default = "default_mail_retry_attempts")]
    pub mail_retry_attempts: u32,

    #[serde(default = "default_mail_retry_delay_ms")]
    pub mail_retry_delay_ms: u64,

    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,

    #[serde(default = "default_static_base_url")]
    pub static_base_url: String,

    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    pub cors_allowed_origin: Option<String>,
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read environment: {0}")]
    Env(#[from] envy::Error),

    #[error("{name} is not a valid URL: {source}")]
    InvalidUrl {
        name: &'static str,
        source: url::ParseError,
    },
}

/// Default port if SERVER_PORT environment variable is not set.
///
/// Matches the host in [`default_static_base_url`].
fn default_port() -> u16 {
    5000
}

fn default_max_connections() -> u32 {
    5
}

/// Midtrans sandbox. Production deployments point this at the live host.
fn default_payment_base_url() -> String {
    "https://app.sandbox.midtrans.com".to_string()
}

fn default_payment_timeout_secs() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_smtp_host() -> String {
    "smtp.gmail.com".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_mail_sender() -> String {
    "Housy <no-reply@housy.local>".to_string()
}

fn default_mail_retry_attempts() -> u32 {
    3
}

fn default_mail_retry_delay_ms() -> u64 {
    500
}

fn default_upload_dir() -> String {
    "uploads".to_string()
}

fn default_static_base_url() -> String {
    "http://localhost:5000/uploads/".to_string()
}

/// 5 MiB.
fn default_max_upload_bytes() -> usize {
    5 * 1024 * 1024
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// This method first attempts to load a `.env` file (which is optional),
    /// then reads environment variables and deserializes them into a Config struct.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing (e.g., DATABASE_URL)
    /// - Environment variable values cannot be parsed into expected types
    /// - `STATIC_BASE_URL` or `PAYMENT_BASE_URL` is not a valid URL
    pub fn from_env() -> Result<Self, ConfigError> {
        // Try to load .env file if it exists (does nothing if not found)
        dotenvy::dotenv().ok();

        // Field names are automatically converted: database_url -> DATABASE_URL
        let config = envy::from_env::<Config>()?;
        config.normalized()
    }

    /// Validate URL settings and force a trailing slash on the static base so
    /// filenames can be appended directly.
    fn normalized(mut self) -> Result<Self, ConfigError> {
        Url::parse(&self.payment_base_url).map_err(|source| ConfigError::InvalidUrl {
            name: "PAYMENT_BASE_URL",
            source,
        })?;
        Url::parse(&self.static_base_url).map_err(|source| ConfigError::InvalidUrl {
            name: "STATIC_BASE_URL",
            source,
        })?;

        if !self.static_base_url.ends_with('/') {
            self.static_base_url.push('/');
        }
        self.payment_base_url = self.payment_base_url.trim_end_matches('/').to_string();

        Ok(self)
    }
}
