//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use chrono::Weekday;
use std::net::SocketAddr;
use tracing::Level;
use tutoring_core::PlatformFee;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub db_max_connections: u32,
    pub log_level: Level,
    pub cors_origin: String,
    pub jwt_secret: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
    pub google_client_id: Option<String>,
    pub google_client_secret: Option<String>,
    pub google_redirect_url: String,
    pub razorpay_key: Option<String>,
    pub razorpay_secret: Option<String>,
    pub platform_fee_percent: u32,
    pub currency: String,
    pub week_start: Weekday,
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parsed_var<T>(name: &str, default: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = var_or(name, default);
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string()))
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Server and Database Settings ---
        let bind_address: SocketAddr = parsed_var("BIND_ADDRESS", "0.0.0.0:8080")?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;
        let db_max_connections: u32 = parsed_var("DB_MAX_CONNECTIONS", "5")?;

        let log_level_str = var_or("RUST_LOG", "INFO");
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let cors_origin = var_or("CORS_ORIGIN", "http://localhost:3000");

        // --- Token Settings ---
        let jwt_secret = std::env::var("JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ConfigError::MissingVar("JWT_SECRET".to_string()))?;
        let access_token_ttl_minutes: i64 = parsed_var("ACCESS_TOKEN_TTL_MINUTES", "15")?;
        let refresh_token_ttl_days: i64 = parsed_var("REFRESH_TOKEN_TTL_DAYS", "30")?;

        // --- Third-party Credentials (optional) ---
        let google_client_id = std::env::var("GOOGLE_CLIENT_ID").ok();
        let google_client_secret = std::env::var("GOOGLE_CLIENT_SECRET").ok();
        let google_redirect_url = var_or(
            "GOOGLE_REDIRECT_URL",
            "http://localhost:8080/auth/google/callback",
        );
        let razorpay_key = std::env::var("RAZORPAY_KEY").ok();
        let razorpay_secret = std::env::var("RAZORPAY_SECRET").ok();

        // --- Marketplace Settings ---
        let platform_fee_percent: u32 = parsed_var(
            "PLATFORM_FEE_PERCENT",
            &PlatformFee::DEFAULT_PERCENT.to_string(),
        )?;
        if platform_fee_percent > 100 {
            return Err(ConfigError::InvalidValue(
                "PLATFORM_FEE_PERCENT".to_string(),
                format!("{} is more than 100", platform_fee_percent),
            ));
        }
        let currency = var_or("CURRENCY", "INR").to_uppercase();
        let week_start_str = var_or("WEEK_START", "monday");
        let week_start = week_start_str.parse::<Weekday>().map_err(|_| {
            ConfigError::InvalidValue(
                "WEEK_START".to_string(),
                format!("'{}' is not a weekday", week_start_str),
            )
        })?;

        Ok(Self {
            bind_address,
            database_url,
            db_max_connections,
            log_level,
            cors_origin,
            jwt_secret,
            access_token_ttl_minutes,
            refresh_token_ttl_days,
            google_client_id,
            google_client_secret,
            google_redirect_url,
            razorpay_key,
            razorpay_secret,
            platform_fee_percent,
            currency,
            week_start,
        })
    }

    pub fn platform_fee(&self) -> PlatformFee {
        PlatformFee::new(self.platform_fee_percent)
    }
}
