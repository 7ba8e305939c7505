use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Credentials for the Google Sheets mirror. Present only when every
/// required variable is set.
#[derive(Debug, Clone)]
pub struct SheetsConfig {
    pub service_account_email: String,
    pub private_key: String,
    pub sheet_id: String,
    pub sheet_name: String,
    pub utc_offset_hours: i32,
}

/// Bootstrap super-admin created at start-up if no user with that email exists.
#[derive(Debug, Clone)]
pub struct SeedAdmin {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub redis_url: String,
    pub jwt_secret: String,
    pub port: u16,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub cookie_secure: bool,
    pub cors_origins: Vec<String>,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub proxy_timeout: Duration,
    pub seed_admin: Option<SeedAdmin>,
    pub sheets: Option<SheetsConfig>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: required("DATABASE_URL")?,
            redis_url: required("REDIS_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            port: parse_or("PORT", 8080)?,
            access_token_ttl: Duration::from_secs(parse_or("ACCESS_TOKEN_TTL_SECS", 900)?),
            refresh_token_ttl: Duration::from_secs(parse_or("REFRESH_TOKEN_TTL_SECS", 604_800)?),
            cookie_secure: parse_or("COOKIE_SECURE", true)?,
            cors_origins: parse_list(env::var("CORS_ORIGINS").ok().as_deref()),
            upload_dir: env::var("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./uploads")),
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            proxy_timeout: Duration::from_secs(parse_or("PROXY_TIMEOUT_SECS", 10)?),
            seed_admin: seed_admin(),
            sheets: sheets_config()?,
        })
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing(key))
}

fn parse_or<T>(key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

/// Split a comma-separated list, dropping blanks.
pub fn parse_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

fn seed_admin() -> Option<SeedAdmin> {
    let email = env::var("SEED_ADMIN_EMAIL").ok()?;
    let password = env::var("SEED_ADMIN_PASSWORD").ok()?;
    let name = env::var("SEED_ADMIN_NAME").unwrap_or_else(|_| "Super Admin".to_string());
    Some(SeedAdmin {
        email,
        password,
        name,
    })
}

fn sheets_config() -> Result<Option<SheetsConfig>, ConfigError> {
    let (Ok(email), Ok(key), Ok(sheet_id)) = (
        env::var("GOOGLE_SERVICE_ACCOUNT_EMAIL"),
        env::var("GOOGLE_PRIVATE_KEY"),
        env::var("GOOGLE_SHEET_ID"),
    ) else {
        warn!("Google Sheets credentials not configured, mirroring disabled");
        return Ok(None);
    };

    Ok(Some(SheetsConfig {
        service_account_email: email,
        // Keys pasted into a single-line env var keep literal "\n" sequences.
        private_key: key.replace("\\n", "\n"),
        sheet_id,
        sheet_name: env::var("GOOGLE_SHEET_NAME").unwrap_or_else(|_| "Sheet1".to_string()),
        utc_offset_hours: parse_or("SHEETS_UTC_OFFSET_HOURS", 9)?,
    }))
}
