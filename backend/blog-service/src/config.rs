/// Configuration management for Blog Service
///
/// Everything is read from environment variables (a `.env` file is loaded
/// first by the binary). Values that are unsafe in production are rejected
/// there instead of silently defaulted.
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 3600;
const DEFAULT_REFRESH_TOKEN_TTL_SECS: i64 = 30 * 24 * 3600;
const DEFAULT_BLACKLIST_PURGE_INTERVAL_SECS: u64 = 3600;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Token signing configuration
    pub jwt: JwtConfig,
    /// Uploaded media configuration
    pub media: MediaConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    /// Server host to bind to
    pub host: String,
    /// Server port to bind to
    pub port: u16,
    /// `json` switches the log output to JSON lines
    pub log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Database URL
    pub url: String,
    /// Max connections in pool
    pub max_connections: u32,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub private_key_pem: String,
    pub public_key_pem: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
    /// How often expired token blacklist rows are deleted
    pub blacklist_purge_interval_secs: u64,
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("private_key_pem", &"[REDACTED]")
            .field("public_key_pem", &"[REDACTED]")
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("refresh_token_ttl_secs", &self.refresh_token_ttl_secs)
            .field(
                "blacklist_purge_interval_secs",
                &self.blacklist_purge_interval_secs,
            )
            .finish()
    }
}

/// Where profile photos are written and how they are addressed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConfig {
    pub root: String,
    pub url: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let app_env = lookup("APP_ENV").unwrap_or_else(|| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        let blacklist_purge_interval_secs = parse_or(
            &lookup,
            "BLACKLIST_PURGE_INTERVAL_SECS",
            DEFAULT_BLACKLIST_PURGE_INTERVAL_SECS,
        )?;
        if blacklist_purge_interval_secs == 0 {
            return Err("BLACKLIST_PURGE_INTERVAL_SECS must be greater than zero".to_string());
        }

        Ok(Config {
            app: AppConfig {
                env: app_env.clone(),
                host: lookup("BLOG_SERVICE_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_or(&lookup, "BLOG_SERVICE_PORT", 8080)?,
                log_format: match lookup("LOG_FORMAT") {
                    Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
                    _ => LogFormat::Text,
                },
            },
            cors: {
                let allowed_origins = match lookup("CORS_ALLOWED_ORIGINS") {
                    Some(value) => value,
                    None if production => {
                        return Err("CORS_ALLOWED_ORIGINS must be set in production".to_string())
                    }
                    None => "http://localhost:3000".to_string(),
                };

                if production && allowed_origins.trim() == "*" {
                    return Err("CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string());
                }

                CorsConfig { allowed_origins }
            },
            database: DatabaseConfig {
                url: lookup("DATABASE_URL")
                    .unwrap_or_else(|| "postgresql://localhost/blog".to_string()),
                max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            },
            jwt: JwtConfig {
                private_key_pem: lookup("JWT_PRIVATE_KEY_PEM")
                    .ok_or_else(|| "JWT_PRIVATE_KEY_PEM must be set".to_string())?,
                public_key_pem: lookup("JWT_PUBLIC_KEY_PEM")
                    .ok_or_else(|| "JWT_PUBLIC_KEY_PEM must be set".to_string())?,
                access_token_ttl_secs: parse_or(
                    &lookup,
                    "ACCESS_TOKEN_TTL_SECS",
                    DEFAULT_ACCESS_TOKEN_TTL_SECS,
                )?,
                refresh_token_ttl_secs: parse_or(
                    &lookup,
                    "REFRESH_TOKEN_TTL_SECS",
                    DEFAULT_REFRESH_TOKEN_TTL_SECS,
                )?,
                blacklist_purge_interval_secs,
            },
            media: MediaConfig {
                root: lookup("MEDIA_ROOT").unwrap_or_else(|| "./media".to_string()),
                url: lookup("MEDIA_URL").unwrap_or_else(|| "/media/".to_string()),
            },
        })
    }

    pub fn is_production(&self) -> bool {
        self.app.env.eq_ignore_ascii_case("production")
    }
}

/// Parse `key` when set, `default` when absent. A value that is set but does
/// not parse is an error.
fn parse_or<T, F>(lookup: &F, key: &str, default: T) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| format!("{key} has an invalid value {raw:?}: {e}")),
        None => Ok(default),
    }
}
