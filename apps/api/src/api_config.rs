use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use stockroom_core::AppError;
use tracing_subscriber::EnvFilter;

/// Connection pool sizing and lifetimes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabasePoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_lifetime: Duration,
    pub connect_timeout: Duration,
}

impl Default for DatabasePoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            max_lifetime: Duration::from_secs(30 * 60),
            connect_timeout: Duration::from_secs(3),
        }
    }
}

impl DatabasePoolConfig {
    pub fn pool_options(&self) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .max_lifetime(self.max_lifetime)
            .acquire_timeout(self.connect_timeout)
    }
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub database_url: String,
    pub frontend_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub cookie_secure: bool,
    pub request_timeout: Duration,
    pub database_pool: DatabasePoolConfig,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

        let database_url = required_env("DATABASE_URL")?;
        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_owned());
        let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
        let api_port = parse_setting("API_PORT", env::var("API_PORT").ok(), 3001_u16)?;
        let cookie_secure = env::var("SESSION_COOKIE_SECURE")
            .unwrap_or_else(|_| "false".to_owned())
            .eq_ignore_ascii_case("true");
        let request_timeout_secs = parse_setting(
            "REQUEST_TIMEOUT_SECS",
            env::var("REQUEST_TIMEOUT_SECS").ok(),
            30_u64,
        )?;

        let defaults = DatabasePoolConfig::default();
        let database_pool = DatabasePoolConfig {
            max_connections: parse_setting(
                "DATABASE_MAX_CONNECTIONS",
                env::var("DATABASE_MAX_CONNECTIONS").ok(),
                defaults.max_connections,
            )?,
            min_connections: parse_setting(
                "DATABASE_MIN_CONNECTIONS",
                env::var("DATABASE_MIN_CONNECTIONS").ok(),
                defaults.min_connections,
            )?,
            max_lifetime: Duration::from_secs(parse_setting(
                "DATABASE_MAX_LIFETIME_SECS",
                env::var("DATABASE_MAX_LIFETIME_SECS").ok(),
                defaults.max_lifetime.as_secs(),
            )?),
            connect_timeout: Duration::from_secs(parse_setting(
                "DATABASE_CONNECT_TIMEOUT_SECS",
                env::var("DATABASE_CONNECT_TIMEOUT_SECS").ok(),
                defaults.connect_timeout.as_secs(),
            )?),
        };

        if database_pool.min_connections > database_pool.max_connections {
            return Err(AppError::Validation(
                "DATABASE_MIN_CONNECTIONS must not exceed DATABASE_MAX_CONNECTIONS".to_owned(),
            ));
        }

        Ok(Self {
            migrate_only,
            database_url,
            frontend_url,
            api_host,
            api_port,
            cookie_secure,
            request_timeout: Duration::from_secs(request_timeout_secs),
            database_pool,
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    let value = env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))?;
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{name} must not be empty")));
    }

    Ok(value)
}

/// Blank or unset values fall back to `default`; anything else must parse.
fn parse_setting<T>(name: &str, raw: Option<String>, default: T) -> Result<T, AppError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => value
            .parse::<T>()
            .map_err(|error| AppError::Validation(format!("invalid {name} '{value}': {error}"))),
    }
}
