use std::{env, fmt::Display, str::FromStr};

use anyhow::anyhow;
use tracing::info;

pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// Only this origin passes CORS when set, any origin otherwise.
    pub cors_origin: Option<String>,
    pub log_level: tracing::Level,
}

impl Config {
    /// Read the configuration from the process environment. Call
    /// `dotenvy::dotenv()` first to pick up a `.env` file.
    pub fn load() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: try_load("DATABASE_URL", "sqlite:database.sqlite")?,
            host: try_load("API_HOST", "127.0.0.1")?,
            port: try_load("API_PORT", "3000")?,
            cors_origin: env::var("CORS_ORIGIN").ok().filter(|s| !s.is_empty()),
            log_level: try_load("LOG_LEVEL", "INFO")?,
        })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    parse_or_default(key, env::var(key).ok(), default)
}

fn parse_or_default<T: FromStr>(key: &str, value: Option<String>, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let value = value.unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    value
        .parse()
        .map_err(|e| anyhow!("invalid {key} value {value:?}: {e}"))
}
