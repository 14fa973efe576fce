use anyhow::Context;
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use tracing::info;

use crate::server::MineplaceServerConfig;

/// Process level settings for a standalone server.
#[derive(Clone, Debug)]
pub struct Settings {
    /// `DB_URL`, e.g. `sqlite://mineplace.db`.
    pub db_url: String,
    /// `FILES_DIR`, root directory of stored version files.
    pub files_dir: String,
    pub host: String,
    pub port: u16,
    /// `LOG_LEVEL`, used when `RUST_LOG` is unset.
    pub log_level: String,
    pub server: MineplaceServerConfig,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            db_url: load("DB_URL", "sqlite://mineplace.db")?,
            files_dir: load("FILES_DIR", "./files")?,
            host: load("HOST", "0.0.0.0")?,
            port: load("PORT", "8000")?,
            log_level: load("LOG_LEVEL", "info")?,
            server: MineplaceServerConfig::from_env()?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl MineplaceServerConfig {
    /// Reads `AUTHJWT_SECRET_KEY`, `AUTHJWT_ACCESS_TOKEN_EXPIRES` and `CORS_ORIGINS`.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        let cors_origins: String = load("CORS_ORIGINS", "")?;

        Ok(Self {
            jwt_secret: load("AUTHJWT_SECRET_KEY", &defaults.jwt_secret)?,
            access_token_expires: load(
                "AUTHJWT_ACCESS_TOKEN_EXPIRES",
                &defaults.access_token_expires.to_string(),
            )?,
            cors_origins: parse_origins(&cors_origins),
            ..defaults
        })
    }
}

fn load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("Invalid {key} value: {raw}"))
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}
