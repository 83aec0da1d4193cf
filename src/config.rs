use crate::http::DEFAULT_REPOSITORY_TIMEOUT_MS;
use anyhow::Context;
use std::str::FromStr;
use std::time::Duration;

pub struct Config {
    database_url: String,
    server_port: u16,
    jwt_secret: String,
    repository_timeout: Duration,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = load_env("DATABASE_URL")?;
        let server_port = load_env("SERVER_PORT")?;
        let jwt_secret = load_env("JWT_SECRET")?;
        let repository_timeout_ms =
            load_env_or("REPOSITORY_TIMEOUT_MS", DEFAULT_REPOSITORY_TIMEOUT_MS)?;
        Ok(Self {
            database_url,
            server_port,
            jwt_secret,
            repository_timeout: Duration::from_millis(repository_timeout_ms),
        })
    }

    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    #[must_use]
    pub const fn server_port(&self) -> u16 {
        self.server_port
    }

    #[must_use]
    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    #[must_use]
    pub const fn repository_timeout(&self) -> Duration {
        self.repository_timeout
    }
}

fn load_env<T>(key: &str) -> anyhow::Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
{
    let val =
        std::env::var(key).with_context(|| format!("Failed to load environment variable {key}"))?;
    val.parse::<T>()
        .with_context(|| format!("Failed to parse environment variable {key}"))
}

fn load_env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    <T as FromStr>::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(_) => load_env(key),
        Err(std::env::VarError::NotPresent) => Ok(default),
        Err(err) => {
            Err(err).with_context(|| format!("Failed to load environment variable {key}"))
        }
    }
}
