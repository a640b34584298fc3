use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub max_lifetime: Duration,
    pub idle_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub host: String,
    pub port: u16,
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = match std::env::var("DATABASE_URL") {
            Ok(v) if !v.trim().is_empty() => v,
            _ => database_url_from_parts(
                &env_or("POSTGRES_USER", "postgres"),
                &env_or("POSTGRES_PASSWORD", "postgres"),
                &env_or("POSTGRES_HOST", "127.0.0.1"),
                &env_or("POSTGRES_PORT", "5432"),
                &env_or("POSTGRES_DB", "user_directory"),
            ),
        };
        Ok(Self {
            url,
            max_connections: env_parse("DB_MAX_CONNECTIONS", 50)?,
            min_connections: env_parse("DB_MIN_CONNECTIONS", 10)?,
            max_lifetime: Duration::from_secs(60 * 60),
            idle_timeout: Duration::from_secs(15 * 60),
        })
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database = DatabaseConfig::from_env()?;
        let host = env_or("APP_HOST", "0.0.0.0");
        let port = match std::env::var("APP_PORT") {
            Ok(_) => env_parse("APP_PORT", 8080)?,
            Err(_) => env_parse("PORT", 8080)?,
        };
        Ok(Self {
            database,
            host,
            port,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn database_url_from_parts(user: &str, password: &str, host: &str, port: &str, db: &str) -> String {
    format!("postgres://{user}:{password}@{host}:{port}/{db}")
}

fn env_or(name: &str, fallback: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| fallback.into())
}

fn env_parse<T>(name: &'static str, fallback: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
                name,
                reason: e.to_string(),
            })
        }
        _ => Ok(fallback),
    }
}
