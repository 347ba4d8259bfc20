//! Runtime configuration, read from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `PORT` | `3000` |
//! | `DATABASE_URL` | unset (in-memory store) |
//! | `DATABASE_MAX_CONNECTIONS` | `5` |
//! | `CLASSIFIER_URL` | `http://127.0.0.1:8000` |
//! | `CLASSIFIER_TIMEOUT_MS` | `5000` |
//! | `SIMILARITY_URL` | `http://127.0.0.1:8000` |
//! | `SIMILARITY_TIMEOUT_MS` | `5000` |
//! | `JWT_SECRET` | unset |
//! | `JWT_ISSUER` | unset (issuer not checked) |
//! | `JWT_AUDIENCE` | unset (audience not checked) |
//! | `CORS_ORIGIN` | `http://localhost:5173` |

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_ML_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_EXTERNAL_TIMEOUT: Duration = Duration::from_millis(5000);
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

/// Base URL and request timeout of one external HTTP service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for ServiceEndpoint {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_ML_BASE_URL.to_string(),
            timeout: DEFAULT_EXTERNAL_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub bind_addr: SocketAddr,
    /// Postgres connection string; the in-memory store is used when absent.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub classifier: ServiceEndpoint,
    pub similarity: ServiceEndpoint,
    /// HMAC secret for bearer tokens. Callers fall back to a dev secret when absent.
    pub jwt_secret: Option<String>,
    /// Required `iss` claim, when set.
    pub jwt_issuer: Option<String>,
    /// Required `aud` claim, when set.
    pub jwt_audience: Option<String>,
    pub cors_origin: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            database_url: None,
            database_max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
            classifier: ServiceEndpoint::default(),
            similarity: ServiceEndpoint::default(),
            jwt_secret: None,
            jwt_issuer: None,
            jwt_audience: None,
            cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
        }
    }
}

impl CatalogConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let port: u16 = parse(&get, "PORT")?.unwrap_or(DEFAULT_PORT);

        let classifier = ServiceEndpoint {
            base_url: get("CLASSIFIER_URL").unwrap_or(defaults.classifier.base_url),
            timeout: parse_millis(&get, "CLASSIFIER_TIMEOUT_MS")?.unwrap_or(defaults.classifier.timeout),
        };
        let similarity = ServiceEndpoint {
            base_url: get("SIMILARITY_URL").unwrap_or(defaults.similarity.base_url),
            timeout: parse_millis(&get, "SIMILARITY_TIMEOUT_MS")?.unwrap_or(defaults.similarity.timeout),
        };

        let database_max_connections = match parse::<u32, _>(&get, "DATABASE_MAX_CONNECTIONS")? {
            Some(0) => {
                return Err(ConfigError::Invalid {
                    key: "DATABASE_MAX_CONNECTIONS",
                    message: "must be at least 1".to_string(),
                });
            }
            Some(n) => n,
            None => defaults.database_max_connections,
        };

        Ok(Self {
            bind_addr: SocketAddr::new(defaults.bind_addr.ip(), port),
            database_url: get("DATABASE_URL"),
            database_max_connections,
            classifier,
            similarity,
            jwt_secret: get("JWT_SECRET"),
            jwt_issuer: get("JWT_ISSUER"),
            jwt_audience: get("JWT_AUDIENCE"),
            cors_origin: get("CORS_ORIGIN").unwrap_or(defaults.cors_origin),
        })
    }
}

fn parse<T, G>(get: &G, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    get(key)
        .map(|raw| {
            raw.parse::<T>().map_err(|e| ConfigError::Invalid {
                key,
                message: format!("{raw:?}: {e}"),
            })
        })
        .transpose()
}

fn parse_millis<G>(get: &G, key: &'static str) -> Result<Option<Duration>, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    match parse::<u64, _>(get, key)? {
        Some(0) => Err(ConfigError::Invalid {
            key,
            message: "timeout must be greater than zero".to_string(),
        }),
        other => Ok(other.map(Duration::from_millis)),
    }
}
