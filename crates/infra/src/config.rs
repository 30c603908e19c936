//! Configuration loading, from environment variables.
//!
//! | Variable | Default |
//! |---|---|
//! | `DATABASE_URL` | unset: in-memory store |
//! | `BIND_ADDR` | `0.0.0.0:8089` |
//! | `ACCESS_TOKEN_KEY` | required |
//! | `REFRESH_TOKEN_KEY` | required |
//! | `CURSOR_KEY` | required |
//! | `REQUEST_TIMEOUT_SECS` | `15` |
//! | `DATABASE_MAX_CONNECTIONS` | `10` |

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use cardhub_auth::token::MIN_KEY_LEN;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub access_token_key: Vec<u8>,
    pub refresh_token_key: Vec<u8>,
    pub cursor_key: Vec<u8>,
    pub request_timeout: Duration,
    pub database_max_connections: u32,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("database", &self.database_url.as_ref().map(|_| "<set>"))
            .field("bind_addr", &self.bind_addr)
            .field("request_timeout", &self.request_timeout)
            .field("database_max_connections", &self.database_max_connections)
            .finish_non_exhaustive()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let access_token_key = secret(&get, "ACCESS_TOKEN_KEY")?;
        let refresh_token_key = secret(&get, "REFRESH_TOKEN_KEY")?;
        if access_token_key == refresh_token_key {
            return Err(ConfigError::Invalid {
                var: "REFRESH_TOKEN_KEY",
                reason: "must differ from ACCESS_TOKEN_KEY".into(),
            });
        }

        Ok(Self {
            database_url: get("DATABASE_URL"),
            bind_addr: parsed(&get, "BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 8089)))?,
            access_token_key,
            refresh_token_key,
            cursor_key: secret(&get, "CURSOR_KEY")?,
            request_timeout: Duration::from_secs(parsed(&get, "REQUEST_TIMEOUT_SECS", 15)?),
            database_max_connections: parsed(&get, "DATABASE_MAX_CONNECTIONS", 10)?,
        })
    }
}

fn secret<G>(get: &G, var: &'static str) -> Result<Vec<u8>, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let value = get(var).ok_or(ConfigError::Missing(var))?;
    if value.len() < MIN_KEY_LEN {
        return Err(ConfigError::Invalid {
            var,
            reason: format!("must be at least {MIN_KEY_LEN} bytes"),
        });
    }
    Ok(value.into_bytes())
}

fn parsed<G, T>(get: &G, var: &'static str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match get(var) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
