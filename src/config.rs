use axum::http::HeaderValue;
use std::net::SocketAddr;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORT must be a number between 0 and 65535, got {0:?}")]
    InvalidPort(String),
    #[error("BIND_ADDR is not a valid socket address: {0:?}")]
    InvalidBindAddr(String),
    #[error("CORS_ALLOW_ORIGIN is not a valid header value: {0:?}")]
    InvalidCorsOrigin(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigin {
    Any,
    Exact(HeaderValue),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub cors_origin: Option<CorsOrigin>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_addr = match lookup("BIND_ADDR").filter(|raw| !raw.trim().is_empty()) {
            Some(raw) => raw
                .trim()
                .parse::<SocketAddr>()
                .map_err(|_| ConfigError::InvalidBindAddr(raw))?,
            None => {
                let port = match lookup("PORT").filter(|raw| !raw.trim().is_empty()) {
                    Some(raw) => raw
                        .trim()
                        .parse::<u16>()
                        .map_err(|_| ConfigError::InvalidPort(raw))?,
                    None => DEFAULT_PORT,
                };
                SocketAddr::from(([0, 0, 0, 0], port))
            }
        };

        let cors_origin = match lookup("CORS_ALLOW_ORIGIN").map(|raw| raw.trim().to_string()) {
            Some(raw) if raw.is_empty() => None,
            Some(raw) if raw == "*" => Some(CorsOrigin::Any),
            Some(raw) => Some(CorsOrigin::Exact(
                HeaderValue::from_str(&raw).map_err(|_| ConfigError::InvalidCorsOrigin(raw.clone()))?,
            )),
            None => None,
        };

        Ok(Self {
            bind_addr,
            cors_origin,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)),
            cors_origin: None,
        }
    }
}
