use anyhow::{Context, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Upstream API base, e.g. `http://api.example.internal/api`. No
    /// trailing slash.
    pub upstream_base: String,
    pub host: String,
    pub port: u16,
    /// Bounded upstream timeout; requests fail once, nothing is retried.
    pub upstream_timeout_secs: u64,
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self> {
        let upstream_base = env::var("UPSTREAM_API_BASE")
            .context("UPSTREAM_API_BASE must be set for api-gateway")?
            .trim_end_matches('/')
            .to_string();
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(8088);
        let upstream_timeout_secs = env::var("UPSTREAM_TIMEOUT_SECONDS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(30);

        Ok(Self {
            upstream_base,
            host,
            port,
            upstream_timeout_secs: upstream_timeout_secs.max(1),
        })
    }
}
