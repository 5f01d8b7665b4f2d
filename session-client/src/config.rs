use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

const DEFAULT_REVALIDATE_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Gateway origin, e.g. `http://localhost:8088`. Requests are issued
    /// against `{gateway_base}/api/auth/login` and `{gateway_base}/api/proxy/...`.
    pub gateway_base: String,
    /// Cadence of the background credential re-validation pass.
    pub revalidate_interval: Duration,
}

impl SessionConfig {
    pub fn new(gateway_base: impl Into<String>) -> Self {
        let gateway_base = gateway_base.into().trim_end_matches('/').to_string();
        Self {
            gateway_base,
            revalidate_interval: Duration::from_secs(DEFAULT_REVALIDATE_SECS),
        }
    }

    pub fn with_revalidate_interval(mut self, interval: Duration) -> Self {
        self.revalidate_interval = interval;
        self
    }

    pub fn from_env() -> Result<Self> {
        let gateway_base = env::var("GATEWAY_BASE_URL").context("GATEWAY_BASE_URL must be set")?;
        let revalidate_secs = env::var("SESSION_REVALIDATE_SECONDS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(DEFAULT_REVALIDATE_SECS);

        Ok(Self::new(gateway_base)
            .with_revalidate_interval(Duration::from_secs(revalidate_secs.max(1))))
    }
}
