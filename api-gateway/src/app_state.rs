use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

use crate::config::GatewayConfig;
use crate::metrics::GatewayMetrics;

/// Shared application state. The gateway is stateless per request; this is
/// just configuration, the pooled upstream client, and counters.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub http: Client,
    pub metrics: GatewayMetrics,
}

impl AppState {
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.upstream_timeout_secs))
            .build()
            .context("failed to build upstream HTTP client")?;
        let metrics = GatewayMetrics::new()?;
        Ok(Self {
            config: Arc::new(config),
            http,
            metrics,
        })
    }
}
