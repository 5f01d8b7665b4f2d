use anyhow::Result;
use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use prometheus::{Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct GatewayMetrics {
    registry: Registry,
    relayed_total: IntCounterVec,
    upstream_failures: IntCounter,
    relay_duration_seconds: Histogram,
}

impl GatewayMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let relayed_total = IntCounterVec::new(
            Opts::new("gateway_relayed_total", "Relayed requests by method and outward status"),
            &["method", "status"],
        )?;
        let upstream_failures = IntCounter::new(
            "gateway_upstream_failures_total",
            "Relay attempts that failed before a normalized upstream response",
        )?;
        let relay_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "gateway_relay_duration_seconds",
                "End-to-end relay duration including the upstream round trip",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        )?;
        registry.register(Box::new(relayed_total.clone()))?;
        registry.register(Box::new(upstream_failures.clone()))?;
        registry.register(Box::new(relay_duration_seconds.clone()))?;
        Ok(Self {
            registry,
            relayed_total,
            upstream_failures,
            relay_duration_seconds,
        })
    }

    pub fn record_relay(&self, method: &str, status: u16, duration: std::time::Duration) {
        self.relayed_total
            .with_label_values(&[method, &status.to_string()])
            .inc();
        self.relay_duration_seconds.observe(duration.as_secs_f64());
    }

    pub fn record_upstream_failure(&self) {
        self.upstream_failures.inc();
    }

    pub fn render(&self) -> Result<Response> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        let response = Response::builder()
            .status(StatusCode::OK)
            .header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            )
            .body(Body::from(buffer))?;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_registered_series() {
        let metrics = GatewayMetrics::new().expect("metrics");
        metrics.record_relay("GET", 200, std::time::Duration::from_millis(12));
        metrics.record_upstream_failure();

        let families = metrics.registry.gather();
        let names: Vec<_> = families.iter().map(|family| family.get_name()).collect();
        assert!(names.contains(&"gateway_relayed_total"));
        assert!(names.contains(&"gateway_upstream_failures_total"));
        assert!(names.contains(&"gateway_relay_duration_seconds"));
    }
}
