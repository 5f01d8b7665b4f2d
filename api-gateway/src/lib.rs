pub mod app_state;
pub mod config;
pub mod metrics;
pub mod proxy_handlers;

pub use crate::app_state::AppState;
pub use crate::config::GatewayConfig;
pub use crate::metrics::GatewayMetrics;

use axum::extract::State;
use axum::http::{header::AUTHORIZATION, header::CONTENT_TYPE, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::proxy_handlers::{login_relay, preflight, relay};

async fn health() -> &'static str {
    "ok"
}

async fn render_metrics(State(state): State<AppState>) -> Response {
    match state.metrics.render() {
        Ok(response) => response,
        Err(err) => {
            warn!(error = %err, "failed to encode metrics");
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    Router::new()
        .route("/healthz", get(health))
        .route("/metrics", get(render_metrics))
        .route("/api/auth/login", axum::routing::post(login_relay))
        .route(
            "/api/proxy/*path",
            get(relay)
                .post(relay)
                .put(relay)
                .delete(relay)
                .options(preflight),
        )
        .with_state(state)
        .layer(cors)
}
