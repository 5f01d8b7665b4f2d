use std::net::SocketAddr;

use api_gateway::{build_router, AppState, GatewayConfig};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let config = GatewayConfig::from_env()?;
    info!(upstream = %config.upstream_base, "relaying to upstream API");

    let ip: std::net::IpAddr = config.host.parse()?;
    let addr = SocketAddr::from((ip, config.port));
    let state = AppState::new(config)?;
    let app = build_router(state);

    println!("starting api-gateway on {addr}");
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
