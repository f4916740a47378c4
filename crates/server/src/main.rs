use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use shared::protocol::{API_PREDICT_ROUTE, HEALTH_ROUTE, PREDICT_ROUTE};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

mod app_state;
mod config;
mod proxy;

use app_state::AppState;
use config::{load_settings, normalize_upstream_base, validate_upstream_base};
use proxy::relay_predict;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let upstream_base = normalize_upstream_base(&settings.spam_api_url);
    if let Err(error) = validate_upstream_base(&upstream_base) {
        warn!(
            %upstream_base,
            error = %format!("{error:#}"),
            "upstream base url looks invalid; predict calls will fail until it is fixed"
        );
    }

    let http = reqwest::Client::builder()
        .build()
        .context("failed to build upstream http client")?;
    let state = AppState {
        http,
        upstream_base,
    };
    info!(upstream = %state.upstream_base, "forwarding predict requests");
    let app = build_router(Arc::new(state));

    let addr: SocketAddr = settings
        .server_bind
        .parse()
        .with_context(|| format!("invalid bind address '{}'", settings.server_bind))?;
    info!(%addr, "proxy listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(HEALTH_ROUTE, get(healthz))
        .route(PREDICT_ROUTE, post(relay_predict))
        .route(API_PREDICT_ROUTE, post(relay_predict))
        // Body size is upstream's call, not ours.
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;

#[cfg(test)]
#[path = "tests/e2e_tests.rs"]
mod e2e_tests;
