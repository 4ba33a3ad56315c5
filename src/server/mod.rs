pub mod handlers;
pub mod state;

use axum::routing::get;
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

pub use state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/nearby", get(handlers::nearby))
        .route("/api/times", get(handlers::prayer_times))
        .route("/api/session", get(handlers::session))
        .route("/api/places", axum::routing::post(handlers::submit_place))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn start(host: &str, port: u16, state: Arc<AppState>) -> std::io::Result<()> {
    let app = build_router(state);
    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("masjid server listening on http://{}", addr);
    axum::serve(listener, app).await
}
