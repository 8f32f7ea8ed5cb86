mod routes;

use axum::{routing::get, Router};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::Result;

/// Observability surface: health and Prometheus metrics.
pub struct Server;

impl Server {
    pub fn build_router() -> Router {
        Router::new()
            .route("/health", get(routes::health))
            .route("/metrics", get(routes::metrics))
            .layer(TraceLayer::new_for_http())
    }

    pub async fn serve(addr: &str) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(addr = %addr, "Observability server listening");
        axum::serve(listener, Self::build_router())
            .await
            .map_err(|e| crate::Error::Internal(e.to_string()))
    }
}
