//! HTTP API server for lexirec
//!
//! Exposes attempt ingestion, the recommendation feed and the due-list read
//! path as REST endpoints.

mod routes;
mod types;

pub use routes::{ApiState, create_router};

use anyhow::Result;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// Maximum request body size (1 MB). Prevents OOM from oversized payloads.
const MAX_BODY_SIZE: usize = 1024 * 1024;

/// Start the HTTP API server
pub async fn serve_http(state: ApiState, port: u16, cors_origin: Option<String>) -> Result<()> {
    let state = Arc::new(state);

    // Build CORS layer
    let cors = if let Some(origin) = cors_origin {
        CorsLayer::new()
            .allow_origin(origin.parse::<axum::http::HeaderValue>()?)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        warn!("No CORS origin specified, allowing all origins. Set --cors-origin in production.");
        CorsLayer::very_permissive()
    };

    let app: Router = create_router(state)
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP API server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
