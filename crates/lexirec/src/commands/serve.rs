//! Start the HTTP API server.

use anyhow::Result;
use lexirec_recommend::RecommendationEngine;
use lexirec_store::ContentStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use super::common::resolve_db_path;
use crate::http::{ApiState, serve_http};

pub async fn serve(database: Option<PathBuf>, port: u16, cors_origin: Option<String>) -> Result<()> {
    let db_path = resolve_db_path(database)?;

    info!("Starting lexirec API server");
    info!("Database: {:?}", db_path);

    let store = Arc::new(ContentStore::open(&db_path)?);
    let engine = Arc::new(RecommendationEngine::with_default_model(Arc::clone(&store)));

    serve_http(ApiState { store, engine }, port, cors_origin).await
}
