//! HTTP surface for the chat pipeline.
//!
//! Routes:
//! - `GET /` - built-in browser UI
//! - `GET /query?question=..&session=..` - answer one question
//! - `GET /health` - liveness plus index size

mod error;
mod handlers;

use axum::routing::get;
use axum::Router;
use docchat_core::{AppResult, ServerConfig};
use docchat_knowledge::ChatEngine;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

/// Shared state behind every handler.
pub struct AppState {
    pub engine: ChatEngine,
    pub dataset: String,
}

/// Build the application router.
pub fn router(state: Arc<AppState>, static_dir: Option<&Path>) -> Router {
    let router = Router::new()
        .route("/", get(handlers::index))
        .route("/query", get(handlers::query))
        .route("/health", get(handlers::health));

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router,
    };

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: Arc<AppState>, config: &ServerConfig) -> AppResult<()> {
    if let Some(ref dir) = config.static_dir {
        tracing::info!("Serving static assets from {:?}", dir);
    }
    let app = router(state, config.static_dir.as_deref());

    let listener = tokio::net::TcpListener::bind(&config.bind).await?;
    tracing::info!("docchat listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
