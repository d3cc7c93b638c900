//! HTTP server for the operator UI.
//!
//! | Route            | Response                                              |
//! |------------------|-------------------------------------------------------|
//! | `GET /api/mappings` | The mapping file as JSON, re-read on every request |
//! | `GET /`          | The index page                                        |
//! | anything else    | Static files from the public directory                |
//!
//! The mapping endpoint reads the file fresh each time, so edits on disk show
//! up in the UI immediately even though the bridge itself keeps the table it
//! loaded at startup.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::time::Duration;

use anyhow::Context;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{error, info};

use crate::infrastructure::storage::read_mapping_document;

/// Paths the HTTP handlers serve from.
#[derive(Debug, Clone)]
pub struct HttpState {
    pub mappings_path: PathBuf,
    pub index_file: PathBuf,
    pub public_dir: PathBuf,
}

/// Builds the router.
pub fn router(state: HttpState) -> Router {
    let index = ServeFile::new(&state.index_file);
    let assets = ServeDir::new(&state.public_dir);

    Router::new()
        .route("/api/mappings", get(get_mappings))
        .route_service("/", index)
        .fallback_service(assets)
        .with_state(Arc::new(state))
}

async fn get_mappings(State(state): State<Arc<HttpState>>) -> Response {
    match read_mapping_document(&state.mappings_path).await {
        Ok(document) => {
            info!("/api/mappings requested");
            Json(document).into_response()
        }
        Err(e) => {
            error!("failed to serve mappings: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to load mappings" })),
            )
                .into_response()
        }
    }
}

/// Binds `bind_addr` and serves until `running` is cleared.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn run_http_server(
    bind_addr: SocketAddr,
    state: HttpState,
    running: Arc<AtomicBool>,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind HTTP listener on {bind_addr}"))?;

    info!("HTTP server running at http://{bind_addr}");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            while running.load(Ordering::Relaxed) {
                tokio::time::sleep(Duration::from_millis(200)).await;
            }
            info!("shutdown flag set; stopping HTTP server");
        })
        .await
        .context("HTTP server failed")
}
