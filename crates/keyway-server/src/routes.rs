//! Router for the console server.
//!
//! Serves the built console from a static directory with single-page-app
//! fallback to `index.html`, plus a health endpoint. Every route sits behind
//! the access gateway.

use std::path::Path;
use std::sync::Arc;

use axum::middleware as axum_mw;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

use crate::gateway::{access_gateway, GatewayPolicy};

/// Response body for `GET /healthz`.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

async fn healthz() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Build the application router.
pub fn build_router(policy: Arc<GatewayPolicy>, static_dir: &Path) -> Router {
    let console = ServeDir::new(static_dir)
        .append_index_html_on_directories(true)
        .fallback(ServeFile::new(static_dir.join("index.html")));

    Router::new()
        .route("/healthz", get(healthz))
        .fallback_service(console)
        .layer(axum_mw::from_fn_with_state(policy, access_gateway))
        .layer(TraceLayer::new_for_http())
}
