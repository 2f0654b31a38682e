//! HTTP API gateway for docchat.
//!
//! Exposes REST endpoints for uploading PDFs, listing and deleting
//! stored documents, and asking questions grounded in a selection of
//! documents.
//!
//! Built on Axum for high performance async HTTP.

pub mod api;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::{
    Router,
    response::Json,
    routing::{delete, get, post},
};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tracing::info;

use docchat_context::ContextAssembler;
use docchat_core::answer::Answerer;
use docchat_core::ocr::OcrEngine;
use docchat_core::store::DocumentStore;
use docchat_providers::{FlowAnswerer, RemoteOcrEngine};
use docchat_store::{InMemoryStore, SqliteStore};

/// Shared application state for the gateway.
///
/// Everything in here is either `Arc`'d or stateless, so handlers clone
/// freely and long OCR calls never hold a lock that would block listing
/// or chat.
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub ocr: Arc<dyn OcrEngine>,
    pub answerer: Arc<dyn Answerer>,
    pub assembler: ContextAssembler,
}

impl AppState {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        ocr: Arc<dyn OcrEngine>,
        answerer: Arc<dyn Answerer>,
    ) -> Self {
        let assembler = ContextAssembler::new(store.clone());
        Self {
            store,
            ocr,
            answerer,
            assembler,
        }
    }
}

pub type SharedState = Arc<AppState>;

/// Build the Axum router with all gateway routes.
///
/// Layers applied:
/// - CORS with explicit methods and headers
/// - Request body size limit (`max_upload_mb`, PDFs are large)
/// - HTTP trace logging
pub fn build_router(state: SharedState, max_upload_mb: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::DELETE,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/documents", post(api::upload_document_handler))
        .route("/documents", get(api::list_documents_handler))
        .route("/documents/{id}", delete(api::delete_document_handler))
        .route("/chat", post(api::chat_handler))
        .layer(DefaultBodyLimit::max(max_upload_mb * 1024 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the gateway HTTP server.
///
/// Builds the store, OCR engine, and answerer from config once and
/// shares them via `Arc` across all handlers.
pub async fn start(config: docchat_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let host = config.gateway.host.clone();
    let port = config.gateway.port;
    let addr = format!("{host}:{port}");

    let store: Arc<dyn DocumentStore> = match config.store.backend.as_str() {
        "memory" => Arc::new(InMemoryStore::new()),
        _ => {
            let path = config.store.sqlite_path();
            Arc::new(SqliteStore::new(&path).await?)
        }
    };
    info!(backend = store.name(), "Document store ready");

    let ocr: Arc<dyn OcrEngine> = Arc::new(RemoteOcrEngine::from_config(&config.ocr));
    let answerer: Arc<dyn Answerer> = Arc::new(FlowAnswerer::from_config(&config.answer)?);

    let state = Arc::new(AppState::new(store, ocr, answerer));
    let app = build_router(state, config.gateway.max_upload_mb);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn health_endpoint() {
        let app = build_router(api::tests::test_state(), 25);

        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
