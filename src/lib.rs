pub mod config;
pub mod decode;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

use std::sync::Arc;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::cors::{Any, CorsLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::ScannerConfig;
use crate::services::extraction::ExtractionService;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::root,
        handlers::health::health_check,
        handlers::extract::extract_barcode,
        handlers::extract::extract_barcode_batch,
    ),
    components(
        schemas(
            handlers::health::ServiceStatus,
            handlers::extract::ExtractForm,
            handlers::extract::ExtractBatchForm,
            models::SymbologyKind,
            models::Quality,
            models::SymbolRect,
            models::DecodedSymbol,
            models::ExtractionResult,
            models::BatchFileResult,
            models::BatchResult,
        )
    ),
    tags(
        (name = "health", description = "Service liveness endpoints"),
        (name = "extraction", description = "Barcode extraction endpoints")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub extraction: Arc<ExtractionService>,
    pub config: ScannerConfig,
}

/// Headroom on top of the configured file size for multipart framing, so
/// a file of exactly the maximum size still reaches our own size check.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn create_app(state: AppState) -> Router {
    // All origins are allowed by contract; no credential gating.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let single_body_limit = state.config.max_file_size + MULTIPART_OVERHEAD;

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::health_check))
        .route(
            "/extract-barcode",
            post(handlers::extract::extract_barcode)
                .layer(DefaultBodyLimit::max(single_body_limit)),
        )
        .route(
            "/extract-barcode-batch",
            // Per-file sizes are enforced by the validator; the batch
            // body as a whole carries N files and gets no extra cap.
            post(handlers::extract::extract_barcode_batch).layer(DefaultBodyLimit::disable()),
        )
        .layer(cors)
        .with_state(state)
}
