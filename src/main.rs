use std::net::SocketAddr;
use std::sync::Arc;

use barcode_scanner_api::config::ScannerConfig;
use barcode_scanner_api::decode::ScanOptions;
use barcode_scanner_api::services::decoder::{BarcodeDecoder, create_decoder};
use barcode_scanner_api::services::extraction::ExtractionService;
use barcode_scanner_api::{AppState, create_app};
use dotenvy::dotenv;
use tokio::signal;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    // Initialize tracing with EnvFilter
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "barcode_scanner_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting Universal Barcode Scanner API...");

    let config = ScannerConfig::from_env();
    info!(
        "🛡️  Upload Config: Max Size={}MB, Extensions=[{}], Decoder={}",
        config.max_file_size / 1024 / 1024,
        config.allowed_extensions_display(),
        config.decoder_kind
    );

    // Spool directory for uploads held on disk
    std::fs::create_dir_all(&config.upload_temp_dir)?;

    let scan_options = ScanOptions {
        scan_rows: config.scan_rows,
        ..ScanOptions::default()
    };
    let decoder: Arc<dyn BarcodeDecoder> =
        Arc::from(create_decoder(&config.decoder_kind, scan_options));
    if decoder.health_check().await {
        info!("🔎 Barcode decoder '{}' ready", decoder.name());
    } else {
        warn!("⚠️  Barcode decoder '{}' reported unhealthy", decoder.name());
    }

    let extraction = Arc::new(ExtractionService::new(config.clone(), decoder));
    let state = AppState {
        extraction,
        config: config.clone(),
    };

    let app = create_app(state).layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &axum::http::Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    uri = %request.uri(),
                )
            })
            .on_request(|request: &axum::http::Request<_>, _span: &tracing::Span| {
                info!("📥 {} {}", request.method(), request.uri());
            })
            .on_response(
                |response: &axum::http::Response<_>,
                 latency: std::time::Duration,
                 _span: &tracing::Span| {
                    info!(
                        "📤 Finished in {:?} with status {}",
                        latency,
                        response.status()
                    );
                },
            ),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], 8000));
    info!("✅ Server ready at http://{}", addr);
    info!("📖 Swagger UI: http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("🛑 Server shut down gracefully.");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("⌨️  Ctrl+C received, starting graceful shutdown...");
        },
        _ = terminate => {
            info!("💤 SIGTERM received, starting graceful shutdown...");
        },
    }
}
