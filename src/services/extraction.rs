use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::ScannerConfig;
use crate::models::{BatchFileResult, BatchResult, ExtractionResult, UploadedImage};
use crate::services::decoder::BarcodeDecoder;
use crate::utils::validation::{self, ValidationError};

/// Failures the single-image endpoint maps to HTTP status codes. The
/// batch path never sees these as errors; they become `success: false`
/// entries instead.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("extraction worker failed: {0}")]
    Worker(String),
}

/// Orchestrates validate -> raster decode -> barcode decode -> format
/// for single images and batches. Holds no per-request state; every
/// upload is owned by its request and dropped with it.
pub struct ExtractionService {
    config: ScannerConfig,
    decoder: Arc<dyn BarcodeDecoder>,
}

impl ExtractionService {
    pub fn new(config: ScannerConfig, decoder: Arc<dyn BarcodeDecoder>) -> Self {
        Self { config, decoder }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    pub async fn decoder_healthy(&self) -> bool {
        self.decoder.health_check().await
    }

    /// Extract barcodes from one image, propagating validation failures
    /// so the HTTP layer can turn them into 400/413 responses. Decode
    /// outcomes (found / not found / backend fault) are all terminal
    /// `ExtractionResult`s.
    pub async fn try_extract(
        &self,
        image: UploadedImage,
    ) -> Result<ExtractionResult, ExtractError> {
        let filename = image.filename.clone();

        // Validation and raster decode are CPU work; keep them off the
        // async executor.
        let config = self.config.clone();
        let frame = tokio::task::spawn_blocking(move || validation::validate_upload(&image, &config))
            .await
            .map_err(|e| ExtractError::Worker(e.to_string()))??;

        debug!(
            file = %filename,
            width = frame.width,
            height = frame.height,
            "image validated, scanning for barcodes"
        );

        let result = match self.decoder.decode(frame).await {
            Ok(symbols) if symbols.is_empty() => ExtractionResult::no_barcodes(),
            Ok(symbols) => {
                info!(file = %filename, count = symbols.len(), "barcodes extracted");
                ExtractionResult::extracted(symbols)
            }
            Err(e) => ExtractionResult::failure(format!("Error processing image: {}", e)),
        };
        Ok(result)
    }

    /// Extract barcodes from one image, folding every failure mode into
    /// a structured result. Never fails.
    pub async fn extract(&self, image: UploadedImage) -> ExtractionResult {
        match self.try_extract(image).await {
            Ok(result) => result,
            Err(ExtractError::Validation(e)) => ExtractionResult::failure(e.to_string()),
            Err(ExtractError::Worker(e)) => {
                tracing::error!("extraction worker fault: {}", e);
                ExtractionResult::failure("Error processing image: internal fault")
            }
        }
    }

    /// Extract barcodes from every image of a batch. Files are processed
    /// concurrently; one file's failure never aborts the rest, and the
    /// results come back in submission order regardless of completion
    /// order.
    pub async fn extract_batch(&self, images: Vec<UploadedImage>) -> BatchResult {
        let tasks = images.into_iter().map(|image| {
            let filename = image.filename.clone();
            async move {
                let outcome = self.extract(image).await;
                BatchFileResult { filename, outcome }
            }
        });
        // join_all keeps input order at the gather point
        let results = join_all(tasks).await;
        BatchResult::from_entries(results)
    }
}
