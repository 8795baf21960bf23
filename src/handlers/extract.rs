use axum::{
    Json,
    extract::{Multipart, State},
};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::models::{BatchResult, ExtractionResult, UploadedImage};

/// OpenAPI shape of the single-upload form.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ExtractForm {
    #[schema(value_type = String, format = Binary)]
    file: String,
}

/// OpenAPI shape of the batch-upload form.
#[derive(ToSchema)]
#[allow(dead_code)]
pub struct ExtractBatchForm {
    #[schema(value_type = Vec<String>, format = Binary)]
    files: Vec<String>,
}

/// Multipart read failures keep their HTTP meaning: a tripped body
/// limit is 413, everything else is a malformed request.
fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    if e.status() == axum::http::StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(e.to_string())
    } else {
        AppError::BadRequest(e.to_string())
    }
}

async fn read_image_field(field: axum::extract::multipart::Field<'_>) -> Result<UploadedImage, AppError> {
    let filename = field.file_name().unwrap_or("unnamed").to_string();
    let content_type = field.content_type().map(|s| s.to_string());
    let data = field.bytes().await.map_err(multipart_error)?;
    Ok(UploadedImage::new(filename, content_type, data))
}

#[utoipa::path(
    post,
    path = "/extract-barcode",
    request_body(content = ExtractForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Extraction outcome (found or not found)", body = ExtractionResult),
        (status = 400, description = "Unsupported format or corrupt image"),
        (status = 413, description = "File exceeds the size limit"),
        (status = 500, description = "Unexpected backend fault")
    ),
    tag = "extraction"
)]
pub async fn extract_barcode(
    State(state): State<crate::AppState>,
    mut multipart: Multipart,
) -> Result<Json<ExtractionResult>, AppError> {
    let mut upload: Option<UploadedImage> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some("file") {
            upload = Some(read_image_field(field).await?);
        }
    }

    let image = upload.ok_or_else(|| AppError::BadRequest("No file provided".to_string()))?;
    tracing::debug!(file = %image.filename, bytes = image.data.len(), "single extraction request");

    // Validation failures become status codes here; decode outcomes are
    // always a 200 with a structured body.
    let result = state.extraction.try_extract(image).await?;
    Ok(Json(result))
}

#[utoipa::path(
    post,
    path = "/extract-barcode-batch",
    request_body(content = ExtractBatchForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Per-file outcomes in submission order", body = BatchResult),
        (status = 400, description = "Malformed multipart request or no files"),
        (status = 500, description = "Unexpected backend fault")
    ),
    tag = "extraction"
)]
pub async fn extract_barcode_batch(
    State(state): State<crate::AppState>,
    mut multipart: Multipart,
) -> Result<Json<BatchResult>, AppError> {
    let mut images: Vec<UploadedImage> = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some("files") {
            images.push(read_image_field(field).await?);
        }
    }

    if images.is_empty() {
        return Err(AppError::BadRequest("No files provided".to_string()));
    }
    tracing::debug!(files = images.len(), "batch extraction request");

    // Per-file failures are embedded in the results; the batch call
    // itself succeeds whenever the request was well-formed.
    let batch = state.extraction.extract_batch(images).await;
    Ok(Json(batch))
}
