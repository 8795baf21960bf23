use std::path::Path;

use crate::config::ScannerConfig;
use crate::decode::LumaFrame;
use crate::models::UploadedImage;
use thiserror::Error;

/// Upload validation failures. Display strings are the user-facing
/// messages; they never include internals or file-system paths.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("File size exceeds maximum limit of {}MB", max / 1024 / 1024)]
    TooLarge { size: usize, max: usize },

    #[error("Invalid file type. Allowed types: {allowed}")]
    UnsupportedFormat { allowed: String },

    #[error("Invalid image: {reason}")]
    CorruptImage { reason: String },
}

/// Validates upload size against the configured ceiling. A blob of
/// exactly `max` bytes passes; one byte over fails.
pub fn validate_file_size(size: usize, max: usize) -> Result<(), ValidationError> {
    if size > max {
        return Err(ValidationError::TooLarge { size, max });
    }
    Ok(())
}

/// Validates the filename extension against the allow-list. A missing
/// extension is rejected the same as a disallowed one.
pub fn validate_extension(filename: &str, config: &ScannerConfig) -> Result<(), ValidationError> {
    let allowed = || ValidationError::UnsupportedFormat {
        allowed: config.allowed_extensions_display(),
    };
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(allowed)?;
    if !config.is_extension_allowed(ext) {
        return Err(allowed());
    }
    Ok(())
}

/// Validates the declared Content-Type, when one was sent. Only a
/// non-image declaration is rejected; absent or unparseable declarations
/// are left to the magic-byte check.
pub fn validate_declared_content_type(declared: Option<&str>) -> Result<(), ValidationError> {
    if let Some(declared) = declared {
        if let Ok(m) = declared.parse::<mime::Mime>() {
            if m.type_() != mime::IMAGE && m != mime::APPLICATION_OCTET_STREAM {
                return Err(ValidationError::CorruptImage {
                    reason: format!("declared content type '{}' is not an image", m.essence_str()),
                });
            }
        }
    }
    Ok(())
}

/// Decodes the blob into a grayscale raster, proving it is a real image.
/// Cheap magic-byte sniff first, full pixel decode second; an empty blob
/// is corrupt, not a pass.
pub fn decode_raster(data: &[u8]) -> Result<LumaFrame, ValidationError> {
    if data.is_empty() {
        return Err(ValidationError::CorruptImage {
            reason: "file is empty".to_string(),
        });
    }
    match infer::get(data) {
        Some(kind) if kind.matcher_type() == infer::MatcherType::Image => {}
        _ => {
            return Err(ValidationError::CorruptImage {
                reason: "file content is not a recognized image format".to_string(),
            });
        }
    }
    let decoded = image::load_from_memory(data).map_err(|e| {
        tracing::debug!("raster decode failed: {}", e);
        ValidationError::CorruptImage {
            reason: "image data could not be decoded".to_string(),
        }
    })?;
    let luma = decoded.to_luma8();
    let (width, height) = (luma.width(), luma.height());
    Ok(LumaFrame::new(luma.into_raw(), width, height))
}

/// Full validation pipeline for one uploaded image. Returns the decoded
/// raster as proof of decodability.
pub fn validate_upload(
    image: &UploadedImage,
    config: &ScannerConfig,
) -> Result<LumaFrame, ValidationError> {
    validate_file_size(image.data.len(), config.max_file_size)?;
    validate_extension(&image.filename, config)?;
    validate_declared_content_type(image.content_type.as_deref())?;
    decode_raster(&image.data)
}
