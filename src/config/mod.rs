use std::env;

/// Service identity reported by the health endpoints.
pub const SERVICE_NAME: &str = "Universal Barcode Scanner API";

/// Scanner configuration for image uploads and decoding.
///
/// Passed explicitly into the validator and handlers at construction
/// time; there is no ambient global state, so tests can run with their
/// own limits.
#[derive(Debug, Clone)]
pub struct ScannerConfig {
    /// Maximum upload size in bytes (default: 10 MB)
    pub max_file_size: usize,

    /// Allowed filename extensions, lowercase, without the dot
    pub allowed_extensions: Vec<String>,

    /// Directory for spooled uploads (default: "temp")
    pub upload_temp_dir: String,

    /// Decoder backend: "builtin" or "disabled" (default: "builtin")
    pub decoder_kind: String,

    /// Number of horizontal scan lines sampled per image (default: 15)
    pub scan_rows: usize,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024, // 10 MB
            allowed_extensions: ["jpg", "jpeg", "png", "gif", "bmp"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            upload_temp_dir: "temp".to_string(),
            decoder_kind: "builtin".to_string(),
            scan_rows: 15,
        }
    }
}

impl ScannerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            max_file_size: env::var("MAX_FILE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.max_file_size),

            allowed_extensions: env::var("ALLOWED_EXTENSIONS")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().trim_start_matches('.').to_lowercase())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or(default.allowed_extensions),

            upload_temp_dir: env::var("UPLOAD_TEMP_DIR").unwrap_or(default.upload_temp_dir),

            decoder_kind: env::var("BARCODE_DECODER").unwrap_or(default.decoder_kind),

            scan_rows: env::var("SCAN_ROWS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.scan_rows),
        }
    }

    /// Human-readable allow-list for error messages ("jpg, jpeg, png, ...")
    pub fn allowed_extensions_display(&self) -> String {
        self.allowed_extensions.join(", ")
    }

    /// True when the extension (lowercase, no dot) is accepted.
    pub fn is_extension_allowed(&self, extension: &str) -> bool {
        let ext = extension.to_lowercase();
        self.allowed_extensions.iter().any(|a| *a == ext)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ScannerConfig::default();
        assert_eq!(config.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.allowed_extensions.len(), 5);
        assert_eq!(config.upload_temp_dir, "temp");
        assert_eq!(config.decoder_kind, "builtin");
        assert_eq!(config.scan_rows, 15);
    }

    #[test]
    fn test_extension_check_is_case_insensitive() {
        let config = ScannerConfig::default();
        assert!(config.is_extension_allowed("jpg"));
        assert!(config.is_extension_allowed("JPG"));
        assert!(config.is_extension_allowed("Png"));
        assert!(!config.is_extension_allowed("txt"));
        assert!(!config.is_extension_allowed("webp"));
    }

    #[test]
    fn test_allowed_extensions_display() {
        let config = ScannerConfig {
            allowed_extensions: vec!["jpg".to_string(), "png".to_string()],
            ..ScannerConfig::default()
        };
        assert_eq!(config.allowed_extensions_display(), "jpg, png");
    }
}
