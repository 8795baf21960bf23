use bytes::Bytes;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One uploaded image, owned by the request that carried it.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadedImage {
    pub fn new(filename: impl Into<String>, content_type: Option<String>, data: Bytes) -> Self {
        Self {
            filename: filename.into(),
            content_type,
            data,
        }
    }
}

/// Barcode encoding standard of a decoded symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum SymbologyKind {
    Ean13,
    Upca,
    Code128,
    Qrcode,
    Pdf417,
    Unknown,
}

impl std::fmt::Display for SymbologyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SymbologyKind::Ean13 => "EAN13",
            SymbologyKind::Upca => "UPCA",
            SymbologyKind::Code128 => "CODE128",
            SymbologyKind::Qrcode => "QRCODE",
            SymbologyKind::Pdf417 => "PDF417",
            SymbologyKind::Unknown => "UNKNOWN",
        };
        write!(f, "{}", s)
    }
}

/// Whether the decoder fully recovered the payload or only located a
/// candidate region it could not confidently read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Readable,
    Unreadable,
}

/// Bounding rectangle in pixel coordinates of the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct SymbolRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// One decoded barcode instance. Produced by the decode adapter,
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DecodedSymbol {
    #[serde(rename = "type")]
    pub symbology: SymbologyKind,
    pub data: String,
    pub quality: Quality,
    pub rect: SymbolRect,
}

impl DecodedSymbol {
    /// De-duplication key: two symbols with the same symbology, payload
    /// and rectangle are the same detection.
    pub fn dedup_key(&self) -> (SymbologyKind, String, SymbolRect) {
        (self.symbology, self.data.clone(), self.rect)
    }
}

/// Outcome of extracting barcodes from one image. All failure modes are
/// folded into `success: false` with a human-readable message.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ExtractionResult {
    pub success: bool,
    pub message: String,
    pub count: usize,
    #[serde(rename = "barcodes")]
    pub symbols: Vec<DecodedSymbol>,
}

impl ExtractionResult {
    /// Terminal failure state (validation or decode fault).
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            count: 0,
            symbols: Vec::new(),
        }
    }

    /// Valid image, zero detectable symbols. Not an error.
    pub fn no_barcodes() -> Self {
        Self::failure("No barcodes found in the image")
    }

    /// At least one symbol decoded. Symbol order is the backend return
    /// order and is kept as-is.
    pub fn extracted(symbols: Vec<DecodedSymbol>) -> Self {
        let count = symbols.len();
        Self {
            success: true,
            message: format!("Successfully extracted {} barcode(s)", count),
            count,
            symbols,
        }
    }
}

/// Per-file entry of a batch response: the filename plus the flattened
/// extraction outcome for that file.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BatchFileResult {
    pub filename: String,
    #[serde(flatten)]
    pub outcome: ExtractionResult,
}

/// Aggregated outcome of a batch request. `success` means "at least one
/// file yielded a barcode", not "all files succeeded"; existing clients
/// depend on this reading.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BatchResult {
    pub success: bool,
    pub total_files: usize,
    pub results: Vec<BatchFileResult>,
}

impl BatchResult {
    pub fn from_entries(results: Vec<BatchFileResult>) -> Self {
        Self {
            success: results.iter().any(|r| r.outcome.success),
            total_files: results.len(),
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracted_message_and_count() {
        let symbol = DecodedSymbol {
            symbology: SymbologyKind::Ean13,
            data: "5901234123457".to_string(),
            quality: Quality::Readable,
            rect: SymbolRect {
                x: 10,
                y: 0,
                width: 190,
                height: 64,
            },
        };
        let result = ExtractionResult::extracted(vec![symbol]);
        assert!(result.success);
        assert_eq!(result.count, 1);
        assert_eq!(result.message, "Successfully extracted 1 barcode(s)");
    }

    #[test]
    fn test_no_barcodes_is_failure_with_fixed_message() {
        let result = ExtractionResult::no_barcodes();
        assert!(!result.success);
        assert_eq!(result.count, 0);
        assert!(result.symbols.is_empty());
        assert_eq!(result.message, "No barcodes found in the image");
    }

    #[test]
    fn test_symbol_serializes_with_wire_field_names() {
        let symbol = DecodedSymbol {
            symbology: SymbologyKind::Code128,
            data: "HELLO".to_string(),
            quality: Quality::Readable,
            rect: SymbolRect {
                x: 1,
                y: 2,
                width: 3,
                height: 4,
            },
        };
        let json = serde_json::to_value(&symbol).unwrap();
        assert_eq!(json["type"], "CODE128");
        assert_eq!(json["quality"], "readable");
        assert_eq!(json["rect"]["width"], 3);
    }

    #[test]
    fn test_extraction_result_serializes_symbols_as_barcodes() {
        let json = serde_json::to_value(ExtractionResult::no_barcodes()).unwrap();
        assert!(json.get("barcodes").is_some());
        assert!(json.get("symbols").is_none());
    }

    #[test]
    fn test_batch_success_means_any_file_succeeded() {
        let entries = vec![
            BatchFileResult {
                filename: "a.png".to_string(),
                outcome: ExtractionResult::no_barcodes(),
            },
            BatchFileResult {
                filename: "b.png".to_string(),
                outcome: ExtractionResult::extracted(vec![DecodedSymbol {
                    symbology: SymbologyKind::Upca,
                    data: "036000291452".to_string(),
                    quality: Quality::Readable,
                    rect: SymbolRect {
                        x: 0,
                        y: 0,
                        width: 10,
                        height: 10,
                    },
                }]),
            },
        ];
        let batch = BatchResult::from_entries(entries);
        assert!(batch.success);
        assert_eq!(batch.total_files, 2);

        let all_failed = BatchResult::from_entries(vec![BatchFileResult {
            filename: "a.png".to_string(),
            outcome: ExtractionResult::failure("Invalid image: broken"),
        }]);
        assert!(!all_failed.success);
    }

    #[test]
    fn test_batch_entry_flattens_outcome() {
        let entry = BatchFileResult {
            filename: "scan.jpg".to_string(),
            outcome: ExtractionResult::no_barcodes(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["filename"], "scan.jpg");
        assert_eq!(json["success"], false);
        assert_eq!(json["count"], 0);
    }
}
