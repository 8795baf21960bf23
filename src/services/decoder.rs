use crate::decode::{self, LumaFrame, ScanOptions};
use crate::models::DecodedSymbol;
use thiserror::Error;

/// Genuine backend faults. "No symbol found" is NOT an error; it is an
/// empty result.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed pixel buffer: {width}x{height} declared, {actual} bytes provided")]
    MalformedBuffer {
        width: u32,
        height: u32,
        actual: usize,
    },

    #[error("decode worker failed: {0}")]
    Worker(String),
}

/// Boundary to the barcode decoding capability. The orchestration layer
/// only sees this trait, so the engine behind it is swappable.
#[async_trait::async_trait]
pub trait BarcodeDecoder: Send + Sync {
    /// Decode every configured symbology in the frame. An empty vec
    /// means "nothing found"; `Err` is reserved for backend faults.
    async fn decode(&self, frame: LumaFrame) -> Result<Vec<DecodedSymbol>, DecodeError>;

    /// Check if the decoder is available/healthy
    async fn health_check(&self) -> bool;

    fn name(&self) -> &'static str;
}

/// Built-in pure-Rust row-scan engine (EAN-13/UPC-A, Code 128).
///
/// Decoding is CPU-bound, so the scan runs on the blocking pool.
pub struct RowScanDecoder {
    options: ScanOptions,
}

impl RowScanDecoder {
    pub fn new(options: ScanOptions) -> Self {
        Self { options }
    }
}

impl Default for RowScanDecoder {
    fn default() -> Self {
        Self::new(ScanOptions::default())
    }
}

#[async_trait::async_trait]
impl BarcodeDecoder for RowScanDecoder {
    async fn decode(&self, frame: LumaFrame) -> Result<Vec<DecodedSymbol>, DecodeError> {
        if !frame.is_well_formed() {
            return Err(DecodeError::MalformedBuffer {
                width: frame.width,
                height: frame.height,
                actual: frame.data.len(),
            });
        }
        let options = self.options.clone();
        let symbols = tokio::task::spawn_blocking(move || decode::scan_frame(&frame, &options))
            .await
            .map_err(|e| DecodeError::Worker(e.to_string()))?;
        tracing::debug!(count = symbols.len(), "row scan finished");
        Ok(symbols)
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "builtin"
    }
}

/// Decoder that never finds anything. Useful when the service should run
/// without decoding (development, load testing).
pub struct DisabledDecoder;

#[async_trait::async_trait]
impl BarcodeDecoder for DisabledDecoder {
    async fn decode(&self, _frame: LumaFrame) -> Result<Vec<DecodedSymbol>, DecodeError> {
        tracing::warn!("DisabledDecoder: skipping barcode scan");
        Ok(Vec::new())
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Decoder with a canned answer (for testing the orchestration layer).
#[cfg(test)]
pub struct FixedDecoder(pub Vec<DecodedSymbol>);

#[cfg(test)]
#[async_trait::async_trait]
impl BarcodeDecoder for FixedDecoder {
    async fn decode(&self, _frame: LumaFrame) -> Result<Vec<DecodedSymbol>, DecodeError> {
        Ok(self.0.clone())
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

/// Decoder that always faults (for testing the error path).
#[cfg(test)]
pub struct FaultyDecoder;

#[cfg(test)]
#[async_trait::async_trait]
impl BarcodeDecoder for FaultyDecoder {
    async fn decode(&self, _frame: LumaFrame) -> Result<Vec<DecodedSymbol>, DecodeError> {
        Err(DecodeError::Worker("backend exploded".to_string()))
    }

    async fn health_check(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "faulty"
    }
}

/// Factory function to create the configured decoder backend.
pub fn create_decoder(kind: &str, options: ScanOptions) -> Box<dyn BarcodeDecoder> {
    match kind.to_lowercase().as_str() {
        "builtin" => Box::new(RowScanDecoder::new(options)),
        "disabled" | "noop" | "none" => Box::new(DisabledDecoder),
        other => {
            tracing::warn!("Unknown decoder kind '{}', using the builtin engine", other);
            Box::new(RowScanDecoder::new(options))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{ean13, frame_from_row};
    use crate::models::{Quality, SymbologyKind};

    #[tokio::test]
    async fn test_row_scan_decoder_finds_ean13() {
        let decoder = RowScanDecoder::default();
        let frame = frame_from_row(&ean13::encode_row("5901234123457", 2), 64);
        let symbols = decoder.decode(frame).await.unwrap();
        assert_eq!(symbols.len(), 1);
        assert_eq!(symbols[0].symbology, SymbologyKind::Ean13);
        assert_eq!(symbols[0].data, "5901234123457");
        assert_eq!(symbols[0].quality, Quality::Readable);
        assert!(decoder.health_check().await);
    }

    #[tokio::test]
    async fn test_empty_frame_is_a_normal_empty_result() {
        let decoder = RowScanDecoder::default();
        let frame = LumaFrame::new(vec![255u8; 120 * 40], 120, 40);
        let symbols = decoder.decode(frame).await.unwrap();
        assert!(symbols.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_buffer_is_a_fault() {
        let decoder = RowScanDecoder::default();
        let frame = LumaFrame::new(vec![0u8; 7], 100, 100);
        let err = decoder.decode(frame).await.unwrap_err();
        assert!(matches!(err, DecodeError::MalformedBuffer { .. }));
    }

    #[tokio::test]
    async fn test_disabled_decoder_finds_nothing() {
        let decoder = DisabledDecoder;
        let frame = frame_from_row(&ean13::encode_row("5901234123457", 2), 64);
        assert!(decoder.decode(frame).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_decoder() {
        assert_eq!(create_decoder("builtin", ScanOptions::default()).name(), "builtin");
        assert_eq!(create_decoder("disabled", ScanOptions::default()).name(), "disabled");
        assert_eq!(create_decoder("noop", ScanOptions::default()).name(), "disabled");
        assert_eq!(create_decoder("whatever", ScanOptions::default()).name(), "builtin");
    }
}
