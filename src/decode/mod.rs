//! Built-in row-scan barcode engine.
//!
//! Samples horizontal lines across a grayscale frame, runs the per-row
//! symbology decoders, and merges hits from adjacent rows into symbols
//! with pixel rectangles.

pub mod binarize;
pub mod code128;
pub mod ean13;

use crate::models::{DecodedSymbol, Quality, SymbolRect, SymbologyKind};

/// Owned 8-bit grayscale raster, row-major.
#[derive(Debug, Clone)]
pub struct LumaFrame {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl LumaFrame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        Self {
            data,
            width,
            height,
        }
    }

    /// True when the buffer length matches the declared dimensions.
    pub fn is_well_formed(&self) -> bool {
        self.data.len() == self.width as usize * self.height as usize
    }

    pub fn row(&self, y: usize) -> &[u8] {
        let w = self.width as usize;
        &self.data[y * w..(y + 1) * w]
    }
}

/// Symbology families the engine can attempt in one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbologyFamily {
    Ean13,
    Code128,
}

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Horizontal scan lines sampled evenly over the frame height.
    pub scan_rows: usize,
    /// Rows narrower than this are skipped outright.
    pub min_row_pixels: usize,
    /// Families attempted, in result order.
    pub families: Vec<SymbologyFamily>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            scan_rows: 15,
            min_row_pixels: 30,
            families: vec![SymbologyFamily::Ean13, SymbologyFamily::Code128],
        }
    }
}

/// One successful (or near-successful) decode of a single scan line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowHit {
    pub text: String,
    /// False when the structure parsed but the checksum did not hold.
    pub readable: bool,
    pub x_start: usize,
    pub x_end: usize,
}

/// Scan the frame for every configured family and merge row hits into
/// deduplicated symbols. Symbol order: family order, then first hit row.
pub fn scan_frame(frame: &LumaFrame, opts: &ScanOptions) -> Vec<DecodedSymbol> {
    let mut symbols = Vec::new();
    for &family in &opts.families {
        let hits = scan_family(frame, family, opts);
        symbols.extend(merge_hits(family, hits));
    }

    // Identical (type, data, rect) tuples are one detection.
    let mut seen = std::collections::HashSet::new();
    symbols.retain(|s| seen.insert(s.dedup_key()));
    symbols
}

fn scan_family(
    frame: &LumaFrame,
    family: SymbologyFamily,
    opts: &ScanOptions,
) -> Vec<(usize, RowHit)> {
    let height = frame.height as usize;
    if height == 0 || frame.width == 0 {
        return Vec::new();
    }
    let rows = opts.scan_rows.clamp(1, height);
    let mut hits = Vec::new();
    for i in 0..rows {
        // even sampling over the frame height
        let y = if rows == 1 {
            height / 2
        } else {
            i * (height - 1) / (rows - 1)
        };
        let row = frame.row(y);
        let hit = match family {
            SymbologyFamily::Ean13 => ean13::decode_row(row, opts.min_row_pixels),
            SymbologyFamily::Code128 => code128::decode_row(row, opts.min_row_pixels),
        };
        if let Some(hit) = hit {
            hits.push((y, hit));
        }
    }
    hits
}

/// Group hits by decoded text; the rect spans all rows that produced the
/// same payload, and one readable row makes the symbol readable.
fn merge_hits(family: SymbologyFamily, hits: Vec<(usize, RowHit)>) -> Vec<DecodedSymbol> {
    struct Group {
        kind: SymbologyKind,
        text: String,
        readable: bool,
        min_x: usize,
        max_x: usize,
        min_y: usize,
        max_y: usize,
    }

    let mut groups: Vec<Group> = Vec::new();
    for (y, hit) in hits {
        let kind = classify(family, &hit.text);
        if let Some(g) = groups
            .iter_mut()
            .find(|g| g.kind == kind && g.text == hit.text)
        {
            g.readable |= hit.readable;
            g.min_x = g.min_x.min(hit.x_start);
            g.max_x = g.max_x.max(hit.x_end);
            g.min_y = g.min_y.min(y);
            g.max_y = g.max_y.max(y);
        } else {
            groups.push(Group {
                kind,
                text: hit.text,
                readable: hit.readable,
                min_x: hit.x_start,
                max_x: hit.x_end,
                min_y: y,
                max_y: y,
            });
        }
    }

    // A readable decode supersedes unreadable candidates of the same text.
    let readable_texts: Vec<String> = groups
        .iter()
        .filter(|g| g.readable)
        .map(|g| g.text.clone())
        .collect();
    groups.retain(|g| g.readable || !readable_texts.contains(&g.text));

    groups
        .into_iter()
        .map(|g| DecodedSymbol {
            symbology: g.kind,
            data: g.text,
            quality: if g.readable {
                Quality::Readable
            } else {
                Quality::Unreadable
            },
            rect: SymbolRect {
                x: g.min_x as u32,
                y: g.min_y as u32,
                width: (g.max_x - g.min_x) as u32,
                height: (g.max_y - g.min_y + 1) as u32,
            },
        })
        .collect()
}

/// The EAN-13 row decoder reports UPC-A as its 12-digit reading.
fn classify(family: SymbologyFamily, text: &str) -> SymbologyKind {
    match family {
        SymbologyFamily::Ean13 => {
            if text.len() == 12 {
                SymbologyKind::Upca
            } else {
                SymbologyKind::Ean13
            }
        }
        SymbologyFamily::Code128 => SymbologyKind::Code128,
    }
}

/// Expand a synthesized 1-D row into a full frame of the given height.
/// Test and demo support.
pub fn frame_from_row(row: &[u8], height: u32) -> LumaFrame {
    let mut data = Vec::with_capacity(row.len() * height as usize);
    for _ in 0..height {
        data.extend_from_slice(row);
    }
    LumaFrame::new(data, row.len() as u32, height)
}
