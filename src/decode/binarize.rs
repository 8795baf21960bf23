//! Row binarization and run-length helpers for 1-D scanning.
//!
//! Two strategies: an adaptive sliding-mean threshold that copes with
//! uneven lighting, and a cheap global threshold kept as a fallback for
//! short or flat rows.

/// Global threshold: blend of the row mean and the min/max midpoint.
#[inline]
pub fn global_threshold(row: &[u8]) -> u8 {
    let (mut min_v, mut max_v) = (u8::MAX, 0u8);
    let mut sum: u64 = 0;
    for &v in row {
        if v < min_v {
            min_v = v;
        }
        if v > max_v {
            max_v = v;
        }
        sum += v as u64;
    }
    let mean = (sum / row.len().max(1) as u64) as u8;
    let mid = ((min_v as u16 + max_v as u16) / 2) as u8;
    ((mean as u16 + mid as u16) / 2) as u8
}

/// Global binarization of one row: `true` = black.
pub fn binarize_global(row: &[u8]) -> Vec<bool> {
    if row.is_empty() {
        return Vec::new();
    }
    let t = global_threshold(row);
    row.iter().map(|&v| v < t).collect()
}

/// Adaptive binarization against a sliding-window mean with a small bias
/// toward black. Window is width/32 clamped to [8, 64].
pub fn binarize_adaptive(row: &[u8]) -> Vec<bool> {
    let n = row.len();
    if n == 0 {
        return Vec::new();
    }
    let win = (n / 32).clamp(8, 64);
    let bias: i32 = 5;

    // prefix sums for the window mean
    let mut prefix: Vec<u32> = Vec::with_capacity(n + 1);
    prefix.push(0);
    for &v in row {
        let last = *prefix.last().unwrap();
        prefix.push(last + v as u32);
    }

    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let left = i.saturating_sub(win);
        let right = (i + win).min(n - 1);
        let len = (right - left + 1) as u32;
        let sum = prefix[right + 1] - prefix[left];
        let mean = (sum / len) as i32;
        out.push((row[i] as i32) < mean - bias);
    }
    out
}

/// Collapse a binary row into bar/space widths (run lengths), starting
/// with the first run as-is.
pub fn run_lengths(bits: &[bool]) -> Vec<usize> {
    if bits.is_empty() {
        return Vec::new();
    }
    let mut out = Vec::new();
    let mut current = bits[0];
    let mut len = 1usize;
    for &b in &bits[1..] {
        if b == current {
            len += 1;
        } else {
            out.push(len);
            current = b;
            len = 1;
        }
    }
    out.push(len);
    out
}

/// Quantize run widths to nominal module counts (1..=4), estimating the
/// unit module as the lower quartile of the run widths. Robust against a
/// heavy tail of wide quiet-zone runs.
pub fn quantize_modules(runs: &[usize]) -> Vec<u8> {
    if runs.is_empty() {
        return Vec::new();
    }
    let mut sorted = runs.to_vec();
    sorted.sort_unstable();
    let unit = sorted[sorted.len() / 4].max(1);
    runs.iter()
        .map(|&w| ((w + unit / 2) / unit).clamp(1, 4) as u8)
        .collect()
}

/// Pixel offset of each run start, plus the total width as a final entry.
pub fn run_positions(runs: &[usize]) -> Vec<usize> {
    let mut pos = Vec::with_capacity(runs.len() + 1);
    let mut acc = 0usize;
    for &w in runs {
        pos.push(acc);
        acc += w;
    }
    pos.push(acc);
    pos
}
