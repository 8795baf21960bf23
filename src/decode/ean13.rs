//! EAN-13 / UPC-A single-row decoder and synthesizer.
//!
//! Row layout: quiet zone, start guard (101), six left digits encoded in
//! the A/B sets, center guard (01010), six right digits in the C set, end
//! guard (101). The first digit is not printed as bars; it is recovered
//! from the A/B parity mask of the left half. UPC-A is EAN-13 with a
//! leading zero and is reported as the 12-digit form.

use super::RowHit;
use super::binarize::{
    binarize_adaptive, binarize_global, quantize_modules, run_lengths, run_positions,
};

// Left "A" digit patterns as bar/space module widths, each summing to 7.
const A_PATTERNS: [(u8, u8, u8, u8); 10] = [
    (3, 2, 1, 1),
    (2, 2, 2, 1),
    (2, 1, 2, 2),
    (1, 4, 1, 1),
    (1, 1, 3, 2),
    (1, 2, 3, 1),
    (1, 1, 1, 4),
    (1, 3, 1, 2),
    (1, 2, 1, 3),
    (3, 1, 1, 2),
];

// "B" set is the run-wise mirror of "A".
const B_PATTERNS: [(u8, u8, u8, u8); 10] = [
    (1, 1, 2, 3),
    (1, 2, 2, 2),
    (2, 2, 1, 2),
    (1, 1, 4, 1),
    (2, 3, 1, 1),
    (1, 3, 2, 1),
    (4, 1, 1, 1),
    (2, 1, 3, 1),
    (3, 1, 2, 1),
    (2, 1, 1, 3),
];

// Right-hand "C" set has the same run widths as "A" (only the bar/space
// colors differ, which run widths do not see).
const C_PATTERNS: [(u8, u8, u8, u8); 10] = A_PATTERNS;

/// A/B parity of the six left digits determines the unprinted first
/// digit. `true` = B.
const FIRST_DIGIT_MASKS: [[bool; 6]; 10] = [
    [false, false, false, false, false, false], // 0
    [false, false, true, false, true, true],    // 1
    [false, false, true, true, false, true],    // 2
    [false, false, true, true, true, false],    // 3
    [false, true, false, false, true, true],    // 4
    [false, true, true, false, false, true],    // 5
    [false, true, true, true, false, false],    // 6
    [false, true, false, true, false, true],    // 7
    [false, true, false, true, true, false],    // 8
    [false, true, true, false, true, false],    // 9
];

// Checksum-failing candidates are only reported when the digit patterns
// matched this closely; keeps noise rows from surfacing as "unreadable".
const MAX_CANDIDATE_DISTANCE: u32 = 1;

/// Try to decode one grayscale row. A full structural parse with a valid
/// checksum yields a readable hit; a full parse whose checksum fails
/// yields an unreadable candidate.
pub fn decode_row(row: &[u8], min_row_pixels: usize) -> Option<RowHit> {
    if row.len() < min_row_pixels {
        return None;
    }

    // Binarize adaptively, fall back to the global threshold when the row
    // collapses into too few runs.
    let bits = {
        let adaptive = binarize_adaptive(row);
        if run_lengths(&adaptive).len() >= 40 {
            adaptive
        } else {
            let global = binarize_global(row);
            if run_lengths(&global).len() < 40 {
                return None;
            }
            global
        }
    };
    let starts_black = bits[0];
    let runs = run_lengths(&bits);
    let modules = quantize_modules(&runs);
    let positions = run_positions(&runs);

    let is_black = |i: usize| (i % 2 == 0) == starts_black;

    // Start guard: first 1,1,1 triple beginning on a bar.
    let start = (0..modules.len().saturating_sub(2)).find(|&i| {
        modules[i] == 1 && modules[i + 1] == 1 && modules[i + 2] == 1 && is_black(i)
    })?;
    let mut idx = start + 3;

    // Left half: six digits, four runs each, A or B set.
    let mut digits = [0u8; 13];
    let mut left_parity = [false; 6];
    let mut total_distance = 0u32;
    for d in 0..6 {
        if idx + 3 >= modules.len() {
            return None;
        }
        let pattern = (
            modules[idx],
            modules[idx + 1],
            modules[idx + 2],
            modules[idx + 3],
        );
        let (digit_a, dist_a) = best_match(&pattern, &A_PATTERNS);
        let (digit_b, dist_b) = best_match(&pattern, &B_PATTERNS);
        if dist_a <= dist_b {
            digits[1 + d] = digit_a;
            left_parity[d] = false;
            total_distance += dist_a;
        } else {
            digits[1 + d] = digit_b;
            left_parity[d] = true;
            total_distance += dist_b;
        }
        idx += 4;
    }

    // Center guard: 0 1 0 1 0, five single-module runs.
    if !(idx + 4 < modules.len() && modules[idx..idx + 5].iter().all(|&m| m == 1)) {
        return None;
    }
    idx += 5;

    // Right half: six digits from the C set.
    for d in 0..6 {
        if idx + 3 >= modules.len() {
            return None;
        }
        let pattern = (
            modules[idx],
            modules[idx + 1],
            modules[idx + 2],
            modules[idx + 3],
        );
        let (digit, dist) = best_match(&pattern, &C_PATTERNS);
        digits[7 + d] = digit;
        total_distance += dist;
        idx += 4;
    }

    // End guard.
    if !(idx + 2 < modules.len()
        && modules[idx] == 1
        && modules[idx + 1] == 1
        && modules[idx + 2] == 1
        && is_black(idx))
    {
        return None;
    }

    digits[0] = first_digit_from_parity(&left_parity)?;

    let x_start = positions[start];
    let x_end = positions[idx + 3];

    let readable = checksum_holds(&digits);
    if !readable && total_distance > MAX_CANDIDATE_DISTANCE {
        return None;
    }

    // UPC-A is EAN-13 with a leading zero; report the 12-digit form.
    let text: String = if digits[0] == 0 {
        digits[1..].iter().map(|d| char::from(b'0' + *d)).collect()
    } else {
        digits.iter().map(|d| char::from(b'0' + *d)).collect()
    };

    Some(RowHit {
        text,
        readable,
        x_start,
        x_end,
    })
}

/// Nearest digit by Manhattan distance over the four run widths.
fn best_match(pattern: &(u8, u8, u8, u8), dict: &[(u8, u8, u8, u8); 10]) -> (u8, u32) {
    let mut best_distance = u32::MAX;
    let mut best_digit = 0u8;
    for (digit, candidate) in dict.iter().enumerate() {
        let d = pattern_distance(*pattern, *candidate);
        if d < best_distance {
            best_distance = d;
            best_digit = digit as u8;
        }
    }
    (best_digit, best_distance)
}

fn pattern_distance(p: (u8, u8, u8, u8), q: (u8, u8, u8, u8)) -> u32 {
    (p.0 as i32 - q.0 as i32).unsigned_abs()
        + (p.1 as i32 - q.1 as i32).unsigned_abs()
        + (p.2 as i32 - q.2 as i32).unsigned_abs()
        + (p.3 as i32 - q.3 as i32).unsigned_abs()
}

fn first_digit_from_parity(parity: &[bool; 6]) -> Option<u8> {
    FIRST_DIGIT_MASKS
        .iter()
        .position(|mask| mask == parity)
        .map(|d| d as u8)
}

fn checksum_holds(digits: &[u8; 13]) -> bool {
    let mut sum = 0u32;
    for (i, &d) in digits[..12].iter().enumerate() {
        let weight = if i % 2 == 0 { 1 } else { 3 };
        sum += d as u32 * weight;
    }
    (10 - (sum % 10)) % 10 == digits[12] as u32
}

/// Render an ideal grayscale row for a 13-digit EAN or 12-digit UPC-A
/// string, `unit` pixels per module, black = 0, white = 255. Test and
/// demo support; 13-digit input is encoded exactly as given, so a wrong
/// check digit survives into the bars.
pub fn encode_row(digits: &str, unit: usize) -> Vec<u8> {
    assert!(unit >= 1);
    let ds: Vec<u8> = digits.bytes().map(|c| c - b'0').collect();
    assert!(
        ds.len() == 12 || ds.len() == 13,
        "EAN-13 needs 13 digits, UPC-A needs 12"
    );

    let mut ean = [0u8; 13];
    if ds.len() == 12 {
        // UPC-A: leading zero, recompute the check digit.
        ean[1..].copy_from_slice(&ds[..12]);
        let mut sum = 0u32;
        for (i, &d) in ean[..12].iter().enumerate() {
            let weight = if i % 2 == 0 { 1 } else { 3 };
            sum += d as u32 * weight;
        }
        ean[12] = ((10 - (sum % 10)) % 10) as u8;
    } else {
        ean.copy_from_slice(&ds);
    }

    let mask = FIRST_DIGIT_MASKS[ean[0] as usize];

    let mut modules: Vec<u8> = Vec::new();
    modules.push(9); // quiet zone (white)
    modules.extend([1, 1, 1]); // start guard
    for i in 0..6 {
        let d = ean[1 + i] as usize;
        let (a, b, c, e) = if mask[i] { B_PATTERNS[d] } else { A_PATTERNS[d] };
        modules.extend([a, b, c, e]);
    }
    modules.extend([1, 1, 1, 1, 1]); // center guard
    for i in 0..6 {
        let (a, b, c, e) = C_PATTERNS[ean[7 + i] as usize];
        modules.extend([a, b, c, e]);
    }
    modules.extend([1, 1, 1]); // end guard
    modules.push(9); // quiet zone

    // Alternate white/black starting with the white quiet zone.
    let mut pixels: Vec<u8> = Vec::new();
    let mut black = false;
    for m in modules {
        let value = if black { 0u8 } else { 255u8 };
        pixels.extend(std::iter::repeat(value).take(m as usize * unit));
        black = !black;
    }
    pixels
}
