//! Code 128 single-row decoder and synthesizer.
//!
//! Anchors on the STOP pattern (seven runs summing to 13 modules), then
//! walks backwards through six-run symbols until a start code appears.
//! Anchoring on STOP sidesteps the "which run starts a symbol" ambiguity
//! that plagues forward scans. Code sets A/B/C, SHIFT and FNC1 are
//! handled; the checksum is mod 103 over the payload.

use super::RowHit;
use super::binarize::{binarize_adaptive, binarize_global, run_lengths, run_positions};

/// Symbol patterns 0..=105, six run widths each, summing to 11 modules.
/// 103..=105 are Start A/B/C.
const PATTERNS_STR: [&str; 106] = [
    "212222", "222122", "222221", "121223", "121322", "131222", "122213", "122312", "132212",
    "221213", "221312", "231212", "112232", "122132", "122231", "113222", "123122", "123221",
    "223211", "221132", "221231", "213212", "223112", "312131", "311222", "321122", "321221",
    "312212", "322112", "322211", "212123", "212321", "232121", "111323", "131123", "131321",
    "112313", "132113", "132311", "211313", "231113", "231311", "112133", "112331", "132131",
    "113123", "113321", "133121", "313121", "211331", "231131", "213113", "213311", "213131",
    "311123", "311321", "331121", "312113", "312311", "332111", "314111", "221411", "431111",
    "111224", "111422", "121124", "121421", "141122", "141221", "112214", "112412", "122114",
    "122411", "142112", "142211", "241211", "221114", "413111", "241112", "134111", "111242",
    "121142", "121241", "114212", "124112", "124211", "411212", "421112", "421211", "212141",
    "214121", "412121", "111143", "111341", "131141", "114113", "114311", "411113", "411311",
    "113141", "114131", "311141", "411131", "211412", "211214", "211232",
];

/// STOP pattern: seven runs, 13 modules.
const STOP_PATTERN: [u8; 7] = [2, 3, 3, 1, 1, 1, 2];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CodeSet {
    A,
    B,
    C,
}

/// Try to decode one grayscale row as Code 128.
pub fn decode_row(row: &[u8], min_row_pixels: usize) -> Option<RowHit> {
    if row.len() < min_row_pixels {
        return None;
    }

    let bits = {
        let adaptive = binarize_adaptive(row);
        if run_lengths(&adaptive).len() >= 24 {
            adaptive
        } else {
            let global = binarize_global(row);
            if run_lengths(&global).len() < 24 {
                return None;
            }
            global
        }
    };
    let starts_black = bits[0];
    let runs = run_lengths(&bits);
    let positions = run_positions(&runs);
    let patterns = pattern_table();

    let is_black = |i: usize| (i % 2 == 0) == starts_black;

    // Candidate STOPs: windows of seven runs, normalized to 13 modules,
    // within distance 1 of the STOP pattern, starting on a bar. Payload
    // windows can mimic STOP, so every candidate gets a backward walk and
    // the first one that reaches a start code wins.
    let mut anchored = None;
    for stop in 0..=runs.len().saturating_sub(7) {
        if !is_black(stop)
            || distance7(normalize_window::<7>(&runs[stop..stop + 7], 13), STOP_PATTERN) > 1
        {
            continue;
        }
        if let Some((values, start_set, start_run)) = walk_back(&runs, &patterns, stop) {
            anchored = Some((stop, values, start_set, start_run));
            break;
        }
    }
    let (stop, values, start_set, start_run) = anchored?;
    let payload_len = values.len() - 1;

    let mut sum = match start_set {
        CodeSet::A => 103u32,
        CodeSet::B => 104u32,
        CodeSet::C => 105u32,
    };
    for (i, &v) in values[..payload_len].iter().enumerate() {
        sum = sum.wrapping_add(v as u32 * (i as u32 + 1));
    }
    let readable = sum % 103 == values[payload_len] as u32;

    let text = values_to_text(&values[..payload_len], start_set)?;
    if text.is_empty() {
        return None;
    }

    Some(RowHit {
        text,
        readable,
        x_start: positions[start_run],
        x_end: positions[stop + 7],
    })
}

/// Walk backwards from a STOP anchor through six-run symbols until a
/// start code. Returns the symbol values in reading order (payload then
/// checksum), the start code set, and the start run index.
fn walk_back(
    runs: &[usize],
    patterns: &[[u8; 6]; 106],
    stop: usize,
) -> Option<(Vec<u8>, CodeSet, usize)> {
    let mut idx = stop;
    let mut values_rev: Vec<u8> = Vec::new();
    while idx >= 6 {
        let pattern = normalize_window::<6>(&runs[idx - 6..idx], 11);
        let (value, distance) = best_match(pattern, patterns);
        if distance > 1 {
            return None;
        }
        if (103..=105).contains(&value) {
            if values_rev.is_empty() {
                return None; // not even a checksum symbol
            }
            values_rev.reverse();
            let set = match value {
                103 => CodeSet::A,
                104 => CodeSet::B,
                _ => CodeSet::C,
            };
            return Some((values_rev, set, idx - 6));
        }
        values_rev.push(value as u8);
        idx -= 6;
    }
    None
}

#[derive(PartialEq, Eq, Clone, Copy)]
enum PendingShift {
    None,
    ToA,
    ToB,
}

fn values_to_text(values: &[u8], mut set: CodeSet) -> Option<String> {
    let mut out = String::new();
    let mut shift = PendingShift::None;

    for &raw in values {
        let v = raw as u32;
        let effective = match (set, shift) {
            (CodeSet::A, PendingShift::ToB) => CodeSet::B,
            (CodeSet::B, PendingShift::ToA) => CodeSet::A,
            _ => set,
        };

        match effective {
            CodeSet::A => match v {
                0..=63 => out.push((v as u8 + 32) as char),
                64..=95 => out.push((v as u8 - 64) as char), // control chars
                96 | 97 => {} // FNC3/FNC2 ignored
                98 => {}      // SHIFT handled below
                99 => set = CodeSet::C,
                100 => set = CodeSet::B,
                101 => {}
                102 => out.push(char::from(29)), // FNC1 -> ASCII GS
                _ => return None,
            },
            CodeSet::B => match v {
                0..=95 => out.push((v as u8 + 32) as char),
                96 | 97 => {}
                98 => {}
                99 => set = CodeSet::C,
                100 => {}
                101 => set = CodeSet::A,
                102 => out.push(char::from(29)),
                _ => return None,
            },
            CodeSet::C => match v {
                99 => {}
                0..=98 => {
                    out.push(char::from(b'0' + (v / 10) as u8));
                    out.push(char::from(b'0' + (v % 10) as u8));
                }
                100 => set = CodeSet::B,
                101 => set = CodeSet::A,
                102 => out.push(char::from(29)),
                _ => return None,
            },
        }

        if shift != PendingShift::None {
            shift = PendingShift::None;
        } else if v == 98 {
            shift = match set {
                CodeSet::A => PendingShift::ToB,
                CodeSet::B => PendingShift::ToA,
                CodeSet::C => PendingShift::None,
            };
        }
    }
    Some(out)
}

/// Scale a window of run widths so it sums to `target` modules, nudging
/// rounding drift onto the widest/narrowest entries.
fn normalize_window<const N: usize>(window: &[usize], target: i32) -> [u8; N] {
    debug_assert_eq!(window.len(), N);
    let sum: usize = window.iter().sum();
    let scale = sum as f32 / target as f32;
    let mut out = [0u8; N];
    for (k, &w) in window.iter().enumerate() {
        out[k] = ((w as f32 / scale).round() as i32).clamp(1, 4) as u8;
    }
    let mut current: i32 = out.iter().map(|&x| x as i32).sum();
    while current != target {
        if current > target {
            // shrink the widest entry that can still shrink
            let mut pick: Option<usize> = None;
            for (i, &x) in out.iter().enumerate() {
                if x > 1 && pick.is_none_or(|p| x >= out[p]) {
                    pick = Some(i);
                }
            }
            let Some(i) = pick else { break };
            out[i] -= 1;
            current -= 1;
        } else {
            // widen the narrowest entry that can still widen
            let mut pick: Option<usize> = None;
            for (i, &x) in out.iter().enumerate() {
                if x < 4 && pick.is_none_or(|p| x < out[p]) {
                    pick = Some(i);
                }
            }
            let Some(i) = pick else { break };
            out[i] += 1;
            current += 1;
        }
    }
    out
}

fn pattern_table() -> [[u8; 6]; 106] {
    let mut out = [[0u8; 6]; 106];
    for (i, s) in PATTERNS_STR.iter().enumerate() {
        let b = s.as_bytes();
        for k in 0..6 {
            out[i][k] = b[k] - b'0';
        }
    }
    out
}

fn distance6(p: [u8; 6], q: [u8; 6]) -> u32 {
    p.iter()
        .zip(q.iter())
        .map(|(&a, &b)| (a as i32 - b as i32).unsigned_abs())
        .sum()
}

fn distance7(p: [u8; 7], q: [u8; 7]) -> u32 {
    p.iter()
        .zip(q.iter())
        .map(|(&a, &b)| (a as i32 - b as i32).unsigned_abs())
        .sum()
}

fn best_match(pattern: [u8; 6], patterns: &[[u8; 6]; 106]) -> (usize, u32) {
    let mut best = (0usize, u32::MAX);
    for (i, q) in patterns.iter().enumerate() {
        let d = distance6(pattern, *q);
        if d < best.1 {
            best = (i, d);
            if d == 0 {
                break;
            }
        }
    }
    best
}

/// Render an ideal grayscale row for `text` in code set B (printable
/// ASCII), `unit` pixels per module. Test and demo support.
pub fn encode_row(text: &str, unit: usize) -> Vec<u8> {
    assert!(unit >= 1);
    let patterns = pattern_table();

    let mut codes: Vec<usize> = vec![104]; // Start B
    for ch in text.chars() {
        let b = ch as u32;
        assert!((32..=127).contains(&b), "code set B covers ASCII 32..127");
        codes.push((b - 32) as usize);
    }

    let mut sum = codes[0] as u32;
    for (i, &v) in codes.iter().enumerate().skip(1) {
        sum += v as u32 * i as u32;
    }
    codes.push((sum % 103) as usize);

    let mut modules: Vec<u8> = Vec::new();
    modules.push(10); // quiet zone (white)
    for &code in &codes {
        modules.extend_from_slice(&patterns[code]);
    }
    modules.extend_from_slice(&STOP_PATTERN);
    modules.push(10); // quiet zone

    let mut pixels: Vec<u8> = Vec::new();
    let mut black = false;
    for m in modules {
        let value = if black { 0u8 } else { 255u8 };
        pixels.extend(std::iter::repeat(value).take(m as usize * unit));
        black = !black;
    }
    pixels
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_synthesized_set_b() {
        let row = encode_row("Hello-123", 2);
        let hit = decode_row(&row, 30).expect("row should decode");
        assert_eq!(hit.text, "Hello-123");
        assert!(hit.readable);
        assert!(hit.x_start < hit.x_end);
        assert!(hit.x_end <= row.len());
    }

    #[test]
    fn test_decode_single_character() {
        let row = encode_row("A", 3);
        let hit = decode_row(&row, 30).expect("row should decode");
        assert_eq!(hit.text, "A");
        assert!(hit.readable);
    }

    #[test]
    fn test_flat_row_decodes_to_nothing() {
        assert!(decode_row(&[255u8; 400], 30).is_none());
        assert!(decode_row(&[0u8; 400], 30).is_none());
    }

    #[test]
    fn test_decode_is_deterministic() {
        let row = encode_row("ORDER-0042", 2);
        assert_eq!(decode_row(&row, 30), decode_row(&row, 30));
    }

    #[test]
    fn test_values_to_text_set_c_pairs_digits() {
        // Start C payload: 59 01 23 -> "590123"
        let text = values_to_text(&[59, 1, 23], CodeSet::C).unwrap();
        assert_eq!(text, "590123");
    }
}
