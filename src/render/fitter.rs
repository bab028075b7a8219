// src/render/fitter.rs
//! Title fitter: pick the largest font size whose word-wrapped lines fit a
//! fixed pixel box. Total function — it always returns something, in
//! O(sizes × words); when even the smallest size overflows it degrades to
//! hard truncation and says so.

use crate::render::TextMeasure;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FitResult {
    pub font_size: u32,
    pub lines: Vec<String>,
    /// True when the text did not fit at any size and was hard-truncated.
    pub degraded: bool,
}

pub fn fit_title<M: TextMeasure + ?Sized>(
    measure: &M,
    text: &str,
    sizes: &[u32],
    max_width: u32,
    max_height: u32,
    max_lines: usize,
) -> FitResult {
    debug_assert!(!sizes.is_empty());
    let smallest = *sizes.last().unwrap_or(&12);

    for &size in sizes {
        let lines = wrap(measure, text, size, max_width);
        let line_h = measure.measure("Ag", size).1.max(1);
        let fits_box = lines.len() <= max_lines
            && line_h.saturating_mul(lines.len() as u32) <= max_height
            && lines.iter().all(|l| measure.measure(l, size).0 <= max_width);
        if fits_box {
            return FitResult {
                font_size: size,
                lines,
                degraded: false,
            };
        }
    }

    // Nothing fits: smallest size, clamp to max_lines, ellipsis on the last
    // line, and shave the line itself until it fits the width.
    let mut lines = wrap(measure, text, smallest, max_width);
    lines.truncate(max_lines.max(1));
    if let Some(last) = lines.last_mut() {
        last.push('…');
        while measure.measure(last, smallest).0 > max_width && last.chars().count() > 1 {
            last.pop(); // the ellipsis
            last.pop();
            last.push('…');
        }
    }
    FitResult {
        font_size: smallest,
        lines,
        degraded: true,
    }
}

/// Greedy word wrap. A single word wider than the box gets its own line and
/// is left overlong; the caller decides whether that sinks the size.
fn wrap<M: TextMeasure + ?Sized>(measure: &M, text: &str, size: u32, max_width: u32) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let attempt = if line.is_empty() {
            word.to_string()
        } else {
            format!("{line} {word}")
        };
        if measure.measure(&attempt, size).0 <= max_width {
            line = attempt;
        } else {
            if !line.is_empty() {
                lines.push(line);
            }
            line = word.to_string();
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}
