//! Greedy word wrap against measured widths.
//!
//! Lines break only at whitespace. Greedy filling yields the minimum line
//! count for a fixed set of break points, which is all the notes need (no
//! hyphenation, no justification).

use crate::document::FontWeight;
use crate::layout::metrics::text_width;

/// Split `text` into lines no wider than `max_width`.
///
/// A word wider than `max_width` is placed alone on its own line and left
/// intact; the line overflows rather than losing characters. Empty or
/// whitespace-only text yields no lines.
pub fn wrap_text(text: &str, weight: FontWeight, size: f32, max_width: f32) -> Vec<String> {
    let space = text_width(" ", weight, size);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_width = 0.0f32;

    for word in text.split_whitespace() {
        let word_width = text_width(word, weight, size);
        if current.is_empty() {
            current.push_str(word);
            current_width = word_width;
        } else if current_width + space + word_width <= max_width {
            current.push(' ');
            current.push_str(word);
            current_width += space + word_width;
        } else {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_width = word_width;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
