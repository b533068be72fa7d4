//! Glyph advance widths for the base-14 Helvetica faces.
//!
//! Widths are the Adobe AFM values in thousandths of an em. The PDF writer
//! uses the same two fonts without embedding them, so measuring with these
//! tables is exact: every character is measured as the WinAnsi glyph the
//! writer encodes it to.

use crate::document::FontWeight;

/// Advance widths for U+0020..=U+007E, Helvetica.
#[rustfmt::skip]
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,                               // 0..9
    278, 278, 584, 584, 584, 556, 1015,                                             // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,                // A..M
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,                // N..Z
    278, 278, 278, 469, 556, 333,                                                   // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,                // a..m
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,                // n..z
    334, 260, 334, 584,                                                             // {..~
];

/// Advance widths for U+0020..=U+007E, Helvetica-Bold.
#[rustfmt::skip]
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

/// Advance widths for WinAnsi 0xA0..=0xFF, Helvetica.
#[rustfmt::skip]
const HELVETICA_LATIN1: [u16; 96] = [
    278, 333, 556, 556, 556, 556, 260, 556, 333, 737, 370, 556, 584, 333, 737, 333,   // nbsp..macron
    400, 584, 333, 333, 333, 556, 537, 278, 333, 333, 365, 556, 834, 834, 834, 611,   // degree..questiondown
    667, 667, 667, 667, 667, 667, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,  // À..Ï
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,   // Ð..ß
    556, 556, 556, 556, 556, 556, 889, 500, 556, 556, 556, 556, 278, 278, 278, 278,   // à..ï
    556, 556, 556, 556, 556, 556, 556, 584, 611, 556, 556, 556, 556, 500, 556, 500,   // ð..ÿ
];

/// Advance widths for WinAnsi 0xA0..=0xFF, Helvetica-Bold.
#[rustfmt::skip]
const HELVETICA_BOLD_LATIN1: [u16; 96] = [
    278, 333, 556, 556, 556, 556, 280, 556, 333, 737, 370, 556, 584, 333, 737, 333,
    400, 584, 333, 333, 333, 611, 556, 278, 333, 333, 365, 556, 834, 834, 834, 611,
    722, 722, 722, 722, 722, 722, 1000, 722, 667, 667, 667, 667, 278, 278, 278, 278,
    722, 722, 778, 778, 778, 778, 778, 584, 778, 722, 722, 722, 722, 667, 667, 611,
    556, 556, 556, 556, 556, 556, 889, 556, 556, 556, 556, 556, 278, 278, 278, 278,
    611, 611, 611, 611, 611, 611, 611, 584, 611, 611, 611, 611, 611, 556, 611, 556,
];

/// PostScript name of the face for `weight`.
pub fn font_name(weight: FontWeight) -> &'static str {
    match weight {
        FontWeight::Normal => "Helvetica",
        FontWeight::Bold => "Helvetica-Bold",
    }
}

/// WinAnsi (Windows-1252) code for `ch`; `?` when it has none.
pub fn win_ansi_byte(ch: char) -> u8 {
    let cp = ch as u32;
    if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
        return cp as u8;
    }
    match ch {
        '\u{20AC}' => 0x80,
        '\u{201A}' => 0x82,
        '\u{0192}' => 0x83,
        '\u{201E}' => 0x84,
        '\u{2026}' => 0x85,
        '\u{2020}' => 0x86,
        '\u{2021}' => 0x87,
        '\u{02C6}' => 0x88,
        '\u{2030}' => 0x89,
        '\u{0160}' => 0x8A,
        '\u{2039}' => 0x8B,
        '\u{0152}' => 0x8C,
        '\u{017D}' => 0x8E,
        '\u{2018}' => 0x91,
        '\u{2019}' => 0x92,
        '\u{201C}' => 0x93,
        '\u{201D}' => 0x94,
        '\u{2022}' => 0x95,
        '\u{2013}' => 0x96,
        '\u{2014}' => 0x97,
        '\u{02DC}' => 0x98,
        '\u{2122}' => 0x99,
        '\u{0161}' => 0x9A,
        '\u{203A}' => 0x9B,
        '\u{0153}' => 0x9C,
        '\u{017E}' => 0x9E,
        '\u{0178}' => 0x9F,
        '\t' => b' ',
        _ => b'?',
    }
}

/// Advance width of the glyph at WinAnsi `code`, in thousandths of an em.
fn glyph_width(code: u8, weight: FontWeight) -> u16 {
    let bold = weight == FontWeight::Bold;
    match code {
        0x20..=0x7E => {
            let table = if bold { &HELVETICA_BOLD } else { &HELVETICA };
            table[(code - 0x20) as usize]
        }
        0xA0..=0xFF => {
            let table = if bold { &HELVETICA_BOLD_LATIN1 } else { &HELVETICA_LATIN1 };
            table[(code - 0xA0) as usize]
        }
        0x80 | 0x83 | 0x86 | 0x87 | 0x96 => 556,
        0x85 | 0x89 | 0x8C | 0x97 | 0x99 => 1000,
        0x88 | 0x8B | 0x98 | 0x9B => 333,
        0x8A | 0x9F => 667,
        0x8E => 611,
        0x95 => 350,
        0x9C => 944,
        0x9E => 500,
        0x82 | 0x91 | 0x92 => if bold { 278 } else { 222 },
        0x84 | 0x93 | 0x94 => if bold { 500 } else { 333 },
        0x9A => if bold { 556 } else { 500 },
        // Undefined slots never come out of `win_ansi_byte`.
        _ => glyph_width(b'?', weight),
    }
}

/// Advance width of one character as drawn, in thousandths of an em.
///
/// Characters without a WinAnsi code are measured as the `?` drawn in
/// their place.
pub fn char_width(ch: char, weight: FontWeight) -> u16 {
    glyph_width(win_ansi_byte(ch), weight)
}

/// Rendered width of `text` at `size` points.
pub fn text_width(text: &str, weight: FontWeight, size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| char_width(c, weight) as u32).sum();
    units as f32 * size / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_afm_widths() {
        assert_eq!(char_width(' ', FontWeight::Normal), 278);
        assert_eq!(char_width('A', FontWeight::Normal), 667);
        assert_eq!(char_width('W', FontWeight::Bold), 944);
        assert_eq!(char_width('i', FontWeight::Normal), 222);
        assert_eq!(char_width('~', FontWeight::Bold), 584);
    }

    #[test]
    fn bold_is_never_narrower_for_letters() {
        for ch in ('a'..='z').chain('A'..='Z') {
            assert!(
                char_width(ch, FontWeight::Bold) >= char_width(ch, FontWeight::Normal),
                "{ch}"
            );
        }
    }

    #[test]
    fn text_width_scales_with_size() {
        let w10 = text_width("Notes", FontWeight::Normal, 10.0);
        let w20 = text_width("Notes", FontWeight::Normal, 20.0);
        assert!((w20 - 2.0 * w10).abs() < 1e-3);
        // N(722) o(556) t(278) e(556) s(500) = 2612 units
        assert!((w10 - 26.12).abs() < 1e-3);
    }

    #[test]
    fn latin1_glyphs_use_their_own_widths() {
        assert_eq!(char_width('\u{c6}', FontWeight::Normal), 1000); // Æ
        assert_eq!(char_width('\u{c9}', FontWeight::Normal), 667); // É
        assert_eq!(char_width('\u{a9}', FontWeight::Normal), 737); // ©
        assert_eq!(char_width('\u{b0}', FontWeight::Bold), 400); // °
        assert_eq!(char_width('\u{e7}', FontWeight::Bold), 556); // ç
        assert_eq!(char_width('\u{201c}', FontWeight::Normal), 333);
        assert_eq!(char_width('\u{201c}', FontWeight::Bold), 500);
    }

    #[test]
    fn unmappable_chars_measure_as_question_mark() {
        assert_eq!(win_ansi_byte('\u{2192}'), b'?');
        for weight in [FontWeight::Normal, FontWeight::Bold] {
            assert_eq!(char_width('\u{2192}', weight), char_width('?', weight));
            assert_eq!(char_width('\u{4e2d}', weight), char_width('?', weight));
        }
        assert_eq!(char_width('\u{2192}', FontWeight::Bold), 611);
    }

    #[test]
    fn wide_latin1_word_is_measured_at_full_width() {
        let word = "\u{c6}".repeat(90);
        assert!((text_width(&word, FontWeight::Normal, 11.0) - 990.0).abs() < 1e-2);
    }

    #[test]
    fn empty_text_has_zero_width() {
        assert_eq!(text_width("", FontWeight::Bold, 16.0), 0.0);
    }
}
