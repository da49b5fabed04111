//! Standard font metrics and text encoding
//!
//! Reports use the built-in Helvetica faces, so no font program is embedded.
//! Widths come from the Adobe AFM files (units of 1/1000 em) and cover
//! printable ASCII; other Latin-1 characters fall back to an average width.

/// Helvetica advance widths for U+0020..=U+007E.
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0..?
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // P.._
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // `..o
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // p..~
];

/// Helvetica-Bold advance widths for U+0020..=U+007E.
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // 0..?
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // @..O
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // P.._
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // `..o
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // p..~
];

const FALLBACK_WIDTH: u16 = 556;

fn char_width(c: char, bold: bool) -> u16 {
    let table = if bold { &HELVETICA_BOLD } else { &HELVETICA };
    match c as u32 {
        code @ 0x20..=0x7E => table[(code - 0x20) as usize],
        0xB2 | 0xB3 | 0xB9 => 333,
        _ => FALLBACK_WIDTH,
    }
}

/// Rendered width of `text` in points.
pub fn text_width(text: &str, font_size: f64, bold: bool) -> f64 {
    let units: u32 = text.chars().map(|c| u32::from(char_width(c, bold))).sum();
    f64::from(units) * font_size / 1000.0
}

/// Shorten `text` with a trailing "..." until it fits in `max_width`.
pub fn fit_text(text: &str, max_width: f64, font_size: f64, bold: bool) -> String {
    if text_width(text, font_size, bold) <= max_width {
        return text.to_string();
    }
    let mut chars: Vec<char> = text.chars().collect();
    while !chars.is_empty() {
        chars.pop();
        let candidate: String = chars.iter().collect::<String>() + "...";
        if text_width(&candidate, font_size, bold) <= max_width {
            return candidate;
        }
    }
    String::new()
}

/// Encode text for a WinAnsiEncoding font. Characters outside Latin-1
/// become '?'.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c as u32 {
            code @ (0x20..=0x7E | 0xA0..=0xFF) => code as u8,
            _ => b'?',
        })
        .collect()
}
