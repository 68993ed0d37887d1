//! Glyph rendering for the menu rows and status readouts.
//!
//! Classic 5x7 column-strip font: five bytes per printable ASCII
//! character, least significant bit at the top row. Characters outside
//! the printable range render as '?'.

use crate::bitmap::Bitmap;

const GLYPH_HEIGHT: usize = 7;
const GLYPH_ADVANCE: usize = 6;

#[rustfmt::skip]
const FONT: [[u8; 5]; 95] = [
    [0x00, 0x00, 0x00, 0x00, 0x00], // ' '
    [0x00, 0x00, 0x5F, 0x00, 0x00], // '!'
    [0x00, 0x07, 0x00, 0x07, 0x00], // '"'
    [0x14, 0x7F, 0x14, 0x7F, 0x14], // '#'
    [0x24, 0x2A, 0x7F, 0x2A, 0x12], // '$'
    [0x23, 0x13, 0x08, 0x64, 0x62], // '%'
    [0x36, 0x49, 0x55, 0x22, 0x50], // '&'
    [0x00, 0x05, 0x03, 0x00, 0x00], // '\''
    [0x00, 0x1C, 0x22, 0x41, 0x00], // '('
    [0x00, 0x41, 0x22, 0x1C, 0x00], // ')'
    [0x08, 0x2A, 0x1C, 0x2A, 0x08], // '*'
    [0x08, 0x08, 0x3E, 0x08, 0x08], // '+'
    [0x00, 0x50, 0x30, 0x00, 0x00], // ','
    [0x08, 0x08, 0x08, 0x08, 0x08], // '-'
    [0x00, 0x60, 0x60, 0x00, 0x00], // '.'
    [0x20, 0x10, 0x08, 0x04, 0x02], // '/'
    [0x3E, 0x51, 0x49, 0x45, 0x3E], // '0'
    [0x00, 0x42, 0x7F, 0x40, 0x00], // '1'
    [0x42, 0x61, 0x51, 0x49, 0x46], // '2'
    [0x21, 0x41, 0x45, 0x4B, 0x31], // '3'
    [0x18, 0x14, 0x12, 0x7F, 0x10], // '4'
    [0x27, 0x45, 0x45, 0x45, 0x39], // '5'
    [0x3C, 0x4A, 0x49, 0x49, 0x30], // '6'
    [0x01, 0x71, 0x09, 0x05, 0x03], // '7'
    [0x36, 0x49, 0x49, 0x49, 0x36], // '8'
    [0x06, 0x49, 0x49, 0x29, 0x1E], // '9'
    [0x00, 0x36, 0x36, 0x00, 0x00], // ':'
    [0x00, 0x56, 0x36, 0x00, 0x00], // ';'
    [0x00, 0x08, 0x14, 0x22, 0x41], // '<'
    [0x14, 0x14, 0x14, 0x14, 0x14], // '='
    [0x41, 0x22, 0x14, 0x08, 0x00], // '>'
    [0x02, 0x01, 0x51, 0x09, 0x06], // '?'
    [0x32, 0x49, 0x79, 0x41, 0x3E], // '@'
    [0x7E, 0x11, 0x11, 0x11, 0x7E], // 'A'
    [0x7F, 0x49, 0x49, 0x49, 0x36], // 'B'
    [0x3E, 0x41, 0x41, 0x41, 0x22], // 'C'
    [0x7F, 0x41, 0x41, 0x22, 0x1C], // 'D'
    [0x7F, 0x49, 0x49, 0x49, 0x41], // 'E'
    [0x7F, 0x09, 0x09, 0x01, 0x01], // 'F'
    [0x3E, 0x41, 0x41, 0x51, 0x32], // 'G'
    [0x7F, 0x08, 0x08, 0x08, 0x7F], // 'H'
    [0x00, 0x41, 0x7F, 0x41, 0x00], // 'I'
    [0x20, 0x40, 0x41, 0x3F, 0x01], // 'J'
    [0x7F, 0x08, 0x14, 0x22, 0x41], // 'K'
    [0x7F, 0x40, 0x40, 0x40, 0x40], // 'L'
    [0x7F, 0x02, 0x04, 0x02, 0x7F], // 'M'
    [0x7F, 0x04, 0x08, 0x10, 0x7F], // 'N'
    [0x3E, 0x41, 0x41, 0x41, 0x3E], // 'O'
    [0x7F, 0x09, 0x09, 0x09, 0x06], // 'P'
    [0x3E, 0x41, 0x51, 0x21, 0x5E], // 'Q'
    [0x7F, 0x09, 0x19, 0x29, 0x46], // 'R'
    [0x46, 0x49, 0x49, 0x49, 0x31], // 'S'
    [0x01, 0x01, 0x7F, 0x01, 0x01], // 'T'
    [0x3F, 0x40, 0x40, 0x40, 0x3F], // 'U'
    [0x1F, 0x20, 0x40, 0x20, 0x1F], // 'V'
    [0x7F, 0x20, 0x18, 0x20, 0x7F], // 'W'
    [0x63, 0x14, 0x08, 0x14, 0x63], // 'X'
    [0x03, 0x04, 0x78, 0x04, 0x03], // 'Y'
    [0x61, 0x51, 0x49, 0x45, 0x43], // 'Z'
    [0x00, 0x00, 0x7F, 0x41, 0x41], // '['
    [0x02, 0x04, 0x08, 0x10, 0x20], // '\\'
    [0x41, 0x41, 0x7F, 0x00, 0x00], // ']'
    [0x04, 0x02, 0x01, 0x02, 0x04], // '^'
    [0x40, 0x40, 0x40, 0x40, 0x40], // '_'
    [0x00, 0x01, 0x02, 0x04, 0x00], // '`'
    [0x20, 0x54, 0x54, 0x54, 0x78], // 'a'
    [0x7F, 0x48, 0x44, 0x44, 0x38], // 'b'
    [0x38, 0x44, 0x44, 0x44, 0x20], // 'c'
    [0x38, 0x44, 0x44, 0x48, 0x7F], // 'd'
    [0x38, 0x54, 0x54, 0x54, 0x18], // 'e'
    [0x08, 0x7E, 0x09, 0x01, 0x02], // 'f'
    [0x08, 0x14, 0x54, 0x54, 0x3C], // 'g'
    [0x7F, 0x08, 0x04, 0x04, 0x78], // 'h'
    [0x00, 0x44, 0x7D, 0x40, 0x00], // 'i'
    [0x20, 0x40, 0x44, 0x3D, 0x00], // 'j'
    [0x00, 0x7F, 0x10, 0x28, 0x44], // 'k'
    [0x00, 0x41, 0x7F, 0x40, 0x00], // 'l'
    [0x7C, 0x04, 0x18, 0x04, 0x78], // 'm'
    [0x7C, 0x08, 0x04, 0x04, 0x78], // 'n'
    [0x38, 0x44, 0x44, 0x44, 0x38], // 'o'
    [0x7C, 0x14, 0x14, 0x14, 0x08], // 'p'
    [0x08, 0x14, 0x14, 0x18, 0x7C], // 'q'
    [0x7C, 0x08, 0x04, 0x04, 0x08], // 'r'
    [0x48, 0x54, 0x54, 0x54, 0x20], // 's'
    [0x04, 0x3F, 0x44, 0x40, 0x20], // 't'
    [0x3C, 0x40, 0x40, 0x20, 0x7C], // 'u'
    [0x1C, 0x20, 0x40, 0x20, 0x1C], // 'v'
    [0x3C, 0x40, 0x30, 0x40, 0x3C], // 'w'
    [0x44, 0x28, 0x10, 0x28, 0x44], // 'x'
    [0x0C, 0x50, 0x50, 0x50, 0x3C], // 'y'
    [0x44, 0x64, 0x54, 0x4C, 0x44], // 'z'
    [0x00, 0x08, 0x36, 0x41, 0x00], // '{'
    [0x00, 0x00, 0x7F, 0x00, 0x00], // '|'
    [0x00, 0x41, 0x36, 0x08, 0x00], // '}'
    [0x08, 0x08, 0x2A, 0x1C, 0x08], // '~'
];

const SELECTOR_ROWS: [&[u8]; 7] = [
    &[1, 0, 0, 0],
    &[1, 1, 0, 0],
    &[1, 1, 1, 0],
    &[1, 1, 1, 1],
    &[1, 1, 1, 0],
    &[1, 1, 0, 0],
    &[1, 0, 0, 0],
];

const MOUNT_ROWS: [&[u8]; 4] = [
    &[1, 1, 1, 1],
    &[1, 0, 0, 1],
    &[1, 0, 0, 1],
    &[1, 1, 1, 1],
];

fn glyph(ch: char) -> [u8; 5] {
    let index = (ch as usize).wrapping_sub(' ' as usize);
    *FONT
        .get(index)
        .unwrap_or(&FONT[('?' as usize) - (' ' as usize)])
}

/// Render a line of text, one glyph cell per character.
pub fn render_text(text: impl AsRef<str>) -> Bitmap {
    let text = text.as_ref();
    let mut bitmap = Bitmap::new(text.chars().count() * GLYPH_ADVANCE, GLYPH_HEIGHT);
    for (slot, ch) in text.chars().enumerate() {
        let columns = glyph(ch);
        let origin = slot * GLYPH_ADVANCE;
        for (dx, column) in columns.iter().enumerate() {
            for row in 0..GLYPH_HEIGHT {
                if (column >> row) & 1 == 1 {
                    bitmap.set(origin + dx, row, 1);
                }
            }
        }
    }
    bitmap
}

/// Arrow glyph marking the focused menu row.
pub fn selector() -> Bitmap {
    Bitmap::from_rows(&SELECTOR_ROWS)
}

/// Square glyph marking a mounted entry.
pub fn mount_indicator() -> Bitmap {
    Bitmap::from_rows(&MOUNT_ROWS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_text_dimensions() {
        let bitmap = render_text("volume0");
        assert_eq!(bitmap.width(), 7 * GLYPH_ADVANCE);
        assert_eq!(bitmap.height(), GLYPH_HEIGHT);
        assert_eq!(render_text("").width(), 0);
    }

    #[test]
    fn test_glyph_columns_render_top_down() {
        // 'A' leads with column 0x7E: rows 1 through 6 lit, row 0 dark.
        let bitmap = render_text("A");
        assert_eq!(bitmap.get(0, 0), Some(0));
        for row in 1..7 {
            assert_eq!(bitmap.get(0, row), Some(1));
        }
        // Crossbar column 0x11: rows 0 and 4.
        assert_eq!(bitmap.get(2, 0), Some(1));
        assert_eq!(bitmap.get(2, 4), Some(1));
        assert_eq!(bitmap.get(2, 2), Some(0));
    }

    #[test]
    fn test_unknown_characters_fall_back_to_question_mark() {
        assert_eq!(render_text("\u{00e9}"), render_text("?"));
        assert_eq!(render_text("\t"), render_text("?"));
    }

    #[test]
    fn test_marker_glyphs_fit_a_text_row() {
        assert_eq!(selector().height(), GLYPH_HEIGHT);
        assert!(selector().width() <= GLYPH_ADVANCE);
        assert!(mount_indicator().height() <= GLYPH_HEIGHT);
    }
}
