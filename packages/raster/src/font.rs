//! 3x5 fixed-width bitmap font covering printable ASCII.
//!
//! Each glyph is five rows; bit 2 of a row is the leftmost pixel.
//! Lowercase letters share the uppercase shapes.

pub const GLYPH_WIDTH: u32 = 3;
pub const GLYPH_HEIGHT: u32 = 5;

const FIRST: u32 = 0x20;
const FALLBACK: char = '?';

#[rustfmt::skip]
const GLYPHS: [[u8; 5]; 95] = [
    [0b000, 0b000, 0b000, 0b000, 0b000], // ' '
    [0b010, 0b010, 0b010, 0b000, 0b010], // '!'
    [0b101, 0b101, 0b000, 0b000, 0b000], // '"'
    [0b101, 0b111, 0b101, 0b111, 0b101], // '#'
    [0b011, 0b110, 0b010, 0b011, 0b110], // '$'
    [0b100, 0b001, 0b010, 0b100, 0b001], // '%'
    [0b010, 0b101, 0b010, 0b101, 0b011], // '&'
    [0b010, 0b010, 0b000, 0b000, 0b000], // "'"
    [0b001, 0b010, 0b010, 0b010, 0b001], // '('
    [0b100, 0b010, 0b010, 0b010, 0b100], // ')'
    [0b000, 0b101, 0b010, 0b101, 0b000], // '*'
    [0b000, 0b010, 0b111, 0b010, 0b000], // '+'
    [0b000, 0b000, 0b000, 0b010, 0b100], // ','
    [0b000, 0b000, 0b111, 0b000, 0b000], // '-'
    [0b000, 0b000, 0b000, 0b000, 0b010], // '.'
    [0b001, 0b001, 0b010, 0b100, 0b100], // '/'
    [0b111, 0b101, 0b101, 0b101, 0b111], // '0'
    [0b010, 0b110, 0b010, 0b010, 0b111], // '1'
    [0b111, 0b001, 0b111, 0b100, 0b111], // '2'
    [0b111, 0b001, 0b011, 0b001, 0b111], // '3'
    [0b101, 0b101, 0b111, 0b001, 0b001], // '4'
    [0b111, 0b100, 0b111, 0b001, 0b111], // '5'
    [0b111, 0b100, 0b111, 0b101, 0b111], // '6'
    [0b111, 0b001, 0b010, 0b010, 0b010], // '7'
    [0b111, 0b101, 0b111, 0b101, 0b111], // '8'
    [0b111, 0b101, 0b111, 0b001, 0b111], // '9'
    [0b000, 0b010, 0b000, 0b010, 0b000], // ':'
    [0b000, 0b010, 0b000, 0b010, 0b100], // ';'
    [0b001, 0b010, 0b100, 0b010, 0b001], // '<'
    [0b000, 0b111, 0b000, 0b111, 0b000], // '='
    [0b100, 0b010, 0b001, 0b010, 0b100], // '>'
    [0b111, 0b001, 0b010, 0b000, 0b010], // '?'
    [0b010, 0b101, 0b111, 0b100, 0b011], // '@'
    [0b010, 0b101, 0b111, 0b101, 0b101], // 'A'
    [0b110, 0b101, 0b110, 0b101, 0b110], // 'B'
    [0b011, 0b100, 0b100, 0b100, 0b011], // 'C'
    [0b110, 0b101, 0b101, 0b101, 0b110], // 'D'
    [0b111, 0b100, 0b111, 0b100, 0b111], // 'E'
    [0b111, 0b100, 0b111, 0b100, 0b100], // 'F'
    [0b011, 0b100, 0b101, 0b101, 0b011], // 'G'
    [0b101, 0b101, 0b111, 0b101, 0b101], // 'H'
    [0b111, 0b010, 0b010, 0b010, 0b111], // 'I'
    [0b001, 0b001, 0b001, 0b101, 0b010], // 'J'
    [0b101, 0b101, 0b110, 0b101, 0b101], // 'K'
    [0b100, 0b100, 0b100, 0b100, 0b111], // 'L'
    [0b101, 0b111, 0b101, 0b101, 0b101], // 'M'
    [0b110, 0b101, 0b101, 0b101, 0b101], // 'N'
    [0b010, 0b101, 0b101, 0b101, 0b010], // 'O'
    [0b110, 0b101, 0b110, 0b100, 0b100], // 'P'
    [0b010, 0b101, 0b101, 0b110, 0b011], // 'Q'
    [0b110, 0b101, 0b110, 0b101, 0b101], // 'R'
    [0b011, 0b100, 0b010, 0b001, 0b110], // 'S'
    [0b111, 0b010, 0b010, 0b010, 0b010], // 'T'
    [0b101, 0b101, 0b101, 0b101, 0b111], // 'U'
    [0b101, 0b101, 0b101, 0b101, 0b010], // 'V'
    [0b101, 0b101, 0b111, 0b111, 0b101], // 'W'
    [0b101, 0b101, 0b010, 0b101, 0b101], // 'X'
    [0b101, 0b101, 0b010, 0b010, 0b010], // 'Y'
    [0b111, 0b001, 0b010, 0b100, 0b111], // 'Z'
    [0b110, 0b100, 0b100, 0b100, 0b110], // '['
    [0b100, 0b100, 0b010, 0b001, 0b001], // '\\'
    [0b011, 0b001, 0b001, 0b001, 0b011], // ']'
    [0b010, 0b101, 0b000, 0b000, 0b000], // '^'
    [0b000, 0b000, 0b000, 0b000, 0b111], // '_'
    [0b100, 0b010, 0b000, 0b000, 0b000], // '`'
    [0b010, 0b101, 0b111, 0b101, 0b101], // 'a'
    [0b110, 0b101, 0b110, 0b101, 0b110], // 'b'
    [0b011, 0b100, 0b100, 0b100, 0b011], // 'c'
    [0b110, 0b101, 0b101, 0b101, 0b110], // 'd'
    [0b111, 0b100, 0b111, 0b100, 0b111], // 'e'
    [0b111, 0b100, 0b111, 0b100, 0b100], // 'f'
    [0b011, 0b100, 0b101, 0b101, 0b011], // 'g'
    [0b101, 0b101, 0b111, 0b101, 0b101], // 'h'
    [0b111, 0b010, 0b010, 0b010, 0b111], // 'i'
    [0b001, 0b001, 0b001, 0b101, 0b010], // 'j'
    [0b101, 0b101, 0b110, 0b101, 0b101], // 'k'
    [0b100, 0b100, 0b100, 0b100, 0b111], // 'l'
    [0b101, 0b111, 0b101, 0b101, 0b101], // 'm'
    [0b110, 0b101, 0b101, 0b101, 0b101], // 'n'
    [0b010, 0b101, 0b101, 0b101, 0b010], // 'o'
    [0b110, 0b101, 0b110, 0b100, 0b100], // 'p'
    [0b010, 0b101, 0b101, 0b110, 0b011], // 'q'
    [0b110, 0b101, 0b110, 0b101, 0b101], // 'r'
    [0b011, 0b100, 0b010, 0b001, 0b110], // 's'
    [0b111, 0b010, 0b010, 0b010, 0b010], // 't'
    [0b101, 0b101, 0b101, 0b101, 0b111], // 'u'
    [0b101, 0b101, 0b101, 0b101, 0b010], // 'v'
    [0b101, 0b101, 0b111, 0b111, 0b101], // 'w'
    [0b101, 0b101, 0b010, 0b101, 0b101], // 'x'
    [0b101, 0b101, 0b010, 0b010, 0b010], // 'y'
    [0b111, 0b001, 0b010, 0b100, 0b111], // 'z'
    [0b011, 0b010, 0b110, 0b010, 0b011], // '{'
    [0b010, 0b010, 0b010, 0b010, 0b010], // '|'
    [0b110, 0b010, 0b011, 0b010, 0b110], // '}'
    [0b000, 0b011, 0b110, 0b000, 0b000], // '~'
];

/// Rows for `c`; characters outside printable ASCII render as `?`.
pub fn glyph(c: char) -> &'static [u8; 5] {
    let index = (c as u32)
        .checked_sub(FIRST)
        .filter(|i| (*i as usize) < GLYPHS.len())
        .unwrap_or(FALLBACK as u32 - FIRST);
    &GLYPHS[index as usize]
}

/// Whether the pixel at (`col`, `row`) of `c` is set.
pub fn is_set(c: char, col: u32, row: u32) -> bool {
    col < GLYPH_WIDTH
        && row < GLYPH_HEIGHT
        && glyph(c)[row as usize] & (1 << (GLYPH_WIDTH - 1 - col)) != 0
}
