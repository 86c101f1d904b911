//! Chat-to-pixel text rendering on a fixed character grid.
//!
//! Messages tile one after another: each render continues from the cursor
//! the previous render returned, wrapping at the grid width and wrapping
//! back to the top line once the grid is full.

use canvas_core::Rgb;
use image::{Rgba, RgbaImage};
use rand::Rng;

use crate::font::{self, GLYPH_HEIGHT, GLYPH_WIDTH};

/// Prefixed to every message so consecutive messages stay readable.
pub const SEPARATOR: &str = " | ";

/// Glyph plus one pixel of spacing on each axis.
pub const CELL_WIDTH: u32 = GLYPH_WIDTH + 1;
pub const CELL_HEIGHT: u32 = GLYPH_HEIGHT + 1;

/// Line/column position where the next character is drawn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextCursor {
    pub line: u32,
    pub column: u32,
}

impl TextCursor {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

/// Output of one render call.
#[derive(Debug, Clone)]
pub struct TextRender {
    /// Whole-grid image, transparent except for glyph pixels.
    pub image: RgbaImage,
    /// Where the next message continues.
    pub cursor: TextCursor,
    pub color: Rgb,
}

/// Character grid dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextGrid {
    pub lines: u32,
    pub columns: u32,
}

impl Default for TextGrid {
    fn default() -> Self {
        Self {
            lines: 62,
            columns: 166,
        }
    }
}

impl TextGrid {
    pub fn pixel_width(&self) -> u32 {
        self.columns * CELL_WIDTH
    }

    pub fn pixel_height(&self) -> u32 {
        self.lines * CELL_HEIGHT
    }

    /// Render with a random color from the thread RNG.
    ///
    /// Panics if the grid has no lines or no columns.
    pub fn render(&self, text: &str, cursor: TextCursor) -> TextRender {
        self.render_with_rng(text, cursor, &mut rand::thread_rng())
    }

    pub fn render_with_rng<R: Rng + ?Sized>(
        &self,
        text: &str,
        cursor: TextCursor,
        rng: &mut R,
    ) -> TextRender {
        let color = Rgb::from(rng.r#gen::<[u8; 3]>());
        let pixel = Rgba([color.r, color.g, color.b, 255]);
        let mut image = RgbaImage::new(self.pixel_width(), self.pixel_height());

        let mut line = cursor.line % self.lines;
        let mut column = cursor.column.min(self.columns);

        for c in SEPARATOR.chars().chain(text.chars()) {
            if column >= self.columns {
                column = 0;
                line = (line + 1) % self.lines;
            }
            let c = if c == '\n' || c == '\r' { ' ' } else { c };
            self.draw_glyph(&mut image, c, line, column, pixel);
            column += 1;
        }
        if column >= self.columns {
            column = 0;
            line = (line + 1) % self.lines;
        }

        TextRender {
            image,
            cursor: TextCursor::new(line, column),
            color,
        }
    }

    fn draw_glyph(&self, image: &mut RgbaImage, c: char, line: u32, column: u32, pixel: Rgba<u8>) {
        let left = column * CELL_WIDTH;
        let top = line * CELL_HEIGHT;
        for row in 0..GLYPH_HEIGHT {
            for col in 0..GLYPH_WIDTH {
                if font::is_set(c, col, row) {
                    image.put_pixel(left + col, top + row, pixel);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::decompose::is_opaque;

    fn opaque_count(image: &RgbaImage) -> usize {
        image.pixels().filter(|p| is_opaque(p)).count()
    }

    #[test]
    fn cursor_advances_past_separator_and_text() {
        let grid = TextGrid::default();
        let mut rng = StdRng::seed_from_u64(7);
        let out = grid.render_with_rng("hi", TextCursor::new(3, 10), &mut rng);
        assert_eq!(out.cursor, TextCursor::new(3, 10 + 3 + 2));
    }

    #[test]
    fn wraps_from_current_column() {
        let grid = TextGrid {
            lines: 4,
            columns: 8,
        };
        let mut rng = StdRng::seed_from_u64(1);
        // 3 separator chars + 7 chars, starting at column 5
        let out = grid.render_with_rng("abcdefg", TextCursor::new(0, 5), &mut rng);
        assert_eq!(out.cursor, TextCursor::new(1, 7));
    }

    #[test]
    fn exact_fill_moves_to_next_line() {
        let grid = TextGrid {
            lines: 2,
            columns: 5,
        };
        let mut rng = StdRng::seed_from_u64(1);
        let out = grid.render_with_rng("ab", TextCursor::new(1, 0), &mut rng);
        // wraps past the last line back to the top
        assert_eq!(out.cursor, TextCursor::new(0, 0));
    }

    #[test]
    fn newlines_are_flattened() {
        let grid = TextGrid::default();
        let mut rng = StdRng::seed_from_u64(3);
        let a = grid.render_with_rng("a\nb", TextCursor::default(), &mut rng);
        let mut rng = StdRng::seed_from_u64(3);
        let b = grid.render_with_rng("a b", TextCursor::default(), &mut rng);
        assert_eq!(a.cursor, b.cursor);
        assert_eq!(a.image, b.image);
    }

    #[test]
    fn one_color_per_render() {
        let grid = TextGrid::default();
        let mut rng = StdRng::seed_from_u64(11);
        let out = grid.render_with_rng("HELLO", TextCursor::default(), &mut rng);
        assert!(opaque_count(&out.image) > 0);
        let expected = Rgba([out.color.r, out.color.g, out.color.b, 255]);
        assert!(out.image.pixels().filter(|p| is_opaque(p)).all(|p| *p == expected));
    }

    #[test]
    fn image_covers_whole_grid() {
        let grid = TextGrid::default();
        let out = grid.render("x", TextCursor::default());
        assert_eq!(out.image.dimensions(), (166 * CELL_WIDTH, 62 * CELL_HEIGHT));
    }
}
