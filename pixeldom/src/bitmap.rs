//! Monochrome pixel grid with the composition primitives the menu
//! renderer is built from: clipped blitting with optional transparency,
//! grow-only resizing, and quarter-turn rotation.

use std::fmt;

/// Quarter-turn direction for [`Bitmap::rotate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    Left,
    Right,
}

/// A 2-D grid of pixel values. Zero is "off"; any other value is "on".
///
/// All operations are total: out-of-range writes and oversized blit
/// sources are clipped, never rejected. A 0x0 bitmap is valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bitmap {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Bitmap {
    /// Create a zero-filled bitmap of the given size.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height],
        }
    }

    /// Build a bitmap from row data. Short rows are padded with zeros to
    /// the width of the longest row.
    pub fn from_rows(rows: &[&[u8]]) -> Self {
        let width = rows.iter().map(|row| row.len()).max().unwrap_or(0);
        let mut bitmap = Self::new(width, rows.len());
        for (y, row) in rows.iter().enumerate() {
            for (x, &value) in row.iter().enumerate() {
                bitmap.set(x, y, value);
            }
        }
        bitmap
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x < self.width && y < self.height {
            Some(self.pixels[self.index(x, y)])
        } else {
            None
        }
    }

    pub fn set(&mut self, x: usize, y: usize, value: u8) {
        if x < self.width && y < self.height {
            let idx = self.index(x, y);
            self.pixels[idx] = value;
        }
    }

    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Copy `src` into this bitmap with its top-left corner at `pos`,
    /// silently dropping source pixels that fall outside the bounds.
    ///
    /// With `transparent` set, zero-valued source pixels leave the
    /// destination untouched, so a glyph can be drawn over existing
    /// content without blanking the pixels around its strokes.
    pub fn blit(&mut self, src: &Bitmap, pos: (usize, usize), transparent: bool) {
        let (x0, y0) = pos;
        for sy in 0..src.height {
            let dy = y0 + sy;
            if dy >= self.height {
                break;
            }
            for sx in 0..src.width {
                let dx = x0 + sx;
                if dx >= self.width {
                    break;
                }
                let value = src.pixels[src.index(sx, sy)];
                if transparent && value == 0 {
                    continue;
                }
                let idx = self.index(dx, dy);
                self.pixels[idx] = value;
            }
        }
    }

    /// Append `rows` zero rows to the bottom of the grid.
    pub fn expand_height(&mut self, rows: usize) {
        self.height += rows;
        self.pixels.resize(self.width * self.height, 0);
    }

    /// Append `columns` zero columns to the right of every row.
    pub fn expand_width(&mut self, columns: usize) {
        if columns == 0 {
            return;
        }
        let width = self.width + columns;
        let mut pixels = vec![0; width * self.height];
        for y in 0..self.height {
            let src = y * self.width;
            let dst = y * width;
            pixels[dst..dst + self.width].copy_from_slice(&self.pixels[src..src + self.width]);
        }
        self.width = width;
        self.pixels = pixels;
    }

    /// Produce a new bitmap rotated a quarter turn, width and height
    /// swapped. Rotating left then right round-trips to the original.
    pub fn rotate(&self, rotation: Rotation) -> Bitmap {
        let mut rotated = Bitmap::new(self.height, self.width);
        for y in 0..self.height {
            for x in 0..self.width {
                let value = self.pixels[self.index(x, y)];
                match rotation {
                    Rotation::Left => rotated.set(y, self.width - 1 - x, value),
                    Rotation::Right => rotated.set(self.height - 1 - y, x, value),
                }
            }
        }
        rotated
    }
}

/// Textual dump, one row per line: `' '` for an off pixel, the numeric
/// value otherwise. Debugging and test fixtures only.
impl fmt::Display for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            for x in 0..self.width {
                let value = self.pixels[self.index(x, y)];
                if value == 0 {
                    write!(f, " ")?;
                } else {
                    write!(f, "{}", value)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
