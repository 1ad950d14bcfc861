// layout.rs — Composing cell images into one framebuffer.
//
//   ┌────────┬────────┬────────┬────────┐
//   │ cell 0 │ cell 1 │ cell 2 │ cell 3 │
//   ├────────┼────────┼────────┼────────┤
//   │ cell 4 │ cell 5 │ cell 6 │ cell 7 │
//   └────────┴────────┴────────┴────────┘
//
// Cells fill left-to-right, top-to-bottom, all the same size, no gaps. The
// framebuffer holds packed 0x00RRGGBB pixels and is handed to the window (or
// the PNG writer) as-is.

use thiserror::Error;

use crate::grid::GridShape;
use crate::image::Image;
use crate::palette::Rgb;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("cell index {index} out of range for a {rows}×{cols} grid")]
    CellIndex { index: usize, rows: u32, cols: u32 },
    #[error("cell image is {got_w}×{got_h}, expected {want_w}×{want_h}")]
    CellSize { got_w: usize, got_h: usize, want_w: usize, want_h: usize },
}

/// The whole window's pixels, built up one cell at a time.
pub struct Composite {
    shape: GridShape,
    cell_w: usize,
    cell_h: usize,
    frame: Image<u32>,
    placed: Vec<bool>,
}

impl Composite {
    /// Black framebuffer for `shape` with `cell_w × cell_h` cells.
    pub fn new(shape: GridShape, cell_w: usize, cell_h: usize) -> Self {
        let width = shape.cols as usize * cell_w;
        let height = shape.rows as usize * cell_h;
        Composite {
            shape,
            cell_w,
            cell_h,
            frame: Image::new(width, height),
            placed: vec![false; shape.len()],
        }
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.frame.width()
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.frame.height()
    }

    /// Copy a cell image into slot `index`.
    pub fn place(&mut self, index: usize, cell: &Image<u32>) -> Result<(), LayoutError> {
        if index >= self.shape.len() {
            return Err(LayoutError::CellIndex {
                index,
                rows: self.shape.rows,
                cols: self.shape.cols,
            });
        }
        if cell.width() != self.cell_w || cell.height() != self.cell_h {
            return Err(LayoutError::CellSize {
                got_w: cell.width(),
                got_h: cell.height(),
                want_w: self.cell_w,
                want_h: self.cell_h,
            });
        }

        let (x0, y0) = self.shape.cell_origin(index, self.cell_w, self.cell_h);
        for y in 0..self.cell_h {
            self.frame.row_mut(y0 + y)[x0..x0 + self.cell_w].copy_from_slice(cell.row(y));
        }
        self.placed[index] = true;
        Ok(())
    }

    /// True once every slot has received an image.
    pub fn is_complete(&self) -> bool {
        self.placed.iter().all(|&p| p)
    }

    /// Packed 0x00RRGGBB pixels, row-major, as minifb expects.
    pub fn pixels(&self) -> &[u32] {
        self.frame.as_slice()
    }

    pub fn frame(&self) -> &Image<u32> {
        &self.frame
    }

    /// Convert to an `image::RgbImage` for saving.
    pub fn to_rgb_image(&self) -> ::image::RgbImage {
        ::image::RgbImage::from_fn(self.width() as u32, self.height() as u32, |x, y| {
            let Rgb(r, g, b) = Rgb::unpack(self.frame.get(x as usize, y as usize));
            ::image::Rgb([r, g, b])
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(w: usize, h: usize, v: u32) -> Image<u32> {
        Image::filled(w, h, v)
    }

    #[test]
    fn test_frame_dimensions() {
        let c = Composite::new(GridShape { rows: 2, cols: 4 }, 30, 20);
        assert_eq!((c.width(), c.height()), (120, 40));
        assert_eq!(c.pixels().len(), 120 * 40);
        assert!(!c.is_complete());
    }

    #[test]
    fn test_place_writes_only_its_slot() {
        let mut c = Composite::new(GridShape { rows: 2, cols: 2 }, 3, 2);
        c.place(3, &solid(3, 2, 7)).unwrap();
        let f = c.frame();
        // Slot 3 is bottom-right: x in 3..6, y in 2..4.
        assert_eq!(f.get(3, 2), 7);
        assert_eq!(f.get(5, 3), 7);
        assert_eq!(f.get(2, 2), 0);
        assert_eq!(f.get(3, 1), 0);
    }

    #[test]
    fn test_place_all_completes() {
        let mut c = Composite::new(GridShape { rows: 1, cols: 2 }, 2, 2);
        c.place(0, &solid(2, 2, 1)).unwrap();
        c.place(1, &solid(2, 2, 2)).unwrap();
        assert!(c.is_complete());
        assert_eq!(c.frame().row(0), &[1, 1, 2, 2]);
    }

    #[test]
    fn test_place_rejects_bad_index_and_size() {
        let mut c = Composite::new(GridShape { rows: 1, cols: 2 }, 2, 2);
        assert_eq!(
            c.place(2, &solid(2, 2, 1)),
            Err(LayoutError::CellIndex { index: 2, rows: 1, cols: 2 })
        );
        assert_eq!(
            c.place(0, &solid(3, 2, 1)),
            Err(LayoutError::CellSize { got_w: 3, got_h: 2, want_w: 2, want_h: 2 })
        );
    }

    #[test]
    fn test_to_rgb_image_unpacks_channels() {
        let mut c = Composite::new(GridShape { rows: 1, cols: 1 }, 1, 1);
        c.place(0, &solid(1, 1, 0x00AA_BBCC)).unwrap();
        let rgb = c.to_rgb_image();
        assert_eq!(rgb.get_pixel(0, 0).0, [0xAA, 0xBB, 0xCC]);
    }
}
