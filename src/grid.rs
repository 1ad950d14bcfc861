// grid.rs — Panel count rounding and grid shape.
//
// The requested panel count is rounded up to a power of two, then split into
// rows × columns:
//
//   rows = round_up_pow2(floor(sqrt(count)))
//   cols = count / rows
//
// Since both `count` and `rows` are powers of two and rows <= count, the
// division is exact and rows * cols == count. Shapes come out square for
// even powers and twice as wide as tall for odd ones below 32:
//
//   count:  1    2    4    8    16   32   64
//   shape:  1×1  1×2  2×2  2×4  4×4  8×4  8×8
//
// (32 is the odd one out: floor(sqrt(32)) = 5 rounds up to 8 rows.)

use thiserror::Error;

/// Errors from turning a requested panel count into a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("panel count {0} has no power of two that fits in u32")]
    TooManyPanels(u32),
}

/// Smallest power of two `>= n`. Zero rounds up to 1, so a request for no
/// panels still shows the Mandelbrot set.
pub fn round_up_pow2(n: u32) -> Result<u32, GridError> {
    n.checked_next_power_of_two()
        .ok_or(GridError::TooManyPanels(n))
}

/// Rows × columns of the panel grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    pub rows: u32,
    pub cols: u32,
}

impl GridShape {
    /// Grid for a requested panel count (rounded up to a power of two first).
    pub fn for_panels(requested: u32) -> Result<Self, GridError> {
        let count = round_up_pow2(requested)?;
        let root = (count as f64).sqrt().floor() as u32;
        let rows = round_up_pow2(root)?;
        Ok(GridShape { rows, cols: count / rows })
    }

    /// Total number of cells.
    #[inline]
    pub fn len(&self) -> usize {
        (self.rows * self.cols) as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// (row, col) of cell `index`, filling left-to-right then top-to-bottom.
    #[inline]
    pub fn position(&self, index: usize) -> (usize, usize) {
        let cols = self.cols as usize;
        (index / cols, index % cols)
    }

    /// Top-left pixel of cell `index` in the composite framebuffer.
    pub fn cell_origin(&self, index: usize, cell_w: usize, cell_h: usize) -> (usize, usize) {
        let (row, col) = self.position(index);
        (col * cell_w, row * cell_h)
    }
}
