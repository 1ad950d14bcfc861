// image.rs — Runtime-sized image container, generic over pixel type.
//
// Every stage of the renderer produces or consumes an `Image<u32>`, holding
// either escape-time iteration counts (CPU reference, GPU readback) or packed
// 0x00RRGGBB colours (palette output, window buffer).
//
// Rows are packed (no stride padding). The GPU kernel writes into a flat
// storage buffer with exactly `width * height` elements, so readback maps
// straight onto `Image::from_vec` with no compaction step.

use std::fmt;

use rayon::prelude::*;

// ---------------------------------------------------------------------------
// Pixel Trait
// ---------------------------------------------------------------------------

/// Types that can serve as pixel values in an Image.
///
/// `bytemuck::Pod` lets GPU readback reinterpret mapped bytes as `&[T]`
/// without an unsafe cast.
pub trait Pixel: Copy + Default + Send + Sync + PartialEq + bytemuck::Pod + 'static {}

/// Iteration counts and packed colours.
impl Pixel for u32 {}

// ---------------------------------------------------------------------------
// Image<T>
// ---------------------------------------------------------------------------

/// A 2D image with runtime dimensions, generic over pixel type `T`.
///
/// Row-major and contiguous: pixel `(x, y)` lives at `y * width + x`.
#[derive(Clone, PartialEq)]
pub struct Image<T: Pixel> {
    data: Vec<T>,
    width: usize,
    height: usize,
}

impl<T: Pixel> Image<T> {
    /// Create a zero-initialised image.
    pub fn new(width: usize, height: usize) -> Self {
        Image {
            data: vec![T::default(); width * height],
            width,
            height,
        }
    }

    /// Create an image filled with a single value.
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Image {
            data: vec![value; width * height],
            width,
            height,
        }
    }

    /// Create an image from an existing pixel vector.
    ///
    /// # Panics
    /// Panics if `data.len() != width * height`.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Self {
        assert_eq!(
            data.len(),
            width * height,
            "data length ({}) must equal width * height ({})",
            data.len(),
            width * height,
        );
        Image { data, width, height }
    }

    // --- Accessors ---

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of pixels (`width * height`).
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the pixel value at (x, y). x is column, y is row.
    ///
    /// # Panics
    /// Panics if (x, y) is out of bounds.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> T {
        self.bounds_check(x, y);
        self.data[y * self.width + x]
    }

    /// Set the pixel at (x, y).
    ///
    /// # Panics
    /// Panics if (x, y) is out of bounds.
    #[inline]
    pub fn set(&mut self, x: usize, y: usize, value: T) {
        self.bounds_check(x, y);
        self.data[y * self.width + x] = value;
    }

    /// Borrow a single row as a slice.
    #[inline]
    pub fn row(&self, y: usize) -> &[T] {
        assert!(y < self.height, "row {y} out of bounds (height {})", self.height);
        let start = y * self.width;
        &self.data[start..start + self.width]
    }

    /// Mutable borrow of a single row.
    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        assert!(y < self.height, "row {y} out of bounds (height {})", self.height);
        let start = y * self.width;
        &mut self.data[start..start + self.width]
    }

    /// Mutable row slices as a rayon parallel iterator.
    pub fn par_rows_mut(&mut self) -> rayon::slice::ChunksExactMut<'_, T> {
        // Chunk size 0 panics; a zero-width image has no rows to hand out anyway.
        self.data.par_chunks_exact_mut(self.width.max(1))
    }

    /// Iterate over all pixels as `(x, y, value)` tuples.
    pub fn pixels(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        (0..self.height).flat_map(move |y| {
            (0..self.width).map(move |x| (x, y, self.data[y * self.width + x]))
        })
    }

    /// Map every pixel into a new image of a (possibly different) pixel type.
    pub fn map<U: Pixel>(&self, f: impl Fn(T) -> U) -> Image<U> {
        Image {
            data: self.data.iter().map(|&v| f(v)).collect(),
            width: self.width,
            height: self.height,
        }
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    fn bounds_check(&self, x: usize, y: usize) {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x},{y}) out of bounds for image {}×{}",
            self.width,
            self.height,
        );
    }
}

// Debug formatting: prints the top-left corner, enough for small test images.
impl<T: Pixel + fmt::Debug> fmt::Debug for Image<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Image<{}> {{ {}×{} }}",
            std::any::type_name::<T>(),
            self.width,
            self.height,
        )?;
        for y in 0..self.height.min(8) {
            write!(f, "  row {y}: [")?;
            for x in 0..self.width.min(16) {
                if x > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{:?}", self.get(x, y))?;
            }
            if self.width > 16 {
                write!(f, ", ...")?;
            }
            writeln!(f, "]")?;
        }
        if self.height > 8 {
            writeln!(f, "  ...")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_zeroed() {
        let img: Image<u32> = Image::new(4, 3);
        assert_eq!(img.len(), 12);
        assert!(img.as_slice().iter().all(|&v| v == 0));
    }

    #[test]
    fn test_from_vec_row_major() {
        let img = Image::from_vec(3, 2, vec![1u32, 2, 3, 4, 5, 6]);
        assert_eq!(img.get(0, 0), 1);
        assert_eq!(img.get(2, 0), 3);
        assert_eq!(img.get(0, 1), 4);
        assert_eq!(img.row(1), &[4, 5, 6]);
    }

    #[test]
    #[should_panic(expected = "must equal width * height")]
    fn test_from_vec_wrong_length() {
        let _ = Image::from_vec(3, 2, vec![0u32; 5]);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_get_out_of_bounds() {
        let img: Image<u32> = Image::new(2, 2);
        img.get(2, 0);
    }

    #[test]
    fn test_par_rows_mut_covers_every_row() {
        let mut img: Image<u32> = Image::new(5, 4);
        img.par_rows_mut()
            .enumerate()
            .for_each(|(y, row)| row.fill(y as u32));
        assert_eq!(img.get(4, 3), 3);
        assert_eq!(img.get(0, 0), 0);
    }

    #[test]
    fn test_map_applies_to_every_pixel() {
        let img = Image::from_vec(2, 1, vec![10u32, 300]);
        let doubled = img.map(|v| v * 2);
        assert_eq!(doubled.as_slice(), &[20, 600]);
        assert_eq!((doubled.width(), doubled.height()), (2, 1));
    }
}
