// fractal.rs — Fractal parameters and the CPU reference escape-time kernel.
//
// Each grid cell is described by a `FractalParams`: which set (Mandelbrot or
// Julia), the region of the complex plane it covers, the image size and the
// iteration cap. The GPU kernel in gpu/fractal.rs consumes exactly these
// parameters; the CPU implementation here is the reference it is validated
// against.
//
// ESCAPE TIME
// ───────────
//   z ← z² + c     while |z|² < 4 and n < max_iterations
//
//   Mandelbrot:  z₀ = 0,      c = pixel
//   Julia:       z₀ = pixel,  c = constant
//
// The result is the iteration count n ∈ [0, max_iterations]. A count equal to
// max_iterations means the orbit stayed bounded and the point is treated as
// inside the set.
//
// PRECISION
// ─────────
// All arithmetic is f32 and the update is written out component-wise in the
// same order as the WGSL shader. The two paths still differ in rare pixels
// right on the escape boundary (GPUs may fuse multiply-adds), so GPU/CPU
// comparisons use an agreement ratio rather than exact equality.

use std::f32::consts::TAU;
use std::fmt;

use num_complex::Complex32;
use rayon::prelude::*;
use thiserror::Error;

use crate::image::Image;

/// Magnitude used for the Julia constants. 0.7885 traces a circle that
/// passes through connected and dust-like Julia sets.
pub const JULIA_RADIUS: f32 = 0.7885;

/// Default iteration cap.
pub const DEFAULT_MAX_ITERATIONS: u32 = 250;

/// Squared escape radius (|z| >= 2 always diverges).
pub const ESCAPE_RADIUS_SQ: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FractalError {
    #[error("fractal image must have a non-zero size (got {width}×{height})")]
    EmptyImage { width: u32, height: u32 },
    #[error("cell index {index} out of range for {count} cells")]
    CellIndex { index: usize, count: usize },
}

/// Which set a cell renders.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FractalKind {
    Mandelbrot,
    Julia { c: Complex32 },
}

impl fmt::Display for FractalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FractalKind::Mandelbrot => write!(f, "Mandelbrot"),
            FractalKind::Julia { c } => write!(f, "Julia(c = {:.4} {:+.4}i)", c.re, c.im),
        }
    }
}

/// Axis-aligned region of the complex plane mapped onto the image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x_min: f32,
    pub x_max: f32,
    pub y_min: f32,
    pub y_max: f32,
}

impl Viewport {
    /// Whole Mandelbrot set with a little margin.
    pub const MANDELBROT: Viewport = Viewport { x_min: -2.0, x_max: 0.6, y_min: -1.3, y_max: 1.3 };

    /// Julia sets for |c| < 2 fit inside this square.
    pub const JULIA: Viewport = Viewport { x_min: -1.5, x_max: 1.5, y_min: -1.5, y_max: 1.5 };

    /// Point of the complex plane under pixel (px, py) of a `width × height` image.
    #[inline]
    pub fn point(&self, px: u32, py: u32, width: u32, height: u32) -> Complex32 {
        let dx = (self.x_max - self.x_min) / width as f32;
        let dy = (self.y_max - self.y_min) / height as f32;
        Complex32::new(self.x_min + px as f32 * dx, self.y_min + py as f32 * dy)
    }
}

/// Everything needed to render one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FractalParams {
    pub kind: FractalKind,
    pub viewport: Viewport,
    pub width: u32,
    pub height: u32,
    pub max_iterations: u32,
}

impl FractalParams {
    pub fn new(
        kind: FractalKind,
        viewport: Viewport,
        width: u32,
        height: u32,
        max_iterations: u32,
    ) -> Result<Self, FractalError> {
        if width == 0 || height == 0 {
            return Err(FractalError::EmptyImage { width, height });
        }
        Ok(FractalParams { kind, viewport, width, height, max_iterations })
    }

    /// Parameters for cell `index` of a `count`-cell grid.
    ///
    /// Cell 0 is the Mandelbrot set. Cell k > 0 is the Julia set for
    /// `c = JULIA_RADIUS · e^{iθ}` with `θ = 2πk / count`, so the Julia
    /// constants walk once around a circle as the index grows.
    pub fn for_cell(
        index: usize,
        count: usize,
        width: u32,
        height: u32,
        max_iterations: u32,
    ) -> Result<Self, FractalError> {
        if index >= count {
            return Err(FractalError::CellIndex { index, count });
        }
        let (kind, viewport) = if index == 0 {
            (FractalKind::Mandelbrot, Viewport::MANDELBROT)
        } else {
            let theta = TAU * index as f32 / count as f32;
            let c = Complex32::from_polar(JULIA_RADIUS, theta);
            (FractalKind::Julia { c }, Viewport::JULIA)
        };
        Self::new(kind, viewport, width, height, max_iterations)
    }

    /// Starting point and additive constant for pixel (px, py).
    #[inline]
    pub fn orbit_start(&self, px: u32, py: u32) -> (Complex32, Complex32) {
        let p = self.viewport.point(px, py, self.width, self.height);
        match self.kind {
            FractalKind::Mandelbrot => (Complex32::new(0.0, 0.0), p),
            FractalKind::Julia { c } => (p, c),
        }
    }
}

/// Escape-time iteration count for one orbit.
#[inline]
pub fn escape_time(z0: Complex32, c: Complex32, max_iterations: u32) -> u32 {
    let (mut x, mut y) = (z0.re, z0.im);
    let mut n = 0;
    while n < max_iterations && x * x + y * y < ESCAPE_RADIUS_SQ {
        let xt = x * x - y * y + c.re;
        y = 2.0 * x * y + c.im;
        x = xt;
        n += 1;
    }
    n
}

/// Render iteration counts on the CPU. Rows are computed in parallel.
pub fn render_cpu(params: &FractalParams) -> Image<u32> {
    let mut img = Image::new(params.width as usize, params.height as usize);
    img.par_rows_mut().enumerate().for_each(|(py, row)| {
        for (px, out) in row.iter_mut().enumerate() {
            let (z0, c) = params.orbit_start(px as u32, py as u32);
            *out = escape_time(z0, c, params.max_iterations);
        }
    });
    img
}

/// Fraction of pixels on which two iteration-count images agree within
/// `tolerance` iterations. Used to compare GPU output against `render_cpu`.
///
/// # Panics
/// Panics if the images differ in size.
#[cfg(test)]
pub(crate) fn agreement(a: &Image<u32>, b: &Image<u32>, tolerance: u32) -> f32 {
    assert_eq!(
        (a.width(), a.height()),
        (b.width(), b.height()),
        "agreement() needs images of equal size"
    );
    if a.is_empty() {
        return 1.0;
    }
    let matching = a
        .as_slice()
        .iter()
        .zip(b.as_slice())
        .filter(|&(&x, &y)| x.abs_diff(y) <= tolerance)
        .count();
    matching as f32 / a.len() as f32
}
