// fractal-grid: a window full of Mandelbrot and Julia sets, one GPU dispatch
// per panel.
//
// Cell 0 is the Mandelbrot set; the remaining cells are Julia sets whose
// constants walk around a circle of radius 0.7885. The CPU renderer in
// `fractal` is the reference that the GPU kernel is checked against.

pub mod image;
pub mod grid;
pub mod fractal;
pub mod palette;
pub mod layout;
pub mod gpu;
pub mod window;
pub mod config;
pub mod app;
