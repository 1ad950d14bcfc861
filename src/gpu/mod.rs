// gpu/mod.rs — GPU compute layer.
//
// `device` opens one wgpu device/queue for the whole run; `fractal` holds the
// escape-time kernel. The CPU renderer in `crate::fractal` remains the
// reference implementation and every GPU test compares against it.

pub mod device;
pub mod fractal;
