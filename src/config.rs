// config.rs — Command line and run configuration.
//
// `Cli` is the clap-derived surface; `RenderConfig` is the plain struct the
// rest of the crate consumes. Library code and tests build `RenderConfig`
// directly (usually from `Default`) without going through argument parsing.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::fractal::DEFAULT_MAX_ITERATIONS;
use crate::gpu::device::AdapterSelection;

/// Which renderer computes the cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Backend {
    /// wgpu compute kernel.
    #[default]
    Gpu,
    /// CPU reference renderer (rayon).
    Cpu,
}

#[derive(Parser, Debug)]
#[command(name = "fractal-grid")]
#[command(version, about = "Grid of Mandelbrot and Julia sets rendered on the GPU", long_about = None)]
pub struct Cli {
    /// Number of fractal panels (rounded up to a power of two)
    #[arg(value_name = "COUNT", required_unless_present = "list_adapters")]
    pub count: Option<u32>,

    /// Width of each panel in pixels
    #[arg(long, value_name = "PX", default_value_t = 300)]
    pub cell_width: u32,

    /// Height of each panel in pixels
    #[arg(long, value_name = "PX", default_value_t = 300)]
    pub cell_height: u32,

    /// Iteration cap for the escape-time loop
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_ITERATIONS)]
    pub max_iterations: u32,

    /// Renderer to use
    #[arg(long, value_enum, default_value_t = Backend::Gpu)]
    pub backend: Backend,

    /// Adapter index (see --list-adapters); default picks the first hardware adapter
    #[arg(long, value_name = "INDEX")]
    pub adapter: Option<usize>,

    /// Print the available GPU adapters and exit
    #[arg(long)]
    pub list_adapters: bool,

    /// Also write the composite image to this file (format from extension)
    #[arg(long, value_name = "FILE")]
    pub save: Option<PathBuf>,

    /// Do not open a window
    #[arg(long)]
    pub no_window: bool,
}

/// Everything a run needs.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderConfig {
    /// Requested panel count, before power-of-two rounding.
    pub requested_panels: u32,
    pub cell_width: u32,
    pub cell_height: u32,
    pub max_iterations: u32,
    pub backend: Backend,
    pub adapter: AdapterSelection,
    pub save_path: Option<PathBuf>,
    pub show_window: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        RenderConfig {
            requested_panels: 1,
            cell_width: 300,
            cell_height: 300,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            backend: Backend::Gpu,
            adapter: AdapterSelection::default(),
            save_path: None,
            show_window: true,
        }
    }
}

impl Cli {
    /// Build the run configuration. `None` when only adapters were requested.
    pub fn into_config(self) -> Option<RenderConfig> {
        let count = self.count?;
        let defaults = RenderConfig::default();
        Some(RenderConfig {
            requested_panels: count,
            cell_width: self.cell_width,
            cell_height: self.cell_height,
            max_iterations: self.max_iterations,
            backend: self.backend,
            adapter: AdapterSelection {
                index: self.adapter,
                ..defaults.adapter
            },
            save_path: self.save,
            show_window: !self.no_window,
        })
    }
}
