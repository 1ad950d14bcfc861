// app.rs — One run, start to finish.
//
//   count ──round──▶ GridShape ──▶ open device (once)
//                                      │
//             ┌────────────────────────┘
//             ▼
//   for cell in 0..n:  FractalParams::for_cell ─▶ render ─▶ Composite::place
//             │
//             ▼
//   save PNG (optional) ─▶ window (until closed)
//
// Cells are rendered strictly one after another on the calling thread. The
// first error aborts the run; nothing is retried and no partial grid is
// shown.

use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info};

use crate::config::{Backend, RenderConfig};
use crate::fractal::{self, FractalError, FractalParams};
use crate::gpu::device::{GpuDevice, GpuError};
use crate::gpu::fractal::GpuFractalPipeline;
use crate::grid::{GridError, GridShape};
use crate::image::Image;
use crate::layout::{Composite, LayoutError};
use crate::palette::Palette;
use crate::window;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Fractal(#[from] FractalError),
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Gpu(#[from] GpuError),
    #[error("failed to save image: {0}")]
    Save(#[from] ::image::ImageError),
    #[error("window error: {0}")]
    Window(#[from] minifb::Error),
}

/// Renders cells with whichever backend the configuration asked for.
pub enum CellRenderer {
    Gpu {
        gpu: GpuDevice,
        pipeline: GpuFractalPipeline,
    },
    Cpu {
        palette: Palette,
    },
}

impl CellRenderer {
    /// Set up the backend. For the GPU this opens the device and compiles
    /// the kernel; neither happens again during the run.
    pub fn new(config: &RenderConfig, palette: Palette) -> Result<Self, AppError> {
        match config.backend {
            Backend::Gpu => {
                let gpu = GpuDevice::new(config.adapter)?;
                info!(adapter = %gpu.adapter_info, workgroup = %gpu.workgroup_size, "using GPU");
                let pipeline = GpuFractalPipeline::new(&gpu, &palette);
                Ok(CellRenderer::Gpu { gpu, pipeline })
            }
            Backend::Cpu => {
                info!(threads = rayon::current_num_threads(), "using CPU reference renderer");
                Ok(CellRenderer::Cpu { palette })
            }
        }
    }

    /// Coloured pixels for one cell.
    pub fn render(&self, params: &FractalParams) -> Result<Image<u32>, AppError> {
        match self {
            CellRenderer::Gpu { gpu, pipeline } => Ok(pipeline.render(gpu, params)?),
            CellRenderer::Cpu { palette } => {
                let counts = fractal::render_cpu(params);
                Ok(palette.colorize(&counts, params.max_iterations))
            }
        }
    }
}

/// Render every cell of the grid into a composite.
pub fn render_grid(config: &RenderConfig) -> Result<Composite, AppError> {
    let shape = GridShape::for_panels(config.requested_panels)?;
    let count = shape.len();
    info!(
        requested = config.requested_panels,
        panels = count,
        rows = shape.rows,
        cols = shape.cols,
        "grid"
    );

    let renderer = CellRenderer::new(config, Palette::default())?;
    render_cells(&renderer, shape, config)
}

/// Render all cells of `shape` with an already set-up renderer.
pub fn render_cells(
    renderer: &CellRenderer,
    shape: GridShape,
    config: &RenderConfig,
) -> Result<Composite, AppError> {
    let (w, h) = (config.cell_width, config.cell_height);
    let count = shape.len();
    let mut composite = Composite::new(shape, w as usize, h as usize);

    let t_total = Instant::now();
    for index in 0..count {
        let params = FractalParams::for_cell(index, count, w, h, config.max_iterations)?;
        let t0 = Instant::now();
        let cell = renderer.render(&params)?;
        debug!(
            cell = index,
            kind = %params.kind,
            ms = t0.elapsed().as_secs_f64() * 1000.0,
            "rendered"
        );
        composite.place(index, &cell)?;
    }
    info!(
        cells = count,
        ms = t_total.elapsed().as_secs_f64() * 1000.0,
        "all cells rendered"
    );
    Ok(composite)
}

/// Full run: render, optionally save, optionally show.
pub fn run(config: &RenderConfig) -> Result<(), AppError> {
    let composite = render_grid(config)?;

    if let Some(path) = &config.save_path {
        composite.to_rgb_image().save(path)?;
        info!(path = %path.display(), "saved composite");
    }

    if config.show_window {
        window::show(window::WINDOW_TITLE, &composite)?;
    }
    Ok(())
}
