// fractal-grid binary: parse arguments, render the grid, show it.
//
// Usage:
//   fractal-grid 8                          # 8 panels in a 2×4 grid
//   fractal-grid 5 --cell-width 200         # rounded up to 8 panels
//   fractal-grid 16 --backend cpu --no-window --save grid.png
//   fractal-grid --list-adapters
//
// Log level comes from RUST_LOG (default: info).

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use fractal_grid::app;
use fractal_grid::config::Cli;
use fractal_grid::gpu::device::{AdapterSelection, GpuDevice};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    if cli.list_adapters {
        let backends = AdapterSelection::default().backends;
        let adapters = GpuDevice::enumerate(backends);
        if adapters.is_empty() {
            println!("no adapters found for {backends:?}");
        }
        for (i, info) in adapters.iter().enumerate() {
            println!("[{i}] {info}");
        }
        return Ok(());
    }

    let config = cli
        .into_config()
        .context("a panel count is required")?;

    app::run(&config).with_context(|| {
        format!(
            "failed to render {} panel(s) of {}×{}",
            config.requested_panels, config.cell_width, config.cell_height
        )
    })
}
