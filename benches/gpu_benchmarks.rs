// benches/gpu_benchmarks.rs — GPU kernel vs CPU reference.
//
//   cargo bench --bench gpu_benchmarks
//
// Each group runs the CPU and GPU versions of the same work side by side.
//
// CRITERION + GPU CAVEATS
// ────────────────────────
// Criterion measures wall time, so the GPU numbers include buffer creation,
// submit, poll and readback, not just shader time. That is what a cell costs
// in the real program. Warmup is raised because some drivers compile the
// pipeline lazily on first dispatch.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;

use fractal_grid::app::{render_cells, CellRenderer};
use fractal_grid::config::{Backend, RenderConfig};
use fractal_grid::fractal::{render_cpu, FractalParams};
use fractal_grid::gpu::device::{AdapterSelection, GpuDevice};
use fractal_grid::gpu::fractal::GpuFractalPipeline;
use fractal_grid::grid::GridShape;
use fractal_grid::palette::Palette;

// ============================================================
// Single cell: CPU vs GPU
// ============================================================

fn bench_cell(c: &mut Criterion) {
    let gpu = GpuDevice::new(AdapterSelection::default()).expect("no GPU adapter");
    let palette = Palette::default();
    let pipeline = GpuFractalPipeline::new(&gpu, &palette);

    let mut group = c.benchmark_group("cell");
    group.warm_up_time(Duration::from_secs(2));

    for &size in &[300u32, 1024] {
        let params = FractalParams::for_cell(0, 1, size, size, 250).unwrap();
        group.bench_with_input(BenchmarkId::new("cpu_mandelbrot", size), &params, |b, p| {
            b.iter(|| palette.colorize(&render_cpu(p), p.max_iterations))
        });
        group.bench_with_input(BenchmarkId::new("gpu_mandelbrot", size), &params, |b, p| {
            b.iter(|| pipeline.render(&gpu, p).unwrap())
        });
    }
    group.finish();
}

// ============================================================
// Workgroup shapes
// ============================================================

fn bench_workgroup(c: &mut Criterion) {
    let mut gpu = GpuDevice::new(AdapterSelection::default()).expect("no GPU adapter");
    let palette = Palette::default();
    let params = FractalParams::for_cell(1, 2, 1024, 1024, 250).unwrap();

    let mut group = c.benchmark_group("workgroup");
    group.warm_up_time(Duration::from_secs(2));

    for &(x, y) in &[(8u32, 8u32), (16, 8), (16, 16), (32, 8)] {
        if gpu.set_workgroup_size(x, y).is_err() {
            continue;
        }
        let pipeline = GpuFractalPipeline::new(&gpu, &palette);
        group.bench_function(format!("julia_1024_{x}x{y}"), |b| {
            b.iter(|| pipeline.render(&gpu, &params).unwrap())
        });
    }
    group.finish();
}

// ============================================================
// Whole grid
// ============================================================

fn bench_grid(c: &mut Criterion) {
    let base = RenderConfig {
        requested_panels: 16,
        show_window: false,
        ..RenderConfig::default()
    };
    let shape = GridShape::for_panels(base.requested_panels).unwrap();

    let mut group = c.benchmark_group("grid");
    group.warm_up_time(Duration::from_secs(3));
    group.sample_size(10);

    for backend in [Backend::Cpu, Backend::Gpu] {
        let config = RenderConfig { backend, ..base.clone() };
        let renderer = CellRenderer::new(&config, Palette::default()).expect("renderer init");
        group.bench_function(format!("{backend:?}_16cells_300x300").to_lowercase(), |b| {
            b.iter(|| render_cells(&renderer, shape, &config).unwrap())
        });
    }
    group.finish();
}

// ============================================================
// Register
// ============================================================

criterion_group!(benches, bench_cell, bench_workgroup, bench_grid);
criterion_main!(benches);
