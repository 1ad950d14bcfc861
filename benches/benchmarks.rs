// benches/benchmarks.rs -- CPU renderer benchmarks.
//
//   cargo bench --bench benchmarks
//
// Measures the reference escape-time renderer, colouring and composition
// separately, then a whole 8-cell grid end to end.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

use fractal_grid::app::{render_cells, CellRenderer};
use fractal_grid::config::{Backend, RenderConfig};
use fractal_grid::fractal::{render_cpu, FractalParams};
use fractal_grid::grid::GridShape;
use fractal_grid::image::Image;
use fractal_grid::layout::Composite;
use fractal_grid::palette::Palette;

// ============================================================
// Per-stage benchmarks
// ============================================================

fn bench_escape_time(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_cpu");
    for &iters in &[64u32, 250, 1000] {
        let mandel = FractalParams::for_cell(0, 8, 300, 300, iters).unwrap();
        let julia = FractalParams::for_cell(3, 8, 300, 300, iters).unwrap();
        group.bench_with_input(BenchmarkId::new("mandelbrot_300x300", iters), &mandel, |b, p| {
            b.iter(|| render_cpu(p))
        });
        group.bench_with_input(BenchmarkId::new("julia_300x300", iters), &julia, |b, p| {
            b.iter(|| render_cpu(p))
        });
    }
    group.finish();
}

fn bench_colorize(c: &mut Criterion) {
    let palette = Palette::default();
    let params = FractalParams::for_cell(0, 1, 300, 300, 250).unwrap();
    let counts = render_cpu(&params);

    c.bench_function("colorize_300x300", |b| b.iter(|| palette.colorize(&counts, 250)));
}

fn bench_place(c: &mut Criterion) {
    let shape = GridShape::for_panels(16).unwrap();
    let cell = Image::filled(300, 300, 0x00FF_8000u32);

    c.bench_function("place_16x_300x300", |b| {
        b.iter(|| {
            let mut comp = Composite::new(shape, 300, 300);
            for i in 0..shape.len() {
                comp.place(i, &cell).unwrap();
            }
            comp
        })
    });
}

// ============================================================
// Full grid
// ============================================================

fn bench_grid(c: &mut Criterion) {
    let config = RenderConfig {
        requested_panels: 8,
        backend: Backend::Cpu,
        show_window: false,
        ..RenderConfig::default()
    };
    let renderer = CellRenderer::new(&config, Palette::default()).unwrap();
    let shape = GridShape::for_panels(config.requested_panels).unwrap();

    let mut group = c.benchmark_group("grid");
    group.sample_size(10);
    group.bench_function("cpu_8cells_300x300", |b| {
        b.iter(|| render_cells(&renderer, shape, &config).unwrap())
    });
    group.finish();
}

criterion_group!(benches, bench_escape_time, bench_colorize, bench_place, bench_grid);
criterion_main!(benches);
