// gpu/fractal.rs — GPU escape-time renderer.
//
// Mirrors `fractal::render_cpu`: one invocation per pixel, the same f32
// update order, the same palette rules. The CPU path stays the reference;
// the tests below compare the two pixel by pixel.
//
// BUFFERS
// ───────
//   binding 0  uniform   FractalUniforms  (per render, 48 bytes)
//   binding 1  storage   palette          (uploaded once, read-only)
//   binding 2  storage   output           (width × height u32, read_write)
//
// The output is a flat storage buffer rather than a texture: rows are packed
// with no 256-byte row alignment, so readback is a single
// copy_buffer_to_buffer and the mapped bytes cast straight to `&[u32]`.
//
// PIPELINE LIFETIME
// ─────────────────
// `GpuFractalPipeline::new` compiles the shader. Build it once after the
// device and reuse it for every cell; each `render` only allocates the
// per-cell uniform/output/staging buffers.

use wgpu::util::DeviceExt;

use crate::fractal::{FractalKind, FractalParams};
use crate::gpu::device::{check_dispatch, GpuDevice, GpuError, WorkgroupSize};
use crate::image::Image;
use crate::palette::Palette;

// ---------------------------------------------------------------------------
// Uniform params (must match WGSL struct Params exactly)
// ---------------------------------------------------------------------------

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
struct FractalUniforms {
    x_min: f32,
    x_max: f32,
    y_min: f32,
    y_max: f32,
    c_re: f32,
    c_im: f32,
    width: u32,
    height: u32,
    max_iterations: u32,
    julia: u32,
    palette_len: u32,
    colorize: u32,
}

impl FractalUniforms {
    fn new(params: &FractalParams, palette_len: u32, colorize: bool) -> Self {
        let (julia, c_re, c_im) = match params.kind {
            FractalKind::Mandelbrot => (0, 0.0, 0.0),
            FractalKind::Julia { c } => (1, c.re, c.im),
        };
        FractalUniforms {
            x_min: params.viewport.x_min,
            x_max: params.viewport.x_max,
            y_min: params.viewport.y_min,
            y_max: params.viewport.y_max,
            c_re,
            c_im,
            width: params.width,
            height: params.height,
            max_iterations: params.max_iterations,
            julia,
            palette_len,
            colorize: colorize as u32,
        }
    }
}

// ---------------------------------------------------------------------------
// GpuFractalPipeline
// ---------------------------------------------------------------------------

/// Compiled escape-time kernel plus the uploaded palette.
pub struct GpuFractalPipeline {
    pipeline: wgpu::ComputePipeline,
    bgl: wgpu::BindGroupLayout,
    palette_buf: wgpu::Buffer,
    palette_len: u32,
    workgroup_size: WorkgroupSize,
}

impl GpuFractalPipeline {
    pub fn new(gpu: &GpuDevice, palette: &Palette) -> Self {
        let workgroup_size = gpu.workgroup_size;
        let shader_src = include_str!("../shaders/fractal.wgsl")
            .replace("{{WG_X}}", &workgroup_size.x.to_string())
            .replace("{{WG_Y}}", &workgroup_size.y.to_string());

        let shader = gpu.device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("fractal.wgsl"),
            source: wgpu::ShaderSource::Wgsl(shader_src.into()),
        });

        let bgl = gpu.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("GpuFractal BGL"),
            entries: &[
                // 0 — params uniform
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // 1 — palette (storage, read-only)
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: true },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // 2 — output pixels (storage, read_write)
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Storage { read_only: false },
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = gpu.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("GpuFractal pipeline layout"),
            bind_group_layouts: &[&bgl],
            push_constant_ranges: &[],
        });

        let pipeline = gpu.device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("render"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: "render",
            compilation_options: wgpu::PipelineCompilationOptions::default(),
            cache: None,
        });

        let palette_buf = gpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("GpuFractal palette"),
            contents: bytemuck::cast_slice(palette.as_slice()),
            usage: wgpu::BufferUsages::STORAGE,
        });

        GpuFractalPipeline {
            pipeline,
            bgl,
            palette_buf,
            palette_len: palette.len() as u32,
            workgroup_size,
        }
    }

    /// Render one cell as packed 0x00RRGGBB colours.
    pub fn render(&self, gpu: &GpuDevice, params: &FractalParams) -> Result<Image<u32>, GpuError> {
        self.dispatch(gpu, params, true)
    }

    /// Render one cell as raw iteration counts (for comparison with
    /// `fractal::render_cpu`).
    pub fn render_iterations(
        &self,
        gpu: &GpuDevice,
        params: &FractalParams,
    ) -> Result<Image<u32>, GpuError> {
        self.dispatch(gpu, params, false)
    }

    fn dispatch(
        &self,
        gpu: &GpuDevice,
        params: &FractalParams,
        colorize: bool,
    ) -> Result<Image<u32>, GpuError> {
        let (w, h) = (params.width, params.height);
        let out_size = output_size_bytes(w, h);
        let limit = (gpu.limits.max_storage_buffer_binding_size as u64).min(gpu.limits.max_buffer_size);
        if out_size > limit {
            return Err(GpuError::ImageTooLarge { width: w, height: h, bytes: out_size, limit });
        }
        let (wg_x, wg_y) = check_dispatch(self.workgroup_size, w, h, &gpu.limits)?;

        let uniforms = FractalUniforms::new(params, self.palette_len, colorize);
        let params_buf = gpu.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("GpuFractal params"),
            contents: bytemuck::bytes_of(&uniforms),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        let out_buf = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("GpuFractal output"),
            size: out_size,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });

        let bind_group = gpu.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("GpuFractal BG"),
            layout: &self.bgl,
            entries: &[
                wgpu::BindGroupEntry { binding: 0, resource: params_buf.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 1, resource: self.palette_buf.as_entire_binding() },
                wgpu::BindGroupEntry { binding: 2, resource: out_buf.as_entire_binding() },
            ],
        });

        let mut encoder = gpu.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("GpuFractal dispatch"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("render"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            pass.dispatch_workgroups(wg_x, wg_y, 1);
        }

        let staging = gpu.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("GpuFractal readback"),
            size: out_size,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        encoder.copy_buffer_to_buffer(&out_buf, 0, &staging, 0, out_size);
        gpu.queue.submit(std::iter::once(encoder.finish()));

        // Map and block until the copy has landed.
        let slice = staging.slice(..);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |r| {
            // The receiver only goes away if this function already returned.
            let _ = tx.send(r);
        });
        gpu.device.poll(wgpu::Maintain::Wait);
        rx.recv().map_err(|_| GpuError::MapCallbackDropped)??;

        let pixels: Vec<u32> = {
            let mapped = slice.get_mapped_range();
            bytemuck::cast_slice(&mapped).to_vec()
        };
        staging.unmap();

        Ok(Image::from_vec(w as usize, h as usize, pixels))
    }
}

/// Bytes needed for a `width × height` u32 output buffer.
#[inline]
pub(crate) fn output_size_bytes(width: u32, height: u32) -> u64 {
    width as u64 * height as u64 * std::mem::size_of::<u32>() as u64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
