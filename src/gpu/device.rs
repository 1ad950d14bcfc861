// gpu/device.rs — wgpu device/queue setup.
//
// Responsibilities:
//   - Enumerate adapters and select one (first hardware adapter by default,
//     or an explicit index from the command line).
//   - Own the `wgpu::Device` / `wgpu::Queue` pair for the whole run. It is
//     created once at startup and shared read-only by every cell render.
//   - Provide `WorkgroupSize` and the dispatch-size arithmetic used by the
//     fractal kernel.
//
// ADAPTER SELECTION:
// Adapters are enumerated explicitly instead of going through
// `request_adapter`, so that `--adapter N` refers to a stable position in the
// same list `--list-adapters` prints. Without an explicit index, the first
// adapter that is not a CPU/software renderer wins; if only software
// renderers exist they are used as a last resort (unless disallowed), since
// the kernel is correct on them, just slow.
//
// BACKENDS:
// `WGPU_BACKEND` (e.g. `vulkan`, `metal`, `dx12`) narrows the backends that
// are enumerated; the default is wgpu's primary set.
//
// ERRORS:
// Setup failures come back as `GpuError`. Validation errors raised by wgpu
// after setup (bad bindings, bad dispatch) are not caught here: wgpu's
// default uncaptured-error handler panics, which aborts the run.

use std::fmt;

use thiserror::Error;
use tracing::{debug, info, warn};

/// A workgroup size for 2D compute dispatches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkgroupSize {
    pub x: u32,
    pub y: u32,
}

impl WorkgroupSize {
    /// Total invocations per workgroup (x * y).
    pub fn total(&self) -> u32 {
        self.x * self.y
    }
}

impl Default for WorkgroupSize {
    /// 16×8 = 128 invocations: 4 NVIDIA warps or 2 AMD wavefronts, and well
    /// under the 256-invocation minimum every wgpu device supports.
    fn default() -> Self {
        WorkgroupSize { x: 16, y: 8 }
    }
}

impl fmt::Display for WorkgroupSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}×{} ({} invocations)", self.x, self.y, self.total())
    }
}

/// Number of workgroups needed to cover a `width × height` image.
///
/// Ceiling division, so the last row/column of workgroups may hang over the
/// image edge. The shader must guard:
/// ```wgsl
/// if gid.x >= params.width || gid.y >= params.height { return; }
/// ```
pub fn dispatch_size(workgroup: WorkgroupSize, width: u32, height: u32) -> (u32, u32) {
    (width.div_ceil(workgroup.x), height.div_ceil(workgroup.y))
}

/// Which adapter to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdapterSelection {
    pub backends: wgpu::Backends,
    /// Position in the enumeration order; `None` picks automatically.
    pub index: Option<usize>,
    /// Allow falling back to a CPU/software adapter when no hardware
    /// adapter is present.
    pub allow_software: bool,
}

impl Default for AdapterSelection {
    fn default() -> Self {
        AdapterSelection {
            backends: wgpu::util::backend_bits_from_env().unwrap_or(wgpu::Backends::PRIMARY),
            index: None,
            allow_software: true,
        }
    }
}

/// Cached adapter information for logging and `--list-adapters`.
#[derive(Debug, Clone)]
pub struct AdapterInfo {
    pub name: String,
    pub vendor: u32,
    pub device: u32,
    pub device_type: wgpu::DeviceType,
    pub backend: wgpu::Backend,
}

impl AdapterInfo {
    pub fn is_software(&self) -> bool {
        self.device_type == wgpu::DeviceType::Cpu
    }
}

impl From<wgpu::AdapterInfo> for AdapterInfo {
    fn from(raw: wgpu::AdapterInfo) -> Self {
        AdapterInfo {
            name: raw.name,
            vendor: raw.vendor,
            device: raw.device,
            device_type: raw.device_type,
            backend: raw.backend,
        }
    }
}

impl fmt::Display for AdapterInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:?}, {:?})", self.name, self.backend, self.device_type)
    }
}

/// The compute context: device, queue and the limits they were created with.
///
/// Create once via [`GpuDevice::new`] and pass `&GpuDevice` to every render.
///
/// # Field drop order
/// Struct fields drop top to bottom. `_instance` is declared last so the
/// `wgpu::Instance` outlives `device` and `queue`, and every submission made
/// through the queue is retired before the instance goes away.
pub struct GpuDevice {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter_info: AdapterInfo,
    pub limits: wgpu::Limits,
    pub workgroup_size: WorkgroupSize,
    _instance: wgpu::Instance,
}

impl GpuDevice {
    /// Open the selected adapter and request a device + queue.
    ///
    /// Blocks on wgpu's async device request with `pollster`.
    pub fn new(selection: AdapterSelection) -> Result<Self, GpuError> {
        pollster::block_on(Self::init_async(selection))
    }

    /// List the adapters visible for `backends`, in selection order.
    pub fn enumerate(backends: wgpu::Backends) -> Vec<AdapterInfo> {
        let instance = create_instance(backends);
        instance
            .enumerate_adapters(backends)
            .into_iter()
            .map(|a| AdapterInfo::from(a.get_info()))
            .collect()
    }

    async fn init_async(selection: AdapterSelection) -> Result<Self, GpuError> {
        let instance = create_instance(selection.backends);

        let adapters = instance.enumerate_adapters(selection.backends);
        if adapters.is_empty() {
            return Err(GpuError::NoSuitableAdapter);
        }
        for (i, a) in adapters.iter().enumerate() {
            debug!(index = i, adapter = %AdapterInfo::from(a.get_info()), "found adapter");
        }

        let infos: Vec<AdapterInfo> =
            adapters.iter().map(|a| AdapterInfo::from(a.get_info())).collect();
        let index = pick_adapter(&infos, selection)?;
        let adapter_info = infos[index].clone();
        let adapter = adapters
            .into_iter()
            .nth(index)
            .ok_or(GpuError::NoSuitableAdapter)?;

        if adapter_info.is_software() {
            warn!(adapter = %adapter_info, "no hardware adapter; using a software renderer");
        }

        let (device, queue): (wgpu::Device, wgpu::Queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("fractal-grid"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                    memory_hints: wgpu::MemoryHints::Performance,
                },
                None,
            )
            .await?;

        let limits = device.limits();
        info!(adapter = %adapter_info, "GPU device ready");

        Ok(GpuDevice {
            device,
            queue,
            adapter_info,
            limits,
            workgroup_size: WorkgroupSize::default(),
            _instance: instance,
        })
    }

    /// Override the default workgroup size, validating against device limits.
    pub fn set_workgroup_size(&mut self, x: u32, y: u32) -> Result<(), GpuError> {
        let ws = WorkgroupSize { x, y };
        check_workgroup_size(ws, &self.limits)?;
        self.workgroup_size = ws;
        Ok(())
    }

    /// Workgroups needed to cover an image with the active workgroup size,
    /// checked against the device's per-dimension dispatch limit.
    pub fn dispatch_size(&self, width: u32, height: u32) -> Result<(u32, u32), GpuError> {
        check_dispatch(self.workgroup_size, width, height, &self.limits)
    }
}

impl fmt::Display for GpuDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GpuDevice {{ adapter: {}, workgroup: {} }}",
            self.adapter_info, self.workgroup_size
        )
    }
}

fn create_instance(backends: wgpu::Backends) -> wgpu::Instance {
    let flags = if cfg!(debug_assertions) {
        // Validation layer in debug builds for shader error feedback.
        wgpu::InstanceFlags::VALIDATION
    } else {
        wgpu::InstanceFlags::empty()
    };
    wgpu::Instance::new(wgpu::InstanceDescriptor {
        backends,
        flags,
        ..Default::default()
    })
}

/// Choose an adapter from the enumeration.
///
/// Explicit index: taken as-is (software or not). Otherwise the first
/// non-CPU adapter, then, if allowed, the first adapter of any kind.
fn pick_adapter(infos: &[AdapterInfo], selection: AdapterSelection) -> Result<usize, GpuError> {
    if let Some(index) = selection.index {
        return if index < infos.len() {
            Ok(index)
        } else {
            Err(GpuError::AdapterIndexOutOfRange { index, available: infos.len() })
        };
    }
    infos
        .iter()
        .position(|info| !info.is_software())
        .or_else(|| (selection.allow_software && !infos.is_empty()).then_some(0))
        .ok_or(GpuError::NoSuitableAdapter)
}

pub(crate) fn check_dispatch(
    workgroup: WorkgroupSize,
    width: u32,
    height: u32,
    limits: &wgpu::Limits,
) -> Result<(u32, u32), GpuError> {
    let (groups_x, groups_y) = dispatch_size(workgroup, width, height);
    let max = limits.max_compute_workgroups_per_dimension;
    if groups_x > max || groups_y > max {
        return Err(GpuError::TooManyWorkgroups { width, height, groups_x, groups_y, max });
    }
    Ok((groups_x, groups_y))
}

fn check_workgroup_size(ws: WorkgroupSize, limits: &wgpu::Limits) -> Result<(), GpuError> {
    let max = limits.max_compute_invocations_per_workgroup;
    if ws.x == 0
        || ws.y == 0
        || ws.x > limits.max_compute_workgroup_size_x
        || ws.y > limits.max_compute_workgroup_size_y
        || ws.total() > max
    {
        return Err(GpuError::WorkgroupTooLarge { x: ws.x, y: ws.y, max });
    }
    Ok(())
}

// ============================================================
// Error type
// ============================================================

/// Errors from GPU setup and kernel execution.
#[derive(Debug, Error)]
pub enum GpuError {
    #[error("no suitable GPU adapter found")]
    NoSuitableAdapter,
    #[error("adapter index {index} out of range ({available} adapters available)")]
    AdapterIndexOutOfRange { index: usize, available: usize },
    #[error("device request failed: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),
    #[error("workgroup size {x}×{y} is invalid for this device (max {max} invocations)")]
    WorkgroupTooLarge { x: u32, y: u32, max: u32 },
    #[error("{width}×{height} output needs {bytes} bytes, over the device's storage buffer limit of {limit}")]
    ImageTooLarge { width: u32, height: u32, bytes: u64, limit: u64 },
    #[error("{width}×{height} output needs {groups_x}×{groups_y} workgroups, over the device's per-dimension limit of {max}")]
    TooManyWorkgroups { width: u32, height: u32, groups_x: u32, groups_y: u32, max: u32 },
    #[error("buffer map failed: {0}")]
    BufferMap(#[from] wgpu::BufferAsyncError),
    #[error("buffer map callback was dropped before it fired")]
    MapCallbackDropped,
}

// ============================================================
// Tests
// ============================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn info(name: &str, device_type: wgpu::DeviceType) -> AdapterInfo {
        AdapterInfo {
            name: name.to_string(),
            vendor: 0,
            device: 0,
            device_type,
            backend: wgpu::Backend::Vulkan,
        }
    }

    fn auto() -> AdapterSelection {
        AdapterSelection { backends: wgpu::Backends::all(), index: None, allow_software: true }
    }

    #[test]
    fn test_workgroup_default() {
        let ws = WorkgroupSize::default();
        assert_eq!((ws.x, ws.y), (16, 8));
        assert_eq!(ws.total(), 128);
    }

    #[test]
    fn test_dispatch_size_exact() {
        let (dx, dy) = dispatch_size(WorkgroupSize::default(), 640, 480);
        assert_eq!((dx, dy), (40, 60));
    }

    #[test]
    fn test_dispatch_size_ceiling() {
        // 300 / 16 = 18.75 → 19, 300 / 8 = 37.5 → 38.
        let (dx, dy) = dispatch_size(WorkgroupSize::default(), 300, 300);
        assert_eq!((dx, dy), (19, 38));
        let (dx, dy) = dispatch_size(WorkgroupSize { x: 8, y: 8 }, 1, 1);
        assert_eq!((dx, dy), (1, 1));
    }

    #[test]
    fn test_pick_prefers_hardware() {
        let infos = [
            info("llvmpipe", wgpu::DeviceType::Cpu),
            info("gpu", wgpu::DeviceType::DiscreteGpu),
        ];
        assert_eq!(pick_adapter(&infos, auto()).unwrap(), 1);
    }

    #[test]
    fn test_pick_falls_back_to_software() {
        let infos = [info("llvmpipe", wgpu::DeviceType::Cpu)];
        assert_eq!(pick_adapter(&infos, auto()).unwrap(), 0);

        let strict = AdapterSelection { allow_software: false, ..auto() };
        assert!(matches!(pick_adapter(&infos, strict), Err(GpuError::NoSuitableAdapter)));
    }

    #[test]
    fn test_pick_explicit_index() {
        let infos = [
            info("gpu0", wgpu::DeviceType::IntegratedGpu),
            info("llvmpipe", wgpu::DeviceType::Cpu),
        ];
        let sel = AdapterSelection { index: Some(1), ..auto() };
        assert_eq!(pick_adapter(&infos, sel).unwrap(), 1);

        let sel = AdapterSelection { index: Some(2), ..auto() };
        assert!(matches!(
            pick_adapter(&infos, sel),
            Err(GpuError::AdapterIndexOutOfRange { index: 2, available: 2 })
        ));
    }

    #[test]
    fn test_check_dispatch_limit() {
        // Default limit is 65535 workgroups per dimension; 16 × 65535 = 1_048_560.
        let limits = wgpu::Limits::default();
        let ws = WorkgroupSize::default();
        assert_eq!(check_dispatch(ws, 300, 300, &limits).unwrap(), (19, 38));
        assert_eq!(check_dispatch(ws, 1_048_560, 1, &limits).unwrap(), (65_535, 1));
        assert!(matches!(
            check_dispatch(ws, 1_100_000, 1, &limits),
            Err(GpuError::TooManyWorkgroups { groups_x: 68_750, groups_y: 1, max: 65_535, .. })
        ));
        assert!(matches!(
            check_dispatch(ws, 1, 8 * 65_536, &limits),
            Err(GpuError::TooManyWorkgroups { groups_y: 65_536, .. })
        ));
    }

    #[test]
    fn test_check_workgroup_size() {
        let limits = wgpu::Limits::default();
        assert!(check_workgroup_size(WorkgroupSize { x: 16, y: 16 }, &limits).is_ok());
        assert!(matches!(
            check_workgroup_size(WorkgroupSize { x: 16, y: 17 }, &limits),
            Err(GpuError::WorkgroupTooLarge { x: 16, y: 17, max: 256 })
        ));
        assert!(check_workgroup_size(WorkgroupSize { x: 0, y: 8 }, &limits).is_err());
    }

    // ---- GPU integration tests ------------------------------------------
    //
    // Need a real adapter. Run with:
    //   cargo test -- --include-ignored

    #[test]
    #[ignore = "requires a GPU adapter"]
    fn test_gpu_device_init() {
        let gpu = GpuDevice::new(AdapterSelection::default()).expect("should open a GPU device");
        println!("{gpu}");
        assert_eq!(gpu.workgroup_size, WorkgroupSize::default());
    }

    #[test]
    #[ignore = "requires a GPU adapter"]
    fn test_gpu_set_workgroup_size() {
        let mut gpu = GpuDevice::new(AdapterSelection::default()).unwrap();
        gpu.set_workgroup_size(8, 8).expect("64 invocations is always valid");
        assert_eq!(gpu.workgroup_size.total(), 64);
        assert!(gpu.set_workgroup_size(1024, 1024).is_err());
    }
}
