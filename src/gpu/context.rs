// ============================================================================
// GPU CONTEXT — wgpu Device, Queue, and adapter initialization
// ============================================================================

use std::collections::HashMap;

use super::shaders::{WORKGROUP_X_OVERRIDE, WORKGROUP_Y_OVERRIDE};
use crate::error::PixelError;
use crate::log_warn;

/// Workgroup shape for the 2D pixelation dispatch, derived from the
/// adapter's limits at context construction.
///
/// Width is the preferred execution width (16, which aligns with NVIDIA's
/// 32-wide warps and AMD's 64-wide wavefronts), capped to
/// `max_compute_workgroup_size_x`. Height fills the rest of the invocation
/// budget: `max_compute_invocations_per_workgroup / width`, capped to
/// `max_compute_workgroup_size_y` and to the preferred width. On baseline
/// hardware (256 invocations) this yields 16×16.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkgroupSize {
    pub x: u32,
    pub y: u32,
}

impl WorkgroupSize {
    /// Preferred workgroup width for row-major image work.
    const PREFERRED_WIDTH: u32 = 16;

    pub fn from_limits(limits: &wgpu::Limits) -> Self {
        let x = Self::PREFERRED_WIDTH
            .min(limits.max_compute_workgroup_size_x)
            .max(1);
        let y = (limits.max_compute_invocations_per_workgroup / x)
            .min(limits.max_compute_workgroup_size_y)
            .min(Self::PREFERRED_WIDTH)
            .max(1);
        Self { x, y }
    }

    /// Total invocations per workgroup (x * y).
    pub fn total(&self) -> u32 {
        self.x * self.y
    }

    /// The constants map for `PipelineCompilationOptions`.
    ///
    /// The WGSL `override` constants WORKGROUP_X / WORKGROUP_Y are
    /// specialised here at pipeline creation; the shader source string
    /// stays identical across devices.
    pub fn as_constants(&self) -> HashMap<String, f64> {
        HashMap::from([
            (WORKGROUP_X_OVERRIDE.to_string(), self.x as f64),
            (WORKGROUP_Y_OVERRIDE.to_string(), self.y as f64),
        ])
    }
}

/// Holds the core wgpu resources reused across pixelation calls.
///
/// Created once and reused sequentially; command submission against the
/// single queue is stateful, so concurrent use requires external mutual
/// exclusion. Construction acquires device-level resources only — it
/// performs no I/O on image data.
pub struct GpuContext {
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub adapter_name: String,
    /// Maximum texture dimension supported by this device.
    pub max_texture_dim: u32,
    /// Workgroup shape derived from the adapter's compute limits.
    pub workgroup: WorkgroupSize,
}

impl GpuContext {
    /// Attempt to create a GPU context. Tries a hardware adapter first,
    /// then a software rasterizer (`force_fallback_adapter`) so the tool
    /// still works on machines without a real GPU.
    ///
    /// We use `pollster::block_on` because wgpu's adapter/device API is
    /// async (it maps to JS Promises on WebGPU); for native backends we
    /// just block.
    pub fn new() -> Result<Self, PixelError> {
        match pollster::block_on(Self::new_async(false)) {
            Ok(ctx) => return Ok(ctx),
            Err(e) => {
                log_warn!("hardware adapter unavailable ({e}), trying software fallback");
            }
        }
        pollster::block_on(Self::new_async(true))
    }

    async fn new_async(force_fallback: bool) -> Result<Self, PixelError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None, // headless — compute only
                force_fallback_adapter: force_fallback,
            })
            .await
            .ok_or_else(|| {
                PixelError::ResourceInit("no compute-capable GPU adapter found".into())
            })?;

        let adapter_name = adapter.get_info().name.clone();
        let limits = adapter.limits();

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("pixelfe device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits {
                        max_texture_dimension_2d: limits.max_texture_dimension_2d,
                        max_compute_workgroup_size_x: limits.max_compute_workgroup_size_x,
                        max_compute_workgroup_size_y: limits.max_compute_workgroup_size_y,
                        max_compute_workgroup_size_z: limits.max_compute_workgroup_size_z,
                        max_compute_invocations_per_workgroup: limits
                            .max_compute_invocations_per_workgroup,
                        max_compute_workgroups_per_dimension: limits
                            .max_compute_workgroups_per_dimension,
                        ..wgpu::Limits::downlevel_defaults()
                    },
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .map_err(|e| {
                PixelError::ResourceInit(format!(
                    "adapter '{adapter_name}' refused device request: {e}"
                ))
            })?;

        Ok(Self {
            device,
            queue,
            adapter_name,
            max_texture_dim: limits.max_texture_dimension_2d,
            workgroup: WorkgroupSize::from_limits(&limits),
        })
    }

    /// Check if a texture of the given dimensions can be created.
    pub fn supports_size(&self, width: u32, height: u32) -> bool {
        width <= self.max_texture_dim && height <= self.max_texture_dim
    }

    /// Submit a single encoder's commands.
    pub fn submit_one(&self, encoder: wgpu::CommandEncoder) {
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}
