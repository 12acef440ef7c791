// ============================================================================
// PIXELATION PIPELINE — compute pipeline build + per-call dispatch
// ============================================================================

use bytemuck::{Pod, Zeroable};
use image::RgbaImage;
use wgpu::util::DeviceExt;

use super::context::GpuContext;
use super::shaders;
use super::texture::{create_output, read_texture, upload_rgba};
use crate::error::PixelError;

/// Smallest accepted pixelation block size.
pub const MIN_BLOCK_SIZE: u32 = 1;
/// Largest accepted pixelation block size.
pub const MAX_BLOCK_SIZE: u32 = 128;

/// Kernel configuration injected into [`Pixelator::new`].
///
/// The WGSL source and entry point are explicit constructor inputs rather
/// than paths resolved from the working directory, so there is no hidden
/// environment coupling. [`KernelSource::builtin`] supplies the crate's
/// inline pixelation kernel.
#[derive(Debug, Clone, Copy)]
pub struct KernelSource<'a> {
    pub wgsl: &'a str,
    pub entry_point: &'a str,
}

impl KernelSource<'static> {
    /// The built-in block-averaging kernel from [`shaders`].
    pub fn builtin() -> Self {
        Self {
            wgsl: shaders::PIXELATE_SHADER,
            entry_point: shaders::PIXELATE_ENTRY_POINT,
        }
    }
}

/// Uniform block bound at binding 2. Matches `PixelateParams` in the WGSL.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct PixelateParams {
    block_size: u32,
    width: u32,
    height: u32,
    _unused: u32,
}

/// Reject block sizes outside `[MIN_BLOCK_SIZE, MAX_BLOCK_SIZE]`.
///
/// The core never clamps: out-of-range values are a caller error, surfaced
/// before any GPU work. (The CLI front end clamps oversized values as a
/// convenience; see `cli::effective_pixel_size`.)
pub fn validate_block_size(block_size: u32) -> Result<(), PixelError> {
    if block_size < MIN_BLOCK_SIZE || block_size > MAX_BLOCK_SIZE {
        return Err(PixelError::Validation(format!(
            "pixel block size must be between {MIN_BLOCK_SIZE} and {MAX_BLOCK_SIZE}, got {block_size}"
        )));
    }
    Ok(())
}

/// GPU-accelerated block pixelator.
///
/// Owns a [`GpuContext`] and the compiled compute pipeline; build it once
/// and call [`pixelate`](Self::pixelate) for each image. Calls are
/// synchronous — each one submits a single command buffer and blocks until
/// the GPU signals completion, so there is never more than one outstanding
/// dispatch per context.
pub struct Pixelator {
    ctx: GpuContext,
    pipeline: wgpu::ComputePipeline,
    bind_group_layout: wgpu::BindGroupLayout,
}

impl Pixelator {
    /// Compile `kernel` against the device and build the compute pipeline.
    ///
    /// Shader and pipeline creation run inside a validation error scope, so
    /// a malformed kernel or a missing entry point surfaces as
    /// [`PixelError::ResourceInit`] here instead of exploding on first use.
    pub fn new(ctx: GpuContext, kernel: KernelSource<'_>) -> Result<Self, PixelError> {
        let device = &ctx.device;

        device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("pixelate_shader"),
            source: wgpu::ShaderSource::Wgsl(kernel.wgsl.into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("pixelate_bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::StorageTexture {
                        access: wgpu::StorageTextureAccess::WriteOnly,
                        format: wgpu::TextureFormat::Rgba8Unorm,
                        view_dimension: wgpu::TextureViewDimension::D2,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::COMPUTE,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("pixelate_pipeline_layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        // Specialise the kernel's workgroup shape to this device's limits.
        let constants = ctx.workgroup.as_constants();
        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some("pixelate_pipeline"),
            layout: Some(&pipeline_layout),
            module: &shader,
            entry_point: Some(kernel.entry_point),
            compilation_options: wgpu::PipelineCompilationOptions {
                constants: &constants,
                ..Default::default()
            },
            cache: None,
        });

        if let Some(e) = pollster::block_on(device.pop_error_scope()) {
            return Err(PixelError::ResourceInit(format!(
                "kernel '{}' failed to compile: {e}",
                kernel.entry_point
            )));
        }

        Ok(Self {
            ctx,
            pipeline,
            bind_group_layout,
        })
    }

    /// The underlying GPU context (adapter name, device limits).
    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    /// Run one pixelation pass and return a new image of identical
    /// dimensions.
    ///
    /// Validates parameters before touching the GPU, uploads the input,
    /// allocates a fresh output texture, dispatches one thread per output
    /// texel, blocks until completion, and reads the result back.
    pub fn pixelate(&self, image: &RgbaImage, block_size: u32) -> Result<RgbaImage, PixelError> {
        validate_block_size(block_size)?;

        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(PixelError::Validation(format!(
                "image dimensions must be non-zero, got {width}x{height}"
            )));
        }
        if !self.ctx.supports_size(width, height) {
            return Err(PixelError::Validation(format!(
                "image {width}x{height} exceeds the device texture limit of {}",
                self.ctx.max_texture_dim
            )));
        }

        let device = &self.ctx.device;

        // Catch allocation failures from the textures and uniform buffer;
        // on failure everything created so far is dropped unsubmitted.
        device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);

        let src_tex = upload_rgba(&self.ctx, image, "pixelate_src");
        let dst_tex = create_output(&self.ctx, width, height, "pixelate_dst");

        let params = PixelateParams {
            block_size,
            width,
            height,
            _unused: 0,
        };
        let params_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("pixelate_params"),
            contents: bytemuck::bytes_of(&params),
            usage: wgpu::BufferUsages::UNIFORM,
        });

        if let Some(e) = pollster::block_on(device.pop_error_scope()) {
            return Err(PixelError::Encoding(format!(
                "GPU resource allocation failed: {e}"
            )));
        }

        let src_view = src_tex.create_view(&wgpu::TextureViewDescriptor::default());
        let dst_view = dst_tex.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("pixelate_bg"),
            layout: &self.bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&src_view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&dst_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: params_buf.as_entire_binding(),
                },
            ],
        });

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("pixelate_encoder"),
        });
        {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some("pixelate_pass"),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, &bind_group, &[]);
            // One thread per output texel; the kernel bounds-checks the
            // rounded-up edge workgroups.
            let wg = self.ctx.workgroup;
            pass.dispatch_workgroups(width.div_ceil(wg.x), height.div_ceil(wg.y), 1);
        }
        self.ctx.submit_one(encoder);

        // read_texture waits for the queue, so this also serves as the
        // wait-for-completion barrier for the compute pass above.
        read_texture(&self.ctx, &dst_tex, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_size_zero_is_rejected() {
        let err = validate_block_size(0).unwrap_err();
        assert!(matches!(err, PixelError::Validation(_)));
    }

    #[test]
    fn block_size_above_max_is_rejected_not_clamped() {
        assert!(matches!(
            validate_block_size(129),
            Err(PixelError::Validation(_))
        ));
        assert!(matches!(
            validate_block_size(u32::MAX),
            Err(PixelError::Validation(_))
        ));
    }

    #[test]
    fn block_size_bounds_are_inclusive() {
        assert!(validate_block_size(MIN_BLOCK_SIZE).is_ok());
        assert!(validate_block_size(8).is_ok());
        assert!(validate_block_size(MAX_BLOCK_SIZE).is_ok());
    }

    #[test]
    fn params_block_is_16_bytes() {
        // The WGSL uniform struct is four u32s; the Rust side must match.
        assert_eq!(std::mem::size_of::<PixelateParams>(), 16);
    }

    #[test]
    fn builtin_kernel_names_the_wgsl_entry_point() {
        let kernel = KernelSource::builtin();
        assert!(kernel.wgsl.contains(&format!("fn {}", kernel.entry_point)));
    }
}
