// ============================================================================
// TEXTURES — ingestion (CPU → GPU upload) and result extraction (readback)
// ============================================================================
//
// Both directions use `Rgba8Unorm`, never the sRGB variant: upload and
// readback move raw channel values with no colour-space reinterpretation.
// Input and output textures are allocated fresh per pixelation call and
// dropped when the call returns; there is no pooling.

use image::RgbaImage;

use super::context::GpuContext;
use crate::error::PixelError;

/// Upload a decoded RGBA8 image as a read-only 2D texture.
pub fn upload_rgba(ctx: &GpuContext, image: &RgbaImage, label: &str) -> wgpu::Texture {
    let (w, h) = image.dimensions();
    let tex = ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: w,
            height: h,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
        view_formats: &[],
    });
    ctx.queue.write_texture(
        wgpu::ImageCopyTexture {
            texture: &tex,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        image.as_raw(),
        wgpu::ImageDataLayout {
            offset: 0,
            bytes_per_row: Some(4 * w),
            rows_per_image: Some(h),
        },
        wgpu::Extent3d {
            width: w,
            height: h,
            depth_or_array_layers: 1,
        },
    );
    tex
}

/// Allocate a writable output texture. Dimensions always match the input.
pub fn create_output(ctx: &GpuContext, w: u32, h: u32, label: &str) -> wgpu::Texture {
    ctx.device.create_texture(&wgpu::TextureDescriptor {
        label: Some(label),
        size: wgpu::Extent3d {
            width: w,
            height: h,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: wgpu::TextureFormat::Rgba8Unorm,
        usage: wgpu::TextureUsages::TEXTURE_BINDING
            | wgpu::TextureUsages::STORAGE_BINDING
            | wgpu::TextureUsages::COPY_SRC,
        view_formats: &[],
    })
}

/// Read a texture back into a portable `RgbaImage`.
///
/// Copies the texture into a MAP_READ staging buffer (row pitch padded to
/// wgpu's 256-byte alignment), blocks until the GPU finishes, then strips
/// the padding. Any map or reconstruction failure surfaces as
/// [`PixelError::Conversion`].
pub fn read_texture(
    ctx: &GpuContext,
    texture: &wgpu::Texture,
    width: u32,
    height: u32,
) -> Result<RgbaImage, PixelError> {
    let bytes_per_row = aligned_bytes_per_row(width);
    let buffer_size = staging_buffer_size(width, height);

    let staging = ctx.device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("readback_staging"),
        size: buffer_size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = ctx
        .device
        .create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("readback_encoder"),
        });

    encoder.copy_texture_to_buffer(
        wgpu::ImageCopyTexture {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::ImageCopyBuffer {
            buffer: &staging,
            layout: wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(bytes_per_row),
                rows_per_image: Some(height),
            },
        },
        wgpu::Extent3d {
            width,
            height,
            depth_or_array_layers: 1,
        },
    );

    ctx.submit_one(encoder);

    let slice = staging.slice(..);
    let (tx, rx) = std::sync::mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = tx.send(result);
    });
    ctx.device.poll(wgpu::Maintain::Wait);

    match rx.recv() {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            return Err(PixelError::Conversion(format!(
                "readback buffer map failed: {e:?}"
            )));
        }
        Err(e) => {
            return Err(PixelError::Conversion(format!(
                "readback completion signal lost: {e}"
            )));
        }
    }

    let mapped = slice.get_mapped_range();
    let packed_row = (width * 4) as usize;

    let mut pixels = Vec::with_capacity(packed_row * height as usize);
    for y in 0..height as usize {
        let start = y * bytes_per_row as usize;
        pixels.extend_from_slice(&mapped[start..start + packed_row]);
    }

    drop(mapped);
    staging.unmap();

    RgbaImage::from_raw(width, height, pixels).ok_or_else(|| {
        PixelError::Conversion(format!(
            "readback produced a buffer inconsistent with {width}x{height} RGBA"
        ))
    })
}

/// Row pitch for texture-to-buffer copies. wgpu requires `bytes_per_row`
/// to be a multiple of 256.
pub(crate) fn aligned_bytes_per_row(width: u32) -> u32 {
    let unaligned = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unaligned.div_ceil(align) * align
}

/// Total staging-buffer size for a padded readback. Widened to u64 before
/// multiplying: a device-valid gigapixel texture (32768²) already exceeds
/// u32::MAX bytes.
pub(crate) fn staging_buffer_size(width: u32, height: u32) -> u64 {
    aligned_bytes_per_row(width) as u64 * height as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_per_row_rounds_up_to_256() {
        assert_eq!(aligned_bytes_per_row(1), 256);
        assert_eq!(aligned_bytes_per_row(64), 256);
        assert_eq!(aligned_bytes_per_row(65), 512);
        assert_eq!(aligned_bytes_per_row(100), 512);
        assert_eq!(aligned_bytes_per_row(128), 512);
    }

    #[test]
    fn staging_size_survives_gigapixel_textures() {
        // 32768² RGBA is 4 GiB of rows — past u32::MAX, still a valid
        // texture on adapters reporting max_texture_dimension_2d >= 32768.
        assert_eq!(staging_buffer_size(32768, 32768), 4_294_967_296);
        assert_eq!(staging_buffer_size(65536, 65536), 17_179_869_184);
        // Small case unchanged: 100-wide rows pad to 512 bytes.
        assert_eq!(staging_buffer_size(100, 10), 5120);
    }
}
