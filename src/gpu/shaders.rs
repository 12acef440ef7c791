// ============================================================================
// GPU SHADERS — all WGSL code kept inline for containment
// ============================================================================

/// Name of the WGSL override constant for the workgroup width. The value
/// is injected at pipeline creation through
/// `PipelineCompilationOptions::constants`, so the shader source stays
/// byte-identical across devices.
pub const WORKGROUP_X_OVERRIDE: &str = "WORKGROUP_X";
/// Name of the WGSL override constant for the workgroup height.
pub const WORKGROUP_Y_OVERRIDE: &str = "WORKGROUP_Y";

/// Entry point name of the pixelation kernel in [`PIXELATE_SHADER`].
pub const PIXELATE_ENTRY_POINT: &str = "cs_pixelate";

/// Block-pixelation compute kernel.
///
/// One invocation per output texel. Each thread locates the origin of the
/// block containing its texel, averages every in-bounds source texel of that
/// block, and writes the average (alpha included). Threads in the same block
/// iterate the same texels in the same order, so they store bit-identical
/// results — every texel of a block gets exactly one uniform colour.
///
/// Edge blocks at the right/bottom border clamp the read range to the image
/// bounds and average fewer than `block_size²` samples. No wrapping, no
/// zero padding.
///
/// Textures are `rgba8unorm` (not sRGB): channel values pass through the
/// kernel exactly as stored, with no gamma reinterpretation.
///
/// The workgroup shape is a pair of override constants specialised per
/// device from `GpuContext::workgroup` (defaults match the WebGPU
/// downlevel guarantee of 256 invocations per workgroup).
pub const PIXELATE_SHADER: &str = r#"
override WORKGROUP_X: u32 = 16u;
override WORKGROUP_Y: u32 = 16u;

struct PixelateParams {
    block_size: u32,
    width: u32,
    height: u32,
    _unused: u32,
}

@group(0) @binding(0) var input_tex: texture_2d<f32>;
@group(0) @binding(1) var output_tex: texture_storage_2d<rgba8unorm, write>;
@group(0) @binding(2) var<uniform> params: PixelateParams;

@compute @workgroup_size(WORKGROUP_X, WORKGROUP_Y, 1)
fn cs_pixelate(@builtin(global_invocation_id) gid: vec3<u32>) {
    // The grid is rounded up to whole workgroups; excess threads exit.
    if (gid.x >= params.width || gid.y >= params.height) {
        return;
    }

    let b = params.block_size;
    let origin_x = (gid.x / b) * b;
    let origin_y = (gid.y / b) * b;
    let end_x = min(origin_x + b, params.width);
    let end_y = min(origin_y + b, params.height);

    var sum = vec4<f32>(0.0, 0.0, 0.0, 0.0);
    for (var y = origin_y; y < end_y; y = y + 1u) {
        for (var x = origin_x; x < end_x; x = x + 1u) {
            sum = sum + textureLoad(input_tex, vec2<i32>(i32(x), i32(y)), 0);
        }
    }

    let count = f32((end_x - origin_x) * (end_y - origin_y));
    textureStore(output_tex, vec2<i32>(i32(gid.x), i32(gid.y)), sum / count);
}
"#;
