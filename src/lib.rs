// ============================================================================
// PixelFE — GPU-accelerated image pixelation
// ============================================================================
//
// Divides an image into fixed-size square blocks and replaces each block with
// its average colour, computed by a wgpu compute kernel (one GPU thread per
// output texel).
//
// Module map:
//   error.rs   — PixelError, the crate-wide error enum
//   io.rs      — image codec boundary (decode/encode, format round-trip)
//   gpu/       — device context, WGSL kernel, textures, dispatch
//   cli.rs     — command-line front end
//   logger.rs  — session log file + log_info!/log_warn!/log_err! macros
// ============================================================================

pub mod cli;
pub mod error;
pub mod gpu;
pub mod io;
pub mod logger;

pub use error::PixelError;
pub use gpu::context::{GpuContext, WorkgroupSize};
pub use gpu::pixelate::{KernelSource, MAX_BLOCK_SIZE, MIN_BLOCK_SIZE, Pixelator};
