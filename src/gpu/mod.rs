// ============================================================================
// GPU MODULE — wgpu compute pipeline for block pixelation
// ============================================================================
//
// Architecture:
//   context.rs  — wgpu Device, Queue, adapter init, capability limits
//   shaders.rs  — WGSL kernel source (inline string)
//   texture.rs  — upload (ingestion), output allocation, readback
//   pixelate.rs — Pixelator: pipeline build + dispatch engine
// ============================================================================

pub mod context;
pub mod pixelate;
pub mod shaders;
pub mod texture;

pub use context::{GpuContext, WorkgroupSize};
pub use pixelate::{KernelSource, Pixelator};
