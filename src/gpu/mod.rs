/// GPU-accelerated mosaic rendering module
///
/// This module provides real-time demosaicing of raw sensor mosaics using
/// wgpu and custom WGSL shaders.
///
/// Architecture:
/// - `shaders.rs` - WGSL shader source code for both demosaic paths
/// - `pipeline.rs` - wgpu device, textures and render pipeline management
///
/// The pipelines convert mosaic sensor data (u8) to rendered RGB output
/// entirely on the GPU; the CPU only uploads frames and reads snapshots.

pub mod pipeline;
pub mod shaders;

pub use pipeline::{BayerPipeline, DemosaicMode};
