/// Error types for the viewer core
///
/// Initialization failures are returned to the top-level driver as typed
/// errors instead of exiting the process, so the driver can decide whether
/// to abort or fall back to the CPU reference decoder.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewerError {
    /// Half-resolution plane extraction assumes exact halving.
    #[error("mosaic dimensions {0}x{1} must be even")]
    OddDimensions(u32, u32),

    #[error("mosaic buffer holds {got} bytes, expected {expected}")]
    BufferSize { got: usize, expected: usize },

    #[error("cannot read image '{path}': {source}")]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("cannot write image '{path}': {source}")]
    ImageWrite {
        path: PathBuf,
        source: image::ImageError,
    },

    /// Every slot of a frame sequence failed to load.
    #[error("no loadable frames in sequence")]
    EmptySequence,

    #[error("no suitable GPU adapter found")]
    NoAdapter,

    #[error("failed to acquire GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("CPU demosaic failed: {0}")]
    Demosaic(String),

    #[error("snapshot buffer does not match render target dimensions")]
    SnapshotLayout,
}

impl ViewerError {
    /// Whether this error indicates missing GPU capability, in which case
    /// the session demotes to the CPU reference decoder instead of aborting.
    pub fn is_capability(&self) -> bool {
        matches!(self, Self::NoAdapter | Self::Device(_))
    }
}
