/// Mosaic frame storage and loading
///
/// - `frame.rs` - raw frame buffers and the GRBG tile pattern
/// - `loader.rs` - file decoding and frame sequences

pub mod frame;
pub mod loader;

pub use frame::{Channel, MosaicFrame};
pub use loader::FrameSequence;
