/// CPU reference decoder
///
/// Host-side demosaicing for machines whose GPU capability is insufficient
/// for the shader pipelines. The interpolation itself is supplied by the
/// `bayer` crate; this module only adapts our frame layout to its
/// input/output contract (GRBG pattern, 8-bit samples, interleaved RGB out).

use std::io::Cursor;

use bayer::{BayerDepth, Demosaic, RasterDepth, RasterMut, CFA};
use tracing::debug;

use crate::error::ViewerError;
use crate::mosaic::MosaicFrame;

/// Decode a mosaic frame into `width * height * 3` interleaved RGB bytes.
/// Deterministic, no GPU state.
pub fn decode_rgb(frame: &MosaicFrame) -> Result<Vec<u8>, ViewerError> {
    let (width, height) = (frame.width() as usize, frame.height() as usize);
    debug!(width, height, "CPU demosaic");

    let mut rgb = vec![0u8; width * height * 3];
    let mut raster = RasterMut::new(width, height, RasterDepth::Depth8, &mut rgb);
    bayer::run_demosaic(
        &mut Cursor::new(frame.data()),
        BayerDepth::Depth8,
        CFA::GRBG,
        Demosaic::NearestNeighbour,
        &mut raster,
    )
    .map_err(|e| ViewerError::Demosaic(format!("{e:?}")))?;

    Ok(rgb)
}
