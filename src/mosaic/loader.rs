/// Mosaic frame loading
///
/// Frames arrive as ordinary image files decoded by the `image` crate into
/// single-channel byte buffers with discovered dimensions. A sequence is a
/// set of files sharing a prefix, numbered `{prefix}00000001` onward; a
/// missing or unreadable file in a sequence logs an error and leaves that
/// slot unset, and loading continues.

use std::path::Path;

use image::ImageReader;
use tracing::{error, info};

use crate::error::ViewerError;
use crate::mosaic::frame::MosaicFrame;

/// Decode one file into a mosaic frame (luma8, discovered dimensions).
pub fn load_frame<P: AsRef<Path>>(path: P) -> Result<MosaicFrame, ViewerError> {
    let path = path.as_ref();
    let wrap = |source: image::ImageError| ViewerError::Image {
        path: path.to_path_buf(),
        source,
    };

    // Sequence files carry no extension, so sniff the format from content.
    let img = ImageReader::open(path)
        .map_err(|e| wrap(image::ImageError::IoError(e)))?
        .with_guessed_format()
        .map_err(|e| wrap(image::ImageError::IoError(e)))?
        .decode()
        .map_err(wrap)?;

    let luma = img.to_luma8();
    let (width, height) = luma.dimensions();
    MosaicFrame::new(width, height, luma.into_raw())
}

/// An ordered, 1-indexed sequence of mosaic frames. Slots whose file failed
/// to load stay `None`; the playback path skips them.
#[derive(Debug)]
pub struct FrameSequence {
    frames: Vec<Option<MosaicFrame>>,
    width: u32,
    height: u32,
}

impl FrameSequence {
    /// Build a sequence from already-decoded frames. Dimensions are taken
    /// from the first loaded frame; frames that disagree are dropped with
    /// an error log.
    pub fn from_frames(mut frames: Vec<Option<MosaicFrame>>) -> Result<Self, ViewerError> {
        let (width, height) = frames
            .iter()
            .flatten()
            .next()
            .map(|f| f.dimensions())
            .ok_or(ViewerError::EmptySequence)?;

        for (i, slot) in frames.iter_mut().enumerate() {
            if let Some(frame) = slot {
                if frame.dimensions() != (width, height) {
                    error!(
                        frame = i + 1,
                        "frame dimensions {}x{} do not match sequence {}x{}, dropping",
                        frame.width(),
                        frame.height(),
                        width,
                        height
                    );
                    *slot = None;
                }
            }
        }

        Ok(Self {
            frames,
            width,
            height,
        })
    }

    /// Load a single static frame from `path`.
    pub fn load_single<P: AsRef<Path>>(path: P) -> Result<Self, ViewerError> {
        let frame = load_frame(path)?;
        Self::from_frames(vec![Some(frame)])
    }

    /// Load `count` frames named `{prefix}{index:08}` with 1-based indices.
    /// Each file is attempted exactly once.
    pub fn load(prefix: &str, count: usize) -> Result<Self, ViewerError> {
        let mut frames = Vec::with_capacity(count);
        for i in 1..=count {
            let path = format!("{prefix}{i:08}");
            match load_frame(&path) {
                Ok(frame) => frames.push(Some(frame)),
                Err(e) => {
                    error!("cannot open file '{path}': {e}");
                    frames.push(None);
                }
            }
        }
        let sequence = Self::from_frames(frames)?;
        info!(
            loaded = sequence.loaded_count(),
            total = count,
            "loaded frame sequence"
        );
        Ok(sequence)
    }

    /// Number of slots (including unset ones).
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn loaded_count(&self) -> usize {
        self.frames.iter().flatten().count()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The frame at 1-based index `n`, or `None` if the index is out of
    /// range or that slot failed to load.
    pub fn frame(&self, n: usize) -> Option<&MosaicFrame> {
        if n == 0 {
            return None;
        }
        self.frames.get(n - 1)?.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ExtendedColorType, ImageFormat};
    use std::path::PathBuf;

    fn write_gray(path: &PathBuf, w: u32, h: u32, value: u8) {
        let data = vec![value; (w * h) as usize];
        image::save_buffer_with_format(
            path,
            &data,
            w,
            h,
            ExtendedColorType::L8,
            ImageFormat::Png,
        )
        .unwrap();
    }

    #[test]
    fn missing_file_is_fatal_for_single_frame() {
        let result = FrameSequence::load_single("/nonexistent/mosaic");
        assert!(matches!(result, Err(ViewerError::Image { .. })));
    }

    #[test]
    fn sequence_with_missing_file_leaves_slot_unset() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("seq").to_string_lossy().to_string();

        // Files 1 and 3 exist, file 2 is missing.
        write_gray(&PathBuf::from(format!("{prefix}00000001")), 8, 6, 10);
        write_gray(&PathBuf::from(format!("{prefix}00000003")), 8, 6, 30);

        let seq = FrameSequence::load(&prefix, 3).unwrap();
        assert_eq!(seq.len(), 3);
        assert_eq!(seq.loaded_count(), 2);
        assert_eq!(seq.dimensions(), (8, 6));
        assert!(seq.frame(1).is_some());
        assert!(seq.frame(2).is_none());
        assert!(seq.frame(3).is_some());
        assert_eq!(seq.frame(3).unwrap().sample(0, 0), 30);
    }

    #[test]
    fn sequence_with_no_loadable_frames_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("none").to_string_lossy().to_string();
        assert!(matches!(
            FrameSequence::load(&prefix, 2),
            Err(ViewerError::EmptySequence)
        ));
    }

    #[test]
    fn mismatched_dimensions_are_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("mix").to_string_lossy().to_string();
        write_gray(&PathBuf::from(format!("{prefix}00000001")), 8, 6, 1);
        write_gray(&PathBuf::from(format!("{prefix}00000002")), 4, 4, 2);

        let seq = FrameSequence::load(&prefix, 2).unwrap();
        assert_eq!(seq.dimensions(), (8, 6));
        assert!(seq.frame(1).is_some());
        assert!(seq.frame(2).is_none());
    }

    #[test]
    fn indexing_is_one_based() {
        let frame = MosaicFrame::new(2, 2, vec![0; 4]).unwrap();
        let seq = FrameSequence::from_frames(vec![Some(frame)]).unwrap();
        assert!(seq.frame(0).is_none());
        assert!(seq.frame(1).is_some());
        assert!(seq.frame(2).is_none());
    }
}
