/// Viewer session state
///
/// One session owns everything a running viewer needs: the loaded frame
/// sequence, playback state, post-process parameters, the selected demosaic
/// mode and the rendering backend. Hosts drive it with `tick` once per
/// display refresh and feed it control events; it never touches process
/// globals.

use std::path::Path;

use tracing::{info, warn};

use crate::decode;
use crate::error::ViewerError;
use crate::gpu::{BayerPipeline, DemosaicMode};
use crate::mosaic::FrameSequence;
use crate::params::PostProcessParams;
use crate::playback::Playback;

/// Runtime control events, already translated from host input (keys,
/// buttons) by the embedding layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    Quit,
    ToggleFullscreen,
    ToggleGrayscale,
    ToggleMode,
    BrightnessUp,
    BrightnessDown,
    ContrastUp,
    ContrastDown,
}

/// Requests the session cannot satisfy itself and hands back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostRequest {
    Quit,
    ToggleFullscreen,
}

/// Rendering backend. The CPU variant exists for machines whose GPU
/// capability is insufficient; it holds the last decoded RGB frame.
enum Backend {
    Gpu(BayerPipeline),
    Cpu(CpuFallback),
}

struct CpuFallback {
    rgb: Vec<u8>,
}

pub struct ViewerSession {
    sequence: FrameSequence,
    playback: Playback,
    params: PostProcessParams,
    mode: DemosaicMode,
    backend: Backend,
}

impl ViewerSession {
    /// Build a session over a loaded sequence. GPU capability errors
    /// (no adapter, device creation failure) fall back to the CPU decoder;
    /// every other error propagates.
    pub fn new(sequence: FrameSequence) -> Result<Self, ViewerError> {
        let (width, height) = sequence.dimensions();

        let backend = match pollster::block_on(BayerPipeline::new(width, height)) {
            Ok(pipeline) => Backend::Gpu(pipeline),
            Err(e) if e.is_capability() => {
                warn!(error = %e, "GPU unavailable, falling back to CPU decoding");
                Backend::Cpu(CpuFallback { rgb: Vec::new() })
            }
            Err(e) => return Err(e),
        };

        let mut session = Self {
            playback: Playback::new(sequence.len()),
            sequence,
            params: PostProcessParams::default(),
            mode: DemosaicMode::Plane,
            backend,
        };
        session.render_current()?;
        Ok(session)
    }

    /// Advance playback if the frame budget has elapsed, then render the
    /// current frame. Rendering happens on every tick, not only on frame
    /// advances, so parameter and mode changes take effect immediately --
    /// including for a single static frame, which never advances at all.
    pub fn tick(&mut self) -> Result<(), ViewerError> {
        self.playback.tick();
        self.render_current()
    }

    /// Render the frame at the current playback index. An unset slot
    /// (a file that failed to load) is logged and skipped, leaving the
    /// previous output on screen.
    pub fn render_current(&mut self) -> Result<(), ViewerError> {
        let index = self.playback.index();
        let Some(frame) = self.sequence.frame(index) else {
            warn!(frame = index, "skipping unset sequence slot");
            return Ok(());
        };

        match &mut self.backend {
            Backend::Gpu(pipeline) => {
                pipeline.upload_frame(frame)?;
                pipeline.update_params(&self.params);
                pipeline.render(self.mode);
            }
            Backend::Cpu(fallback) => {
                fallback.rgb = decode::decode_rgb(frame)?;
            }
        }
        Ok(())
    }

    /// Apply one control event. Events the session cannot handle itself
    /// are returned as a request to the host.
    pub fn handle_control(&mut self, event: ControlEvent) -> Option<HostRequest> {
        match event {
            ControlEvent::Quit => return Some(HostRequest::Quit),
            ControlEvent::ToggleFullscreen => return Some(HostRequest::ToggleFullscreen),
            ControlEvent::ToggleGrayscale => self.params.toggle_grayscale(),
            ControlEvent::ToggleMode => {
                self.mode = match self.mode {
                    DemosaicMode::Plane => DemosaicMode::Direct,
                    DemosaicMode::Direct => DemosaicMode::Plane,
                };
            }
            ControlEvent::BrightnessUp => self.params.increase_brightness(),
            ControlEvent::BrightnessDown => self.params.decrease_brightness(),
            ControlEvent::ContrastUp => self.params.increase_contrast(),
            ControlEvent::ContrastDown => self.params.decrease_contrast(),
        }
        None
    }

    /// Select which demosaic path renders subsequent frames.
    pub fn set_mode(&mut self, mode: DemosaicMode) {
        self.mode = mode;
    }

    pub fn mode(&self) -> DemosaicMode {
        self.mode
    }

    pub fn params(&self) -> &PostProcessParams {
        &self.params
    }

    /// Replace the post-process parameters wholesale (preset restore).
    /// Applied on the next render.
    pub fn set_params(&mut self, params: PostProcessParams) {
        self.params = params;
    }

    pub fn playback(&self) -> &Playback {
        &self.playback
    }

    pub fn playback_mut(&mut self) -> &mut Playback {
        &mut self.playback
    }

    /// View of the rendered output for presentation, when a GPU backend
    /// is active.
    pub fn output_view(&self) -> Option<&wgpu::TextureView> {
        match &self.backend {
            Backend::Gpu(pipeline) => Some(pipeline.output_view()),
            Backend::Cpu(_) => None,
        }
    }

    /// Write the current rendered frame to disk as a PNG.
    pub fn capture<P: AsRef<Path>>(&self, path: P) -> Result<(), ViewerError> {
        let path = path.as_ref();
        let (width, height) = self.sequence.dimensions();

        let rgb: Vec<u8> = match &self.backend {
            Backend::Gpu(pipeline) => {
                let rgba = pipeline.snapshot();
                rgba.chunks_exact(4).flat_map(|px| [px[0], px[1], px[2]]).collect()
            }
            Backend::Cpu(fallback) => fallback.rgb.clone(),
        };
        if rgb.len() != (width * height * 3) as usize {
            return Err(ViewerError::SnapshotLayout);
        }

        image::save_buffer_with_format(
            path,
            &rgb,
            width,
            height,
            image::ExtendedColorType::Rgb8,
            image::ImageFormat::Png,
        )
        .map_err(|source| ViewerError::ImageWrite {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "captured frame");
        Ok(())
    }
}
