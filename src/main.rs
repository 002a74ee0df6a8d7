/// Bayer mosaic sequence viewer
///
/// Loads a sequence of raw GRBG mosaic frames, demosaics them on the GPU
/// (or on the CPU when no suitable device exists) and plays them back and
/// forth at NTSC rate. Run with a path prefix and an optional frame count:
///
///     bayer-viewer [--direct] <prefix> [num_frames]
///
/// Frame files are named `{prefix}{i:08}` for i in 1..=num_frames; with no
/// count given, `<prefix>` names a single frame file directly. `--direct`
/// starts on the quick-preview decode path, whose brightness, contrast and
/// grayscale parameters are restored from and saved to a preset file.

use std::io;
use std::process::ExitCode;
use std::time::Duration;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

mod decode;
mod error;
mod gpu;
mod mosaic;
mod params;
mod playback;
mod session;

use error::ViewerError;
use gpu::DemosaicMode;
use mosaic::FrameSequence;
use params::PostProcessParams;
use playback::NTSC_FRAME_BUDGET;
use session::ViewerSession;

/// Post-process parameters persist across runs, like any editor's settings.
const PRESET_PATH: &str = "params.json";

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let mut args: Vec<String> = std::env::args().collect();
    let direct = args.iter().any(|a| a == "--direct");
    args.retain(|a| a != "--direct");

    let usage = || eprintln!("USAGE: {} [--direct] <prefix> [num_frames]", args[0]);
    if args.len() < 2 || args.len() > 3 {
        usage();
        return ExitCode::FAILURE;
    }
    let num_frames = match args.get(2).map(|n| n.parse::<usize>()) {
        None => None,
        Some(Ok(n)) => Some(n),
        Some(Err(_)) => {
            usage();
            return ExitCode::FAILURE;
        }
    };
    let mode = if direct {
        DemosaicMode::Direct
    } else {
        DemosaicMode::Plane
    };

    match run(&args[1], num_frames, mode) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "viewer failed");
            ExitCode::FAILURE
        }
    }
}

fn run(prefix: &str, num_frames: Option<usize>, mode: DemosaicMode) -> Result<(), ViewerError> {
    let sequence = match num_frames {
        Some(count) => FrameSequence::load(prefix, count)?,
        None => FrameSequence::load_single(prefix)?,
    };
    let (width, height) = sequence.dimensions();
    info!(
        frames = sequence.len(),
        loaded = sequence.loaded_count(),
        width,
        height,
        "sequence loaded"
    );

    let mut session = ViewerSession::new(sequence)?;
    session.set_mode(mode);
    match session.output_view() {
        Some(_) => info!(mode = ?mode, "GPU output view ready"),
        None => info!("CPU backend active"),
    }

    match PostProcessParams::load_preset(PRESET_PATH) {
        Ok(params) => {
            info!(path = PRESET_PATH, "restored post-process preset");
            session.set_params(params);
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = PRESET_PATH, error = %e, "cannot read preset, using defaults"),
    }

    // Headless playback: one full bounce through the sequence, paced at
    // the per-frame budget, then a capture of the last rendered frame.
    let steps = match session.playback().len() {
        0 | 1 => 1,
        n => 2 * (n - 1),
    };
    for _ in 0..steps {
        std::thread::sleep(Duration::from_secs_f64(NTSC_FRAME_BUDGET));
        session.tick()?;
    }

    session.capture("out.png")?;

    if let Err(e) = session.params().save_preset(PRESET_PATH) {
        warn!(path = PRESET_PATH, error = %e, "cannot save preset");
    }
    Ok(())
}
