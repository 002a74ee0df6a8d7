/// Post-process parameters for the programmable demosaic path
///
/// Brightness and contrast are applied by the direct-decode shader as
/// `output = color * contrast + brightness`; grayscale collapses the output
/// to the green estimate. All three are mutated only by runtime controls
/// and read each render.

use std::fs;
use std::io;
use std::path::Path;

/// Upper bound for brightness and contrast.
pub const PARAM_MAX: f32 = 10.0;

/// Increment applied by a single control event.
const PARAM_STEP: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PostProcessParams {
    /// Additive brightness, clamped to `[0, 10]`.
    pub brightness: f32,
    /// Multiplicative contrast, clamped to `[0, 10]`.
    pub contrast: f32,
    /// Replicate the green estimate across all channels.
    pub grayscale: bool,
}

impl Default for PostProcessParams {
    /// Identity under the direct path's formula: no added brightness,
    /// unit contrast, color output.
    fn default() -> Self {
        Self {
            brightness: 0.0,
            contrast: 1.0,
            grayscale: false,
        }
    }
}

impl PostProcessParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increase_brightness(&mut self) {
        self.brightness = (self.brightness + PARAM_STEP).clamp(0.0, PARAM_MAX);
    }

    pub fn decrease_brightness(&mut self) {
        self.brightness = (self.brightness - PARAM_STEP).clamp(0.0, PARAM_MAX);
    }

    pub fn increase_contrast(&mut self) {
        self.contrast = (self.contrast + PARAM_STEP).clamp(0.0, PARAM_MAX);
    }

    pub fn decrease_contrast(&mut self) {
        self.contrast = (self.contrast - PARAM_STEP).clamp(0.0, PARAM_MAX);
    }

    pub fn toggle_grayscale(&mut self) {
        self.grayscale = !self.grayscale;
    }

    /// Serialize as a JSON preset string.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Restore from a JSON preset string.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Load a preset file. A missing file surfaces as
    /// `io::ErrorKind::NotFound` so callers can treat it as "use defaults".
    pub fn load_preset<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json).map_err(io::Error::from)
    }

    /// Persist the current parameters as a preset file.
    pub fn save_preset<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        fs::write(path, self.to_json().map_err(io::Error::from)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn brightness_clamps_at_both_ends() {
        let mut params = PostProcessParams::new();
        for _ in 0..200 {
            params.increase_brightness();
        }
        assert!((params.brightness - PARAM_MAX).abs() < 1e-3);

        for _ in 0..500 {
            params.decrease_brightness();
        }
        assert!(params.brightness.abs() < 1e-3);
        assert!(params.brightness >= 0.0);
    }

    #[test]
    fn contrast_clamps_at_both_ends() {
        let mut params = PostProcessParams::new();
        for _ in 0..500 {
            params.increase_contrast();
        }
        assert!((params.contrast - PARAM_MAX).abs() < 1e-3);

        for _ in 0..500 {
            params.decrease_contrast();
        }
        assert!(params.contrast.abs() < 1e-3);
        assert!(params.contrast >= 0.0);
    }

    #[test]
    fn mixed_adjustments_stay_in_range() {
        let mut params = PostProcessParams::new();
        for i in 0..1000 {
            if i % 3 == 0 {
                params.increase_brightness();
                params.decrease_contrast();
            } else {
                params.decrease_brightness();
                params.increase_contrast();
            }
            assert!((0.0..=PARAM_MAX).contains(&params.brightness));
            assert!((0.0..=PARAM_MAX).contains(&params.contrast));
        }
    }

    #[test]
    fn json_preset_round_trip() {
        let mut params = PostProcessParams::new();
        params.increase_brightness();
        params.increase_contrast();
        params.toggle_grayscale();

        let json = params.to_json().unwrap();
        let restored = PostProcessParams::from_json(&json).unwrap();
        assert_eq!(restored, params);
    }

    #[test]
    fn preset_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preset.json");

        let mut params = PostProcessParams::new();
        params.increase_brightness();
        params.toggle_grayscale();
        params.save_preset(&path).unwrap();

        let restored = PostProcessParams::load_preset(&path).unwrap();
        assert_eq!(restored, params);
    }

    #[test]
    fn missing_preset_is_not_found() {
        let err = PostProcessParams::load_preset("/nonexistent/preset.json").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn grayscale_toggles_exactly_once_per_event() {
        let mut params = PostProcessParams::new();
        assert!(!params.grayscale);
        params.toggle_grayscale();
        assert!(params.grayscale);
        params.toggle_grayscale();
        assert!(!params.grayscale);
    }
}
