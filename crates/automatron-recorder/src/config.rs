//! Capture and playback tuning, optionally loaded from TOML
//!
//! ```toml
//! [capture]
//! stop_key = "esc"
//! scroll_timeout_ms = 300
//!
//! [playback]
//! seed = 42
//! start_delay_secs = 2.0
//! ```

use automatron_core::{Error, Result, RetryPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Recorder configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Pixels per wheel notch
    pub notch_pixels: f64,
    /// Scroll ticks smaller than this many pixels are dropped
    pub scroll_epsilon: i32,
    /// Max gap between ticks of the same burst, in ms
    pub scroll_timeout_ms: u64,
    /// Primary-button moves longer than this become drag_drop
    pub drag_threshold: f64,
    /// Key name that ends the recording
    pub stop_key: String,
    /// Bound of the event channel between listeners and the aggregator
    pub channel_capacity: usize,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            notch_pixels: 50.0,
            scroll_epsilon: 5,
            scroll_timeout_ms: 300,
            drag_threshold: 10.0,
            stop_key: "esc".to_string(),
            channel_capacity: 10_000,
        }
    }
}

impl CaptureConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.notch_pixels.is_finite() && self.notch_pixels > 0.0) {
            return Err(Error::config("capture.notch_pixels must be positive"));
        }
        if self.scroll_epsilon < 0 {
            return Err(Error::config("capture.scroll_epsilon must be non-negative"));
        }
        if !(self.drag_threshold.is_finite() && self.drag_threshold >= 0.0) {
            return Err(Error::config("capture.drag_threshold must be non-negative"));
        }
        if self.stop_key.trim().is_empty() {
            return Err(Error::config("capture.stop_key must not be empty"));
        }
        if self.channel_capacity == 0 {
            return Err(Error::config("capture.channel_capacity must be greater than 0"));
        }
        Ok(())
    }
}

/// Pause lengths and retry policy used on replay. Ranges are `[min, max]` seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackConfig {
    /// Bounds applied to a recorded `delay_before`
    pub min_delay_secs: f64,
    pub max_delay_secs: f64,
    /// Drawn when an action has no `delay_before`
    pub missing_delay: [f64; 2],
    pub pre_click_pause: [f64; 2],
    /// Fixed pause between arriving on the target and clicking
    pub click_settle_secs: f64,
    pub post_click_pause: [f64; 2],
    /// Pause after each typed character
    pub typing_pause: [f64; 2],
    pub clipboard_settle_secs: f64,
    /// Time spent on each point of a cursor path
    pub move_step_ms: u64,
    /// Confidences tried in order when re-targeting a click by image
    pub image_confidences: Vec<f64>,
    /// Floor for the pause after each chain loop
    pub min_loop_delay_secs: f64,
    /// Countdown before the first action so the user can focus the target window
    pub start_delay_secs: f64,
    /// Fixed RNG seed for reproducible pauses and paths
    pub seed: Option<u64>,
    pub retry: RetryPolicy,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            min_delay_secs: 0.1,
            max_delay_secs: 5.0,
            missing_delay: [0.5, 1.5],
            pre_click_pause: [0.5, 1.0],
            click_settle_secs: 0.2,
            post_click_pause: [0.1, 0.3],
            typing_pause: [0.05, 0.15],
            clipboard_settle_secs: 0.1,
            move_step_ms: 10,
            image_confidences: vec![0.9, 0.8, 0.7, 0.6, 0.5],
            min_loop_delay_secs: 1.0,
            start_delay_secs: 2.0,
            seed: None,
            retry: RetryPolicy::default(),
        }
    }
}

impl PlaybackConfig {
    /// Clamp a recorded delay into `[min_delay_secs, max_delay_secs]`.
    pub fn clamp_delay(&self, secs: f64) -> f64 {
        if secs.is_nan() {
            return self.min_delay_secs;
        }
        secs.clamp(self.min_delay_secs, self.max_delay_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.min_delay_secs >= 0.0 && self.min_delay_secs <= self.max_delay_secs) {
            return Err(Error::config(
                "playback.min_delay_secs must be non-negative and <= max_delay_secs",
            ));
        }
        for (name, range) in [
            ("missing_delay", self.missing_delay),
            ("pre_click_pause", self.pre_click_pause),
            ("post_click_pause", self.post_click_pause),
            ("typing_pause", self.typing_pause),
        ] {
            if !(range[0] >= 0.0 && range[0] <= range[1] && range[1].is_finite()) {
                return Err(Error::config(format!(
                    "playback.{} must be [min, max] with 0 <= min <= max",
                    name
                )));
            }
        }
        if self.image_confidences.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(Error::config("playback.image_confidences must be within 0..=1"));
        }
        self.retry
            .validate()
            .map_err(|reason| Error::config(format!("playback.retry.{}", reason)))?;
        if !(self.start_delay_secs >= 0.0 && self.min_loop_delay_secs >= 0.0) {
            return Err(Error::config("playback delays must be non-negative"));
        }
        Ok(())
    }
}

/// Contents of an `automatron.toml` file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomatronConfig {
    pub capture: CaptureConfig,
    pub playback: PlaybackConfig,
}

impl AutomatronConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| Error::config(format!("Failed to parse config file: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.capture.validate()?;
        self.playback.validate()
    }
}
