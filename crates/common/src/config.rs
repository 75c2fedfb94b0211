//! Application configuration.
//!
//! Every tracking tunable lives here so that a session can be rebuilt from
//! a single JSON file. All sections are `#[serde(default)]`, which lets a
//! user override one constant without restating the rest.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{GazemapError, GazemapResult};

/// Global application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory where exported heatmaps and gaze logs are written.
    pub output_dir: PathBuf,

    /// Signal processing tunables.
    pub tracking: TrackingConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// All recognised tunables for the gaze pipeline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    pub filter: FilterTuning,
    pub stability: StabilityTuning,
    pub heatmap: HeatmapTuning,
}

/// Adaptive smoothing filter parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterTuning {
    /// Sampling frequency assumed before two timestamps have been seen (Hz).
    pub initial_frequency_hz: f64,

    /// Cutoff used when the signal is stationary (Hz). Lower = smoother.
    pub min_cutoff: f64,

    /// How much the cutoff rises per unit of smoothed speed.
    pub speed_coefficient: f64,

    /// Fixed cutoff of the derivative low-pass stage (Hz).
    pub derivative_cutoff: f64,
}

/// Stability mapper parameters. Distances are in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilityTuning {
    /// Samples below this confidence are dropped.
    pub confidence_threshold: f64,

    /// How far outside the viewport a raw sample may land before it is
    /// treated as a tracker failure.
    pub viewport_margin: f64,

    /// Jump clamp allowance independent of elapsed time.
    pub base_step: f64,

    /// Extra jump allowance per second elapsed since the last accepted sample.
    pub speed_factor: f64,

    /// Displacements shorter than this snap back to the previous point.
    pub deadband: f64,

    /// Floor on the elapsed time between accepted samples (seconds).
    pub min_dt_secs: f64,

    /// Elapsed time assumed when no previous timestamp is known (seconds).
    pub default_dt_secs: f64,
}

/// Heatmap accumulation and color encoding parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapTuning {
    /// Gaussian splat radius in pixels, independent of image size.
    pub radius: f64,

    /// Contribution of a splat at its center.
    pub max_intensity: f64,

    /// Per-cell accumulation ceiling.
    pub cell_ceiling: f64,

    /// Normalized values at or below this stay fully transparent.
    pub visual_floor: f64,

    /// Alpha at normalized intensity 1.0 (0-255).
    pub alpha_ceiling: f64,

    /// Append every Nth accepted sample to the heatmap log.
    pub sample_every: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "gazemap_processing_core=trace").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            tracking: TrackingConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for FilterTuning {
    fn default() -> Self {
        Self {
            initial_frequency_hz: 60.0,
            min_cutoff: 1.1,
            speed_coefficient: 0.01,
            derivative_cutoff: 1.0,
        }
    }
}

impl Default for StabilityTuning {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.55,
            viewport_margin: 100.0,
            base_step: 120.0,
            speed_factor: 550.0,
            deadband: 1.5,
            min_dt_secs: 0.008,
            default_dt_secs: 0.016,
        }
    }
}

impl Default for HeatmapTuning {
    fn default() -> Self {
        Self {
            radius: 40.0,
            max_intensity: 100.0,
            cell_ceiling: 255.0,
            visual_floor: 0.02,
            alpha_ceiling: 180.0,
            sample_every: 1,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl TrackingConfig {
    /// Reject values that would make the pipeline divide by zero or never
    /// accept a sample.
    pub fn validate(&self) -> GazemapResult<()> {
        let f = &self.filter;
        if f.initial_frequency_hz <= 0.0 || f.min_cutoff <= 0.0 || f.derivative_cutoff <= 0.0 {
            return Err(GazemapError::config(
                "filter frequencies and cutoffs must be positive",
            ));
        }
        if f.speed_coefficient < 0.0 {
            return Err(GazemapError::config(
                "filter speed_coefficient must not be negative",
            ));
        }

        let s = &self.stability;
        if !(0.0..=1.0).contains(&s.confidence_threshold) {
            return Err(GazemapError::config(format!(
                "confidence_threshold {} is outside [0, 1]",
                s.confidence_threshold
            )));
        }
        if s.min_dt_secs <= 0.0 || s.default_dt_secs <= 0.0 {
            return Err(GazemapError::config("stability time steps must be positive"));
        }
        if s.base_step <= 0.0 || s.deadband < 0.0 || s.speed_factor < 0.0 {
            return Err(GazemapError::config(
                "base_step must be positive; deadband and speed_factor non-negative",
            ));
        }

        let h = &self.heatmap;
        if h.radius <= 0.0 || h.max_intensity <= 0.0 || h.cell_ceiling <= 0.0 {
            return Err(GazemapError::config(
                "heatmap radius, max_intensity and cell_ceiling must be positive",
            ));
        }
        if !(0.0..=255.0).contains(&h.alpha_ceiling) {
            return Err(GazemapError::config("alpha_ceiling must be within [0, 255]"));
        }
        if h.sample_every == 0 {
            return Err(GazemapError::config("heatmap sample_every must be at least 1"));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if !config_path.exists() {
            return Self::default();
        }
        match Self::load_from(&config_path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring config at {:?}: {}", config_path, e);
                Self::default()
            }
        }
    }

    /// Load and validate config from an explicit path.
    pub fn load_from(path: impl AsRef<Path>) -> GazemapResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(GazemapError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.tracking.validate()?;
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> GazemapResult<()> {
        self.save_to(config_file_path())
    }

    /// Save config as pretty JSON to `path`, creating parent directories.
    pub fn save_to(&self, path: impl AsRef<Path>) -> GazemapResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("gazemap").join("config.json")
}

/// Default output directory for exports.
fn default_output_dir() -> PathBuf {
    let base = std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local").join("share")
        });
    base.join("gazemap").join("sessions")
}
