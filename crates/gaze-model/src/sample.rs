//! Raw predictor samples and the records of a recorded gaze stream.
//!
//! A recorded stream is JSONL with one tagged record per line. Besides
//! gaze samples it carries the layout and lifecycle changes that happened
//! while recording, so a replay sees the same surface geometry the live
//! session did.

use serde::{Deserialize, Serialize};

use crate::geometry::{SurfaceRect, ViewportBounds};

/// Schema version written to new stream headers.
pub const STREAM_SCHEMA_VERSION: &str = "1.0";

/// One gaze estimate from the external predictor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GazeSample {
    /// Predictor timestamp in seconds, when it reported one.
    #[serde(rename = "t", default, skip_serializing_if = "Option::is_none")]
    pub timestamp_secs: Option<f64>,

    /// Screen X in pixels.
    pub x: f64,

    /// Screen Y in pixels.
    pub y: f64,

    /// Prediction confidence in `[0, 1]`. Predictors that do not report
    /// one are treated as fully confident.
    #[serde(default = "full_confidence")]
    pub confidence: f64,
}

fn full_confidence() -> f64 {
    1.0
}

impl GazeSample {
    pub fn new(x: f64, y: f64, confidence: f64, timestamp_secs: Option<f64>) -> Self {
        Self {
            timestamp_secs,
            x,
            y,
            confidence,
        }
    }

    /// A fully confident sample at time `t`.
    pub fn at(t: f64, x: f64, y: f64) -> Self {
        Self::new(x, y, 1.0, Some(t))
    }

    /// Both coordinates are finite numbers.
    pub fn has_finite_position(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// The timestamp, if present and finite.
    pub fn valid_timestamp(&self) -> Option<f64> {
        self.timestamp_secs.filter(|t| t.is_finite())
    }
}

/// Tracking lifecycle commands recorded in a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingCommand {
    Start,
    Stop,
    /// Calibration finished; tracking restarts with fresh filter state.
    Recalibrated,
}

/// Discriminated union of stream records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamRecord {
    /// Predictor output.
    Gaze(GazeSample),

    /// The surface moved or was resized.
    Surface(SurfaceRect),

    /// The viewport was resized.
    Viewport(ViewportBounds),

    /// Tracking was started, stopped or recalibrated.
    Tracking { state: TrackingCommand },

    /// A new stimulus was loaded onto the surface.
    Stimulus { name: String },
}

impl StreamRecord {
    pub fn gaze(sample: GazeSample) -> Self {
        Self::Gaze(sample)
    }

    pub fn tracking(state: TrackingCommand) -> Self {
        Self::Tracking { state }
    }

    /// Extract the gaze sample if this record carries one.
    pub fn as_gaze(&self) -> Option<&GazeSample> {
        match self {
            Self::Gaze(sample) => Some(sample),
            _ => None,
        }
    }
}

/// Metadata written as the `#`-prefixed first line of a stream file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamHeader {
    /// Schema version for forward compatibility.
    pub schema_version: String,

    /// Wall-clock time at recording start (RFC 3339).
    pub recorded_at: String,

    /// Nominal predictor rate, when known. Real cadence is irregular.
    #[serde(default)]
    pub nominal_rate_hz: Option<f64>,

    /// Free-form predictor identification.
    #[serde(default)]
    pub predictor: Option<String>,
}

impl StreamHeader {
    /// Header for a stream recorded now.
    pub fn now(predictor: Option<String>) -> Self {
        Self {
            schema_version: STREAM_SCHEMA_VERSION.to_string(),
            recorded_at: chrono::Utc::now().to_rfc3339(),
            nominal_rate_hz: None,
            predictor,
        }
    }
}
