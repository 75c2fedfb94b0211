//! Adaptive gaze smoothing.
//!
//! A fixed-coefficient low-pass either lags behind saccades or lets fixation
//! jitter through. The filter here (the "One Euro" scheme) ties its cutoff
//! frequency to the smoothed speed of the signal instead: strong damping
//! while the eye is still, little damping while it moves fast.
//!
//! Each axis gets its own [`AdaptiveFilter`]; [`GazeFilter`] pairs them.

use std::f64::consts::PI;

use gazemap_common::config::FilterTuning;
use gazemap_gaze_model::geometry::Point2D;

/// Floor on the time between two samples, in seconds.
///
/// Duplicate or out-of-order timestamps would otherwise blow up the
/// frequency estimate.
pub const MIN_SAMPLE_DT_SECS: f64 = 1e-3;

/// Coefficient of a single-pole low-pass with the given cutoff, sampled
/// every `dt_secs`.
///
/// `1 / (1 + tau / dt)` where `tau = 1 / (2π · cutoff)`.
pub fn smoothing_coefficient(cutoff_hz: f64, dt_secs: f64) -> f64 {
    let tau = 1.0 / (2.0 * PI * cutoff_hz);
    1.0 / (1.0 + tau / dt_secs)
}

/// Single-pole low-pass stage with an adjustable coefficient.
#[derive(Debug, Clone)]
struct LowPassStage {
    coefficient: f64,
    last: Option<f64>,
}

impl LowPassStage {
    fn new(coefficient: f64) -> Self {
        Self {
            coefficient,
            last: None,
        }
    }

    /// The first value passes through unchanged.
    fn filter(&mut self, value: f64) -> f64 {
        let output = match self.last {
            None => value,
            Some(previous) => self.coefficient * value + (1.0 - self.coefficient) * previous,
        };
        self.last = Some(output);
        output
    }
}

/// Snapshot of one axis filter's internal state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FilterState {
    pub value_estimate: Option<f64>,
    pub derivative_estimate: Option<f64>,
    pub last_timestamp_secs: Option<f64>,
    pub frequency_hz: f64,
}

impl FilterState {
    pub fn has_value(&self) -> bool {
        self.value_estimate.is_some()
    }
}

/// Speed-adaptive low-pass filter for one scalar stream.
#[derive(Debug, Clone)]
pub struct AdaptiveFilter {
    tuning: FilterTuning,
    frequency_hz: f64,
    value: LowPassStage,
    derivative: LowPassStage,
    last_timestamp_secs: Option<f64>,
}

impl AdaptiveFilter {
    pub fn new(tuning: FilterTuning) -> Self {
        let frequency_hz = tuning.initial_frequency_hz;
        Self {
            tuning,
            frequency_hz,
            value: LowPassStage::new(smoothing_coefficient(tuning.min_cutoff, 1.0 / frequency_hz)),
            derivative: LowPassStage::new(smoothing_coefficient(
                tuning.derivative_cutoff,
                1.0 / frequency_hz,
            )),
            last_timestamp_secs: None,
        }
    }

    /// Smooth one raw value observed at `timestamp_secs`.
    ///
    /// The first value after construction or [`reset`](Self::reset) is
    /// returned unchanged. A missing or non-finite timestamp leaves the
    /// frequency estimate as it was for this tick. A non-finite value is
    /// not absorbed: state is untouched and the current estimate is
    /// returned (or the value itself when there is none).
    pub fn filter(&mut self, raw: f64, timestamp_secs: Option<f64>) -> f64 {
        if !raw.is_finite() {
            return self.value.last.unwrap_or(raw);
        }

        let timestamp = timestamp_secs.filter(|t| t.is_finite());
        if let (Some(previous), Some(now)) = (self.last_timestamp_secs, timestamp) {
            let dt = (now - previous).max(MIN_SAMPLE_DT_SECS);
            self.frequency_hz = 1.0 / dt;
        }
        self.last_timestamp_secs = timestamp;

        let raw_derivative = match self.value.last {
            Some(previous) => (raw - previous) * self.frequency_hz,
            None => 0.0,
        };
        let speed = self.derivative.filter(raw_derivative).abs();

        let cutoff = self.tuning.min_cutoff + self.tuning.speed_coefficient * speed;
        self.value.coefficient = smoothing_coefficient(cutoff, 1.0 / self.frequency_hz);
        self.value.filter(raw)
    }

    /// Forget everything learned from the stream.
    ///
    /// The frequency estimate is kept so the derivative stage starts from
    /// the most recent cadence.
    pub fn reset(&mut self) {
        let dt = 1.0 / self.frequency_hz;
        self.value = LowPassStage::new(smoothing_coefficient(self.tuning.min_cutoff, dt));
        self.derivative = LowPassStage::new(smoothing_coefficient(self.tuning.derivative_cutoff, dt));
        self.last_timestamp_secs = None;
    }

    pub fn state(&self) -> FilterState {
        FilterState {
            value_estimate: self.value.last,
            derivative_estimate: self.derivative.last,
            last_timestamp_secs: self.last_timestamp_secs,
            frequency_hz: self.frequency_hz,
        }
    }
}

/// Independent adaptive filters for the two screen axes.
#[derive(Debug, Clone)]
pub struct GazeFilter {
    x: AdaptiveFilter,
    y: AdaptiveFilter,
}

impl GazeFilter {
    pub fn new(tuning: FilterTuning) -> Self {
        Self {
            x: AdaptiveFilter::new(tuning),
            y: AdaptiveFilter::new(tuning),
        }
    }

    pub fn filter(&mut self, raw: Point2D, timestamp_secs: Option<f64>) -> Point2D {
        Point2D::new(
            self.x.filter(raw.x, timestamp_secs),
            self.y.filter(raw.y, timestamp_secs),
        )
    }

    pub fn reset(&mut self) {
        self.x.reset();
        self.y.reset();
    }

    pub fn axes(&self) -> (&AdaptiveFilter, &AdaptiveFilter) {
        (&self.x, &self.y)
    }
}

impl Default for GazeFilter {
    fn default() -> Self {
        Self::new(FilterTuning::default())
    }
}
