//! Stability mapping: screen gaze to a steady surface-local point.
//!
//! The mapper drops implausible samples, translates the rest into the
//! surface's coordinate space, and bounds frame-to-frame motion:
//!
//! 1. **Gate** on confidence, finiteness and a generous viewport margin.
//! 2. **Map** by subtracting the surface's current top-left offset.
//! 3. **Inside test** against the surface size; a miss breaks continuity.
//! 4. **Jump clamp**: sub-deadband motion snaps to the last point, motion
//!    beyond `base_step + speed_factor · dt` is shortened to that length
//!    along the same direction.
//!
//! Rejections are outcomes, not errors.

use gazemap_common::config::StabilityTuning;
use gazemap_gaze_model::geometry::{Point2D, SurfaceRect, ViewportBounds};

/// Why a sample did not produce a point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    /// Confidence below the threshold (or not a number).
    LowConfidence,
    /// A coordinate was NaN or infinite.
    NonFinite,
    /// Far outside the viewport: a tracker failure, not an off-surface look.
    OutsideViewport,
    /// Mapped point fell outside the surface.
    OffSurface,
    /// The surface has no usable area.
    InvalidSurface,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LowConfidence => "low_confidence",
            Self::NonFinite => "non_finite",
            Self::OutsideViewport => "outside_viewport",
            Self::OffSurface => "off_surface",
            Self::InvalidSurface => "invalid_surface",
        }
    }
}

/// Result of mapping one smoothed sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MapOutcome {
    Accepted(Point2D),
    Rejected(RejectReason),
}

impl MapOutcome {
    pub fn accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    pub fn point(&self) -> Option<Point2D> {
        match self {
            Self::Accepted(point) => Some(*point),
            Self::Rejected(_) => None,
        }
    }
}

/// Maps smoothed screen gaze onto the surface and suppresses jitter.
#[derive(Debug, Clone)]
pub struct StabilityMapper {
    tuning: StabilityTuning,
    last_point: Option<Point2D>,
    last_timestamp_secs: Option<f64>,
}

impl StabilityMapper {
    pub fn new(tuning: StabilityTuning) -> Self {
        Self {
            tuning,
            last_point: None,
            last_timestamp_secs: None,
        }
    }

    /// Screen-space plausibility checks. Reads no state.
    pub fn check_raw(
        &self,
        x: f64,
        y: f64,
        confidence: f64,
        viewport: &ViewportBounds,
    ) -> Option<RejectReason> {
        // Written so that a NaN confidence is rejected too.
        if !(confidence >= self.tuning.confidence_threshold) {
            return Some(RejectReason::LowConfidence);
        }
        if !x.is_finite() || !y.is_finite() {
            return Some(RejectReason::NonFinite);
        }
        if !viewport.admits(x, y, self.tuning.viewport_margin) {
            return Some(RejectReason::OutsideViewport);
        }
        None
    }

    /// Map one smoothed screen sample onto `surface`.
    ///
    /// `surface` must describe the layout at the time of the call.
    pub fn map(
        &mut self,
        x: f64,
        y: f64,
        confidence: f64,
        timestamp_secs: Option<f64>,
        surface: &SurfaceRect,
        viewport: &ViewportBounds,
    ) -> MapOutcome {
        if let Some(reason) = self.check_raw(x, y, confidence, viewport) {
            return MapOutcome::Rejected(reason);
        }

        if !surface.is_valid() {
            self.last_point = None;
            return MapOutcome::Rejected(RejectReason::InvalidSurface);
        }

        let mapped = surface.to_local(x, y);
        if !surface.contains_local(&mapped) {
            self.last_point = None;
            return MapOutcome::Rejected(RejectReason::OffSurface);
        }

        let timestamp = timestamp_secs.filter(|t| t.is_finite());
        let dt = self.elapsed_secs(timestamp);
        // An untimed sample ends the timed run; the next interval is unknown.
        self.last_timestamp_secs = timestamp;

        let point = match self.last_point {
            Some(last) => self.clamp_jump(last, mapped, dt),
            None => mapped,
        };
        self.last_point = Some(point);
        MapOutcome::Accepted(point)
    }

    /// Largest displacement allowed after `dt_secs` without samples.
    pub fn max_step(&self, dt_secs: f64) -> f64 {
        self.tuning.base_step + self.tuning.speed_factor * dt_secs
    }

    /// Time since the last accepted sample, floored; the default step when
    /// either side has no timestamp.
    fn elapsed_secs(&self, timestamp: Option<f64>) -> f64 {
        match (self.last_timestamp_secs, timestamp) {
            (Some(last), Some(now)) => (now - last).max(self.tuning.min_dt_secs),
            _ => self.tuning.default_dt_secs,
        }
    }

    fn clamp_jump(&self, last: Point2D, target: Point2D, dt_secs: f64) -> Point2D {
        let distance = last.distance_to(&target);
        if distance < self.tuning.deadband {
            return last;
        }
        let max_step = self.max_step(dt_secs);
        if distance > max_step {
            tracing::trace!(distance, max_step, "clamping gaze jump");
            return last.step_toward(&target, max_step);
        }
        target
    }

    /// Break continuity without forgetting timing.
    pub fn forget_position(&mut self) {
        self.last_point = None;
    }

    /// Clear all continuity state.
    pub fn reset(&mut self) {
        self.last_point = None;
        self.last_timestamp_secs = None;
    }

    pub fn last_point(&self) -> Option<Point2D> {
        self.last_point
    }

    pub fn tuning(&self) -> &StabilityTuning {
        &self.tuning
    }
}

impl Default for StabilityMapper {
    fn default() -> Self {
        Self::new(StabilityTuning::default())
    }
}
