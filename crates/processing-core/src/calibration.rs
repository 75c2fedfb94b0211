//! Calibration target layout and click bookkeeping.
//!
//! Targets are expressed in surface-normalized coordinates and mapped to
//! screen space with the surface geometry at the moment each one is shown,
//! so a layout change mid-calibration moves the remaining targets with it.

use serde::{Deserialize, Serialize};

use gazemap_gaze_model::geometry::{Point2D, SurfaceRect};

/// Clicks required on each target before moving on.
pub const DEFAULT_CLICKS_PER_TARGET: u32 = 3;

/// 3×3 grid at 10/50/90 % plus four intermediate targets.
const DEFAULT_TARGETS: [(f64, f64); 13] = [
    (0.1, 0.1),
    (0.5, 0.1),
    (0.9, 0.1),
    (0.1, 0.5),
    (0.5, 0.5),
    (0.9, 0.5),
    (0.1, 0.9),
    (0.5, 0.9),
    (0.9, 0.9),
    (0.3, 0.3),
    (0.7, 0.3),
    (0.3, 0.7),
    (0.7, 0.7),
];

/// A calibration target placed on screen.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalibrationTarget {
    pub index: usize,
    /// Position in surface-normalized coordinates (0..1 on each axis).
    pub normalized: Point2D,
    /// Position in screen coordinates.
    pub screen: Point2D,
}

/// Ordered list of targets and the clicks each one needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationPlan {
    pub targets: Vec<Point2D>,
    pub clicks_per_target: u32,
}

impl Default for CalibrationPlan {
    fn default() -> Self {
        Self {
            targets: DEFAULT_TARGETS
                .iter()
                .map(|&(x, y)| Point2D::new(x, y))
                .collect(),
            clicks_per_target: DEFAULT_CLICKS_PER_TARGET,
        }
    }
}

impl CalibrationPlan {
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Place target `index` on `surface`.
    pub fn target_on(&self, index: usize, surface: &SurfaceRect) -> Option<CalibrationTarget> {
        let normalized = *self.targets.get(index)?;
        Some(CalibrationTarget {
            index,
            normalized,
            screen: surface.normalized_to_screen(normalized.x, normalized.y),
        })
    }

    /// Place every target on `surface`.
    pub fn screen_targets(&self, surface: &SurfaceRect) -> Vec<CalibrationTarget> {
        (0..self.targets.len())
            .filter_map(|i| self.target_on(i, surface))
            .collect()
    }

    /// Start collecting clicks.
    pub fn begin(&self) -> CalibrationRun {
        CalibrationRun {
            plan: self.clone(),
            current: 0,
            clicks: 0,
        }
    }
}

/// What a click did to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationProgress {
    /// Counted against the current target.
    Clicked { target: usize, clicks: u32 },
    /// The current target is done; `next` is shown now.
    TargetDone { target: usize, next: usize },
    /// The last target is done.
    Complete,
}

/// Click bookkeeping for one pass through a [`CalibrationPlan`].
#[derive(Debug, Clone)]
pub struct CalibrationRun {
    plan: CalibrationPlan,
    current: usize,
    clicks: u32,
}

impl CalibrationRun {
    /// Register one click on the current target.
    pub fn record_click(&mut self) -> CalibrationProgress {
        if self.is_complete() {
            return CalibrationProgress::Complete;
        }

        self.clicks += 1;
        if self.clicks < self.plan.clicks_per_target {
            return CalibrationProgress::Clicked {
                target: self.current,
                clicks: self.clicks,
            };
        }

        let finished = self.current;
        self.current += 1;
        self.clicks = 0;
        tracing::debug!(target = finished, "calibration target done");

        if self.is_complete() {
            tracing::info!(targets = self.plan.len(), "calibration complete");
            CalibrationProgress::Complete
        } else {
            CalibrationProgress::TargetDone {
                target: finished,
                next: self.current,
            }
        }
    }

    /// The target awaiting clicks, placed on `surface`.
    pub fn current_target(&self, surface: &SurfaceRect) -> Option<CalibrationTarget> {
        self.plan.target_on(self.current, surface)
    }

    /// Clicks registered on the current target so far.
    pub fn clicks_on_current(&self) -> u32 {
        self.clicks
    }

    /// Index of the target awaiting clicks.
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn is_complete(&self) -> bool {
        self.current >= self.plan.len()
    }

    pub fn plan(&self) -> &CalibrationPlan {
        &self.plan
    }
}
