//! Drive a [`GazeSession`] from recorded stream records.
//!
//! Layout records update the geometry that later samples are mapped
//! against; lifecycle records call the matching session transition.

use gazemap_gaze_model::geometry::{SurfaceRect, ViewportBounds};
use gazemap_gaze_model::sample::{StreamRecord, TrackingCommand};

use crate::session::{GazeSession, SampleOutcome};

/// What applying one record did.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplayStep {
    /// A gaze sample went through the session.
    Sample {
        timestamp_secs: Option<f64>,
        outcome: SampleOutcome,
    },
    /// A gaze sample arrived before any surface geometry.
    NoSurface,
    /// Surface or viewport geometry changed.
    Layout,
    /// Tracking started, stopped or restarted after calibration.
    Lifecycle(TrackingCommand),
    /// A new stimulus was loaded.
    Stimulus(String),
}

/// Applies stream records to a session in order.
#[derive(Debug, Clone)]
pub struct StreamReplay {
    session: GazeSession,
    surface: Option<SurfaceRect>,
    viewport: Option<ViewportBounds>,
}

impl StreamReplay {
    pub fn new(session: GazeSession) -> Self {
        Self {
            session,
            surface: None,
            viewport: None,
        }
    }

    pub fn apply(&mut self, record: &StreamRecord) -> ReplayStep {
        match record {
            StreamRecord::Gaze(sample) => {
                let Some(surface) = self.surface else {
                    return ReplayStep::NoSurface;
                };
                let viewport = self.viewport.unwrap_or_else(|| covering_viewport(&surface));
                ReplayStep::Sample {
                    timestamp_secs: sample.valid_timestamp(),
                    outcome: self.session.push_sample(sample, &surface, &viewport),
                }
            }
            StreamRecord::Surface(surface) => {
                tracing::debug!(?surface, "surface layout changed");
                self.surface = Some(*surface);
                ReplayStep::Layout
            }
            StreamRecord::Viewport(viewport) => {
                self.viewport = Some(*viewport);
                ReplayStep::Layout
            }
            StreamRecord::Tracking { state } => {
                match state {
                    TrackingCommand::Start => self.session.start_tracking(),
                    TrackingCommand::Stop => self.session.stop_tracking(),
                    TrackingCommand::Recalibrated => self.session.finish_calibration(),
                }
                ReplayStep::Lifecycle(*state)
            }
            StreamRecord::Stimulus { name } => {
                tracing::info!(stimulus = %name, "stimulus loaded");
                self.session.change_surface();
                ReplayStep::Stimulus(name.clone())
            }
        }
    }

    /// Apply every record, returning how many samples arrived without a
    /// surface.
    pub fn run<'a>(&mut self, records: impl IntoIterator<Item = &'a StreamRecord>) -> usize {
        records
            .into_iter()
            .filter(|record| self.apply(record) == ReplayStep::NoSurface)
            .count()
    }

    /// Most recent surface geometry.
    pub fn surface(&self) -> Option<SurfaceRect> {
        self.surface
    }

    pub fn session(&self) -> &GazeSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut GazeSession {
        &mut self.session
    }

    pub fn into_session(self) -> GazeSession {
        self.session
    }
}

/// Viewport assumed when a stream never reported one: just large enough
/// to contain the surface.
fn covering_viewport(surface: &SurfaceRect) -> ViewportBounds {
    ViewportBounds::new(
        (surface.left + surface.width).max(0.0),
        (surface.top + surface.height).max(0.0),
    )
}
