//! Viewing session state.
//!
//! A [`GazeSession`] owns everything that used to be loose process-wide
//! state in a tracking UI: the per-axis filters, the stability mapper,
//! whether tracking is on, which view is displayed, the live point and the
//! accumulated logs.
//!
//! Lifecycle:
//! - [`start_tracking`](GazeSession::start_tracking) resets continuity and
//!   starts ingesting samples.
//! - [`stop_tracking`](GazeSession::stop_tracking) stops ingestion and
//!   resets continuity. Logs are kept.
//! - [`change_surface`](GazeSession::change_surface) clears the heatmap log
//!   and returns to the live-dot view. The gaze log spans stimuli.
//!
//! Raw samples are gated before smoothing so that a rejected sample never
//! perturbs filter state.

use serde::Serialize;

use gazemap_common::clock::SessionClock;
use gazemap_common::config::TrackingConfig;
use gazemap_gaze_model::geometry::{Point2D, SurfaceRect, ViewportBounds};
use gazemap_gaze_model::record::GazeRecord;
use gazemap_gaze_model::sample::GazeSample;

use crate::gaze_smooth::GazeFilter;
use crate::heatmap::{HeatmapImage, HeatmapRenderer};
use crate::stability::{MapOutcome, RejectReason, StabilityMapper};

/// Whether samples are being ingested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingState {
    Idle,
    Tracking,
}

/// What the presentation layer shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// The live stabilized point, redrawn every tick.
    LiveDot,
    /// The accumulated heatmap.
    Heatmap,
}

/// What happened to one pushed sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleOutcome {
    /// Became the new live point (surface-local).
    Accepted(Point2D),
    Rejected(RejectReason),
    /// Tracking is off.
    Ignored,
}

/// Append-only list of surface-local points feeding the heatmap.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeatmapLog {
    points: Vec<Point2D>,
}

impl HeatmapLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, point: Point2D) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    fn clear(&mut self) {
        self.points.clear();
    }
}

/// Per-session sample counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub accepted: u64,
    pub ignored: u64,
    pub low_confidence: u64,
    pub non_finite: u64,
    pub outside_viewport: u64,
    pub off_surface: u64,
    pub invalid_surface: u64,
}

impl SessionStats {
    fn record_rejection(&mut self, reason: RejectReason) {
        let counter = match reason {
            RejectReason::LowConfidence => &mut self.low_confidence,
            RejectReason::NonFinite => &mut self.non_finite,
            RejectReason::OutsideViewport => &mut self.outside_viewport,
            RejectReason::OffSurface => &mut self.off_surface,
            RejectReason::InvalidSurface => &mut self.invalid_surface,
        };
        *counter += 1;
    }

    /// Total rejected samples across all reasons.
    pub fn rejected(&self) -> u64 {
        self.low_confidence
            + self.non_finite
            + self.outside_viewport
            + self.off_surface
            + self.invalid_surface
    }

    pub fn rejected_for(&self, reason: RejectReason) -> u64 {
        match reason {
            RejectReason::LowConfidence => self.low_confidence,
            RejectReason::NonFinite => self.non_finite,
            RejectReason::OutsideViewport => self.outside_viewport,
            RejectReason::OffSurface => self.off_surface,
            RejectReason::InvalidSurface => self.invalid_surface,
        }
    }
}

/// Owned state of one viewing session.
#[derive(Debug, Clone)]
pub struct GazeSession {
    config: TrackingConfig,
    filter: GazeFilter,
    mapper: StabilityMapper,
    renderer: HeatmapRenderer,
    clock: Option<SessionClock>,
    tracking: TrackingState,
    view: ViewMode,
    live_point: Option<Point2D>,
    heatmap_log: HeatmapLog,
    gaze_log: Vec<GazeRecord>,
    stats: SessionStats,
}

impl GazeSession {
    /// A session driven purely by sample timestamps.
    pub fn new(config: TrackingConfig) -> Self {
        Self {
            filter: GazeFilter::new(config.filter),
            mapper: StabilityMapper::new(config.stability),
            renderer: HeatmapRenderer::new(config.heatmap),
            config,
            clock: None,
            tracking: TrackingState::Idle,
            view: ViewMode::LiveDot,
            live_point: None,
            heatmap_log: HeatmapLog::new(),
            gaze_log: Vec::new(),
            stats: SessionStats::default(),
        }
    }

    /// A live session: samples without a timestamp are stamped with the
    /// clock's elapsed time.
    pub fn with_clock(config: TrackingConfig, clock: SessionClock) -> Self {
        Self {
            clock: Some(clock),
            ..Self::new(config)
        }
    }

    /// Start ingesting samples with fresh continuity state.
    pub fn start_tracking(&mut self) {
        self.reset_continuity();
        self.tracking = TrackingState::Tracking;
        tracing::info!(
            heatmap_points = self.heatmap_log.len(),
            "gaze tracking started"
        );
    }

    /// Stop ingesting samples. Logs survive.
    pub fn stop_tracking(&mut self) {
        self.reset_continuity();
        self.tracking = TrackingState::Idle;
        tracing::info!(
            accepted = self.stats.accepted,
            rejected = self.stats.rejected(),
            "gaze tracking stopped"
        );
    }

    /// Calibration finished: restart tracking so no velocity estimate from
    /// before calibration leaks into the new run.
    pub fn finish_calibration(&mut self) {
        tracing::debug!("restarting tracking after calibration");
        self.start_tracking();
    }

    /// A new stimulus replaced the surface content.
    pub fn change_surface(&mut self) {
        self.heatmap_log.clear();
        self.view = ViewMode::LiveDot;
        self.live_point = None;
        self.mapper.forget_position();
        tracing::info!(gaze_records = self.gaze_log.len(), "surface changed, heatmap cleared");
    }

    /// Feed one predictor sample, mapped against the current layout.
    pub fn push_sample(
        &mut self,
        sample: &GazeSample,
        surface: &SurfaceRect,
        viewport: &ViewportBounds,
    ) -> SampleOutcome {
        if self.tracking != TrackingState::Tracking {
            self.stats.ignored += 1;
            return SampleOutcome::Ignored;
        }

        let timestamp = match &self.clock {
            Some(clock) => Some(clock.timestamp_or_now(sample.timestamp_secs)),
            None => sample.valid_timestamp(),
        };

        let raw_check = self
            .mapper
            .check_raw(sample.x, sample.y, sample.confidence, viewport);
        if let Some(reason) = raw_check {
            return self.reject(reason);
        }

        let smoothed = self
            .filter
            .filter(Point2D::new(sample.x, sample.y), timestamp);

        match self.mapper.map(
            smoothed.x,
            smoothed.y,
            sample.confidence,
            timestamp,
            surface,
            viewport,
        ) {
            MapOutcome::Accepted(point) => {
                self.accept(timestamp, smoothed, point);
                SampleOutcome::Accepted(point)
            }
            MapOutcome::Rejected(reason) => self.reject(reason),
        }
    }

    fn accept(&mut self, timestamp: Option<f64>, smoothed: Point2D, point: Point2D) {
        self.live_point = Some(point);

        let every = self.config.heatmap.sample_every.max(1);
        if self.gaze_log.len() % every == 0 {
            self.heatmap_log.push(point);
        }
        self.gaze_log.push(GazeRecord::new(timestamp, smoothed, point));
        self.stats.accepted += 1;
    }

    fn reject(&mut self, reason: RejectReason) -> SampleOutcome {
        tracing::trace!(reason = reason.as_str(), "gaze sample rejected");
        self.stats.record_rejection(reason);
        SampleOutcome::Rejected(reason)
    }

    fn reset_continuity(&mut self) {
        self.filter.reset();
        self.mapper.reset();
        self.live_point = None;
    }

    /// The most recent accepted point, surface-local.
    pub fn live_point(&self) -> Option<Point2D> {
        self.live_point
    }

    /// The point to draw on a presentation tick: only while tracking in
    /// the live-dot view.
    pub fn live_frame(&self) -> Option<Point2D> {
        match (self.tracking, self.view) {
            (TrackingState::Tracking, ViewMode::LiveDot) => self.live_point,
            _ => None,
        }
    }

    /// Switch between the live dot and the heatmap; returns the new mode.
    pub fn toggle_view(&mut self) -> ViewMode {
        self.view = match self.view {
            ViewMode::LiveDot => ViewMode::Heatmap,
            ViewMode::Heatmap => ViewMode::LiveDot,
        };
        tracing::debug!(view = ?self.view, points = self.heatmap_log.len(), "view toggled");
        self.view
    }

    /// Render the heatmap log onto a `width × height` surface raster.
    pub fn render_heatmap(&self, width: u32, height: u32) -> HeatmapImage {
        self.renderer.render(self.heatmap_log.points(), width, height)
    }

    pub fn tracking_state(&self) -> TrackingState {
        self.tracking
    }

    pub fn is_tracking(&self) -> bool {
        self.tracking == TrackingState::Tracking
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view
    }

    pub fn heatmap_log(&self) -> &HeatmapLog {
        &self.heatmap_log
    }

    pub fn gaze_log(&self) -> &[GazeRecord] {
        &self.gaze_log
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    pub fn config(&self) -> &TrackingConfig {
        &self.config
    }
}

impl Default for GazeSession {
    fn default() -> Self {
        Self::new(TrackingConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gazemap_common::config::HeatmapTuning;

    fn surface() -> SurfaceRect {
        SurfaceRect::at_origin(800.0, 600.0)
    }

    fn viewport() -> ViewportBounds {
        ViewportBounds::new(800.0, 600.0)
    }

    fn tracking_session() -> GazeSession {
        let mut session = GazeSession::default();
        session.start_tracking();
        session
    }

    #[test]
    fn test_samples_ignored_until_tracking() {
        let mut session = GazeSession::default();
        let outcome = session.push_sample(&GazeSample::at(0.0, 10.0, 10.0), &surface(), &viewport());
        assert_eq!(outcome, SampleOutcome::Ignored);
        assert_eq!(session.stats().ignored, 1);
        assert!(session.gaze_log().is_empty());
        assert_eq!(session.live_frame(), None);
    }

    #[test]
    fn test_far_outlier_keeps_previous_live_point() {
        let mut session = tracking_session();
        let first = GazeSample::new(50.0, 50.0, 0.9, Some(0.0));
        let outlier = GazeSample::new(1000.0, 50.0, 0.9, Some(0.001));

        assert_eq!(
            session.push_sample(&first, &surface(), &viewport()),
            SampleOutcome::Accepted(Point2D::new(50.0, 50.0))
        );
        assert_eq!(
            session.push_sample(&outlier, &surface(), &viewport()),
            SampleOutcome::Rejected(RejectReason::OutsideViewport)
        );
        assert_eq!(session.live_point(), Some(Point2D::new(50.0, 50.0)));
        assert_eq!(session.heatmap_log().len(), 1);
        assert_eq!(session.stats().outside_viewport, 1);
    }

    #[test]
    fn test_rejected_raw_sample_does_not_touch_filter() {
        let mut gated = tracking_session();
        let mut clean = tracking_session();

        gated.push_sample(&GazeSample::at(0.0, 100.0, 100.0), &surface(), &viewport());
        clean.push_sample(&GazeSample::at(0.0, 100.0, 100.0), &surface(), &viewport());

        gated.push_sample(
            &GazeSample::new(700.0, 500.0, 0.2, Some(0.01)),
            &surface(),
            &viewport(),
        );

        let next = GazeSample::at(0.02, 110.0, 100.0);
        assert_eq!(
            gated.push_sample(&next, &surface(), &viewport()),
            clean.push_sample(&next, &surface(), &viewport())
        );
        assert_eq!(gated.stats().low_confidence, 1);
    }

    #[test]
    fn test_off_surface_never_logs() {
        let mut session = tracking_session();
        let small = SurfaceRect::new(100.0, 100.0, 200.0, 200.0);

        session.push_sample(&GazeSample::at(0.0, 150.0, 150.0), &small, &viewport());
        let outcome = session.push_sample(&GazeSample::at(0.5, 600.0, 500.0), &small, &viewport());

        assert!(matches!(outcome, SampleOutcome::Rejected(RejectReason::OffSurface)));
        assert_eq!(session.heatmap_log().len(), 1);
        assert_eq!(session.gaze_log().len(), 1);
        assert_eq!(session.live_point(), Some(Point2D::new(50.0, 50.0)));
    }

    #[test]
    fn test_heatmap_decimation() {
        let config = TrackingConfig {
            heatmap: HeatmapTuning {
                sample_every: 3,
                ..HeatmapTuning::default()
            },
            ..TrackingConfig::default()
        };
        let mut session = GazeSession::new(config);
        session.start_tracking();

        for i in 0..7 {
            session.push_sample(
                &GazeSample::at(i as f64 * 0.016, 200.0, 200.0),
                &surface(),
                &viewport(),
            );
        }
        assert_eq!(session.gaze_log().len(), 7);
        // Log lengths 0, 3 and 6 at push time.
        assert_eq!(session.heatmap_log().len(), 3);
    }

    #[test]
    fn test_gaze_record_fields() {
        let mut session = tracking_session();
        let shifted = SurfaceRect::new(100.0, 50.0, 400.0, 400.0);
        session.push_sample(&GazeSample::at(1.5, 300.0, 250.0), &shifted, &viewport());

        let record = session.gaze_log()[0];
        assert_eq!(record.t, Some(1.5));
        assert_eq!((record.gx, record.gy), (300.0, 250.0));
        assert_eq!((record.ix, record.iy), (200.0, 200.0));
    }

    #[test]
    fn test_stop_resets_continuity_and_keeps_logs() {
        let mut session = tracking_session();
        session.push_sample(&GazeSample::at(0.0, 100.0, 100.0), &surface(), &viewport());
        session.stop_tracking();

        assert!(!session.is_tracking());
        assert_eq!(session.live_point(), None);
        assert_eq!(session.heatmap_log().len(), 1);

        // First sample after restart passes straight through.
        session.start_tracking();
        assert_eq!(
            session.push_sample(&GazeSample::at(10.0, 500.0, 400.0), &surface(), &viewport()),
            SampleOutcome::Accepted(Point2D::new(500.0, 400.0))
        );
    }

    #[test]
    fn test_finish_calibration_restarts_tracking() {
        let mut session = GazeSession::default();
        session.finish_calibration();
        assert!(session.is_tracking());
        assert_eq!(
            session.push_sample(&GazeSample::at(0.0, 320.0, 240.0), &surface(), &viewport()),
            SampleOutcome::Accepted(Point2D::new(320.0, 240.0))
        );
    }

    #[test]
    fn test_change_surface_clears_heatmap_and_view() {
        let mut session = tracking_session();
        session.push_sample(&GazeSample::at(0.0, 100.0, 100.0), &surface(), &viewport());
        session.toggle_view();
        assert_eq!(session.view_mode(), ViewMode::Heatmap);

        session.change_surface();
        assert!(session.heatmap_log().is_empty());
        assert_eq!(session.gaze_log().len(), 1);
        assert_eq!(session.view_mode(), ViewMode::LiveDot);
        assert_eq!(session.live_frame(), None);
        assert!(session.is_tracking());
        assert!(!session.render_heatmap(100, 100).has_data());
    }

    #[test]
    fn test_gaze_log_spans_surface_changes() {
        let config = TrackingConfig {
            heatmap: HeatmapTuning {
                sample_every: 3,
                ..HeatmapTuning::default()
            },
            ..TrackingConfig::default()
        };
        let mut session = GazeSession::new(config);
        session.start_tracking();
        for i in 0..4 {
            session.push_sample(
                &GazeSample::at(i as f64 * 0.016, 200.0, 200.0),
                &surface(),
                &viewport(),
            );
        }
        assert_eq!(session.heatmap_log().len(), 2);

        session.change_surface();
        assert_eq!(session.gaze_log().len(), 4);

        // Decimation keys off the gaze log, so it picks up at length 6.
        for i in 4..7 {
            session.push_sample(
                &GazeSample::at(i as f64 * 0.016, 300.0, 250.0),
                &surface(),
                &viewport(),
            );
        }
        assert_eq!(session.gaze_log().len(), 7);
        assert_eq!(session.heatmap_log().len(), 1);
    }

    #[test]
    fn test_live_frame_follows_view_mode() {
        let mut session = tracking_session();
        session.push_sample(&GazeSample::at(0.0, 100.0, 100.0), &surface(), &viewport());
        assert_eq!(session.live_frame(), Some(Point2D::new(100.0, 100.0)));

        assert_eq!(session.toggle_view(), ViewMode::Heatmap);
        assert_eq!(session.live_frame(), None);
        assert_eq!(session.toggle_view(), ViewMode::LiveDot);
        assert!(session.live_frame().is_some());
    }

    #[test]
    fn test_render_heatmap_from_log() {
        let mut session = tracking_session();
        session.push_sample(&GazeSample::at(0.0, 100.0, 100.0), &surface(), &viewport());
        let image = session.render_heatmap(200, 200);
        assert!(image.has_data());
        assert_eq!(image.pixel(100, 100), Some([255, 0, 0, 180]));
    }

    #[test]
    fn test_clock_stamps_missing_timestamps() {
        let mut session = GazeSession::with_clock(TrackingConfig::default(), SessionClock::start());
        session.start_tracking();
        session.push_sample(&GazeSample::new(10.0, 10.0, 1.0, None), &surface(), &viewport());
        assert!(session.gaze_log()[0].t.is_some());
        session.push_sample(
            &GazeSample::new(12.0, 10.0, 1.0, Some(f64::NAN)),
            &surface(),
            &viewport(),
        );
        assert!(session.gaze_log()[1].t.is_some_and(f64::is_finite));
        session.push_sample(&GazeSample::new(14.0, 10.0, 1.0, Some(42.0)), &surface(), &viewport());
        assert_eq!(session.gaze_log()[2].t, Some(42.0));

        let mut pure = tracking_session();
        pure.push_sample(&GazeSample::new(10.0, 10.0, 1.0, None), &surface(), &viewport());
        assert_eq!(pure.gaze_log()[0].t, None);
    }

    #[test]
    fn test_stats_totals() {
        let mut session = tracking_session();
        session.push_sample(&GazeSample::new(f64::NAN, 1.0, 1.0, Some(0.0)), &surface(), &viewport());
        session.push_sample(&GazeSample::new(1.0, 1.0, 0.1, Some(0.1)), &surface(), &viewport());
        session.push_sample(&GazeSample::at(0.2, 1.0, 1.0), &SurfaceRect::at_origin(0.0, 0.0), &viewport());

        let stats = session.stats();
        assert_eq!(stats.rejected(), 3);
        assert_eq!(stats.rejected_for(RejectReason::NonFinite), 1);
        assert_eq!(stats.rejected_for(RejectReason::LowConfidence), 1);
        assert_eq!(stats.rejected_for(RejectReason::InvalidSurface), 1);
        assert_eq!(stats.accepted, 0);
    }
}
