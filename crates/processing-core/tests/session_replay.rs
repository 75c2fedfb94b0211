use std::path::PathBuf;

use gazemap_common::config::{HeatmapTuning, TrackingConfig};
use gazemap_gaze_model::geometry::Point2D;
use gazemap_gaze_model::stream::RecordedStream;
use gazemap_processing_core::replay::StreamReplay;
use gazemap_processing_core::session::GazeSession;

fn load_fixture_stream() -> RecordedStream {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join("sample-session")
        .join("samples.jsonl");

    RecordedStream::load(path).expect("fixture stream should load")
}

fn replay_fixture(config: TrackingConfig) -> StreamReplay {
    let stream = load_fixture_stream();
    let mut replay = StreamReplay::new(GazeSession::new(config));
    let without_surface = replay.run(&stream.records);
    assert_eq!(without_surface, 0);
    replay
}

#[test]
fn fixture_replay_counts_every_sample_once() {
    let stream = load_fixture_stream();
    let replay = replay_fixture(TrackingConfig::default());
    let session = replay.session();
    let stats = session.stats();

    assert_eq!(stats.ignored, 0);
    assert_eq!(
        stats.accepted + stats.rejected(),
        stream.sample_count() as u64
    );
    assert_eq!(stats.low_confidence, 11);
    assert_eq!(stats.outside_viewport, 1);
    assert!(stats.off_surface > 0, "the glance off the surface is rejected");
    assert_eq!(stats.non_finite, 0);

    assert_eq!(session.gaze_log().len() as u64, stats.accepted);
    assert_eq!(session.heatmap_log().len() as u64, stats.accepted);
}

#[test]
fn fixture_points_stay_on_surface() {
    let replay = replay_fixture(TrackingConfig::default());
    let surface = replay.surface().expect("fixture declares a surface");

    for point in replay.session().heatmap_log().points() {
        assert!(surface.contains_local(point), "{point:?} left the surface");
    }
    assert!(!replay.session().is_tracking());
    assert_eq!(replay.session().live_frame(), None);
}

#[test]
fn fixture_heatmap_highlights_fixations() {
    let replay = replay_fixture(TrackingConfig::default());
    let (width, height) = replay.surface().expect("surface").pixel_size();
    assert_eq!((width, height), (640, 480));

    let image = replay.session().render_heatmap(width, height);
    assert!(image.has_data());

    // Long fixation and the second dwell both saturate.
    assert_eq!(image.pixel(200, 170), Some([255, 0, 0, 180]));
    assert_eq!(image.pixel(480, 340), Some([255, 0, 0, 180]));

    // Nothing was ever accepted near the corners.
    assert_eq!(image.pixel(600, 50), Some([0, 0, 0, 0]));
    assert_eq!(image.pixel(20, 20), Some([0, 0, 0, 0]));

    let (hx, hy) = image.hottest_pixel().expect("hottest pixel");
    let hottest = Point2D::new(hx as f64, hy as f64);
    assert!(
        hottest.distance_to(&Point2D::new(200.0, 170.0))
            < hottest.distance_to(&Point2D::new(480.0, 340.0))
    );

    let again = replay.session().render_heatmap(width, height);
    assert_eq!(image.rgba, again.rgba);
}

#[test]
fn fixture_decimation_keeps_every_third_point() {
    let config = TrackingConfig {
        heatmap: HeatmapTuning {
            sample_every: 3,
            ..HeatmapTuning::default()
        },
        ..TrackingConfig::default()
    };
    let replay = replay_fixture(config);
    let session = replay.session();

    let accepted = session.stats().accepted as usize;
    assert_eq!(session.gaze_log().len(), accepted);
    assert_eq!(session.heatmap_log().len(), (accepted + 2) / 3);
}

#[test]
fn fixture_stats_serialize() {
    let replay = replay_fixture(TrackingConfig::default());
    let json = serde_json::to_value(replay.session().stats()).expect("stats serialize");
    assert_eq!(json["outside_viewport"], 1);
    assert!(json["off_surface"].as_u64().unwrap_or(0) > 0);
}
