//! Replay a recorded gaze stream through a tracking session.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;

use gazemap_common::clock::RateController;
use gazemap_common::config::{AppConfig, TrackingConfig};
use gazemap_gaze_model::record::GazeLogWriter;
use gazemap_gaze_model::sample::{StreamHeader, TrackingCommand};
use gazemap_gaze_model::stream::RecordedStream;
use gazemap_processing_core::replay::{ReplayStep, StreamReplay};
use gazemap_processing_core::session::GazeSession;
use gazemap_processing_core::stability::RejectReason;

/// A live point as the presentation tick would have drawn it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LiveFrame {
    pub t: f64,
    pub x: f64,
    pub y: f64,
}

pub struct ReplayReport {
    pub replay: StreamReplay,
    pub frames: Vec<LiveFrame>,
    pub samples_without_surface: usize,
}

pub fn load_stream(path: &Path) -> anyhow::Result<RecordedStream> {
    RecordedStream::load(path)
        .with_context(|| format!("Failed to load gaze stream {}", path.display()))
}

/// Apply every record, sampling the live point at `fps` on the stream's
/// own timestamps.
pub fn replay_records(stream: &RecordedStream, config: &TrackingConfig, fps: u32) -> ReplayReport {
    let mut replay = StreamReplay::new(GazeSession::new(config.clone()));
    let mut rate = RateController::new(fps);
    let mut frames = Vec::new();
    let mut samples_without_surface = 0;

    for record in &stream.records {
        match replay.apply(record) {
            ReplayStep::Sample {
                timestamp_secs: Some(t),
                ..
            } => {
                if let Some(point) = replay.session().live_frame() {
                    if rate.should_tick(t) {
                        frames.push(LiveFrame {
                            t,
                            x: point.x,
                            y: point.y,
                        });
                    }
                }
            }
            ReplayStep::NoSurface => samples_without_surface += 1,
            ReplayStep::Lifecycle(TrackingCommand::Start | TrackingCommand::Recalibrated) => {
                rate.reset();
            }
            _ => {}
        }
    }

    ReplayReport {
        replay,
        frames,
        samples_without_surface,
    }
}

pub fn run(
    config: &AppConfig,
    stream_path: PathBuf,
    gaze_log: Option<PathBuf>,
    frames_path: Option<PathBuf>,
    fps: u32,
) -> anyhow::Result<()> {
    println!("Replaying stream: {}", stream_path.display());

    let stream = load_stream(&stream_path)?;
    println!(
        "  Loaded {} records ({} samples, {:.1}s)",
        stream.records.len(),
        stream.sample_count(),
        stream.duration_secs()
    );

    let report = replay_records(&stream, &config.tracking, fps);
    let session = report.replay.session();
    let stats = session.stats();

    tracing::info!(
        accepted = stats.accepted,
        rejected = stats.rejected(),
        ignored = stats.ignored,
        "replay finished"
    );

    println!("  Accepted: {}", stats.accepted);
    println!("  Rejected: {}", stats.rejected());
    for reason in [
        RejectReason::LowConfidence,
        RejectReason::NonFinite,
        RejectReason::OutsideViewport,
        RejectReason::OffSurface,
        RejectReason::InvalidSurface,
    ] {
        let count = stats.rejected_for(reason);
        if count > 0 {
            println!("    {}: {count}", reason.as_str());
        }
    }
    if stats.ignored > 0 {
        println!("  Ignored while not tracking: {}", stats.ignored);
    }
    if report.samples_without_surface > 0 {
        println!(
            "  Skipped before any surface record: {}",
            report.samples_without_surface
        );
    }
    println!("  Heatmap points: {}", session.heatmap_log().len());

    if let Some(path) = gaze_log {
        let header = stream
            .header
            .clone()
            .unwrap_or_else(|| StreamHeader::now(None));
        let mut writer = GazeLogWriter::create(&path, &header)
            .with_context(|| format!("Failed to create gaze log {}", path.display()))?;
        writer.write_all(session.gaze_log())?;
        writer.flush()?;
        println!(
            "  Gaze log: {} ({} records)",
            path.display(),
            writer.records_written()
        );
    }

    if let Some(path) = frames_path {
        write_frames(&path, &report.frames)?;
        println!(
            "  Live frames: {} ({} at {fps} Hz)",
            path.display(),
            report.frames.len()
        );
    }

    println!("\nReplay complete.");
    Ok(())
}

fn write_frames(path: &Path, frames: &[LiveFrame]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut jsonl = String::new();
    for frame in frames {
        jsonl.push_str(&serde_json::to_string(frame)?);
        jsonl.push('\n');
    }
    std::fs::write(path, jsonl)
        .with_context(|| format!("Failed to write live frames {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("fixtures")
            .join("sample-session")
            .join("samples.jsonl")
    }

    #[test]
    fn test_live_frames_respect_display_rate() {
        let stream = load_stream(&fixture_path()).unwrap();
        let report = replay_records(&stream, &TrackingConfig::default(), 30);

        assert_eq!(report.samples_without_surface, 0);
        assert!(!report.frames.is_empty());
        assert!((report.frames.len() as u64) < report.replay.session().stats().accepted);
        for pair in report.frames.windows(2) {
            assert!(pair[1].t - pair[0].t >= 1.0 / 30.0 - 1e-9);
        }
    }

    #[test]
    fn test_missing_stream_reports_path() {
        let err = load_stream(Path::new("/nonexistent/gazemap/stream.jsonl")).unwrap_err();
        assert!(format!("{err:#}").contains("stream.jsonl"));
    }
}
