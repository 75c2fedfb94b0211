//! Gazemap Processing Core
//!
//! Turns a noisy, irregular stream of predictor samples into:
//! - **Smoothing:** Speed-adaptive per-axis low-pass filtering
//! - **Stability:** Outlier gating, surface mapping and jump clamping
//! - **Heatmaps:** Gaussian density accumulation and color encoding
//! - **Sessions:** Tracking lifecycle, live point, and accumulated logs
//! - **Calibration:** Target layout and click bookkeeping
//! - **Replay:** Driving a session from a recorded stream
//!
//! This crate is pure computation with no I/O and no platform dependencies.
//! All inputs are data; all outputs are data.

pub mod calibration;
pub mod gaze_smooth;
pub mod heatmap;
pub mod replay;
pub mod session;
pub mod stability;

pub use calibration::{CalibrationPlan, CalibrationRun};
pub use gaze_smooth::{AdaptiveFilter, GazeFilter};
pub use heatmap::{HeatmapImage, HeatmapRenderer};
pub use replay::StreamReplay;
pub use session::GazeSession;
pub use stability::StabilityMapper;
