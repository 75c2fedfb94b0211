//! Gazemap Gaze Model
//!
//! Defines the data contracts shared by the processing core and its
//! collaborators:
//! - **Samples:** Raw predictor output `(x, y, confidence, t)`
//! - **Geometry:** Points, the target surface rectangle, viewport bounds
//! - **Streams:** Recorded JSONL sessions mixing samples and layout changes
//! - **Records:** The per-sample gaze log kept for export
//!
//! Screen coordinates are in the presentation layer's pixel space;
//! surface-local coordinates have their origin at the surface's top-left.

pub mod geometry;
pub mod record;
pub mod sample;
pub mod stream;

pub use geometry::*;
pub use record::*;
pub use sample::*;
pub use stream::*;
