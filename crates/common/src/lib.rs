//! Gazemap Common Utilities
//!
//! Shared infrastructure for all Gazemap crates:
//! - Error types and result aliases
//! - Session clock and presentation-rate utilities
//! - Tracing/logging initialization
//! - Configuration loading, including every tracking tunable

pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::*;
pub use config::*;
pub use error::*;
