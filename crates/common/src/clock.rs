//! Clock and timing utilities for live gaze sessions.
//!
//! Predictors report timestamps in their own time base and sometimes not at
//! all. A [`SessionClock`] provides a monotonic fallback in seconds, and a
//! [`RateController`] paces the presentation tick independently of the
//! sample cadence.

use std::time::Instant;

/// Monotonic clock anchored at tracking start.
#[derive(Debug, Clone)]
pub struct SessionClock {
    epoch: Instant,
}

impl SessionClock {
    /// Create a clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    /// Seconds elapsed since the clock started.
    pub fn elapsed_secs(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }

    /// Use the predictor's timestamp when it is usable, otherwise fall back
    /// to this clock.
    pub fn timestamp_or_now(&self, timestamp_secs: Option<f64>) -> f64 {
        match timestamp_secs {
            Some(t) if t.is_finite() => t,
            _ => self.elapsed_secs(),
        }
    }
}

/// Gate for a fixed-rate tick driven by timestamps in seconds.
#[derive(Debug)]
pub struct RateController {
    interval_secs: f64,
    last_tick_secs: Option<f64>,
}

impl RateController {
    /// Create a controller targeting the given Hz rate.
    pub fn new(target_hz: u32) -> Self {
        Self {
            interval_secs: 1.0 / target_hz.max(1) as f64,
            last_tick_secs: None,
        }
    }

    /// Returns true and records the tick if at least one interval has
    /// passed. The first call always returns true.
    pub fn should_tick(&mut self, now_secs: f64) -> bool {
        match self.last_tick_secs {
            None => {
                self.last_tick_secs = Some(now_secs);
                true
            }
            Some(last) if now_secs >= last + self.interval_secs => {
                self.last_tick_secs = Some(now_secs);
                true
            }
            _ => false,
        }
    }

    /// Forget the last tick so the next call fires immediately.
    pub fn reset(&mut self) {
        self.last_tick_secs = None;
    }

    /// Target interval in seconds.
    pub fn interval_secs(&self) -> f64 {
        self.interval_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_elapsed() {
        let clock = SessionClock::start();
        assert!(clock.elapsed_secs() < 1.0);
    }

    #[test]
    fn test_timestamp_fallback() {
        let clock = SessionClock::start();
        assert_eq!(clock.timestamp_or_now(Some(12.5)), 12.5);
        assert!(clock.timestamp_or_now(None) < 1.0);
        assert!(clock.timestamp_or_now(Some(f64::NAN)).is_finite());
    }

    #[test]
    fn test_rate_controller() {
        let mut ctrl = RateController::new(60);
        assert!(ctrl.should_tick(0.0));
        assert!(!ctrl.should_tick(0.001));
        assert!(ctrl.should_tick(0.017));

        ctrl.reset();
        assert!(ctrl.should_tick(0.018));
    }
}
