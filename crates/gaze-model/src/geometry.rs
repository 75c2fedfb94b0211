//! Points and rectangles for mapping gaze onto the viewed surface.
//!
//! Unlike normalized capture coordinates, everything here is in pixels:
//! the surface rectangle is reported by the presentation layer in screen
//! space, and mapped points are local to that rectangle.

use serde::{Deserialize, Serialize};

/// A 2D point in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance_to(&self, other: &Point2D) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    /// The point `distance` away from `self` in the direction of `target`.
    ///
    /// Returns `self` unchanged when the two points coincide.
    pub fn step_toward(&self, target: &Point2D, distance: f64) -> Point2D {
        let span = self.distance_to(target);
        if span <= 0.0 {
            return *self;
        }
        let scale = distance / span;
        Point2D {
            x: self.x + (target.x - self.x) * scale,
            y: self.y + (target.y - self.y) * scale,
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// On-screen placement of the surface being looked at (an image, a canvas).
///
/// Layout can change between samples, so callers query this fresh for
/// every mapping call instead of caching it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceRect {
    /// Left edge in screen pixels.
    pub left: f64,
    /// Top edge in screen pixels.
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl SurfaceRect {
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// A surface anchored at the screen origin.
    pub fn at_origin(width: f64, height: f64) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// Whether the rectangle can receive gaze at all.
    pub fn is_valid(&self) -> bool {
        self.left.is_finite()
            && self.top.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }

    /// Translate a screen point into surface-local coordinates.
    ///
    /// No bounds check; see [`SurfaceRect::contains_local`].
    pub fn to_local(&self, screen_x: f64, screen_y: f64) -> Point2D {
        Point2D::new(screen_x - self.left, screen_y - self.top)
    }

    /// Inclusive bounds test for a surface-local point.
    pub fn contains_local(&self, point: &Point2D) -> bool {
        point.x >= 0.0 && point.y >= 0.0 && point.x <= self.width && point.y <= self.height
    }

    /// Screen position of a point given as fractions of the surface size.
    pub fn normalized_to_screen(&self, nx: f64, ny: f64) -> Point2D {
        Point2D::new(self.left + nx * self.width, self.top + ny * self.height)
    }

    /// Pixel dimensions of a raster covering the surface.
    pub fn pixel_size(&self) -> (u32, u32) {
        (
            self.width.max(0.0).round() as u32,
            self.height.max(0.0).round() as u32,
        )
    }
}

/// Size of the whole visible screen area, used to spot gross tracker failures.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportBounds {
    pub width: f64,
    pub height: f64,
}

impl ViewportBounds {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether a screen point lies within the viewport grown by `margin`
    /// on every side.
    pub fn admits(&self, x: f64, y: f64, margin: f64) -> bool {
        x >= -margin && x <= self.width + margin && y >= -margin && y <= self.height + margin
    }
}
