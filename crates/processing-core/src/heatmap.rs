//! Gaze density heatmaps.
//!
//! Every render rebuilds the intensity grid from the full point log, so a
//! heatmap is a pure function of `(points, width, height, tuning)`.
//!
//! Each point splats a Gaussian of fixed radius `R` into a per-pixel grid,
//! visiting only its clipped `2R × 2R` box. The grid is normalized by its
//! peak and colored through a blue → cyan → green → yellow → red ramp with
//! alpha proportional to intensity.

use gazemap_common::config::HeatmapTuning;
use gazemap_gaze_model::geometry::Point2D;

/// Largest raster, in pixels, a heatmap is rendered onto.
pub const MAX_RASTER_PIXELS: usize = 8192 * 8192;

/// Pixel count of a `width × height` raster, or `None` when the product
/// overflows or exceeds [`MAX_RASTER_PIXELS`].
pub fn raster_pixels(width: u32, height: u32) -> Option<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .filter(|&pixels| pixels <= MAX_RASTER_PIXELS)
}

/// Dense per-pixel accumulator, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityGrid {
    width: usize,
    height: usize,
    cells: Vec<f64>,
}

impl IntensityGrid {
    /// A zeroed grid.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![0.0; width * height],
        }
    }

    /// Build a grid by splatting every point.
    pub fn accumulate(
        points: &[Point2D],
        width: usize,
        height: usize,
        tuning: &HeatmapTuning,
    ) -> Self {
        let mut grid = Self::new(width, height);
        for point in points {
            grid.splat(point, tuning);
        }
        grid
    }

    /// Add one Gaussian contribution centered on `point`.
    pub fn splat(&mut self, point: &Point2D, tuning: &HeatmapTuning) {
        if !point.is_finite() || self.cells.is_empty() {
            return;
        }

        let radius = tuning.radius;
        let radius_sq = radius * radius;
        let two_radius_sq = 2.0 * radius_sq;

        let (x_start, x_end) = clipped_span(point.x, radius, self.width);
        let (y_start, y_end) = clipped_span(point.y, radius, self.height);

        for py in y_start..y_end {
            let dy = py as f64 - point.y;
            let row = py * self.width;
            for px in x_start..x_end {
                let dx = px as f64 - point.x;
                let distance_sq = dx * dx + dy * dy;
                if distance_sq >= radius_sq {
                    continue;
                }
                let contribution = tuning.max_intensity * (-distance_sq / two_radius_sq).exp();
                let cell = &mut self.cells[row + px];
                *cell = (*cell + contribution).min(tuning.cell_ceiling);
            }
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn value(&self, x: usize, y: usize) -> Option<f64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.cells[y * self.width + x])
    }

    /// Largest accumulated value, 0.0 for an untouched grid.
    pub fn max_value(&self) -> f64 {
        self.cells.iter().copied().fold(0.0_f64, f64::max)
    }

    /// Denominator used for normalization: the peak, or 1.0 when the grid
    /// is all zero.
    pub fn normalization_peak(&self) -> f64 {
        let peak = self.max_value();
        if peak > 0.0 {
            peak
        } else {
            1.0
        }
    }

    pub fn normalized(&self, x: usize, y: usize) -> Option<f64> {
        Some(self.value(x, y)? / self.normalization_peak())
    }

    /// Row-major cell values.
    pub fn cells(&self) -> &[f64] {
        &self.cells
    }

    /// Coordinates of the largest non-zero cell, first in row-major order
    /// on ties.
    pub fn peak_cell(&self) -> Option<(usize, usize)> {
        let mut best: Option<(usize, f64)> = None;
        for (i, &value) in self.cells.iter().enumerate() {
            if value > 0.0 && best.map_or(true, |(_, b)| value > b) {
                best = Some((i, value));
            }
        }
        best.map(|(i, _)| (i % self.width, i / self.width))
    }
}

/// Pixel range `[round(c - r), round(c + r))` clipped to `[0, len)`.
fn clipped_span(center: f64, radius: f64, len: usize) -> (usize, usize) {
    let start = (center - radius).round().max(0.0);
    let end = (center + radius).round().min(len as f64);
    if end <= start {
        return (0, 0);
    }
    (start as usize, end as usize)
}

/// Map a normalized intensity in `[0, 1]` to RGBA.
///
/// Four linear segments, each moving one channel:
/// blue → cyan → green → yellow → red. Alpha is `n · alpha_ceiling`.
pub fn ramp_color(normalized: f64, alpha_ceiling: f64) -> [u8; 4] {
    let n = normalized.clamp(0.0, 1.0);
    let (r, g, b) = if n < 0.25 {
        (0.0, n / 0.25 * 255.0, 255.0)
    } else if n < 0.5 {
        (0.0, 255.0, 255.0 * (1.0 - (n - 0.25) / 0.25))
    } else if n < 0.75 {
        ((n - 0.5) / 0.25 * 255.0, 255.0, 0.0)
    } else {
        (255.0, 255.0 * (1.0 - (n - 0.75) / 0.25), 0.0)
    };
    [
        channel(r),
        channel(g),
        channel(b),
        channel(n * alpha_ceiling),
    ]
}

fn channel(value: f64) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}

/// A rendered heatmap: RGBA, row-major, 4 bytes per pixel.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    /// Number of log points that went into the render.
    pub point_count: usize,
    /// Peak grid value before normalization (0.0 when empty).
    pub peak_intensity: f64,
    /// Pixel holding the peak grid value.
    pub hottest: Option<(u32, u32)>,
}

impl HeatmapImage {
    /// A fully transparent image.
    pub fn transparent(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rgba: vec![0; width as usize * height as usize * 4],
            point_count: 0,
            peak_intensity: 0.0,
            hottest: None,
        }
    }

    /// False for the "no data yet" state.
    pub fn has_data(&self) -> bool {
        self.point_count > 0
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.rgba[i],
            self.rgba[i + 1],
            self.rgba[i + 2],
            self.rgba[i + 3],
        ])
    }

    /// Number of pixels with non-zero alpha.
    pub fn covered_pixels(&self) -> usize {
        self.rgba.chunks_exact(4).filter(|px| px[3] > 0).count()
    }

    pub fn hottest_pixel(&self) -> Option<(u32, u32)> {
        self.hottest
    }
}

/// Renders point logs into heatmap images.
#[derive(Debug, Clone, Default)]
pub struct HeatmapRenderer {
    tuning: HeatmapTuning,
}

impl HeatmapRenderer {
    pub fn new(tuning: HeatmapTuning) -> Self {
        Self { tuning }
    }

    /// Render `points` onto a `width × height` raster.
    ///
    /// An empty log yields a transparent image whose
    /// [`has_data`](HeatmapImage::has_data) is false. Callers sizing the
    /// raster from untrusted geometry check it with [`raster_pixels`] first.
    pub fn render(&self, points: &[Point2D], width: u32, height: u32) -> HeatmapImage {
        if points.is_empty() || width == 0 || height == 0 {
            tracing::debug!(points = points.len(), width, height, "empty heatmap");
            let mut image = HeatmapImage::transparent(width, height);
            image.point_count = points.len();
            return image;
        }

        let grid = IntensityGrid::accumulate(points, width as usize, height as usize, &self.tuning);
        let peak = grid.normalization_peak();

        let mut rgba = vec![0u8; grid.cells().len() * 4];
        for (value, px) in grid.cells().iter().zip(rgba.chunks_exact_mut(4)) {
            let normalized = value / peak;
            if normalized <= self.tuning.visual_floor {
                continue;
            }
            px.copy_from_slice(&ramp_color(normalized, self.tuning.alpha_ceiling));
        }

        tracing::debug!(
            points = points.len(),
            width,
            height,
            peak = grid.max_value(),
            "rendered heatmap"
        );

        HeatmapImage {
            width,
            height,
            rgba,
            point_count: points.len(),
            peak_intensity: grid.max_value(),
            hottest: grid.peak_cell().map(|(x, y)| (x as u32, y as u32)),
        }
    }

    pub fn tuning(&self) -> &HeatmapTuning {
        &self.tuning
    }
}
