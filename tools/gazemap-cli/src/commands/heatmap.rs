//! Replay a stream and export its heatmap as a PNG.

use std::path::{Path, PathBuf};

use anyhow::Context;
use image::imageops::{self, FilterType};
use image::RgbaImage;

use gazemap_common::config::AppConfig;
use gazemap_common::error::GazemapError;
use gazemap_processing_core::heatmap::{raster_pixels, HeatmapImage, MAX_RASTER_PIXELS};

use super::replay::{load_stream, replay_records};

pub fn run(
    config: &AppConfig,
    stream_path: PathBuf,
    output: Option<PathBuf>,
    background: Option<PathBuf>,
) -> anyhow::Result<()> {
    println!("Building heatmap from: {}", stream_path.display());

    let stream = load_stream(&stream_path)?;
    let report = replay_records(&stream, &config.tracking, 60);

    let surface = report
        .replay
        .surface()
        .filter(|s| s.is_valid())
        .ok_or_else(|| GazemapError::invalid_surface("stream never declared a usable surface"))?;
    let (width, height) = surface.pixel_size();
    check_raster(width, height)?;

    let heatmap = report.replay.session().render_heatmap(width, height);
    if !heatmap.has_data() {
        tracing::warn!("no gaze points were accepted; exporting an empty heatmap");
        println!("  No gaze data yet: the heatmap is empty.");
    } else {
        println!(
            "  {} points on {}x{} (peak {:.1})",
            heatmap.point_count, width, height, heatmap.peak_intensity
        );
    }

    let mut canvas = to_rgba_image(&heatmap)?;
    if let Some(path) = &background {
        canvas = composite_over(path, &canvas)?;
        println!("  Background: {}", path.display());
    }

    let output = output.unwrap_or_else(|| default_output_path(config, &stream_path));
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    canvas
        .save(&output)
        .map_err(|e| GazemapError::export(format!("{}: {e}", output.display())))?;

    tracing::info!(path = %output.display(), "heatmap exported");
    println!("  Saved: {}", output.display());
    Ok(())
}

/// Refuse surfaces too large to rasterize.
fn check_raster(width: u32, height: u32) -> anyhow::Result<()> {
    raster_pixels(width, height).map(|_| ()).ok_or_else(|| {
        GazemapError::render(format!(
            "surface of {width}x{height} px exceeds the {MAX_RASTER_PIXELS}-pixel raster limit"
        ))
        .into()
    })
}

/// Wrap the rendered RGBA buffer in an image buffer.
pub fn to_rgba_image(heatmap: &HeatmapImage) -> anyhow::Result<RgbaImage> {
    RgbaImage::from_raw(heatmap.width, heatmap.height, heatmap.rgba.clone()).ok_or_else(|| {
        GazemapError::render(format!(
            "buffer of {} bytes does not fit {}x{}",
            heatmap.rgba.len(),
            heatmap.width,
            heatmap.height
        ))
        .into()
    })
}

/// Resize the stimulus at `path` to the heatmap size and alpha-blend the
/// heatmap over it.
pub fn composite_over(path: &Path, heatmap: &RgbaImage) -> anyhow::Result<RgbaImage> {
    let stimulus = image::open(path)
        .with_context(|| format!("Failed to open background {}", path.display()))?;
    let mut base = stimulus
        .resize_exact(heatmap.width(), heatmap.height(), FilterType::Triangle)
        .to_rgba8();
    imageops::overlay(&mut base, heatmap, 0, 0);
    Ok(base)
}

fn default_output_path(config: &AppConfig, stream_path: &Path) -> PathBuf {
    let stem = stream_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("session");
    config.output_dir.join(format!("{stem}-heatmap.png"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gazemap_gaze_model::geometry::Point2D;
    use gazemap_processing_core::heatmap::HeatmapRenderer;
    use image::Rgba;

    #[test]
    fn test_rgba_image_matches_buffer() {
        let heatmap = HeatmapRenderer::default().render(&[Point2D::new(10.0, 10.0)], 64, 48);
        let image = to_rgba_image(&heatmap).unwrap();
        assert_eq!(image.dimensions(), (64, 48));
        assert_eq!(*image.get_pixel(10, 10), Rgba([255, 0, 0, 180]));
        // About 61 px from the point, beyond the splat radius.
        assert_eq!(*image.get_pixel(60, 45), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn test_oversized_surface_is_a_render_error() {
        assert!(check_raster(1920, 1080).is_ok());

        let err = check_raster(u32::MAX, u32::MAX).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GazemapError>(),
            Some(GazemapError::Render { .. })
        ));
        assert!(check_raster(100_000, 100_000).is_err());
    }

    #[test]
    fn test_composite_keeps_background_outside_heat() {
        let dir = std::env::temp_dir().join("gazemap_test_composite");
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let bg_path = dir.join("stimulus.png");
        RgbaImage::from_pixel(8, 8, Rgba([10, 20, 30, 255]))
            .save(&bg_path)
            .unwrap();

        let heatmap = HeatmapRenderer::default().render(&[Point2D::new(2.0, 2.0)], 16, 16);
        let heat = to_rgba_image(&heatmap).unwrap();
        let out = composite_over(&bg_path, &heat).unwrap();

        assert_eq!(out.dimensions(), (16, 16));
        assert_ne!(*out.get_pixel(2, 2), Rgba([10, 20, 30, 255]));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_default_output_uses_stream_stem() {
        let config = AppConfig {
            output_dir: PathBuf::from("/tmp/gazemap-out"),
            ..AppConfig::default()
        };
        assert_eq!(
            default_output_path(&config, Path::new("runs/viewer-3.jsonl")),
            PathBuf::from("/tmp/gazemap-out/viewer-3-heatmap.png")
        );
    }
}
