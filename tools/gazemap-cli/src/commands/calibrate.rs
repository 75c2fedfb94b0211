//! Print calibration targets for a surface.

use gazemap_common::error::GazemapError;
use gazemap_gaze_model::geometry::SurfaceRect;
use gazemap_processing_core::calibration::CalibrationPlan;

pub fn run(left: f64, top: f64, width: f64, height: f64, json: bool) -> anyhow::Result<()> {
    let surface = SurfaceRect::new(left, top, width, height);
    if !surface.is_valid() {
        return Err(GazemapError::invalid_surface(format!(
            "{width}x{height} at ({left}, {top}) has no usable area"
        ))
        .into());
    }

    let plan = CalibrationPlan::default();
    let targets = plan.screen_targets(&surface);

    if json {
        println!("{}", serde_json::to_string_pretty(&targets)?);
        return Ok(());
    }

    println!(
        "Calibration: {} targets, {} clicks each",
        plan.len(),
        plan.clicks_per_target
    );
    for target in &targets {
        println!(
            "  {:>2}. ({:>3.0}%, {:>3.0}%) -> ({:.0}, {:.0})",
            target.index + 1,
            target.normalized.x * 100.0,
            target.normalized.y * 100.0,
            target.screen.x,
            target.screen.y
        );
    }
    Ok(())
}
