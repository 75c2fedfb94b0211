pub mod calibrate;
pub mod config;
pub mod heatmap;
pub mod replay;
