use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::color::Rgba;

/// Empirically chosen scene constants. The defaults reproduce the original
/// look; a JSON file passed via `--tuning` may override any subset of fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Tuning {
    // Proportional anchors.
    pub top_y_fraction: f32,
    pub base_y_fraction: f32,
    pub base_half_width_fraction: f32,

    // Layer taper.
    pub layer_width_divisor: u32,
    pub layer_count_min: u32,
    pub layer_count_max: u32,
    pub layer_overlap: f32,
    pub taper_exponent: f32,

    // Placement bias and silhouette safety margins.
    pub ornament_bias_exponent: f32,
    pub needle_bias_exponent: f32,
    pub ornament_safety: f32,
    pub needle_safety: f32,
    pub needle_min_half_width: f32,

    // Element count formulas: count = clamp(measure / divisor, min, max).
    pub ornament_area_divisor: u32,
    pub ornament_count_min: usize,
    pub ornament_count_max: usize,
    pub snow_width_divisor: u32,
    pub snow_count_min: usize,
    pub snow_count_max: usize,
    pub needle_area_divisor: u32,
    pub needle_count_min: usize,
    pub needle_count_max: usize,

    // Per-element draw ranges.
    pub ornament_radius_min: u32,
    pub ornament_radius_max: u32,
    pub snow_speed_min: f32,
    pub snow_speed_max: f32,
    pub snow_drift_max: f32,
    pub snow_radius_min: u32,
    pub snow_radius_max: u32,
    pub needle_length_min: f32,
    pub needle_length_max: f32,
    pub needle_jitter: f32,
    pub needle_brightness_min: i32,
    pub needle_brightness_max: i32,

    // Garland wave and bead chase.
    pub garland_row_fraction: f32,
    pub garland_wave_amplitude: f32,
    pub garland_wave_speed: f32,
    pub garland_layer_phase: f32,
    pub garland_segments: u32,
    pub garland_bead_spacing: u32,

    // Star and trunk proportions.
    pub star_outer_fraction: f32,
    pub star_inner_fraction: f32,
    pub star_lift_fraction: f32,
    pub trunk_width_fraction: f32,
    pub trunk_height_fraction: f32,

    // Colors.
    pub palette: [Rgba; 6],
    pub tree_green: Rgba,
    pub tree_outline: Rgba,
    pub needle_green: Rgba,
    pub needle_alpha: u8,
    pub garland_gold: Rgba,
    pub star_gold: Rgba,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            top_y_fraction: 0.10,
            base_y_fraction: 0.80,
            base_half_width_fraction: 0.28,

            layer_width_divisor: 70,
            layer_count_min: 5,
            layer_count_max: 9,
            layer_overlap: 0.65,
            taper_exponent: 1.25,

            ornament_bias_exponent: 0.70,
            needle_bias_exponent: 0.85,
            ornament_safety: 0.95,
            needle_safety: 0.92,
            needle_min_half_width: 6.0,

            ornament_area_divisor: 25_000,
            ornament_count_min: 35,
            ornament_count_max: 140,
            snow_width_divisor: 8,
            snow_count_min: 60,
            snow_count_max: 220,
            needle_area_divisor: 900,
            needle_count_min: 300,
            needle_count_max: 2_000,

            ornament_radius_min: 4,
            ornament_radius_max: 9,
            snow_speed_min: 0.5,
            snow_speed_max: 1.8,
            snow_drift_max: 0.3,
            snow_radius_min: 1,
            snow_radius_max: 3,
            needle_length_min: 2.5,
            needle_length_max: 6.5,
            needle_jitter: 1.4,
            needle_brightness_min: -22,
            needle_brightness_max: 26,

            garland_row_fraction: 0.60,
            garland_wave_amplitude: 0.07,
            garland_wave_speed: 0.10,
            garland_layer_phase: 0.8,
            garland_segments: 24,
            garland_bead_spacing: 3,

            star_outer_fraction: 0.035,
            star_inner_fraction: 0.017,
            star_lift_fraction: 0.02,
            trunk_width_fraction: 0.06,
            trunk_height_fraction: 0.10,

            palette: [
                Rgba::rgb(255, 60, 60),   // red
                Rgba::rgb(60, 220, 80),   // green
                Rgba::rgb(255, 210, 60),  // gold
                Rgba::rgb(80, 160, 255),  // blue
                Rgba::rgb(255, 120, 240), // pink
                Rgba::rgb(255, 255, 255), // white
            ],
            tree_green: Rgba::rgb(8, 120, 45),
            tree_outline: Rgba::rgb(5, 80, 30),
            needle_green: Rgba::rgb(24, 130, 54),
            needle_alpha: 220,
            garland_gold: Rgba::rgba(255, 210, 80, 230),
            star_gold: Rgba::rgb(255, 215, 60),
        }
    }
}

impl Tuning {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read(path)
            .with_context(|| format!("failed to read tuning file {}", path.display()))?;
        let tuning: Self = serde_json::from_slice(&raw)
            .with_context(|| format!("failed to parse tuning file {}", path.display()))?;
        tuning.validate()?;
        Ok(tuning)
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.top_y_fraction < self.base_y_fraction,
            "tree top fraction {} must sit above base fraction {}",
            self.top_y_fraction,
            self.base_y_fraction
        );
        anyhow::ensure!(
            self.layer_count_min >= 1 && self.layer_count_min <= self.layer_count_max,
            "layer count band [{}, {}] is empty",
            self.layer_count_min,
            self.layer_count_max
        );
        anyhow::ensure!(
            self.layer_width_divisor > 0,
            "layer width divisor must be positive"
        );
        anyhow::ensure!(
            self.ornament_radius_min <= self.ornament_radius_max
                && self.snow_radius_min <= self.snow_radius_max,
            "radius draw ranges must be non-empty"
        );
        anyhow::ensure!(self.garland_segments > 0, "garland needs at least one segment");
        Ok(())
    }
}
