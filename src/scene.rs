use rand::Rng;

use crate::color::Rgba;
use crate::layout::{TreeLayout, Viewport};
use crate::tuning::Tuning;

/// A bauble hung inside the silhouette. `on` selects which of its two colors
/// the adapters draw; the stepper toggles it in place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ornament {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
    pub color_a: Rgba,
    pub color_b: Rgba,
    pub on: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snowflake {
    pub x: f32,
    pub y: f32,
    pub speed: f32,
    pub drift: f32,
    pub radius: f32,
}

/// Short static stroke texturing the boughs; immutable once generated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NeedleStroke {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub color: Rgba,
}

/// All generated collections for one viewport. Replaced wholesale on
/// regeneration, mutated in place by the stepper in between.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    pub ornaments: Vec<Ornament>,
    pub needles: Vec<NeedleStroke>,
    pub snowflakes: Vec<Snowflake>,
}

impl Scene {
    pub fn generate<R: Rng>(layout: &TreeLayout, tuning: &Tuning, rng: &mut R) -> Self {
        let viewport = layout.viewport();
        Self {
            ornaments: generate_ornaments(layout, tuning, rng),
            needles: generate_needles(layout, tuning, rng),
            snowflakes: generate_snowflakes(viewport, tuning, rng),
        }
    }
}

/// count = clamp(measure / divisor, min, max); a non-positive result is an
/// empty collection, never an error.
fn scaled_count(measure: f32, divisor: u32, min: usize, max: usize) -> usize {
    if divisor == 0 {
        return min.min(max);
    }
    ((measure / divisor as f32) as usize).clamp(min.min(max), max)
}

pub fn ornament_count(viewport: Viewport, tuning: &Tuning) -> usize {
    scaled_count(
        viewport.area(),
        tuning.ornament_area_divisor,
        tuning.ornament_count_min,
        tuning.ornament_count_max,
    )
}

pub fn snowflake_count(viewport: Viewport, tuning: &Tuning) -> usize {
    scaled_count(
        viewport.width,
        tuning.snow_width_divisor,
        tuning.snow_count_min,
        tuning.snow_count_max,
    )
}

pub fn needle_count(viewport: Viewport, tuning: &Tuning) -> usize {
    scaled_count(
        viewport.area(),
        tuning.needle_area_divisor,
        tuning.needle_count_min,
        tuning.needle_count_max,
    )
}

/// Draws a normalized tree height with a power-law placement bias.
fn biased_height<R: Rng>(rng: &mut R, exponent: f32) -> f32 {
    rng.gen_range(0.0_f32..1.0).powf(exponent)
}

fn generate_ornaments<R: Rng>(
    layout: &TreeLayout,
    tuning: &Tuning,
    rng: &mut R,
) -> Vec<Ornament> {
    debug_assert!(tuning.ornament_radius_min <= tuning.ornament_radius_max);
    let count = ornament_count(layout.viewport(), tuning);
    let span = layout.base_y() - layout.top_y();

    let mut ornaments = Vec::with_capacity(count);
    for _ in 0..count {
        let t = biased_height(rng, tuning.ornament_bias_exponent);
        let y = layout.top_y() + t * span;
        let half_w = layout.half_width_at(y) * tuning.ornament_safety;
        let x = layout.center_x() + rng.gen_range(-half_w..=half_w);

        ornaments.push(Ornament {
            x,
            y,
            radius: rng.gen_range(tuning.ornament_radius_min..=tuning.ornament_radius_max) as f32,
            color_a: tuning.palette[rng.gen_range(0..tuning.palette.len())],
            color_b: tuning.palette[rng.gen_range(0..tuning.palette.len())],
            on: rng.gen_bool(0.5),
        });
    }
    ornaments
}

fn generate_needles<R: Rng>(
    layout: &TreeLayout,
    tuning: &Tuning,
    rng: &mut R,
) -> Vec<NeedleStroke> {
    let count = needle_count(layout.viewport(), tuning);
    let span = layout.base_y() - layout.top_y();

    let mut needles = Vec::with_capacity(count);
    for _ in 0..count {
        let t = biased_height(rng, tuning.needle_bias_exponent);
        let y = layout.top_y() + t * span;
        let half_w = layout.half_width_at(y);
        // Too narrow to carry a visible stroke; the draw is dropped, not retried.
        if half_w < tuning.needle_min_half_width {
            continue;
        }

        let reach = half_w * tuning.needle_safety;
        let x = layout.center_x() + rng.gen_range(-reach..=reach);
        let direction = if x >= layout.center_x() { 1.0 } else { -1.0 };
        let length = rng.gen_range(tuning.needle_length_min..=tuning.needle_length_max);
        let jitter = rng.gen_range(-tuning.needle_jitter..=tuning.needle_jitter);

        needles.push(NeedleStroke {
            x1: x,
            y1: y,
            x2: x + direction * length,
            y2: y + jitter,
            color: tuning
                .needle_green
                .adjust(rng.gen_range(tuning.needle_brightness_min..=tuning.needle_brightness_max))
                .with_alpha(tuning.needle_alpha),
        });
    }
    needles
}

fn generate_snowflakes<R: Rng>(
    viewport: Viewport,
    tuning: &Tuning,
    rng: &mut R,
) -> Vec<Snowflake> {
    debug_assert!(tuning.snow_speed_min <= tuning.snow_speed_max);
    let count = snowflake_count(viewport, tuning);

    let mut snowflakes = Vec::with_capacity(count);
    for _ in 0..count {
        snowflakes.push(Snowflake {
            x: rng.gen_range(0.0..viewport.width),
            y: rng.gen_range(0.0..viewport.height),
            speed: rng.gen_range(tuning.snow_speed_min..=tuning.snow_speed_max),
            drift: rng.gen_range(-tuning.snow_drift_max..=tuning.snow_drift_max),
            radius: rng.gen_range(tuning.snow_radius_min..=tuning.snow_radius_max) as f32,
        });
    }
    snowflakes
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::{ornament_count, snowflake_count, Scene};
    use crate::layout::{TreeLayout, Viewport};
    use crate::tuning::Tuning;

    #[test]
    fn worked_example_800_by_600() {
        let tuning = Tuning::default();
        let viewport = Viewport::clamped(800, 600);
        // 480000 / 25000 floors to 19, then the lower clamp lifts it to 35.
        assert_eq!(ornament_count(viewport, &tuning), 35);
        assert_eq!(snowflake_count(viewport, &tuning), 100);
    }

    #[test]
    fn generation_fills_every_collection() {
        let tuning = Tuning::default();
        let layout = TreeLayout::compute(1_024, 768, &tuning);
        let mut rng = StdRng::seed_from_u64(7);
        let scene = Scene::generate(&layout, &tuning, &mut rng);

        assert!(!scene.ornaments.is_empty());
        assert!(!scene.needles.is_empty());
        assert!(!scene.snowflakes.is_empty());
    }

    #[test]
    fn empty_band_yields_empty_collection() {
        let mut tuning = Tuning::default();
        tuning.ornament_count_min = 0;
        tuning.ornament_count_max = 0;
        let layout = TreeLayout::compute(800, 600, &tuning);
        let mut rng = StdRng::seed_from_u64(7);
        let scene = Scene::generate(&layout, &tuning, &mut rng);
        assert!(scene.ornaments.is_empty());
    }

    #[test]
    fn needles_only_anchor_where_the_bough_is_wide_enough() {
        let tuning = Tuning::default();
        let layout = TreeLayout::compute(800, 600, &tuning);
        let mut rng = StdRng::seed_from_u64(99);
        let scene = Scene::generate(&layout, &tuning, &mut rng);

        for needle in &scene.needles {
            assert!(layout.half_width_at(needle.y1) >= tuning.needle_min_half_width);
        }
    }
}
