use tannenbaum::layout::Viewport;
use tannenbaum::scene::{needle_count, ornament_count, snowflake_count};
use tannenbaum::{Simulation, Tuning};

#[test]
fn counts_stay_inside_their_bands_across_the_domain() {
    let tuning = Tuning::default();
    for &width in &[200_u32, 333, 800, 1_280, 1_920, 2_560, 4_000] {
        for &height in &[200_u32, 600, 1_080, 2_160, 4_000] {
            let viewport = Viewport::clamped(width, height);

            let ornaments = ornament_count(viewport, &tuning);
            assert!((35..=140).contains(&ornaments), "{width}x{height}: {ornaments}");

            let flakes = snowflake_count(viewport, &tuning);
            assert!((60..=220).contains(&flakes), "{width}x{height}: {flakes}");

            let needles = needle_count(viewport, &tuning);
            assert!((300..=2_000).contains(&needles), "{width}x{height}: {needles}");
        }
    }
}

#[test]
fn counts_grow_with_area_between_the_clamps() {
    let tuning = Tuning::default();
    // All three viewports fall inside the unclamped middle of the band.
    let small = ornament_count(Viewport::clamped(1_200, 900), &tuning);
    let mid = ornament_count(Viewport::clamped(1_600, 1_200), &tuning);
    let large = ornament_count(Viewport::clamped(2_000, 1_500), &tuning);
    assert!(small <= mid && mid <= large);
    assert!(small > 35 && large < 140);

    let narrow = snowflake_count(Viewport::clamped(800, 600), &tuning);
    let wide = snowflake_count(Viewport::clamped(1_400, 600), &tuning);
    assert!(narrow < wide);
}

#[test]
fn worked_example_matches_the_count_formulas() {
    let tuning = Tuning::default();
    let viewport = Viewport::clamped(800, 600);
    assert_eq!(ornament_count(viewport, &tuning), 35);
    assert_eq!(snowflake_count(viewport, &tuning), 100);

    let sim = Simulation::seeded(800, 600, 5);
    assert_eq!(sim.scene().ornaments.len(), 35);
    assert_eq!(sim.scene().snowflakes.len(), 100);
}

#[test]
fn ornaments_stay_inside_the_safe_silhouette() {
    for seed in 0..8 {
        let sim = Simulation::seeded(1_280, 960, seed);
        let layout = sim.layout();
        let safety = sim.tuning().ornament_safety;

        for ornament in &sim.scene().ornaments {
            let allowed = layout.half_width_at(ornament.y) * safety;
            let offset = (ornament.x - layout.center_x()).abs();
            assert!(
                offset <= allowed + 1e-3,
                "seed {seed}: ornament at ({}, {}) exceeds half-width {allowed}",
                ornament.x,
                ornament.y
            );
        }
    }
}

#[test]
fn ornament_draws_respect_their_stated_ranges() {
    let sim = Simulation::seeded(1_920, 1_080, 11);
    for ornament in &sim.scene().ornaments {
        assert!(ornament.radius >= 4.0 && ornament.radius <= 9.0);
    }
    for flake in &sim.scene().snowflakes {
        assert!(flake.speed >= 0.5 && flake.speed <= 1.8);
        assert!(flake.drift >= -0.3 && flake.drift <= 0.3);
        assert!(flake.radius >= 1.0 && flake.radius <= 3.0);
    }
}

#[test]
fn snow_scatters_over_the_whole_viewport_at_generation() {
    let sim = Simulation::seeded(800, 600, 21);
    let viewport = sim.viewport();
    for flake in &sim.scene().snowflakes {
        assert!(flake.x >= 0.0 && flake.x < viewport.width);
        assert!(flake.y >= 0.0 && flake.y < viewport.height);
    }
}

#[test]
fn undersized_viewports_are_raised_to_the_floor() {
    let sim = Simulation::seeded(32, 16, 3);
    assert_eq!(sim.viewport().width, 200.0);
    assert_eq!(sim.viewport().height, 200.0);
    assert_eq!(sim.scene().ornaments.len(), 35);
}
