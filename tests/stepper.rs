use tannenbaum::Simulation;

#[test]
fn blink_phase_returns_after_sixty_ticks() {
    let mut sim = Simulation::seeded(800, 600, 1);
    for _ in 0..25 {
        sim.step();
    }
    let before = sim.blink_phase();
    for _ in 0..60 {
        sim.step();
    }
    assert_eq!(sim.blink_phase(), before);
}

#[test]
fn snow_past_the_bottom_respawns_above_the_top() {
    let mut sim = Simulation::seeded(800, 600, 2);
    let height = sim.viewport().height;
    let width = sim.viewport().width;
    {
        let flake = &mut sim.scene_mut().snowflakes[0];
        flake.y = height + 11.0;
        flake.x = width / 2.0;
        flake.speed = 0.5;
        flake.drift = 0.0;
    }

    sim.step();

    let flake = sim.scene().snowflakes[0];
    assert!(flake.y >= -30.0 && flake.y < -5.0, "y = {}", flake.y);
    assert!(flake.x >= 0.0 && flake.x < width, "x = {}", flake.x);
    assert!(flake.speed >= 0.5 && flake.speed <= 1.8);
    assert!(flake.radius >= 1.0 && flake.radius <= 3.0);
}

#[test]
fn snow_wraps_horizontally_like_a_torus() {
    let mut sim = Simulation::seeded(800, 600, 3);
    let width = sim.viewport().width;
    {
        let flakes = &mut sim.scene_mut().snowflakes;
        flakes[0].x = -11.0;
        flakes[0].drift = 0.0;
        flakes[0].y = 10.0;
        flakes[1].x = width + 11.0;
        flakes[1].drift = 0.0;
        flakes[1].y = 10.0;
    }

    sim.step();

    assert_eq!(sim.scene().snowflakes[0].x, width + 5.0);
    assert_eq!(sim.scene().snowflakes[1].x, -5.0);
}

#[test]
fn snow_falls_by_speed_and_drifts_sideways() {
    let mut sim = Simulation::seeded(800, 600, 4);
    {
        let flake = &mut sim.scene_mut().snowflakes[0];
        flake.x = 100.0;
        flake.y = 50.0;
        flake.speed = 1.25;
        flake.drift = -0.25;
    }

    sim.step();

    let flake = sim.scene().snowflakes[0];
    assert!((flake.y - 51.25).abs() < 1e-4);
    assert!((flake.x - 99.75).abs() < 1e-4);
}

#[test]
fn ornament_toggles_only_fire_on_the_cadence_boundary() {
    let mut sim = Simulation::seeded(800, 600, 5);
    // Phases 1..=9 never touch ornament state.
    for _ in 0..9 {
        let before: Vec<bool> = sim.scene().ornaments.iter().map(|o| o.on).collect();
        sim.step();
        let after: Vec<bool> = sim.scene().ornaments.iter().map(|o| o.on).collect();
        assert_eq!(before, after, "phase {} flipped ornaments", sim.blink_phase());
    }
}

#[test]
fn ornament_toggles_eventually_flip_some_lights() {
    let mut sim = Simulation::seeded(800, 600, 6);
    let before: Vec<bool> = sim.scene().ornaments.iter().map(|o| o.on).collect();
    // Twelve cadence boundaries; the chance that no light ever flips is
    // (2/3)^(12*35), effectively zero.
    for _ in 0..120 {
        sim.step();
    }
    let after: Vec<bool> = sim.scene().ornaments.iter().map(|o| o.on).collect();
    assert_ne!(before, after);
}

#[test]
fn regenerate_replaces_every_collection() {
    let mut sim = Simulation::seeded(800, 600, 7);
    let old_ornaments = sim.scene().ornaments.clone();
    let old_flakes = sim.scene().snowflakes.clone();

    sim.regenerate(1_024, 768);

    // New counts follow the new viewport's formulas.
    assert_eq!(sim.scene().ornaments.len(), 35); // 1024*768/25000 = 31 -> floor 35
    assert_eq!(sim.scene().snowflakes.len(), 128);
    assert_ne!(sim.scene().ornaments, old_ornaments);
    assert_ne!(sim.scene().snowflakes, old_flakes);
}

#[test]
fn regenerate_keeps_the_blink_phase() {
    let mut sim = Simulation::seeded(800, 600, 8);
    for _ in 0..17 {
        sim.step();
    }
    let phase = sim.blink_phase();
    sim.regenerate(900, 700);
    assert_eq!(sim.blink_phase(), phase);
}
