use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::layout::{TreeLayout, Viewport};
use crate::scene::Scene;
use crate::tuning::Tuning;

/// Simulated time advanced by one [`Simulation::step`] call.
pub const TICK: Duration = Duration::from_nanos(1_000_000_000 / 30);

/// Length of the cyclic blink counter driving all periodic animation.
pub const BLINK_CYCLE: u32 = 60;

/// Ornament toggles are rolled every this many ticks.
const TOGGLE_INTERVAL: u32 = 10;

/// Owns the scene collections, the RNG stream and the blink counter.
/// Single-threaded by design: regeneration and stepping serialize on the
/// owning thread, so adapters always read a fully built scene.
pub struct Simulation {
    tuning: Tuning,
    layout: TreeLayout,
    scene: Scene,
    rng: StdRng,
    blink_phase: u32,
}

impl Simulation {
    /// Entropy-seeded simulation; scene contents differ across runs.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_tuning(width, height, Tuning::default(), StdRng::from_entropy())
    }

    /// Fully reproducible stream, for tests and `--seed`.
    pub fn seeded(width: u32, height: u32, seed: u64) -> Self {
        Self::with_tuning(width, height, Tuning::default(), StdRng::seed_from_u64(seed))
    }

    pub fn with_tuning(width: u32, height: u32, tuning: Tuning, mut rng: StdRng) -> Self {
        let layout = TreeLayout::compute(width, height, &tuning);
        let scene = Scene::generate(&layout, &tuning, &mut rng);
        Self {
            tuning,
            layout,
            scene,
            rng,
            blink_phase: 0,
        }
    }

    /// Rebuilds layout and all collections for a new viewport. Identical to
    /// the resize trigger; also bound to the regenerate key.
    pub fn regenerate(&mut self, width: u32, height: u32) {
        self.layout = TreeLayout::compute(width, height, &self.tuning);
        self.scene = Scene::generate(&self.layout, &self.tuning, &mut self.rng);
    }

    /// Advances exactly one fixed tick: bump the blink counter, roll ornament
    /// toggles on the cadence boundary, then move the snow.
    pub fn step(&mut self) {
        self.blink_phase = (self.blink_phase + 1) % BLINK_CYCLE;

        if self.blink_phase % TOGGLE_INTERVAL == 0 {
            for ornament in &mut self.scene.ornaments {
                if self.rng.gen_range(0..3) == 0 {
                    ornament.on = !ornament.on;
                }
            }
        }

        let viewport = self.layout.viewport();
        let tuning = &self.tuning;
        for flake in &mut self.scene.snowflakes {
            flake.y += flake.speed;
            flake.x += flake.drift;

            if flake.y > viewport.height + 10.0 {
                // Full respawn above the top edge, not just a vertical wrap.
                flake.y = self.rng.gen_range(-30.0..-5.0);
                flake.x = self.rng.gen_range(0.0..viewport.width);
                flake.speed = self.rng.gen_range(tuning.snow_speed_min..=tuning.snow_speed_max);
                flake.drift = self.rng.gen_range(-tuning.snow_drift_max..=tuning.snow_drift_max);
                flake.radius =
                    self.rng.gen_range(tuning.snow_radius_min..=tuning.snow_radius_max) as f32;
            }

            if flake.x < -10.0 {
                flake.x = viewport.width + 5.0;
            }
            if flake.x > viewport.width + 10.0 {
                flake.x = -5.0;
            }
        }
    }

    /// Horizontal garland displacement at normalized position `u` on a layer.
    pub fn garland_wave_offset(&self, u: f32, layer_index: usize) -> f32 {
        let phase = self.blink_phase as f32 * self.tuning.garland_wave_speed
            + layer_index as f32 * self.tuning.garland_layer_phase;
        (u * std::f32::consts::TAU + phase).sin()
            * (self.layout.layer_height() * self.tuning.garland_wave_amplitude)
    }

    /// Integer-division chase rule; the marquee effect depends on the step
    /// function, so this must not be smoothed.
    pub fn garland_bead_lit(&self, bead_index: u32, layer_index: usize) -> bool {
        (self.blink_phase / 6 + bead_index + layer_index as u32) % 2 == 0
    }

    /// Polyline for one layer's garland, already displaced by the wave.
    pub fn garland_points(&self, layer_index: usize) -> Vec<(f32, f32)> {
        let Some((row_y, half_w)) = self.layout.garland_row(layer_index, &self.tuning) else {
            return Vec::new();
        };
        let segments = self.tuning.garland_segments;
        (0..=segments)
            .map(|i| {
                let u = i as f32 / segments as f32;
                let x = self.layout.center_x() - half_w + u * half_w * 2.0;
                (x, row_y + self.garland_wave_offset(u, layer_index))
            })
            .collect()
    }

    pub fn viewport(&self) -> Viewport {
        self.layout.viewport()
    }

    pub fn layout(&self) -> &TreeLayout {
        &self.layout
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn blink_phase(&self) -> u32 {
        self.blink_phase
    }
}

/// Converts wall-clock deltas into whole pending ticks. The residual carries
/// over, so simulation speed stays independent of frame rate: slow frames
/// yield several steps, fast frames may yield none.
#[derive(Debug, Default)]
pub struct TickAccumulator {
    residual: Duration,
}

impl TickAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.residual += elapsed;
        let mut steps = 0;
        while self.residual >= TICK {
            self.residual -= TICK;
            steps += 1;
        }
        steps
    }
}
