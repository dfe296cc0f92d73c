use criterion::{criterion_group, criterion_main, Criterion};

use tannenbaum::raster::{render_frame, RenderOptions};
use tannenbaum::Simulation;

fn bench_generate(c: &mut Criterion) {
    c.bench_function("generate_1080p", |b| {
        b.iter(|| Simulation::seeded(1_920, 1_080, 42));
    });
}

fn bench_step(c: &mut Criterion) {
    let mut sim = Simulation::seeded(1_920, 1_080, 42);
    c.bench_function("step_1080p", |b| {
        b.iter(|| sim.step());
    });
}

fn bench_render(c: &mut Criterion) {
    let sim = Simulation::seeded(1_280, 720, 42);
    c.bench_function("render_720p", |b| {
        b.iter(|| render_frame(&sim, RenderOptions::default()).expect("render"));
    });
}

criterion_group!(benches, bench_generate, bench_step, bench_render);
criterion_main!(benches);
