use anyhow::{anyhow, Result};
use tiny_skia::{
    Color, FillRule, GradientStop, LinearGradient, Paint, PathBuilder, Pixmap, Point, Rect,
    SpreadMode, Stroke, Transform,
};

use crate::color::Rgba;
use crate::sim::Simulation;

/// Alpha applied to an ornament's outer glow while it is lit / unlit.
const GLOW_ALPHA_ON: u8 = 102;
const GLOW_ALPHA_OFF: u8 = 56;

const BEAD_ON: Rgba = Rgba::rgb(255, 80, 80);
const BEAD_OFF: Rgba = Rgba::rgba(240, 240, 255, 230);
const NIGHT_SKY: Rgba = Rgba::rgb(8, 18, 40);
const GROUND_SNOW: Rgba = Rgba::rgb(240, 245, 255);
const GROUND_FRACTION: f32 = 0.82;

#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Fill a night-sky background and ground band instead of transparency.
    pub backdrop: bool,
}

/// Rasterizes the current scene state into a premultiplied RGBA pixmap sized
/// to the simulation viewport. Pure consumer: reads state, never mutates it.
pub fn render_frame(sim: &Simulation, options: RenderOptions) -> Result<Pixmap> {
    let viewport = sim.viewport();
    let (width, height) = (viewport.width as u32, viewport.height as u32);
    let mut pixmap = Pixmap::new(width, height)
        .ok_or_else(|| anyhow!("cannot allocate a {width}x{height} frame"))?;

    if options.backdrop {
        draw_backdrop(&mut pixmap, sim);
    }
    draw_tree(&mut pixmap, sim);
    draw_needles(&mut pixmap, sim);
    draw_garlands(&mut pixmap, sim);
    draw_trunk(&mut pixmap, sim);
    draw_star(&mut pixmap, sim);
    draw_ornaments(&mut pixmap, sim);
    draw_snow(&mut pixmap, sim);

    Ok(pixmap)
}

fn solid_paint(color: Rgba) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = true;
    paint
}

fn fill_circle(pixmap: &mut Pixmap, cx: f32, cy: f32, radius: f32, color: Rgba) {
    if radius <= 0.0 {
        return;
    }
    if let Some(path) = PathBuilder::from_circle(cx, cy, radius) {
        pixmap.fill_path(
            &path,
            &solid_paint(color),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }
}

fn fill_rect(pixmap: &mut Pixmap, x: f32, y: f32, w: f32, h: f32, color: Rgba) {
    if let Some(rect) = Rect::from_xywh(x, y, w, h) {
        pixmap.fill_rect(rect, &solid_paint(color), Transform::identity(), None);
    }
}

fn skia_color(color: Rgba) -> Color {
    Color::from_rgba8(color.r, color.g, color.b, color.a)
}

fn draw_backdrop(pixmap: &mut Pixmap, sim: &Simulation) {
    let viewport = sim.viewport();
    fill_rect(pixmap, 0.0, 0.0, viewport.width, viewport.height, NIGHT_SKY);
    let ground_y = viewport.height * GROUND_FRACTION;
    fill_rect(
        pixmap,
        0.0,
        ground_y,
        viewport.width,
        viewport.height - ground_y,
        GROUND_SNOW,
    );
}

fn draw_tree(pixmap: &mut Pixmap, sim: &Simulation) {
    let layout = sim.layout();
    let tuning = sim.tuning();
    let cx = layout.center_x();
    let outline_stroke = Stroke {
        width: 2.0,
        ..Stroke::default()
    };
    let highlight_stroke = Stroke {
        width: 1.0,
        ..Stroke::default()
    };

    for (index, layer) in layout.layers().iter().enumerate() {
        let mut pb = PathBuilder::new();
        pb.move_to(cx, layer.y0);
        pb.line_to(cx - layer.half_width, layer.y1);
        pb.line_to(cx + layer.half_width, layer.y1);
        pb.close();
        let Some(triangle) = pb.finish() else {
            continue;
        };

        // Brighter apex fading toward the base, darker on lower boughs.
        let delta = index as i32;
        let top = tuning.tree_green.adjust(35 - delta * 8);
        let bottom = tuning.tree_green.adjust(-10 - delta * 6);
        let mut fill = Paint::default();
        fill.anti_alias = true;
        match LinearGradient::new(
            Point::from_xy(cx, layer.y0),
            Point::from_xy(cx, layer.y1),
            vec![
                GradientStop::new(0.0, skia_color(top)),
                GradientStop::new(1.0, skia_color(bottom)),
            ],
            SpreadMode::Pad,
            Transform::identity(),
        ) {
            Some(shader) => fill.shader = shader,
            None => fill.set_color(skia_color(tuning.tree_green)),
        }
        pixmap.fill_path(&triangle, &fill, FillRule::Winding, Transform::identity(), None);

        pixmap.stroke_path(
            &triangle,
            &solid_paint(tuning.tree_outline),
            &outline_stroke,
            Transform::identity(),
            None,
        );

        let mut edges = PathBuilder::new();
        edges.move_to(cx, layer.y0);
        edges.line_to(cx - layer.half_width, layer.y1);
        edges.move_to(cx, layer.y0);
        edges.line_to(cx + layer.half_width, layer.y1);
        if let Some(edges) = edges.finish() {
            pixmap.stroke_path(
                &edges,
                &solid_paint(tuning.tree_green.adjust(70).with_alpha(204)),
                &highlight_stroke,
                Transform::identity(),
                None,
            );
        }
    }
}

fn draw_needles(pixmap: &mut Pixmap, sim: &Simulation) {
    let stroke = Stroke {
        width: 1.0,
        ..Stroke::default()
    };
    for needle in &sim.scene().needles {
        let mut pb = PathBuilder::new();
        pb.move_to(needle.x1, needle.y1);
        pb.line_to(needle.x2, needle.y2);
        if let Some(path) = pb.finish() {
            pixmap.stroke_path(
                &path,
                &solid_paint(needle.color),
                &stroke,
                Transform::identity(),
                None,
            );
        }
    }
}

fn draw_garlands(pixmap: &mut Pixmap, sim: &Simulation) {
    let tuning = sim.tuning();
    let stroke = Stroke {
        width: 2.0,
        ..Stroke::default()
    };

    for layer_index in 0..sim.layout().layers().len() {
        let points = sim.garland_points(layer_index);
        let mut pb = PathBuilder::new();
        for (i, (x, y)) in points.iter().enumerate() {
            if i == 0 {
                pb.move_to(*x, *y);
            } else {
                pb.line_to(*x, *y);
            }
        }
        if let Some(path) = pb.finish() {
            pixmap.stroke_path(
                &path,
                &solid_paint(tuning.garland_gold),
                &stroke,
                Transform::identity(),
                None,
            );
        }

        let spacing = tuning.garland_bead_spacing.max(1) as usize;
        for (i, (x, y)) in points.iter().enumerate().step_by(spacing) {
            let radius = 3.0 + (i % 2) as f32;
            let color = if sim.garland_bead_lit(i as u32, layer_index) {
                BEAD_ON
            } else {
                BEAD_OFF
            };
            fill_circle(pixmap, *x, *y, radius, color);
        }
    }
}

fn draw_trunk(pixmap: &mut Pixmap, sim: &Simulation) {
    let trunk = sim.layout().trunk();
    fill_rect(
        pixmap,
        trunk.x,
        trunk.y,
        trunk.width,
        trunk.height,
        Rgba::rgb(120, 65, 28),
    );
}

fn star_path(cx: f32, cy: f32, outer: f32, inner: f32) -> Option<tiny_skia::Path> {
    let mut pb = PathBuilder::new();
    for i in 0..10 {
        let angle = (i as f32 * 36.0 - 90.0).to_radians();
        let radius = if i % 2 == 0 { outer } else { inner };
        let x = cx + angle.cos() * radius;
        let y = cy + angle.sin() * radius;
        if i == 0 {
            pb.move_to(x, y);
        } else {
            pb.line_to(x, y);
        }
    }
    pb.close();
    pb.finish()
}

fn draw_star(pixmap: &mut Pixmap, sim: &Simulation) {
    let tuning = sim.tuning();
    let (cx, cy) = sim.layout().star_center();
    let (outer, inner) = sim.layout().star_radii();

    let glow = tuning.star_gold.adjust(25).with_alpha(115);
    if let Some(path) = star_path(cx, cy, outer + 4.0, inner + 2.0) {
        pixmap.fill_path(
            &path,
            &solid_paint(glow),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }
    if let Some(path) = star_path(cx, cy, outer, inner) {
        pixmap.fill_path(
            &path,
            &solid_paint(tuning.star_gold),
            FillRule::Winding,
            Transform::identity(),
            None,
        );
    }
}

fn draw_ornaments(pixmap: &mut Pixmap, sim: &Simulation) {
    for ornament in &sim.scene().ornaments {
        let color = if ornament.on {
            ornament.color_a
        } else {
            ornament.color_b
        };

        let (glow_radius, glow_alpha) = if ornament.on {
            (ornament.radius + 3.0, GLOW_ALPHA_ON)
        } else {
            (ornament.radius + 1.0, GLOW_ALPHA_OFF)
        };
        fill_circle(
            pixmap,
            ornament.x,
            ornament.y,
            glow_radius,
            color.adjust(40).with_alpha(glow_alpha),
        );

        fill_circle(pixmap, ornament.x, ornament.y, ornament.radius, color);

        if ornament.radius >= 5.0 {
            fill_circle(
                pixmap,
                ornament.x,
                ornament.y,
                ornament.radius - 2.0,
                color.adjust(25).with_alpha(230),
            );
        }

        fill_circle(
            pixmap,
            ornament.x - ornament.radius / 3.0,
            ornament.y - ornament.radius / 3.0,
            1.5,
            Rgba::rgba(255, 255, 255, 230),
        );
    }
}

fn draw_snow(pixmap: &mut Pixmap, sim: &Simulation) {
    for flake in &sim.scene().snowflakes {
        let color = if flake.radius >= 3.0 {
            Rgba::rgba(230, 240, 255, 242)
        } else {
            Rgba::rgba(255, 255, 255, 242)
        };
        fill_circle(pixmap, flake.x, flake.y, flake.radius, color);
    }
}

/// Converts the premultiplied pixmap into straight-alpha RGBA bytes for
/// consumers that expect unassociated alpha (PNG encoding).
pub fn unpremultiplied_rgba(pixmap: &Pixmap) -> Vec<u8> {
    let mut out = Vec::with_capacity(pixmap.pixels().len() * 4);
    for pixel in pixmap.pixels() {
        let c = pixel.demultiply();
        out.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    out
}
