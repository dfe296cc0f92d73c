use crate::tuning::Tuning;

/// Smallest viewport edge the scene is ever laid out for. Resize requests
/// below this are silently raised, never rejected.
pub const MIN_VIEWPORT: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    /// Clamps both edges to the [`MIN_VIEWPORT`] floor.
    pub fn clamped(width: u32, height: u32) -> Self {
        Self {
            width: width.max(MIN_VIEWPORT) as f32,
            height: height.max(MIN_VIEWPORT) as f32,
        }
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }
}

/// One horizontal band of the silhouette. Index 0 is the treetop; spans
/// overlap so the cone reads as stacked boughs rather than disjoint triangles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeLayer {
    pub y0: f32,
    pub y1: f32,
    pub half_width: f32,
}

/// Tree geometry derived purely from the viewport; recomputed on resize.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeLayout {
    viewport: Viewport,
    top_y: f32,
    base_y: f32,
    center_x: f32,
    layer_height: f32,
    layers: Vec<TreeLayer>,
    star_center: (f32, f32),
    star_outer: f32,
    star_inner: f32,
    trunk: Rect,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl TreeLayout {
    pub fn compute(width: u32, height: u32, tuning: &Tuning) -> Self {
        let viewport = Viewport::clamped(width, height);
        let w = viewport.width;
        let h = viewport.height;

        let top_y = h * tuning.top_y_fraction;
        let base_y = h * tuning.base_y_fraction;
        let center_x = w / 2.0;
        let base_half_width = w * tuning.base_half_width_fraction;

        let layer_count = (w as u32 / tuning.layer_width_divisor)
            .clamp(tuning.layer_count_min, tuning.layer_count_max);
        debug_assert!(layer_count > 0, "layer count band must be non-empty");
        let layer_height = (base_y - top_y) / layer_count as f32;

        let layers = (0..layer_count)
            .map(|index| {
                let y0 = top_y + index as f32 * layer_height;
                let y1 = y0 + layer_height * (1.0 + tuning.layer_overlap);
                let progress = (index + 1) as f32 / layer_count as f32;
                TreeLayer {
                    y0,
                    y1,
                    half_width: base_half_width * progress.powf(tuning.taper_exponent),
                }
            })
            .collect();

        let trunk_width = w * tuning.trunk_width_fraction;
        let trunk = Rect {
            x: center_x - trunk_width / 2.0,
            y: base_y,
            width: trunk_width,
            height: h * tuning.trunk_height_fraction,
        };

        Self {
            viewport,
            top_y,
            base_y,
            center_x,
            layer_height,
            layers,
            star_center: (center_x, top_y - h * tuning.star_lift_fraction),
            star_outer: w * tuning.star_outer_fraction,
            star_inner: w * tuning.star_inner_fraction,
            trunk,
        }
    }

    /// Silhouette half-width at height `y`: each layer containing `y`
    /// contributes a linearly tapered candidate and the widest one wins, so
    /// the broader lower bough dominates in overlap zones. Zero outside
    /// every layer.
    pub fn half_width_at(&self, y: f32) -> f32 {
        let mut widest = 0.0_f32;
        for layer in &self.layers {
            if y >= layer.y0 && y <= layer.y1 {
                let t = (y - layer.y0) / (layer.y1 - layer.y0);
                widest = widest.max(t * layer.half_width);
            }
        }
        widest
    }

    /// Garland anchor row for a layer: its vertical position and the
    /// silhouette half-width at that position.
    pub fn garland_row(&self, layer_index: usize, tuning: &Tuning) -> Option<(f32, f32)> {
        let layer = self.layers.get(layer_index)?;
        let t = tuning.garland_row_fraction;
        let y = layer.y0 + (layer.y1 - layer.y0) * t;
        Some((y, t * layer.half_width))
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn top_y(&self) -> f32 {
        self.top_y
    }

    pub fn base_y(&self) -> f32 {
        self.base_y
    }

    pub fn center_x(&self) -> f32 {
        self.center_x
    }

    pub fn layer_height(&self) -> f32 {
        self.layer_height
    }

    pub fn layers(&self) -> &[TreeLayer] {
        &self.layers
    }

    pub fn star_center(&self) -> (f32, f32) {
        self.star_center
    }

    pub fn star_radii(&self) -> (f32, f32) {
        (self.star_outer, self.star_inner)
    }

    pub fn trunk(&self) -> Rect {
        self.trunk
    }
}

#[cfg(test)]
mod tests {
    use super::{TreeLayout, Viewport, MIN_VIEWPORT};
    use crate::tuning::Tuning;

    #[test]
    fn viewport_floor_applies_to_both_edges() {
        let v = Viewport::clamped(10, 5_000);
        assert_eq!(v.width, MIN_VIEWPORT as f32);
        assert_eq!(v.height, 5_000.0);
    }

    #[test]
    fn layer_count_tracks_width_within_band() {
        let tuning = Tuning::default();
        assert_eq!(TreeLayout::compute(200, 400, &tuning).layers().len(), 5);
        assert_eq!(TreeLayout::compute(420, 520, &tuning).layers().len(), 6);
        assert_eq!(TreeLayout::compute(4_000, 400, &tuning).layers().len(), 9);
    }

    #[test]
    fn half_widths_never_shrink_toward_the_base() {
        let tuning = Tuning::default();
        let layout = TreeLayout::compute(800, 600, &tuning);
        for pair in layout.layers().windows(2) {
            assert!(pair[1].half_width >= pair[0].half_width);
        }
    }

    #[test]
    fn half_width_at_is_zero_outside_the_tree() {
        let tuning = Tuning::default();
        let layout = TreeLayout::compute(800, 600, &tuning);
        assert_eq!(layout.half_width_at(layout.top_y() - 1.0), 0.0);
        assert_eq!(layout.half_width_at(layout.viewport().height), 0.0);
    }

    #[test]
    fn overlap_zones_take_the_widest_candidate() {
        let tuning = Tuning::default();
        let layout = TreeLayout::compute(800, 600, &tuning);
        let layers = layout.layers();
        // A probe just above the end of layer 0 sits inside layers 0 and 1;
        // the reported width must be at least layer 0's nearly-full taper.
        let y = layers[0].y1 - 0.5;
        let t = (y - layers[0].y0) / (layers[0].y1 - layers[0].y0);
        assert!(layout.half_width_at(y) >= t * layers[0].half_width);
    }

    #[test]
    fn minimal_viewport_still_yields_a_tree() {
        let tuning = Tuning::default();
        let layout = TreeLayout::compute(1, 1, &tuning);
        assert_eq!(layout.layers().len(), 5);
        let mid = (layout.top_y() + layout.base_y()) / 2.0;
        assert!(layout.half_width_at(mid) > 0.0);
    }
}
