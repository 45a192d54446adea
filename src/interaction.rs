//! Drag, zoom and pan state for the graph canvas.
//!
//! Coordinates come in two spaces. Canvas coordinates are the simulation's
//! own (`0..canvasWidth`, `0..canvasHeight` when centered); view coordinates
//! are canvas coordinates after the zoom/pan transform. The renderer maps
//! view coordinates onto the screen.

use eframe::egui::{Vec2, vec2};
use tracing::debug;

use crate::config::GraphConfig;
use crate::graph::{GraphDataStore, GraphNode};
use crate::layout::{DRAG_ALPHA_TARGET, LayoutController, REHEAT_ALPHA};

pub const ZOOM_ANIMATION_SECS: f64 = 0.5;
pub const RESET_ANIMATION_SECS: f64 = 0.75;
const WHEEL_ZOOM_RATE: f32 = 0.002;

/// `view = translate + canvas * scale`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
    pub translate: Vec2,
    pub scale: f32,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl ViewTransform {
    pub const IDENTITY: Self = Self {
        translate: Vec2::ZERO,
        scale: 1.0,
    };

    pub fn apply(self, canvas: Vec2) -> Vec2 {
        self.translate + canvas * self.scale
    }

    pub fn invert(self, view: Vec2) -> Vec2 {
        (view - self.translate) / self.scale
    }

    /// Same view point stays over the same canvas point.
    pub fn scaled_about(self, scale: f32, anchor: Vec2) -> Self {
        let canvas = self.invert(anchor);
        Self {
            translate: anchor - canvas * scale,
            scale,
        }
    }

    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self {
            translate: self.translate + (other.translate - self.translate) * t,
            scale: self.scale + (other.scale - self.scale) * t,
        }
    }
}

fn ease_cubic_in_out(t: f32) -> f32 {
    let t = t * 2.0;
    if t <= 1.0 {
        t * t * t * 0.5
    } else {
        let t = t - 2.0;
        (t * t * t + 2.0) * 0.5
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransformAnimation {
    from: ViewTransform,
    to: ViewTransform,
    started: f64,
    duration: f64,
}

impl TransformAnimation {
    pub fn new(from: ViewTransform, to: ViewTransform, started: f64, duration: f64) -> Self {
        Self {
            from,
            to,
            started,
            duration,
        }
    }

    pub fn target(&self) -> ViewTransform {
        self.to
    }

    /// The transform at `now` and whether the animation has finished.
    pub fn sample(&self, now: f64) -> (ViewTransform, bool) {
        if self.duration <= 0.0 {
            return (self.to, true);
        }

        let progress = ((now - self.started) / self.duration).clamp(0.0, 1.0);
        if progress >= 1.0 {
            return (self.to, true);
        }
        (self.from.lerp(self.to, ease_cubic_in_out(progress as f32)), false)
    }
}

#[derive(Clone, Debug, PartialEq)]
struct DragState {
    node_id: String,
    generation: u64,
}

#[derive(Debug)]
pub struct InteractionController {
    transform: ViewTransform,
    animation: Option<TransformAnimation>,
    zoom_level: f32,
    drag: Option<DragState>,
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionController {
    pub fn new() -> Self {
        Self {
            transform: ViewTransform::IDENTITY,
            animation: None,
            zoom_level: 1.0,
            drag: None,
        }
    }

    /// Pins the node where it is and warms the simulation. Ignored while
    /// another drag is active and for nodes without a position.
    pub fn drag_start(
        &mut self,
        node_id: &str,
        store: &mut GraphDataStore,
        layout: &mut LayoutController,
    ) -> bool {
        if self.drag.is_some() {
            return false;
        }

        let Some(node) = store.node_mut(node_id) else {
            return false;
        };
        let Some(position) = node.position() else {
            debug!(node = node_id, "ignoring drag on an unpositioned node");
            return false;
        };

        layout.set_alpha_target(DRAG_ALPHA_TARGET);
        layout.restart();
        node.pin(position);
        self.drag = Some(DragState {
            node_id: node_id.to_owned(),
            generation: layout.generation(),
        });
        debug!(node = node_id, "drag started");
        true
    }

    /// Moves the dragged node's pin to `canvas`. A drag whose simulation was
    /// rebuilt or whose node disappeared is released instead.
    pub fn drag_move(
        &mut self,
        canvas: Vec2,
        store: &mut GraphDataStore,
        layout: &LayoutController,
    ) -> bool {
        let Some(drag) = self.drag.as_ref() else {
            return false;
        };

        if drag.generation != layout.generation() {
            debug!(node = %drag.node_id, "layout rebuilt mid-drag; releasing");
            self.drag = None;
            return false;
        }

        let Some(node) = store.node_mut(&drag.node_id) else {
            self.drag = None;
            return false;
        };

        node.pin(canvas);
        node.set_position(canvas);
        true
    }

    pub fn drag_end(&mut self, store: &mut GraphDataStore, layout: &mut LayoutController) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };

        if drag.generation != layout.generation() {
            return false;
        }
        let Some(node) = store.node_mut(&drag.node_id) else {
            return false;
        };

        node.unpin();
        layout.set_alpha_target(0.0);
        debug!(node = %drag.node_id, "drag ended");
        true
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    /// Zooms about `anchor` (view coordinates) and cancels any running
    /// animation.
    pub fn wheel_zoom(&mut self, scroll_delta: f32, anchor: Vec2, config: &GraphConfig) {
        let factor = 2.0_f32.powf(scroll_delta * WHEEL_ZOOM_RATE);
        let scale = config.clamp_zoom(self.transform.scale * factor);
        self.animation = None;
        self.transform = self.transform.scaled_about(scale, anchor);
        self.zoom_level = scale;
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.animation = None;
        self.transform.translate += delta;
    }

    pub fn zoom_in(&mut self, config: &GraphConfig, now: f64) {
        let level = config.clamp_zoom(self.zoom_level * config.zoom_step);
        self.zoom_to(level, config, now);
    }

    pub fn zoom_out(&mut self, config: &GraphConfig, now: f64) {
        let level = config.clamp_zoom(self.zoom_level / config.zoom_step);
        self.zoom_to(level, config, now);
    }

    fn zoom_to(&mut self, level: f32, config: &GraphConfig, now: f64) {
        self.zoom_level = level;
        let target = self.target_transform().scaled_about(level, config.center());
        self.animate_to(target, now, ZOOM_ANIMATION_SECS);
    }

    /// Recenters the graph at scale 1, releases every pin and reheats the
    /// layout.
    pub fn reset_zoom(
        &mut self,
        store: &mut GraphDataStore,
        layout: &mut LayoutController,
        config: &GraphConfig,
        now: f64,
    ) {
        let center = config.center();
        let centroid = centroid(store.nodes()).unwrap_or(center);
        let target = ViewTransform {
            translate: center - centroid,
            scale: 1.0,
        };
        self.animate_to(target, now, RESET_ANIMATION_SECS);
        self.zoom_level = 1.0;

        for node in store.nodes_mut() {
            node.unpin();
        }
        layout.reheat(REHEAT_ALPHA);
        debug!(?centroid, "view reset");
    }

    fn animate_to(&mut self, target: ViewTransform, now: f64, duration: f64) {
        self.animation = Some(TransformAnimation::new(self.transform, target, now, duration));
    }

    /// Advances any running animation. Returns whether one is still running.
    pub fn advance(&mut self, now: f64) -> bool {
        let Some(animation) = self.animation else {
            return false;
        };

        let (transform, finished) = animation.sample(now);
        self.transform = transform;
        if finished {
            self.animation = None;
        }
        !finished
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    /// Where the view ends up once any running animation finishes.
    pub fn target_transform(&self) -> ViewTransform {
        self.animation
            .map(|animation| animation.target())
            .unwrap_or(self.transform)
    }

    pub fn zoom_level(&self) -> f32 {
        self.zoom_level
    }

    pub fn view_to_canvas(&self, view: Vec2) -> Vec2 {
        self.transform.invert(view)
    }

    pub fn canvas_to_view(&self, canvas: Vec2) -> Vec2 {
        self.transform.apply(canvas)
    }

    /// Index of the closest positioned node within `radius` canvas units.
    pub fn node_at(&self, store: &GraphDataStore, canvas: Vec2, radius: f32) -> Option<usize> {
        store
            .nodes()
            .iter()
            .enumerate()
            .filter_map(|(index, node)| {
                let distance = (node.position()? - canvas).length();
                (distance <= radius).then_some((index, distance))
            })
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(index, _)| index)
    }
}

/// Mean position of the positioned nodes.
pub fn centroid(nodes: &[GraphNode]) -> Option<Vec2> {
    let (sum, count) = nodes
        .iter()
        .filter_map(GraphNode::position)
        .fold((vec2(0.0, 0.0), 0usize), |(sum, count), position| {
            (sum + position, count + 1)
        });
    (count > 0).then(|| sum / count as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easing_is_symmetric_and_pinned_at_the_ends() {
        assert_eq!(ease_cubic_in_out(0.0), 0.0);
        assert_eq!(ease_cubic_in_out(1.0), 1.0);
        assert!((ease_cubic_in_out(0.5) - 0.5).abs() < 1e-6);
        assert!((ease_cubic_in_out(0.25) + ease_cubic_in_out(0.75) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn scaling_about_an_anchor_keeps_it_fixed() {
        let transform = ViewTransform {
            translate: vec2(30.0, -10.0),
            scale: 1.5,
        };
        let anchor = vec2(200.0, 120.0);
        let scaled = transform.scaled_about(3.0, anchor);

        assert!((scaled.invert(anchor) - transform.invert(anchor)).length() < 1e-4);
        assert_eq!(scaled.scale, 3.0);
    }

    #[test]
    fn animation_lands_exactly_on_target() {
        let to = ViewTransform {
            translate: vec2(50.0, 50.0),
            scale: 2.0,
        };
        let animation = TransformAnimation::new(ViewTransform::IDENTITY, to, 10.0, 0.5);

        let (mid, finished) = animation.sample(10.25);
        assert!(!finished);
        assert!((mid.scale - 1.5).abs() < 1e-5);
        assert_eq!(animation.sample(10.5), (to, true));
    }
}
