use eframe::egui::{self, PointerButton, Pos2, Ui, Vec2};

use crate::config::GraphConfig;

use super::super::ViewModel;
use super::super::render_utils::CanvasFit;

/// Extra pick slack around each node, in screen pixels.
const HIT_SLACK_PX: f32 = 4.0;

impl ViewModel {
    fn screen_to_canvas(&self, fit: CanvasFit, screen: Pos2) -> Vec2 {
        self.interaction.view_to_canvas(fit.screen_to_view(screen))
    }

    fn node_under(&self, fit: CanvasFit, screen: Pos2, config: &GraphConfig) -> Option<usize> {
        let scale = fit.scale() * self.interaction.transform().scale;
        let radius = config.node_radius + HIT_SLACK_PX / scale.max(0.001);
        self.interaction
            .node_at(&self.graph, self.screen_to_canvas(fit, screen), radius)
    }

    pub(in crate::app) fn handle_graph_zoom(
        &mut self,
        ui: &Ui,
        fit: CanvasFit,
        response: &egui::Response,
        config: &GraphConfig,
    ) {
        if !response.hovered() {
            return;
        }

        let scroll = ui.input(|input| input.raw_scroll_delta.y);
        if scroll.abs() <= f32::EPSILON {
            return;
        }

        let Some(pointer) = response.hover_pos() else {
            return;
        };
        self.interaction
            .wheel_zoom(scroll, fit.screen_to_view(pointer), config);
    }

    /// Primary drag on a node moves it; any other drag pans the view.
    pub(in crate::app) fn handle_graph_pointer(
        &mut self,
        fit: CanvasFit,
        response: &egui::Response,
        config: &GraphConfig,
    ) {
        self.hovered = response
            .hover_pos()
            .and_then(|pointer| self.node_under(fit, pointer, config));

        if response.drag_started_by(PointerButton::Primary)
            && let Some(pointer) = response.interact_pointer_pos()
            && let Some(index) = self.node_under(fit, pointer, config)
        {
            let node_id = self.graph.nodes()[index].id.clone();
            self.interaction
                .drag_start(&node_id, &mut self.graph, &mut self.layout);
        }

        if response.dragged() {
            let moved = match response.interact_pointer_pos() {
                Some(pointer) if self.interaction.is_dragging() => {
                    let canvas = self.screen_to_canvas(fit, pointer);
                    self.interaction
                        .drag_move(canvas, &mut self.graph, &self.layout)
                }
                _ => false,
            };
            if !moved && !self.interaction.is_dragging() {
                self.interaction
                    .pan_by(fit.screen_delta_to_view(response.drag_delta()));
            }
        }

        if response.drag_stopped() && self.interaction.is_dragging() {
            self.interaction.drag_end(&mut self.graph, &mut self.layout);
        }

        if response.clicked() {
            let selected = self
                .hovered
                .and_then(|index| self.graph.nodes().get(index))
                .map(|node| node.id.clone());
            self.set_selected(selected);
        }
    }
}
