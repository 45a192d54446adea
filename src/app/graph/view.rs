use std::collections::HashSet;
use std::sync::Arc;

use eframe::egui::{self, Align2, Color32, FontId, Rect, Sense, Stroke, Ui, Vec2, vec2};
use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;
use tracing::error;

use crate::util::truncate_label;

use super::super::render_utils::{
    CanvasFit, circle_visible, dim_color, draw_arrowhead, draw_background, parse_hex_color,
    segment_visible,
};
use super::super::{SearchMatchCache, ViewModel};

const ARROW_LENGTH: f32 = 10.0;
const NODE_LABEL_CHARS: usize = 28;
const GRID_STEP: f32 = 50.0;

fn fuzzy_match_score(matcher: &SkimMatcherV2, text: &str, query: &str) -> Option<i64> {
    matcher
        .fuzzy_match(text, query)
        .or_else(|| matcher.fuzzy_match(&text.to_lowercase(), &query.to_lowercase()))
}

impl ViewModel {
    fn cached_search_matches(&mut self) -> Option<Arc<HashSet<usize>>> {
        let query = self.search.trim();
        if query.is_empty() {
            return None;
        }

        if let Some(cached) = &self.search_match_cache
            && cached.revision == self.graph.revision()
            && cached.query == query
        {
            return Some(Arc::clone(&cached.matches));
        }

        let matcher = SkimMatcherV2::default();
        let matches = self
            .graph
            .nodes()
            .iter()
            .enumerate()
            .filter(|(_, node)| fuzzy_match_score(&matcher, &node.name, query).is_some())
            .map(|(index, _)| index)
            .collect::<HashSet<_>>();
        let matches = Arc::new(matches);

        self.search_match_cache = Some(SearchMatchCache {
            query: query.to_owned(),
            revision: self.graph.revision(),
            matches: Arc::clone(&matches),
        });
        Some(matches)
    }

    pub(in crate::app) fn draw_graph(&mut self, ui: &mut Ui) {
        let config = self.config.config().clone();

        if let Err(layout_error) = self.layout.sync(&mut self.graph, &config) {
            error!(error = %layout_error, "failed to build layout simulation");
            self.layout_error = Some(layout_error.to_string());
            return;
        }

        let (rect, response) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(rect);
        let fit = CanvasFit::new(rect, config.canvas_size());
        let now = ui.input(|input| input.time);

        if self.interaction.advance(now) {
            ui.ctx().request_repaint();
        }
        self.handle_graph_zoom(ui, fit, &response, &config);
        self.handle_graph_pointer(fit, &response, &config);

        self.frame = match self.layout.tick(&mut self.graph) {
            Some(frame) => {
                ui.ctx().request_repaint();
                frame
            }
            None => self.layout.frame(&self.graph),
        };

        let transform = self.interaction.transform();
        let scale = fit.scale() * transform.scale;
        let to_screen = |canvas: Vec2| fit.view_to_screen(transform.apply(canvas));

        let canvas_rect = Rect::from_min_max(
            fit.view_to_screen(Vec2::ZERO),
            fit.view_to_screen(config.canvas_size()),
        );
        draw_background(&painter, rect, canvas_rect, GRID_STEP * fit.scale());

        let link_color =
            parse_hex_color(&config.link_default_color).unwrap_or(Color32::from_gray(156));
        let node_fallback =
            parse_hex_color(&config.node_default_color).unwrap_or(Color32::from_gray(90));
        let matches = self.cached_search_matches();
        let selected_index = self
            .selected
            .as_deref()
            .and_then(|id| self.graph.index_of(id));

        let link_stroke = Stroke::new((config.link_width * scale).max(0.5), link_color);
        let arrow_offset = config.arrow_offset();
        for link_frame in &self.frame.links {
            let start = to_screen(link_frame.source);
            let end = to_screen(link_frame.target);
            if !segment_visible(rect, start, end, 8.0) {
                continue;
            }

            let direction = (link_frame.target - link_frame.source).normalized();
            let tip = to_screen(link_frame.target - direction * (arrow_offset - ARROW_LENGTH));
            let base = to_screen(link_frame.target - direction * arrow_offset);
            painter.line_segment([start, base], link_stroke);
            draw_arrowhead(&painter, tip, end - start, ARROW_LENGTH * scale, link_color);

            if config.is_show_link_label
                && let Some(link) = self.graph.links().get(link_frame.index)
            {
                painter.text(
                    to_screen(link_frame.midpoint),
                    Align2::CENTER_CENTER,
                    link.relation_label.as_str(),
                    FontId::proportional((10.0 * scale).clamp(7.0, 16.0)),
                    link_color,
                );
            }
        }

        let radius = (config.node_radius * scale).max(1.5);
        let show_names = scale >= 0.45;
        for node_frame in &self.frame.nodes {
            let Some(node) = self.graph.nodes().get(node_frame.index) else {
                continue;
            };
            let center = to_screen(node_frame.position);
            if !circle_visible(rect, center, radius + 40.0) {
                continue;
            }

            let base_color = node
                .color
                .as_deref()
                .and_then(parse_hex_color)
                .unwrap_or(node_fallback);
            let is_match = matches
                .as_ref()
                .is_none_or(|matches| matches.contains(&node_frame.index));
            let fill = if is_match {
                base_color
            } else {
                dim_color(base_color, 0.3)
            };

            painter.circle_filled(center, radius, fill);
            if Some(node_frame.index) == selected_index {
                painter.circle_stroke(center, radius + 3.0, Stroke::new(2.0, Color32::WHITE));
            } else if Some(node_frame.index) == self.hovered {
                painter.circle_stroke(center, radius + 2.0, Stroke::new(1.5, Color32::LIGHT_GRAY));
            } else if matches.is_some() && is_match {
                painter.circle_stroke(
                    center,
                    radius + 2.0,
                    Stroke::new(1.5, Color32::from_rgb(250, 204, 21)),
                );
            }
            if node.is_pinned() {
                painter.circle_filled(center, (radius * 0.25).max(1.5), Color32::WHITE);
            }

            if show_names {
                painter.text(
                    center + vec2(0.0, radius + 4.0),
                    Align2::CENTER_TOP,
                    truncate_label(&node.name, NODE_LABEL_CHARS),
                    FontId::proportional((12.0 * scale.sqrt()).clamp(9.0, 18.0)),
                    if is_match {
                        Color32::from_gray(225)
                    } else {
                        Color32::from_gray(110)
                    },
                );
            }
        }

        if let Some(index) = self.hovered
            && let Some(node) = self.graph.nodes().get(index)
        {
            response.clone().on_hover_text_at_pointer(format!(
                "{} ({})",
                node.name,
                node.category.label()
            ));
        }

        self.draw_zoom_buttons(ui, rect, now);
    }

    fn draw_zoom_buttons(&mut self, ui: &mut Ui, rect: Rect, now: f64) {
        let size = vec2(52.0, 24.0);
        let top_right = rect.right_top() + vec2(-8.0 - size.x, 8.0);
        let slot = |row: f32| Rect::from_min_size(top_right + vec2(0.0, row * (size.y + 4.0)), size);
        let config = self.config.config().clone();

        if ui
            .put(slot(0.0), egui::Button::new("+"))
            .on_hover_text("Zoom in")
            .clicked()
        {
            self.interaction.zoom_in(&config, now);
        }
        if ui
            .put(slot(1.0), egui::Button::new("−"))
            .on_hover_text("Zoom out")
            .clicked()
        {
            self.interaction.zoom_out(&config, now);
        }
        if ui
            .put(slot(2.0), egui::Button::new("Reset"))
            .on_hover_text("Reset view and release pinned nodes")
            .clicked()
        {
            self.interaction
                .reset_zoom(&mut self.graph, &mut self.layout, &config, now);
        }

        if self.interaction.is_animating() {
            ui.ctx().request_repaint();
        }
        ui.painter().text(
            rect.right_bottom() + vec2(-8.0, -8.0),
            Align2::RIGHT_BOTTOM,
            format!("{:.0}%", self.interaction.zoom_level() * 100.0),
            FontId::proportional(11.0),
            Color32::from_gray(140),
        );
    }
}
