use eframe::egui::{self, RichText, Ui};

use super::super::ViewModel;
use super::super::render_utils::{color_to_hex, parse_hex_color};

impl ViewModel {
    pub(in crate::app) fn draw_legend(&mut self, ui: &mut Ui) {
        ui.heading("Legend");
        ui.add_space(4.0);

        let fallback = parse_hex_color(&self.config.config().node_default_color)
            .unwrap_or(egui::Color32::GRAY);
        let legend = self.graph.legend();
        if legend.is_empty() {
            ui.label("No categories loaded.");
            return;
        }

        let mut recolor = None;
        for (category, color) in legend {
            let count = self
                .graph
                .nodes()
                .iter()
                .filter(|node| node.category == category)
                .count();
            let mut swatch = color
                .as_deref()
                .and_then(parse_hex_color)
                .unwrap_or(fallback);

            ui.horizontal(|ui| {
                if ui
                    .color_edit_button_srgba(&mut swatch)
                    .on_hover_text("Recolor every node in this category.")
                    .changed()
                {
                    recolor = Some((category, color_to_hex(swatch)));
                }
                ui.label(RichText::new(category.label()).strong());
                ui.weak(format!("({count})"));
            });
        }

        if let Some((category, color)) = recolor
            && let Err(error) = self.graph.change_category_color(category, &color)
        {
            *self.status.borrow_mut() = Some(error.to_string());
        }
    }
}
