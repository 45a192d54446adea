use eframe::egui::{self, RichText, Ui};
use serde_json::Value;

use super::super::ViewModel;
use super::super::render_utils::{color_to_hex, parse_hex_color};

fn detail_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Array(items) => items
            .iter()
            .map(detail_text)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let Some(selected_id) = self.selected.clone() else {
            ui.label("Click a node in the graph to inspect it.");
            return;
        };

        let Some(node) = self.graph.node(&selected_id) else {
            ui.label("Selected node no longer exists in the graph.");
            return;
        };

        let name = node.name.clone();
        let category = node.category;
        let details = node.details.clone();
        let fallback = self.config.config().node_default_color.clone();
        let color_hex = node.color.clone().unwrap_or(fallback);
        let position = node.position();

        ui.label(RichText::new(name).strong());
        ui.small(selected_id.as_str());
        ui.add_space(6.0);
        ui.label(format!("Category: {}", category.label()));

        let mut swatch = parse_hex_color(&color_hex).unwrap_or(egui::Color32::GRAY);
        ui.horizontal(|ui| {
            ui.label("Color:");
            if ui.color_edit_button_srgba(&mut swatch).changed()
                && let Err(error) = self.graph.change_node_color(&selected_id, &color_to_hex(swatch))
            {
                *self.status.borrow_mut() = Some(error.to_string());
            }
        });

        if let Some(position) = position {
            ui.label(format!("Position: ({:.0}, {:.0})", position.x, position.y));
        }

        if !details.is_empty() {
            ui.separator();
            ui.label(RichText::new("Details").strong());
            egui::Grid::new("node_details_grid")
                .num_columns(2)
                .striped(true)
                .show(ui, |ui| {
                    for (key, value) in &details {
                        ui.label(key.as_str());
                        ui.label(detail_text(value));
                        ui.end_row();
                    }
                });
        }

        ui.separator();
        ui.label(RichText::new("Relations").strong());

        let relations = self
            .graph
            .links()
            .iter()
            .filter_map(|link| {
                if link.source_id == selected_id {
                    Some((format!("{} →", link.relation_label), link.target_id.clone()))
                } else if link.target_id == selected_id {
                    Some((format!("← {}", link.relation_label), link.source_id.clone()))
                } else {
                    None
                }
            })
            .collect::<Vec<_>>();

        if relations.is_empty() {
            ui.label("No relations.");
            return;
        }

        let mut next_selection = None;
        for (label, other_id) in &relations {
            let other_name = self
                .graph
                .node(other_id)
                .map(|node| node.name.clone())
                .unwrap_or_else(|| other_id.clone());
            ui.horizontal(|ui| {
                ui.weak(label.as_str());
                if ui.link(other_name).on_hover_text(other_id.as_str()).clicked() {
                    next_selection = Some(other_id.clone());
                }
            });
        }

        if next_selection.is_some() {
            self.set_selected(next_selection);
        }
    }
}
