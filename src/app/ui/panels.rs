use eframe::egui::{self, Align, Context, Layout};

use super::super::ViewModel;

impl ViewModel {
    pub(in crate::app) fn show(
        &mut self,
        ctx: &Context,
        source: &str,
        reload_requested: &mut bool,
        is_loading: bool,
    ) {
        egui::TopBottomPanel::top("top_bar")
            .resizable(false)
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading("medgraph");
                    ui.separator();
                    ui.label(format!("source: {source}"));
                    ui.label(format!("nodes: {}", self.graph.nodes().len()));
                    ui.label(format!("links: {}", self.graph.links().len()));
                    let reload_button =
                        ui.add_enabled(!is_loading, egui::Button::new("Reload data"));
                    if reload_button.clicked() {
                        *reload_requested = true;
                    }
                    ui.with_layout(Layout::right_to_left(Align::Center), |ui| {
                        match self.layout.alpha() {
                            Some(alpha) if self.layout.is_running() => {
                                ui.label(format!("alpha {alpha:.3}"));
                            }
                            Some(_) => {
                                ui.label("layout settled");
                            }
                            None => {}
                        }
                        if let Some(status) = self.status_text() {
                            ui.weak(status);
                        }
                    });
                });
            });

        egui::SidePanel::left("controls")
            .resizable(true)
            .default_width(300.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.draw_controls(ui));
            });

        egui::SidePanel::right("details")
            .resizable(true)
            .default_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.draw_legend(ui);
                    ui.separator();
                    self.draw_details(ui);
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            if let Some(error) = &self.layout_error {
                ui.heading("Layout failed");
                ui.label(error.as_str());
                return;
            }

            if self.graph.is_empty() {
                ui.vertical_centered(|ui| {
                    ui.add_space(120.0);
                    ui.label("The data source produced no nodes.");
                });
                return;
            }

            self.draw_graph(ui);
        });
    }

    pub(in crate::app) fn set_selected(&mut self, selected: Option<String>) {
        self.selected = selected;
    }
}
