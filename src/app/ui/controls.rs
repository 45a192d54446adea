use std::ops::RangeInclusive;

use eframe::egui::{self, Key, Response, Ui};

use crate::config::ConfigPatch;

use super::super::ViewModel;
use super::super::render_utils::{color_to_hex, parse_hex_color};

const KEY_BASE_RATE: f32 = 10.0;
const KEY_ACCEL_PER_SEC: f32 = 9.0;
const KEY_ACCEL_MAX: f32 = 40.0;
const CANVAS_RANGE: RangeInclusive<f32> = 200.0..=4000.0;

#[derive(Clone, Copy, Default)]
struct KeyHoldState {
    increase_secs: f32,
    decrease_secs: f32,
}

fn key_accel_multiplier(hold_secs: f32) -> f32 {
    let ramp = hold_secs * KEY_ACCEL_PER_SEC;
    (1.0 + ramp + ramp * ramp * 0.15).min(KEY_ACCEL_MAX)
}

/// Holding an arrow key on a focused slider speeds up the longer it is held.
fn apply_arrow_acceleration(
    ui: &Ui,
    response: &Response,
    value: &mut f32,
    range: &RangeInclusive<f32>,
    step: f32,
) -> bool {
    let state_id = response.id.with("arrow_key_hold_state");
    let mut hold = ui
        .ctx()
        .data(|data| data.get_temp::<KeyHoldState>(state_id).unwrap_or_default());

    if !response.has_focus() {
        ui.ctx()
            .data_mut(|data| data.insert_temp(state_id, KeyHoldState::default()));
        return false;
    }

    let (dt, increase, decrease) = ui.input(|input| {
        (
            input.stable_dt.min(0.1),
            input.key_down(Key::ArrowRight) || input.key_down(Key::ArrowUp),
            input.key_down(Key::ArrowLeft) || input.key_down(Key::ArrowDown),
        )
    });

    hold.increase_secs = if increase { hold.increase_secs + dt } else { 0.0 };
    hold.decrease_secs = if decrease { hold.decrease_secs + dt } else { 0.0 };
    ui.ctx().data_mut(|data| data.insert_temp(state_id, hold));

    let direction = f32::from(i8::from(increase) - i8::from(decrease));
    if direction == 0.0 {
        return false;
    }

    let held = if direction > 0.0 {
        hold.increase_secs
    } else {
        hold.decrease_secs
    };
    let delta = direction * step * KEY_BASE_RATE * key_accel_multiplier(held) * dt;
    let before = *value;
    *value = (*value + delta).clamp(*range.start(), *range.end());
    ui.ctx().request_repaint();
    (*value - before).abs() > f32::EPSILON
}

/// What a widget makes of `stored` with no input: clamped into `range` and,
/// with a step, rounded to the nearest step from the range start.
fn settled_value(stored: f32, range: &RangeInclusive<f32>, step: Option<f32>) -> f32 {
    let (start, end) = (*range.start(), *range.end());
    let clamped = stored.clamp(start, end);
    match step {
        Some(step) if step > 0.0 => (start + ((clamped - start) / step).round() * step).min(end),
        _ => clamped,
    }
}

/// `edited` when it moved away from what the widget alone would have turned
/// `stored` into. Clamping or step rounding by itself is not an edit.
fn user_edit(
    stored: f32,
    edited: f32,
    range: &RangeInclusive<f32>,
    step: Option<f32>,
) -> Option<f32> {
    if edited == stored {
        return None;
    }
    let tolerance = step.map_or(1e-3, |step| step * 1e-3);
    let settled = settled_value(stored, range, step);
    ((edited - settled).abs() > tolerance).then_some(edited)
}

fn config_slider(
    ui: &mut Ui,
    stored: f32,
    range: RangeInclusive<f32>,
    step: f32,
    label: &str,
    hover: &str,
) -> Option<f32> {
    let mut value = stored;
    let response = ui
        .add(
            egui::Slider::new(&mut value, range.clone())
                .step_by(f64::from(step))
                .text(label)
                .clamping(egui::SliderClamping::Always),
        )
        .on_hover_text(hover);
    if response.hovered() {
        response.request_focus();
    }
    if apply_arrow_acceleration(ui, &response, &mut value, &range, step) {
        return Some(value);
    }
    user_edit(stored, value, &range, Some(step))
}

fn config_color(ui: &mut Ui, value: &str, label: &str) -> Option<String> {
    let mut color = parse_hex_color(value).unwrap_or(egui::Color32::GRAY);
    let mut changed = false;
    ui.horizontal(|ui| {
        changed = ui.color_edit_button_srgba(&mut color).changed();
        ui.label(label);
    });
    changed.then(|| color_to_hex(color))
}

impl ViewModel {
    pub(in crate::app) fn draw_controls(&mut self, ui: &mut Ui) {
        ui.heading("Graph Controls");
        ui.separator();
        ui.add_space(4.0);

        ui.label("Search")
            .on_hover_text("Fuzzy-highlight matching node names without changing the graph.");
        ui.text_edit_singleline(&mut self.search);

        ui.separator();

        let config = self.config.config().clone();
        let mut patch = ConfigPatch::default();

        if let Some(node_radius) = config_slider(
            ui,
            config.node_radius,
            10.0..=50.0,
            1.0,
            "Node radius",
            "Circle radius; collision spacing and arrow offsets follow it.",
        ) {
            patch.node_radius = Some(node_radius);
        }

        if let Some(link_distance) = config_slider(
            ui,
            config.link_distance,
            50.0..=400.0,
            5.0,
            "Link distance",
            "Rest length of every link spring.",
        ) {
            patch.link_distance = Some(link_distance);
        }

        if let Some(charge) = config_slider(
            ui,
            config.charge_strength.abs(),
            100.0..=1000.0,
            10.0,
            "Repulsion",
            "Strength of the many-body repulsion between all nodes.",
        ) {
            patch.charge_strength = Some(-charge);
        }

        if let Some(link_width) = config_slider(
            ui,
            config.link_width,
            0.5..=6.0,
            0.25,
            "Link width",
            "Stroke width of links, in canvas units.",
        ) {
            patch.link_width = Some(link_width);
        }

        let mut show_labels = config.is_show_link_label;
        if ui
            .checkbox(&mut show_labels, "Show relation labels")
            .on_hover_text("Draw each link's relation at its midpoint.")
            .changed()
        {
            patch.is_show_link_label = Some(show_labels);
        }

        ui.collapsing("Colors", |ui| {
            if let Some(color) = config_color(ui, &config.node_default_color, "Node fallback") {
                patch.node_default_color = Some(color);
            }
            if let Some(color) = config_color(ui, &config.link_default_color, "Links and arrows")
            {
                patch.link_default_color = Some(color);
            }
        });

        ui.collapsing("Canvas and zoom", |ui| {
            let mut width = config.canvas_width;
            let mut height = config.canvas_height;
            ui.horizontal(|ui| {
                ui.label("Canvas");
                ui.add(egui::DragValue::new(&mut width).range(CANVAS_RANGE).speed(10.0));
                if let Some(width) = user_edit(config.canvas_width, width, &CANVAS_RANGE, None) {
                    patch.canvas_width = Some(width);
                }
                ui.label("×");
                ui.add(egui::DragValue::new(&mut height).range(CANVAS_RANGE).speed(10.0));
                if let Some(height) = user_edit(config.canvas_height, height, &CANVAS_RANGE, None) {
                    patch.canvas_height = Some(height);
                }
            });

            if let Some(zoom_step) = config_slider(
                ui,
                config.zoom_step,
                1.1..=3.0,
                0.1,
                "Zoom step",
                "Multiplier applied by the zoom buttons.",
            ) {
                patch.zoom_step = Some(zoom_step);
            }
        });

        ui.separator();
        if ui
            .button("Reset configuration")
            .on_hover_text("Restore every option to its default.")
            .clicked()
        {
            self.config.reset_config();
        } else if !patch.is_empty() {
            self.config.update_config(patch);
        }
    }
}
