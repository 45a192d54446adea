use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use eframe::egui::{Vec2, vec2};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::events::{EventBus, SubscriptionId};

/// Added to `node_radius` to get the collision radius.
pub const COLLISION_MARGIN: f32 = 30.0;
/// Added to `node_radius` to get the distance between a link's arrow tip and
/// the target node's center.
pub const ARROW_OFFSET: f32 = 13.0;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphConfig {
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub node_radius: f32,
    pub charge_strength: f32,
    pub link_distance: f32,
    pub link_width: f32,
    pub node_default_color: String,
    pub link_default_color: String,
    pub is_show_link_label: bool,
    pub min_zoom: f32,
    pub max_zoom: f32,
    pub zoom_step: f32,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            canvas_width: 800.0,
            canvas_height: 800.0,
            node_radius: 10.0,
            charge_strength: -600.0,
            link_distance: 100.0,
            link_width: 1.5,
            node_default_color: "#4B5563".to_owned(),
            link_default_color: "#9CA3AF".to_owned(),
            is_show_link_label: false,
            min_zoom: 0.1,
            max_zoom: 4.0,
            zoom_step: 1.5,
        }
    }
}

impl GraphConfig {
    pub fn center(&self) -> Vec2 {
        vec2(self.canvas_width * 0.5, self.canvas_height * 0.5)
    }

    pub fn canvas_size(&self) -> Vec2 {
        vec2(self.canvas_width, self.canvas_height)
    }

    pub fn collision_radius(&self) -> f32 {
        self.node_radius + COLLISION_MARGIN
    }

    pub fn arrow_offset(&self) -> f32 {
        self.node_radius + ARROW_OFFSET
    }

    pub fn clamp_zoom(&self, scale: f32) -> f32 {
        // No clamping happens on update, so the bounds may arrive inverted.
        let low = self.min_zoom.min(self.max_zoom);
        let high = self.min_zoom.max(self.max_zoom);
        scale.clamp(low, high)
    }

    /// The subset of options that shapes the simulation's forces.
    pub fn force_params(&self) -> ForceParams {
        ForceParams {
            canvas_width: self.canvas_width,
            canvas_height: self.canvas_height,
            node_radius: self.node_radius,
            charge_strength: self.charge_strength,
            link_distance: self.link_distance,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForceParams {
    pub canvas_width: f32,
    pub canvas_height: f32,
    pub node_radius: f32,
    pub charge_strength: f32,
    pub link_distance: f32,
}

impl ForceParams {
    pub fn center(&self) -> Vec2 {
        vec2(self.canvas_width * 0.5, self.canvas_height * 0.5)
    }

    pub fn collision_radius(&self) -> f32 {
        self.node_radius + COLLISION_MARGIN
    }
}

/// A partial update. Absent fields keep their current value.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConfigPatch {
    pub canvas_width: Option<f32>,
    pub canvas_height: Option<f32>,
    pub node_radius: Option<f32>,
    pub charge_strength: Option<f32>,
    pub link_distance: Option<f32>,
    pub link_width: Option<f32>,
    pub node_default_color: Option<String>,
    pub link_default_color: Option<String>,
    pub is_show_link_label: Option<bool>,
    pub min_zoom: Option<f32>,
    pub max_zoom: Option<f32>,
    pub zoom_step: Option<f32>,
}

impl ConfigPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Fields set in `other` win.
    pub fn merge(mut self, other: ConfigPatch) -> Self {
        macro_rules! take {
            ($($field:ident),* $(,)?) => {
                $(if other.$field.is_some() { self.$field = other.$field; })*
            };
        }
        take!(
            canvas_width,
            canvas_height,
            node_radius,
            charge_strength,
            link_distance,
            link_width,
            node_default_color,
            link_default_color,
            is_show_link_label,
            min_zoom,
            max_zoom,
            zoom_step,
        );
        self
    }

    pub fn apply_to(&self, config: &mut GraphConfig) {
        macro_rules! apply {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = &self.$field { config.$field = value.clone(); })*
            };
        }
        apply!(
            canvas_width,
            canvas_height,
            node_radius,
            charge_strength,
            link_distance,
            link_width,
            node_default_color,
            link_default_color,
            is_show_link_label,
            min_zoom,
            max_zoom,
            zoom_step,
        );
    }
}

impl From<GraphConfig> for ConfigPatch {
    fn from(config: GraphConfig) -> Self {
        Self {
            canvas_width: Some(config.canvas_width),
            canvas_height: Some(config.canvas_height),
            node_radius: Some(config.node_radius),
            charge_strength: Some(config.charge_strength),
            link_distance: Some(config.link_distance),
            link_width: Some(config.link_width),
            node_default_color: Some(config.node_default_color),
            link_default_color: Some(config.link_default_color),
            is_show_link_label: Some(config.is_show_link_label),
            min_zoom: Some(config.min_zoom),
            max_zoom: Some(config.max_zoom),
            zoom_step: Some(config.zoom_step),
        }
    }
}

pub fn load_patch(path: &Path) -> Result<ConfigPatch> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let patch = serde_json::from_str::<ConfigPatch>(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    info!(path = %path.display(), "loaded config patch");
    Ok(patch)
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConfigEvent {
    pub previous: GraphConfig,
    pub current: GraphConfig,
}

impl ConfigEvent {
    pub fn forces_changed(&self) -> bool {
        self.previous.force_params() != self.current.force_params()
    }
}

#[derive(Debug)]
pub struct ConfigStore {
    current: GraphConfig,
    defaults: GraphConfig,
    events: EventBus<ConfigEvent>,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::with_defaults(GraphConfig::default())
    }

    /// `defaults` is both the initial record and the target of
    /// [`ConfigStore::reset_config`].
    pub fn with_defaults(defaults: GraphConfig) -> Self {
        Self {
            current: defaults.clone(),
            defaults,
            events: EventBus::new(),
        }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.current
    }

    pub fn update_config(&mut self, patch: ConfigPatch) {
        let previous = self.current.clone();
        patch.apply_to(&mut self.current);
        if previous == self.current {
            debug!("config update left every option unchanged");
            return;
        }

        let event = ConfigEvent {
            previous,
            current: self.current.clone(),
        };
        debug!(forces_changed = event.forces_changed(), "config updated");
        self.events.emit(&event);
    }

    pub fn reset_config(&mut self) {
        self.update_config(ConfigPatch::from(self.defaults.clone()));
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&ConfigEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }
}
