use std::collections::BTreeMap;

use eframe::egui::Vec2;
use serde_json::Value;

use crate::knowledge::Category;

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub color: Option<String>,
    pub details: BTreeMap<String, Value>,
    position: Option<Vec2>,
    pinned: Option<Vec2>,
}

impl GraphNode {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: Category,
        color: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            color,
            details: BTreeMap::new(),
            position: None,
            pinned: None,
        }
    }

    pub fn with_details(mut self, details: BTreeMap<String, Value>) -> Self {
        self.details = details;
        self
    }

    /// `None` until the layout simulation has stepped at least once.
    pub fn position(&self) -> Option<Vec2> {
        self.position
    }

    pub fn pinned(&self) -> Option<Vec2> {
        self.pinned
    }

    pub fn is_pinned(&self) -> bool {
        self.pinned.is_some()
    }

    pub(crate) fn set_position(&mut self, position: Vec2) {
        self.position = Some(position);
    }

    pub(crate) fn pin(&mut self, at: Vec2) {
        self.pinned = Some(at);
    }

    pub(crate) fn unpin(&mut self) {
        self.pinned = None;
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GraphLink {
    pub source_id: String,
    pub target_id: String,
    pub relation_key: String,
    pub relation_label: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GraphModel {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
}

impl GraphModel {
    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.id == id)
    }
}
