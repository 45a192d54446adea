use std::collections::HashMap;

use tracing::{error, info};

use crate::error::GraphError;
use crate::events::{EventBus, SubscriptionId};
use crate::knowledge::Category;
use crate::util::is_hex_color;

use super::build::{categories, colors, legend};
use super::model::{GraphLink, GraphModel, GraphNode};

#[derive(Clone, Debug, PartialEq)]
pub enum GraphEvent {
    Replaced {
        revision: u64,
        node_count: usize,
        link_count: usize,
    },
    ColorsChanged {
        changed: usize,
    },
}

/// Current node and link arrays. `revision` changes only when node or link
/// identity changes; color edits happen in place and keep it.
#[derive(Debug, Default)]
pub struct GraphDataStore {
    nodes: Vec<GraphNode>,
    links: Vec<GraphLink>,
    index_by_id: HashMap<String, usize>,
    revision: u64,
    events: EventBus<GraphEvent>,
}

impl GraphDataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_model(model: GraphModel) -> Self {
        let mut store = Self::new();
        store.replace(model);
        store
    }

    pub fn replace(&mut self, model: GraphModel) {
        let mut nodes = Vec::with_capacity(model.nodes.len());
        let mut index_by_id = HashMap::with_capacity(model.nodes.len());
        for node in model.nodes {
            if index_by_id.contains_key(&node.id) {
                error!(id = %node.id, "dropping node with duplicate id");
                continue;
            }
            index_by_id.insert(node.id.clone(), nodes.len());
            nodes.push(node);
        }

        let links = model
            .links
            .into_iter()
            .filter(|link| {
                let valid = index_by_id.contains_key(&link.source_id)
                    && index_by_id.contains_key(&link.target_id);
                if !valid {
                    error!(
                        source = %link.source_id,
                        target = %link.target_id,
                        relation = %link.relation_label,
                        "dropping link with a dangling endpoint"
                    );
                }
                valid
            })
            .collect::<Vec<_>>();

        self.nodes = nodes;
        self.links = links;
        self.index_by_id = index_by_id;
        self.revision = self.revision.wrapping_add(1);

        info!(
            revision = self.revision,
            nodes = self.nodes.len(),
            links = self.links.len(),
            "graph data replaced"
        );
        self.events.emit(&GraphEvent::Replaced {
            revision: self.revision,
            node_count: self.nodes.len(),
            link_count: self.links.len(),
        });
    }

    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    pub fn links(&self) -> &[GraphLink] {
        &self.links
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index_of(id).map(|index| &self.nodes[index])
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index_by_id.get(id).copied()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Link endpoints resolved to node indices, in link order.
    pub fn link_indices(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.links.iter().filter_map(|link| {
            Some((
                self.index_of(&link.source_id)?,
                self.index_of(&link.target_id)?,
            ))
        })
    }

    pub fn categories(&self) -> Vec<Category> {
        categories(&self.nodes)
    }

    pub fn colors(&self) -> Vec<String> {
        colors(&self.nodes)
    }

    pub fn legend(&self) -> Vec<(Category, Option<String>)> {
        legend(&self.nodes)
    }

    pub fn change_node_color(&mut self, id: &str, color: &str) -> Result<bool, GraphError> {
        let color = checked_color(color)?;
        let Some(index) = self.index_of(id) else {
            return Ok(false);
        };

        self.nodes[index].color = Some(color);
        self.events.emit(&GraphEvent::ColorsChanged { changed: 1 });
        Ok(true)
    }

    pub fn change_category_color(
        &mut self,
        category: Category,
        color: &str,
    ) -> Result<usize, GraphError> {
        let color = checked_color(color)?;
        let mut changed = 0usize;
        for node in self.nodes.iter_mut().filter(|node| node.category == category) {
            node.color = Some(color.clone());
            changed += 1;
        }

        if changed > 0 {
            self.events.emit(&GraphEvent::ColorsChanged { changed });
        }
        Ok(changed)
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&GraphEvent) + 'static) -> SubscriptionId {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    pub(crate) fn nodes_mut(&mut self) -> &mut [GraphNode] {
        &mut self.nodes
    }

    pub(crate) fn node_mut(&mut self, id: &str) -> Option<&mut GraphNode> {
        let index = self.index_of(id)?;
        self.nodes.get_mut(index)
    }
}

fn checked_color(color: &str) -> Result<String, GraphError> {
    let color = color.trim();
    if is_hex_color(color) {
        Ok(color.to_owned())
    } else {
        Err(GraphError::InvalidColor(color.to_owned()))
    }
}
