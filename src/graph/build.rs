use std::collections::{HashMap, HashSet};

use tracing::{debug, error, warn};

use crate::knowledge::{Category, DomainEntity, RelatedEntity};
use crate::util::slugify;

use super::model::{GraphLink, GraphModel, GraphNode};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkDirection {
    /// root → related, e.g. a disease has a symptom.
    Outgoing,
    /// related → root, e.g. a risk factor increases a disease.
    Incoming,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RelationSpec {
    pub key: &'static str,
    pub target: Category,
    pub color: &'static str,
    pub label: &'static str,
    pub direction: LinkDirection,
}

impl RelationSpec {
    const fn outgoing(key: &'static str, target: Category, color: &'static str, label: &'static str) -> Self {
        Self {
            key,
            target,
            color,
            label,
            direction: LinkDirection::Outgoing,
        }
    }

    const fn incoming(key: &'static str, target: Category, color: &'static str, label: &'static str) -> Self {
        Self {
            key,
            target,
            color,
            label,
            direction: LinkDirection::Incoming,
        }
    }
}

/// Relation sets are visited in this order, which fixes node order for
/// entities that appear under several relations.
pub const DEFAULT_RELATIONS: &[RelationSpec] = &[
    RelationSpec::outgoing("symptoms", Category::Symptom, "#4ECDC4", "HAS_SYMPTOM"),
    RelationSpec::outgoing("causes", Category::Cause, "#33C3FF", "HAS_CAUSE"),
    RelationSpec::outgoing("diagnoses", Category::Diagnosis, "#7DFF33", "HAS_DIAGNOSIS"),
    RelationSpec::outgoing("treatments", Category::Treatment, "#8E44AD", "HAS_TREATMENT"),
    RelationSpec::outgoing("preventions", Category::Prevention, "#F5A623", "HAS_PREVENTION"),
    RelationSpec::outgoing("medications", Category::Medication, "#9D65C9", "HAS_MEDICATION"),
    RelationSpec::incoming("riskFactors", Category::Risk, "#FFA500", "INCREASES_RISK"),
    RelationSpec::incoming("therapies", Category::Therapy, "#7DCFB6", "TREATS"),
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum NodeIdScheme {
    /// The display name is the node id.
    #[default]
    Name,
    /// `{category}_{slug}`, where the slug is the entity id or the lowercased
    /// name with whitespace replaced by `_`.
    CategorySlug,
}

#[derive(Clone, Debug)]
pub struct GraphBuilder {
    id_scheme: NodeIdScheme,
    relations: Vec<RelationSpec>,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self {
            id_scheme: NodeIdScheme::default(),
            relations: DEFAULT_RELATIONS.to_vec(),
        }
    }
}

#[derive(Default)]
struct GraphAccumulator {
    nodes: Vec<GraphNode>,
    links: Vec<GraphLink>,
    index_by_id: HashMap<String, usize>,
}

impl GraphAccumulator {
    fn contains(&self, id: &str) -> bool {
        self.index_by_id.contains_key(id)
    }

    fn insert_node(&mut self, id: &str, make: impl FnOnce() -> GraphNode) -> bool {
        if self.contains(id) {
            return false;
        }

        self.index_by_id.insert(id.to_owned(), self.nodes.len());
        self.nodes.push(make());
        true
    }

    fn push_link(&mut self, source_id: &str, target_id: &str, spec: &RelationSpec) {
        let endpoints_exist = self.contains(source_id) && self.contains(target_id);
        debug_assert!(endpoints_exist, "link endpoints must exist before the link is created");
        if !endpoints_exist {
            error!(
                source = source_id,
                target = target_id,
                relation = spec.key,
                "refusing to create link with a missing endpoint"
            );
            return;
        }

        self.links.push(GraphLink {
            source_id: source_id.to_owned(),
            target_id: target_id.to_owned(),
            relation_key: spec.key.to_owned(),
            relation_label: spec.label.to_owned(),
        });
    }
}

impl GraphBuilder {
    pub fn new(id_scheme: NodeIdScheme) -> Self {
        Self {
            id_scheme,
            ..Self::default()
        }
    }

    pub fn with_relations(mut self, relations: Vec<RelationSpec>) -> Self {
        self.relations = relations;
        self
    }

    pub fn node_id(&self, category: Category, entity_id: Option<u64>, name: &str) -> String {
        match self.id_scheme {
            NodeIdScheme::Name => name.to_owned(),
            NodeIdScheme::CategorySlug => {
                let slug = entity_id
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| slugify(name));
                format!("{}_{slug}", category.key())
            }
        }
    }

    pub fn build(&self, entities: &[DomainEntity]) -> GraphModel {
        let mut graph = GraphAccumulator::default();
        let mut root_ids = HashSet::new();

        for (position, entity) in entities.iter().enumerate() {
            let Some(name) = entity.display_name() else {
                warn!(
                    position,
                    category = %entity.category,
                    "skipping root entity without a name"
                );
                continue;
            };

            let root_id = self.node_id(entity.category, entity.id, name);
            if !root_ids.insert(root_id.clone()) {
                warn!(id = %root_id, position, "skipping duplicate root entity");
                continue;
            }

            graph.insert_node(&root_id, || {
                GraphNode::new(
                    root_id.clone(),
                    name,
                    entity.category,
                    Some(entity.category.default_color().to_owned()),
                )
                .with_details(entity.details.clone())
            });

            for key in entity.relations.keys() {
                if !self.relations.iter().any(|spec| spec.key == key) {
                    debug!(root = %root_id, relation = %key, "ignoring relation without a table entry");
                }
            }

            for spec in &self.relations {
                let Some(related) = entity.relations.get(spec.key) else {
                    continue;
                };
                self.add_relation_set(&mut graph, &root_id, spec, related);
            }
        }

        GraphModel {
            nodes: graph.nodes,
            links: graph.links,
        }
    }

    fn add_relation_set(
        &self,
        graph: &mut GraphAccumulator,
        root_id: &str,
        spec: &RelationSpec,
        related: &[RelatedEntity],
    ) {
        let mut linked = HashSet::new();

        for item in related {
            let Some(name) = item.display_name() else {
                warn!(root = root_id, relation = spec.key, "skipping related entity without a name");
                continue;
            };

            let related_id = self.node_id(spec.target, item.id, name);
            if related_id == root_id {
                debug!(root = root_id, relation = spec.key, "skipping self relation");
                continue;
            }

            graph.insert_node(&related_id, || {
                GraphNode::new(
                    related_id.clone(),
                    name,
                    spec.target,
                    Some(spec.color.to_owned()),
                )
                .with_details(item.details.clone())
            });

            if !linked.insert(related_id.clone()) {
                continue;
            }

            match spec.direction {
                LinkDirection::Outgoing => graph.push_link(root_id, &related_id, spec),
                LinkDirection::Incoming => graph.push_link(&related_id, root_id, spec),
            }
        }
    }
}

pub fn build_graph(entities: &[DomainEntity]) -> GraphModel {
    GraphBuilder::default().build(entities)
}

/// Distinct categories in order of first appearance.
pub fn categories(nodes: &[GraphNode]) -> Vec<Category> {
    let mut seen = HashSet::new();
    nodes
        .iter()
        .filter(|node| seen.insert(node.category))
        .map(|node| node.category)
        .collect()
}

/// Distinct assigned colors in order of first appearance.
pub fn colors(nodes: &[GraphNode]) -> Vec<String> {
    let mut seen = HashSet::new();
    nodes
        .iter()
        .filter_map(|node| node.color.as_deref())
        .filter(|color| seen.insert(color.to_owned()))
        .map(str::to_owned)
        .collect()
}

/// Each category paired with the first color assigned to one of its nodes.
pub fn legend(nodes: &[GraphNode]) -> Vec<(Category, Option<String>)> {
    categories(nodes)
        .into_iter()
        .map(|category| {
            let color = nodes
                .iter()
                .find(|node| node.category == category && node.color.is_some())
                .and_then(|node| node.color.clone());
            (category, color)
        })
        .collect()
}
