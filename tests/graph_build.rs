use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use anyhow::Result;
use medgraph::error::GraphError;
use medgraph::graph::{
    GraphBuilder, GraphDataStore, GraphEvent, GraphLink, GraphModel, GraphNode, LinkDirection,
    NodeIdScheme, RelationSpec, build_graph,
};
use medgraph::knowledge::{Category, DomainEntity, RelatedEntity, demo_entities};

fn two_depressions() -> Vec<DomainEntity> {
    vec![
        DomainEntity::new(Category::Disease, "Mild depression")
            .with_relation("symptoms", ["Insomnia", "Fatigue"]),
        DomainEntity::new(Category::Disease, "Major depression")
            .with_relation("symptoms", ["Insomnia"])
            .with_relation("causes", ["Genetic factors"]),
    ]
}

fn link_set(model: &GraphModel) -> HashSet<(String, String, String)> {
    model
        .links
        .iter()
        .map(|link| {
            (
                link.source_id.clone(),
                link.target_id.clone(),
                link.relation_label.clone(),
            )
        })
        .collect()
}

#[test]
fn shared_symptom_becomes_one_node_with_two_links() {
    let model = build_graph(&two_depressions());

    let insomnia = model
        .nodes
        .iter()
        .filter(|node| node.id == "Insomnia")
        .collect::<Vec<_>>();
    assert_eq!(insomnia.len(), 1);
    assert_eq!(insomnia[0].category, Category::Symptom);

    let links = model
        .links
        .iter()
        .filter(|link| link.target_id == "Insomnia")
        .collect::<Vec<_>>();
    assert_eq!(links.len(), 2);
    assert!(links.iter().all(|link| link.relation_label == "HAS_SYMPTOM"));
    let sources = links
        .iter()
        .map(|link| link.source_id.as_str())
        .collect::<HashSet<_>>();
    assert_eq!(sources, HashSet::from(["Mild depression", "Major depression"]));
}

#[test]
fn building_twice_gives_the_same_graph() {
    let entities = demo_entities();
    let first = build_graph(&entities);
    let second = build_graph(&entities);

    assert_eq!(first.nodes, second.nodes);
    assert_eq!(link_set(&first), link_set(&second));
}

#[test]
fn demo_graph_has_unique_ids_and_resolvable_links() {
    let model = build_graph(&demo_entities());

    let ids = model
        .nodes
        .iter()
        .map(|node| node.id.as_str())
        .collect::<HashSet<_>>();
    assert_eq!(ids.len(), model.nodes.len());
    for link in &model.links {
        assert!(ids.contains(link.source_id.as_str()), "{link:?}");
        assert!(ids.contains(link.target_id.as_str()), "{link:?}");
    }
}

#[test]
fn nodes_start_without_positions_or_pins() {
    let model = build_graph(&demo_entities());
    assert!(
        model
            .nodes
            .iter()
            .all(|node| node.position().is_none() && !node.is_pinned())
    );
}

#[test]
fn risk_factors_and_therapies_point_at_the_disease() {
    let entities = vec![
        DomainEntity::new(Category::Disease, "Postpartum depression")
            .with_relation("riskFactors", ["Sleep deprivation"])
            .with_relation("therapies", ["Peer support groups"]),
    ];
    let model = build_graph(&entities);

    let links = link_set(&model);
    assert!(links.contains(&(
        "Sleep deprivation".to_owned(),
        "Postpartum depression".to_owned(),
        "INCREASES_RISK".to_owned()
    )));
    assert!(links.contains(&(
        "Peer support groups".to_owned(),
        "Postpartum depression".to_owned(),
        "TREATS".to_owned()
    )));
    assert_eq!(
        model.node("Sleep deprivation").map(|node| node.category),
        Some(Category::Risk)
    );
}

#[test]
fn first_insertion_wins_across_relation_sets() {
    let entities = vec![
        DomainEntity::new(Category::Disease, "Postpartum depression")
            .with_relation("treatments", ["Cognitive behavioral therapy"])
            .with_relation("therapies", ["Cognitive behavioral therapy"]),
    ];
    let model = build_graph(&entities);

    let node = model.node("Cognitive behavioral therapy");
    assert_eq!(node.map(|node| node.category), Some(Category::Treatment));
    assert_eq!(node.and_then(|node| node.color.as_deref()), Some("#8E44AD"));
    assert_eq!(model.nodes.len(), 2);
    assert_eq!(model.links.len(), 2);
}

#[test]
fn category_slug_ids_keep_same_named_entities_apart() {
    let entities = vec![
        DomainEntity::new(Category::Disease, "Major Depression").with_id(7),
        DomainEntity::new(Category::Disease, "Anxiety disorder")
            .with_relation("treatments", ["Cognitive behavioral therapy"])
            .with_relation("therapies", ["Cognitive behavioral therapy"]),
    ];
    let model = GraphBuilder::new(NodeIdScheme::CategorySlug).build(&entities);

    let ids = model
        .nodes
        .iter()
        .map(|node| node.id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(
        ids,
        vec![
            "disease_7",
            "disease_anxiety_disorder",
            "treatment_cognitive_behavioral_therapy",
            "therapy_cognitive_behavioral_therapy",
        ]
    );
}

#[test]
fn nameless_entities_are_skipped() {
    let mut root = DomainEntity::new(Category::Disease, "Major depression");
    root.relations.insert(
        "symptoms".to_owned(),
        vec![RelatedEntity::default(), RelatedEntity::named("   "), RelatedEntity::named("Fatigue")],
    );
    let mut nameless_root = DomainEntity::new(Category::Disease, "");
    nameless_root.name = None;

    let model = build_graph(&[nameless_root, root]);

    assert_eq!(model.nodes.len(), 2);
    assert_eq!(model.links.len(), 1);
    assert!(model.node("Fatigue").is_some());
}

#[test]
fn duplicate_roots_are_skipped_entirely() {
    let entities = vec![
        DomainEntity::new(Category::Disease, "Major depression").with_relation("symptoms", ["Fatigue"]),
        DomainEntity::new(Category::Disease, "Major depression").with_relation("symptoms", ["Insomnia"]),
    ];
    let model = build_graph(&entities);

    assert!(model.node("Insomnia").is_none());
    assert_eq!(model.links.len(), 1);
}

#[test]
fn repeated_item_in_one_set_links_once() {
    let entities = vec![
        DomainEntity::new(Category::Disease, "Major depression")
            .with_relation("symptoms", ["Fatigue", "Fatigue"])
            .with_relation("unknownRelation", ["Ignored"]),
    ];
    let model = build_graph(&entities);

    assert_eq!(model.links.len(), 1);
    assert!(model.node("Ignored").is_none());
}

#[test]
fn custom_relation_table_replaces_the_default_one() {
    let table = vec![
        RelationSpec {
            key: "complications",
            target: Category::Symptom,
            color: "#123ABC",
            label: "MAY_CAUSE",
            direction: LinkDirection::Outgoing,
        },
        RelationSpec {
            key: "medications",
            target: Category::Medication,
            color: "#ABCDEF",
            label: "RELIEVES",
            direction: LinkDirection::Incoming,
        },
    ];
    let entities = vec![
        DomainEntity::new(Category::Disease, "Major depression")
            .with_relation("complications", ["Self-harm"])
            .with_relation("medications", ["SSRIs"])
            .with_relation("symptoms", ["Fatigue"]),
    ];

    let model = GraphBuilder::new(NodeIdScheme::Name)
        .with_relations(table)
        .build(&entities);

    assert!(model.node("Fatigue").is_none(), "symptoms is not in the table");
    let complication = model.node("Self-harm");
    assert_eq!(complication.map(|node| node.category), Some(Category::Symptom));
    assert_eq!(
        complication.and_then(|node| node.color.as_deref()),
        Some("#123ABC")
    );
    assert_eq!(
        model.node("SSRIs").and_then(|node| node.color.as_deref()),
        Some("#ABCDEF")
    );

    let links = link_set(&model);
    assert_eq!(links.len(), 2);
    assert!(links.contains(&(
        "Major depression".to_owned(),
        "Self-harm".to_owned(),
        "MAY_CAUSE".to_owned()
    )));
    assert!(links.contains(&(
        "SSRIs".to_owned(),
        "Major depression".to_owned(),
        "RELIEVES".to_owned()
    )));
}

#[test]
fn legend_follows_first_appearance() {
    let model = build_graph(&two_depressions());
    let store = GraphDataStore::from_model(model);

    assert_eq!(
        store.categories(),
        vec![Category::Disease, Category::Symptom, Category::Cause]
    );
    assert_eq!(store.colors(), vec!["#FF6B6B", "#4ECDC4", "#33C3FF"]);
    assert_eq!(
        store.legend()[1],
        (Category::Symptom, Some("#4ECDC4".to_owned()))
    );
}

#[test]
fn store_drops_links_with_missing_endpoints() {
    let model = GraphModel {
        nodes: vec![
            GraphNode::new("A", "A", Category::Disease, None),
            GraphNode::new("A", "A again", Category::Disease, None),
            GraphNode::new("B", "B", Category::Symptom, None),
        ],
        links: vec![
            GraphLink {
                source_id: "A".to_owned(),
                target_id: "B".to_owned(),
                relation_key: "symptoms".to_owned(),
                relation_label: "HAS_SYMPTOM".to_owned(),
            },
            GraphLink {
                source_id: "A".to_owned(),
                target_id: "C".to_owned(),
                relation_key: "symptoms".to_owned(),
                relation_label: "HAS_SYMPTOM".to_owned(),
            },
        ],
    };
    let store = GraphDataStore::from_model(model);

    assert_eq!(store.nodes().len(), 2);
    assert_eq!(store.node("A").map(|node| node.name.as_str()), Some("A"));
    assert_eq!(store.links().len(), 1);
    assert_eq!(store.link_indices().collect::<Vec<_>>(), vec![(0, 1)]);
}

#[test]
fn color_changes_keep_the_revision_and_notify() -> Result<()> {
    let mut store = GraphDataStore::from_model(build_graph(&two_depressions()));
    let revision = store.revision();
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    let subscription = store.subscribe(move |event| sink.borrow_mut().push(event.clone()));

    assert_eq!(store.change_category_color(Category::Symptom, "#000")?, 2);
    assert!(store.change_node_color("Insomnia", "#112233")?);
    assert!(!store.change_node_color("Unknown", "#112233")?);

    assert_eq!(store.revision(), revision);
    assert_eq!(
        store.node("Fatigue").and_then(|node| node.color.as_deref()),
        Some("#000")
    );
    assert_eq!(
        store.node("Insomnia").and_then(|node| node.color.as_deref()),
        Some("#112233")
    );
    assert_eq!(
        *events.borrow(),
        vec![
            GraphEvent::ColorsChanged { changed: 2 },
            GraphEvent::ColorsChanged { changed: 1 },
        ]
    );

    assert!(store.unsubscribe(subscription));
    store.replace(build_graph(&two_depressions()));
    assert_eq!(events.borrow().len(), 2);
    assert_eq!(store.revision(), revision + 1);
    Ok(())
}

#[test]
fn invalid_colors_are_rejected() {
    let mut store = GraphDataStore::from_model(build_graph(&two_depressions()));

    assert_eq!(
        store.change_node_color("Insomnia", "red"),
        Err(GraphError::InvalidColor("red".to_owned()))
    );
    assert_eq!(
        store.node("Insomnia").and_then(|node| node.color.as_deref()),
        Some("#4ECDC4")
    );
}
