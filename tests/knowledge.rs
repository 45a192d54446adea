use std::fs;

use anyhow::Result;
use medgraph::graph::build_graph;
use medgraph::knowledge::{Category, demo_entities, load_entities, parse_entities};
use tempfile::tempdir;

const ENTITY_ARRAY: &str = r#"[
    {
        "category": "disease",
        "id": 1,
        "name": "Generalized anxiety disorder",
        "details": { "medicalCode": "F41.1" },
        "relations": {
            "symptoms": [{ "name": "Restlessness" }, { "name": "Irritability" }],
            "medications": [{ "id": 40, "name": "Buspirone", "details": { "dosage": "15 mg" } }]
        }
    },
    { "category": "disease", "name": "Panic disorder" }
]"#;

#[test]
fn parses_a_bare_array() -> Result<()> {
    let entities = parse_entities(ENTITY_ARRAY)?;

    assert_eq!(entities.len(), 2);
    let anxiety = &entities[0];
    assert_eq!(anxiety.category, Category::Disease);
    assert_eq!(anxiety.id, Some(1));
    assert_eq!(anxiety.display_name(), Some("Generalized anxiety disorder"));
    assert_eq!(anxiety.relations["symptoms"].len(), 2);
    assert_eq!(
        anxiety.relations["medications"][0].details["dosage"],
        serde_json::json!("15 mg")
    );
    assert!(entities[1].relations.is_empty());
    Ok(())
}

#[test]
fn parses_an_entities_object_and_skips_malformed_entries() -> Result<()> {
    let raw = r#"{
        "entities": [
            { "category": "disease", "name": "Bipolar disorder" },
            { "category": "not-a-category", "name": "Broken" },
            42,
            { "category": "symptom", "name": "Mood swings" }
        ]
    }"#;

    let entities = parse_entities(raw)?;
    let names = entities
        .iter()
        .filter_map(|entity| entity.display_name())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["Bipolar disorder", "Mood swings"]);
    Ok(())
}

#[test]
fn rejects_data_that_is_not_an_entity_list() {
    assert!(parse_entities("not json").is_err());
    assert!(parse_entities(r#"{ "items": [] }"#).is_err());
    assert!(parse_entities(r#""depression""#).is_err());
    assert!(parse_entities("[]").is_ok_and(|entities| entities.is_empty()));
}

#[test]
fn loads_entities_from_disk() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("anxiety.json");
    fs::write(&path, ENTITY_ARRAY)?;

    let model = build_graph(&load_entities(&path)?);
    assert_eq!(model.nodes.len(), 5);
    assert_eq!(model.links.len(), 3);
    assert_eq!(
        model.node("Buspirone").map(|node| node.category),
        Some(Category::Medication)
    );

    let missing = load_entities(&dir.path().join("missing.json"))
        .err()
        .map(|error| format!("{error:#}"));
    assert!(missing.is_some_and(|message| message.contains("missing.json")));
    Ok(())
}

#[test]
fn demo_data_builds_a_connected_graph() {
    let model = build_graph(&demo_entities());

    let roots = model
        .nodes
        .iter()
        .filter(|node| node.category == Category::Disease)
        .count();
    assert_eq!(roots, 3);

    let cbt = "Cognitive behavioral therapy";
    assert_eq!(
        model.node(cbt).map(|node| node.category),
        Some(Category::Treatment)
    );
    assert!(model.links.iter().any(|link| {
        link.source_id == cbt
            && link.target_id == "Postpartum depression"
            && link.relation_label == "TREATS"
    }));

    for node in &model.nodes {
        let connected = model
            .links
            .iter()
            .any(|link| link.source_id == node.id || link.target_id == node.id);
        assert!(connected, "{} has no links", node.id);
    }
}
