use std::cell::RefCell;
use std::fs;
use std::rc::Rc;

use anyhow::Result;
use medgraph::config::{ConfigEvent, ConfigPatch, ConfigStore, GraphConfig, load_patch};
use tempfile::tempdir;

#[test]
fn defaults_match_the_documented_values() {
    let config = GraphConfig::default();

    assert_eq!(config.canvas_width, 800.0);
    assert_eq!(config.canvas_height, 800.0);
    assert_eq!(config.node_radius, 10.0);
    assert_eq!(config.charge_strength, -600.0);
    assert_eq!(config.link_distance, 100.0);
    assert_eq!(config.link_width, 1.5);
    assert_eq!(config.node_default_color, "#4B5563");
    assert_eq!(config.link_default_color, "#9CA3AF");
    assert!(!config.is_show_link_label);
    assert_eq!((config.min_zoom, config.max_zoom, config.zoom_step), (0.1, 4.0, 1.5));
    assert_eq!(config.collision_radius(), 40.0);
    assert_eq!(config.arrow_offset(), 23.0);
}

#[test]
fn partial_update_leaves_other_fields_alone() {
    let mut store = ConfigStore::new();
    let before = store.config().clone();

    store.update_config(ConfigPatch {
        node_radius: Some(20.0),
        ..ConfigPatch::default()
    });

    let expected = GraphConfig {
        node_radius: 20.0,
        ..before
    };
    assert_eq!(*store.config(), expected);
}

#[test]
fn charge_strength_is_stored_verbatim() {
    let mut store = ConfigStore::new();
    store.update_config(ConfigPatch {
        charge_strength: Some(-300.0),
        ..ConfigPatch::default()
    });
    assert_eq!(store.config().charge_strength, -300.0);

    store.update_config(ConfigPatch {
        charge_strength: Some(12_345.0),
        ..ConfigPatch::default()
    });
    assert_eq!(store.config().charge_strength, 12_345.0);
}

#[test]
fn subscribers_see_previous_and_current_records() {
    let mut store = ConfigStore::new();
    let events = Rc::new(RefCell::new(Vec::<ConfigEvent>::new()));
    let sink = Rc::clone(&events);
    let subscription = store.subscribe(move |event| sink.borrow_mut().push(event.clone()));

    store.update_config(ConfigPatch {
        link_width: Some(3.0),
        ..ConfigPatch::default()
    });
    store.update_config(ConfigPatch {
        link_width: Some(3.0),
        ..ConfigPatch::default()
    });
    store.update_config(ConfigPatch {
        link_distance: Some(250.0),
        ..ConfigPatch::default()
    });

    {
        let events = events.borrow();
        assert_eq!(events.len(), 2, "an update that changes nothing is silent");
        assert_eq!(events[0].previous.link_width, 1.5);
        assert_eq!(events[0].current.link_width, 3.0);
        assert!(!events[0].forces_changed());
        assert!(events[1].forces_changed());
    }

    assert!(store.unsubscribe(subscription));
    assert!(!store.unsubscribe(subscription));
    store.reset_config();
    assert_eq!(events.borrow().len(), 2);
}

#[test]
fn reset_restores_the_default_snapshot() {
    let mut store = ConfigStore::new();
    store.update_config(ConfigPatch {
        canvas_width: Some(1200.0),
        is_show_link_label: Some(true),
        node_default_color: Some("#000000".to_owned()),
        ..ConfigPatch::default()
    });

    store.reset_config();
    assert_eq!(*store.config(), GraphConfig::default());
}

#[test]
fn patches_read_camel_case_json() -> Result<()> {
    let patch: ConfigPatch =
        serde_json::from_str(r#"{ "chargeStrength": -300, "isShowLinkLabel": true }"#)?;

    assert_eq!(patch.charge_strength, Some(-300.0));
    assert_eq!(patch.is_show_link_label, Some(true));
    assert_eq!(patch.node_radius, None);
    Ok(())
}

#[test]
fn later_patches_win_when_merged() {
    let file = ConfigPatch {
        canvas_width: Some(1000.0),
        link_distance: Some(150.0),
        ..ConfigPatch::default()
    };
    let flags = ConfigPatch {
        canvas_width: Some(640.0),
        ..ConfigPatch::default()
    };

    let merged = file.merge(flags);
    assert_eq!(merged.canvas_width, Some(640.0));
    assert_eq!(merged.link_distance, Some(150.0));
    assert!(ConfigPatch::default().is_empty());
}

#[test]
fn load_patch_reads_a_file_and_reports_bad_json() -> Result<()> {
    let dir = tempdir()?;
    let good = dir.path().join("graph.json");
    fs::write(&good, r##"{ "nodeRadius": 18, "linkDefaultColor": "#111111" }"##)?;

    let patch = load_patch(&good)?;
    assert_eq!(patch.node_radius, Some(18.0));
    assert_eq!(patch.link_default_color.as_deref(), Some("#111111"));

    let bad = dir.path().join("broken.json");
    fs::write(&bad, "{ nodeRadius: ")?;
    let error = load_patch(&bad).err().map(|error| format!("{error:#}"));
    assert!(error.is_some_and(|message| message.contains("broken.json")));

    assert!(load_patch(&dir.path().join("missing.json")).is_err());
    Ok(())
}
