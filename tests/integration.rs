//! End-to-end integration tests for the kb-audit engine.
//!
//! These tests drive the full load pipeline from source data through state
//! propagation, validating that the concept graph, catalog, tasks, scenes,
//! and snapshot queries all work together.

use std::collections::BTreeSet;

use kb_audit::catalog::{CategoryMappingRow, InventoryDocument, ObjectRename};
use kb_audit::config::AuditConfig;
use kb_audit::engine::Engine;
use kb_audit::error::{CatalogError, GraphError, KbError};
use kb_audit::graph::CustomConcept;
use kb_audit::pipeline::{SourceData, build_snapshot};
use kb_audit::report;
use kb_audit::scene::RoomConfigDocument;
use kb_audit::state::State;
use kb_audit::task::TaskDefinition;
use kb_audit::taxonomy::{StaticTaxonomy, TaxonomyEntry};

fn taxonomy() -> StaticTaxonomy {
    StaticTaxonomy::new([
        TaxonomyEntry::new("entity.n.01").with_hyponyms([
            "fruit.n.01",
            "furniture.n.01",
            "appliance.n.02",
            "cookware.n.01",
            "material.n.01",
        ]),
        TaxonomyEntry::new("fruit.n.01").with_hyponyms(["apple.n.01"]),
        TaxonomyEntry::new("apple.n.01"),
        TaxonomyEntry::new("furniture.n.01").with_hyponyms(["table.n.02", "chair.n.01"]),
        TaxonomyEntry::new("table.n.02"),
        TaxonomyEntry::new("chair.n.01"),
        TaxonomyEntry::new("appliance.n.02").with_hyponyms(["stove.n.01"]),
        TaxonomyEntry::new("stove.n.01"),
        TaxonomyEntry::new("cookware.n.01").with_hyponyms(["pan.n.01"]),
        TaxonomyEntry::new("pan.n.01"),
        TaxonomyEntry::new("material.n.01").with_hyponyms(["dust.n.01", "water.n.06"]),
        TaxonomyEntry::new("dust.n.01"),
        TaxonomyEntry::new("water.n.06"),
    ])
}

fn task(json: &str) -> TaskDefinition {
    serde_json::from_str(json).unwrap()
}

fn rooms(json: &str) -> RoomConfigDocument {
    serde_json::from_str(json).unwrap()
}

fn catalog_data() -> SourceData {
    SourceData {
        category_mapping: vec![
            CategoryMappingRow::new("apple", "apple.n.01"),
            CategoryMappingRow::new("table", "table.n.02"),
            CategoryMappingRow::new("chair", "chair.n.01"),
            CategoryMappingRow::new("stove", "stove.n.01"),
            CategoryMappingRow::new("pan", "pan.n.01"),
        ],
        inventory_future: InventoryDocument::from_names([
            "apple-000",
            "table-000",
            "chair-000",
            "stove-000",
            "stove-001",
            "pan-000",
        ]),
        inventory_current: InventoryDocument::from_names([
            "apple-000",
            "table-000",
            "chair-000",
            "stove-000",
        ]),
        ..Default::default()
    }
}

#[test]
fn descendant_match_propagates_to_ancestor() {
    let data = SourceData {
        category_mapping: vec![CategoryMappingRow::new("apple", "apple.n.01")],
        inventory_future: InventoryDocument::from_names(["apple-000"]),
        inventory_current: InventoryDocument::from_names(["apple-000"]),
        ..Default::default()
    };
    let snap = build_snapshot(&taxonomy(), &data).unwrap();

    assert_eq!(snap.concept_state("apple.n.01"), State::Matched);
    assert_eq!(snap.concept_state("fruit.n.01"), State::Matched);
    let names: Vec<_> = snap
        .matching_ready_objects("fruit.n.01")
        .into_iter()
        .map(|a| a.name.as_str())
        .collect();
    assert_eq!(names, vec!["apple-000"]);
}

#[test]
fn custom_concept_under_unknown_hypernym_aborts_load() {
    let data = SourceData {
        custom_concepts: vec![CustomConcept::new("stain.n.01", "substance.n.01")],
        ..Default::default()
    };
    let err = build_snapshot(&taxonomy(), &data).unwrap_err();
    match err {
        KbError::Graph(GraphError::UnknownHypernym { custom, hypernym }) => {
            assert_eq!(custom, "stain.n.01");
            assert_eq!(hypernym, "substance.n.01");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn room_shortfall_names_missing_count() {
    let mut data = catalog_data();
    data.tasks = vec![task(
        r#"{
            "activity": "setting_chairs",
            "objects": {"chair.n.01": ["chair.n.01_1", "chair.n.01_2"]},
            "initial_conditions": [
                ["inroom", "chair.n.01_1", "dining_room"],
                ["inroom", "chair.n.01_2", "dining_room"]
            ]
        }"#,
    )];
    data.rooms_current = rooms(r#"{"scenes":{"Beechwood_0_int":{"dining_room_0":{"chair-000":1}}}}"#);
    data.rooms_future = data.rooms_current.clone();

    let snap = build_snapshot(&taxonomy(), &data).unwrap();
    let matching = snap.scene_matching("setting_chairs-0");
    let scene = &matching["Beechwood_0_int"];
    assert!(!scene.matched_ready);
    assert!(scene.reason_ready.contains("1 chair.n.01"), "{}", scene.reason_ready);
    assert!(scene.reason_ready.contains("dining_room_0"));
    assert_eq!(snap.task_scene_state("setting_chairs-0"), State::Unmatched);
}

#[test]
fn covered_marks_the_second_argument_as_substance() {
    let mut data = catalog_data();
    data.tasks = vec![task(
        r#"{
            "activity": "dusting_table",
            "objects": {"table.n.02": ["table.n.02_1"], "dust.n.01": ["dust.n.01_1"]},
            "initial_conditions": [["covered", "table.n.02_1", "dust.n.01_1"]],
            "goal_conditions": [["not", ["covered", "table.n.02_1", "dust.n.01_1"]]]
        }"#,
    )];
    let snap = build_snapshot(&taxonomy(), &data).unwrap();

    let dust = snap.concept("dust.n.01").unwrap();
    assert!(dust.usage.used_as_substance);
    let table = snap.concept("table.n.02").unwrap();
    assert!(!table.usage.used_as_substance);
    assert!(table.usage.predicates.contains("covered"));

    let mismatches = report::usage_mismatches(&snap);
    assert!(mismatches.iter().any(|m| m.name == "dust.n.01"));
}

#[test]
fn ready_asset_missing_from_planned_inventory_aborts_load() {
    let mut data = catalog_data();
    data.inventory_future = InventoryDocument::from_names(["apple-000"]);
    data.inventory_current = InventoryDocument::from_names(["apple-000", "pan-000"]);
    let err = build_snapshot(&taxonomy(), &data).unwrap_err();
    match &err {
        KbError::Catalog(CatalogError::ReadyAssetNotPlanned { asset, .. }) => {
            assert_eq!(asset, "pan-000");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("pan-000"));
}

#[test]
fn ready_and_planned_tiers_are_matched_separately() {
    let mut data = catalog_data();
    data.tasks = vec![task(
        r#"{
            "activity": "cooking",
            "objects": {"stove.n.01": ["stove.n.01_1"]},
            "initial_conditions": [["inroom", "stove.n.01_1", "kitchen"]]
        }"#,
    )];
    data.rooms_current = rooms(
        r#"{"scenes":{
            "Rs_int": {"kitchen_0": {"stove-000": 1}}
        }}"#,
    );
    data.rooms_future = rooms(
        r#"{"scenes":{
            "Rs_int": {"kitchen_0": {"stove-000": 1}, "kitchen_1": {}},
            "Wainscott_0_int": {"kitchen_0": {"stove-001": 1}}
        }}"#,
    );
    let snap = build_snapshot(&taxonomy(), &data).unwrap();
    let matching = snap.scene_matching("cooking-0");

    let first = &matching["Rs_int"];
    assert!(first.matched_ready);
    assert!(first.matched_planned);

    let second = &matching["Wainscott_0_int"];
    assert!(!second.matched_ready);
    assert!(second.matched_planned);
    assert_eq!(second.reason_ready, "Cannot find suitable kitchen.");

    assert_eq!(snap.task_state("cooking-0"), State::Matched);
    let scenes = report::task_scenes(&snap, "cooking-0");
    assert_eq!(scenes.matched, vec!["Rs_int"]);
    assert_eq!(scenes.planned_only, vec!["Wainscott_0_int"]);
}

#[test]
fn planned_only_inventory_yields_planned_task() {
    let mut data = catalog_data();
    data.tasks = vec![task(
        r#"{
            "activity": "frying",
            "objects": {"pan.n.01": ["pan.n.01_1"]},
            "goal_conditions": [["ontop", "pan.n.01_1", "pan.n.01_1"]]
        }"#,
    )];
    let snap = build_snapshot(&taxonomy(), &data).unwrap();
    assert_eq!(snap.concept_state("pan.n.01"), State::Planned);
    assert_eq!(snap.task_synset_state("frying-0"), State::Planned);

    let missing = report::missing_concepts(&snap);
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].name, "pan.n.01");
    assert_eq!(missing[0].required_by, vec!["frying-0"]);
}

#[test]
fn unknown_task_concepts_are_illegal() {
    let mut data = catalog_data();
    data.tasks = vec![task(
        r#"{
            "activity": "polishing",
            "objects": {"polish.n.99": ["polish.n.99_1"], "table.n.02": ["table.n.02_1"]},
            "goal_conditions": [["polished", "table.n.02_1"]]
        }"#,
    )];
    let snap = build_snapshot(&taxonomy(), &data).unwrap();
    assert_eq!(snap.concept_state("polish.n.99"), State::Illegal);
    assert_eq!(snap.task_state("polishing-0"), State::Unmatched);

    let illegal = report::illegal_concepts(&snap);
    assert_eq!(illegal.len(), 1);
    assert_eq!(illegal[0].required_by, vec!["polishing-0"]);
    let export = report::task_export(&snap, "polishing-0").unwrap();
    assert_eq!(export.problem_concepts, vec!["polish.n.99"]);
}

#[test]
fn rebuilding_is_deterministic() {
    let mut data = catalog_data();
    data.tasks = vec![task(
        r#"{
            "activity": "cooking",
            "objects": {"stove.n.01": ["stove.n.01_1"], "apple.n.01": ["apple.n.01_1"]},
            "initial_conditions": [["inroom", "stove.n.01_1", "kitchen"]]
        }"#,
    )];
    data.rooms_current = rooms(r#"{"scenes":{"Rs_int":{"kitchen_0":{"stove-000":1}}}}"#);
    data.rooms_future = data.rooms_current.clone();

    let first = build_snapshot(&taxonomy(), &data).unwrap();
    let second = build_snapshot(&taxonomy(), &data).unwrap();
    assert_eq!(first.states(), second.states());
}

#[test]
fn reload_swaps_snapshot_and_keeps_old_on_failure() {
    let tax = taxonomy();
    let engine = Engine::from_sources(&tax, &catalog_data()).unwrap();
    let before = engine.snapshot();
    assert_eq!(before.concept_state("pan.n.01"), State::Planned);

    let mut data = catalog_data();
    data.inventory_current = InventoryDocument::from_names(["apple-000", "pan-000"]);
    engine.reload_from(&tax, &data).unwrap();
    assert_eq!(engine.snapshot().concept_state("pan.n.01"), State::Matched);
    // Readers holding the old snapshot still see the old world.
    assert_eq!(before.concept_state("pan.n.01"), State::Planned);

    let mut broken = catalog_data();
    broken.custom_concepts = vec![CustomConcept::new("stain.n.01", "nothing.n.01")];
    assert!(engine.reload_from(&tax, &broken).is_err());
    assert_eq!(engine.snapshot().concept_state("pan.n.01"), State::Matched);
}

#[test]
fn engine_loads_inputs_from_config_directory() {
    let dir = tempfile::TempDir::new().unwrap();
    let write = |name: &str, body: &str| std::fs::write(dir.path().join(name), body).unwrap();

    write(
        "audit.toml",
        "name = \"fixture\"\n\n[inputs]\ntaxonomy = \"tax.json\"\n",
    );
    write(
        "tax.json",
        r#"{"concepts":[
            {"name":"fruit.n.01","hyponyms":["apple.n.01"]},
            {"name":"apple.n.01","definition":"fruit with red or yellow or green skin"}
        ]}"#,
    );
    write("custom_synsets.json", "[]");
    write(
        "category_mapping.json",
        r#"[{"category":"apple","synset":"apple.n.01"}]"#,
    );
    write("object_inventory_future.json", r#"{"providers":{"apple-000":"team"}}"#);
    write("object_inventory.json", r#"{"providers":{"apple-000":"team"}}"#);
    write(
        "combined_room_object_list_future.json",
        r#"{"scenes":{"Rs_int":{"kitchen_0":{"apple-000":1}}}}"#,
    );
    write(
        "combined_room_object_list.json",
        r#"{"scenes":{"Rs_int":{"kitchen_0":{"apple-000":1}}}}"#,
    );
    write(
        "tasks.json",
        r#"[{"activity":"eating_apple","objects":{"apple.n.01":["apple.n.01_1"]}}]"#,
    );

    let config = AuditConfig::load(&dir.path().join("audit.toml")).unwrap();
    let engine = Engine::load(config).unwrap();
    let snap = engine.snapshot();
    assert_eq!(snap.concept_state("fruit.n.01"), State::Matched);
    assert_eq!(snap.task_state("eating_apple-0"), State::Matched);
    assert!(
        snap.concept("apple.n.01")
            .unwrap()
            .definition
            .contains("red or yellow")
    );

    let info = engine.info().to_string();
    assert!(info.starts_with("kb-audit: fixture"), "{info}");
    engine.reload().unwrap();
}

fn kettle_task() -> SourceData {
    let mut data = catalog_data();
    data.inventory_future = InventoryDocument::from_names(["apple-000"]);
    data.inventory_current = InventoryDocument::from_names(["apple-000"]);
    data.properties
        .insert("water.n.06".into(), BTreeSet::from(["substance".to_string()]));
    data.tasks = vec![task(
        r#"{
            "activity": "boiling_water",
            "objects": {
                "pan.n.01": ["pan.n.01_1"],
                "water.n.06": ["water.n.06_1"],
                "kettle.n.99": ["kettle.n.99_1"]
            },
            "initial_conditions": [
                ["ontop", "kettle.n.99_1", "pan.n.01_1"],
                ["ontop", "water.n.06_1", "pan.n.01_1"]
            ],
            "goal_conditions": [["filled", "pan.n.01_1", "water.n.06_1"]]
        }"#,
    )];
    data
}

#[test]
fn missing_concepts_include_illegal_and_substance_concepts() {
    let snap = build_snapshot(&taxonomy(), &kettle_task()).unwrap();
    assert_eq!(snap.concept_state("kettle.n.99"), State::Illegal);
    assert_eq!(snap.concept_state("water.n.06"), State::Substance);
    assert_eq!(snap.concept_state("pan.n.01"), State::Unmatched);

    let missing: Vec<_> = report::missing_concepts(&snap)
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(missing, vec!["kettle.n.99", "pan.n.01", "water.n.06"]);
}

#[test]
fn usage_mismatches_cover_fillable_and_substance_annotations() {
    let snap = build_snapshot(&taxonomy(), &kettle_task()).unwrap();
    let mismatches = report::usage_mismatches(&snap);
    let has = |name: &str, problem: &str| {
        mismatches
            .iter()
            .any(|m| m.name == name && m.problem.contains(problem))
    };

    assert!(has("pan.n.01", "used as fillable"), "{mismatches:?}");
    assert!(has("water.n.06", "used as non-substance"), "{mismatches:?}");
    assert!(!has("water.n.06", "not annotated as one"));

    let mut annotated = kettle_task();
    annotated
        .properties
        .insert("pan.n.01".into(), BTreeSet::from(["fillable".to_string()]));
    let snap = build_snapshot(&taxonomy(), &annotated).unwrap();
    assert!(
        !report::usage_mismatches(&snap)
            .iter()
            .any(|m| m.name == "pan.n.01")
    );
}

#[test]
fn non_leaf_concepts_with_objects_are_reported() {
    let mut data = catalog_data();
    data.category_mapping
        .push(CategoryMappingRow::new("furniture", "furniture.n.01"));
    data.inventory_future = InventoryDocument::from_names(["chair-000", "furniture-000"]);
    data.inventory_current = InventoryDocument::from_names(["chair-000"]);
    let snap = build_snapshot(&taxonomy(), &data).unwrap();

    let names: Vec<_> = report::non_leaf_categories(&snap)
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["furniture.n.01"]);
}

#[test]
fn renamed_objects_in_room_configs_count_for_tasks() {
    let mut data = catalog_data();
    data.inventory_future = InventoryDocument::from_names(["seat-007"]);
    data.inventory_current = InventoryDocument::from_names(["seat-007"]);
    data.object_renames = vec![ObjectRename {
        object_name: "seat-007".into(),
        new_category: "chair".into(),
    }];
    data.tasks = vec![task(
        r#"{
            "activity": "setting_chairs",
            "objects": {"chair.n.01": ["chair.n.01_1", "chair.n.01_2"]},
            "initial_conditions": [
                ["inroom", "chair.n.01_1", "dining_room"],
                ["inroom", "chair.n.01_2", "dining_room"]
            ]
        }"#,
    )];
    data.rooms_current = rooms(r#"{"scenes":{"Beechwood_0_int":{"dining_room_0":{"seat-007":2}}}}"#);
    data.rooms_future = data.rooms_current.clone();

    let snap = build_snapshot(&taxonomy(), &data).unwrap();
    assert!(snap.kb().catalog.asset("seat-007").is_none());
    assert_eq!(snap.concept_state("chair.n.01"), State::Matched);
    assert!(snap.scene_matching("setting_chairs-0")["Beechwood_0_int"].matched_ready);
    assert_eq!(snap.task_state("setting_chairs-0"), State::Matched);

    let asset = report::asset_export(&snap, "chair-007").unwrap();
    assert_eq!(asset.original_name, "seat-007");
    assert_eq!(
        asset.placements,
        vec![
            "Beechwood_0_int/dining_room_0 (ready)",
            "Beechwood_0_int/dining_room_0 (planned)",
        ]
    );
}

#[test]
fn unknown_room_types_become_warnings() {
    let mut data = catalog_data();
    data.allowed_room_types = BTreeSet::from(["kitchen".to_string()]);
    data.tasks = vec![task(
        r#"{
            "activity": "cooking",
            "objects": {"stove.n.01": ["stove.n.01_1"]},
            "initial_conditions": [["inroom", "stove.n.01_1", "kitchn"]]
        }"#,
    )];
    data.rooms_current = rooms(r#"{"scenes":{"Rs_int":{"kitchen_0":{"stove-000":1}}}}"#);
    data.rooms_future = data.rooms_current.clone();

    let snap = build_snapshot(&taxonomy(), &data).unwrap();
    let text: Vec<String> = snap
        .warnings()
        .iter()
        .map(|w| w.to_string())
        .filter(|w| w.contains("not an allowed room type"))
        .collect();
    assert_eq!(text.len(), 1, "{text:?}");
    assert!(text[0].contains("cooking-0") && text[0].contains("kitchn"));

    let scene = report::scene_export(&snap, "Rs_int").unwrap();
    assert_eq!(scene.rooms.len(), 2);
    assert!(scene.matched_tasks.is_empty());
}
