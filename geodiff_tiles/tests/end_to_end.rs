// Copyright 2025 the Geodiff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! From two versions of a tree to invalidation tasks.

use geo::Area;
use geodiff_tiles::{
    DispatchError, GridSetBroker, GridSetConfig, InvalidationPlanner, InvalidationTask, LayerConfig,
    TransformRegistry, dispatch, plan_invalidations,
};
use geodiff_tree::{MemoryStore, TreeBuilder, compute_minimal_diff_bounds};
use kurbo::Rect;

const GRIDSET: &str = r#"{
    "name": "unit",
    "srs": 404000,
    "extent": [0, 0, 256, 256],
    "resolutions": [0.25, 0.015625, 0.00390625]
}"#;

const LAYER: &str = r#"{
    "name": "topp:roads",
    "srs": 404000,
    "default_style": "line",
    "parameter_filters": [{ "key": "STYLES", "default_value": "line", "legal_values": ["dashed"] }],
    "grid_subsets": [{ "gridset": "unit" }],
    "formats": ["image/png", "image/jpeg"]
}"#;

fn repository() -> MemoryStore {
    let mut store = MemoryStore::new();
    let mut roads = TreeBuilder::new();
    roads.put_feature("removed", Rect::new(50.0, 50.0, 50.0, 50.0));
    roads.put_feature("kept", Rect::new(200.0, 200.0, 210.0, 210.0));
    let mut root = TreeBuilder::new();
    root.put_tree("roads", &roads.build(&mut store));
    let head = root.build(&mut store);

    roads.remove("removed");
    roads.put_feature("added", Rect::new(10.0, 10.0, 12.0, 12.0));
    root.put_tree("roads", &roads.build(&mut store));
    let work = root.build(&mut store);

    store.set_ref("HEAD", head.id());
    store.set_ref("WORK_HEAD", work.id());
    store
}

fn planner() -> InvalidationPlanner {
    let mut gridsets = GridSetBroker::new();
    let gridset: GridSetConfig = serde_json::from_str(GRIDSET).unwrap();
    gridsets.insert(gridset.build().unwrap());
    InvalidationPlanner::new(gridsets, TransformRegistry::new())
}

#[test]
fn added_rectangle_and_removed_point_invalidate_their_tiles() {
    let store = repository();
    let bounds =
        compute_minimal_diff_bounds(&store, "HEAD", "WORK_HEAD", Some("roads")).unwrap();
    let area: f64 = bounds.polygons().map(|p| p.unsigned_area()).sum();
    assert!((area - 4.0).abs() < 1e-9, "area {area}");
    assert_eq!(bounds.points().count(), 1);

    let layer = LayerConfig::from_json(LAYER).unwrap();
    let tasks = plan_invalidations(&planner(), &bounds, &layer);
    // Two styles (the default one and "dashed") times two formats.
    assert_eq!(tasks.len(), 4);

    let mask = &tasks[0].mask;
    let finest: Vec<(i64, i64)> = mask.tiles(2).collect();
    assert!(finest.contains(&(50, 50)));
    for neighbour in [(49, 50), (51, 50), (50, 49), (50, 51)] {
        assert!(finest.contains(&neighbour), "{neighbour:?} missing");
    }
    assert!(finest.contains(&(11, 11)));
    assert!(!finest.contains(&(30, 30)));
    assert!(!finest.iter().any(|&(x, y)| x >= 200 && y >= 200));
    // The point and the rectangle stay separate regions.
    assert!(!finest.contains(&(30, 11)));
}

#[test]
fn unchanged_versions_plan_nothing() {
    let store = repository();
    let bounds = compute_minimal_diff_bounds(&store, "HEAD", "HEAD", None).unwrap();
    assert!(bounds.is_empty());
    let layer = LayerConfig::from_json(LAYER).unwrap();
    assert!(plan_invalidations(&planner(), &bounds, &layer).is_empty());
}

#[test]
fn dispatching_the_plan() {
    let store = repository();
    let bounds = compute_minimal_diff_bounds(&store, "HEAD", "WORK_HEAD", None).unwrap();
    let layer = LayerConfig::from_json(LAYER).unwrap();
    let tasks = plan_invalidations(&planner(), &bounds, &layer);

    let mut received: Vec<(String, Option<String>)> = Vec::new();
    let summary = dispatch(&tasks, &mut |task: &InvalidationTask| -> Result<(), DispatchError> {
        received.push((task.format.clone(), task.parameters.get("STYLES").cloned()));
        Ok(())
    });
    assert_eq!(summary.dispatched, 4);
    assert_eq!(summary.failed, 0);
    assert!(received.contains(&("image/jpeg".to_owned(), Some("dashed".to_owned()))));
    assert!(received.contains(&("image/png".to_owned(), None)));
}
