// Copyright 2025 the Geodiff Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Two commits of a small layer, their minimal diff bounds, and the tile
//! invalidation tasks derived from them on a Web Mercator grid.
//!
//! Run:
//! - `cargo run -p geodiff_demos --example diff_and_plan`
//! - `RUST_LOG=debug cargo run -p geodiff_demos --example diff_and_plan`

use geodiff_tiles::{
    DispatchError, GridSet, GridSetBroker, GridSubsetConfig, InvalidationPlanner, InvalidationTask,
    LayerConfig, Srs, TransformRegistry, dispatch,
};
use geodiff_tree::{MemoryStore, MinimalDiffBounds, TreeBuilder};
use kurbo::Rect;
use tracing_subscriber::EnvFilter;

const MERCATOR_HALF_WORLD: f64 = 20_037_508.342_789_244;

fn web_mercator() -> GridSet {
    let resolutions = (0..19)
        .map(|z| 2.0 * MERCATOR_HALF_WORLD / 256.0 / f64::from(1_u32 << z))
        .collect();
    GridSet::new(
        "EPSG:900913",
        Srs::WEB_MERCATOR,
        Rect::new(
            -MERCATOR_HALF_WORLD,
            -MERCATOR_HALF_WORLD,
            MERCATOR_HALF_WORLD,
            MERCATOR_HALF_WORLD,
        ),
        256,
        256,
        resolutions,
    )
    .expect("valid grid set")
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    // Two commits of a "roads" tree, with an unrelated "rivers" tree alongside.
    let mut store = MemoryStore::new();
    let mut roads = TreeBuilder::new();
    roads.put_feature("ring", Rect::new(2.30, 48.83, 2.38, 48.88));
    roads.put_feature("bollard", Rect::new(2.3522, 48.8566, 2.3522, 48.8566));
    let mut rivers = TreeBuilder::new();
    rivers.put_feature("seine", Rect::new(2.22, 48.81, 2.47, 48.87));

    let mut root = TreeBuilder::new();
    root.put_tree("roads", &roads.build(&mut store));
    root.put_tree("rivers", &rivers.build(&mut store));
    let head = root.build(&mut store);

    roads.remove("bollard");
    roads.put_feature("bridge", Rect::new(2.3200, 48.8600, 2.3200, 48.8640));
    root.put_tree("roads", &roads.build(&mut store));
    rivers.put_feature("canal", Rect::new(2.36, 48.87, 2.37, 48.89));
    root.put_tree("rivers", &rivers.build(&mut store));
    let work = root.build(&mut store);

    store.set_ref("HEAD", head.id());
    store.set_ref("WORK_HEAD", work.id());

    let bounds = match MinimalDiffBounds::new().tree_name("roads").call(&store) {
        Ok(bounds) => bounds,
        Err(err) => {
            tracing::error!("diff failed: {err}");
            return;
        }
    };
    println!("changed area of 'roads': {}", bounds.to_wkt());

    let mut gridsets = GridSetBroker::new();
    gridsets.insert(web_mercator());
    let planner = InvalidationPlanner::new(gridsets, TransformRegistry::with_web_mercator());

    let mut layer = LayerConfig::new("osm:roads", Srs::WGS84);
    layer.default_style = Some("roads".to_owned());
    layer.grid_subsets.push(GridSubsetConfig {
        gridset: "EPSG:900913".to_owned(),
        zoom_start: Some(10),
        zoom_stop: Some(16),
        extent: None,
    });
    layer.formats.push("image/jpeg".to_owned());

    let plan = planner.plan(&bounds, &layer);
    for skipped in &plan.skipped {
        println!("skipped {}: {:?}", skipped.gridset_id, skipped.reason);
    }

    let summary = dispatch(&plan.tasks, &mut |task: &InvalidationTask| -> Result<(), DispatchError> {
        println!(
            "truncate {} on {} as {} (z{}..=z{}, {} tiles)",
            task.layer,
            task.gridset_id,
            task.format,
            task.zoom_start,
            task.zoom_stop,
            task.mask.tile_count(),
        );
        Ok(())
    });
    println!(
        "{} tasks dispatched, {} failed",
        summary.dispatched, summary.failed
    );
}
