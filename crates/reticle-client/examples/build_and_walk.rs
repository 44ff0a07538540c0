// SPDX-License-Identifier: Apache-2.0
//! Builds a small two-level layout against a running `reticled` and walks it.
//!
//! Start the server, then point this at it:
//! ```text
//! cargo run -p reticle-server
//! cargo run -p reticle-client --example build_and_walk -- 127.0.0.1:7878
//! ```
#![allow(clippy::print_stdout)]

use anyhow::Result;
use reticle_client::Client;
use reticle_core::geom::Trans;
use reticle_core::walk::{DownMode, Unit};
use reticle_core::{ArraySpec, ShapeKind};
use reticle_proto::methods::{
    Coords, InstanceArrayCreateParams, InstanceCreateParams, LayerNewParams, LayoutNewParams,
    QueryDownParams, QueryDownStatsParams, ShapeCreateParams, ShapesRecParams, UpPathsParams,
};

#[tokio::main]
async fn main() -> Result<()> {
    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:7878".to_owned());
    let mut client = Client::connect(addr.as_str()).await?;

    let layout = client
        .layout_new(&LayoutNewParams {
            name: "demo".to_owned(),
            top_cell: "TOP".to_owned(),
            dbu: 0.001,
            clear_previous: true,
        })
        .await?;
    println!("layout ready: top={} dbu={}", layout.top_cell, layout.dbu);

    let layer = client
        .layer_new(&LayerNewParams {
            layer: 1,
            datatype: 0,
            as_current: true,
        })
        .await?;

    client.cell_create("CHILD").await?;
    client
        .shape_create(&ShapeCreateParams {
            cell: "CHILD".to_owned(),
            shape_type: ShapeKind::Box,
            coords: Coords::Flat(vec![0.0, 0.0, 500.0, 500.0]),
            width: None,
            units: Unit::Dbu,
            layer_index: Some(layer.layer_index),
        })
        .await?;
    client
        .instance_create(&InstanceCreateParams {
            cell: "TOP".to_owned(),
            child_cell: "CHILD".to_owned(),
            trans: Trans::translate(1000, 2000),
        })
        .await?;

    client.cell_create("TILE").await?;
    client
        .shape_create(&ShapeCreateParams {
            cell: "TILE".to_owned(),
            shape_type: ShapeKind::Box,
            coords: Coords::Flat(vec![0.0, 0.0, 80.0, 80.0]),
            width: None,
            units: Unit::Dbu,
            layer_index: None,
        })
        .await?;
    client
        .instance_array_create(&InstanceArrayCreateParams {
            cell: "TOP".to_owned(),
            child_cell: "TILE".to_owned(),
            trans: Trans::translate(5000, 0),
            array: ArraySpec {
                rows: 3,
                cols: 2,
                row_step: 100,
                col_step: 200,
            },
        })
        .await?;

    let down = client
        .query_down(&QueryDownParams {
            cell: "TOP".to_owned(),
            depth: 2,
            mode: DownMode::Expanded,
            include_bbox: true,
            max_results: 1000,
        })
        .await?;
    println!("query_down: {} records", down.instances.len());
    for rec in &down.instances {
        println!("  {} -> {} at {}", rec.parent, rec.child, rec.trans);
    }

    let stats = client
        .query_down_stats(&QueryDownStatsParams {
            cell: "TOP".to_owned(),
            depth: 8,
            max_results: 1_000_000,
        })
        .await?;
    println!("stats: total={} truncated={}", stats.total, stats.truncated);
    for (name, n) in &stats.by_child_cell {
        println!("  {name}: {n}");
    }

    let up = client
        .query_up_paths(&UpPathsParams {
            cell: "TILE".to_owned(),
            max_paths: 100,
        })
        .await?;
    println!("up_paths: {:?}", up.paths);

    let shapes = client
        .shapes_rec(&ShapesRecParams {
            start_cell: "TOP".to_owned(),
            layers: None,
            unit: Unit::Micron,
            include_transform: false,
            max_results: 10_000,
        })
        .await?;
    println!(
        "shapes_rec: {} shapes, truncated {}",
        shapes.shapes.len(),
        shapes.truncated
    );
    for s in &shapes.shapes {
        println!(
            "  {:?} on {} bbox {:?} via {:?}",
            s.shape_type, s.layer_index, s.bbox, s.hierarchy_path
        );
    }

    let depth = client.get_hierarchy_depth().await?;
    println!("hierarchy depth: {}", depth.depth);
    Ok(())
}
