// SPDX-License-Identifier: Apache-2.0
//! Per-method parameter and result types.
//!
//! Wire defaults and parameter aliases live here, in serde attributes, so
//! the dispatch code never touches raw JSON maps. Query records reuse the
//! `reticle-core` types directly; their field names are the wire contract.

use serde::{Deserialize, Serialize};

use reticle_core::walk::{DownMode, InstanceRecord, ShapeRecord, Unit};
use reticle_core::{
    ArraySpec, SegmentPath, ShapeKind, DEFAULT_INSTANCE_RESULTS, DEFAULT_PATH_RESULTS,
    DEFAULT_SHAPE_RESULTS, DEFAULT_STATS_ELEMENTS,
};

fn default_layout_name() -> String {
    "layout".to_owned()
}

fn default_top_cell() -> String {
    "TOP".to_owned()
}

const fn default_dbu() -> f64 {
    0.0005
}

const fn default_true() -> bool {
    true
}

const fn default_layer() -> u32 {
    1
}

const fn default_dbu_unit() -> Unit {
    Unit::Dbu
}

const fn default_instance_results() -> usize {
    DEFAULT_INSTANCE_RESULTS
}

const fn default_path_results() -> usize {
    DEFAULT_PATH_RESULTS
}

const fn default_shape_results() -> usize {
    DEFAULT_SHAPE_RESULTS
}

const fn default_stats_elements() -> usize {
    DEFAULT_STATS_ELEMENTS
}

/// `ping` result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingResult {
    /// Always `true`.
    pub pong: bool,
}

/// `layout.new` parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutNewParams {
    /// Layout name, also used as the container segment in upward paths.
    #[serde(default = "default_layout_name")]
    pub name: String,
    /// Name of the implicitly created top cell.
    #[serde(default = "default_top_cell")]
    pub top_cell: String,
    /// Micrometers per database unit.
    #[serde(default = "default_dbu")]
    pub dbu: f64,
    /// Replace a live layout instead of failing with `LayoutExists`.
    #[serde(default = "default_true")]
    pub clear_previous: bool,
}

/// `layout.new` result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutNewResult {
    /// The created top cell's name.
    pub top_cell: String,
    /// The layout's dbu scale factor.
    pub dbu: f64,
}

/// `layer.new` parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerNewParams {
    /// Layer number.
    #[serde(default = "default_layer")]
    pub layer: u32,
    /// Datatype number.
    #[serde(default)]
    pub datatype: u32,
    /// Make this layer the current-layer cursor for `shape.create`.
    #[serde(default)]
    pub as_current: bool,
}

/// `layer.new` result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerNewResult {
    /// Index of the registered layer in the layer table.
    pub layer_index: u32,
}

/// `cell.create` parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellCreateParams {
    /// Unique cell name.
    pub name: String,
}

/// Result for creation methods that return no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedResult {
    /// Always `true`.
    pub created: bool,
}

/// Result for placement methods that return no data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertedResult {
    /// Always `true`.
    pub inserted: bool,
}

/// Coordinate payload of `shape.create`.
///
/// Boxes send a flat `[x1, y1, x2, y2]`; polygons and paths send vertex
/// pairs `[[x, y], ...]`. Values are numbers in the request's `units`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coords {
    /// Flat box corners.
    Flat(Vec<f64>),
    /// Vertex list.
    Pairs(Vec<[f64; 2]>),
}

/// `shape.create` parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeCreateParams {
    /// Owning cell name.
    pub cell: String,
    /// Primitive kind.
    #[serde(rename = "type")]
    pub shape_type: ShapeKind,
    /// Geometry in the request's `units`.
    pub coords: Coords,
    /// Path width; required for paths, rejected for other kinds.
    #[serde(default)]
    pub width: Option<f64>,
    /// Coordinate unit of `coords` and `width`. Micron values are snapped
    /// to the dbu grid by rounding.
    #[serde(default = "default_dbu_unit")]
    pub units: Unit,
    /// Target layer; omitted means the current-layer cursor.
    #[serde(default)]
    pub layer_index: Option<u32>,
}

/// `instance.create` parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceCreateParams {
    /// Parent cell name.
    pub cell: String,
    /// Placed child cell name.
    pub child_cell: String,
    /// Placement transform; `rot` is in degrees (0/90/180/270).
    pub trans: reticle_core::geom::Trans,
}

/// `instance_array.create` parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceArrayCreateParams {
    /// Parent cell name.
    pub cell: String,
    /// Placed child cell name.
    pub child_cell: String,
    /// Base transform of element (0, 0); `rot` is in degrees.
    pub trans: reticle_core::geom::Trans,
    /// Grid descriptor; both counts must be at least 1.
    pub array: ArraySpec,
}

/// `layout.get_topcell` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopCellResult {
    /// Name of the single root cell.
    pub top_cell: String,
}

/// One row of `layout.get_layers`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerEntry {
    /// Index into the layer table.
    pub layer_index: u32,
    /// Layer number.
    pub layer: u32,
    /// Datatype number.
    pub datatype: u32,
}

/// `layout.get_layers` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayersResult {
    /// Registered layers in registration order.
    pub layers: Vec<LayerEntry>,
}

/// `layout.get_dbu` result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DbuResult {
    /// Micrometers per database unit.
    pub dbu: f64,
}

/// `layout.get_cells` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellsResult {
    /// Cell names in creation order.
    pub cells: Vec<String>,
}

/// `layout.get_hierarchy_depth` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchyDepthResult {
    /// Longest root-to-leaf chain, top cell at 0.
    pub depth: u32,
    /// Human-readable statement of the depth convention.
    pub depth_definition: String,
}

/// `hier.query_down` parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDownParams {
    /// Root cell of the traversal.
    pub cell: String,
    /// Maximum descent depth; 0 behaves as 1.
    pub depth: u32,
    /// Structural (per edge) or expanded (per array element) records.
    #[serde(default)]
    pub mode: DownMode,
    /// Attach recursive child geometry bounds to each record.
    #[serde(default)]
    pub include_bbox: bool,
    /// Strict ceiling on emitted records.
    #[serde(default = "default_instance_results", alias = "limit")]
    pub max_results: usize,
}

/// `hier.query_down` result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryDownResult {
    /// Enumerated placement records in walk order.
    pub instances: Vec<InstanceRecord>,
}

/// `hier.query_down_stats` parameters. The result is
/// [`reticle_core::walk::DownStats`] verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryDownStatsParams {
    /// Root cell of the count.
    pub cell: String,
    /// Maximum descent depth; 0 behaves as 1.
    pub depth: u32,
    /// Truncating ceiling on counted elements.
    #[serde(default = "default_stats_elements")]
    pub max_results: usize,
}

/// `hier.query_up_paths` parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpPathsParams {
    /// Target cell to trace up from.
    pub cell: String,
    /// Strict ceiling on enumerated paths.
    #[serde(default = "default_path_results")]
    pub max_paths: usize,
}

/// `hier.query_up_paths` result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpPathsResult {
    /// Container-to-target name chains, one per distinct route.
    pub paths: Vec<SegmentPath>,
}

/// `hier.shapes_rec` parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapesRecParams {
    /// Cell whose subtree is swept.
    pub start_cell: String,
    /// Layer indices to sweep, in order; omitted sweeps every registered
    /// layer.
    #[serde(default, alias = "layer_filter")]
    pub layers: Option<Vec<u32>>,
    /// Output unit for coordinates and widths.
    #[serde(default)]
    pub unit: Unit,
    /// Attach each shape's accumulated dbu transform.
    #[serde(default)]
    pub include_transform: bool,
    /// Truncating ceiling on emitted shapes.
    #[serde(default = "default_shape_results")]
    pub max_results: usize,
}

/// `hier.shapes_rec` result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapesRecResult {
    /// Shape records in walk order.
    pub shapes: Vec<ShapeRecord>,
    /// True when the sweep stopped at the ceiling.
    pub truncated: bool,
    /// Unit the coordinates are expressed in.
    pub unit: Unit,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use reticle_core::geom::Rot;
    use serde_json::json;

    #[test]
    fn layout_new_fills_every_default() {
        let p: LayoutNewParams = serde_json::from_value(json!({})).unwrap();
        assert_eq!(p.name, "layout");
        assert_eq!(p.top_cell, "TOP");
        assert!((p.dbu - 0.0005).abs() < f64::EPSILON);
        assert!(p.clear_previous);
    }

    #[test]
    fn query_down_accepts_the_limit_alias() {
        let p: QueryDownParams =
            serde_json::from_value(json!({"cell": "TOP", "depth": 2, "limit": 50})).unwrap();
        assert_eq!(p.max_results, 50);
        assert_eq!(p.mode, DownMode::Structural);

        let p: QueryDownParams =
            serde_json::from_value(json!({"cell": "TOP", "depth": 2})).unwrap();
        assert_eq!(p.max_results, DEFAULT_INSTANCE_RESULTS);
    }

    #[test]
    fn shapes_rec_accepts_the_layer_filter_alias() {
        let p: ShapesRecParams =
            serde_json::from_value(json!({"start_cell": "TOP", "layer_filter": [0, 2]}))
                .unwrap();
        assert_eq!(p.layers, Some(vec![0, 2]));
        assert_eq!(p.unit, Unit::Micron);
        assert_eq!(p.max_results, DEFAULT_SHAPE_RESULTS);
    }

    #[test]
    fn shape_create_defaults_to_dbu_units() {
        let p: ShapeCreateParams = serde_json::from_value(json!({
            "cell": "TOP",
            "type": "box",
            "coords": [0, 0, 500, 500],
        }))
        .unwrap();
        assert_eq!(p.units, Unit::Dbu);
        assert_eq!(p.shape_type, ShapeKind::Box);
        assert_eq!(p.coords, Coords::Flat(vec![0.0, 0.0, 500.0, 500.0]));
        assert_eq!(p.layer_index, None);
    }

    #[test]
    fn polygon_coords_parse_as_pairs() {
        let p: ShapeCreateParams = serde_json::from_value(json!({
            "cell": "TOP",
            "type": "polygon",
            "coords": [[0, 0], [40, 0], [0, 30]],
        }))
        .unwrap();
        assert_eq!(
            p.coords,
            Coords::Pairs(vec![[0.0, 0.0], [40.0, 0.0], [0.0, 30.0]])
        );
    }

    #[test]
    fn instance_trans_parses_degrees_and_rejects_odd_angles() {
        let p: InstanceCreateParams = serde_json::from_value(json!({
            "cell": "TOP",
            "child_cell": "CHILD",
            "trans": {"x": 1000, "y": 2000, "rot": 90},
        }))
        .unwrap();
        assert_eq!(p.trans.rot, Rot::R90);
        assert!(!p.trans.mirror);

        let err = serde_json::from_value::<InstanceCreateParams>(json!({
            "cell": "TOP",
            "child_cell": "CHILD",
            "trans": {"x": 0, "y": 0, "rot": 45},
        }))
        .unwrap_err();
        assert!(err.to_string().contains("rot must be one of 0, 90, 180, 270"));
    }
}
